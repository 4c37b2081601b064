use super::*;

/// TrimTrack's internal representation of an input file.
#[derive(Deserialize, Clone)]
pub struct InputFile {
    pub options: Options,
    #[serde(default)]
    pub generator: GeneratorParameters,
    pub requests: RequestParameters,
}

impl InputFile {
    pub fn new(string: &str) -> Result<InputFile> {
        toml::from_str(string).context(
            "Could not parse TOML file. Be sure the input file has [options] and [requests] tables."
        )
    }
}

///This helper function is a workaround to issue #368 in serde
fn zero_u64() -> u64 {
    0
}

///This helper function is a workaround to issue #368 in serde
fn one_usize() -> usize {
    1
}

///This helper function is a workaround to issue #368 in serde
fn default_buffer_size() -> usize {
    8000
}

///This helper function is a workaround to issue #368 in serde
fn default_log_level() -> String {
    "info".to_string()
}

///This helper function is a workaround to issue #368 in serde
fn default_policy() -> TrackPolicy {
    TrackPolicy::SPLICING
}

///This helper function is a workaround to issue #368 in serde
fn default_transfer_probability() -> f64 {
    DEFAULT_TRANSFER_PROBABILITY
}

///This helper function is a workaround to issue #368 in serde
fn default_energy_margin_ratio() -> f64 {
    DEFAULT_ENERGY_MARGIN_RATIO
}

/// Run-level options.
#[derive(Deserialize, Clone, Debug)]
pub struct Options {
    /// Prefix of every output file.
    pub name: String,
    /// Path to the collision library file.
    pub library: String,
    #[serde(default = "zero_u64")]
    pub seed: u64,
    #[serde(default = "one_usize")]
    pub num_threads: usize,
    #[serde(default = "default_buffer_size")]
    pub write_buffer_size: usize,
    /// Samples a request may draw before giving up on a library track that does not reach its energy.
    #[serde(default = "one_usize")]
    pub max_attempts: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Track generator settings.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct GeneratorParameters {
    #[serde(default = "default_policy")]
    pub policy: TrackPolicy,
    #[serde(default = "default_transfer_probability")]
    pub transfer_probability: f64,
    #[serde(default = "default_energy_margin_ratio")]
    pub energy_margin_ratio: f64,
    #[serde(default)]
    pub track_id_min: Option<i64>,
    #[serde(default)]
    pub track_id_max: Option<i64>,
}

impl Default for GeneratorParameters {
    fn default() -> GeneratorParameters {
        GeneratorParameters {
            policy: default_policy(),
            transfer_probability: default_transfer_probability(),
            energy_margin_ratio: default_energy_margin_ratio(),
            track_id_min: None,
            track_id_max: None,
        }
    }
}

/// Requested tracks. Entry i asks for N[i] tracks of energy E[i] starting at pos[i] along dir[i].
#[derive(Deserialize, Clone, Debug)]
pub struct RequestParameters {
    pub N: Vec<usize>,
    pub E: Vec<f64>,
    pub pos: Vec<(f64, f64, f64)>,
    pub dir: Vec<(f64, f64, f64)>,
}

impl RequestParameters {
    /// Expand into one `GenerationRequest` per track to generate.
    pub fn expand(&self) -> Vec<GenerationRequest> {
        izip!(&self.N, &self.E, &self.pos, &self.dir)
            .flat_map(|(&N, &E, &(x, y, z), &(dx, dy, dz))| {
                std::iter::repeat(GenerationRequest::new(E, x, y, z, dx, dy, dz)).take(N)
            })
            .collect()
    }
}

/// Parse and check an input string, returning the expanded requests with the options and generator settings.
pub fn input_from_str(input_toml: &str) -> Result<(Vec<GenerationRequest>, Options, GeneratorParameters)> {

    let input = InputFile::new(input_toml)?;
    let options = input.options;
    let generator = input.generator;
    let requests = input.requests;

    //Ensure nonsensical threads/attempts options fail on input
    ensure!(options.num_threads > 0, "Input error: num_threads must be greater than zero.");
    ensure!(options.max_attempts > 0, "Input error: max_attempts must be greater than zero.");
    ensure!(options.write_buffer_size > 0, "Input error: write_buffer_size must be greater than zero.");

    //Check that request arrays are equal length
    ensure!(requests.N.len() == requests.E.len(), "Input error: request input arrays of unequal length.");
    ensure!(requests.N.len() == requests.pos.len(), "Input error: request input arrays of unequal length.");
    ensure!(requests.N.len() == requests.dir.len(), "Input error: request input arrays of unequal length.");

    for (index, (E, (dx, dy, dz))) in requests.E.iter().zip(&requests.dir).enumerate() {
        ensure!(E.is_finite() && *E >= 0., "Input error: request {} energy {} must be a non-negative number.", index, E);
        ensure!(Vector::new(*dx, *dy, *dz).magnitude() > 0., "Input error: request {} direction has zero norm.", index);
    }

    Ok((requests.expand(), options, generator))
}

/// Read the input file at `input_file`.
pub fn input(input_file: &str) -> Result<(Vec<GenerationRequest>, Options, GeneratorParameters)> {
    let input_toml = std::fs::read_to_string(input_file)
        .with_context(|| format!("Input file {} not found.", input_file))?;
    input_from_str(&input_toml)
}
