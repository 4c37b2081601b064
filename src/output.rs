use super::*;
use std::collections::BTreeMap;
use std::fs::File;

/// Buffered streams for list output.
pub struct OutputListStreams {
    pub track_file_stream: BufWriter<File>,
}

fn open_output_file(options: &Options, suffix: &str) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(format!("{}{}", options.name, suffix))
        .with_context(|| format!("Output error: could not open {}{}.", options.name, suffix))
}

/// Open list output files for streaming write
pub fn open_output_lists(options: &Options) -> Result<OutputListStreams> {
    let track_file = open_output_file(options, "tracks.output")?;
    let track_file_stream = BufWriter::with_capacity(options.write_buffer_size, track_file);

    Ok(OutputListStreams {
        track_file_stream,
    })
}

/// Write one CSV line per collision of a generated track:
/// request, event, collision_id, E, recoil_ion, E_recoil, x, y, z, ux0, uy0, uz0, ux1, uy1, uz1, dr, dE
pub fn output_track<W: Write>(stream: &mut W, request_index: usize, track: &[CollisionRecord]) -> std::io::Result<()> {
    for (event_index, collision) in track.iter().enumerate() {
        writeln!(
            stream, "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            request_index, event_index, collision.collision_id,
            collision.incident_energy, collision.recoil_ion, collision.recoil_energy,
            collision.position.x, collision.position.y, collision.position.z,
            collision.incident_direction.x, collision.incident_direction.y, collision.incident_direction.z,
            collision.scattering_direction.x, collision.scattering_direction.y, collision.scattering_direction.z,
            collision.distance_to_next_collision, collision.energy_loss
        )?;
    }
    Ok(())
}

/// Write output lists
pub fn output_lists(output_list_streams: &mut OutputListStreams, request_index: usize, track: &[CollisionRecord], options: &Options) -> Result<()> {
    output_track(&mut output_list_streams.track_file_stream, request_index, track)
        .with_context(|| format!("Output error: could not write to {}tracks.output.", options.name))
}

/// Flush output list streams
pub fn output_list_flush(output_list_streams: &mut OutputListStreams) -> Result<()> {
    output_list_streams.track_file_stream.flush().context("Output error: could not flush track output.")
}

/// Batch-wide summary tracker.
#[derive(Default)]
pub struct Summary {
    pub num_requested: usize,
    pub num_generated: usize,
    pub num_collisions: usize,
    pub num_transfers: usize,
    pub path_length: f64,
    pub deposited_energy: f64,
    pub failures: BTreeMap<String, usize>,
    pub per_request: Vec<(usize, TrackSummary)>,
}

impl Summary {
    pub fn new(num_requested: usize) -> Summary {
        Summary {
            num_requested,
            ..Default::default()
        }
    }

    pub fn add(&mut self, request_index: usize, track: &[CollisionRecord]) {
        let track_summary = TrackSummary::from_track(track);
        self.num_generated += 1;
        self.num_collisions += track_summary.num_collisions;
        self.num_transfers += track_summary.num_transfers();
        self.path_length += track_summary.path_length;
        self.deposited_energy += track_summary.deposited_energy();
        self.per_request.push((request_index, track_summary));
    }

    /// Count a failed request under the kind of error that stopped it.
    pub fn add_failure(&mut self, error: &GenerationError) {
        *self.failures.entry(failure_kind(error).to_string()).or_insert(0) += 1;
    }

    pub fn num_failed(&self) -> usize {
        self.failures.values().sum()
    }

    /// Write per-request lines followed by batch totals and failure counts.
    pub fn write<W: Write>(&self, stream: &mut W) -> std::io::Result<()> {
        writeln!(stream, "request, collisions, segments, path_length, recoil_energy, energy_loss")?;
        for (request_index, track_summary) in self.per_request.iter().sorted_by_key(|(index, _)| *index) {
            writeln!(stream, "{}, {}, {}, {}, {}, {}",
                request_index, track_summary.num_collisions, track_summary.num_segments,
                track_summary.path_length, track_summary.recoil_energy, track_summary.energy_loss)?;
        }
        writeln!(stream, "requested, generated, failed, collisions, transfers, path_length, deposited_energy")?;
        writeln!(stream, "{}, {}, {}, {}, {}, {}, {}",
            self.num_requested, self.num_generated, self.num_failed(), self.num_collisions,
            self.num_transfers, self.path_length, self.deposited_energy)?;
        for (kind, count) in &self.failures {
            writeln!(stream, "failure, {}, {}", kind, count)?;
        }
        Ok(())
    }

    pub fn print(&self, options: &Options) -> Result<()> {
        let summary_output_file = open_output_file(options, "summary.output")?;
        let mut writer = BufWriter::with_capacity(options.write_buffer_size, summary_output_file);
        self.write(&mut writer)
            .and_then(|_| writer.flush())
            .with_context(|| format!("Output error: could not write to {}summary.output.", options.name))
    }
}

/// Short name of a generation error kind, used as a failure counter key.
pub fn failure_kind(error: &GenerationError) -> &'static str {
    match error {
        GenerationError::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
        GenerationError::InvalidDirection => "INVALID_DIRECTION",
        GenerationError::EnergyOutOfRange{..} => "ENERGY_OUT_OF_RANGE",
        GenerationError::EmptyLibrary => "EMPTY_LIBRARY",
        GenerationError::Query(_) => "QUERY",
        GenerationError::CorruptLibrary{..} => "CORRUPT_LIBRARY",
        GenerationError::GeometryUndefined(_) => "GEOMETRY_UNDEFINED",
    }
}
