use super::*;

/// Generate one track per request. Request i draws from its own `SeededSource` seeded with `seed + i`, so the
/// outcome of a request does not depend on the thread count or on the other requests.
pub fn generate_tracks<S: CollisionStore>(requests: &[GenerationRequest], generator: &TrackGenerator<S>, options: &Options,
    bar: &ProgressBar) -> Vec<(usize, Result<Vec<CollisionRecord>, GenerationError>)> {

    let generate = |(request_index, request): (usize, &GenerationRequest)| {
        let mut rng = SeededSource::new(options.seed.wrapping_add(request_index as u64));
        let track = generator.generate_with_retries(request, options.max_attempts, &mut rng);
        bar.inc(1);
        (request_index, track)
    };

    if options.num_threads > 1 {
        requests.par_iter().enumerate().map(generate).collect()
    } else {
        requests.iter().enumerate().map(generate).collect()
    }
}

/// Generate every request, stream the tracks to `{name}tracks.output` and write `{name}summary.output`.
/// A failed request is logged and counted; it never stops the batch.
pub fn generation_loop<S: CollisionStore>(requests: Vec<GenerationRequest>, generator: &TrackGenerator<S>, options: &Options) -> Result<Summary> {

    info!("Processing {} requests with policy {:?}...", requests.len(), generator.policy());

    let mut output_list_streams = output::open_output_lists(options)?;
    let mut summary = Summary::new(requests.len());

    //Create and configure progress bar
    let bar: ProgressBar = ProgressBar::new(requests.len() as u64);
    bar.set_style(ProgressStyle::default_bar()
        .template("[{elapsed_precise}][{bar:40.cyan/blue}][{eta_precise}] {percent}%")
        .progress_chars("#>-"));

    let results = if options.num_threads > 1 {
        info!("Initializing with {} threads...", options.num_threads);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.num_threads)
            .build()
            .context("Could not start the thread pool.")?;
        pool.install(|| generate_tracks(&requests, generator, options, &bar))
    } else {
        generate_tracks(&requests, generator, options, &bar)
    };
    bar.finish();

    for (request_index, result) in results {
        match result {
            Ok(track) => {
                output::output_lists(&mut output_list_streams, request_index, &track, options)?;
                summary.add(request_index, &track);
            },
            Err(error) => {
                warn!("Request {} failed: {}", request_index, error);
                summary.add_failure(&error);
            }
        }
    }

    //Flush all file streams before dropping to ensure all data is written
    output::output_list_flush(&mut output_list_streams)?;
    summary.print(options)?;

    info!("Finished! Generated {} of {} tracks ({} transfers).",
        summary.num_generated, summary.num_requested, summary.num_transfers);
    Ok(summary)
}

/// Read an input file, open its library and run the batch.
pub fn run(input_file: &str) -> Result<Summary> {
    let (requests, options, parameters) = input::input(input_file)?;
    run_with(requests, &options, &parameters)
}

pub fn run_with(requests: Vec<GenerationRequest>, options: &Options, parameters: &GeneratorParameters) -> Result<Summary> {
    let store = MemoryStore::from_file(&options.library)
        .with_context(|| format!("Input error: could not load collision library {}.", options.library))?;
    info!("Loaded {} collisions in {} tracks from {}.",
        store.count_collisions(None)?, store.count_tracks(None)?, options.library);

    let generator = TrackGenerator::from_parameters(store, parameters);
    generation_loop(requests, &generator, options)
}
