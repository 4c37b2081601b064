use std::env;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use libTrimTrack::*;

fn main() -> Result<()> {

    let args: Vec<String> = env::args().collect();

    let input_file = match args.len() {
        1 => "input.toml".to_string(),
        2 => args[1].clone(),
        _ => {
            eprintln!("Usage: TrimTrack <input.toml>");
            std::process::exit(1);
        }
    };

    let (requests, options, parameters) = input::input(&input_file)?;

    //RUST_LOG takes precedence over the log_level option
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.log_level))
        .with_context(|| format!("Input error: invalid log_level {}.", options.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Welcome to TrimTrack! Input: {}", input_file);

    let summary = simulation::run_with(requests, &options, &parameters)?;
    if summary.num_failed() > 0 {
        error!("{} of {} requests failed; see {}summary.output.", summary.num_failed(), summary.num_requested, options.name);
    }
    Ok(())
}
