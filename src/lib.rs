#![allow(non_snake_case)]
#![allow(non_camel_case_types)]

use std::fmt;

//Error handling crates
use anyhow::{Context, Result, ensure};
use thiserror::Error;

//Serializing/Deserializing crate
use serde::*;

//I/O
use std::fs::OpenOptions;
use std::io::prelude::*;
use std::io::BufWriter;

//Logging
use tracing::{debug, info, trace, warn};

//Parallelization and progress bar
use rayon::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};

//itertools
use itertools::{izip, Itertools};

//Math
use std::f64::consts::PI;

//Load internal modules
pub mod structs;
pub mod geometry;
pub mod consts;
pub mod collision;
pub mod store;
pub mod random;
pub mod enums;
pub mod generator;
pub mod input;
pub mod output;
pub mod simulation;


pub use crate::structs::Vector;
pub use crate::geometry::{GeometryError, Transform};
pub use crate::consts::*;
pub use crate::collision::{CollisionInput, CollisionRecord, TrackSummary};
pub use crate::store::{CollisionQuery, CollisionStore, MemoryStore, StoreError};
pub use crate::random::{RandomSource, SeededSource, draw_uniform, random_integer};
pub use crate::enums::TrackPolicy;
pub use crate::generator::{GenerationError, GenerationRequest, TrackGenerator};
pub use crate::input::{GeneratorParameters, InputFile, Options, RequestParameters};
pub use crate::output::Summary;

/// Generate a single track from a library file with default generator settings and a seeded source.
pub fn generate_track(library: &str, policy: TrackPolicy, seed: u64, E: f64, x: f64, y: f64, z: f64, ux: f64, uy: f64, uz: f64)
    -> Result<Vec<CollisionRecord>> {

    let store = MemoryStore::from_file(library)?;
    let generator = TrackGenerator::new(store, policy);
    let mut rng = SeededSource::new(seed);
    Ok(generator.generate(E, x, y, z, ux, uy, uz, &mut rng)?)
}
