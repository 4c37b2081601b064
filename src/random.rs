use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

/// Source of uniform variates in [0, 1). Passed explicitly to every generation call.
pub trait RandomSource {
    fn uniform(&mut self) -> f64;
}

impl<F: FnMut() -> f64> RandomSource for F {
    fn uniform(&mut self) -> f64 {
        self()
    }
}

/// Reproducible source backed by a seeded `StdRng`.
pub struct SeededSource {
    rng: StdRng,
    distribution: Uniform<f64>,
}

impl SeededSource {
    pub fn new(seed: u64) -> SeededSource {
        SeededSource {
            rng: StdRng::seed_from_u64(seed),
            distribution: Uniform::new(0., 1.),
        }
    }
}

impl RandomSource for SeededSource {
    fn uniform(&mut self) -> f64 {
        self.distribution.sample(&mut self.rng)
    }
}

/// Draw from `source`, clamped to [0, 1] so a misbehaving source cannot push indices or angles out of range.
pub fn draw_uniform<R: RandomSource + ?Sized>(source: &mut R) -> f64 {
    let value = source.uniform();
    if value.is_nan() || value < 0. {
        0.
    } else if value > 1. {
        1.
    } else {
        value
    }
}

/// Uniform integer in [min, max]; the bounds may be given in either order.
pub fn random_integer<R: RandomSource + ?Sized>(source: &mut R, a: i64, b: i64) -> i64 {
    let min = a.min(b);
    let max = a.max(b);
    let value = min + (draw_uniform(source)*((max - min + 1) as f64)).floor() as i64;
    value.min(max)
}
