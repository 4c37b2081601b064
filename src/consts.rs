use super::*;

/// Canonical forward axis; stored tracks are assumed to start along it when no direction was recorded.
pub const FORWARD_AXIS: Vector = Vector { x: 1., y: 0., z: 0. };
/// Cross-product magnitude below which two unit directions count as (anti)parallel.
pub const PARALLEL_TOLERANCE: f64 = 1E-12;
/// Tolerance on unit norms and determinants of generated geometry.
pub const UNIT_TOLERANCE: f64 = 1E-9;
/// Default half-width of the transfer energy window, as a fraction of the segment energy loss.
pub const DEFAULT_ENERGY_MARGIN_RATIO: f64 = 0.5;
/// Default probability of attempting a transfer at each eligible collision.
pub const DEFAULT_TRANSFER_PROBABILITY: f64 = 0.0;
/// 2 pi.
pub const TWO_PI: f64 = 2.*PI;
