use super::*;

/// Ways a single generation request can fail.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation error: collision library is not accessible.")]
    SourceUnavailable(#[source] StoreError),
    #[error("Generation error: direction vector has zero norm.")]
    InvalidDirection,
    #[error("Generation error: no collision in track {track_id} brackets E = {energy} eV.")]
    EnergyOutOfRange { energy: f64, track_id: i64 },
    #[error("Generation error: collision library holds no tracks.")]
    EmptyLibrary,
    #[error(transparent)]
    Query(#[from] StoreError),
    #[error("Generation error: collision {collision_id} is missing from its own track {track_id}.")]
    CorruptLibrary { track_id: i64, collision_id: i64 },
    #[error(transparent)]
    GeometryUndefined(#[from] GeometryError),
}

/// Requested starting pose and kinetic energy of a track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationRequest {
    pub energy: f64,
    pub position: Vector,
    pub direction: Vector,
}

impl GenerationRequest {
    pub fn new(energy: f64, x: f64, y: f64, z: f64, dx: f64, dy: f64, dz: f64) -> GenerationRequest {
        GenerationRequest {
            energy,
            position: Vector::new(x, y, z),
            direction: Vector::new(dx, dy, dz),
        }
    }
}

/// Synthesizes ion tracks by resampling and re-anchoring collision sequences from a `CollisionStore`.
pub struct TrackGenerator<S: CollisionStore> {
    store: S,
    policy: TrackPolicy,
    transfer_probability: f64,
    energy_margin_ratio: f64,
    track_id_min: Option<i64>,
    track_id_max: Option<i64>,
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.
    } else {
        value.clamp(0., 1.)
    }
}

impl<S: CollisionStore> TrackGenerator<S> {
    pub fn new(store: S, policy: TrackPolicy) -> TrackGenerator<S> {
        TrackGenerator {
            store,
            policy,
            transfer_probability: DEFAULT_TRANSFER_PROBABILITY,
            energy_margin_ratio: DEFAULT_ENERGY_MARGIN_RATIO,
            track_id_min: None,
            track_id_max: None,
        }
    }

    /// Construct a generator configured from the `[generator]` block of an input file.
    pub fn from_parameters(store: S, parameters: &GeneratorParameters) -> TrackGenerator<S> {
        let mut generator = TrackGenerator::new(store, parameters.policy);
        generator.set_transfer_probability(parameters.transfer_probability);
        generator.set_energy_margin_ratio(parameters.energy_margin_ratio);
        generator.set_track_id_min(parameters.track_id_min.unwrap_or(-1));
        generator.set_track_id_max(parameters.track_id_max.unwrap_or(-1));
        generator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> TrackPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: TrackPolicy) {
        self.policy = policy;
    }

    pub fn transfer_probability(&self) -> f64 {
        self.transfer_probability
    }

    /// Probability of attempting a transfer at each eligible collision, clamped to [0, 1].
    pub fn set_transfer_probability(&mut self, probability: f64) {
        self.transfer_probability = clamp_unit(probability);
    }

    pub fn energy_margin_ratio(&self) -> f64 {
        self.energy_margin_ratio
    }

    /// Half-width of the transfer energy window in units of the segment energy loss, clamped to [0, 1].
    pub fn set_energy_margin_ratio(&mut self, ratio: f64) {
        self.energy_margin_ratio = clamp_unit(ratio);
    }

    pub fn track_id_min(&self) -> Option<i64> {
        self.track_id_min
    }

    /// Lower end of the sampling window; negative ids unset it.
    pub fn set_track_id_min(&mut self, track_id: i64) {
        self.track_id_min = if track_id >= 0 { Some(track_id) } else { None };
    }

    pub fn track_id_max(&self) -> Option<i64> {
        self.track_id_max
    }

    /// Upper end of the sampling window; negative ids unset it.
    pub fn set_track_id_max(&mut self, track_id: i64) {
        self.track_id_max = if track_id >= 0 { Some(track_id) } else { None };
    }

    pub fn is_accessible(&self) -> bool {
        self.store.check_accessible().is_ok()
    }

    /// Stored track with the given id, untouched.
    pub fn fetch_track(&self, track_id: i64) -> Result<Vec<CollisionRecord>, GenerationError> {
        self.store.check_accessible().map_err(GenerationError::SourceUnavailable)?;
        Ok(self.store.fetch_track(track_id)?)
    }

    /// Generate one track starting at (x, y, z) along (dx, dy, dz) with kinetic energy `energy`.
    pub fn generate<R: RandomSource + ?Sized>(&self, energy: f64, x: f64, y: f64, z: f64,
        dx: f64, dy: f64, dz: f64, rng: &mut R) -> Result<Vec<CollisionRecord>, GenerationError> {
        self.generate_request(&GenerationRequest::new(energy, x, y, z, dx, dy, dz), rng)
    }

    pub fn generate_request<R: RandomSource + ?Sized>(&self, request: &GenerationRequest, rng: &mut R)
        -> Result<Vec<CollisionRecord>, GenerationError> {

        self.store.check_accessible().map_err(GenerationError::SourceUnavailable)?;

        let mut direction = request.direction;
        if !direction.normalize() || !direction.magnitude().is_finite() {
            return Err(GenerationError::InvalidDirection);
        }

        let mut track = self.sample_track(rng)?;
        truncate_by_energy(&mut track, request.energy)?;

        let mut transform = anchor_first_collision(&mut track[0], request.energy, &request.position, &direction)?;
        if self.policy.randomizes_phi() {
            randomize_phi(&mut track[0], &mut transform, rng)?;
        }

        //The tail may be replaced by a transfer, so walk by index
        let mut index = 1;
        while index < track.len() {
            let (head, tail) = track.split_at_mut(index);
            adapt_collision(&head[index - 1], &mut tail[0], &transform);

            if self.policy.randomizes_phi() {
                randomize_phi(&mut tail[0], &mut transform, rng)?;
            }
            trace!("{}", tail[0]);

            if self.policy.splices()
                && self.transfer_probability > 0.
                && transfer_eligible(&track[index])
                && draw_uniform(rng) < self.transfer_probability {
                self.transfer(&mut track, index, &mut transform, rng)?;
            }
            index += 1;
        }

        Ok(track)
    }

    /// Calls `generate_request` up to `attempts` times, drawing a fresh library track whenever the sampled one
    /// does not bracket the requested energy.
    pub fn generate_with_retries<R: RandomSource + ?Sized>(&self, request: &GenerationRequest, attempts: usize, rng: &mut R)
        -> Result<Vec<CollisionRecord>, GenerationError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.generate_request(request, rng) {
                Err(GenerationError::EnergyOutOfRange{energy, track_id}) if attempt < attempts => {
                    debug!("Track {} does not reach E = {} eV; resampling ({} of {}).", track_id, energy, attempt, attempts);
                    attempt += 1;
                },
                result => return result,
            }
        }
    }

    /// Track index range actually sampled, given the number of tracks in the library.
    /// An empty or inverted configured window falls back to the whole library.
    pub fn sampling_window(&self, num_tracks: i64) -> (i64, i64) {
        let min = self.track_id_min.unwrap_or(0);
        let max = match self.track_id_max {
            Some(max) if max < num_tracks => max,
            _ => num_tracks - 1,
        };

        if min <= max {
            (min, max)
        } else {
            warn!("Track index window [{:?}, {:?}] holds no tracks of {}; sampling the whole library.",
                self.track_id_min, self.track_id_max, num_tracks);
            (0, num_tracks - 1)
        }
    }

    /// Draw one track uniformly from the sampling window and fetch it in collision order.
    pub fn sample_track<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<Vec<CollisionRecord>, GenerationError> {
        let num_tracks = self.store.count_tracks(None)? as i64;
        if num_tracks == 0 {
            return Err(GenerationError::EmptyLibrary);
        }
        let (min, max) = self.sampling_window(num_tracks);
        let track_id = random_integer(rng, min, max);
        trace!("Sampled track {} from [{}, {}].", track_id, min, max);
        Ok(self.store.fetch_track(track_id)?)
    }

    /// Library collisions whose continuation can replace a track after a collision with post-recoil energy
    /// `energy`: post-recoil energy inside [energy_min, energy_max], next energy in (0, energy), onward distance
    /// positive, within the configured track window.
    pub fn transfer_candidates(&self, energy: f64, energy_min: f64, energy_max: f64) -> Result<Vec<CollisionRecord>, StoreError> {
        //An inverted window holds no tracks; search the whole library, as sampling does
        let (min, max) = match (self.track_id_min, self.track_id_max) {
            (Some(min), Some(max)) if min > max => (None, None),
            window => window,
        };
        let query = CollisionQuery::new()
            .kinetic_energy_between(energy_min, energy_max)
            .next_energy_below(energy)
            .next_energy_above(0.)
            .distance_above(0.)
            .track_ids(min, max);
        trace!("Transfer candidate query: {}", query);
        self.store.fetch_matching(&query, None)
    }

    /// Replace everything after `track[index]` by the continuation of an energy-matched library collision.
    ///
    /// Returns Ok(false) without touching the track when no usable destination exists. On success the current
    /// collision's energy loss and distance are rescaled to bridge onto the continuation, and `transform` is reset
    /// so the continuation's recorded directions are carried onto the current scattering direction.
    pub fn transfer<R: RandomSource + ?Sized>(&self, track: &mut Vec<CollisionRecord>, index: usize,
        transform: &mut Transform, rng: &mut R) -> Result<bool, GenerationError> {

        let current = &track[index];
        let energy = current.kinetic_energy_after_recoil();
        let de = current.energy_loss;
        let dr = current.distance_to_next_collision;
        let scattering_direction = current.scattering_direction;

        if energy - de <= 0. {
            debug!("Transfer requested at the end of track {}; ignored.", current.track_id);
            return Ok(false);
        }
        if de <= 0. {
            debug!("No energy loss after collision {}:{}; transfer ignored.", current.track_id, current.collision_id);
            return Ok(false);
        }

        let margin = de*self.energy_margin_ratio;
        let candidates = self.transfer_candidates(energy, energy - margin, energy + margin)?;
        if candidates.is_empty() {
            debug!("No transfer destination for E = {} eV +/- {} eV.", energy, margin);
            return Ok(false);
        }

        let selected = &candidates[random_integer(rng, 0, candidates.len() as i64 - 1) as usize];
        let energy_destination = selected.kinetic_energy_at_next();

        let mut destination = self.store.fetch_track(selected.track_id)?;
        let position = destination.iter()
            .position(|collision| collision.collision_id == selected.collision_id)
            .ok_or(GenerationError::CorruptLibrary{track_id: selected.track_id, collision_id: selected.collision_id})?;
        let continuation = destination.split_off(position + 1);

        if continuation.is_empty() {
            debug!("Collision {}:{} has no continuation; transfer ignored.", selected.track_id, selected.collision_id);
            return Ok(false);
        }

        let rotation = match alignment_rotation(&continuation[0].incident_direction, &scattering_direction) {
            Ok(rotation) => rotation,
            Err(error) => {
                debug!("Cannot align continuation of {}:{} ({}); transfer ignored.", selected.track_id, selected.collision_id, error);
                return Ok(false);
            }
        };

        let de_new = energy - energy_destination;
        let dr_per_de = transfer_distance_ratio(de, dr, selected.energy_loss, selected.distance_to_next_collision, de_new);
        let dr_new = de_new*dr_per_de;

        debug!("Transfer onto {}:{} at E = {} eV: dE {} -> {} eV, dr {} -> {}.",
            selected.track_id, selected.collision_id, energy, de, de_new, dr, dr_new);

        let current = &mut track[index];
        current.energy_loss = de_new;
        current.distance_to_next_collision = dr_new;

        track.truncate(index + 1);
        track.extend(continuation);
        *transform = rotation;

        Ok(true)
    }
}

/// Drop every collision before the first one whose energy window [E_next, E_incident] contains `energy`.
pub fn truncate_by_energy(track: &mut Vec<CollisionRecord>, energy: f64) -> Result<(), GenerationError> {
    let start = track.iter()
        .position(|collision| collision.brackets_energy(energy))
        .ok_or_else(|| GenerationError::EnergyOutOfRange{
            energy,
            track_id: track.first().map_or(-1, |collision| collision.track_id)
        })?;
    track.drain(..start);
    Ok(())
}

/// Re-anchor the first collision at the requested pose and energy.
///
/// The segment to the next collision is shortened in proportion to the energy not yet spent on it. Returns the
/// rotation carrying the collision's recorded reference direction (scattering, else incident, else the forward
/// axis) onto `direction`, which must be a unit vector.
pub fn anchor_first_collision(collision: &mut CollisionRecord, energy: f64, position: &Vector, direction: &Vector)
    -> Result<Transform, GeometryError> {

    let energy_after_recoil = collision.kinetic_energy_after_recoil();
    let de = collision.energy_loss;
    let de_ratio = if de != 0. { (de - (energy_after_recoil - energy))/de } else { 1. };

    collision.incident_energy = energy;
    collision.recoil_energy = 0.;
    collision.energy_loss = de*de_ratio;
    collision.distance_to_next_collision *= de_ratio;

    let scattering_defined = !collision.scattering_direction.is_zero();
    let reference = if scattering_defined {
        collision.scattering_direction
    } else if !collision.incident_direction.is_zero() {
        collision.incident_direction
    } else {
        FORWARD_AXIS
    };
    let transform = alignment_rotation(&reference, direction)?;

    collision.position = *position;
    collision.incident_direction = *direction;
    if scattering_defined {
        collision.scattering_direction = *direction;
    }
    Ok(transform)
}

/// Place `collision` at the end of the previous segment and carry its recorded directions through `transform`.
pub fn adapt_collision(previous: &CollisionRecord, collision: &mut CollisionRecord, transform: &Transform) {
    collision.position = previous.position.add(
        &previous.scattering_direction.scale(previous.distance_to_next_collision));

    let incident_direction = transform.apply(&collision.incident_direction);
    collision.set_incident_direction(&incident_direction);
    let scattering_direction = transform.apply(&collision.scattering_direction);
    collision.set_scattering_direction(&scattering_direction);
}

/// Rotate the scattering direction by a random azimuth about the incident direction and fold that rotation
/// into `transform`. No-op when the incident direction is undefined.
pub fn randomize_phi<R: RandomSource + ?Sized>(collision: &mut CollisionRecord, transform: &mut Transform, rng: &mut R)
    -> Result<(), GeometryError> {

    if collision.incident_direction.is_zero() {
        return Ok(());
    }

    let phi = TWO_PI*draw_uniform(rng);
    let rotation = Transform::rotation(&collision.incident_direction, phi)?;

    let scattering_direction = rotation.apply(&collision.scattering_direction);
    collision.set_scattering_direction(&scattering_direction);

    *transform = rotation.compose(transform);
    transform.renormalize();
    Ok(())
}

/// A transfer may only be attempted after a collision that still loses energy over a defined, non-empty segment
/// and leaves the ion with energy.
pub fn transfer_eligible(collision: &CollisionRecord) -> bool {
    collision.energy_loss > 0.
        && collision.distance_to_next_collision > 0.
        && !collision.scattering_direction.is_zero()
        && collision.kinetic_energy_at_next() > 0.
}

/// dr/dE slope for the bridging segment of a transfer.
///
/// Uses the destination collision's slope when its energy loss is closer to `de_new` in log distance than the
/// source's, and the source slope otherwise. `de_src` must be positive.
pub fn transfer_distance_ratio(de_src: f64, dr_src: f64, de_dst: f64, dr_dst: f64, de_new: f64) -> f64 {
    //TODO: re-derive this choice from the stopping power instead of the log-distance tie-break
    let log_distance = |a: f64, b: f64| (a.ln() - b.ln()).abs();
    if de_dst > 0. && log_distance(de_dst, de_new) < log_distance(de_src, de_new) {
        dr_dst/de_dst
    } else {
        dr_src/de_src
    }
}

/// Rotation taking `from` onto `to`. Antiparallel inputs, which have no unique axis, are turned by pi about an
/// arbitrary axis perpendicular to `from`.
pub fn alignment_rotation(from: &Vector, to: &Vector) -> Result<Transform, GeometryError> {
    match Transform::rotation_between(from, to) {
        Err(GeometryError::DegenerateAxis) => Transform::rotation(&from.perpendicular()?, PI),
        result => result,
    }
}
