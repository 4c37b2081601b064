use super::*;

/// Library-file form of a collision, as stored by the collision library builder.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CollisionInput {
    pub track_id: i64,
    pub collision_id: i64,
    pub incident_energy: f64,
    pub incident_ion: String,
    pub mass_number: i32,
    #[serde(default)]
    pub recoil_ion: String,
    #[serde(default)]
    pub recoil_energy: f64,
    pub position: (f64, f64, f64),
    #[serde(default)]
    pub incident_direction: (f64, f64, f64),
    #[serde(default)]
    pub scattering_direction: (f64, f64, f64),
    #[serde(default)]
    pub distance_to_next_collision: f64,
    #[serde(default)]
    pub energy_loss: f64,
}

/// One scattering event along a track.
///
/// Energies are in eV and lengths in the unit of the library. A zero direction vector means the
/// direction is undefined (for example the scattering direction of the terminal event).
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionRecord {
    pub track_id: i64,
    pub collision_id: i64,
    pub incident_energy: f64,
    pub incident_ion: String,
    pub mass_number: i32,
    pub recoil_ion: String,
    pub recoil_energy: f64,
    pub position: Vector,
    pub incident_direction: Vector,
    pub scattering_direction: Vector,
    pub distance_to_next_collision: f64,
    pub energy_loss: f64,
}

impl CollisionRecord {
    /// Construct a collision record from library input; directions are normalized on the way in.
    pub fn from_input(input: CollisionInput) -> CollisionRecord {
        let (x, y, z) = input.position;
        let (ux0, uy0, uz0) = input.incident_direction;
        let (ux1, uy1, uz1) = input.scattering_direction;

        let mut collision = CollisionRecord {
            track_id: input.track_id,
            collision_id: input.collision_id,
            incident_energy: input.incident_energy,
            incident_ion: input.incident_ion,
            mass_number: input.mass_number,
            recoil_ion: input.recoil_ion,
            recoil_energy: input.recoil_energy,
            position: Vector::new(x, y, z),
            incident_direction: Vector::zero(),
            scattering_direction: Vector::zero(),
            distance_to_next_collision: input.distance_to_next_collision,
            energy_loss: input.energy_loss,
        };
        collision.set_incident_direction(&Vector::new(ux0, uy0, uz0));
        collision.set_scattering_direction(&Vector::new(ux1, uy1, uz1));
        collision
    }

    pub fn to_input(&self) -> CollisionInput {
        CollisionInput {
            track_id: self.track_id,
            collision_id: self.collision_id,
            incident_energy: self.incident_energy,
            incident_ion: self.incident_ion.clone(),
            mass_number: self.mass_number,
            recoil_ion: self.recoil_ion.clone(),
            recoil_energy: self.recoil_energy,
            position: (self.position.x, self.position.y, self.position.z),
            incident_direction: (self.incident_direction.x, self.incident_direction.y, self.incident_direction.z),
            scattering_direction: (self.scattering_direction.x, self.scattering_direction.y, self.scattering_direction.z),
            distance_to_next_collision: self.distance_to_next_collision,
            energy_loss: self.energy_loss,
        }
    }

    /// Stores the normalized direction, or the zero sentinel if `direction` has no length.
    pub fn set_incident_direction(&mut self, direction: &Vector) {
        self.incident_direction = direction.normalized();
    }

    /// Stores the normalized direction, or the zero sentinel if `direction` has no length.
    pub fn set_scattering_direction(&mut self, direction: &Vector) {
        self.scattering_direction = direction.normalized();
    }

    /// Kinetic energy left after the recoil has been struck.
    pub fn kinetic_energy_after_recoil(&self) -> f64 {
        self.incident_energy - self.recoil_energy
    }

    /// Kinetic energy on arrival at the next collision.
    pub fn kinetic_energy_at_next(&self) -> f64 {
        self.incident_energy - self.recoil_energy - self.energy_loss
    }

    /// True if `energy` lies in [energy at next collision, incident energy].
    pub fn brackets_energy(&self, energy: f64) -> bool {
        self.kinetic_energy_at_next() <= energy && energy <= self.incident_energy
    }

    pub fn is_terminal(&self) -> bool {
        self.distance_to_next_collision == 0. || self.scattering_direction.is_zero()
    }

    /// Field invariants every stored record must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        let checks = [
            (self.incident_energy, "incident_energy"),
            (self.recoil_energy, "recoil_energy"),
            (self.distance_to_next_collision, "distance_to_next_collision"),
            (self.energy_loss, "energy_loss"),
        ];
        for (value, name) in checks {
            if !(value >= 0.) {
                return Err(format!("track {} collision {}: {} = {} must be a non-negative number",
                    self.track_id, self.collision_id, name, value));
            }
        }
        Ok(())
    }
}

impl fmt::Display for CollisionRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Collision {}:{} E = {} eV E_recoil = {} eV dE = {} eV dr = {} at {}",
            self.track_id, self.collision_id, self.incident_energy, self.recoil_energy,
            self.energy_loss, self.distance_to_next_collision, self.position)
    }
}

/// Aggregate quantities of a generated track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackSummary {
    pub num_collisions: usize,
    pub path_length: f64,
    pub recoil_energy: f64,
    pub energy_loss: f64,
    pub num_segments: usize,
}

impl TrackSummary {
    /// Summarize a track. Segments are runs of consecutive records sharing a `track_id`, so a track with one
    /// transfer has two segments.
    pub fn from_track(track: &[CollisionRecord]) -> TrackSummary {
        let num_segments = track.iter().map(|collision| collision.track_id).dedup().count();
        TrackSummary {
            num_collisions: track.len(),
            path_length: track.iter().map(|collision| collision.distance_to_next_collision).sum(),
            recoil_energy: track.iter().map(|collision| collision.recoil_energy).sum(),
            energy_loss: track.iter().map(|collision| collision.energy_loss).sum(),
            num_segments,
        }
    }

    pub fn deposited_energy(&self) -> f64 {
        self.recoil_energy + self.energy_loss
    }

    pub fn num_transfers(&self) -> usize {
        self.num_segments.saturating_sub(1)
    }
}
