use super::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Failures reported by a collision store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store error: collision library {0} cannot be opened.")]
    Unavailable(String),
    #[error("Store error: query could not be executed: {0}")]
    Query(String),
    #[error("Store error: collision library is corrupt: {0}")]
    Corrupt(String),
}

/// Read-only access to a library of previously simulated collision sequences.
///
/// Implementations must support concurrent independent readers if tracks are generated from several threads.
pub trait CollisionStore: Sync {
    /// Ok if the backing store can be opened for reading.
    fn check_accessible(&self) -> Result<(), StoreError>;

    /// Number of distinct tracks, or of tracks with the given id.
    fn count_tracks(&self, track_id: Option<i64>) -> Result<usize, StoreError>;

    /// Number of collisions in the whole library, or in the given track.
    fn count_collisions(&self, track_id: Option<i64>) -> Result<usize, StoreError>;

    /// All collisions of one track, sorted by ascending `collision_id`. Unknown ids give an empty track.
    fn fetch_track(&self, track_id: i64) -> Result<Vec<CollisionRecord>, StoreError>;

    /// Collisions satisfying every bound of `query`, at most `limit` of them.
    fn fetch_matching(&self, query: &CollisionQuery, limit: Option<usize>) -> Result<Vec<CollisionRecord>, StoreError>;
}

/// Conjunction of bounds over collision fields. Unset bounds match everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionQuery {
    /// Inclusive bounds on `incident_energy - recoil_energy`.
    pub kinetic_energy: Option<(f64, f64)>,
    /// Strict upper bound on the energy at the next collision.
    pub next_energy_below: Option<f64>,
    /// Strict lower bound on the energy at the next collision.
    pub next_energy_above: Option<f64>,
    /// Strict lower bound on `distance_to_next_collision`.
    pub distance_above: Option<f64>,
    /// Inclusive bounds on `track_id`.
    pub track_id_min: Option<i64>,
    pub track_id_max: Option<i64>,
}

impl CollisionQuery {
    pub fn new() -> CollisionQuery {
        CollisionQuery::default()
    }

    pub fn kinetic_energy_between(mut self, min: f64, max: f64) -> CollisionQuery {
        self.kinetic_energy = Some((min, max));
        self
    }

    pub fn next_energy_below(mut self, energy: f64) -> CollisionQuery {
        self.next_energy_below = Some(energy);
        self
    }

    pub fn next_energy_above(mut self, energy: f64) -> CollisionQuery {
        self.next_energy_above = Some(energy);
        self
    }

    pub fn distance_above(mut self, distance: f64) -> CollisionQuery {
        self.distance_above = Some(distance);
        self
    }

    pub fn track_ids(mut self, min: Option<i64>, max: Option<i64>) -> CollisionQuery {
        self.track_id_min = min;
        self.track_id_max = max;
        self
    }

    /// Reject bounds no store could execute.
    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some((min, max)) = self.kinetic_energy {
            if min.is_nan() || max.is_nan() {
                return Err(StoreError::Query("kinetic energy bound is NaN".to_string()));
            }
            if min > max {
                return Err(StoreError::Query(format!("kinetic energy bounds inverted: {} > {}", min, max)));
            }
        }
        for bound in [self.next_energy_below, self.next_energy_above, self.distance_above].iter().flatten() {
            if bound.is_nan() {
                return Err(StoreError::Query("bound is NaN".to_string()));
            }
        }
        if let (Some(min), Some(max)) = (self.track_id_min, self.track_id_max) {
            if min > max {
                return Err(StoreError::Query(format!("track id bounds inverted: {} > {}", min, max)));
            }
        }
        Ok(())
    }

    pub fn matches(&self, collision: &CollisionRecord) -> bool {
        let energy = collision.kinetic_energy_after_recoil();
        let energy_next = collision.kinetic_energy_at_next();

        self.kinetic_energy.map_or(true, |(min, max)| min <= energy && energy <= max)
            && self.next_energy_below.map_or(true, |bound| energy_next < bound)
            && self.next_energy_above.map_or(true, |bound| energy_next > bound)
            && self.distance_above.map_or(true, |bound| collision.distance_to_next_collision > bound)
            && self.track_id_min.map_or(true, |min| min <= collision.track_id)
            && self.track_id_max.map_or(true, |max| collision.track_id <= max)
    }
}

impl fmt::Display for CollisionQuery {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut terms = vec![];
        if let Some((min, max)) = self.kinetic_energy {
            terms.push(format!("{} <= e_inc - e_rec <= {}", min, max));
        }
        if let Some(bound) = self.next_energy_below {
            terms.push(format!("e_inc - e_rec - de < {}", bound));
        }
        if let Some(bound) = self.next_energy_above {
            terms.push(format!("{} < e_inc - e_rec - de", bound));
        }
        if let Some(bound) = self.distance_above {
            terms.push(format!("{} < dr", bound));
        }
        if let Some(min) = self.track_id_min {
            terms.push(format!("{} <= track_id", min));
        }
        if let Some(max) = self.track_id_max {
            terms.push(format!("track_id <= {}", max));
        }
        if terms.is_empty() {
            write!(f, "all collisions")
        } else {
            write!(f, "{}", terms.join(" AND "))
        }
    }
}

/// Library file layout: a list of `[[collisions]]` tables.
#[derive(Deserialize, Serialize)]
pub struct LibraryFile {
    #[serde(default)]
    pub collisions: Vec<CollisionInput>,
}

/// Collision library held in memory, keyed by track id. Each track is kept sorted by collision id.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tracks: BTreeMap<i64, Vec<CollisionRecord>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn from_records(records: Vec<CollisionRecord>) -> Result<MemoryStore, StoreError> {
        let mut store = MemoryStore::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    pub fn from_toml_str(string: &str) -> Result<MemoryStore, StoreError> {
        let library: LibraryFile = toml::from_str(string)
            .map_err(|error| StoreError::Corrupt(error.to_string()))?;
        MemoryStore::from_records(library.collisions.into_iter().map(CollisionRecord::from_input).collect())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<MemoryStore, StoreError> {
        let path = path.as_ref();
        let string = std::fs::read_to_string(path)
            .map_err(|error| StoreError::Unavailable(format!("{} ({})", path.display(), error)))?;
        MemoryStore::from_toml_str(&string)
    }

    /// Add one record, keeping its track ordered. A duplicate (track_id, collision_id) pair is rejected.
    pub fn insert(&mut self, record: CollisionRecord) -> Result<(), StoreError> {
        record.validate().map_err(StoreError::Corrupt)?;
        let track = self.tracks.entry(record.track_id).or_default();
        match track.binary_search_by_key(&record.collision_id, |collision| collision.collision_id) {
            Ok(_) => Err(StoreError::Corrupt(format!("duplicate collision {} in track {}",
                record.collision_id, record.track_id))),
            Err(index) => {
                track.insert(index, record);
                Ok(())
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, StoreError> {
        let library = LibraryFile {
            collisions: self.tracks.values().flatten().map(|collision| collision.to_input()).collect(),
        };
        toml::to_string(&library).map_err(|error| StoreError::Corrupt(error.to_string()))
    }
}

impl CollisionStore for MemoryStore {
    fn check_accessible(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn count_tracks(&self, track_id: Option<i64>) -> Result<usize, StoreError> {
        Ok(match track_id {
            Some(id) => self.tracks.get(&id).map_or(0, |track| (!track.is_empty()) as usize),
            None => self.tracks.values().filter(|track| !track.is_empty()).count(),
        })
    }

    fn count_collisions(&self, track_id: Option<i64>) -> Result<usize, StoreError> {
        Ok(match track_id {
            Some(id) => self.tracks.get(&id).map_or(0, |track| track.len()),
            None => self.tracks.values().map(|track| track.len()).sum(),
        })
    }

    fn fetch_track(&self, track_id: i64) -> Result<Vec<CollisionRecord>, StoreError> {
        Ok(self.tracks.get(&track_id).cloned().unwrap_or_default())
    }

    fn fetch_matching(&self, query: &CollisionQuery, limit: Option<usize>) -> Result<Vec<CollisionRecord>, StoreError> {
        query.validate()?;
        Ok(self.tracks.values()
            .flatten()
            .filter(|collision| query.matches(collision))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
