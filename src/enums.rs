use super::*;

/// Track generation policy. Each policy extends the one before it.
#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Copy, Debug)]
pub enum TrackPolicy {
    /// Truncate by energy, align the first collision to the requested pose, propagate the alignment.
    BASIC,
    /// BASIC, plus a random azimuthal rotation about the incident direction at every collision.
    PHI_RANDOM,
    /// PHI_RANDOM, plus stochastic transfer of the remaining track onto an energy-matched library continuation.
    SPLICING,
}

impl TrackPolicy {
    pub fn randomizes_phi(&self) -> bool {
        matches!(self, TrackPolicy::PHI_RANDOM | TrackPolicy::SPLICING)
    }

    pub fn splices(&self) -> bool {
        *self == TrackPolicy::SPLICING
    }
}

impl fmt::Display for TrackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TrackPolicy::BASIC => write!(f, "Energy-truncated, aligned library tracks"),
            TrackPolicy::PHI_RANDOM => write!(f, "Aligned library tracks with randomized azimuth"),
            TrackPolicy::SPLICING => write!(f, "Aligned library tracks with randomized azimuth and energy-matched transfers"),
        }
    }
}
