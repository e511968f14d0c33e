//! Flagged-sample record - marks a reading as out of configured range

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker that a sample fell outside its channel's configured valid range.
///
/// Carries one-directional foreign keys to the experiment, the channel, and
/// the sample; may be created only while the experiment is running.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlaggedSample {
    id: Uuid,
    experiment_id: Uuid,
    channel_id: Uuid,
    sample_id: Uuid,
}

impl FlaggedSample {
    /// Create a new flag for the given sample.
    #[must_use]
    pub fn new(experiment_id: Uuid, channel_id: Uuid, sample_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            experiment_id,
            channel_id,
            sample_id,
        }
    }

    /// Get the flag identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Get the experiment the flag belongs to.
    #[must_use]
    pub const fn experiment_id(&self) -> Uuid {
        self.experiment_id
    }

    /// Get the channel the flagged sample was captured on.
    #[must_use]
    pub const fn channel_id(&self) -> Uuid {
        self.channel_id
    }

    /// Get the flagged sample.
    #[must_use]
    pub const fn sample_id(&self) -> Uuid {
        self.sample_id
    }
}
