//! Sample record - one timestamped reading on a channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single numeric reading captured on a channel.
///
/// Samples may be created only while the owning experiment is running; the
/// guard lives in the lifecycle component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    id: Uuid,
    channel_id: Uuid,
    value: f64,
    captured_at: DateTime<Utc>,
}

impl Sample {
    /// Create a new sample stamped with the current time.
    #[must_use]
    pub fn new(channel_id: Uuid, value: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel_id,
            value,
            captured_at: Utc::now(),
        }
    }

    /// Get the sample identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Get the owning channel identifier.
    #[must_use]
    pub const fn channel_id(&self) -> Uuid {
        self.channel_id
    }

    /// Get the reading value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the capture timestamp.
    #[must_use]
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Override the capture timestamp (device-supplied capture time).
    #[must_use]
    pub const fn captured(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = at;
        self
    }

    /// Replace the reading value.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}
