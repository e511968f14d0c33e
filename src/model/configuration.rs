//! Configuration record - valid-range bounds attached to a channel

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Valid-range bounds for a channel's readings.
///
/// At most one configuration exists per channel; creating a second one
/// through the lifecycle component updates the existing record in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Configuration {
    id: Uuid,
    channel_id: Uuid,
    min_value: f64,
    max_value: f64,
}

impl Configuration {
    /// Create a new configuration for the given channel.
    #[must_use]
    pub fn new(channel_id: Uuid, min_value: f64, max_value: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel_id,
            min_value,
            max_value,
        }
    }

    /// Get the configuration identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Get the owning channel identifier.
    #[must_use]
    pub const fn channel_id(&self) -> Uuid {
        self.channel_id
    }

    /// Get the minimum valid value.
    #[must_use]
    pub const fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Get the maximum valid value.
    #[must_use]
    pub const fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Replace both bounds.
    pub fn set_bounds(&mut self, min_value: f64, max_value: f64) {
        self.min_value = min_value;
        self.max_value = max_value;
    }

    /// Whether a reading falls inside the configured range (inclusive).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min_value && value <= self.max_value
    }
}
