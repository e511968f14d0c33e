//! Channel record - one measurement stream within an experiment

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical quantity a channel measures.
///
/// Serialized names are the stable wire vocabulary of the capture
/// deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Temperature probe.
    #[serde(rename = "temperatura")]
    Temperature,
    /// Current probe.
    #[serde(rename = "corriente")]
    Current,
    /// Voltage probe.
    #[serde(rename = "voltaje")]
    Voltage,
    /// Magnetic field probe.
    #[serde(rename = "campo_magnetico")]
    MagneticField,
}

impl ChannelKind {
    /// Stable wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperatura",
            Self::Current => "corriente",
            Self::Voltage => "voltaje",
            Self::MagneticField => "campo_magnetico",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A measurement channel owned by an experiment.
///
/// Holds a one-directional foreign key to its experiment; it exists only
/// while the experiment exists and is removed with it by the cascade
/// coordinator. Channels may be added only while the owning experiment is
/// still in the `Created` state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    id: Uuid,
    experiment_id: Uuid,
    kind: ChannelKind,
    name: String,
    unit: String,
}

impl Channel {
    /// Create a new channel for the given experiment.
    #[must_use]
    pub fn new(
        experiment_id: Uuid,
        kind: ChannelKind,
        name: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            experiment_id,
            kind,
            name: name.into(),
            unit: unit.into(),
        }
    }

    /// Get the channel identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Get the owning experiment identifier.
    #[must_use]
    pub const fn experiment_id(&self) -> Uuid {
        self.experiment_id
    }

    /// Get the measurement kind.
    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Get the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the unit string (e.g. `"°C"`, `"mA"`).
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Replace the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replace the unit string.
    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_creation() {
        let exp_id = Uuid::new_v4();
        let ch = Channel::new(exp_id, ChannelKind::Temperature, "horno", "°C");
        assert_eq!(ch.experiment_id(), exp_id);
        assert_eq!(ch.kind(), ChannelKind::Temperature);
        assert_eq!(ch.unit(), "°C");
    }

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&ChannelKind::MagneticField).unwrap();
        assert_eq!(json, "\"campo_magnetico\"");
        let kind: ChannelKind = serde_json::from_str("\"corriente\"").unwrap();
        assert_eq!(kind, ChannelKind::Current);
    }
}
