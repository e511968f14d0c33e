//! Experiment record and lifecycle state machine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Lifecycle state of an experiment.
///
/// Transitions: `Created → Running → {Finished, Aborted}`. `Finished` and
/// `Aborted` are terminal. Serialized names are the stable wire vocabulary
/// of the capture deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperimentState {
    /// Defined but not yet started; channels may still be added.
    #[serde(rename = "CREADO")]
    Created,
    /// Data collection in progress; samples may be appended.
    #[serde(rename = "EN_CURSO")]
    Running,
    /// Completed normally. Terminal.
    #[serde(rename = "FINALIZADO")]
    Finished,
    /// Cancelled mid-run. Terminal.
    #[serde(rename = "ABORTADO")]
    Aborted,
}

impl ExperimentState {
    /// Stable wire name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREADO",
            Self::Running => "EN_CURSO",
            Self::Finished => "FINALIZADO",
            Self::Aborted => "ABORTADO",
        }
    }
}

impl std::fmt::Display for ExperimentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-boxed data-collection run.
///
/// State and the start/end timestamps are always mutated together through
/// [`Experiment::start`], [`Experiment::finish`], and [`Experiment::abort`];
/// no other code path touches them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Experiment {
    id: Uuid,
    name: String,
    state: ExperimentState,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    duration_secs: u32,
}

impl Experiment {
    /// Create a new experiment in the `Created` state.
    ///
    /// Input validation (non-empty name, positive duration) belongs to the
    /// lifecycle component; the record itself stores what it is given.
    #[must_use]
    pub fn new(name: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            state: ExperimentState::Created,
            started_at: None,
            ended_at: None,
            duration_secs,
        }
    }

    /// Get the experiment identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ExperimentState {
        self.state
    }

    /// Get the start timestamp, if the experiment has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the experiment has finished or aborted.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Get the planned duration in seconds.
    #[must_use]
    pub const fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Replace the experiment name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replace the planned duration.
    pub fn set_duration_secs(&mut self, duration_secs: u32) {
        self.duration_secs = duration_secs;
    }

    /// Start the experiment: `Created → Running`, stamping the start time.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTransition`] unless the state is `Created`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != ExperimentState::Created {
            return Err(Error::InvalidTransition(format!(
                "cannot start experiment {} in state {}",
                self.id, self.state
            )));
        }
        self.state = ExperimentState::Running;
        self.started_at = Some(now);
        Ok(())
    }

    /// Finish the experiment: `Running → Finished`, stamping the end time.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTransition`] unless the state is `Running`.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != ExperimentState::Running {
            return Err(Error::InvalidTransition(format!(
                "cannot finish experiment {} in state {}",
                self.id, self.state
            )));
        }
        self.state = ExperimentState::Finished;
        self.ended_at = Some(now);
        Ok(())
    }

    /// Abort the experiment: `Running → Aborted`, stamping the end time.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTransition`] unless the state is `Running`.
    pub fn abort(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != ExperimentState::Running {
            return Err(Error::InvalidTransition(format!(
                "cannot abort experiment {} in state {}",
                self.id, self.state
            )));
        }
        self.state = ExperimentState::Aborted;
        self.ended_at = Some(now);
        Ok(())
    }

    /// Whether the wall-clock deadline (start + duration) has passed.
    ///
    /// Purely derived from the start timestamp and planned duration; the
    /// stored state is deliberately not consulted, so an experiment whose
    /// deadline expired but was never explicitly finished reports `true`
    /// here while still being `Running`.
    #[must_use]
    pub fn already_finished(&self, now: DateTime<Utc>) -> bool {
        self.started_at
            .is_some_and(|start| now >= start + Duration::seconds(i64::from(self.duration_secs)))
    }

    /// Seconds remaining until the planned deadline, clamped to
    /// `0..=duration`. The full duration remains while not yet started.
    #[must_use]
    pub fn time_remaining_secs(&self, now: DateTime<Utc>) -> u32 {
        let Some(start) = self.started_at else {
            return self.duration_secs;
        };
        let deadline = start + Duration::seconds(i64::from(self.duration_secs));
        let left = (deadline - now)
            .num_seconds()
            .clamp(0, i64::from(self.duration_secs));
        u32::try_from(left).unwrap_or(self.duration_secs)
    }
}
