//! Experiment lifecycle - transitions, guards, and child mutations
//!
//! All writes to an experiment's state or to its child entities go through
//! this component, so the state-machine invariants hold no matter which
//! entry point triggered the mutation:
//!
//! - `start` is legal only from `Created`; `finish`/`abort` only from
//!   `Running` (the guards live on the record itself, see
//!   [`Experiment::start`] and friends).
//! - Channels may be added only while `Created` - a channel's shape is
//!   frozen once data collection starts.
//! - Samples and out-of-range flags may be added only while `Running` -
//!   readings are meaningless before or after the run.
//!
//! Starting sets the singleton current-experiment pointer; finishing or
//! aborting clears it if it still points at this experiment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{
    Channel, ChannelKind, Configuration, Experiment, ExperimentState, FlaggedSample, Sample,
};
use crate::store::Storage;
use crate::tracker::CurrentExperimentTracker;

/// Partial update for an experiment's mutable fields.
///
/// State and the start/end timestamps are deliberately absent: they change
/// only through the transition methods.
#[derive(Debug, Clone, Default)]
pub struct ExperimentUpdate {
    /// New name, if changing.
    pub name: Option<String>,
    /// New planned duration in seconds, if changing.
    pub duration_secs: Option<u32>,
}

/// Partial update for a channel's mutable fields.
#[derive(Debug, Clone, Default)]
pub struct ChannelUpdate {
    /// New display name, if changing.
    pub name: Option<String>,
    /// New unit string, if changing.
    pub unit: Option<String>,
}

/// Drives the experiment state machine and guarded child mutations.
pub struct ExperimentLifecycle<S> {
    storage: Arc<S>,
    tracker: Arc<CurrentExperimentTracker>,
}

impl<S: Storage> ExperimentLifecycle<S> {
    /// Create a lifecycle component over the given storage and tracker.
    #[must_use]
    pub fn new(storage: Arc<S>, tracker: Arc<CurrentExperimentTracker>) -> Self {
        Self { storage, tracker }
    }

    /// Create a new experiment in the `Created` state.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty name or a zero duration.
    pub async fn create(&self, name: &str, duration_secs: u32) -> Result<Experiment> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("experiment name is required".to_string()));
        }
        if duration_secs == 0 {
            return Err(Error::Validation(
                "experiment duration must be positive".to_string(),
            ));
        }
        let experiment = Experiment::new(name, duration_secs);
        self.storage.insert_experiment(experiment.clone()).await?;
        tracing::info!(experiment = %experiment.id(), name, "experiment created");
        Ok(experiment)
    }

    /// Update an experiment's name or planned duration.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the experiment is absent;
    /// [`Error::Validation`] for an empty name or zero duration.
    pub async fn update(&self, id: Uuid, changes: ExperimentUpdate) -> Result<Experiment> {
        let mut experiment = self.fetch(id).await?;
        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::Validation("experiment name is required".to_string()));
            }
            experiment.set_name(name);
        }
        if let Some(duration_secs) = changes.duration_secs {
            if duration_secs == 0 {
                return Err(Error::Validation(
                    "experiment duration must be positive".to_string(),
                ));
            }
            experiment.set_duration_secs(duration_secs);
        }
        self.store_back(experiment).await
    }

    /// Start an experiment: `Created → Running`, pointing the tracker here.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if absent; [`Error::InvalidTransition`] unless
    /// the state is `Created`.
    pub async fn start(&self, id: Uuid) -> Result<Experiment> {
        let experiment = self
            .transition(id, "started", |exp, now| exp.start(now))
            .await?;
        self.tracker.set(experiment.id());
        Ok(experiment)
    }

    /// Finish a running experiment, releasing the tracker pointer.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if absent; [`Error::InvalidTransition`] unless
    /// the state is `Running`.
    pub async fn finish(&self, id: Uuid) -> Result<Experiment> {
        let experiment = self
            .transition(id, "finished", |exp, now| exp.finish(now))
            .await?;
        self.tracker.clear_if(experiment.id());
        Ok(experiment)
    }

    /// Abort a running experiment, releasing the tracker pointer.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if absent; [`Error::InvalidTransition`] unless
    /// the state is `Running`.
    pub async fn abort(&self, id: Uuid) -> Result<Experiment> {
        let experiment = self
            .transition(id, "aborted", |exp, now| exp.abort(now))
            .await?;
        self.tracker.clear_if(experiment.id());
        Ok(experiment)
    }

    /// Add a channel to an experiment that has not started yet.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the experiment is absent;
    /// [`Error::InvalidTransition`] unless the state is `Created`;
    /// [`Error::Validation`] for empty name or unit.
    pub async fn add_channel(
        &self,
        experiment_id: Uuid,
        kind: ChannelKind,
        name: &str,
        unit: &str,
    ) -> Result<Channel> {
        let experiment = self.fetch(experiment_id).await?;
        if experiment.state() != ExperimentState::Created {
            return Err(Error::InvalidTransition(format!(
                "channels may only be added before the experiment starts (state is {})",
                experiment.state()
            )));
        }
        let (name, unit) = (name.trim(), unit.trim());
        if name.is_empty() || unit.is_empty() {
            return Err(Error::Validation(
                "channel name and unit are required".to_string(),
            ));
        }
        let channel = Channel::new(experiment_id, kind, name, unit);
        self.storage.insert_channel(channel.clone()).await?;
        tracing::info!(
            experiment = %experiment_id,
            channel = %channel.id(),
            kind = %kind,
            "channel added"
        );
        Ok(channel)
    }

    /// Update a channel's display name or unit.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the channel is absent; [`Error::Validation`]
    /// for empty replacement values.
    pub async fn update_channel(&self, id: Uuid, changes: ChannelUpdate) -> Result<Channel> {
        let mut channel = self
            .storage
            .channel(id)
            .await?
            .ok_or(Error::NotFound("channel"))?;
        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::Validation("channel name is required".to_string()));
            }
            channel.set_name(name);
        }
        if let Some(unit) = changes.unit {
            let unit = unit.trim().to_string();
            if unit.is_empty() {
                return Err(Error::Validation("channel unit is required".to_string()));
            }
            channel.set_unit(unit);
        }
        self.storage
            .update_channel(channel)
            .await?
            .ok_or(Error::NotFound("channel"))
    }

    /// Record a sample on a channel of a running experiment.
    ///
    /// `captured_at` overrides the capture timestamp when the device
    /// supplies its own clock; otherwise the sample is stamped now.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the channel or its experiment is absent;
    /// [`Error::InvalidTransition`] unless the experiment is `Running`;
    /// [`Error::Validation`] for a non-finite value.
    pub async fn add_sample(
        &self,
        channel_id: Uuid,
        value: f64,
        captured_at: Option<DateTime<Utc>>,
    ) -> Result<Sample> {
        let channel = self
            .storage
            .channel(channel_id)
            .await?
            .ok_or(Error::NotFound("channel"))?;
        let experiment = self.fetch(channel.experiment_id()).await?;
        Self::require_running(&experiment, "samples")?;
        if !value.is_finite() {
            return Err(Error::Validation("sample value must be finite".to_string()));
        }
        let mut sample = Sample::new(channel_id, value);
        if let Some(at) = captured_at {
            sample = sample.captured(at);
        }
        self.storage.insert_sample(sample.clone()).await?;
        tracing::debug!(channel = %channel_id, sample = %sample.id(), value, "sample recorded");
        Ok(sample)
    }

    /// Replace a sample's value.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the sample is absent; [`Error::Validation`]
    /// for a non-finite value.
    pub async fn update_sample(&self, id: Uuid, value: f64) -> Result<Sample> {
        if !value.is_finite() {
            return Err(Error::Validation("sample value must be finite".to_string()));
        }
        let mut sample = self
            .storage
            .sample(id)
            .await?
            .ok_or(Error::NotFound("sample"))?;
        sample.set_value(value);
        self.storage
            .update_sample(sample)
            .await?
            .ok_or(Error::NotFound("sample"))
    }

    /// Mark a sample as out of its channel's configured range.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the experiment, channel, or sample is absent;
    /// [`Error::InvalidTransition`] unless the experiment is `Running`.
    pub async fn add_flagged_sample(
        &self,
        experiment_id: Uuid,
        channel_id: Uuid,
        sample_id: Uuid,
    ) -> Result<FlaggedSample> {
        let experiment = self.fetch(experiment_id).await?;
        Self::require_running(&experiment, "out-of-range flags")?;
        if self.storage.channel(channel_id).await?.is_none() {
            return Err(Error::NotFound("channel"));
        }
        if self.storage.sample(sample_id).await?.is_none() {
            return Err(Error::NotFound("sample"));
        }
        let flag = FlaggedSample::new(experiment_id, channel_id, sample_id);
        self.storage.insert_flag(flag.clone()).await?;
        tracing::info!(
            experiment = %experiment_id,
            channel = %channel_id,
            sample = %sample_id,
            "sample flagged out of range"
        );
        Ok(flag)
    }

    /// Create or replace a channel's valid-range configuration.
    ///
    /// A channel holds at most one configuration; when one already exists
    /// its bounds are updated in place and the same record id survives.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the channel is absent; [`Error::Validation`]
    /// for non-finite bounds or `min > max`.
    pub async fn set_configuration(
        &self,
        channel_id: Uuid,
        min_value: f64,
        max_value: f64,
    ) -> Result<Configuration> {
        if self.storage.channel(channel_id).await?.is_none() {
            return Err(Error::NotFound("channel"));
        }
        Self::check_bounds(min_value, max_value)?;
        if let Some(mut existing) = self.storage.configuration_for_channel(channel_id).await? {
            existing.set_bounds(min_value, max_value);
            return self
                .storage
                .update_configuration(existing)
                .await?
                .ok_or(Error::NotFound("configuration"));
        }
        let configuration = Configuration::new(channel_id, min_value, max_value);
        self.storage
            .insert_configuration(configuration.clone())
            .await?;
        tracing::info!(
            channel = %channel_id,
            min = min_value,
            max = max_value,
            "valid range configured"
        );
        Ok(configuration)
    }

    /// Replace the bounds of an existing configuration by its id.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the configuration is absent;
    /// [`Error::Validation`] for malformed bounds.
    pub async fn update_configuration(
        &self,
        id: Uuid,
        min_value: f64,
        max_value: f64,
    ) -> Result<Configuration> {
        Self::check_bounds(min_value, max_value)?;
        let mut configuration = self
            .storage
            .configuration(id)
            .await?
            .ok_or(Error::NotFound("configuration"))?;
        configuration.set_bounds(min_value, max_value);
        self.storage
            .update_configuration(configuration)
            .await?
            .ok_or(Error::NotFound("configuration"))
    }

    async fn fetch(&self, id: Uuid) -> Result<Experiment> {
        self.storage
            .experiment(id)
            .await?
            .ok_or(Error::NotFound("experiment"))
    }

    async fn store_back(&self, experiment: Experiment) -> Result<Experiment> {
        self.storage
            .update_experiment(experiment)
            .await?
            .ok_or(Error::NotFound("experiment"))
    }

    async fn transition(
        &self,
        id: Uuid,
        verb: &'static str,
        apply: impl FnOnce(&mut Experiment, DateTime<Utc>) -> Result<()>,
    ) -> Result<Experiment> {
        let mut experiment = self.fetch(id).await?;
        apply(&mut experiment, Utc::now())?;
        let experiment = self.store_back(experiment).await?;
        tracing::info!(experiment = %id, state = %experiment.state(), "experiment {}", verb);
        Ok(experiment)
    }

    fn require_running(experiment: &Experiment, what: &str) -> Result<()> {
        if experiment.state() == ExperimentState::Running {
            Ok(())
        } else {
            Err(Error::InvalidTransition(format!(
                "{what} may only be added while the experiment is running (state is {})",
                experiment.state()
            )))
        }
    }

    fn check_bounds(min_value: f64, max_value: f64) -> Result<()> {
        if !min_value.is_finite() || !max_value.is_finite() {
            return Err(Error::Validation(
                "configuration bounds must be finite".to_string(),
            ));
        }
        if min_value > max_value {
            return Err(Error::Validation(
                "configuration minimum exceeds maximum".to_string(),
            ));
        }
        Ok(())
    }
}
