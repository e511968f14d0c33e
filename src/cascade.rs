//! Cascade deletion - ordered removal of parents and their children
//!
//! Children hold one-directional foreign keys, so deleting a parent means
//! sweeping the child collections by index and removing everything that
//! references it, children first. The parent record is removed last: if a
//! child step fails mid-sequence the parent is still present and the
//! failure surfaces as [`Error::Integrity`] instead of leaving the system
//! half-deleted behind a missing parent.
//!
//! Child removal is idempotent - a child already gone (e.g. removed by a
//! concurrent request) is not an error.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{Channel, Configuration, Experiment, FlaggedSample, Sample};
use crate::store::Storage;
use crate::tracker::CurrentExperimentTracker;

/// Orchestrates ordered deletion of an entity and everything referencing it.
pub struct CascadeCoordinator<S> {
    storage: Arc<S>,
    tracker: Arc<CurrentExperimentTracker>,
}

impl<S: Storage> CascadeCoordinator<S> {
    /// Create a coordinator over the given storage and tracker.
    #[must_use]
    pub fn new(storage: Arc<S>, tracker: Arc<CurrentExperimentTracker>) -> Self {
        Self { storage, tracker }
    }

    /// Delete an experiment and every entity that transitively references
    /// it: each channel's samples and configuration, the channels, the
    /// experiment's out-of-range flags, then the experiment itself. Clears
    /// the current-experiment pointer if it points here.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the experiment is absent; [`Error::Integrity`]
    /// if a child step fails (remaining steps are not attempted).
    pub async fn delete_experiment(&self, id: Uuid) -> Result<Experiment> {
        if self.storage.experiment(id).await?.is_none() {
            return Err(Error::NotFound("experiment"));
        }

        let channels = self
            .storage
            .channels_for_experiment(id)
            .await
            .map_err(integrity("listing channels"))?;
        for channel in &channels {
            self.delete_channel_children(channel.id()).await?;
            self.storage
                .remove_channel(channel.id())
                .await
                .map_err(integrity("removing channel"))?;
        }

        let flags = self
            .storage
            .flags_for_experiment(id)
            .await
            .map_err(integrity("listing flags"))?;
        for flag in &flags {
            self.storage
                .remove_flag(flag.id())
                .await
                .map_err(integrity("removing flag"))?;
        }

        let experiment = self
            .storage
            .remove_experiment(id)
            .await?
            .ok_or(Error::NotFound("experiment"))?;
        self.tracker.clear_if(id);

        tracing::info!(
            experiment = %id,
            channels = channels.len(),
            flags = flags.len(),
            "experiment deleted with cascade"
        );
        Ok(experiment)
    }

    /// Delete a channel and everything referencing it: its samples, its
    /// configuration, and any out-of-range flags, then the channel.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the channel is absent; [`Error::Integrity`]
    /// if a child step fails.
    pub async fn delete_channel(&self, id: Uuid) -> Result<Channel> {
        if self.storage.channel(id).await?.is_none() {
            return Err(Error::NotFound("channel"));
        }
        self.delete_channel_children(id).await?;
        let channel = self
            .storage
            .remove_channel(id)
            .await?
            .ok_or(Error::NotFound("channel"))?;
        tracing::info!(channel = %id, "channel deleted with cascade");
        Ok(channel)
    }

    /// Delete a sample and any out-of-range flags referencing it.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the sample is absent; [`Error::Integrity`] if
    /// flag removal fails.
    pub async fn delete_sample(&self, id: Uuid) -> Result<Sample> {
        if self.storage.sample(id).await?.is_none() {
            return Err(Error::NotFound("sample"));
        }
        let flags = self
            .storage
            .flags_for_sample(id)
            .await
            .map_err(integrity("listing flags"))?;
        for flag in flags {
            self.storage
                .remove_flag(flag.id())
                .await
                .map_err(integrity("removing flag"))?;
        }
        self.storage
            .remove_sample(id)
            .await?
            .ok_or(Error::NotFound("sample"))
    }

    /// Delete a configuration. No children; plain removal.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the configuration is absent.
    pub async fn delete_configuration(&self, id: Uuid) -> Result<Configuration> {
        self.storage
            .remove_configuration(id)
            .await?
            .ok_or(Error::NotFound("configuration"))
    }

    /// Delete an out-of-range flag. No children; plain removal.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the flag is absent.
    pub async fn delete_flagged_sample(&self, id: Uuid) -> Result<FlaggedSample> {
        self.storage
            .remove_flag(id)
            .await?
            .ok_or(Error::NotFound("flagged sample"))
    }

    /// Remove everything referencing a channel, leaving the channel record
    /// itself in place.
    async fn delete_channel_children(&self, channel_id: Uuid) -> Result<()> {
        let samples = self
            .storage
            .samples_for_channel(channel_id)
            .await
            .map_err(integrity("listing samples"))?;
        for sample in &samples {
            self.storage
                .remove_sample(sample.id())
                .await
                .map_err(integrity("removing sample"))?;
        }

        if let Some(configuration) = self
            .storage
            .configuration_for_channel(channel_id)
            .await
            .map_err(integrity("reading configuration"))?
        {
            self.storage
                .remove_configuration(configuration.id())
                .await
                .map_err(integrity("removing configuration"))?;
        }

        let flags = self
            .storage
            .flags_for_channel(channel_id)
            .await
            .map_err(integrity("listing flags"))?;
        for flag in &flags {
            self.storage
                .remove_flag(flag.id())
                .await
                .map_err(integrity("removing flag"))?;
        }

        tracing::debug!(
            channel = %channel_id,
            samples = samples.len(),
            flags = flags.len(),
            "channel children removed"
        );
        Ok(())
    }
}

/// Wrap a failed cascade step so it surfaces as a server-class integrity
/// error rather than whatever the storage backend reported.
fn integrity(step: &'static str) -> impl Fn(Error) -> Error {
    move |source| Error::Integrity(format!("cascade aborted while {step}: {source}"))
}
