//! In-memory storage backend using `DashMap`.
//!
//! This is the default backend - data is lost on process restart. Each
//! entity collection is an independent concurrent map keyed by id, so
//! single-record operations never contend across collections.

use dashmap::DashMap;
use uuid::Uuid;

use super::Storage;
use crate::model::{Channel, Configuration, Experiment, FlaggedSample, Sample, User};
use crate::Result;

/// In-memory entity store backed by lock-free concurrent hashmaps.
///
/// Thread-safe; clone-on-read semantics (records returned by queries are
/// detached copies, mutations go back through the update methods).
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    experiments: DashMap<Uuid, Experiment>,
    channels: DashMap<Uuid, Channel>,
    samples: DashMap<Uuid, Sample>,
    configurations: DashMap<Uuid, Configuration>,
    flags: DashMap<Uuid, FlaggedSample>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.experiments.is_empty()
            && self.channels.is_empty()
            && self.samples.is_empty()
            && self.configurations.is_empty()
            && self.flags.is_empty()
    }

    /// Number of experiments currently stored.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Number of samples currently stored.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.users.clear();
        self.experiments.clear();
        self.channels.clear();
        self.samples.clear();
        self.configurations.clear();
        self.flags.clear();
    }
}

impl Storage for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        self.users.insert(user.id(), user);
        Ok(())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.value().email() == email)
            .map(|u| u.value().clone()))
    }

    async fn update_user(&self, user: User) -> Result<Option<User>> {
        let id = user.id();
        if !self.users.contains_key(&id) {
            return Ok(None);
        }
        self.users.insert(id, user.clone());
        Ok(Some(user))
    }

    async fn remove_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.remove(&id).map(|(_, u)| u))
    }

    async fn insert_experiment(&self, experiment: Experiment) -> Result<()> {
        self.experiments.insert(experiment.id(), experiment);
        Ok(())
    }

    async fn experiment(&self, id: Uuid) -> Result<Option<Experiment>> {
        Ok(self.experiments.get(&id).map(|e| e.value().clone()))
    }

    async fn experiments(&self) -> Result<Vec<Experiment>> {
        Ok(self.experiments.iter().map(|e| e.value().clone()).collect())
    }

    async fn update_experiment(&self, experiment: Experiment) -> Result<Option<Experiment>> {
        let id = experiment.id();
        if !self.experiments.contains_key(&id) {
            return Ok(None);
        }
        self.experiments.insert(id, experiment.clone());
        Ok(Some(experiment))
    }

    async fn remove_experiment(&self, id: Uuid) -> Result<Option<Experiment>> {
        Ok(self.experiments.remove(&id).map(|(_, e)| e))
    }

    async fn insert_channel(&self, channel: Channel) -> Result<()> {
        self.channels.insert(channel.id(), channel);
        Ok(())
    }

    async fn channel(&self, id: Uuid) -> Result<Option<Channel>> {
        Ok(self.channels.get(&id).map(|c| c.value().clone()))
    }

    async fn channels_for_experiment(&self, experiment_id: Uuid) -> Result<Vec<Channel>> {
        Ok(self
            .channels
            .iter()
            .filter(|c| c.value().experiment_id() == experiment_id)
            .map(|c| c.value().clone())
            .collect())
    }

    async fn update_channel(&self, channel: Channel) -> Result<Option<Channel>> {
        let id = channel.id();
        if !self.channels.contains_key(&id) {
            return Ok(None);
        }
        self.channels.insert(id, channel.clone());
        Ok(Some(channel))
    }

    async fn remove_channel(&self, id: Uuid) -> Result<Option<Channel>> {
        Ok(self.channels.remove(&id).map(|(_, c)| c))
    }

    async fn insert_sample(&self, sample: Sample) -> Result<()> {
        self.samples.insert(sample.id(), sample);
        Ok(())
    }

    async fn sample(&self, id: Uuid) -> Result<Option<Sample>> {
        Ok(self.samples.get(&id).map(|s| s.value().clone()))
    }

    async fn samples_for_channel(&self, channel_id: Uuid) -> Result<Vec<Sample>> {
        let mut samples: Vec<Sample> = self
            .samples
            .iter()
            .filter(|s| s.value().channel_id() == channel_id)
            .map(|s| s.value().clone())
            .collect();
        // Sort by capture time for time-series ordering.
        samples.sort_by_key(Sample::captured_at);
        Ok(samples)
    }

    async fn update_sample(&self, sample: Sample) -> Result<Option<Sample>> {
        let id = sample.id();
        if !self.samples.contains_key(&id) {
            return Ok(None);
        }
        self.samples.insert(id, sample.clone());
        Ok(Some(sample))
    }

    async fn remove_sample(&self, id: Uuid) -> Result<Option<Sample>> {
        Ok(self.samples.remove(&id).map(|(_, s)| s))
    }

    async fn insert_configuration(&self, configuration: Configuration) -> Result<()> {
        self.configurations
            .insert(configuration.id(), configuration);
        Ok(())
    }

    async fn configuration(&self, id: Uuid) -> Result<Option<Configuration>> {
        Ok(self.configurations.get(&id).map(|c| c.value().clone()))
    }

    async fn configuration_for_channel(&self, channel_id: Uuid) -> Result<Option<Configuration>> {
        Ok(self
            .configurations
            .iter()
            .find(|c| c.value().channel_id() == channel_id)
            .map(|c| c.value().clone()))
    }

    async fn update_configuration(
        &self,
        configuration: Configuration,
    ) -> Result<Option<Configuration>> {
        let id = configuration.id();
        if !self.configurations.contains_key(&id) {
            return Ok(None);
        }
        self.configurations.insert(id, configuration.clone());
        Ok(Some(configuration))
    }

    async fn remove_configuration(&self, id: Uuid) -> Result<Option<Configuration>> {
        Ok(self.configurations.remove(&id).map(|(_, c)| c))
    }

    async fn insert_flag(&self, flag: FlaggedSample) -> Result<()> {
        self.flags.insert(flag.id(), flag);
        Ok(())
    }

    async fn flag(&self, id: Uuid) -> Result<Option<FlaggedSample>> {
        Ok(self.flags.get(&id).map(|f| f.value().clone()))
    }

    async fn flags_for_experiment(&self, experiment_id: Uuid) -> Result<Vec<FlaggedSample>> {
        Ok(self
            .flags
            .iter()
            .filter(|f| f.value().experiment_id() == experiment_id)
            .map(|f| f.value().clone())
            .collect())
    }

    async fn flags_for_channel(&self, channel_id: Uuid) -> Result<Vec<FlaggedSample>> {
        Ok(self
            .flags
            .iter()
            .filter(|f| f.value().channel_id() == channel_id)
            .map(|f| f.value().clone())
            .collect())
    }

    async fn flags_for_sample(&self, sample_id: Uuid) -> Result<Vec<FlaggedSample>> {
        Ok(self
            .flags
            .iter()
            .filter(|f| f.value().sample_id() == sample_id)
            .map(|f| f.value().clone())
            .collect())
    }

    async fn remove_flag(&self, id: Uuid) -> Result<Option<FlaggedSample>> {
        Ok(self.flags.remove(&id).map(|(_, f)| f))
    }
}
