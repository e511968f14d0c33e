//! Storage collaborator for entity records
//!
//! The core never talks to a database directly; every component receives a
//! [`Storage`] implementation at construction time, and the process entry
//! point owns its lifecycle. Methods are async so a persistent backend can
//! suspend on I/O; the bundled [`MemoryStore`] resolves immediately.
//!
//! Parent-to-child traversal (`channels_for_experiment`, and friends) is an
//! indexed query against the child collection: children hold the foreign
//! key, parents hold nothing.
//!
//! # Example
//!
//! ```rust,no_run
//! use bitacora::store::{MemoryStore, Storage};
//! use bitacora::model::Experiment;
//!
//! # async fn example() -> bitacora::Result<()> {
//! let store = MemoryStore::new();
//! let exp = Experiment::new("calibration", 600);
//! let id = exp.id();
//! store.insert_experiment(exp).await?;
//! assert!(store.experiment(id).await?.is_some());
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryStore;

use std::future::Future;

use uuid::Uuid;

use crate::model::{Channel, Configuration, Experiment, FlaggedSample, Sample, User};
use crate::Result;

/// Entity storage interface consumed by the core components.
///
/// Update methods replace the stored record by id and return the updated
/// record, or `None` when no record with that id exists. Remove methods
/// return the removed record, or `None` when there was nothing to remove
/// (removal is idempotent).
pub trait Storage: Send + Sync {
    // -- users ----------------------------------------------------------

    /// Insert a user record.
    fn insert_user(&self, user: User) -> impl Future<Output = Result<()>> + Send;

    /// Get a user by id.
    fn user(&self, id: Uuid) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Get a user by email (unique).
    fn user_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Replace a user record by id.
    fn update_user(&self, user: User) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Remove a user by id.
    fn remove_user(&self, id: Uuid) -> impl Future<Output = Result<Option<User>>> + Send;

    // -- experiments ----------------------------------------------------

    /// Insert an experiment record.
    fn insert_experiment(&self, experiment: Experiment)
        -> impl Future<Output = Result<()>> + Send;

    /// Get an experiment by id.
    fn experiment(&self, id: Uuid) -> impl Future<Output = Result<Option<Experiment>>> + Send;

    /// List all experiments.
    fn experiments(&self) -> impl Future<Output = Result<Vec<Experiment>>> + Send;

    /// Replace an experiment record by id.
    fn update_experiment(
        &self,
        experiment: Experiment,
    ) -> impl Future<Output = Result<Option<Experiment>>> + Send;

    /// Remove an experiment by id.
    fn remove_experiment(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Experiment>>> + Send;

    // -- channels -------------------------------------------------------

    /// Insert a channel record.
    fn insert_channel(&self, channel: Channel) -> impl Future<Output = Result<()>> + Send;

    /// Get a channel by id.
    fn channel(&self, id: Uuid) -> impl Future<Output = Result<Option<Channel>>> + Send;

    /// Get every channel owned by an experiment.
    fn channels_for_experiment(
        &self,
        experiment_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Channel>>> + Send;

    /// Replace a channel record by id.
    fn update_channel(
        &self,
        channel: Channel,
    ) -> impl Future<Output = Result<Option<Channel>>> + Send;

    /// Remove a channel by id.
    fn remove_channel(&self, id: Uuid) -> impl Future<Output = Result<Option<Channel>>> + Send;

    // -- samples --------------------------------------------------------

    /// Insert a sample record.
    fn insert_sample(&self, sample: Sample) -> impl Future<Output = Result<()>> + Send;

    /// Get a sample by id.
    fn sample(&self, id: Uuid) -> impl Future<Output = Result<Option<Sample>>> + Send;

    /// Get every sample captured on a channel, ordered by capture time.
    fn samples_for_channel(
        &self,
        channel_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Sample>>> + Send;

    /// Replace a sample record by id.
    fn update_sample(&self, sample: Sample) -> impl Future<Output = Result<Option<Sample>>> + Send;

    /// Remove a sample by id.
    fn remove_sample(&self, id: Uuid) -> impl Future<Output = Result<Option<Sample>>> + Send;

    // -- configurations -------------------------------------------------

    /// Insert a configuration record.
    fn insert_configuration(
        &self,
        configuration: Configuration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Get a configuration by id.
    fn configuration(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Configuration>>> + Send;

    /// Get the configuration attached to a channel, if any (at most one).
    fn configuration_for_channel(
        &self,
        channel_id: Uuid,
    ) -> impl Future<Output = Result<Option<Configuration>>> + Send;

    /// Replace a configuration record by id.
    fn update_configuration(
        &self,
        configuration: Configuration,
    ) -> impl Future<Output = Result<Option<Configuration>>> + Send;

    /// Remove a configuration by id.
    fn remove_configuration(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Configuration>>> + Send;

    // -- flagged samples ------------------------------------------------

    /// Insert a flagged-sample record.
    fn insert_flag(&self, flag: FlaggedSample) -> impl Future<Output = Result<()>> + Send;

    /// Get a flagged sample by id.
    fn flag(&self, id: Uuid) -> impl Future<Output = Result<Option<FlaggedSample>>> + Send;

    /// Get every flag belonging to an experiment.
    fn flags_for_experiment(
        &self,
        experiment_id: Uuid,
    ) -> impl Future<Output = Result<Vec<FlaggedSample>>> + Send;

    /// Get every flag referencing a channel.
    fn flags_for_channel(
        &self,
        channel_id: Uuid,
    ) -> impl Future<Output = Result<Vec<FlaggedSample>>> + Send;

    /// Get every flag referencing a sample.
    fn flags_for_sample(
        &self,
        sample_id: Uuid,
    ) -> impl Future<Output = Result<Vec<FlaggedSample>>> + Send;

    /// Remove a flagged sample by id.
    fn remove_flag(&self, id: Uuid) -> impl Future<Output = Result<Option<FlaggedSample>>> + Send;
}
