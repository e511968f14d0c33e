//! End-to-end lifecycle scenarios
//!
//! Each test wires the full component stack the way a process entry point
//! would (storage, tracker, gate, lifecycle, cascade, directory) and drives
//! it through the gate with real tokens.

use std::sync::Arc;

use bitacora::auth::{hash_password, AuthConfig, TokenAuthenticator};
use bitacora::cascade::CascadeCoordinator;
use bitacora::directory::UserDirectory;
use bitacora::gate::{Access, AccessGate};
use bitacora::lifecycle::ExperimentLifecycle;
use bitacora::model::{ChannelKind, ExperimentState, Role, User};
use bitacora::policy::Action;
use bitacora::store::{MemoryStore, Storage};
use bitacora::tracker::CurrentExperimentTracker;
use bitacora::Error;

/// Fully wired stack over one in-memory store.
struct Stack {
    storage: Arc<MemoryStore>,
    tracker: Arc<CurrentExperimentTracker>,
    authenticator: Arc<TokenAuthenticator<MemoryStore>>,
    gate: AccessGate<MemoryStore>,
    lifecycle: ExperimentLifecycle<MemoryStore>,
    cascade: CascadeCoordinator<MemoryStore>,
    directory: UserDirectory<MemoryStore>,
}

impl Stack {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("bitacora=debug")
            .with_test_writer()
            .try_init();

        let storage = Arc::new(MemoryStore::new());
        let tracker = Arc::new(CurrentExperimentTracker::new());
        let authenticator = Arc::new(TokenAuthenticator::new(
            Arc::clone(&storage),
            AuthConfig::new("integration-test-secret-0123456789abcdef").unwrap(),
        ));
        Self {
            gate: AccessGate::new(Arc::clone(&authenticator)),
            lifecycle: ExperimentLifecycle::new(Arc::clone(&storage), Arc::clone(&tracker)),
            cascade: CascadeCoordinator::new(Arc::clone(&storage), Arc::clone(&tracker)),
            directory: UserDirectory::new(Arc::clone(&storage)),
            authenticator,
            storage,
            tracker,
        }
    }

    /// Seed an active user with the given role and return it with a token.
    async fn login_as(&self, role: Role) -> (User, String) {
        let user = User::builder(
            format!("{role}-user"),
            format!("{role}@lab.example").to_lowercase(),
            hash_password("secreto123").unwrap(),
            role,
        )
        .active(true)
        .build();
        self.storage.insert_user(user.clone()).await.unwrap();
        let token = self.authenticator.issue(&user).unwrap();
        (user, token)
    }
}

// =============================================================================
// Lifecycle scenarios
// =============================================================================

#[tokio::test]
async fn scenario_created_experiment_rejects_samples() {
    let stack = Stack::new();
    let (_, token) = stack.login_as(Role::Sistema).await;

    stack
        .gate
        .admit(Access::Requires(Action::CreateExperiment), Some(&token))
        .await
        .unwrap();
    let exp = stack.lifecycle.create("T1", 10).await.unwrap();
    assert_eq!(exp.state(), ExperimentState::Created);

    let channel = stack
        .lifecycle
        .add_channel(exp.id(), ChannelKind::Temperature, "horno", "°C")
        .await
        .unwrap();

    // Not running yet: sample ingestion is an illegal transition, and a
    // client error rather than a server error.
    let err = stack
        .lifecycle
        .add_sample(channel.id(), 21.0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));
    assert_eq!(err.status_class(), 400);
}

#[tokio::test]
async fn scenario_start_points_tracker_at_experiment() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 10).await.unwrap();

    let started = stack.lifecycle.start(exp.id()).await.unwrap();
    assert_eq!(started.state(), ExperimentState::Running);
    assert!(started.started_at().is_some());
    assert_eq!(stack.tracker.get(), Some(exp.id()));

    let view = stack.tracker.current(stack.storage.as_ref()).await.unwrap();
    assert_eq!(view.experiment.id(), exp.id());
}

#[tokio::test]
async fn scenario_channels_frozen_once_running() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 10).await.unwrap();
    stack.lifecycle.start(exp.id()).await.unwrap();

    let err = stack
        .lifecycle
        .add_channel(exp.id(), ChannelKind::Voltage, "fuente", "V")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));
}

#[tokio::test]
async fn scenario_finish_releases_tracker() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 10).await.unwrap();
    stack.lifecycle.start(exp.id()).await.unwrap();

    let finished = stack.lifecycle.finish(exp.id()).await.unwrap();
    assert_eq!(finished.state(), ExperimentState::Finished);
    assert_eq!(stack.tracker.get(), None);
    assert!(matches!(
        stack.tracker.current(stack.storage.as_ref()).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn scenario_admin_cannot_delete_creator() {
    let stack = Stack::new();
    let (admin, _) = stack.login_as(Role::Admin).await;
    let (creator, _) = stack.login_as(Role::Creator).await;

    let err = stack
        .directory
        .delete(&admin, creator.id())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authorization(_)));
    assert_eq!(err.status_class(), 403);
}

#[tokio::test]
async fn scenario_abort_after_finish_rejected() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 10).await.unwrap();
    stack.lifecycle.start(exp.id()).await.unwrap();
    stack.lifecycle.finish(exp.id()).await.unwrap();

    let err = stack.lifecycle.abort(exp.id()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));
    assert_eq!(err.status_class(), 400);
}

#[tokio::test]
async fn abort_releases_tracker_like_finish() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 10).await.unwrap();
    stack.lifecycle.start(exp.id()).await.unwrap();

    let aborted = stack.lifecycle.abort(exp.id()).await.unwrap();
    assert_eq!(aborted.state(), ExperimentState::Aborted);
    assert!(aborted.ended_at().is_some());
    assert_eq!(stack.tracker.get(), None);
}

#[tokio::test]
async fn restarting_terminal_experiment_rejected() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 10).await.unwrap();
    stack.lifecycle.start(exp.id()).await.unwrap();
    stack.lifecycle.abort(exp.id()).await.unwrap();

    assert!(matches!(
        stack.lifecycle.start(exp.id()).await,
        Err(Error::InvalidTransition(_))
    ));
}

// =============================================================================
// Cascade completeness
// =============================================================================

#[tokio::test]
async fn cascade_leaves_nothing_reachable() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 60).await.unwrap();

    let mut channel_ids = Vec::new();
    let mut sample_ids = Vec::new();
    for (kind, name, unit) in [
        (ChannelKind::Temperature, "horno", "°C"),
        (ChannelKind::Current, "shunt", "mA"),
        (ChannelKind::Voltage, "fuente", "V"),
    ] {
        let channel = stack
            .lifecycle
            .add_channel(exp.id(), kind, name, unit)
            .await
            .unwrap();
        stack
            .lifecycle
            .set_configuration(channel.id(), 0.0, 100.0)
            .await
            .unwrap();
        channel_ids.push(channel.id());
    }

    stack.lifecycle.start(exp.id()).await.unwrap();
    for &channel_id in &channel_ids {
        for value in [10.0, 120.0] {
            let sample = stack
                .lifecycle
                .add_sample(channel_id, value, None)
                .await
                .unwrap();
            if value > 100.0 {
                stack
                    .lifecycle
                    .add_flagged_sample(exp.id(), channel_id, sample.id())
                    .await
                    .unwrap();
            }
            sample_ids.push(sample.id());
        }
    }

    stack.cascade.delete_experiment(exp.id()).await.unwrap();

    assert!(stack.storage.experiment(exp.id()).await.unwrap().is_none());
    for channel_id in channel_ids {
        assert!(stack.storage.channel(channel_id).await.unwrap().is_none());
        assert!(stack
            .storage
            .configuration_for_channel(channel_id)
            .await
            .unwrap()
            .is_none());
        assert!(stack
            .storage
            .samples_for_channel(channel_id)
            .await
            .unwrap()
            .is_empty());
    }
    for sample_id in sample_ids {
        assert!(stack.storage.sample(sample_id).await.unwrap().is_none());
        assert!(stack
            .storage
            .flags_for_sample(sample_id)
            .await
            .unwrap()
            .is_empty());
    }
    assert!(stack
        .storage
        .flags_for_experiment(exp.id())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn deleting_running_experiment_clears_tracker() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 60).await.unwrap();
    stack.lifecycle.start(exp.id()).await.unwrap();
    assert_eq!(stack.tracker.get(), Some(exp.id()));

    stack.cascade.delete_experiment(exp.id()).await.unwrap();
    assert_eq!(stack.tracker.get(), None);
}

// =============================================================================
// Tracker invariants
// =============================================================================

#[tokio::test]
async fn tracker_set_is_idempotent() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 60).await.unwrap();
    stack.lifecycle.start(exp.id()).await.unwrap();

    // A duplicate set converges to the same single slot.
    stack.tracker.set(exp.id());
    assert_eq!(stack.tracker.get(), Some(exp.id()));
}

#[tokio::test]
async fn tracker_concurrent_sets_converge() {
    let stack = Stack::new();
    let last = uuid::Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let tracker = Arc::clone(&stack.tracker);
        handles.push(tokio::spawn(async move {
            tracker.set(uuid::Uuid::new_v4());
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    stack.tracker.set(last);

    // Whatever interleaving happened, exactly one pointer survives.
    assert_eq!(stack.tracker.get(), Some(last));
}

// =============================================================================
// Current-experiment view
// =============================================================================

#[tokio::test]
async fn current_view_counts_flags_and_derives_deadline() {
    let stack = Stack::new();
    let exp = stack.lifecycle.create("T1", 600).await.unwrap();
    let channel = stack
        .lifecycle
        .add_channel(exp.id(), ChannelKind::Temperature, "horno", "°C")
        .await
        .unwrap();
    stack.lifecycle.start(exp.id()).await.unwrap();

    let sample = stack
        .lifecycle
        .add_sample(channel.id(), 900.0, None)
        .await
        .unwrap();
    stack
        .lifecycle
        .add_flagged_sample(exp.id(), channel.id(), sample.id())
        .await
        .unwrap();

    let view = stack.tracker.current(stack.storage.as_ref()).await.unwrap();
    assert_eq!(view.flagged_count, 1);
    assert!(!view.already_finished);
    assert!(view.time_remaining_secs <= 600);
}
