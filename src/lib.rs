//! # Bitacora: Laboratory Experiment Tracking Core
//!
//! Bitacora is the embeddable core of a laboratory experiment tracking
//! service: time-boxed experiments composed of measurement channels that
//! accumulate timestamped samples, with valid-range configuration,
//! out-of-range flagging, and role-gated access on every operation.
//!
//! The two load-bearing subsystems are:
//!
//! - **Policy engine** ([`policy`]): per-role, per-action,
//!   per-target-ownership rules evaluated as pure, exhaustive matches over
//!   closed enums.
//! - **Lifecycle state machine** ([`lifecycle`]): the
//!   `CREADO → EN_CURSO → {FINALIZADO, ABORTADO}` transition guards, the
//!   singleton current-experiment pointer ([`tracker`]), and the ordered
//!   cascade-deletion protocol ([`cascade`]).
//!
//! Transport, routing, and durable persistence stay outside; components
//! receive a [`store::Storage`] implementation at construction and the
//! bundled [`store::MemoryStore`] backs tests and single-process use.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bitacora::lifecycle::ExperimentLifecycle;
//! use bitacora::model::ChannelKind;
//! use bitacora::store::MemoryStore;
//! use bitacora::tracker::CurrentExperimentTracker;
//!
//! # async fn example() -> bitacora::Result<()> {
//! let storage = Arc::new(MemoryStore::new());
//! let tracker = Arc::new(CurrentExperimentTracker::new());
//! let lifecycle = ExperimentLifecycle::new(storage, Arc::clone(&tracker));
//!
//! let experiment = lifecycle.create("calibration", 600).await?;
//! let channel = lifecycle
//!     .add_channel(experiment.id(), ChannelKind::Temperature, "horno", "°C")
//!     .await?;
//!
//! lifecycle.start(experiment.id()).await?;
//! lifecycle.add_sample(channel.id(), 21.4, None).await?;
//! lifecycle.finish(experiment.id()).await?;
//! assert!(tracker.get().is_none());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod auth;
pub mod cascade;
pub mod directory;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod model;
pub mod policy;
pub mod store;
pub mod tracker;

pub use error::{AuthFailure, Error, Result};
