//! Entity records for the experiment tracking schema
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Channel (N)
//!                        │
//!                        ├──< Sample (N) [time-series]
//!                        └── Configuration (0..1) [valid range]
//!
//! Experiment (1) ──< FlaggedSample (N) [out-of-range markers]
//! ```
//!
//! Children hold one-directional foreign keys to their parents; parent-to-child
//! traversal is an indexed query against the child collection. Users are owned
//! by the identity store and carry the role that drives every policy decision.

mod channel;
mod configuration;
mod experiment;
mod flag;
mod sample;
mod user;

pub use channel::{Channel, ChannelKind};
pub use configuration::Configuration;
pub use experiment::{Experiment, ExperimentState};
pub use flag::FlaggedSample;
pub use sample::Sample;
pub use user::{email_is_valid, Role, User, UserBuilder};
