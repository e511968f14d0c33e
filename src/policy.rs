//! Authorization policy engine
//!
//! A pure decision function over (acting user, action, target). Rules come
//! in two layers:
//!
//! 1. **Admission** - which roles may attempt an action category at all.
//! 2. **Target rules** - ownership-relative predicates for user management,
//!    where what is allowed depends on who the target is.
//!
//! Both layers are exhaustive `match` expressions over the closed [`Role`]
//! and [`Action`] enums, so adding a role or an action without deciding its
//! policy is a compile error rather than a silent deny (or worse, a silent
//! allow). There are no side effects and no I/O; every decision is
//! deterministic, which is what makes the matrix exhaustively testable.
//!
//! The role ordering for user management is `CREATOR > ADMIN > {MONITOR,
//! SISTEMA}`: a role manages targets strictly below it, plus itself. An
//! admin may act on another admin only when acting on their own account.

use serde::{Deserialize, Serialize};

use crate::model::{Role, User};

/// Action categories evaluated by the policy engine.
///
/// One variant per operation the core exposes; the gate maps each entry
/// point to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Create a user account.
    CreateUser,
    /// Read a user record.
    ViewUser,
    /// Modify a user record.
    ModifyUser,
    /// Delete a user account.
    DeleteUser,
    /// Create an experiment.
    CreateExperiment,
    /// Read or list experiments.
    ViewExperiment,
    /// Modify an experiment's name or planned duration.
    ModifyExperiment,
    /// Delete an experiment (cascades).
    DeleteExperiment,
    /// Start an experiment.
    StartExperiment,
    /// Finish a running experiment.
    FinishExperiment,
    /// Abort a running experiment.
    AbortExperiment,
    /// Add a channel to an experiment.
    AddChannel,
    /// Read a channel record.
    ViewChannel,
    /// Modify a channel record.
    ModifyChannel,
    /// Delete a channel (cascades).
    DeleteChannel,
    /// Append a sample to a channel.
    AddSample,
    /// Read a sample record.
    ViewSample,
    /// Modify a sample record.
    ModifySample,
    /// Delete a sample.
    DeleteSample,
    /// Create or replace a channel's valid-range configuration.
    SetConfiguration,
    /// Read a configuration record.
    ViewConfiguration,
    /// Modify a configuration record.
    ModifyConfiguration,
    /// Delete a configuration.
    DeleteConfiguration,
    /// Mark a sample as out of range.
    AddFlaggedSample,
    /// Delete an out-of-range marker.
    DeleteFlaggedSample,
    /// Read the current-running-experiment view.
    ViewCurrentExperiment,
}

impl Action {
    /// Human-readable verb phrase, used in authorization error messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::CreateUser => "create a user",
            Self::ViewUser => "view this user",
            Self::ModifyUser => "modify this user",
            Self::DeleteUser => "delete this user",
            Self::CreateExperiment => "create an experiment",
            Self::ViewExperiment => "view experiments",
            Self::ModifyExperiment => "modify an experiment",
            Self::DeleteExperiment => "delete an experiment",
            Self::StartExperiment => "start an experiment",
            Self::FinishExperiment => "finish an experiment",
            Self::AbortExperiment => "abort an experiment",
            Self::AddChannel => "add a channel",
            Self::ViewChannel => "view a channel",
            Self::ModifyChannel => "modify a channel",
            Self::DeleteChannel => "delete a channel",
            Self::AddSample => "record a sample",
            Self::ViewSample => "view a sample",
            Self::ModifySample => "modify a sample",
            Self::DeleteSample => "delete a sample",
            Self::SetConfiguration => "set a channel configuration",
            Self::ViewConfiguration => "view a configuration",
            Self::ModifyConfiguration => "modify a configuration",
            Self::DeleteConfiguration => "delete a configuration",
            Self::AddFlaggedSample => "flag a sample as out of range",
            Self::DeleteFlaggedSample => "delete an out-of-range flag",
            Self::ViewCurrentExperiment => "view the running experiment",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Target of an action, for ownership-relative rules.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// No target loaded yet (gate-level admission check) or the action has
    /// no ownership component.
    None,
    /// An existing user record the action operates on.
    User(&'a User),
    /// The role requested for a user about to be created.
    NewUserRole(Role),
}

/// Whether `role` may attempt `action` at all, independent of any target.
///
/// This is the action-category layer; ownership-relative user rules are
/// applied on top by [`authorize`] once the target record is loaded.
#[must_use]
pub const fn admits(role: Role, action: Action) -> bool {
    match action {
        // Lifecycle and ingestion are driven by the automated actor only.
        Action::CreateExperiment
        | Action::StartExperiment
        | Action::FinishExperiment
        | Action::AbortExperiment
        | Action::AddChannel
        | Action::AddSample
        | Action::AddFlaggedSample
        | Action::SetConfiguration
        | Action::ModifyConfiguration => match role {
            Role::Sistema => true,
            Role::Creator | Role::Admin | Role::Monitor => false,
        },

        // Destructive administration.
        Action::CreateUser
        | Action::DeleteUser
        | Action::ModifyExperiment
        | Action::DeleteExperiment
        | Action::DeleteConfiguration
        | Action::DeleteFlaggedSample => match role {
            Role::Creator | Role::Admin => true,
            Role::Monitor | Role::Sistema => false,
        },

        // Human-facing reads.
        Action::ViewExperiment | Action::ViewSample => match role {
            Role::Creator | Role::Admin | Role::Monitor => true,
            Role::Sistema => false,
        },

        // Reads the capture device also needs (e.g. to decide flagging).
        Action::ViewChannel | Action::ViewConfiguration | Action::ViewCurrentExperiment => {
            match role {
                Role::Creator | Role::Admin | Role::Monitor | Role::Sistema => true,
            }
        }

        // Curation of captured data.
        Action::ModifyChannel
        | Action::DeleteChannel
        | Action::ModifySample
        | Action::DeleteSample => match role {
            Role::Creator | Role::Admin | Role::Monitor => true,
            Role::Sistema => false,
        },

        // Every role may look at (or edit) accounts it owns; the target
        // rule narrows this to self-or-below.
        Action::ViewUser | Action::ModifyUser => match role {
            Role::Creator | Role::Admin | Role::Monitor | Role::Sistema => true,
        },
    }
}

/// Ownership-relative rule for acting on an existing user record.
///
/// `CREATOR` acts on anyone; `ADMIN` on anyone except creators and other
/// admins; every role acts on itself.
fn may_manage_user(actor: &User, target: &User) -> bool {
    match actor.role() {
        Role::Creator => true,
        Role::Admin => {
            target.role() != Role::Creator
                && (target.role() != Role::Admin || actor.id() == target.id())
        }
        Role::Monitor | Role::Sistema => actor.id() == target.id(),
    }
}

/// Rule for the role a new user may be given.
///
/// The created role must be strictly below the creating role: `CREATOR`
/// mints anything except another `CREATOR`; `ADMIN` mints anything below
/// `ADMIN`.
const fn may_create_role(actor_role: Role, new_role: Role) -> bool {
    match actor_role {
        Role::Creator => !matches!(new_role, Role::Creator),
        Role::Admin => !matches!(new_role, Role::Creator | Role::Admin),
        Role::Monitor | Role::Sistema => false,
    }
}

/// Full authorization decision: admission plus the target rule.
///
/// `Target::None` checks admission only; callers holding an
/// ownership-relative target must pass it so the self-or-above rule is
/// applied. Deny is the default for every combination not explicitly
/// allowed.
#[must_use]
pub fn authorize(actor: &User, action: Action, target: Target<'_>) -> bool {
    if !admits(actor.role(), action) {
        return false;
    }
    let allowed = match (action, target) {
        (Action::CreateUser, Target::NewUserRole(new_role)) => {
            may_create_role(actor.role(), new_role)
        }
        (Action::ViewUser | Action::ModifyUser | Action::DeleteUser, Target::User(user)) => {
            may_manage_user(actor, user)
        }
        _ => true,
    };
    if !allowed {
        tracing::debug!(
            actor = %actor.id(),
            role = %actor.role(),
            action = %action.describe(),
            "authorization denied by target rule"
        );
    }
    allowed
}
