//! User directory - account management under the ownership policy
//!
//! Every operation takes the acting user and consults the policy engine
//! against the loaded target record, so the self-or-above rule holds for
//! every entry point, not just the ones that happen to run the gate.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::hash_password;
use crate::error::{Error, Result};
use crate::model::{email_is_valid, Role, User};
use crate::policy::{self, Action, Target};
use crate::store::Storage;

/// Partial update for a user's mutable fields.
///
/// The password hash is deliberately absent: credentials change through a
/// dedicated flow, never through a record update.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New display name, if changing.
    pub name: Option<String>,
    /// New email, if changing (format and uniqueness re-checked).
    pub email: Option<String>,
    /// New role, if changing.
    pub role: Option<Role>,
    /// Activate or deactivate the account.
    pub active: Option<bool>,
}

/// Account management operations.
pub struct UserDirectory<S> {
    storage: Arc<S>,
}

impl<S: Storage> UserDirectory<S> {
    /// Create a directory over the given storage.
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Create a new (inactive) user account.
    ///
    /// The requested role must be strictly below the actor's role.
    ///
    /// # Errors
    ///
    /// [`Error::Authorization`] when the role rule denies;
    /// [`Error::Validation`] for missing fields, a malformed email, or a
    /// duplicate email.
    pub async fn create(
        &self,
        actor: &User,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User> {
        if !policy::authorize(actor, Action::CreateUser, Target::NewUserRole(role)) {
            return Err(Error::Authorization(format!(
                "create a user with role {role}"
            )));
        }
        if name.trim().is_empty() || email.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "name, email, and password are required".to_string(),
            ));
        }
        if !email_is_valid(email) {
            return Err(Error::Validation("invalid email format".to_string()));
        }
        if self.storage.user_by_email(email).await?.is_some() {
            return Err(Error::Validation(
                "a user with that email already exists".to_string(),
            ));
        }

        let user = User::new(name.trim(), email, hash_password(password)?, role);
        self.storage.insert_user(user.clone()).await?;
        tracing::info!(user = %user.id(), role = %role, "user created");
        Ok(user)
    }

    /// Look up a user by id, applying the view policy against the target.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when absent; [`Error::Authorization`] when the
    /// ownership rule denies.
    pub async fn find_by_id(&self, actor: &User, id: Uuid) -> Result<User> {
        let user = self.storage.user(id).await?.ok_or(Error::NotFound("user"))?;
        Self::check(actor, Action::ViewUser, &user)?;
        Ok(user)
    }

    /// Look up a user by email, applying the view policy against the target.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a malformed email; [`Error::NotFound`]
    /// when absent; [`Error::Authorization`] when the ownership rule
    /// denies.
    pub async fn find_by_email(&self, actor: &User, email: &str) -> Result<User> {
        if !email_is_valid(email) {
            return Err(Error::Validation("invalid email format".to_string()));
        }
        let user = self
            .storage
            .user_by_email(email)
            .await?
            .ok_or(Error::NotFound("user"))?;
        Self::check(actor, Action::ViewUser, &user)?;
        Ok(user)
    }

    /// Update a user's name, email, role, or active flag.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when absent; [`Error::Authorization`] when the
    /// ownership rule denies; [`Error::Validation`] for a malformed or
    /// already-taken email.
    pub async fn update(&self, actor: &User, id: Uuid, changes: UserUpdate) -> Result<User> {
        let mut user = self.storage.user(id).await?.ok_or(Error::NotFound("user"))?;
        Self::check(actor, Action::ModifyUser, &user)?;

        if let Some(email) = changes.email {
            if !email_is_valid(&email) {
                return Err(Error::Validation("invalid email format".to_string()));
            }
            if let Some(existing) = self.storage.user_by_email(&email).await? {
                if existing.id() != id {
                    return Err(Error::Validation(
                        "a user with that email already exists".to_string(),
                    ));
                }
            }
            user.set_email(email);
        }
        if let Some(name) = changes.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("name is required".to_string()));
            }
            user.set_name(name.trim().to_string());
        }
        if let Some(role) = changes.role {
            user.set_role(role);
        }
        if let Some(active) = changes.active {
            user.set_active(active);
        }

        self.storage
            .update_user(user)
            .await?
            .ok_or(Error::NotFound("user"))
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when absent; [`Error::Authorization`] when the
    /// ownership rule denies.
    pub async fn delete(&self, actor: &User, id: Uuid) -> Result<User> {
        let user = self.storage.user(id).await?.ok_or(Error::NotFound("user"))?;
        Self::check(actor, Action::DeleteUser, &user)?;
        let removed = self
            .storage
            .remove_user(id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        tracing::info!(user = %id, "user deleted");
        Ok(removed)
    }

    fn check(actor: &User, action: Action, target: &User) -> Result<()> {
        if policy::authorize(actor, action, Target::User(target)) {
            Ok(())
        } else {
            Err(Error::Authorization(format!(
                "{} with role {}",
                action,
                target.role()
            )))
        }
    }
}
