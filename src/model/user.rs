//! User record and role vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a user account.
///
/// `Sistema` denotes an automated/device actor, not a human; it is the only
/// role permitted to drive the experiment lifecycle and data ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full administrative authority, including over admins.
    Creator,
    /// Administrative authority below creators.
    Admin,
    /// Read-mostly human operator.
    Monitor,
    /// Automated capture device or service account.
    Sistema,
}

impl Role {
    /// Stable wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creator => "CREATOR",
            Self::Admin => "ADMIN",
            Self::Monitor => "MONITOR",
            Self::Sistema => "SISTEMA",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal structural check for an email address: a local part, an `@`, and
/// a domain containing a dot.
#[must_use]
pub fn email_is_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .split_once('.')
        .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
}

/// A user account.
///
/// The role field is authoritative for every policy decision; tokens carry a
/// copy of it, cross-checked against this record on each request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    active: bool,
    activation_token: Option<String>,
    activation_token_expires: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, inactive user with a fresh identifier.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            active: false,
            activation_token: None,
            activation_token_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a builder for constructing a user with optional fields.
    #[must_use]
    pub fn builder(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> UserBuilder {
        UserBuilder::new(name, email, password_hash, role)
    }

    /// Get the user identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Get the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Get the stored password hash.
    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Get the role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Whether the account has been activated.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Get the pending activation token, if any.
    #[must_use]
    pub fn activation_token(&self) -> Option<&str> {
        self.activation_token.as_deref()
    }

    /// Get the activation token expiry, if any.
    #[must_use]
    pub const fn activation_token_expires(&self) -> Option<DateTime<Utc>> {
        self.activation_token_expires
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the last-update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Replace the email address. Format and uniqueness are validated by the
    /// user directory, not here.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.updated_at = Utc::now();
    }

    /// Replace the role.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Activate or deactivate the account.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.updated_at = Utc::now();
    }
}

/// Builder for [`User`].
#[derive(Debug)]
pub struct UserBuilder {
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    active: bool,
    activation_token: Option<String>,
    activation_token_expires: Option<DateTime<Utc>>,
}

impl UserBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            active: false,
            activation_token: None,
            activation_token_expires: None,
        }
    }

    /// Mark the account active from the start.
    #[must_use]
    pub const fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set a pending activation token and its expiry.
    #[must_use]
    pub fn activation_token(
        mut self,
        token: impl Into<String>,
        expires: DateTime<Utc>,
    ) -> Self {
        self.activation_token = Some(token.into());
        self.activation_token_expires = Some(expires);
        self
    }

    /// Build the [`User`].
    #[must_use]
    pub fn build(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            active: self.active,
            activation_token: self.activation_token,
            activation_token_expires: self.activation_token_expires,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new_is_inactive() {
        let user = User::new("Ana", "ana@lab.example", "$2b$12$hash", Role::Monitor);
        assert!(!user.is_active());
        assert_eq!(user.role(), Role::Monitor);
        assert!(user.activation_token().is_none());
    }

    #[test]
    fn test_user_builder_active() {
        let user = User::builder("Ana", "ana@lab.example", "$2b$12$hash", Role::Admin)
            .active(true)
            .build();
        assert!(user.is_active());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::Creator.as_str(), "CREATOR");
        assert_eq!(Role::Sistema.as_str(), "SISTEMA");
        let json = serde_json::to_string(&Role::Monitor).unwrap();
        assert_eq!(json, "\"MONITOR\"");
    }

    #[test]
    fn test_email_validation() {
        assert!(email_is_valid("user@lab.example"));
        assert!(email_is_valid("a@b.c"));
        assert!(!email_is_valid("no-at-sign"));
        assert!(!email_is_valid("@lab.example"));
        assert!(!email_is_valid("user@nodot"));
        assert!(!email_is_valid("user@.x"));
        assert!(!email_is_valid("user@x."));
    }

    #[test]
    fn test_set_role_touches_updated_at() {
        let mut user = User::new("Ana", "ana@lab.example", "h", Role::Monitor);
        let before = user.updated_at();
        user.set_role(Role::Admin);
        assert_eq!(user.role(), Role::Admin);
        assert!(user.updated_at() >= before);
    }
}
