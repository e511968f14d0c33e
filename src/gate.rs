//! Access gate - authentication and authorization ahead of any handler
//!
//! Composes the token authenticator and the policy engine into the single
//! check every entry point runs first. Ordering is fixed: a missing or
//! invalid token is reported (401-class) before the role is ever looked at
//! (403-class), so a request failing both always reports the
//! authentication failure. `Access::Public` bypasses authentication
//! entirely.

use std::sync::Arc;

use crate::auth::TokenAuthenticator;
use crate::error::{Error, Result};
use crate::model::User;
use crate::policy::{self, Action, Target};
use crate::store::Storage;

/// Access requirement of an entry point.
#[derive(Debug, Clone, Copy)]
pub enum Access {
    /// No authentication at all (e.g. login itself).
    Public,
    /// Authenticate, then check role admission for the action.
    Requires(Action),
}

/// Request-level gate run before any business logic.
pub struct AccessGate<S> {
    authenticator: Arc<TokenAuthenticator<S>>,
}

impl<S: Storage> AccessGate<S> {
    /// Create a gate over the given authenticator.
    #[must_use]
    pub fn new(authenticator: Arc<TokenAuthenticator<S>>) -> Self {
        Self { authenticator }
    }

    /// Admit or reject a request.
    ///
    /// Returns the authenticated caller, or `None` for public access.
    /// Ownership-relative actions are re-checked against the loaded target
    /// inside the operation itself; the gate only decides whether the role
    /// may attempt the action at all.
    ///
    /// # Errors
    ///
    /// [`Error::Authentication`] before [`Error::Authorization`], always.
    pub async fn admit(&self, access: Access, bearer: Option<&str>) -> Result<Option<User>> {
        let action = match access {
            Access::Public => return Ok(None),
            Access::Requires(action) => action,
        };
        let user = self.authenticator.authenticate(bearer).await?;
        if !policy::authorize(&user, action, Target::None) {
            tracing::debug!(
                user = %user.id(),
                role = %user.role(),
                action = %action,
                "request rejected at the gate"
            );
            return Err(Error::Authorization(format!(
                "{action} (role {})",
                user.role()
            )));
        }
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{hash_password, AuthConfig};
    use crate::error::AuthFailure;
    use crate::model::{Role, User};
    use crate::store::MemoryStore;

    async fn gate_with_user(role: Role) -> (AccessGate<MemoryStore>, String) {
        let storage = Arc::new(MemoryStore::new());
        let user = User::new(
            "t",
            "t@lab.example",
            hash_password("pw").unwrap(),
            role,
        );
        storage.insert_user(user.clone()).await.unwrap();
        let auth = Arc::new(TokenAuthenticator::new(
            Arc::clone(&storage),
            AuthConfig::new("test-secret-test-secret-test-secret!").unwrap(),
        ));
        let token = auth.issue(&user).unwrap();
        (AccessGate::new(auth), token)
    }

    #[tokio::test]
    async fn test_public_skips_authentication() {
        let (gate, _) = gate_with_user(Role::Monitor).await;
        let caller = gate.admit(Access::Public, None).await.unwrap();
        assert!(caller.is_none());
    }

    #[tokio::test]
    async fn test_admitted_caller_returned() {
        let (gate, token) = gate_with_user(Role::Sistema).await;
        let caller = gate
            .admit(Access::Requires(Action::CreateExperiment), Some(&token))
            .await
            .unwrap();
        assert_eq!(caller.unwrap().role(), Role::Sistema);
    }

    #[tokio::test]
    async fn test_wrong_role_is_authorization_error() {
        let (gate, token) = gate_with_user(Role::Monitor).await;
        let err = gate
            .admit(Access::Requires(Action::CreateExperiment), Some(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authorization(_)));
        assert_eq!(err.status_class(), 403);
    }

    #[tokio::test]
    async fn test_authentication_reported_before_authorization() {
        // Invalid token AND insufficient role: the 401 must win.
        let (gate, _) = gate_with_user(Role::Monitor).await;
        let err = gate
            .admit(Access::Requires(Action::CreateExperiment), Some("garbage"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Authentication(AuthFailure::TokenInvalid)
        ));
        assert_eq!(err.status_class(), 401);
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let (gate, _) = gate_with_user(Role::Creator).await;
        let err = gate
            .admit(Access::Requires(Action::ViewExperiment), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Authentication(AuthFailure::TokenMissing)
        ));
    }
}
