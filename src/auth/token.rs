//! Bearer-token issuance and verification

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::AuthConfig;
use super::password::verify_password;
use crate::error::{AuthFailure, Error, Result};
use crate::model::{email_is_valid, Role, User};
use crate::store::Storage;

/// Claims embedded in an issued token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the user identifier.
    pub sub: Uuid,
    /// Email at issuance time, cross-checked on every request.
    pub email: String,
    /// Role at issuance time, cross-checked on every request.
    pub role: Role,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Verifies bearer tokens and reconstitutes the caller identity.
///
/// Verification is pure apart from a single read of the user store: after
/// the cryptographic check, the embedded claims are compared against the
/// live record so that a role change or account edit made after issuance
/// invalidates the token (`IdentityStale`). Holds no per-request state and
/// is safe under arbitrary concurrency.
pub struct TokenAuthenticator<S> {
    storage: Arc<S>,
    config: AuthConfig,
}

impl<S: Storage> TokenAuthenticator<S> {
    /// Create an authenticator over the given user store.
    #[must_use]
    pub fn new(storage: Arc<S>, config: AuthConfig) -> Self {
        Self { storage, config }
    }

    /// Sign a token for the given user with the configured validity window.
    ///
    /// # Errors
    ///
    /// [`Error::Integrity`] if the signing backend fails.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id(),
            email: user.email().to_string(),
            role: user.role(),
            iat: now.timestamp(),
            exp: (now + self.config.validity()).timestamp(),
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret()),
        )
        .map_err(|e| Error::Integrity(format!("token signing failed: {e}")))
    }

    /// Authenticate a bearer token, returning the live user record.
    ///
    /// # Errors
    ///
    /// All failures are [`Error::Authentication`]: `TokenMissing` when no
    /// token is supplied, `TokenInvalid` when signature/format/expiry
    /// verification fails, `IdentityStale` when the claims no longer match
    /// the live record.
    pub async fn authenticate(&self, bearer: Option<&str>) -> Result<User> {
        let token = bearer.ok_or(Error::Authentication(AuthFailure::TokenMissing))?;

        let claims = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| Error::Authentication(AuthFailure::TokenInvalid))?
        .claims;

        let Some(user) = self.storage.user(claims.sub).await? else {
            tracing::warn!(subject = %claims.sub, "token subject no longer exists");
            return Err(Error::Authentication(AuthFailure::IdentityStale));
        };
        if user.email() != claims.email || user.role() != claims.role {
            tracing::warn!(
                subject = %claims.sub,
                "token claims diverge from live user record"
            );
            return Err(Error::Authentication(AuthFailure::IdentityStale));
        }
        Ok(user)
    }

    /// Email/password login: verify credentials and issue a token.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for missing fields or a malformed email,
    /// [`Error::NotFound`] when no account uses the email,
    /// [`Error::Authentication`] (`BadCredentials`) for a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "email and password are required".to_string(),
            ));
        }
        if !email_is_valid(email) {
            return Err(Error::Validation("invalid email format".to_string()));
        }

        let user = self
            .storage
            .user_by_email(email)
            .await?
            .ok_or(Error::NotFound("user"))?;

        if !verify_password(password, user.password_hash())? {
            return Err(Error::Authentication(AuthFailure::BadCredentials));
        }

        let token = self.issue(&user)?;
        tracing::debug!(user = %user.id(), role = %user.role(), "login token issued");
        Ok((user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::store::MemoryStore;

    fn authenticator(storage: Arc<MemoryStore>) -> TokenAuthenticator<MemoryStore> {
        let config = AuthConfig::new("test-secret-test-secret-test-secret!").unwrap();
        TokenAuthenticator::new(storage, config)
    }

    async fn seeded_user(storage: &MemoryStore, role: Role) -> User {
        let user = User::new(
            "Ana",
            "ana@lab.example",
            hash_password("secreto123").unwrap(),
            role,
        );
        storage.insert_user(user.clone()).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_issue_then_authenticate() {
        let storage = Arc::new(MemoryStore::new());
        let user = seeded_user(&storage, Role::Monitor).await;
        let auth = authenticator(Arc::clone(&storage));

        let token = auth.issue(&user).unwrap();
        let verified = auth.authenticate(Some(&token)).await.unwrap();
        assert_eq!(verified.id(), user.id());
    }

    #[tokio::test]
    async fn test_missing_token() {
        let auth = authenticator(Arc::new(MemoryStore::new()));
        assert!(matches!(
            auth.authenticate(None).await,
            Err(Error::Authentication(AuthFailure::TokenMissing))
        ));
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let auth = authenticator(Arc::new(MemoryStore::new()));
        assert!(matches!(
            auth.authenticate(Some("not.a.token")).await,
            Err(Error::Authentication(AuthFailure::TokenInvalid))
        ));
    }

    #[tokio::test]
    async fn test_role_change_staleness() {
        let storage = Arc::new(MemoryStore::new());
        let mut user = seeded_user(&storage, Role::Monitor).await;
        let auth = authenticator(Arc::clone(&storage));
        let token = auth.issue(&user).unwrap();

        user.set_role(Role::Admin);
        storage.update_user(user).await.unwrap();

        assert!(matches!(
            auth.authenticate(Some(&token)).await,
            Err(Error::Authentication(AuthFailure::IdentityStale))
        ));
    }

    #[tokio::test]
    async fn test_deleted_user_staleness() {
        let storage = Arc::new(MemoryStore::new());
        let user = seeded_user(&storage, Role::Sistema).await;
        let auth = authenticator(Arc::clone(&storage));
        let token = auth.issue(&user).unwrap();

        storage.remove_user(user.id()).await.unwrap();

        assert!(matches!(
            auth.authenticate(Some(&token)).await,
            Err(Error::Authentication(AuthFailure::IdentityStale))
        ));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let storage = Arc::new(MemoryStore::new());
        seeded_user(&storage, Role::Monitor).await;
        let auth = authenticator(Arc::clone(&storage));

        assert!(matches!(
            auth.login("ana@lab.example", "wrong").await,
            Err(Error::Authentication(AuthFailure::BadCredentials))
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let auth = authenticator(Arc::new(MemoryStore::new()));
        assert!(matches!(
            auth.login("nobody@lab.example", "x").await,
            Err(Error::NotFound("user"))
        ));
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let storage = Arc::new(MemoryStore::new());
        let user = seeded_user(&storage, Role::Sistema).await;
        let auth = authenticator(Arc::clone(&storage));

        let (logged_in, token) = auth.login("ana@lab.example", "secreto123").await.unwrap();
        assert_eq!(logged_in.id(), user.id());
        let verified = auth.authenticate(Some(&token)).await.unwrap();
        assert_eq!(verified.id(), user.id());
    }
}
