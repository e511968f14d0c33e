//! Authentication configuration

use chrono::Duration;

use crate::error::{Error, Result};

/// Minimum accepted length for the token-signing secret, in bytes.
///
/// HS256 keys shorter than the hash output add no security margin; refuse
/// them at construction time instead of signing weak tokens at runtime.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default validity window for issued tokens.
const DEFAULT_VALIDITY_HOURS: i64 = 6;

/// Configuration for token issuance and verification.
///
/// Constructed once by the process entry point and injected into the
/// [`TokenAuthenticator`](crate::auth::TokenAuthenticator); the secret never
/// appears in logs or `Debug` output.
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
    validity: Duration,
}

impl AuthConfig {
    /// Create a configuration with the default 6-hour validity window.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the secret is shorter than
    /// [`MIN_SECRET_LENGTH`] bytes.
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(Error::Validation(format!(
                "token secret must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }
        Ok(Self {
            secret,
            validity: Duration::hours(DEFAULT_VALIDITY_HOURS),
        })
    }

    /// Override the token validity window.
    #[must_use]
    pub const fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Signing secret bytes.
    #[must_use]
    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    /// Token validity window.
    #[must_use]
    pub const fn validity(&self) -> Duration {
        self.validity
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("validity", &self.validity)
            .finish()
    }
}
