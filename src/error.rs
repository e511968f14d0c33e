//! Error types for Bitacora
//!
//! Every fallible operation in the crate returns [`Result`]. The variants map
//! one-to-one onto the response classes the embedding transport layer uses:
//! 400 for malformed input and illegal transitions, 401 for authentication
//! failures, 403 for authorization failures, 404 for absent resources, 500
//! for integrity failures.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Reason an authentication attempt was rejected.
///
/// All reasons are reported with the same response class (401); the variants
/// exist so callers and logs can distinguish a missing credential from a
/// stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No bearer token was supplied with the request.
    TokenMissing,
    /// The token failed signature, format, or expiry verification.
    TokenInvalid,
    /// The token verified but its claims no longer match the live user
    /// record (the account was edited or removed after issuance).
    IdentityStale,
    /// Email/password login with a wrong password.
    BadCredentials,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::TokenMissing => "no bearer token provided",
            Self::TokenInvalid => "token is invalid or expired",
            Self::IdentityStale => "token claims no longer match the user record",
            Self::BadCredentials => "incorrect email or password",
        };
        f.write_str(msg)
    }
}

/// Bitacora error types
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input; the caller can resubmit corrected input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Referenced entity absent, including "no experiment currently running".
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Missing, invalid, or stale credential. Distinct from [`Error::Authorization`].
    #[error("authentication failed: {0}")]
    Authentication(AuthFailure),

    /// Valid identity, insufficient role or ownership for the action.
    #[error("not authorized to {0}")]
    Authorization(String),

    /// State-machine guard violated (e.g. starting an already-started
    /// experiment). A client error, not a server error.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A cascade or pointer-maintenance step failed partway.
    #[error("integrity failure: {0}")]
    Integrity(String),
}

impl Error {
    /// Numeric response class for the transport layer.
    #[must_use]
    pub const fn status_class(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InvalidTransition(_) => 400,
            Self::Authentication(_) => 401,
            Self::Authorization(_) => 403,
            Self::NotFound(_) => 404,
            Self::Integrity(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(Error::Validation("x".into()).status_class(), 400);
        assert_eq!(
            Error::Authentication(AuthFailure::TokenMissing).status_class(),
            401
        );
        assert_eq!(Error::Authorization("x".into()).status_class(), 403);
        assert_eq!(Error::NotFound("experiment").status_class(), 404);
        assert_eq!(Error::InvalidTransition("x".into()).status_class(), 400);
        assert_eq!(Error::Integrity("x".into()).status_class(), 500);
    }

    #[test]
    fn test_authentication_reasons_are_distinguishable() {
        let missing = Error::Authentication(AuthFailure::TokenMissing);
        let stale = Error::Authentication(AuthFailure::IdentityStale);
        assert_ne!(missing.to_string(), stale.to_string());
    }
}
