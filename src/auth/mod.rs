//! Authentication: bearer tokens, passwords, and staleness checks
//!
//! The token and password primitives are thin bindings over `jsonwebtoken`
//! and `bcrypt`; the interesting part is [`TokenAuthenticator`], which
//! reconstitutes a caller identity from a bearer token and cross-checks the
//! embedded claims against the live user store so a role change or account
//! edit invalidates tokens issued before it.

mod config;
mod password;
mod token;

pub use config::{AuthConfig, MIN_SECRET_LENGTH};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenAuthenticator};
