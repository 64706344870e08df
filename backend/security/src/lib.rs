//! Identity primitives: password hashing, signed session tokens and
//! credential shape checks.
pub mod credentials;
pub mod password;
pub mod token;

pub use credentials::{normalize_email, validate_email, validate_password, CredentialError, MIN_PASSWORD_LEN};
pub use password::{hash_password, verify_password};
pub use token::{AuthError, Claims, MAX_TTL_DAYS, TokenKeys};
