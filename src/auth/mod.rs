//! Authentication module
//!
//! Password hashing and stateless session tokens.

pub mod password;
pub mod token;

pub use password::{PasswordError, PasswordHasher};
pub use token::{Claims, Identity, TokenAuthority, TokenError, DEFAULT_TOKEN_TTL_DAYS};
