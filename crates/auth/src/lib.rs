//! Auth: password hashing and bearer tokens.

pub mod password;
pub mod token;

pub use password::{PasswordError, DEFAULT_COST, MAX_PASSWORD_BYTES};
pub use token::{Claims, TokenError, TokenIssuer, TOKEN_TTL_HOURS};
