//! Credential primitives: password hashing, signed access tokens and
//! installation recovery keys.

pub mod password;
pub mod recovery;
pub mod token;

pub use token::TokenService;
