//! argon2id hashing. The async entry points run the work on the blocking
//! pool so login bursts do not stall the request workers.

use crate::error::KomikError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::LazyLock;

/// Hash verified against when the account does not exist, so unknown-email
/// logins cost the same as wrong-password logins.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_blocking("dummy-password-for-timing").unwrap_or_default());

fn hash_blocking(password: &str) -> Result<String, KomikError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when `hash` is not a valid PHC string.
fn verify_blocking(password: &str, hash: &str) -> Result<bool, KomikError> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Argon2id PHC string for `password`.
pub async fn hash_password(password: &str) -> Result<String, KomikError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password)).await?
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, KomikError> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || verify_blocking(&password, &hash)).await?
}

pub async fn burn_verification(password: &str) {
    let password = password.to_owned();
    let _ = tokio::task::spawn_blocking(move || verify_blocking(&password, &DUMMY_HASH)).await;
}
