use crate::db::models::DbUser;
use crate::error::KomikError;
use crate::types::Role;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Access token payload. `securityStamp` must match the stored user's stamp
/// for the token to be accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub security_stamp: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer/verifier shared by every request.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// An empty `secret` gets a random per-process key; tokens then do not
    /// survive a restart.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let secret_bytes = if secret.is_empty() {
            warn!("auth.jwt_secret is not set; using a random secret for this process");
            let mut bytes = [0u8; 64];
            rand::thread_rng().fill(&mut bytes[..]);
            bytes.to_vec()
        } else {
            secret.as_bytes().to_vec()
        };
        Self {
            encoding: EncodingKey::from_secret(&secret_bytes),
            decoding: DecodingKey::from_secret(&secret_bytes),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn claims_for(&self, user: &DbUser) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            security_stamp: user.security_stamp.clone(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        }
    }

    pub fn issue(&self, user: &DbUser) -> Result<String, KomikError> {
        self.sign(&self.claims_for(user))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, KomikError> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding,
        )?)
    }

    /// Signature and expiry check only; the stamp is checked against storage by the caller.
    pub fn decode(&self, token: &str) -> Result<Claims, KomikError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| KomikError::Unauthorized("Invalid or expired token"))
    }
}
