//! Password hashing and access-token handling.
//!
//! Passwords are stored as argon2 PHC strings. Access tokens are HMAC-signed
//! JWTs whose `sub` claim is the username.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{BlogError, Result};

pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| BlogError::PasswordHash(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Returns `Ok(false)` on mismatch; errors only if `hash` is not a valid
/// PHC string.
pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| BlogError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: u64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, algorithm: Algorithm, ttl_secs: i64) -> Self {
        Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            config.jwt_algorithm,
            config.token_ttl_minutes.saturating_mul(60),
        )
    }

    pub fn issue(&self, subject: &str) -> Result<String> {
        let now = jsonwebtoken::get_current_timestamp() as i64;
        let claims = Claims {
            sub: Some(subject.to_string()),
            exp: now.saturating_add(self.ttl_secs).max(0) as u64,
        };
        let token = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verifies signature, algorithm and expiry. Any failure is reported as
    /// `InvalidCredentials`.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected access token");
                BlogError::InvalidCredentials
            })
    }
}
