use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, TimeZone, Utc};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};

use crate::models::{SessionId, UserId};

// =============================================================================
// Password Hashing
// =============================================================================

/// Argon2id hasher with configurable cost
#[derive(Clone)]
pub struct PasswordHasherConfig {
    params: Params,
}

impl PasswordHasherConfig {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, String> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| format!("argon2 params: {}", e))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plain password into a PHC string.
    ///
    /// CPU-bound; callers on the async runtime go through `spawn_blocking`.
    pub fn hash_password(&self, password: &str) -> Result<String, String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| e.to_string())
    }

    /// Verify a password against a stored PHC string.
    ///
    /// The parameters embedded in the hash win over the configured ones.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => {
                tracing::warn!("Stored password hash is not a valid PHC string");
                false
            }
        }
    }
}

// =============================================================================
// Session Tokens
// =============================================================================

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Session id
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
}

/// A token just issued at login
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 token issuer and verifier
#[derive(Clone)]
pub struct TokenService {
    encoding_key: jsonwebtoken::EncodingKey,
    decoding_key: jsonwebtoken::DecodingKey,
    validation: jsonwebtoken::Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
            validation: jsonwebtoken::Validation::default(),
        }
    }

    /// Sign a token for `user` bound to `session`, expiring at `expires_at`
    pub fn issue(
        &self,
        user: UserId,
        session: SessionId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<IssuedToken, String> {
        let claims = Claims {
            sub: user.to_string(),
            sid: session.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token =
            jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding_key)
                .map_err(|e| format!("jwt encode: {}", e))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expires_at);
        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and expiry and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims, String> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| format!("jwt verify: {}", e))
    }
}
