//! TokenIssuer — signed access tokens and opaque refresh identifiers
//!
//! Access tokens are stateless JWTs verified on every request; refresh
//! tokens are random 128-bit identifiers whose state lives in the store.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::store::User;

/// Scheme reported alongside every issued token pair
pub const TOKEN_TYPE: &str = "Bearer";

/// Claims carried by every access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (email)
    pub sub: String,
    /// Owning user id
    pub user_id: i64,
    /// Primary role name
    pub role: String,
    /// Expiry (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Mints and verifies access tokens, generates refresh identifiers
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    access_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(config.jwt_algorithm);
        // strict expiry, no clock-skew leeway
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            header: Header::new(config.jwt_algorithm),
            validation,
            access_ttl: Duration::minutes(config.access_ttl_minutes),
        }
    }

    /// Mint a signed access token for the user under the given role
    pub fn mint(&self, user: &User, role_name: &str) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: role_name.to_string(),
            exp: (now + self.access_ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify a signed access token, distinguishing expired from invalid
    pub fn verify(&self, token: &str) -> Result<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// New opaque refresh identifier: 32 hex chars, 128 random bits
    pub fn new_refresh_token() -> String {
        Uuid::new_v4().simple().to_string()
    }
}
