//! Signed role markers

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use portal_db::UserRole;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// Claims carried by a signed role marker
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RoleClaims {
    /// Subject (username)
    pub sub: String,
    pub role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// HS256 signer for role markers.
///
/// Markers carry no `exp`: the session cookie's lifetime bounds them.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtManager {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn generate_token(&self, username: &str, role: UserRole) -> Result<String, AuthError> {
        let claims = RoleClaims {
            sub: username.to_string(),
            role,
            iat: Utc::now().timestamp(),
        };

        debug!("Signing role marker for user: {}", username);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    pub fn validate_token(&self, token: &str) -> Result<RoleClaims, AuthError> {
        let token_data = decode::<RoleClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}
