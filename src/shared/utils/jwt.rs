use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::config::environment::JwtConfig;
use crate::shared::error::AuthError;

/// Access token payload: `{sub, email, roles}` plus registered claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user ID
    pub email: String,
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Refresh tokens carry only the subject; `jti` keeps two tokens minted in
/// the same second distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KeyPair {
    fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }
}

/// Signing material for both token kinds, built once from configuration.
pub struct JwtKeys {
    access: KeyPair,
    refresh: KeyPair,
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            access: KeyPair::new(&config.access_secret, config.access_expires_in_secs),
            refresh: KeyPair::new(&config.refresh_secret, config.refresh_expires_in_secs),
        }
    }

    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            roles,
            iat: now.timestamp() as usize,
            exp: (now + self.access.ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.access.encoding)
            .map_err(|_| AuthError::JWTTokenCreationError)
    }

    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.refresh.ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.refresh.encoding)
            .map_err(|_| AuthError::JWTTokenCreationError)
    }

    pub fn generate_pair(
        &self,
        user_id: Uuid,
        email: &str,
        roles: Vec<String>,
    ) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user_id, email, roles)?,
            refresh_token: self.generate_refresh_token(user_id)?,
        })
    }

    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.access.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    pub fn decode_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        decode::<RefreshClaims>(
            token,
            &self.refresh.decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(map_decode_error)
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    }
}
