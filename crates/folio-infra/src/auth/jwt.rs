//! Local verification of store-issued session tokens.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use folio_core::ports::{AuthError, AuthUser};

/// Session verifier configuration.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            audience: "authenticated".to_string(),
        }
    }
}

/// Access token claims as the hosted auth provider issues them.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    aud: String,
    exp: i64,
    iat: i64,
}

/// What a valid access token says about its holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user: AuthUser,
    pub expires_at: Option<DateTime<Utc>>,
}

/// HS256 verifier for session access tokens.
pub struct SessionVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl SessionVerifier {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let claims = token_data.claims;
        Ok(VerifiedToken {
            user: AuthUser {
                id: claims.sub,
                email: claims.email,
            },
            expires_at: DateTime::from_timestamp(claims.exp, 0),
        })
    }

    /// Signs a token the way the provider would. Used for local tooling and tests.
    pub fn issue(&self, user: &AuthUser, ttl: TimeDelta) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            aud: self.config.audience.clone(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
