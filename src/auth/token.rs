use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{Config, ConfigError};

/// How long an issued token stays valid.
pub const TOKEN_LIFETIME_DAYS: i64 = 5;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identity the token was issued for (the user's email).
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Random per-token id, keeps tokens unique within the same second.
    pub jti: String,
}

/// Outcome of a successful signature check.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub claims: Claims,
    /// The signature is good but `exp` has passed.
    pub is_expired: bool,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed token or bad signature. Nothing inside it can be trusted.
    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies bearer tokens with a secret fixed at construction.
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Builds the service from an HMAC secret.
    ///
    /// Fails on an empty secret or a non-HMAC algorithm; both are startup errors.
    pub fn new(secret: &str, algorithm: Algorithm) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::Invalid {
                var: "JWT_ALGORITHM",
                value: format!("{:?}", algorithm),
            });
        }

        // Expiry is checked by hand in `verify` so an expired token still
        // decodes and can be reported as expired rather than invalid.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.jwt_secret, config.jwt_algorithm)
    }

    /// Issues a token for `identity`, valid for five days from now.
    pub fn issue(&self, identity: &str) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issues a token as if it had been created at `issued_at`.
    pub fn issue_at(&self, identity: &str, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: identity.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Checks the signature and reports whether the token has expired.
    ///
    /// Returns `Err` only when the signature or structure is bad; an expired
    /// but authentic token is `Ok` with `is_expired` set.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let is_expired = Utc::now().timestamp() >= data.claims.exp;

        Ok(VerifiedToken {
            claims: data.claims,
            is_expired,
        })
    }
}
