use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

/// Claims
///
/// Payload of every bearer token. Signed with the shared secret; nothing about the token
/// is stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject: the `user_id` the token authenticates as.
    pub sub: String,
    /// Expiration instant (unix seconds). The token is rejected at or after this instant.
    pub exp: i64,
    /// Issued-at instant (unix seconds).
    pub iat: i64,
}

/// Signing failed. Only reachable with a broken key or serializer.
#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct IssueError(#[from] jsonwebtoken::errors::Error);

/// Verification failed. Deliberately carries no cause.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("invalid token")]
pub struct InvalidToken;

/// TokenService
///
/// Issues and verifies HMAC-signed bearer tokens. The secret, algorithm and lifetime are
/// fixed at construction; building a new service with another secret invalidates every
/// token issued by the old one.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], algorithm: Algorithm, lifetime: Duration) -> Self {
        let mut validation = Validation::new(algorithm);
        // Only the configured algorithm is acceptable; `Validation::new` already pins the
        // list, this keeps it explicit.
        validation.algorithms = vec![algorithm];
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
            lifetime,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.jwt_algorithm,
            Duration::minutes(config.token_ttl_minutes),
        )
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// issue
    ///
    /// Signs a token for `subject` that expires `lifetime` from now.
    pub fn issue(&self, subject: &str) -> Result<String, IssueError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?)
    }

    /// verify
    ///
    /// Checks signature, algorithm, structure and expiry and returns the claims. Every
    /// failure collapses into `InvalidToken`; the specific cause is only traced.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let claims = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(cause = ?e.kind(), "token rejected");
                return Err(InvalidToken);
            }
        };

        // The library accepts `exp == now`; an instant at the boundary is already expired.
        if claims.exp <= Utc::now().timestamp() {
            tracing::debug!("token rejected: expired");
            return Err(InvalidToken);
        }

        Ok(claims)
    }
}
