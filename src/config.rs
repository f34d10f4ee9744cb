use std::env;

use jsonwebtoken::Algorithm;
use thiserror::Error;

/// Fallback signing secret for local runs. Never accepted in production.
pub const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// Default bearer token lifetime.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 10;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and then
/// shared read-only through `AppState` (pulled out by handlers and extractors via `FromRef`).
///
/// Intentionally not `Debug`: it carries the token signing secret.
#[derive(Clone)]
pub struct AppConfig {
    // Database connection string (Postgres), or `memory` for the in-process store.
    pub db_url: String,
    pub db_max_connections: u32,
    // Runtime environment marker. Controls log format and secret requirements.
    pub env: Env,
    // Shared secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Signing algorithm. Restricted to the HMAC family.
    pub jwt_algorithm: Algorithm,
    pub token_ttl_minutes: i64,
    pub bind_addr: String,
}

/// Env
///
/// Runtime context: `Local` gets pretty logs and a fallback secret, `Production`
/// demands every secret explicitly and logs JSON.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("unsupported token algorithm {0}; only HS256, HS384 and HS512 are accepted")]
    UnsupportedAlgorithm(String),
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for test state scaffolding.
    fn default() -> Self {
        Self {
            db_url: "memory".to_string(),
            db_max_connections: 5,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_algorithm: Algorithm::HS256,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from the process environment. Missing production secrets and
    /// malformed values are reported as errors so `main` can refuse to start.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match (&env, env::var("JWT_SECRET")) {
            (_, Ok(secret)) if !secret.is_empty() => secret,
            (Env::Production, _) => return Err(ConfigError::Missing("JWT_SECRET")),
            (Env::Local, _) => LOCAL_JWT_SECRET.to_string(),
        };

        let db_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        if env == Env::Production && db_url == "memory" {
            return Err(ConfigError::Invalid {
                name: "DATABASE_URL",
                value: db_url,
            });
        }

        let jwt_algorithm = parse_algorithm(
            &env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
        )?;

        let token_ttl_minutes = match env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "ACCESS_TOKEN_EXPIRE_MINUTES",
                        value: raw,
                    });
                }
            },
            Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse::<u32>().map_err(|_| ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value: raw,
            })?,
            Err(_) => 5,
        };

        Ok(Self {
            db_url,
            db_max_connections,
            env,
            jwt_secret,
            jwt_algorithm,
            token_ttl_minutes,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        })
    }

    /// True when the configuration asks for the in-process store instead of Postgres.
    pub fn uses_memory_store(&self) -> bool {
        self.db_url == "memory"
    }
}

/// Accepts only symmetric HMAC algorithms. Asymmetric or unknown names are a
/// configuration error rather than something to discover at verification time.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}
