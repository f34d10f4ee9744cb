#![allow(dead_code)]

use std::sync::Arc;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use vote_board::{
    AppConfig, AppState, MemoryRepository,
    error::{AppError, AppResult},
    models::{Post, User},
    password,
    repository::Repository,
    token::Claims,
};

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

/// State over a fresh in-memory store. The concrete repo is returned too so tests can
/// seed and inspect it.
pub fn test_state() -> (AppState, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    let state = AppState::new(test_config(), repo.clone());
    (state, repo)
}

pub async fn seed_user(repo: &MemoryRepository, user_id: &str, email: &str, plaintext: &str) -> User {
    repo.create_user(User {
        user_id: user_id.to_string(),
        email: email.to_string(),
        password_hash: password::hash(plaintext).unwrap(),
    })
    .await
    .unwrap()
}

pub async fn seed_post(repo: &MemoryRepository, post_id: i32, owner: &str, text: &str) -> Post {
    repo.create_post(Post {
        post_id,
        post_data: text.to_string(),
        user_id: owner.to_string(),
    })
    .await
    .unwrap()
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Signs arbitrary claims, bypassing the service's own issuance rules.
pub fn forge_token(sub: &str, exp: i64, secret: &str, algorithm: Algorithm) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp,
        iat: now(),
    };
    encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Replaces the first character of the signature segment.
pub fn tamper_signature(token: &str) -> String {
    let (head, signature) = token.rsplit_once('.').unwrap();
    let mut chars: Vec<char> = signature.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    format!("{head}.{}", chars.into_iter().collect::<String>())
}

pub fn expect_err<T>(result: AppResult<T>) -> AppError {
    match result {
        Ok(_) => panic!("expected an error, got Ok"),
        Err(e) => e,
    }
}
