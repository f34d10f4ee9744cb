use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use thiserror::Error;

use crate::{
    error::AppError,
    password,
    repository::{RepoError, Repository, RepositoryState},
    token::TokenService,
};

/// AuthUser
///
/// The resolved identity of an authenticated request. Only ever built from a verified token
/// whose subject exists in the credential store.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

/// AuthRejection
///
/// Why identity resolution stopped. Logged, never sent: every authentication variant
/// becomes the same `AppError::Unauthorized`. A store failure is not an authentication
/// outcome and becomes a 500.
#[derive(Debug, Error)]
pub enum AuthRejection {
    #[error("no bearer token in Authorization header")]
    MissingToken,
    #[error("token failed verification")]
    InvalidToken,
    #[error("token subject is empty")]
    EmptySubject,
    #[error("token subject does not match any user")]
    UnknownSubject,
    #[error("credential store unavailable: {0}")]
    Store(#[from] RepoError),
}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::Store(e) => AppError::Internal(e.to_string()),
            cause => {
                tracing::warn!(%cause, "rejected bearer credentials");
                AppError::Unauthorized
            }
        }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`. The scheme is matched
/// case-insensitively; an empty token counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// resolve_identity
///
/// The authentication boundary. Runs the steps in order and stops at the first failure:
/// token present, token verifies, subject non-empty, subject exists. One credential store
/// read per call, no caching.
pub async fn resolve_identity(
    tokens: &TokenService,
    repo: &dyn Repository,
    token: Option<&str>,
) -> Result<AuthUser, AuthRejection> {
    let token = token.ok_or(AuthRejection::MissingToken)?;

    let claims = tokens
        .verify(token)
        .map_err(|_| AuthRejection::InvalidToken)?;

    if claims.sub.trim().is_empty() {
        return Err(AuthRejection::EmptySubject);
    }

    let user = repo
        .get_user(&claims.sub)
        .await?
        .ok_or(AuthRejection::UnknownSubject)?;

    Ok(AuthUser {
        user_id: user.user_id,
        email: user.email,
    })
}

/// authenticate
///
/// The login check. Unknown user and wrong password are indistinguishable to the caller.
/// Returns a freshly issued token on success.
pub async fn authenticate(
    tokens: &TokenService,
    repo: &dyn Repository,
    user_id: &str,
    plaintext: &str,
) -> Result<String, AppError> {
    let Some(user) = repo.get_user(user_id).await? else {
        // Same Argon2 cost as a real check, or response time would reveal registered names.
        password::verify(plaintext, password::UNKNOWN_USER_HASH);
        tracing::info!(user_id, "login failed: unknown user");
        return Err(AppError::AuthenticationFailed);
    };

    if !password::verify(plaintext, &user.password_hash) {
        tracing::info!(user_id, "login failed: password mismatch");
        return Err(AppError::AuthenticationFailed);
    }

    tokens
        .issue(&user.user_id)
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// AuthUser Extractor Implementation
///
/// Lets handlers take `AuthUser` as an argument. On the protected route group the guard
/// middleware has already resolved the identity and stored it in the request extensions,
/// so this just hands it over. Used anywhere else it performs the full resolution itself.
///
/// Rejection: `AppError::Unauthorized` (401 + `WWW-Authenticate: Bearer`) for every
/// authentication failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let tokens = TokenService::from_ref(state);

        let user = resolve_identity(&tokens, repo.as_ref(), bearer_token(&parts.headers)).await?;
        tracing::debug!(user_id = %user.user_id, "resolved request identity");
        Ok(user)
    }
}
