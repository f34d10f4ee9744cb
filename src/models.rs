use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical credential record from the `users` table. The `user_id` is chosen by the
/// registrant, never changes, and is the subject embedded in every issued token.
///
/// Not `Serialize`: the password hash must never leave the service. Use `UserResponse`.
#[derive(Clone, FromRow, PartialEq)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Post
///
/// A text post from the `posts` table. Owned exclusively by `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Post {
    pub post_id: i32,
    pub post_data: String,
    // FK to users.user_id (Owner).
    pub user_id: String,
}

/// Vote
///
/// One row of the `votes` table. The `(post_id, user_id)` pair is the primary key, so the
/// store itself rejects a second vote from the same user on the same post.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq, Eq, Hash)]
#[ts(export)]
pub struct Vote {
    pub post_id: i32,
    pub user_id: String,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for `POST /users/`. The plaintext password is hashed before storage and
/// is never persisted or logged.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[schema(example = "alice")]
    pub user_id: String,
    #[schema(example = "a@x.com")]
    pub email: String,
    pub password: String,
}

/// LoginForm
///
/// Form-encoded credentials for `POST /login/`, field names as in the OAuth2 password flow.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// CreatePostRequest
///
/// Input payload for `POST /posts/`. `user_id` is accepted for wire compatibility but
/// ignored: the owner is always the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub post_id: i32,
    pub post_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// UpdatePostRequest
///
/// Input payload for `PUT /posts/{id}/`. Only the body text can change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    pub post_data: String,
}

/// VoteDirection
///
/// The `dir` command of a vote request. Deserialized from the integers `1` and `0`;
/// anything else is rejected before the handler runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum VoteDirection {
    Remove,
    Add,
}

impl TryFrom<u8> for VoteDirection {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDirection::Add),
            0 => Ok(VoteDirection::Remove),
            other => Err(format!("dir must be 0 or 1, got {other}")),
        }
    }
}

impl From<VoteDirection> for u8 {
    fn from(dir: VoteDirection) -> Self {
        match dir {
            VoteDirection::Add => 1,
            VoteDirection::Remove => 0,
        }
    }
}

/// VoteRequest
///
/// Input payload for `POST /votes/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct VoteRequest {
    pub post_id: i32,
    #[ts(type = "0 | 1")]
    #[schema(value_type = u8, example = 1)]
    pub dir: VoteDirection,
}

// --- Response Schemas (Output) ---

/// UserResponse
///
/// Public view of a registered user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
        }
    }
}

/// TokenResponse
///
/// Output of a successful login. `token_type` is always `"bearer"`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

/// MessageResponse
///
/// Small acknowledgement body used by the vote and home endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// ErrorResponse
///
/// Body of every error response. One `detail` string, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct ErrorResponse {
    pub detail: String,
}
