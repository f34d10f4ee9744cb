use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{AppError, AppResult},
    models::{
        CreatePostRequest, ErrorResponse, LoginForm, MessageResponse, Post, RegisterUserRequest,
        TokenResponse, UpdatePostRequest, User, UserResponse, VoteRequest,
    },
    ownership::{self, VoteOutcome},
    password,
    repository::RepoError,
};
use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
};

// --- Public Handlers ---

/// home
///
/// [Public Route] Greeting used as a smoke test of the deployment.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Greeting", body = MessageResponse))
)]
pub async fn home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome Home!".to_string(),
    })
}

/// register_user
///
/// [Public Route] Creates a user. The password is hashed before it reaches the store and
/// the response never contains it.
#[utoipa::path(
    post,
    path = "/users/",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = UserResponse),
        (status = 400, description = "Invalid input or user already exists", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    validate_registration(&payload)?;

    let password_hash =
        password::hash(&payload.password).map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User {
        user_id: payload.user_id.trim().to_string(),
        email: payload.email.trim().to_string(),
        password_hash,
    };

    let created = match state.repo.create_user(user).await {
        Ok(user) => user,
        Err(RepoError::Duplicate) => {
            return Err(AppError::BadRequest("User id or email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %created.user_id, "registered user");
    Ok((StatusCode::CREATED, Json(created.into())))
}

fn validate_registration(payload: &RegisterUserRequest) -> AppResult<()> {
    let user_id = payload.user_id.trim();
    if user_id.is_empty() || user_id.chars().any(char::is_whitespace) {
        return Err(AppError::BadRequest("user_id must be a non-empty single word".into()));
    }

    let valid_email = payload
        .email
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        });
    if !valid_email {
        return Err(AppError::BadRequest("email is not a valid address".into()));
    }

    if payload.password.is_empty() {
        return Err(AppError::BadRequest("password must not be empty".into()));
    }
    Ok(())
}

/// login
///
/// [Public Route] Exchanges form-encoded credentials for a bearer token.
///
/// *Uniform failure*: an unknown user and a wrong password produce the same 401.
#[utoipa::path(
    post,
    path = "/login/",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let access_token =
        auth::authenticate(&state.tokens, state.repo.as_ref(), &form.username, &form.password)
            .await?;

    tracing::info!(user_id = %form.username, "issued access token");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

// --- Authenticated Handlers ---

/// get_my_posts
///
/// [Authenticated Route] Lists every post owned by the caller. An empty list is reported
/// as 404.
#[utoipa::path(
    get,
    path = "/posts/all/",
    responses(
        (status = 200, description = "My posts", body = [Post]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Caller owns no posts", body = ErrorResponse)
    )
)]
pub async fn get_my_posts(
    AuthUser { user_id, .. }: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Post>>> {
    let posts = state.repo.get_posts_by_owner(&user_id).await?;
    if posts.is_empty() {
        return Err(AppError::NotFound("Post not found".into()));
    }
    Ok(Json(posts))
}

/// get_post
///
/// [Authenticated Route] Reads one post, scoped to the caller's ownership. Someone else's
/// post is indistinguishable from a missing one.
#[utoipa::path(
    get,
    path = "/posts/{id}/",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not found or not yours", body = ErrorResponse)
    )
)]
pub async fn get_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> AppResult<Json<Post>> {
    let post = ownership::find_visible_post(state.repo.as_ref(), post_id, &auth_user).await?;
    Ok(Json(post))
}

/// create_post
///
/// [Authenticated Route] Creates a post owned by the caller. Any `user_id` in the body is
/// ignored.
#[utoipa::path(
    post,
    path = "/posts/",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 409, description = "Post id already taken", body = ErrorResponse)
    )
)]
pub async fn create_post(
    AuthUser { user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    if payload.user_id.as_deref().is_some_and(|claimed| claimed != user_id) {
        tracing::debug!(caller = %user_id, "ignoring foreign user_id in post body");
    }

    let post = Post {
        post_id: payload.post_id,
        post_data: payload.post_data,
        user_id,
    };

    match state.repo.create_post(post).await {
        Ok(post) => Ok((StatusCode::CREATED, Json(post))),
        Err(RepoError::Duplicate) => Err(AppError::Conflict(format!(
            "Post with id {} already exists",
            payload.post_id
        ))),
        Err(e) => Err(e.into()),
    }
}

/// update_post
///
/// [Authenticated Route] Replaces the text of one of the caller's posts.
#[utoipa::path(
    put,
    path = "/posts/{id}/",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not owner", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<Json<Post>> {
    let repo = state.repo.as_ref();
    ownership::find_owned_post(repo, post_id, &auth_user, "update").await?;

    repo.update_post(post_id, &auth_user.user_id, &payload.post_data)
        .await?
        .map(Json)
        // Deleted between the ownership check and the write.
        .ok_or_else(|| AppError::NotFound(format!("Post with id {post_id} not found")))
}

/// delete_post
///
/// [Authenticated Route] Deletes one of the caller's posts, along with its votes.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> AppResult<StatusCode> {
    let repo = state.repo.as_ref();
    ownership::find_owned_post(repo, post_id, &auth_user, "delete").await?;

    if repo.delete_post(post_id, &auth_user.user_id).await? {
        tracing::info!(post_id, user_id = %auth_user.user_id, "deleted post");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Post with id {post_id} not found")))
    }
}

/// vote
///
/// [Authenticated Route] Adds (`dir = 1`) or retracts (`dir = 0`) the caller's vote on a
/// post. A second add is a 409; retracting a vote that does not exist is a 404.
#[utoipa::path(
    post,
    path = "/votes/",
    request_body = VoteRequest,
    responses(
        (status = 201, description = "Vote added", body = MessageResponse),
        (status = 200, description = "Vote removed", body = MessageResponse),
        (status = 404, description = "Unknown post or no vote to remove", body = ErrorResponse),
        (status = 409, description = "Already voted", body = ErrorResponse)
    )
)]
pub async fn vote(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<VoteRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let outcome =
        ownership::apply_vote(state.repo.as_ref(), &auth_user, payload.post_id, payload.dir).await?;

    let (status, message) = match outcome {
        VoteOutcome::Added => (StatusCode::CREATED, "Vote added successfully"),
        VoteOutcome::Removed => (StatusCode::OK, "Vote removed successfully"),
    };
    Ok((
        status,
        Json(MessageResponse {
            message: message.to_string(),
        }),
    ))
}
