use axum::{
    body::to_bytes,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::{Value, json};
use vote_board::{
    AppError,
    models::{CreatePostRequest, LoginForm, User, UserResponse, VoteDirection, VoteRequest},
    password,
};

fn user() -> User {
    User {
        user_id: "alice".to_string(),
        email: "a@x.com".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
    }
}

async fn render(error: AppError) -> (StatusCode, Option<String>, Value) {
    let response = error.into_response();
    let status = response.status();
    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, challenge, serde_json::from_slice(&body).unwrap())
}

// --- Request payloads ---

#[test]
fn test_vote_direction_accepts_only_zero_and_one() {
    let add: VoteRequest = serde_json::from_value(json!({ "post_id": 1, "dir": 1 })).unwrap();
    let remove: VoteRequest = serde_json::from_value(json!({ "post_id": 1, "dir": 0 })).unwrap();
    assert_eq!(add.dir, VoteDirection::Add);
    assert_eq!(remove.dir, VoteDirection::Remove);

    for bad in [json!(2), json!(-1), json!("1"), json!(true), json!(null)] {
        let parsed = serde_json::from_value::<VoteRequest>(json!({ "post_id": 1, "dir": bad }));
        assert!(parsed.is_err(), "accepted dir = {bad}");
    }
}

#[test]
fn test_vote_direction_serializes_as_integer() {
    assert_eq!(serde_json::to_value(VoteDirection::Add).unwrap(), json!(1));
    assert_eq!(serde_json::to_value(VoteDirection::Remove).unwrap(), json!(0));
}

#[test]
fn test_create_post_user_id_is_optional() {
    let without: CreatePostRequest =
        serde_json::from_value(json!({ "post_id": 1, "post_data": "hi" })).unwrap();
    let with: CreatePostRequest =
        serde_json::from_value(json!({ "post_id": 1, "post_data": "hi", "user_id": "bob" }))
            .unwrap();

    assert_eq!(without.user_id, None);
    assert_eq!(with.user_id.as_deref(), Some("bob"));
}

#[test]
fn test_login_form_field_names() {
    let form: LoginForm =
        serde_json::from_value(json!({ "username": "alice", "password": "pw123" })).unwrap();
    assert_eq!(form.username, "alice");
    assert_eq!(form.password, "pw123");
}

// --- Credential hygiene ---

#[test]
fn test_user_response_has_no_password_field() {
    let value = serde_json::to_value(UserResponse::from(user())).unwrap();

    assert_eq!(value, json!({ "user_id": "alice", "email": "a@x.com" }));
}

#[test]
fn test_user_debug_redacts_hash() {
    let debug = format!("{:?}", user());

    assert!(debug.contains("alice"));
    assert!(!debug.contains("argon2id"));
}

#[test]
fn test_password_hash_round_trip_and_salting() {
    let first = password::hash("pw123").unwrap();
    let second = password::hash("pw123").unwrap();

    assert_ne!(first, second);
    assert!(first.starts_with("$argon2id$"));
    assert!(password::verify("pw123", &first));
    assert!(!password::verify("pw124", &first));
    assert!(!password::verify("pw123", "not-a-phc-string"));
}

// --- Error responses ---

#[tokio::test]
async fn test_unauthorized_carries_bearer_challenge() {
    let (status, challenge, body) = render(AppError::Unauthorized).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(challenge.as_deref(), Some("Bearer"));
    assert_eq!(body, json!({ "detail": "Could not validate credentials" }));
}

#[tokio::test]
async fn test_login_failure_has_no_challenge() {
    let (status, challenge, body) = render(AppError::AuthenticationFailed).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(challenge, None);
    assert_eq!(body, json!({ "detail": "Invalid credentials" }));
}

#[tokio::test]
async fn test_internal_error_hides_cause() {
    let (status, _, body) =
        render(AppError::Internal("connection refused to 10.0.0.5:5432".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "Internal server error" }));
}

#[tokio::test]
async fn test_client_errors_keep_their_detail() {
    let cases = [
        (AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
        (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
        (AppError::Forbidden("nope".into()), StatusCode::FORBIDDEN),
        (AppError::Conflict("again".into()), StatusCode::CONFLICT),
    ];

    for (error, expected) in cases {
        let detail = error.to_string();
        let (status, challenge, body) = render(error).await;
        assert_eq!(status, expected);
        assert_eq!(challenge, None);
        assert_eq!(body["detail"], detail);
    }
}
