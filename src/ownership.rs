//! Existence and ownership checks shared by the post and vote handlers.
//!
//! Order matters and is observable: existence is checked before ownership, and ownership
//! before any mutation. Swapping them would turn a 404 into a 403 for absent posts.

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{Post, Vote, VoteDirection},
    repository::{RepoError, Repository},
};

/// What a vote command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Added,
    Removed,
}

/// Fetches a post or fails with `NotFound`.
pub async fn find_post(repo: &dyn Repository, post_id: i32) -> AppResult<Post> {
    repo.get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post with id {post_id} not found")))
}

/// Fails with `Forbidden` unless `user` owns `post`.
pub fn ensure_owner(post: &Post, user: &AuthUser, action: &str) -> AppResult<()> {
    if post.user_id != user.user_id {
        tracing::info!(
            post_id = post.post_id,
            owner = %post.user_id,
            caller = %user.user_id,
            action,
            "ownership check failed"
        );
        return Err(AppError::Forbidden(format!("Not authorized to {action} this post")));
    }
    Ok(())
}

/// Fetches a post for a mutating operation: 404 if absent, 403 if not the caller's.
pub async fn find_owned_post(
    repo: &dyn Repository,
    post_id: i32,
    user: &AuthUser,
    action: &str,
) -> AppResult<Post> {
    let post = find_post(repo, post_id).await?;
    ensure_owner(&post, user, action)?;
    Ok(post)
}

/// Fetches a post for an owner-scoped read. A foreign post is filtered out and reads as
/// absent, so the caller gets 404 either way.
pub async fn find_visible_post(repo: &dyn Repository, post_id: i32, user: &AuthUser) -> AppResult<Post> {
    match repo.get_post(post_id).await? {
        Some(post) if post.user_id == user.user_id => Ok(post),
        _ => Err(AppError::NotFound("Post not found".into())),
    }
}

/// apply_vote
///
/// The per-(post, user) state machine. `Add` moves no-vote to voted and conflicts when
/// already voted; `Remove` moves voted to no-vote and is `NotFound` from no-vote. The
/// uniqueness of a vote is decided by the store, not by a pre-read.
pub async fn apply_vote(
    repo: &dyn Repository,
    user: &AuthUser,
    post_id: i32,
    dir: VoteDirection,
) -> AppResult<VoteOutcome> {
    find_post(repo, post_id).await?;

    let vote = Vote {
        post_id,
        user_id: user.user_id.clone(),
    };

    match dir {
        VoteDirection::Add => match repo.add_vote(vote).await {
            Ok(()) => Ok(VoteOutcome::Added),
            Err(RepoError::Duplicate) => Err(AppError::Conflict(format!(
                "user {} has already voted on post {post_id}",
                user.user_id
            ))),
            // The post was deleted between the existence check and the insert.
            Err(RepoError::MissingReference) => {
                Err(AppError::NotFound(format!("Post with id {post_id} not found")))
            }
            Err(e) => Err(e.into()),
        },
        VoteDirection::Remove => {
            if repo.remove_vote(&vote).await? {
                Ok(VoteOutcome::Removed)
            } else {
                Err(AppError::NotFound("Vote does not exist".into()))
            }
        }
    }
}
