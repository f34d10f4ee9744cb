use crate::models::{Post, User, Vote};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// RepoError
///
/// Storage failures the handlers must tell apart. Uniqueness and foreign-key violations are
/// surfaced as their own variants because they carry meaning (duplicate vote, vanished post);
/// everything else is an opaque database error.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("unique constraint violated")]
    Duplicate,
    #[error("foreign key constraint violated")]
    MissingReference,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository Trait
///
/// Abstract contract for all persistence operations, so handlers and the identity resolver
/// work the same against Postgres or the in-memory store.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential Store ---
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, RepoError>;
    // Fails with `Duplicate` if either the user_id or the email is taken.
    async fn create_user(&self, user: User) -> Result<User, RepoError>;
    // Password rotation hook. Returns false if the user does not exist.
    async fn update_password_hash(&self, user_id: &str, password_hash: &str) -> Result<bool, RepoError>;

    // --- Posts ---
    async fn get_post(&self, post_id: i32) -> Result<Option<Post>, RepoError>;
    async fn get_posts_by_owner(&self, user_id: &str) -> Result<Vec<Post>, RepoError>;
    // Fails with `Duplicate` if the post_id is taken.
    async fn create_post(&self, post: Post) -> Result<Post, RepoError>;
    // Owner-scoped: only touches the row if `user_id` still owns it.
    async fn update_post(&self, post_id: i32, user_id: &str, post_data: &str) -> Result<Option<Post>, RepoError>;
    // Owner-scoped: returns true only if a row was deleted.
    async fn delete_post(&self, post_id: i32, user_id: &str) -> Result<bool, RepoError>;

    // --- Votes ---
    // Fails with `Duplicate` if the pair already voted, `MissingReference` if the post is gone.
    async fn add_vote(&self, vote: Vote) -> Result<(), RepoError>;
    // Returns true only if a vote row was removed.
    async fn remove_vote(&self, vote: &Vote) -> Result<bool, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Classifies constraint violations reported by the database.
fn classify(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepoError::Duplicate;
        }
        if db.is_foreign_key_violation() {
            return RepoError::MissingReference;
        }
    }
    RepoError::Database(e)
}

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Every operation is a single
/// statement, so each mutation is atomic without an explicit transaction.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, email, password_hash FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING user_id, email, password_hash
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_password_hash(&self, user_id: &str, password_hash: &str) -> Result<bool, RepoError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_post(&self, post_id: i32) -> Result<Option<Post>, RepoError> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT post_id, post_data, user_id FROM posts WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn get_posts_by_owner(&self, user_id: &str) -> Result<Vec<Post>, RepoError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT post_id, post_data, user_id FROM posts WHERE user_id = $1 ORDER BY post_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn create_post(&self, post: Post) -> Result<Post, RepoError> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (post_id, post_data, user_id)
            VALUES ($1, $2, $3)
            RETURNING post_id, post_data, user_id
            "#,
        )
        .bind(post.post_id)
        .bind(&post.post_data)
        .bind(&post.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_post(&self, post_id: i32, user_id: &str, post_data: &str) -> Result<Option<Post>, RepoError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts SET post_data = $3
            WHERE post_id = $1 AND user_id = $2
            RETURNING post_id, post_data, user_id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(post_data)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn delete_post(&self, post_id: i32, user_id: &str) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// add_vote
    ///
    /// No `ON CONFLICT` clause: a concurrent duplicate must fail loudly so the caller can
    /// answer 409, and the composite primary key guarantees only one insert wins.
    async fn add_vote(&self, vote: Vote) -> Result<(), RepoError> {
        sqlx::query("INSERT INTO votes (post_id, user_id) VALUES ($1, $2)")
            .bind(vote.post_id)
            .bind(&vote.user_id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn remove_vote(&self, vote: &Vote) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM votes WHERE post_id = $1 AND user_id = $2")
            .bind(vote.post_id)
            .bind(&vote.user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Default)]
struct MemoryTables {
    users: HashMap<String, User>,
    posts: BTreeMap<i32, Post>,
    votes: HashSet<Vote>,
}

/// MemoryRepository
///
/// In-process `Repository` with the same uniqueness and foreign-key rules as the Postgres
/// schema. Used by the test suite and by local runs with `DATABASE_URL=memory`. Each
/// operation holds the lock for its whole check-and-write, which is what makes the
/// uniqueness rules race-free here.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<MemoryTables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        let email_taken = tables.users.values().any(|u| u.email == user.email);
        if email_taken || tables.users.contains_key(&user.user_id) {
            return Err(RepoError::Duplicate);
        }
        tables.users.insert(user.user_id.clone(), user.clone());
        Ok(user)
    }

    async fn update_password_hash(&self, user_id: &str, password_hash: &str) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(user_id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_post(&self, post_id: i32) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&post_id).cloned())
    }

    async fn get_posts_by_owner(&self, user_id: &str) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_post(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.user_id) {
            return Err(RepoError::MissingReference);
        }
        if tables.posts.contains_key(&post.post_id) {
            return Err(RepoError::Duplicate);
        }
        tables.posts.insert(post.post_id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, post_id: i32, user_id: &str, post_data: &str) -> Result<Option<Post>, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.posts.get_mut(&post_id) {
            Some(post) if post.user_id == user_id => {
                post.post_data = post_data.to_string();
                Ok(Some(post.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_post(&self, post_id: i32, user_id: &str) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .posts
            .get(&post_id)
            .is_some_and(|p| p.user_id == user_id);
        if !owned {
            return Ok(false);
        }
        tables.posts.remove(&post_id);
        // Mirrors ON DELETE CASCADE.
        tables.votes.retain(|v| v.post_id != post_id);
        Ok(true)
    }

    async fn add_vote(&self, vote: Vote) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&vote.post_id) || !tables.users.contains_key(&vote.user_id) {
            return Err(RepoError::MissingReference);
        }
        if !tables.votes.insert(vote) {
            return Err(RepoError::Duplicate);
        }
        Ok(())
    }

    async fn remove_vote(&self, vote: &Vote) -> Result<bool, RepoError> {
        Ok(self.tables.write().await.votes.remove(vote))
    }
}
