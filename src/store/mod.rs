//! Relational store for users and search history
//!
//! The [`UserStore`] trait is the seam between the core and the database;
//! [`SqliteStore`] is the production implementation.

mod models;
mod sqlite;

pub use models::*;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("no user with id {0}")]
    UnknownUser(String),

    #[error("user {0} reached the usage limit")]
    LimitReached(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations used by the usage ledger and the HTTP layer
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by id
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;

    /// Register a user on `plan` with `usage_limit` searches
    async fn create_user(&self, plan: Plan, usage_limit: u32) -> StoreResult<User>;

    /// Atomically add one to the user's usage counter.
    ///
    /// Fails with `LimitReached` instead of going past `usage_limit`.
    async fn increment_usage(&self, user_id: &str) -> StoreResult<()>;

    /// Increment usage and insert the search record in one transaction.
    ///
    /// Nothing is written when the user is unknown or already at the limit.
    async fn commit_search(&self, record: &NewSearchRecord) -> StoreResult<SearchRecord>;

    /// Most recent searches for a user, newest first
    async fn recent_searches(&self, user_id: &str, limit: u32) -> StoreResult<Vec<SearchRecord>>;
}
