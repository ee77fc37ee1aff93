//! SQLite-backed user store

use super::{NewSearchRecord, Plan, SearchRecord, StoreError, StoreResult, User, UserStore};
use crate::config::DatabaseSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

const SCHEMA_VERSION: i64 = 1;

type UserRow = (String, String, i64, i64, DateTime<Utc>);
type SearchRow = (String, String, String, String, i64, DateTime<Utc>);

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database named in `settings`
    pub async fn connect(settings: &DatabaseSettings) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&settings.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database, mainly for tests and demos.
    ///
    /// A single long-lived connection keeps the database alive.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        Self::initialize_schema(&pool).await?;

        let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await?;
        if version != SCHEMA_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported schema version: {}",
                version
            )));
        }

        Ok(Self { pool })
    }

    async fn initialize_schema(pool: &SqlitePool) -> StoreResult<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)")
            .execute(pool)
            .await?;

        sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                plan TEXT NOT NULL DEFAULT 'FREE',
                current_usage INTEGER NOT NULL DEFAULT 0 CHECK (current_usage >= 0),
                usage_limit INTEGER NOT NULL CHECK (usage_limit > 0),
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS searches (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                query TEXT NOT NULL,
                search_depth TEXT NOT NULL,
                max_results INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_searches_user ON searches(user_id, created_at DESC)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn user_from_row(row: UserRow) -> StoreResult<User> {
        let (id, plan, current_usage, usage_limit, created_at) = row;
        Ok(User {
            plan: plan.parse().map_err(StoreError::Corrupt)?,
            current_usage: to_u32(current_usage, "current_usage")?,
            usage_limit: to_u32(usage_limit, "usage_limit")?,
            id,
            created_at,
        })
    }

    fn search_from_row(row: SearchRow) -> StoreResult<SearchRecord> {
        let (id, user_id, query, search_depth, max_results, created_at) = row;
        Ok(SearchRecord {
            id,
            user_id,
            query,
            search_depth: search_depth.parse().map_err(StoreError::Corrupt)?,
            max_results: u8::try_from(max_results)
                .map_err(|_| StoreError::Corrupt(format!("max_results {}", max_results)))?,
            created_at,
        })
    }
}

/// Add one to a user's counter unless it already reached the plan limit
async fn charge(conn: &mut SqliteConnection, user_id: &str) -> StoreResult<()> {
    let updated = sqlx::query(
        "UPDATE users SET current_usage = current_usage + 1 WHERE id = ? AND current_usage < usage_limit",
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    if updated.rows_affected() == 1 {
        return Ok(());
    }

    let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    match exists {
        Some(_) => Err(StoreError::LimitReached(user_id.to_string())),
        None => Err(StoreError::UnknownUser(user_id.to_string())),
    }
}

fn to_u32(value: i64, column: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} {}", column, value)))
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, plan, current_usage, usage_limit, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::user_from_row).transpose()
    }

    async fn create_user(&self, plan: Plan, usage_limit: u32) -> StoreResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            plan,
            current_usage: 0,
            usage_limit,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, plan, current_usage, usage_limit, created_at) VALUES (?, ?, 0, ?, ?)",
        )
        .bind(&user.id)
        .bind(plan.as_str())
        .bind(i64::from(usage_limit))
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        debug!("created {} user {}", plan, user.id);
        Ok(user)
    }

    async fn increment_usage(&self, user_id: &str) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        charge(&mut *conn, user_id).await
    }

    async fn commit_search(&self, record: &NewSearchRecord) -> StoreResult<SearchRecord> {
        let committed = SearchRecord {
            id: Uuid::new_v4().to_string(),
            user_id: record.user_id.clone(),
            query: record.query.clone(),
            search_depth: record.search_depth,
            max_results: record.max_results,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        // an early return drops the transaction, which rolls it back
        charge(&mut *tx, &record.user_id).await?;

        sqlx::query(
            "INSERT INTO searches (id, user_id, query, search_depth, max_results, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&committed.id)
        .bind(&committed.user_id)
        .bind(&committed.query)
        .bind(committed.search_depth.as_str())
        .bind(i64::from(committed.max_results))
        .bind(committed.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(committed)
    }

    async fn recent_searches(&self, user_id: &str, limit: u32) -> StoreResult<Vec<SearchRecord>> {
        let rows: Vec<SearchRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, query, search_depth, max_results, created_at
            FROM searches
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::search_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchDepth;

    fn record(user_id: &str, query: &str) -> NewSearchRecord {
        NewSearchRecord {
            user_id: user_id.to_string(),
            query: query.to_string(),
            search_depth: SearchDepth::Advanced,
            max_results: 8,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store.create_user(Plan::Paid, 1000).await.unwrap();

        let found = store.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(found.plan, Plan::Paid);
        assert_eq!(found.current_usage, 0);
        assert_eq!(found.usage_limit, 1000);

        assert!(store.find_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_increment_usage() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store.create_user(Plan::Free, 5).await.unwrap();

        store.increment_usage(&user.id).await.unwrap();
        store.increment_usage(&user.id).await.unwrap();
        let err = store.increment_usage("nobody").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser(_)));

        let found = store.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(found.current_usage, 2);
    }

    #[tokio::test]
    async fn test_increment_stops_at_limit() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store.create_user(Plan::Free, 1).await.unwrap();

        store.increment_usage(&user.id).await.unwrap();
        let err = store.increment_usage(&user.id).await.unwrap_err();
        assert!(matches!(err, StoreError::LimitReached(_)));
        assert_eq!(store.find_user(&user.id).await.unwrap().unwrap().current_usage, 1);
    }

    #[tokio::test]
    async fn test_racing_commits_never_exceed_limit() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store.create_user(Plan::Free, 5).await.unwrap();
        for _ in 0..4 {
            store.increment_usage(&user.id).await.unwrap();
        }

        // both requests passed the quota check at 4/5
        store.commit_search(&record(&user.id, "first")).await.unwrap();
        let err = store.commit_search(&record(&user.id, "second")).await.unwrap_err();
        assert!(matches!(err, StoreError::LimitReached(_)));

        let found = store.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(found.current_usage, 5);
        let recent = store.recent_searches(&user.id, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].query, "first");
    }

    #[tokio::test]
    async fn test_commit_search_is_atomic() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store.create_user(Plan::Free, 5).await.unwrap();

        let committed = store.commit_search(&record(&user.id, "first")).await.unwrap();
        assert_eq!(committed.search_depth, SearchDepth::Advanced);

        let err = store.commit_search(&record("ghost", "lost")).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser(_)));
        assert!(store.recent_searches("ghost", 10).await.unwrap().is_empty());

        let found = store.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(found.current_usage, 1);
    }

    #[tokio::test]
    async fn test_recent_searches_newest_first() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store.create_user(Plan::Free, 10).await.unwrap();
        for query in ["one", "two", "three"] {
            store.commit_search(&record(&user.id, query)).await.unwrap();
        }

        let recent = store.recent_searches(&user.id, 2).await.unwrap();
        let queries: Vec<_> = recent.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, ["three", "two"]);
        assert_eq!(recent[0].max_results, 8);
    }
}
