//! Usage ledger: per-user search counters against plan limits

use crate::store::{NewSearchRecord, Plan, SearchRecord, StoreError, UserStore};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no user with id {0}")]
    NotFound(String),

    #[error("user {0} reached the usage limit")]
    LimitReached(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownUser(id) => LedgerError::NotFound(id),
            StoreError::LimitReached(id) => LedgerError::LimitReached(id),
            other => LedgerError::Store(other),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Snapshot of a user's consumption, as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub current_usage: u32,
    pub usage_limit: u32,
    pub plan: Plan,
}

impl UsageSnapshot {
    pub fn remaining(&self) -> u32 {
        self.usage_limit.saturating_sub(self.current_usage)
    }
}

/// Reads and charges usage through a [`UserStore`].
///
/// Counters only ever go up; resets belong to plan management.
#[derive(Clone)]
pub struct UsageLedger {
    store: Arc<dyn UserStore>,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Current counters for `user_id`
    pub async fn usage(&self, user_id: &str) -> LedgerResult<UsageSnapshot> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(user_id.to_string()))?;

        Ok(UsageSnapshot {
            current_usage: user.current_usage,
            usage_limit: user.usage_limit,
            plan: user.plan,
        })
    }

    /// True iff the user may run another search
    pub async fn check_remaining(&self, user_id: &str) -> LedgerResult<bool> {
        let snapshot = self.usage(user_id).await?;
        debug!(
            "user {} at {}/{}",
            user_id, snapshot.current_usage, snapshot.usage_limit
        );
        Ok(snapshot.current_usage < snapshot.usage_limit)
    }

    /// Charge one search
    pub async fn increment(&self, user_id: &str) -> LedgerResult<()> {
        Ok(self.store.increment_usage(user_id).await?)
    }

    /// Charge one search and record it, all or nothing
    pub async fn commit_search(&self, record: &NewSearchRecord) -> LedgerResult<SearchRecord> {
        Ok(self.store.commit_search(record).await?)
    }
}
