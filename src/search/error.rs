//! Failure taxonomy of a search request

use crate::providers::ProviderError;
use crate::store::StoreError;
use crate::usage::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("user is not allowed to search")]
    Forbidden,

    #[error("usage limit reached")]
    QuotaExceeded,

    #[error("request timed out")]
    RequestTimeout,

    #[error("upstream provider failed: {0}")]
    Upstream(ProviderError),

    #[error("storage failed: {0}")]
    Storage(#[from] StoreError),
}

impl SearchError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SearchError::InvalidInput(message.into())
    }

    /// True when the caller should be offered a plan upgrade
    pub fn upgrade_required(&self) -> bool {
        matches!(self, SearchError::QuotaExceeded)
    }
}

impl From<ProviderError> for SearchError {
    fn from(err: ProviderError) -> Self {
        if err.is_timeout() {
            SearchError::RequestTimeout
        } else {
            SearchError::Upstream(err)
        }
    }
}

impl From<LedgerError> for SearchError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => SearchError::Forbidden,
            LedgerError::LimitReached(_) => SearchError::QuotaExceeded,
            LedgerError::Store(e) => SearchError::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_classification() {
        let timeout = SearchError::from(ProviderError::Timeout {
            provider: "tavily".into(),
        });
        assert!(matches!(timeout, SearchError::RequestTimeout));

        let missing = SearchError::from(ProviderError::MissingCredential {
            provider: "mistral".into(),
        });
        assert!(matches!(missing, SearchError::Upstream(_)));
    }

    #[test]
    fn test_ledger_not_found_is_forbidden() {
        let err = SearchError::from(LedgerError::NotFound("u1".into()));
        assert!(matches!(err, SearchError::Forbidden));
        assert!(!err.upgrade_required());
        assert!(SearchError::QuotaExceeded.upgrade_required());

        let err = SearchError::from(LedgerError::LimitReached("u1".into()));
        assert!(err.upgrade_required());
    }
}
