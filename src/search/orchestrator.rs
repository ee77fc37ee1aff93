//! Search request orchestration

use super::models::{SearchOptions, SearchPayload};
use super::SearchError;
use crate::auth::Identity;
use crate::config::SearchSettings;
use crate::metrics::{CallOutcome, Metrics};
use crate::providers::{CompletionProvider, ProviderError, SearchProvider};
use crate::results::AnswerResponse;
use crate::store::NewSearchRecord;
use crate::usage::{LedgerError, UsageLedger};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Coordinates one search: validation, usage gate, providers, commit
pub struct Orchestrator {
    search: Arc<dyn SearchProvider>,
    completion: Arc<dyn CompletionProvider>,
    ledger: UsageLedger,
    defaults: SearchSettings,
    metrics: Arc<Metrics>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(
        search: Arc<dyn SearchProvider>,
        completion: Arc<dyn CompletionProvider>,
        ledger: UsageLedger,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            search,
            completion,
            ledger,
            defaults: SearchSettings::default(),
            metrics,
        }
    }

    /// Set the defaults for omitted request fields
    pub fn with_defaults(mut self, defaults: SearchSettings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Handle a search request.
    ///
    /// `payload` is `None` when the body could not be decoded at all. No
    /// provider is called and nothing is written unless every check passes.
    pub async fn handle(
        &self,
        identity: Option<&Identity>,
        payload: Option<&SearchPayload>,
    ) -> Result<AnswerResponse, SearchError> {
        let identity = identity.ok_or(SearchError::Unauthorized)?;

        let empty = SearchPayload::default();
        let options = SearchOptions::from_payload(payload.unwrap_or(&empty), &self.defaults)?;

        if !self.ledger.check_remaining(&identity.user_id).await? {
            info!("user {} reached the usage limit", identity.user_id);
            self.metrics.inc_quota_denial();
            return Err(SearchError::QuotaExceeded);
        }

        self.run(identity, &options).await
    }

    async fn run(
        &self,
        identity: &Identity,
        options: &SearchOptions,
    ) -> Result<AnswerResponse, SearchError> {
        debug!(
            "Searching '{}' (depth {}, max {}) for user {}",
            options.query, options.depth, options.max_results, identity.user_id
        );

        let hits = self
            .timed(
                self.search.name(),
                self.search
                    .search(&options.query, options.depth, options.max_results),
            )
            .await?;
        debug!("{} returned {} hits", self.search.name(), hits.len());

        let response = self
            .timed(
                self.completion.name(),
                self.completion.answer(&options.query, &hits),
            )
            .await?;

        let record = NewSearchRecord::new(identity.user_id.clone(), options);
        let committed = match self.ledger.commit_search(&record).await {
            Ok(committed) => committed,
            Err(LedgerError::LimitReached(_)) => {
                info!("user {} reached the usage limit during the search", identity.user_id);
                self.metrics.inc_quota_denial();
                return Err(SearchError::QuotaExceeded);
            }
            Err(e) => {
                error!("failed to record search for {}: {}", identity.user_id, e);
                return Err(e.into());
            }
        };
        debug!("committed search record {}", committed.id);

        self.metrics.inc_search();
        Ok(response)
    }

    /// Await a provider call, recording its outcome and logging failures
    async fn timed<T>(
        &self,
        provider: &str,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        let start = Instant::now();
        let result = call.await;
        let elapsed = start.elapsed();

        let outcome = match &result {
            Ok(_) => CallOutcome::Success,
            Err(e) if e.is_timeout() => {
                warn!("{} timed out after {:?}", provider, elapsed);
                CallOutcome::Timeout
            }
            Err(e) => {
                error!("{} failed: {}", provider, e);
                CallOutcome::Error
            }
        };
        self.metrics.record_call(provider, outcome, elapsed);

        result
    }
}
