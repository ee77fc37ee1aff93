//! Metrics collection module
//!
//! Tracks provider performance, error rates and usage-gate outcomes.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Response times kept per provider
const RESPONSE_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    calls: u64,
    successes: u64,
    errors: u64,
    timeouts: u64,
    response_times: Vec<u64>,
}

/// In-process metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    /// Searches that returned an answer
    completed_searches: AtomicU64,
    /// Searches denied by the usage gate
    quota_denials: AtomicU64,
    providers: Mutex<HashMap<String, ProviderCounters>>,
}

/// Outcome of one provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Error,
    Timeout,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    fn providers(&self) -> MutexGuard<'_, HashMap<String, ProviderCounters>> {
        // counters stay usable even if a holder panicked
        self.providers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Increment completed search count
    pub fn inc_search(&self) {
        self.completed_searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment quota denial count
    pub fn inc_quota_denial(&self) {
        self.quota_denials.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one provider call and how long it took
    pub fn record_call(&self, provider: &str, outcome: CallOutcome, elapsed: Duration) {
        let mut providers = self.providers();
        let entry = providers.entry(provider.to_string()).or_default();

        entry.calls += 1;
        match outcome {
            CallOutcome::Success => entry.successes += 1,
            CallOutcome::Error => entry.errors += 1,
            CallOutcome::Timeout => entry.timeouts += 1,
        }

        if entry.response_times.len() >= RESPONSE_WINDOW {
            entry.response_times.remove(0);
        }
        entry
            .response_times
            .push(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    }

    /// Get completed searches
    pub fn get_total_searches(&self) -> u64 {
        self.completed_searches.load(Ordering::Relaxed)
    }

    /// Number of calls made to a provider
    pub fn get_calls(&self, provider: &str) -> u64 {
        self.providers().get(provider).map_or(0, |c| c.calls)
    }

    /// Snapshot of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let providers = self
            .providers()
            .iter()
            .map(|(name, counters)| (name.clone(), ProviderStats::from(counters)))
            .collect();

        MetricsSnapshot {
            completed_searches: self.get_total_searches(),
            quota_denials: self.quota_denials.load(Ordering::Relaxed),
            providers,
        }
    }
}

/// Serializable view served at `/stats`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub completed_searches: u64,
    pub quota_denials: u64,
    pub providers: HashMap<String, ProviderStats>,
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub calls: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub avg_response_time_ms: Option<u64>,
    pub reliability: f64,
}

impl From<&ProviderCounters> for ProviderStats {
    fn from(counters: &ProviderCounters) -> Self {
        let avg_response_time_ms = if counters.response_times.is_empty() {
            None
        } else {
            Some(counters.response_times.iter().sum::<u64>() / counters.response_times.len() as u64)
        };

        let reliability = if counters.calls == 0 {
            100.0
        } else {
            (counters.successes as f64 / counters.calls as f64) * 100.0
        };

        Self {
            calls: counters.calls,
            errors: counters.errors,
            timeouts: counters.timeouts,
            avg_response_time_ms,
            reliability,
        }
    }
}
