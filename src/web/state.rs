//! Application state shared across handlers

use crate::auth::{IdentityProvider, SessionTokens};
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::providers::{CompletionProvider, Mistral, SearchProvider, Tavily};
use crate::search::Orchestrator;
use crate::store::UserStore;
use crate::usage::UsageLedger;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search orchestrator
    pub orchestrator: Arc<Orchestrator>,
    /// Resolves the caller behind a request
    pub identity: Arc<dyn IdentityProvider>,
    /// User and history store
    pub store: Arc<dyn UserStore>,
    /// Template renderer
    pub templates: Arc<super::Templates>,
}

impl AppState {
    /// Wire the production providers and session verifier
    pub fn new(
        settings: Settings,
        store: Arc<dyn UserStore>,
        client: HttpClient,
    ) -> anyhow::Result<Self> {
        let search: Arc<dyn SearchProvider> =
            Arc::new(Tavily::new(client.clone(), &settings.search_provider));
        let completion: Arc<dyn CompletionProvider> =
            Arc::new(Mistral::new(client, &settings.completion_provider));
        let identity = SessionTokens::new(
            settings.server.session_secret()?,
            &settings.server.session_cookie,
        )
        .map_err(|e| anyhow::anyhow!("invalid session secret: {}", e))?;

        Self::with_parts(settings, store, search, completion, Arc::new(identity))
    }

    /// Assemble state from explicit collaborators
    pub fn with_parts(
        settings: Settings,
        store: Arc<dyn UserStore>,
        search: Arc<dyn SearchProvider>,
        completion: Arc<dyn CompletionProvider>,
        identity: Arc<dyn IdentityProvider>,
    ) -> anyhow::Result<Self> {
        let orchestrator = Orchestrator::new(
            search,
            completion,
            UsageLedger::new(store.clone()),
            Arc::new(Metrics::new()),
        )
        .with_defaults(settings.search.clone());

        Ok(Self {
            settings: Arc::new(settings),
            orchestrator: Arc::new(orchestrator),
            identity,
            store,
            templates: Arc::new(super::Templates::new()?),
        })
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
