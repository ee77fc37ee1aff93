//! Settings structures for askweb configuration

use crate::search::SearchDepth;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub search_provider: SearchProviderSettings,
    pub completion_provider: CompletionProviderSettings,
    pub database: DatabaseSettings,
    pub plans: PlanSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (ASKWEB_* prefix plus provider keys)
    pub fn merge_env(&mut self) {
        self.merge_vars(|name| std::env::var(name).ok());
    }

    fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("ASKWEB_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("ASKWEB_SECRET_KEY").filter(|v| !v.is_empty()) {
            self.server.secret_key = Some(val);
        }
        if let Some(val) = var("ASKWEB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("ASKWEB_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("ASKWEB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("TAVILY_API_KEY").filter(|v| !v.is_empty()) {
            self.search_provider.api_key = Some(val);
        }
        if let Some(val) = var("MISTRAL_API_KEY").filter(|v| !v.is_empty()) {
            self.completion_provider.api_key = Some(val);
        }
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name displayed in UI
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "AI Web Search".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Secret key used to sign and verify session tokens.
    ///
    /// Shared by the server and `create-user`, so it has no generated default.
    pub secret_key: Option<String>,
    /// Name of the cookie carrying the session token
    pub session_cookie: String,
    /// Upper bound for a whole search request, in seconds
    pub request_timeout: f64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "127.0.0.1".to_string(),
            secret_key: None,
            session_cookie: "askweb_session".to_string(),
            request_timeout: 60.0,
        }
    }
}

impl ServerSettings {
    pub fn request_budget(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }

    /// The configured session secret, or an error naming how to set it
    pub fn session_secret(&self) -> Result<&str> {
        self.secret_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                anyhow!("no session secret configured; set server.secret_key or ASKWEB_SECRET_KEY")
            })
    }
}

/// Defaults applied to search requests that omit optional fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_depth: SearchDepth,
    pub default_max_results: u8,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_depth: SearchDepth::Basic,
            default_max_results: 5,
        }
    }
}

/// Outgoing request settings shared by both provider clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Idle connections kept per provider host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Web search provider (Tavily) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchProviderSettings {
    pub base_url: String,
    /// Bearer credential; checked on every call
    pub api_key: Option<String>,
    /// Per-call timeout in seconds
    pub timeout: f64,
}

impl Default for SearchProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: None,
            timeout: 30.0,
        }
    }
}

/// Completion provider (Mistral) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionProviderSettings {
    pub base_url: String,
    /// Bearer credential; checked on every call
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Per-call timeout in seconds
    pub timeout: f64,
}

impl Default for CompletionProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.mistral.ai".to_string(),
            api_key: None,
            model: "mistral-large-latest".to_string(),
            temperature: 0.2,
            max_tokens: 1000,
            timeout: 30.0,
        }
    }
}

/// Relational store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://askweb.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Usage limits granted to each plan tier at account creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    pub free_limit: u32,
    pub paid_limit: u32,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            free_limit: 100,
            paid_limit: 1000,
        }
    }
}
