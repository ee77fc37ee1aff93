//! Tavily web search provider

use super::traits::{ProviderError, SearchProvider};
use crate::config::SearchProviderSettings;
use crate::network::{HttpClient, ProviderRequest};
use crate::results::SearchHit;
use crate::search::SearchDepth;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const NAME: &str = "tavily";

/// Tavily search API client
pub struct Tavily {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl Tavily {
    pub fn new(client: HttpClient, settings: &SearchProviderSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            timeout: Duration::from_secs_f64(settings.timeout),
        }
    }

    fn request(
        &self,
        query: &str,
        depth: SearchDepth,
        max_results: u8,
    ) -> Result<ProviderRequest, ProviderError> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::MissingCredential {
                provider: NAME.to_string(),
            })?;

        Ok(ProviderRequest {
            provider: NAME.to_string(),
            url: format!("{}/search", self.base_url),
            api_key,
            body: json!({
                "query": query,
                "search_depth": depth.as_str(),
                "include_answer": false,
                "include_images": false,
                "max_results": max_results,
                "get_raw_content": true,
                "include_domains": [],
                "exclude_domains": [],
            }),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    raw_content: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

impl From<TavilyResult> for SearchHit {
    fn from(result: TavilyResult) -> Self {
        SearchHit {
            url: result.url,
            title: result.title.unwrap_or_default(),
            content: result.content.unwrap_or_default(),
            raw_content: result.raw_content,
            score: result.score,
        }
    }
}

#[async_trait]
impl SearchProvider for Tavily {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(
        &self,
        query: &str,
        depth: SearchDepth,
        max_results: u8,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        let request = self.request(query, depth, max_results)?;
        let response = self
            .client
            .execute(request, self.timeout)
            .await?
            .error_for_status()?;

        let body: TavilyResponse = response.json()?;
        debug!("tavily returned {} results", body.results.len());

        Ok(body.results.into_iter().map(SearchHit::from).collect())
    }
}
