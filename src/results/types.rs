//! Result type definitions

use serde::{Deserialize, Serialize};

/// A single ranked hit returned by the search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The URL of the result
    pub url: String,
    /// The title of the result (may be empty)
    #[serde(default)]
    pub title: String,
    /// Content excerpt
    #[serde(default)]
    pub content: String,
    /// Full page text, when the provider fetched it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    /// Provider relevance score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SearchHit {
    /// Create a new hit
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            raw_content: None,
            score: None,
        }
    }

    /// Title for display, falling back to the URL
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

/// A citation returned alongside the answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub title: String,
}

impl From<&SearchHit> for Source {
    fn from(hit: &SearchHit) -> Self {
        Self {
            url: hit.url.clone(),
            title: hit.label().to_string(),
        }
    }
}

/// Synthesized answer with its sources, in search order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub sources: Vec<Source>,
}

impl AnswerResponse {
    /// Pair an answer with sources derived 1:1 from `hits`
    pub fn from_hits(answer: String, hits: &[SearchHit]) -> Self {
        Self {
            answer,
            sources: hits.iter().map(Source::from).collect(),
        }
    }
}
