//! Search request payloads and validated options

use super::SearchError;
use crate::config::SearchSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted bounds for `maxResults`
pub const RESULT_COUNT_RANGE: RangeInclusive<u8> = 5..=10;

/// How thoroughly the search provider should crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(SearchDepth::Basic),
            "advanced" => Ok(SearchDepth::Advanced),
            other => Err(format!("unknown search depth '{}'", other)),
        }
    }
}

/// Raw `POST /search` body.
///
/// Fields stay untyped so that wrong types surface as `InvalidInput`
/// instead of a framework rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub search_depth: Option<Value>,
    #[serde(default)]
    pub max_results: Option<Value>,
}

impl SearchPayload {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(Value::String(query.into())),
            ..Default::default()
        }
    }

    pub fn with_depth(mut self, depth: impl Into<Value>) -> Self {
        self.search_depth = Some(depth.into());
        self
    }

    pub fn with_max_results(mut self, max_results: impl Into<Value>) -> Self {
        self.max_results = Some(max_results.into());
        self
    }
}

/// Validated search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub query: String,
    pub depth: SearchDepth,
    pub max_results: u8,
}

impl SearchOptions {
    /// Validate a payload, filling omitted fields from `defaults`.
    ///
    /// Checks run in order: query, depth, result count.
    pub fn from_payload(
        payload: &SearchPayload,
        defaults: &SearchSettings,
    ) -> Result<Self, SearchError> {
        let query = match payload.query.as_ref() {
            Some(Value::String(q)) if !q.trim().is_empty() => q.clone(),
            _ => return Err(SearchError::invalid("Valid query is required")),
        };

        let depth = match payload.search_depth.as_ref() {
            None | Some(Value::Null) => defaults.default_depth,
            Some(Value::String(s)) => s
                .parse()
                .map_err(|_| SearchError::invalid("Invalid search depth"))?,
            Some(_) => return Err(SearchError::invalid("Invalid search depth")),
        };

        let max_results = match payload.max_results.as_ref() {
            None | Some(Value::Null) => defaults.default_max_results,
            Some(value) => value
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(out_of_range)?,
        };
        if !RESULT_COUNT_RANGE.contains(&max_results) {
            return Err(out_of_range());
        }

        Ok(Self {
            query,
            depth,
            max_results,
        })
    }
}

fn out_of_range() -> SearchError {
    SearchError::invalid(format!(
        "Max results must be between {} and {}",
        RESULT_COUNT_RANGE.start(),
        RESULT_COUNT_RANGE.end()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(payload: SearchPayload) -> Result<SearchOptions, SearchError> {
        SearchOptions::from_payload(&payload, &SearchSettings::default())
    }

    #[test]
    fn test_defaults_applied() {
        let options = parse(SearchPayload::new("weather today")).unwrap();
        assert_eq!(options.query, "weather today");
        assert_eq!(options.depth, SearchDepth::Basic);
        assert_eq!(options.max_results, 5);
    }

    #[test]
    fn test_payload_from_json() {
        let payload: SearchPayload = serde_json::from_value(json!({
            "query": "rust",
            "searchDepth": "advanced",
            "maxResults": 10
        }))
        .unwrap();
        let options = parse(payload).unwrap();
        assert_eq!(options.depth, SearchDepth::Advanced);
        assert_eq!(options.max_results, 10);
    }

    #[test]
    fn test_query_must_be_non_empty_string() {
        for query in [json!(""), json!("   "), json!(42), json!(null), json!(["a"])] {
            let payload = SearchPayload {
                query: Some(query),
                ..Default::default()
            };
            assert!(matches!(parse(payload), Err(SearchError::InvalidInput(_))));
        }
        assert!(matches!(
            parse(SearchPayload::default()),
            Err(SearchError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_depth_rejected() {
        for depth in [json!("deep"), json!("BASIC"), json!(1)] {
            let payload = SearchPayload::new("q").with_depth(depth);
            assert!(matches!(parse(payload), Err(SearchError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_result_count_bounds() {
        for n in [5, 7, 10] {
            assert!(parse(SearchPayload::new("q").with_max_results(n)).is_ok());
        }
        for bad in [json!(4), json!(11), json!(0), json!(-5), json!(7.5), json!("7"), json!(300)] {
            let payload = SearchPayload::new("q").with_max_results(bad);
            assert!(matches!(parse(payload), Err(SearchError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_depth_round_trip_names() {
        assert_eq!("advanced".parse::<SearchDepth>(), Ok(SearchDepth::Advanced));
        assert_eq!(SearchDepth::Basic.to_string(), "basic");
    }
}
