//! Stored record types

use crate::search::{SearchDepth, SearchOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Plan tier of an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plan {
    #[default]
    Free,
    Paid,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "FREE",
            Plan::Paid => "PAID",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FREE" => Ok(Plan::Free),
            "PAID" => Ok(Plan::Paid),
            other => Err(format!("unknown plan '{}'", other)),
        }
    }
}

/// An account and its usage counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub plan: Plan,
    pub current_usage: u32,
    pub usage_limit: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether another search fits in the plan
    pub fn has_remaining(&self) -> bool {
        self.current_usage < self.usage_limit
    }
}

/// Search record about to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSearchRecord {
    pub user_id: String,
    pub query: String,
    pub search_depth: SearchDepth,
    pub max_results: u8,
}

impl NewSearchRecord {
    pub fn new(user_id: impl Into<String>, options: &SearchOptions) -> Self {
        Self {
            user_id: user_id.into(),
            query: options.query.clone(),
            search_depth: options.depth,
            max_results: options.max_results,
        }
    }
}

/// A committed, immutable search record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub id: String,
    #[serde(skip)]
    pub user_id: String,
    pub query: String,
    pub search_depth: SearchDepth,
    pub max_results: u8,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_names() {
        assert_eq!("paid".parse::<Plan>(), Ok(Plan::Paid));
        assert_eq!(Plan::Free.to_string(), "FREE");
        assert!("gold".parse::<Plan>().is_err());
        assert_eq!(serde_json::to_string(&Plan::Paid).unwrap(), "\"PAID\"");
    }

    #[test]
    fn test_has_remaining() {
        let mut user = User {
            id: "u".into(),
            plan: Plan::Free,
            current_usage: 4,
            usage_limit: 5,
            created_at: Utc::now(),
        };
        assert!(user.has_remaining());
        user.current_usage = 5;
        assert!(!user.has_remaining());
    }
}
