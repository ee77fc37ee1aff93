//! HTTP error envelope

use crate::search::SearchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error returned to HTTP callers; never carries provider or database text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    upgrade_required: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    upgrade_required: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            upgrade_required: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        let (status, message) = match &err {
            SearchError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message.as_str()),
            SearchError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            SearchError::Forbidden => (StatusCode::FORBIDDEN, "User not found"),
            SearchError::QuotaExceeded => (
                StatusCode::FORBIDDEN,
                "Usage limit reached. Please upgrade your plan.",
            ),
            SearchError::RequestTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "Request timed out. Please try again with a more specific query.",
            ),
            SearchError::Upstream(_) | SearchError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred processing your request. Please try again.",
            ),
        };

        Self {
            status,
            message: message.to_string(),
            upgrade_required: err.upgrade_required(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            upgrade_required: self.upgrade_required,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SearchError::invalid("bad"), StatusCode::BAD_REQUEST),
            (SearchError::Unauthorized, StatusCode::UNAUTHORIZED),
            (SearchError::Forbidden, StatusCode::FORBIDDEN),
            (SearchError::QuotaExceeded, StatusCode::FORBIDDEN),
            (SearchError::RequestTimeout, StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_upstream_text_is_hidden() {
        let err = SearchError::Upstream(ProviderError::Status {
            provider: "tavily".into(),
            status: 401,
            body: "secret provider detail".into(),
        });
        let api = ApiError::from(err);
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message().contains("secret"));
        assert!(!api.upgrade_required);
    }

    #[test]
    fn test_quota_sets_upgrade_flag() {
        let api = ApiError::from(SearchError::QuotaExceeded);
        assert!(api.upgrade_required);
    }
}
