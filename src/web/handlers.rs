//! HTTP request handlers

use super::error::ApiError;
use super::state::AppState;
use crate::auth::Identity;
use crate::results::AnswerResponse;
use crate::search::{SearchError, SearchPayload};
use crate::store::SearchRecord;
use crate::usage::UsageSnapshot;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use tera::Context;
use tokio::time::timeout;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

/// Default and maximum page size for `/history`
const HISTORY_DEFAULT: u32 = 20;
const HISTORY_MAX: u32 = 50;

fn identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    state
        .identity
        .current_identity(headers)
        .ok_or_else(|| SearchError::Unauthorized.into())
}

/// Home page handler
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let mut ctx = Context::new();
    ctx.insert("instance_name", state.instance_name());
    ctx.insert("default_max_results", &state.settings.search.default_max_results);

    match state.templates.render_with_context("index.html", &ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SearchPayload>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("search", %request_id);

    async move {
        let identity = state.identity.current_identity(&headers);
        let payload = match body {
            Ok(Json(payload)) => Some(payload),
            Err(rejection) => {
                warn!("unreadable search body: {}", rejection);
                None
            }
        };

        let budget = state.settings.server.request_budget();
        let outcome = timeout(
            budget,
            state.orchestrator.handle(identity.as_ref(), payload.as_ref()),
        )
        .await;

        match outcome {
            Ok(Ok(response)) => Ok(Json(response)),
            Ok(Err(e)) => {
                warn!("search failed: {}", e);
                Err(e.into())
            }
            Err(_) => {
                warn!("search exceeded the {:?} budget", budget);
                Err(SearchError::RequestTimeout.into())
            }
        }
    }
    .instrument(span)
    .await
}

/// Usage counters for the current user
pub async fn usage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsageSnapshot>, ApiError> {
    let identity = identity(&state, &headers)?;
    let snapshot = state
        .orchestrator
        .ledger()
        .usage(&identity.user_id)
        .await
        .map_err(SearchError::from)?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

/// Recent searches of the current user
pub async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<SearchRecord>>, ApiError> {
    let identity = identity(&state, &headers)?;
    if state
        .store
        .find_user(&identity.user_id)
        .await
        .map_err(SearchError::from)?
        .is_none()
    {
        return Err(SearchError::Forbidden.into());
    }

    let limit = params.limit.unwrap_or(HISTORY_DEFAULT).clamp(1, HISTORY_MAX);
    let records = state
        .store
        .recent_searches(&identity.user_id, limit)
        .await
        .map_err(SearchError::from)?;
    Ok(Json(records))
}

/// Provider statistics
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.metrics().snapshot())
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
