use axum::{extract::State, Json};
use chrono::Utc;
use tracing::warn;

use cr_common::api::{SearchRequest, SearchResponse};
use cr_common::recommend::SearchError;

use crate::error::ApiError;
use crate::SharedState;

const MAX_RESULT_LIMIT: usize = 50;

/// 自由文クエリでサークルを検索し、ランキングを返す
///
/// 空クエリは 400（empty_query）。該当なしは 200 で空の results を返す。
pub async fn run_search(
    State(state): State<SharedState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let limit = request
        .limit
        .unwrap_or(state.config.top_k)
        .clamp(1, MAX_RESULT_LIMIT);

    let outcome = state
        .engine
        .search_with_limit(&request.query, limit)
        .map_err(|err| {
            if matches!(err, SearchError::EmptyQuery) {
                warn!("search rejected: empty query");
            }
            ApiError::from(err)
        })?;

    if outcome.results.is_empty() {
        tracing::info!(query = %outcome.query, "search returned no results");
    }

    Ok(Json(SearchResponse::from_outcome(
        outcome,
        state.engine.catalog().len(),
        state.engine.embedder_name(),
        state.engine.embedder_version(),
        Utc::now(),
    )))
}
