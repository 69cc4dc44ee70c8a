use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::Error;
use crate::models::RetrieveRequest;
use crate::report::{build_report, Budgets, Report};
use crate::search::rank::RankOptions;
use crate::state::AppState;

/// POST /api/retrieve - Rank the loaded blocks against a code snippet and
/// attach related methods/callees within the requested budgets.
pub async fn retrieve(
    State(state): State<AppState>,
    Json(req): Json<RetrieveRequest>,
) -> Result<Json<Report>, (StatusCode, String)> {
    if req.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }

    let defaults = &state.config.rank;
    let strategy = match req.strategy.as_deref() {
        Some(name) => name.parse().map_err(error_response)?,
        None => defaults.strategy,
    };
    let top_n = req.top_n.unwrap_or(defaults.top_n);
    if top_n == 0 {
        return Err((StatusCode::BAD_REQUEST, "top_n must be positive".to_string()));
    }

    let options = RankOptions {
        strategy,
        top_n,
        score_threshold: req.score_threshold.or(defaults.score_threshold),
    };
    let budgets = Budgets {
        relative_methods_num: req.relative_methods_num,
        relative_calls_num: req.relative_calls_num,
        if_tell_import: req.if_tell_import,
    };

    let ranker = state.ranker();
    let report = build_report(&state.store, &ranker, &req.query, &options, budgets)
        .await
        .map_err(error_response)?;

    tracing::info!(
        "Retrieved {} blocks with {}",
        report.entries.len(),
        options.strategy
    );
    Ok(Json(report))
}

/// GET /api/blocks/count - Number of blocks in the loaded index
pub async fn block_count(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "blocks": state.store.len() }))
}

fn error_response(e: Error) -> (StatusCode, String) {
    if e.is_client_error() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        tracing::error!("Retrieval failed: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}
