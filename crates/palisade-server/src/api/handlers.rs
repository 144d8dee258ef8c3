use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::dto::*;
use crate::error::{AppError, AppResult};
use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    tracing::debug!("Processing health check request");
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_entries: state.service.cache_entries().await,
    })
}

pub async fn get_reputation(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<ReputationQuery>,
) -> AppResult<Json<ReputationResponse>> {
    let start = Instant::now();
    tracing::info!(
        wallet = %address,
        live = %query.live,
        refresh = %query.refresh,
        "Processing reputation request"
    );

    let result = state
        .service
        .get_reputation(&address, &query.options())
        .await?;

    tracing::info!(
        wallet = %address,
        score = %result.score,
        trust_level = %result.trust_level,
        verification_mode = %result.verification_mode,
        source = %result.data_source,
        duration_ms = %start.elapsed().as_millis(),
        "Reputation request completed"
    );

    Ok(Json(result.into()))
}

pub async fn batch_reputation(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> AppResult<Json<BatchResponse>> {
    let start = Instant::now();

    if request.addresses.is_empty() {
        return Err(AppError::InvalidInput(
            "address list must not be empty".to_string(),
        ));
    }

    tracing::info!(
        requested = %request.addresses.len(),
        live = %request.live,
        "Processing batch reputation request"
    );

    let cancel = CancellationToken::new();
    let results = state
        .service
        .batch_get_reputation(&request.addresses, &request.options(), &cancel)
        .await;

    let response = BatchResponse {
        requested: request.addresses.len(),
        evaluated: results.len(),
        results: results
            .into_iter()
            .map(|(address, result)| (address, result.into()))
            .collect(),
    };

    tracing::info!(
        requested = %response.requested,
        evaluated = %response.evaluated,
        duration_ms = %start.elapsed().as_millis(),
        "Batch reputation request completed"
    );

    Ok(Json(response))
}

pub async fn clear_cache(State(state): State<AppState>) -> Json<CacheClearResponse> {
    let dropped = state.service.clear_cache().await;
    tracing::info!(dropped = %dropped, "Reputation cache cleared");
    Json(CacheClearResponse { dropped })
}
