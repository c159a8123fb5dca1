use crate::{
    error::ApiError,
    handlers::{respond, AppState},
    models::{ApiResponse, CharityStatsSnapshot, DonorStatsSnapshot, PlatformVerificationStats},
};
use axum::{
    extract::{Path, State},
    Json,
};

/// `GET /donations/stats/:donor_id`
pub async fn donor_stats(
    State(state): State<AppState>,
    Path(donor_id): Path<String>,
) -> Result<Json<ApiResponse<DonorStatsSnapshot>>, ApiError> {
    let outcome = state.stats.donor_stats(&donor_id).await?;
    Ok(Json(respond(outcome.value, outcome.hit)))
}

/// `GET /donations/charity/:charity_id/stats`
pub async fn charity_stats(
    State(state): State<AppState>,
    Path(charity_id): Path<String>,
) -> Result<Json<ApiResponse<CharityStatsSnapshot>>, ApiError> {
    let outcome = state.stats.charity_stats(&charity_id).await?;
    Ok(Json(respond(outcome.value, outcome.hit)))
}

/// `GET /donations/blockchain/stats` (admin)
pub async fn blockchain_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PlatformVerificationStats>>, ApiError> {
    let outcome = state.stats.platform_stats().await?;
    Ok(Json(respond(outcome.value, outcome.hit)))
}
