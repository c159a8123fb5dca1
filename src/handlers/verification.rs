use crate::{
    error::ApiError,
    handlers::{respond, AppState},
    models::{ApiResponse, BulkIdsRequest, VerificationRecord, VerificationView},
    services::BulkResult,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// `GET /donations/:id/verification`
pub async fn get_verification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<VerificationView>>, ApiError> {
    let record = state.store.verification(&id).await?;
    Ok(Json(respond(state.verification_view(&id, record), false)))
}

/// `POST /donations/:id/verify`
pub async fn verify_donation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<VerificationView>>, ApiError> {
    // The orchestrator clears cached statistics when the record lands,
    // which may be after this request timed out.
    let record = state
        .orchestrator
        .verify_detached(&id, state.verify_timeout)
        .await?;
    Ok(Json(respond(state.verification_view(&id, Some(record)), false)))
}

/// `POST /admin/verifications/bulk`
pub async fn bulk_verify(
    State(state): State<AppState>,
    Json(request): Json<BulkIdsRequest>,
) -> Result<Json<ApiResponse<BulkResult<VerificationRecord>>>, ApiError> {
    if request.ids.is_empty() {
        return Err(ApiError::BadRequest("ids must not be empty".to_string()));
    }

    let result = state.orchestrator.verify_many(request.ids).await;
    Ok(Json(respond(result, false)))
}
