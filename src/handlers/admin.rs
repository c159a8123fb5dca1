use crate::{
    error::{ApiError, UpstreamError},
    handlers::{respond, AppState},
    models::{
        ApiResponse, BulkIdsRequest, Page, VerificationOverride, VerificationQuery,
        VerificationRecord, VerificationView,
    },
    services::{admin::apply_override, admin::query_verifications, settle_all, BulkResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// `GET /admin/verifications`
pub async fn list_verifications(
    State(state): State<AppState>,
    Query(query): Query<VerificationQuery>,
) -> Result<Json<ApiResponse<Page<VerificationRecord>>>, ApiError> {
    let records = state.store.list_verifications().await?;
    Ok(Json(respond(query_verifications(records, &query), false)))
}

/// `PUT /admin/verifications/:id`
pub async fn update_verification(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<VerificationOverride>,
) -> Result<Json<ApiResponse<VerificationView>>, ApiError> {
    let current = state
        .store
        .verification(&id)
        .await?
        .ok_or_else(|| UpstreamError::NotFound(format!("verification for {}", id)))?;

    let updated = apply_override(current, changes).map_err(ApiError::BadRequest)?;
    let saved = state.store.save_verification(&updated).await?;
    state.stats.invalidate_all().await;

    tracing::info!(
        "Operator override on verification {} (now {})",
        id,
        saved.state().as_str()
    );

    Ok(Json(respond(state.verification_view(&id, Some(saved)), false)))
}

/// `DELETE /admin/verifications/:id`
pub async fn delete_verification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_verification(&id).await? {
        return Err(UpstreamError::NotFound(format!("verification for {}", id)).into());
    }
    state.stats.invalidate_all().await;

    tracing::info!("Operator deleted verification {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /admin/users/bulk`
pub async fn bulk_delete_users(
    State(state): State<AppState>,
    Json(request): Json<BulkIdsRequest>,
) -> Result<Json<ApiResponse<BulkResult<()>>>, ApiError> {
    if request.ids.is_empty() {
        return Err(ApiError::BadRequest("ids must not be empty".to_string()));
    }

    let store = &state.store;
    let result = settle_all(request.ids, move |id| async move {
        store.delete_user(&id).await
    })
    .await;
    state.stats.invalidate_all().await;

    Ok(Json(respond(result, false)))
}

/// `DELETE /admin/charities/bulk`
pub async fn bulk_delete_charities(
    State(state): State<AppState>,
    Json(request): Json<BulkIdsRequest>,
) -> Result<Json<ApiResponse<BulkResult<()>>>, ApiError> {
    if request.ids.is_empty() {
        return Err(ApiError::BadRequest("ids must not be empty".to_string()));
    }

    let store = &state.store;
    let result = settle_all(request.ids, move |id| async move {
        store.delete_charity(&id).await
    })
    .await;
    state.stats.invalidate_all().await;

    Ok(Json(respond(result, false)))
}
