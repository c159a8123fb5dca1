use crate::{error::ApiError, handlers::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Gate admin routes on the `X-Admin-Token` header. Without a configured
/// token every admin request is refused.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ApiError::Forbidden);
    };

    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());

    if provided != Some(expected) {
        return Err(ApiError::Forbidden);
    }

    tracing::debug!("Admin request authorized: {}", request.uri().path());
    Ok(next.run(request).await)
}
