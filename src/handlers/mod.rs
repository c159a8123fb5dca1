pub mod admin;
pub mod health;
pub mod stats;
pub mod verification;

pub use admin::*;
pub use health::*;
pub use stats::*;
pub use verification::*;

use crate::{
    client::DonationStore,
    middleware::require_admin,
    models::{classify, ApiResponse, VerificationRecord, VerificationView},
    services::{ExplorerLinkResolver, NormalizedTimestamp, StatsService, VerificationOrchestrator},
};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DonationStore>,
    pub orchestrator: Arc<VerificationOrchestrator>,
    pub stats: Arc<StatsService>,
    pub explorer: ExplorerLinkResolver,
    /// Network identifier used for explorer links.
    pub network: String,
    pub admin_token: Option<String>,
    pub verify_timeout: Duration,
    pub started_at: Instant,
}

impl AppState {
    pub(crate) fn verification_view(
        &self,
        donation_id: &str,
        record: Option<VerificationRecord>,
    ) -> VerificationView {
        let state = classify(record.as_ref());
        let explorer_url = record.as_ref().and_then(|r| {
            self.explorer
                .resolve(r.transaction_hash.as_deref(), &self.network)
                .map(|url| url.to_string())
        });
        let confirmed_at = match &record {
            Some(r) if r.verified => r.timestamp,
            _ => NormalizedTimestamp::Unknown,
        };

        VerificationView {
            donation_id: donation_id.to_string(),
            state,
            record,
            explorer_url,
            confirmed_at,
        }
    }
}

pub(crate) fn respond<T>(data: T, cache_hit: bool) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        timestamp: Utc::now(),
        cache_hit,
        request_id: Uuid::new_v4().to_string(),
    }
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/donations/blockchain/stats", get(blockchain_stats))
        .route("/admin/verifications", get(list_verifications))
        .route("/admin/verifications/bulk", post(bulk_verify))
        .route(
            "/admin/verifications/:id",
            put(update_verification).delete(delete_verification),
        )
        .route("/admin/users/bulk", delete(bulk_delete_users))
        .route("/admin/charities/bulk", delete(bulk_delete_charities))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/donations/:id/verification", get(get_verification))
        .route("/donations/:id/verify", post(verify_donation))
        .route("/donations/stats/:donor_id", get(donor_stats))
        .route("/donations/charity/:charity_id/stats", get(charity_stats))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
