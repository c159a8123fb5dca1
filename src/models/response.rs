use crate::models::{VerificationRecord, VerificationState};
use crate::services::timestamp::NormalizedTimestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub cache_hit: bool,
    pub request_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub network: String,
    pub cached_entries: usize,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Verification record as rendered to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VerificationView {
    pub donation_id: String,
    pub state: VerificationState,
    pub record: Option<VerificationRecord>,
    pub explorer_url: Option<String>,
    pub confirmed_at: NormalizedTimestamp,
}
