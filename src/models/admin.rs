use crate::services::timestamp::RawTimestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Timestamp,
    BlockNumber,
    DonationRef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query string of `GET /admin/verifications`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub verified: Option<bool>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// Operator override for `PUT /admin/verifications/:id`. Absent fields keep
/// their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOverride {
    pub verified: Option<bool>,
    pub transaction_hash: Option<String>,
    pub block_number: Option<u64>,
    pub timestamp: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulkIdsRequest {
    pub ids: Vec<String>,
}
