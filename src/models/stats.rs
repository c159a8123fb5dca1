use serde::{Deserialize, Serialize};

/// Derived donor summary. Recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorStatsSnapshot {
    pub donor_ref: String,
    pub total_donations: u64,
    pub total_amount: f64,
    pub average_amount: f64,
    pub unique_charities: u64,
    pub verified_donations: u64,
    pub verified_amount: f64,
    /// Percentage of donations with a confirmed on-chain proof, one decimal.
    pub transparency_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharityStatsSnapshot {
    pub charity_ref: String,
    pub total_donations: u64,
    pub total_amount: f64,
    pub average_amount: f64,
    pub unique_donors: u64,
    pub verified_donations: u64,
    pub verified_amount: f64,
    pub transparency_score: f64,
    pub total_received: f64,
    pub total_disbursed: f64,
    /// Disbursed over received, as a percentage. Not clamped: values above
    /// 100 mean disbursements were booked before the matching receipts.
    pub funding_efficiency: f64,
}

/// Fund movement bookkeeping for a charity. Either side may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundFlow {
    #[serde(default)]
    pub total_received: Option<f64>,
    #[serde(default)]
    pub total_disbursed: Option<f64>,
}

/// Platform-wide verification summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformVerificationStats {
    pub total_donations: u64,
    pub unsubmitted: u64,
    pub pending: u64,
    pub verified: u64,
    pub failed: u64,
    pub verified_amount: f64,
    pub verification_rate: f64,
    pub latest_block: u64,
}
