use crate::services::timestamp::NormalizedTimestamp;
use serde::{Deserialize, Serialize};

/// Placeholder prefix for a submitted but unconfirmed transaction.
pub const PENDING_HASH_PREFIX: &str = "pending_";
/// Placeholder prefix for a submission the chain service rejected.
pub const FAILED_HASH_PREFIX: &str = "failed_";

/// On-chain proof for one donation. At most one record exists per donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub donation_ref: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    /// 0 until the transaction is mined.
    #[serde(default)]
    pub block_number: u64,
    /// Confirmation time; only meaningful when `verified` is set.
    #[serde(default)]
    pub timestamp: NormalizedTimestamp,
}

impl VerificationRecord {
    pub fn pending(donation_ref: &str, transaction_hash: &str) -> Self {
        let hash = if is_placeholder_hash(transaction_hash) {
            transaction_hash.to_string()
        } else {
            format!("{}{}", PENDING_HASH_PREFIX, transaction_hash)
        };

        Self {
            donation_ref: donation_ref.to_string(),
            verified: false,
            transaction_hash: Some(hash),
            block_number: 0,
            timestamp: NormalizedTimestamp::Unknown,
        }
    }

    pub fn failed(donation_ref: &str) -> Self {
        Self {
            donation_ref: donation_ref.to_string(),
            verified: false,
            transaction_hash: Some(format!("{}{}", FAILED_HASH_PREFIX, donation_ref)),
            block_number: 0,
            timestamp: NormalizedTimestamp::Unknown,
        }
    }

    pub fn state(&self) -> VerificationState {
        classify(Some(self))
    }

    /// The chain hash behind a pending placeholder, if one was recorded.
    pub fn submitted_hash(&self) -> Option<&str> {
        self.transaction_hash
            .as_deref()
            .and_then(|hash| hash.strip_prefix(PENDING_HASH_PREFIX))
            .filter(|hash| !hash.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    Unsubmitted,
    Pending,
    Verified,
    Failed,
}

impl VerificationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationState::Unsubmitted => "unsubmitted",
            VerificationState::Pending => "pending",
            VerificationState::Verified => "verified",
            VerificationState::Failed => "failed",
        }
    }
}

/// Derive the lifecycle state of a donation's verification. Pure; the
/// orchestrator is the only component that changes the underlying record.
pub fn classify(record: Option<&VerificationRecord>) -> VerificationState {
    let Some(record) = record else {
        return VerificationState::Unsubmitted;
    };

    let hash = record.transaction_hash.as_deref();
    let pending_hash = hash.map_or(false, |h| h.starts_with(PENDING_HASH_PREFIX));

    match (record.verified, hash) {
        (false, Some(_)) if pending_hash => VerificationState::Pending,
        (true, Some(h)) if !h.is_empty() && !pending_hash => VerificationState::Verified,
        _ => VerificationState::Failed,
    }
}

/// Placeholder hashes never existed on chain.
pub fn is_placeholder_hash(hash: &str) -> bool {
    hash.starts_with(PENDING_HASH_PREFIX) || hash.starts_with(FAILED_HASH_PREFIX)
}
