//! Ports to the external collaborators and their HTTP implementations.

pub mod chain;
pub mod store;

pub use chain::HttpChainSubmitter;
pub use store::HttpDonationStore;

use crate::error::UpstreamError;
use crate::models::{
    is_placeholder_hash, Donation, FundFlow, VerificationRecord,
};
use crate::services::timestamp::NormalizedTimestamp;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Append path segments to `base`, percent-encoding each one. Identifiers
/// that would be dropped or reinterpreted as path navigation are refused.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, UpstreamError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(UpstreamError::NotFound(format!("invalid identifier {:?}", bad)));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UpstreamError::Remote(format!("{} cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Persistent store holding donations, charities, users and verification
/// records.
#[async_trait]
pub trait DonationStore: Send + Sync {
    async fn donation(&self, id: &str) -> Result<Option<Donation>, UpstreamError>;

    async fn verification(
        &self,
        donation_id: &str,
    ) -> Result<Option<VerificationRecord>, UpstreamError>;

    async fn save_verification(
        &self,
        record: &VerificationRecord,
    ) -> Result<VerificationRecord, UpstreamError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_verification(&self, donation_id: &str) -> Result<bool, UpstreamError>;

    async fn list_verifications(&self) -> Result<Vec<VerificationRecord>, UpstreamError>;

    async fn donor_donations(&self, donor_id: &str) -> Result<Vec<Donation>, UpstreamError>;

    async fn charity_donations(&self, charity_id: &str)
        -> Result<Vec<Donation>, UpstreamError>;

    async fn charity_fund_flow(&self, charity_id: &str) -> Result<FundFlow, UpstreamError>;

    async fn all_donations(&self) -> Result<Vec<Donation>, UpstreamError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), UpstreamError>;

    async fn delete_charity(&self, charity_id: &str) -> Result<(), UpstreamError>;
}

/// External service that writes donation proofs to the ledger.
#[async_trait]
pub trait ChainSubmitter: Send + Sync {
    /// Submit a proof. Not idempotent and never retried by this crate.
    async fn submit(&self, donation: &Donation) -> Result<ChainReceipt, UpstreamError>;

    /// Current status of a previously submitted transaction, `None` when the
    /// service does not know it yet.
    async fn confirmation(
        &self,
        transaction_hash: &str,
    ) -> Result<Option<ChainReceipt>, UpstreamError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub timestamp: NormalizedTimestamp,
}

impl ChainReceipt {
    /// Mined, with a real transaction hash.
    pub fn is_final(&self) -> bool {
        self.block_number > 0
            && !self.transaction_hash.is_empty()
            && !is_placeholder_hash(&self.transaction_hash)
    }

    pub fn into_record(self, donation_ref: &str) -> VerificationRecord {
        // Without a hash there is nothing to poll: the record stays `pending_`
        // until an operator resolves it.
        if !self.is_final() {
            return VerificationRecord::pending(donation_ref, &self.transaction_hash);
        }

        VerificationRecord {
            donation_ref: donation_ref.to_string(),
            verified: true,
            transaction_hash: Some(self.transaction_hash),
            block_number: self.block_number,
            timestamp: self.timestamp,
        }
    }
}
