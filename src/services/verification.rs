use crate::client::{ChainSubmitter, DonationStore};
use crate::error::{UpstreamError, VerificationError};
use crate::models::{classify, Donation, VerificationRecord, VerificationState};
use crate::services::bulk::{settle_all, BulkResult};
use crate::services::coalesce::KeyedLocks;
use crate::services::retry::{retry_network, RetryPolicy};
use crate::services::stats::StatsService;
use std::sync::Arc;
use std::time::Duration;

/// Drives donation verification against the chain-submission service and
/// persists the outcome in the donation store. The only component that
/// mutates verification records.
///
/// At most one verification per donation runs at a time; a second caller
/// waits for the first and then sees its persisted outcome.
pub struct VerificationOrchestrator {
    store: Arc<dyn DonationStore>,
    chain: Arc<dyn ChainSubmitter>,
    persist_retry: RetryPolicy,
    in_flight: KeyedLocks,
    stats: Option<Arc<StatsService>>,
}

impl VerificationOrchestrator {
    pub fn new(store: Arc<dyn DonationStore>, chain: Arc<dyn ChainSubmitter>) -> Self {
        Self {
            store,
            chain,
            persist_retry: RetryPolicy::default(),
            in_flight: KeyedLocks::new(),
            stats: None,
        }
    }

    /// Statistics cache cleared whenever a record is persisted.
    pub fn with_stats(mut self, stats: Arc<StatsService>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Retry policy for persisting a record after the chain call returned.
    pub fn with_persist_retry(mut self, policy: RetryPolicy) -> Self {
        self.persist_retry = policy;
        self
    }

    /// Verify one donation.
    ///
    /// Already verified records are returned untouched. Pending records are
    /// refreshed from the chain service, never resubmitted. Unsubmitted and
    /// failed records are submitted.
    pub async fn verify_one(
        &self,
        donation_id: &str,
    ) -> Result<VerificationRecord, VerificationError> {
        let _in_flight = self.in_flight.acquire(donation_id).await;

        let donation = self
            .store
            .donation(donation_id)
            .await?
            .ok_or_else(|| VerificationError::NotFound(donation_id.to_string()))?;

        if !donation.is_succeeded() {
            return Err(VerificationError::InvalidState(format!(
                "donation {} has payment status {:?}; only succeeded payments can be verified",
                donation_id, donation.payment_status
            )));
        }

        let existing = self.store.verification(donation_id).await?;
        match (classify(existing.as_ref()), existing) {
            (VerificationState::Verified, Some(record)) => {
                tracing::debug!("Donation {} already verified", donation_id);
                Ok(record)
            }
            (VerificationState::Pending, Some(record)) => self.refresh_pending(record).await,
            (state, _) => {
                tracing::info!("Submitting donation {} for verification ({:?})", donation_id, state);
                self.submit(&donation).await
            }
        }
    }

    /// Run [`verify_one`](Self::verify_one) on its own task and wait at most
    /// `timeout` for it. On timeout the caller gets
    /// [`VerificationError::TimedOut`] while the submission keeps running and
    /// is persisted when it completes.
    pub async fn verify_detached(
        self: &Arc<Self>,
        donation_id: &str,
        timeout: Duration,
    ) -> Result<VerificationRecord, VerificationError> {
        let orchestrator = Arc::clone(self);
        let id = donation_id.to_string();
        let task = tokio::spawn(async move { orchestrator.verify_one(&id).await });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(VerificationError::Remote(format!(
                "verification task for {} aborted: {}",
                donation_id, join_error
            ))),
            Err(_) => {
                tracing::warn!(
                    "Stopped waiting for donation {} after {:?}; submission continues",
                    donation_id,
                    timeout
                );
                Err(VerificationError::TimedOut(timeout))
            }
        }
    }

    /// Verify a set of donations concurrently. Never fails as a whole.
    pub async fn verify_many(
        &self,
        donation_ids: impl IntoIterator<Item = String>,
    ) -> BulkResult<VerificationRecord> {
        settle_all(donation_ids, move |id| async move { self.verify_one(&id).await }).await
    }

    async fn refresh_pending(
        &self,
        record: VerificationRecord,
    ) -> Result<VerificationRecord, VerificationError> {
        let Some(hash) = record.submitted_hash().map(str::to_string) else {
            return Ok(record);
        };

        match self.chain.confirmation(&hash).await? {
            Some(receipt) if receipt.is_final() => {
                let confirmed = receipt.into_record(&record.donation_ref);
                let saved = self.persist(&confirmed).await?;
                tracing::info!(
                    "Donation {} confirmed in block {}",
                    saved.donation_ref,
                    saved.block_number
                );
                Ok(saved)
            }
            _ => {
                tracing::debug!("Donation {} still pending ({})", record.donation_ref, hash);
                Ok(record)
            }
        }
    }

    async fn submit(&self, donation: &Donation) -> Result<VerificationRecord, VerificationError> {
        match self.chain.submit(donation).await {
            Ok(receipt) => {
                let record = receipt.into_record(&donation.id);
                let saved = self.persist(&record).await?;
                tracing::info!(
                    "Donation {} is now {}",
                    donation.id,
                    saved.state().as_str()
                );
                Ok(saved)
            }
            // The submission may or may not have reached the chain; record nothing.
            Err(UpstreamError::Network(msg)) => Err(VerificationError::Network(msg)),
            Err(UpstreamError::Remote(msg)) | Err(UpstreamError::NotFound(msg)) => {
                let failed = VerificationRecord::failed(&donation.id);
                if let Err(e) = self.persist(&failed).await {
                    tracing::warn!("Could not record failed verification for {}: {}", donation.id, e);
                }
                Err(VerificationError::Remote(msg))
            }
        }
    }

    async fn persist(
        &self,
        record: &VerificationRecord,
    ) -> Result<VerificationRecord, UpstreamError> {
        let saved = retry_network(&self.persist_retry, "persist verification", move || {
            self.store.save_verification(record)
        })
        .await?;

        if let Some(stats) = &self.stats {
            stats.invalidate_all().await;
        }
        Ok(saved)
    }
}
