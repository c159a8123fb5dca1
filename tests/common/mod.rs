#![allow(dead_code)]

use async_trait::async_trait;
use donation_verifier::client::{ChainReceipt, ChainSubmitter, DonationStore};
use donation_verifier::error::UpstreamError;
use donation_verifier::models::{Donation, FundFlow, PaymentStatus, VerificationRecord};
use donation_verifier::services::NormalizedTimestamp;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn donation(id: &str, donor: &str, charity: &str, amount: f64) -> Donation {
    Donation {
        id: id.to_string(),
        amount: Some(amount),
        currency: "USD".to_string(),
        payment_status: PaymentStatus::Succeeded,
        donor_ref: donor.to_string(),
        charity_ref: charity.to_string(),
        project_ref: None,
        anonymous: false,
        message: None,
        created_at: NormalizedTimestamp::Unknown,
        verification: None,
    }
}

pub fn verified(donation_ref: &str, hash: &str, block_number: u64) -> VerificationRecord {
    VerificationRecord {
        donation_ref: donation_ref.to_string(),
        verified: true,
        transaction_hash: Some(hash.to_string()),
        block_number,
        timestamp: NormalizedTimestamp::Unknown,
    }
}

pub fn receipt(hash: &str, block_number: u64) -> ChainReceipt {
    ChainReceipt {
        transaction_hash: hash.to_string(),
        block_number,
        timestamp: NormalizedTimestamp::Unknown,
    }
}

/// In-memory [`DonationStore`]. Verification records live apart from the
/// donations and are joined back in on read, like the real store does.
#[derive(Default)]
pub struct InMemoryStore {
    donations: Mutex<HashMap<String, Donation>>,
    verifications: Mutex<HashMap<String, VerificationRecord>>,
    fund_flows: Mutex<HashMap<String, FundFlow>>,
    users: Mutex<HashSet<String>>,
    charities: Mutex<HashSet<String>>,
    failing_saves: Mutex<Vec<UpstreamError>>,
    slow_donors: Mutex<HashMap<String, Duration>>,
    pub reads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_donation(&self, donation: Donation) {
        self.donations
            .lock()
            .unwrap()
            .insert(donation.id.clone(), donation);
    }

    pub fn insert_verification(&self, record: VerificationRecord) {
        self.verifications
            .lock()
            .unwrap()
            .insert(record.donation_ref.clone(), record);
    }

    pub fn insert_fund_flow(&self, charity_id: &str, flow: FundFlow) {
        self.fund_flows
            .lock()
            .unwrap()
            .insert(charity_id.to_string(), flow);
    }

    pub fn insert_user(&self, id: &str) {
        self.users.lock().unwrap().insert(id.to_string());
    }

    pub fn insert_charity(&self, id: &str) {
        self.charities.lock().unwrap().insert(id.to_string());
    }

    /// The next saves fail with these errors, in order.
    pub fn fail_next_saves(&self, errors: Vec<UpstreamError>) {
        *self.failing_saves.lock().unwrap() = errors;
    }

    /// Reads of this donor's donations take `delay` before answering.
    pub fn slow_donor(&self, donor_id: &str, delay: Duration) {
        self.slow_donors
            .lock()
            .unwrap()
            .insert(donor_id.to_string(), delay);
    }

    pub fn stored_verification(&self, donation_id: &str) -> Option<VerificationRecord> {
        self.verifications.lock().unwrap().get(donation_id).cloned()
    }

    pub fn has_user(&self, id: &str) -> bool {
        self.users.lock().unwrap().contains(id)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn joined(&self, filter: impl Fn(&Donation) -> bool) -> Vec<Donation> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let verifications = self.verifications.lock().unwrap();
        let mut donations: Vec<Donation> = self
            .donations
            .lock()
            .unwrap()
            .values()
            .filter(|d| filter(d))
            .cloned()
            .map(|mut d| {
                d.verification = verifications.get(&d.id).cloned();
                d
            })
            .collect();
        donations.sort_by(|a, b| a.id.cmp(&b.id));
        donations
    }
}

#[async_trait]
impl DonationStore for InMemoryStore {
    async fn donation(&self, id: &str) -> Result<Option<Donation>, UpstreamError> {
        Ok(self.joined(|d| d.id == id).into_iter().next())
    }

    async fn verification(
        &self,
        donation_id: &str,
    ) -> Result<Option<VerificationRecord>, UpstreamError> {
        Ok(self.stored_verification(donation_id))
    }

    async fn save_verification(
        &self,
        record: &VerificationRecord,
    ) -> Result<VerificationRecord, UpstreamError> {
        {
            let mut failing = self.failing_saves.lock().unwrap();
            if !failing.is_empty() {
                return Err(failing.remove(0));
            }
        }
        self.insert_verification(record.clone());
        Ok(record.clone())
    }

    async fn delete_verification(&self, donation_id: &str) -> Result<bool, UpstreamError> {
        Ok(self
            .verifications
            .lock()
            .unwrap()
            .remove(donation_id)
            .is_some())
    }

    async fn list_verifications(&self) -> Result<Vec<VerificationRecord>, UpstreamError> {
        Ok(self.verifications.lock().unwrap().values().cloned().collect())
    }

    async fn donor_donations(&self, donor_id: &str) -> Result<Vec<Donation>, UpstreamError> {
        let delay = self.slow_donors.lock().unwrap().get(donor_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.joined(|d| d.donor_ref == donor_id))
    }

    async fn charity_donations(
        &self,
        charity_id: &str,
    ) -> Result<Vec<Donation>, UpstreamError> {
        Ok(self.joined(|d| d.charity_ref == charity_id))
    }

    async fn charity_fund_flow(&self, charity_id: &str) -> Result<FundFlow, UpstreamError> {
        Ok(self
            .fund_flows
            .lock()
            .unwrap()
            .get(charity_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn all_donations(&self) -> Result<Vec<Donation>, UpstreamError> {
        Ok(self.joined(|_| true))
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), UpstreamError> {
        if self.users.lock().unwrap().remove(user_id) {
            Ok(())
        } else {
            Err(UpstreamError::NotFound(format!("user {}", user_id)))
        }
    }

    async fn delete_charity(&self, charity_id: &str) -> Result<(), UpstreamError> {
        if self.charities.lock().unwrap().remove(charity_id) {
            Ok(())
        } else {
            Err(UpstreamError::NotFound(format!("charity {}", charity_id)))
        }
    }
}

/// [`ChainSubmitter`] answering from per-donation scripts.
#[derive(Default)]
pub struct ScriptedChain {
    submissions: Mutex<HashMap<String, Result<ChainReceipt, UpstreamError>>>,
    confirmations: Mutex<HashMap<String, ChainReceipt>>,
    delay: Mutex<Option<Duration>>,
    pub submit_calls: AtomicUsize,
    pub confirmation_calls: AtomicUsize,
}

impl ScriptedChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_submit(&self, donation_id: &str, outcome: Result<ChainReceipt, UpstreamError>) {
        self.submissions
            .lock()
            .unwrap()
            .insert(donation_id.to_string(), outcome);
    }

    pub fn confirm(&self, transaction_hash: &str, receipt: ChainReceipt) {
        self.confirmations
            .lock()
            .unwrap()
            .insert(transaction_hash.to_string(), receipt);
    }

    /// Every submission takes this long before answering.
    pub fn slow(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn confirmation_calls(&self) -> usize {
        self.confirmation_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainSubmitter for ScriptedChain {
    async fn submit(&self, donation: &Donation) -> Result<ChainReceipt, UpstreamError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.submissions
            .lock()
            .unwrap()
            .get(&donation.id)
            .cloned()
            .unwrap_or_else(|| Ok(receipt(&format!("0x{}", donation.id), 100)))
    }

    async fn confirmation(
        &self,
        transaction_hash: &str,
    ) -> Result<Option<ChainReceipt>, UpstreamError> {
        self.confirmation_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .confirmations
            .lock()
            .unwrap()
            .get(transaction_hash)
            .cloned())
    }
}
