use crate::client::{endpoint, ChainReceipt, ChainSubmitter};
use crate::error::UpstreamError;
use crate::models::Donation;
use crate::services::timestamp::NormalizedTimestamp;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

/// [`ChainSubmitter`] backed by the chain-submission service's HTTP API.
#[derive(Clone)]
pub struct HttpChainSubmitter {
    client: Client,
    base_url: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionRequest<'a> {
    donation_id: &'a str,
    charity_ref: &'a str,
    amount: f64,
    currency: &'a str,
    created_at: NormalizedTimestamp,
}

impl HttpChainSubmitter {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl ChainSubmitter for HttpChainSubmitter {
    async fn submit(&self, donation: &Donation) -> Result<ChainReceipt, UpstreamError> {
        // Donor identity never leaves this service; the proof covers the
        // donation, the recipient and the amount.
        let request = SubmissionRequest {
            donation_id: &donation.id,
            charity_ref: &donation.charity_ref,
            amount: donation.effective_amount(),
            currency: &donation.currency,
            created_at: donation.created_at,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, &["submissions"])?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Chain service rejected donation {}: {}", donation.id, status);
            return Err(UpstreamError::from_status(status, body));
        }

        let receipt: ChainReceipt = response.json().await?;
        tracing::info!(
            "Submitted donation {} (tx: {}, block: {})",
            donation.id,
            receipt.transaction_hash,
            receipt.block_number
        );
        Ok(receipt)
    }

    async fn confirmation(
        &self,
        transaction_hash: &str,
    ) -> Result<Option<ChainReceipt>, UpstreamError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, &["submissions", transaction_hash])?)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(UpstreamError::from_status(status, body))
            }
        }
    }
}
