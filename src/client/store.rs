use crate::client::{endpoint, DonationStore};
use crate::error::UpstreamError;
use crate::models::{Donation, FundFlow, VerificationRecord};
use crate::services::retry::{retry_network, RetryPolicy};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

/// [`DonationStore`] backed by the platform's REST API.
#[derive(Clone)]
pub struct HttpDonationStore {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl HttpDonationStore {
    pub fn new(client: Client, base_url: Url, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url,
            retry,
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        endpoint(&self.base_url, segments)
    }

    fn donations_by(&self, key: &str, value: &str) -> Result<Url, UpstreamError> {
        let mut url = self.url(&["donations"])?;
        url.query_pairs_mut().append_pair(key, value);
        Ok(url)
    }

    /// Idempotent GET, retried on transport failures. 404 maps to `None`.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Option<T>, UpstreamError> {
        let operation = format!("GET {}", url.path());
        let url = &url;
        let client = &self.client;
        retry_network(&self.retry, &operation, move || async move {
            let response = client.get(url.clone()).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let response = ensure_success(response).await?;
            Ok::<_, UpstreamError>(Some(response.json::<T>().await?))
        })
        .await
    }

    async fn get_required<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let path = url.path().to_string();
        self.get_optional(url)
            .await?
            .ok_or(UpstreamError::NotFound(path))
    }

    async fn delete(&self, url: Url) -> Result<bool, UpstreamError> {
        let response = self.client.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response).await?;
        Ok(true)
    }
}

async fn ensure_success(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::from_status(status, body))
}

#[async_trait]
impl DonationStore for HttpDonationStore {
    async fn donation(&self, id: &str) -> Result<Option<Donation>, UpstreamError> {
        self.get_optional(self.url(&["donations", id])?).await
    }

    async fn verification(
        &self,
        donation_id: &str,
    ) -> Result<Option<VerificationRecord>, UpstreamError> {
        self.get_optional(self.url(&["donations", donation_id, "verification"])?)
            .await
    }

    async fn save_verification(
        &self,
        record: &VerificationRecord,
    ) -> Result<VerificationRecord, UpstreamError> {
        let url = self.url(&["donations", record.donation_ref.as_str(), "verification"])?;
        let response = self.client.put(url).json(record).send().await?;
        let saved = ensure_success(response).await?.json().await?;
        tracing::debug!("Persisted verification for donation {}", record.donation_ref);
        Ok(saved)
    }

    async fn delete_verification(&self, donation_id: &str) -> Result<bool, UpstreamError> {
        self.delete(self.url(&["donations", donation_id, "verification"])?)
            .await
    }

    async fn list_verifications(&self) -> Result<Vec<VerificationRecord>, UpstreamError> {
        self.get_required(self.url(&["verifications"])?).await
    }

    async fn donor_donations(&self, donor_id: &str) -> Result<Vec<Donation>, UpstreamError> {
        self.get_required(self.donations_by("donor", donor_id)?).await
    }

    async fn charity_donations(
        &self,
        charity_id: &str,
    ) -> Result<Vec<Donation>, UpstreamError> {
        self.get_required(self.donations_by("charity", charity_id)?)
            .await
    }

    async fn charity_fund_flow(&self, charity_id: &str) -> Result<FundFlow, UpstreamError> {
        // A charity without bookkeeping yet has no flow record.
        Ok(self
            .get_optional(self.url(&["charities", charity_id, "fund-flow"])?)
            .await?
            .unwrap_or_default())
    }

    async fn all_donations(&self) -> Result<Vec<Donation>, UpstreamError> {
        self.get_required(self.url(&["donations"])?).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), UpstreamError> {
        if self.delete(self.url(&["users", user_id])?).await? {
            Ok(())
        } else {
            Err(UpstreamError::NotFound(format!("user {}", user_id)))
        }
    }

    async fn delete_charity(&self, charity_id: &str) -> Result<(), UpstreamError> {
        if self.delete(self.url(&["charities", charity_id])?).await? {
            Ok(())
        } else {
            Err(UpstreamError::NotFound(format!("charity {}", charity_id)))
        }
    }
}
