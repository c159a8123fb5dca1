use crate::models::VerificationRecord;
use crate::services::timestamp::NormalizedTimestamp;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: String,
    /// Store decimals arrive as numbers or numeric strings; anything else is
    /// treated as missing.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub donor_ref: String,
    pub charity_ref: String,
    #[serde(default)]
    pub project_ref: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: NormalizedTimestamp,
    #[serde(default)]
    pub verification: Option<VerificationRecord>,
}

impl Donation {
    /// Amount used for aggregation. Missing, non-finite and non-positive
    /// amounts count as zero.
    pub fn effective_amount(&self) -> f64 {
        match self.amount {
            Some(amount) if amount.is_finite() && amount > 0.0 => amount,
            _ => 0.0,
        }
    }

    /// Donor reference for display. Anonymous donations keep `donor_ref` for
    /// aggregation but never expose it.
    pub fn display_donor(&self) -> Option<&str> {
        if self.anonymous {
            None
        } else {
            Some(self.donor_ref.as_str())
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.payment_status == PaymentStatus::Succeeded
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
