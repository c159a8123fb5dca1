//! Donor, charity and platform statistics over donation records.
//!
//! All functions are pure and total: empty inputs and missing numeric fields
//! produce zeros, never NaN or a division by zero.

use crate::models::{
    classify, CharityStatsSnapshot, Donation, DonorStatsSnapshot, FundFlow,
    PlatformVerificationStats, VerificationState,
};
use std::collections::HashSet;

#[derive(Debug, Default)]
struct Totals {
    count: u64,
    amount: f64,
    verified_count: u64,
    verified_amount: f64,
}

impl Totals {
    fn collect(donations: &[Donation]) -> Self {
        donations.iter().fold(Totals::default(), |mut acc, donation| {
            let amount = donation.effective_amount();
            acc.count += 1;
            acc.amount += amount;
            if classify(donation.verification.as_ref()) == VerificationState::Verified {
                acc.verified_count += 1;
                acc.verified_amount += amount;
            }
            acc
        })
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.amount / self.count as f64
        }
    }

    fn transparency_score(&self) -> f64 {
        round1(ratio_percent(self.verified_count as f64, self.count as f64))
    }
}

pub fn aggregate_donor(donor_ref: &str, donations: &[Donation]) -> DonorStatsSnapshot {
    let totals = Totals::collect(donations);
    let unique_charities = donations
        .iter()
        .map(|d| d.charity_ref.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;

    DonorStatsSnapshot {
        donor_ref: donor_ref.to_string(),
        total_donations: totals.count,
        total_amount: totals.amount,
        average_amount: totals.average(),
        unique_charities,
        verified_donations: totals.verified_count,
        verified_amount: totals.verified_amount,
        transparency_score: totals.transparency_score(),
    }
}

/// Anonymous donors still count as distinct donors: deduplication is on
/// `donor_ref`, which is retained even when hidden from display.
pub fn aggregate_charity(
    charity_ref: &str,
    donations: &[Donation],
    flow: &FundFlow,
) -> CharityStatsSnapshot {
    let totals = Totals::collect(donations);
    let unique_donors = donations
        .iter()
        .map(|d| d.donor_ref.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;

    let total_received = finite_or_zero(flow.total_received);
    let total_disbursed = finite_or_zero(flow.total_disbursed);

    CharityStatsSnapshot {
        charity_ref: charity_ref.to_string(),
        total_donations: totals.count,
        total_amount: totals.amount,
        average_amount: totals.average(),
        unique_donors,
        verified_donations: totals.verified_count,
        verified_amount: totals.verified_amount,
        transparency_score: totals.transparency_score(),
        total_received,
        total_disbursed,
        funding_efficiency: round1(ratio_percent(total_disbursed, total_received)),
    }
}

pub fn aggregate_platform(donations: &[Donation]) -> PlatformVerificationStats {
    let mut stats = PlatformVerificationStats {
        total_donations: 0,
        unsubmitted: 0,
        pending: 0,
        verified: 0,
        failed: 0,
        verified_amount: 0.0,
        verification_rate: 0.0,
        latest_block: 0,
    };

    for donation in donations {
        stats.total_donations += 1;
        match classify(donation.verification.as_ref()) {
            VerificationState::Unsubmitted => stats.unsubmitted += 1,
            VerificationState::Pending => stats.pending += 1,
            VerificationState::Failed => stats.failed += 1,
            VerificationState::Verified => {
                stats.verified += 1;
                stats.verified_amount += donation.effective_amount();
                if let Some(record) = &donation.verification {
                    stats.latest_block = stats.latest_block.max(record.block_number);
                }
            }
        }
    }

    stats.verification_rate =
        round1(ratio_percent(stats.verified as f64, stats.total_donations as f64));
    stats
}

/// Funding goal progress in `[0, 100]`. A non-positive goal yields 0.
pub fn progress_percentage(current: f64, goal: f64) -> f64 {
    if !(goal > 0.0) || !current.is_finite() {
        return 0.0;
    }
    (current / goal * 100.0).clamp(0.0, 100.0)
}

fn ratio_percent(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
