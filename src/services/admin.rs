use crate::models::{
    is_placeholder_hash, Page, SortKey, SortOrder, VerificationOverride, VerificationQuery,
    VerificationRecord,
};
use crate::services::timestamp::normalize;
use std::cmp::Ordering;

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Filter, search, sort and paginate verification records for the admin
/// listing.
pub fn query_verifications(
    records: Vec<VerificationRecord>,
    query: &VerificationQuery,
) -> Page<VerificationRecord> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matching: Vec<VerificationRecord> = records
        .into_iter()
        .filter(|r| query.verified.map_or(true, |verified| r.verified == verified))
        .filter(|r| search.as_deref().map_or(true, |term| matches_search(r, term)))
        .collect();

    matching.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort);
        match query.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let page = query.page.unwrap_or(1).max(1);
    let total = matching.len();
    let total_pages = (total + limit - 1) / limit;

    let items = matching
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Page {
        items,
        total,
        page,
        limit,
        total_pages,
    }
}

fn matches_search(record: &VerificationRecord, term: &str) -> bool {
    record.donation_ref.to_lowercase().contains(term)
        || record
            .transaction_hash
            .as_deref()
            .map_or(false, |hash| hash.to_lowercase().contains(term))
}

fn compare(a: &VerificationRecord, b: &VerificationRecord, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Timestamp => a.timestamp.instant().cmp(&b.timestamp.instant()),
        SortKey::BlockNumber => a.block_number.cmp(&b.block_number),
        SortKey::DonationRef => Ordering::Equal,
    };
    primary.then_with(|| a.donation_ref.cmp(&b.donation_ref))
}

/// Apply an operator override. A record marked verified must carry a real
/// transaction hash.
pub fn apply_override(
    mut record: VerificationRecord,
    changes: VerificationOverride,
) -> Result<VerificationRecord, String> {
    if let Some(verified) = changes.verified {
        record.verified = verified;
    }
    if let Some(hash) = changes.transaction_hash {
        record.transaction_hash = Some(hash.trim().to_string()).filter(|h| !h.is_empty());
    }
    if let Some(block_number) = changes.block_number {
        record.block_number = block_number;
    }
    if changes.timestamp.is_some() {
        record.timestamp = normalize(changes.timestamp.as_ref());
    }

    if record.verified {
        match record.transaction_hash.as_deref() {
            Some(hash) if !is_placeholder_hash(hash) => {}
            _ => {
                return Err(format!(
                    "verification for {} cannot be marked verified without a transaction hash",
                    record.donation_ref
                ))
            }
        }
    }

    Ok(record)
}
