//! Treatment deduplication and ranking.
//!
//! Many hospitals offer the same treatment under slightly different names.
//! The public listing shows one representative per normalized name, the
//! "best" offer by success rate, then price, then the popular flag, then
//! recency (highest id). The deduplicated list is then sorted for display
//! by its own key.

use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

use crate::models::TreatmentRecord;

const TEST_MARKER: &str = "[test]";

/// Deduplication key for a treatment name
///
/// Removes every `[TEST]` marker (any case) along with the whitespace that
/// follows it, then lowercases and trims.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut normalized = String::with_capacity(lowered.len());
    let mut rest = lowered.as_str();

    while let Some(pos) = rest.find(TEST_MARKER) {
        normalized.push_str(&rest[..pos]);
        rest = rest[pos + TEST_MARKER.len()..].trim_start();
    }
    normalized.push_str(rest);

    normalized.trim().to_string()
}

/// Missing prices sort after every priced offer
fn price_key(record: &TreatmentRecord) -> (bool, u64) {
    match record.min_price {
        Some(price) => (false, price),
        None => (true, 0),
    }
}

/// Order two offers of the same treatment, `Greater` means `a` is the better one
pub fn compare_offers(a: &TreatmentRecord, b: &TreatmentRecord) -> Ordering {
    a.success_rate
        .unwrap_or(0)
        .cmp(&b.success_rate.unwrap_or(0))
        .then_with(|| price_key(b).cmp(&price_key(a)))
        .then_with(|| a.is_popular.unwrap_or(false).cmp(&b.is_popular.unwrap_or(false)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort key for the public listing, ascending
pub type DisplayKey = (Reverse<bool>, Reverse<u8>, String, i64);

/// Display order: popular first, then success rate descending, then name
/// (case-insensitive), then id. The id is only reachable without
/// deduplication, where names may repeat.
pub fn display_key(record: &TreatmentRecord) -> DisplayKey {
    (
        Reverse(record.is_popular.unwrap_or(false)),
        Reverse(record.success_rate.unwrap_or(0)),
        record.name.to_lowercase(),
        record.id,
    )
}

/// Keep the best offer per normalized name
///
/// Output order is unspecified, see [`sort_for_display`].
pub fn dedupe(records: &[TreatmentRecord]) -> Vec<TreatmentRecord> {
    let mut best: HashMap<String, &TreatmentRecord> = HashMap::with_capacity(records.len());

    for record in records {
        best.entry(normalize_name(&record.name))
            .and_modify(|current| {
                if compare_offers(record, current) == Ordering::Greater {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    best.into_values().cloned().collect()
}

/// Sort records in place for the public listing
pub fn sort_for_display(records: &mut [TreatmentRecord]) {
    records.sort_by_cached_key(display_key);
}

/// Produce the public treatment listing
///
/// With `dedupe` off every record is kept and only the display sort applies.
pub fn rank(records: &[TreatmentRecord], dedupe: bool) -> Vec<TreatmentRecord> {
    let mut ranked = if dedupe {
        self::dedupe(records)
    } else {
        records.to_vec()
    };
    sort_for_display(&mut ranked);
    ranked
}
