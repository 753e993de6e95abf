use std::collections::HashMap;

use crate::describe;
use crate::models::{PropertyRecord, RankedProperty};
use crate::vector::VectorMatch;

/// Join index matches with their canonical records into a ranked list.
///
/// The index only returns ids and scores; the record store is the source of
/// truth for everything shown to the user. Matches whose id has no record
/// (a listing deleted after indexing) are dropped silently. Each surviving
/// result carries the exact synthesized text the index matched against as
/// its `match_reason`.
///
/// The output is sorted descending by score. The sort is stable, so equal
/// scores keep the index's own order. Truncation to the response limit is
/// the caller's job and must happen after this join, never before.
pub fn merge_results(
    matches: &[VectorMatch],
    records: Vec<PropertyRecord>,
) -> Vec<RankedProperty> {
    let mut by_id: HashMap<String, PropertyRecord> =
        records.into_iter().map(|r| (r.id.clone(), r)).collect();

    let mut results: Vec<RankedProperty> = matches
        .iter()
        .filter_map(|m| {
            // remove() also deduplicates repeated match ids
            let record = by_id.remove(&m.id)?;
            let match_reason = Some(describe::synthesize(&record));
            Some(RankedProperty {
                property: record,
                relevance_score: m.score,
                match_reason,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}
