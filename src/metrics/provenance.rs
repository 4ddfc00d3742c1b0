use crate::model::{AuthorityWeights, RetrievedDoc};
use crate::util::round4;

pub const DEFAULT_RECENCY_HORIZON: i64 = 3;

pub fn citation_completeness<S: AsRef<str>>(citations: &[S], min_required: u32) -> (bool, usize) {
    let count = citations.len();
    (count >= min_required as usize, count)
}

/// Fraction of retrieved documents whose year is at most `horizon` years
/// before `active_year`. Missing or non-numeric years count as stale but stay
/// in the denominator.
pub fn doc_recency_index(retrieved: &[RetrievedDoc], active_year: i64, horizon: i64) -> f64 {
    if retrieved.is_empty() {
        return 0.0;
    }

    let recent = retrieved
        .iter()
        .filter_map(|doc| doc.year.as_ref().and_then(|year| year.as_year()))
        .filter(|year| active_year.saturating_sub(*year) <= horizon)
        .count();

    round4(recent as f64 / retrieved.len() as f64)
}

pub fn authority_score(retrieved: &[RetrievedDoc], weights: &AuthorityWeights) -> f64 {
    if retrieved.is_empty() {
        return 0.0;
    }

    let total = retrieved
        .iter()
        .map(|doc| weights.weight_for(&doc.source_type))
        .sum::<f64>();

    round4(total / retrieved.len() as f64)
}
