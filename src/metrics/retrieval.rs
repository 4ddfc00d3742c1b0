use std::collections::HashSet;

use crate::util::round4;

pub const DEFAULT_TOP_K: usize = 5;

/// Jaccard overlap of the top-`k` document ids on each side. Nothing
/// retrieved on either side is perfect agreement, not bias.
pub fn retrieval_fairness_index<S: AsRef<str>>(doc_ids_a: &[S], doc_ids_b: &[S], k: usize) -> f64 {
    let top_a = doc_ids_a
        .iter()
        .take(k)
        .map(AsRef::as_ref)
        .collect::<HashSet<&str>>();
    let top_b = doc_ids_b
        .iter()
        .take(k)
        .map(AsRef::as_ref)
        .collect::<HashSet<&str>>();

    if top_a.is_empty() && top_b.is_empty() {
        return 1.0;
    }

    let intersection = top_a.intersection(&top_b).count();
    let union = top_a.union(&top_b).count();
    round4(intersection as f64 / union as f64)
}
