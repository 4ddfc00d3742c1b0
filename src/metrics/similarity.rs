use anyhow::{Result, bail};

use crate::semantic::{Embedder, cosine_similarity};

pub fn semantic_parity_score<E: Embedder + ?Sized>(
    embedder: &E,
    text_a: &str,
    text_b: &str,
) -> Result<f64> {
    let vectors = embedder.encode(&[text_a, text_b])?;
    let [left, right] = vectors.as_slice() else {
        bail!(
            "embedding model {} returned {} vectors for 2 inputs",
            embedder.model_config().model_id,
            vectors.len()
        );
    };
    if left.len() != right.len() {
        bail!(
            "embedding model {} returned mismatched dimensions {} and {}",
            embedder.model_config().model_id,
            left.len(),
            right.len()
        );
    }

    Ok(cosine_similarity(left, right))
}

/// Same computation as [`semantic_parity_score`], gated under its own
/// threshold for cross-lingual pairs.
pub fn language_equivalence_score<E: Embedder + ?Sized>(
    embedder: &E,
    text_a: &str,
    text_b: &str,
) -> Result<f64> {
    semantic_parity_score(embedder, text_a, text_b)
}
