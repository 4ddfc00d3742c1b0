use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::cli::InputPaths;
use crate::metrics::SensitiveLexicon;
use crate::model::{AuthorityWeights, CounterfactualPair, ThresholdSet, UNKNOWN_SOURCE_TYPE};
use crate::util::{read_json, sha256_file};

pub const REQUIRED_THRESHOLD_KEYS: [&str; 8] = [
    "SPS",
    "SPG",
    "BLF",
    "LES",
    "RFI",
    "CitationMin",
    "DocRecency",
    "Authority",
];
const OPTIONAL_THRESHOLD_KEYS: [&str; 1] = ["Toxicity"];

/// Everything a gate run reads before touching the system under test.
#[derive(Debug, Clone)]
pub struct GateInputs {
    pub pairs: Vec<CounterfactualPair>,
    pub thresholds: ThresholdSet,
    pub authority_weights: AuthorityWeights,
    pub lexicon: SensitiveLexicon,
    pub sources: Vec<InputSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSource {
    pub kind: String,
    pub path: String,
    pub sha256: String,
}

pub fn load_gate_inputs(paths: &InputPaths) -> Result<GateInputs> {
    let pairs_path = paths.pairs();
    let thresholds_path = paths.thresholds();
    let weights_path = paths.authority_weights();
    let terms_path = paths.sensitive_terms();

    let pairs = load_pairs(&pairs_path)?;
    let thresholds = load_thresholds(&thresholds_path)?;
    let authority_weights = load_authority_weights(&weights_path)?;
    let lexicon = load_sensitive_terms(&terms_path)?;

    let sources = [
        ("counterfactual_pairs", &pairs_path),
        ("thresholds", &thresholds_path),
        ("authority_weights", &weights_path),
        ("sensitive_terms", &terms_path),
    ]
    .into_iter()
    .map(|(kind, path)| {
        Ok(InputSource {
            kind: kind.to_string(),
            path: path.display().to_string(),
            sha256: sha256_file(path)?,
        })
    })
    .collect::<Result<Vec<InputSource>>>()?;

    Ok(GateInputs {
        pairs,
        thresholds,
        authority_weights,
        lexicon,
        sources,
    })
}

pub fn load_pairs(path: &Path) -> Result<Vec<CounterfactualPair>> {
    let pairs: Vec<CounterfactualPair> = read_json(path)?;
    validate_pairs(&pairs).with_context(|| format!("invalid pair dataset: {}", path.display()))?;
    if pairs.is_empty() {
        warn!(path = %path.display(), "counterfactual pair dataset is empty");
    }
    Ok(pairs)
}

pub fn validate_pairs(pairs: &[CounterfactualPair]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, pair) in pairs.iter().enumerate() {
        let pair_id = pair.resolved_id(index);
        if pair.query_a.trim().is_empty() || pair.query_b.trim().is_empty() {
            bail!("pair {pair_id} has an empty query");
        }
        if !seen.insert(pair_id.clone()) {
            bail!("duplicate pair id: {pair_id}");
        }
    }
    Ok(())
}

pub fn load_thresholds(path: &Path) -> Result<ThresholdSet> {
    let raw: Map<String, Value> = read_json(path)?;
    parse_thresholds(raw).with_context(|| format!("invalid threshold set: {}", path.display()))
}

pub fn parse_thresholds(raw: Map<String, Value>) -> Result<ThresholdSet> {
    for key in REQUIRED_THRESHOLD_KEYS {
        if !raw.contains_key(key) {
            bail!("missing required threshold key: {key}");
        }
    }

    let mut recognized = Map::new();
    for (key, value) in raw {
        if REQUIRED_THRESHOLD_KEYS.contains(&key.as_str())
            || OPTIONAL_THRESHOLD_KEYS.contains(&key.as_str())
        {
            recognized.insert(key, value);
        } else {
            warn!(key = %key, "ignoring unrecognized threshold key");
        }
    }

    let thresholds: ThresholdSet = serde_json::from_value(Value::Object(recognized))
        .context("threshold values have the wrong type")?;
    validate_thresholds(&thresholds)?;
    Ok(thresholds)
}

pub fn validate_thresholds(thresholds: &ThresholdSet) -> Result<()> {
    let bounded = [
        ("SPS", thresholds.sps, -1.0, 1.0),
        ("LES", thresholds.les, -1.0, 1.0),
        ("SPG", thresholds.spg, 0.0, 2.0),
        ("BLF", thresholds.blf, 0.0, 1.0),
        ("RFI", thresholds.rfi, 0.0, 1.0),
        ("DocRecency", thresholds.doc_recency, 0.0, 1.0),
        ("Authority", thresholds.authority, 0.0, 1.0),
    ];
    for (key, value, low, high) in bounded {
        ensure_in_range(key, value, low, high)?;
    }
    if let Some(ceiling) = thresholds.toxicity {
        ensure_in_range("Toxicity", ceiling, 0.0, 1.0)?;
    }
    Ok(())
}

fn ensure_in_range(key: &str, value: f64, low: f64, high: f64) -> Result<()> {
    if !value.is_finite() || value < low || value > high {
        bail!("threshold {key}={value} outside [{low}, {high}]");
    }
    Ok(())
}

pub fn load_authority_weights(path: &Path) -> Result<AuthorityWeights> {
    let weights: AuthorityWeights = read_json(path)?;
    validate_authority_weights(&weights)
        .with_context(|| format!("invalid authority weights: {}", path.display()))?;
    Ok(weights)
}

pub fn validate_authority_weights(weights: &AuthorityWeights) -> Result<()> {
    if !weights.has_unknown() {
        bail!("authority weights must define an \"{UNKNOWN_SOURCE_TYPE}\" fallback entry");
    }
    for (source_type, weight) in weights.iter() {
        if !weight.is_finite() || !(0.0..=1.0).contains(weight) {
            bail!("authority weight for {source_type}={weight} outside [0, 1]");
        }
    }
    Ok(())
}

pub fn load_sensitive_terms(path: &Path) -> Result<SensitiveLexicon> {
    let terms: Vec<String> = read_json(path)?;
    let lexicon = terms
        .iter()
        .map(|term| term.trim())
        .filter(|term| !term.is_empty())
        .collect::<SensitiveLexicon>();
    if lexicon.is_empty() {
        warn!(path = %path.display(), "sensitive-term lexicon is empty; BLF will always be 0");
    }
    Ok(lexicon)
}
