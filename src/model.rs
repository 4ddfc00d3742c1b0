use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const UNKNOWN_SOURCE_TYPE: &str = "unknown";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterfactualPair {
    #[serde(default)]
    pub id: Option<String>,
    pub query_a: String,
    pub query_b: String,
    #[serde(default, alias = "is_lang_pair")]
    pub is_language_pair: bool,
}

impl CounterfactualPair {
    pub fn resolved_id(&self, index: usize) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("pair_{index}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagResponse {
    pub text: String,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub retrieved: Vec<RetrievedDoc>,
}

impl RagResponse {
    pub fn doc_ids(&self) -> Vec<&str> {
        self.retrieved
            .iter()
            .map(|doc| doc.doc_id.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedDoc {
    pub doc_id: String,
    #[serde(default)]
    pub year: Option<DocYear>,
    #[serde(default = "unknown_source_type")]
    pub source_type: String,
}

fn unknown_source_type() -> String {
    UNKNOWN_SOURCE_TYPE.to_string()
}

/// Publication year as supplied by the retriever. Not every backend emits a
/// clean integer, so anything that cannot be coerced is kept and reported as
/// not recent instead of failing the parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DocYear {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl DocYear {
    pub fn as_year(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.is_finite() => Some(value.trunc() as i64),
            Self::Float(_) => None,
            Self::Text(value) => value.trim().parse::<i64>().ok(),
            Self::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdSet {
    #[serde(rename = "SPS")]
    pub sps: f64,
    #[serde(rename = "SPG")]
    pub spg: f64,
    #[serde(rename = "BLF")]
    pub blf: f64,
    #[serde(rename = "LES")]
    pub les: f64,
    #[serde(rename = "RFI")]
    pub rfi: f64,
    #[serde(rename = "CitationMin")]
    pub citation_min: u32,
    #[serde(rename = "DocRecency")]
    pub doc_recency: f64,
    #[serde(rename = "Authority")]
    pub authority: f64,
    #[serde(rename = "Toxicity", default, skip_serializing_if = "Option::is_none")]
    pub toxicity: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AuthorityWeights(BTreeMap<String, f64>);

impl AuthorityWeights {
    pub const DEFAULT_UNKNOWN_WEIGHT: f64 = 0.3;

    pub fn weight_for(&self, source_type: &str) -> f64 {
        self.0
            .get(source_type)
            .or_else(|| self.0.get(UNKNOWN_SOURCE_TYPE))
            .copied()
            .unwrap_or(Self::DEFAULT_UNKNOWN_WEIGHT)
    }

    pub fn has_unknown(&self) -> bool {
        self.0.contains_key(UNKNOWN_SOURCE_TYPE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<const N: usize> From<[(&str, f64); N]> for AuthorityWeights {
    fn from(entries: [(&str, f64); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }
}

/// One audit record per evaluated pair. Field order is the column order of
/// the tabular scorecard.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScorecardRow {
    pub pair_id: String,
    pub query_a: String,
    pub query_b: String,
    pub is_lang_pair: bool,
    pub status: String,
    #[serde(rename = "SPS")]
    pub sps: f64,
    #[serde(rename = "SPG")]
    pub spg: f64,
    #[serde(rename = "BLF")]
    pub blf_gap: f64,
    #[serde(rename = "BLF_fraction_A")]
    pub blf_fraction_a: f64,
    #[serde(rename = "BLF_fraction_B")]
    pub blf_fraction_b: f64,
    #[serde(rename = "LES")]
    pub les: Option<f64>,
    #[serde(rename = "RFI")]
    pub rfi: f64,
    #[serde(rename = "Citations_A")]
    pub citations_a: usize,
    #[serde(rename = "Citations_B")]
    pub citations_b: usize,
    #[serde(rename = "DRI_A")]
    pub dri_a: f64,
    #[serde(rename = "DRI_B")]
    pub dri_b: f64,
    #[serde(rename = "Authority_A")]
    pub authority_a: f64,
    #[serde(rename = "Authority_B")]
    pub authority_b: f64,
    #[serde(rename = "Toxicity_A")]
    pub toxicity_a: Option<f64>,
    #[serde(rename = "Toxicity_B")]
    pub toxicity_b: Option<f64>,
    #[serde(rename = "ACTIVE_YEAR")]
    pub active_year: i64,
    #[serde(rename = "Thresholds")]
    pub thresholds: ThresholdSet,
    pub failed_checks: Vec<String>,
}
