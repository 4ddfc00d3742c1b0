use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::EvaluateArgs;
use crate::commands::inputs::{GateInputs, InputSource, load_gate_inputs};
use crate::metrics::{
    LexiconSentiment, LexiconToxicity, SensitiveLexicon, SentimentModel, ToxicityClassifier,
    authority_score, bias_lexicon_frequency_gap, bias_lexicon_token_fraction,
    citation_completeness, doc_recency_index, language_equivalence_score,
    retrieval_fairness_index, semantic_parity_score, sentiment_polarity_gap, toxicity_score,
};
use crate::model::{AuthorityWeights, CounterfactualPair, ScorecardRow, ThresholdSet};
use crate::rag::{FixtureRagClient, RagClient, SampleRagClient};
use crate::semantic::{Embedder, LocalHashEmbedder, SemanticModelConfig};
use crate::util::{utc_compact_string, utc_string, write_csv, write_json_pretty};

mod gate;
mod run;
mod scorecard;
#[cfg(test)]
mod tests;

use self::gate::*;
use self::scorecard::*;

pub use self::run::run;

const ACTIVE_YEAR_ENV: &str = "RAGFAIR_ACTIVE_YEAR";
const SCORECARD_PREFIX: &str = "fairness_scorecard_";
const RUN_MANIFEST_PREFIX: &str = "fairness_run_";

pub(crate) fn scorecard_file_prefix() -> &'static str {
    SCORECARD_PREFIX
}
