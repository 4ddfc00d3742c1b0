//! Fairness metric battery.
//!
//! Every function here is pure over its inputs. Model-backed metrics take the
//! model as an injected capability so one long-lived instance serves a whole
//! run.

mod lexical;
mod provenance;
mod retrieval;
mod sentiment;
mod similarity;
mod toxicity;

pub use lexical::{
    SensitiveLexicon, bias_lexicon_frequency, bias_lexicon_frequency_gap,
    bias_lexicon_token_fraction,
};
pub use provenance::{
    DEFAULT_RECENCY_HORIZON, authority_score, citation_completeness, doc_recency_index,
};
pub use retrieval::{DEFAULT_TOP_K, retrieval_fairness_index};
pub use sentiment::{
    LexiconSentiment, SentimentClass, SentimentModel, sentiment_polarity_gap,
};
pub use similarity::{language_equivalence_score, semantic_parity_score};
pub use toxicity::{
    LexiconToxicity, ToxicityBand, ToxicityClassifier, toxicity_score,
};
