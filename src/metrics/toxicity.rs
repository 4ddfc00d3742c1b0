use std::collections::HashMap;

use anyhow::Result;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum ToxicCategory {
    General,
    Insult,
    Threat,
}

const TOXIC_LEXICON: &[(&str, f64, ToxicCategory)] = &[
    ("crap", 0.45, ToxicCategory::General),
    ("damn", 0.40, ToxicCategory::General),
    ("hate", 0.45, ToxicCategory::General),
    ("shut", 0.25, ToxicCategory::General),
    ("terrible", 0.15, ToxicCategory::General),
    ("awful", 0.15, ToxicCategory::General),
    ("dumb", 0.60, ToxicCategory::Insult),
    ("fool", 0.50, ToxicCategory::Insult),
    ("idiot", 0.80, ToxicCategory::Insult),
    ("incompetent", 0.35, ToxicCategory::Insult),
    ("loser", 0.55, ToxicCategory::Insult),
    ("moron", 0.80, ToxicCategory::Insult),
    ("pathetic", 0.50, ToxicCategory::Insult),
    ("stupid", 0.75, ToxicCategory::Insult),
    ("ugly", 0.45, ToxicCategory::Insult),
    ("useless", 0.35, ToxicCategory::Insult),
    ("attack", 0.50, ToxicCategory::Threat),
    ("destroy", 0.40, ToxicCategory::Threat),
    ("hurt", 0.70, ToxicCategory::Threat),
    ("kill", 0.85, ToxicCategory::Threat),
    ("punch", 0.70, ToxicCategory::Threat),
];

/// Toxicity capability for a single text.
pub trait ToxicityClassifier {
    fn classify(&self, text: &str) -> Result<ToxicityScores>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ToxicityScores {
    pub toxicity: f64,
    pub insult: f64,
    pub threat: f64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToxicityBand {
    NotToxic,
    SlightlyToxic,
    ModeratelyToxic,
    Toxic,
    HighlyToxic,
}

impl ToxicityBand {
    pub fn from_score(score: f64) -> Self {
        if score < 0.1 {
            Self::NotToxic
        } else if score < 0.3 {
            Self::SlightlyToxic
        } else if score < 0.5 {
            Self::ModeratelyToxic
        } else if score < 0.7 {
            Self::Toxic
        } else {
            Self::HighlyToxic
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NotToxic => "not toxic (safe)",
            Self::SlightlyToxic => "slightly toxic (monitor)",
            Self::ModeratelyToxic => "moderately toxic (review)",
            Self::Toxic => "toxic (filter)",
            Self::HighlyToxic => "highly toxic (block)",
        }
    }
}

/// Weighted toxic-term lexicon. Independent hits combine as a noisy-or,
/// `1 - prod(1 - w)`, so the score stays in [0, 1].
#[derive(Debug, Clone)]
pub struct LexiconToxicity {
    terms: HashMap<&'static str, (f64, ToxicCategory)>,
    token_pattern: Regex,
}

impl LexiconToxicity {
    pub fn new() -> Result<Self> {
        let token_pattern = Regex::new(r"[\p{L}\p{N}]+")?;
        Ok(Self {
            terms: TOXIC_LEXICON
                .iter()
                .map(|(term, weight, category)| (*term, (*weight, *category)))
                .collect(),
            token_pattern,
        })
    }
}

impl ToxicityClassifier for LexiconToxicity {
    fn classify(&self, text: &str) -> Result<ToxicityScores> {
        let mut clean_overall = 1.0_f64;
        let mut clean_insult = 1.0_f64;
        let mut clean_threat = 1.0_f64;

        for found in self.token_pattern.find_iter(text) {
            let token = found.as_str().to_lowercase();
            let Some((weight, category)) = self.terms.get(token.as_str()).copied() else {
                continue;
            };
            clean_overall *= 1.0 - weight;
            match category {
                ToxicCategory::Insult => clean_insult *= 1.0 - weight,
                ToxicCategory::Threat => clean_threat *= 1.0 - weight,
                ToxicCategory::General => {}
            }
        }

        Ok(ToxicityScores {
            toxicity: 1.0 - clean_overall,
            insult: 1.0 - clean_insult,
            threat: 1.0 - clean_threat,
        })
    }
}

pub fn toxicity_score<C: ToxicityClassifier + ?Sized>(classifier: &C, text: &str) -> Result<f64> {
    Ok(classifier.classify(text)?.toxicity)
}
