use std::collections::HashMap;

use anyhow::Result;
use regex::Regex;
use serde::Serialize;

use crate::util::round4;

const NEGATION_SCALAR: f64 = -0.74;
const BOOSTER_INCREMENT: f64 = 0.293;
const BUT_BEFORE_SCALAR: f64 = 0.5;
const BUT_AFTER_SCALAR: f64 = 1.5;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const COMPOUND_ALPHA: f64 = 15.0;
const NEGATION_WINDOW: usize = 3;

const VALENCE_LEXICON: &[(&str, f64)] = &[
    ("accurate", 1.5),
    ("amazing", 2.8),
    ("approved", 1.8),
    ("best", 3.2),
    ("clear", 1.6),
    ("easy", 1.9),
    ("efficient", 1.8),
    ("efficiently", 1.6),
    ("excellent", 2.7),
    ("fair", 1.3),
    ("fast", 1.0),
    ("glad", 2.0),
    ("good", 1.9),
    ("great", 3.1),
    ("happy", 2.7),
    ("help", 1.7),
    ("helpful", 1.8),
    ("love", 3.2),
    ("perfect", 2.7),
    ("perfectly", 2.7),
    ("pleased", 1.9),
    ("quickly", 0.9),
    ("rápido", 1.0),
    ("claro", 1.6),
    ("satisfied", 1.8),
    ("sunny", 1.0),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("welcome", 2.0),
    ("wonderful", 2.7),
    ("angry", -2.3),
    ("awful", -2.0),
    ("bad", -2.5),
    ("confusing", -1.3),
    ("delay", -1.3),
    ("delayed", -0.9),
    ("denied", -1.4),
    ("disappointing", -2.2),
    ("fail", -2.5),
    ("failed", -2.3),
    ("hard", -0.4),
    ("hate", -2.7),
    ("hurt", -2.4),
    ("inaccurate", -1.3),
    ("insufficient", -1.0),
    ("poor", -2.1),
    ("problem", -1.7),
    ("rejected", -1.7),
    ("sad", -2.1),
    ("slow", -0.9),
    ("stupid", -2.4),
    ("terrible", -2.1),
    ("unfair", -2.1),
    ("waste", -1.8),
    ("worst", -3.1),
    ("wrong", -2.1),
];

const BOOSTERS: &[&str] = &[
    "absolutely",
    "completely",
    "extremely",
    "highly",
    "incredibly",
    "really",
    "so",
    "totally",
    "very",
];

const DAMPENERS: &[&str] = &["barely", "hardly", "marginally", "slightly", "somewhat"];

const NEGATIONS: &[&str] = &[
    "cannot", "neither", "never", "no", "nobody", "none", "nor", "not", "nothing", "without",
];

/// Sentiment capability: compound polarity in [-1, 1] plus the proportions
/// behind it.
pub trait SentimentModel {
    fn polarity(&self, text: &str) -> Result<PolarityScores>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PolarityScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

impl SentimentClass {
    pub fn from_compound(compound: f64) -> Self {
        if compound >= 0.05 {
            Self::Positive
        } else if compound <= -0.05 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Neutral => "NEUTRAL",
            Self::Negative => "NEGATIVE",
        }
    }
}

/// Rule-based valence scorer: lexicon lookup with negation flipping, booster
/// and dampener words, `but` contrast weighting and exclamation emphasis.
#[derive(Debug, Clone)]
pub struct LexiconSentiment {
    valences: HashMap<&'static str, f64>,
    token_pattern: Regex,
}

impl LexiconSentiment {
    pub fn new() -> Result<Self> {
        let token_pattern = Regex::new(r"[\p{L}\p{N}']+")?;
        Ok(Self {
            valences: VALENCE_LEXICON.iter().copied().collect(),
            token_pattern,
        })
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        self.token_pattern
            .find_iter(text)
            .map(|found| found.as_str().trim_matches('\'').to_lowercase())
            .filter(|token| !token.is_empty())
            .collect()
    }

    fn token_valence(&self, tokens: &[String], index: usize) -> f64 {
        let Some(base) = self.valences.get(tokens[index].as_str()).copied() else {
            return 0.0;
        };

        let mut valence = base;
        if let Some(previous) = index.checked_sub(1).map(|i| tokens[i].as_str()) {
            let direction = base.signum();
            if BOOSTERS.contains(&previous) {
                valence += direction * BOOSTER_INCREMENT;
            } else if DAMPENERS.contains(&previous) {
                valence -= direction * BOOSTER_INCREMENT;
            }
        }

        let window_start = index.saturating_sub(NEGATION_WINDOW);
        if tokens[window_start..index]
            .iter()
            .any(|token| is_negation(token))
        {
            valence *= NEGATION_SCALAR;
        }

        valence
    }
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token) || token.ends_with("n't")
}

impl SentimentModel for LexiconSentiment {
    fn polarity(&self, text: &str) -> Result<PolarityScores> {
        let tokens = self.tokens(text);
        if tokens.is_empty() {
            return Ok(PolarityScores::default());
        }

        let but_index = tokens.iter().position(|token| token == "but");
        let mut valences = Vec::with_capacity(tokens.len());
        for index in 0..tokens.len() {
            let mut valence = self.token_valence(&tokens, index);
            match but_index {
                Some(pivot) if index < pivot => valence *= BUT_BEFORE_SCALAR,
                Some(pivot) if index > pivot => valence *= BUT_AFTER_SCALAR,
                _ => {}
            }
            valences.push(valence);
        }

        let mut sum = valences.iter().sum::<f64>();
        if sum != 0.0 {
            let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
            sum += sum.signum() * exclamations as f64 * EXCLAMATION_INCREMENT;
        }
        let compound = (sum / (sum * sum + COMPOUND_ALPHA).sqrt()).clamp(-1.0, 1.0);

        let mut pos_sum = 0.0_f64;
        let mut neg_sum = 0.0_f64;
        let mut neutral = 0usize;
        for valence in &valences {
            if *valence > 0.0 {
                pos_sum += valence + 1.0;
            } else if *valence < 0.0 {
                neg_sum += valence - 1.0;
            } else {
                neutral += 1;
            }
        }
        let total = pos_sum + neg_sum.abs() + neutral as f64;

        Ok(PolarityScores {
            neg: round4(neg_sum.abs() / total),
            neu: round4(neutral as f64 / total),
            pos: round4(pos_sum / total),
            compound,
        })
    }
}

/// Absolute compound-polarity difference, in [0, 2].
pub fn sentiment_polarity_gap<M: SentimentModel + ?Sized>(
    model: &M,
    text_a: &str,
    text_b: &str,
) -> Result<f64> {
    let compound_a = model.polarity(text_a)?.compound;
    let compound_b = model.polarity(text_b)?.compound;
    Ok((compound_a - compound_b).abs())
}
