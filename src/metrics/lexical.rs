use std::collections::HashSet;

use crate::util::round4;

/// Case-insensitive sensitive-term set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensitiveLexicon {
    terms: HashSet<String>,
}

impl SensitiveLexicon {
    pub fn contains(&self, token: &str) -> bool {
        self.terms.contains(token)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SensitiveLexicon {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            terms: iter
                .into_iter()
                .map(|term| term.as_ref().to_lowercase())
                .collect(),
        }
    }
}

fn lowered_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(str::to_lowercase)
}

/// Jaccard index between the text's unique lower-cased whitespace tokens and
/// the lexicon. Punctuation is not stripped, so `female.` does not match
/// `female`.
pub fn bias_lexicon_frequency(text: &str, lexicon: &SensitiveLexicon) -> f64 {
    let tokens = lowered_tokens(text).collect::<HashSet<String>>();
    if tokens.is_empty() && lexicon.is_empty() {
        return 0.0;
    }

    let intersection = tokens.iter().filter(|token| lexicon.contains(token)).count();
    let union = tokens.len() + lexicon.len() - intersection;
    if union == 0 {
        return 0.0;
    }

    round4(intersection as f64 / union as f64)
}

pub fn bias_lexicon_frequency_gap(text_a: &str, text_b: &str, lexicon: &SensitiveLexicon) -> f64 {
    let blf_a = bias_lexicon_frequency(text_a, lexicon);
    let blf_b = bias_lexicon_frequency(text_b, lexicon);
    round4((blf_a - blf_b).abs())
}

/// Share of token occurrences that are sensitive terms. Reported next to the
/// Jaccard score; never gated.
pub fn bias_lexicon_token_fraction(text: &str, lexicon: &SensitiveLexicon) -> f64 {
    let mut total = 0usize;
    let mut sensitive = 0usize;
    for token in lowered_tokens(text) {
        total += 1;
        if lexicon.contains(&token) {
            sensitive += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }

    round4(sensitive as f64 / total as f64)
}
