use super::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateSettings {
    pub active_year: i64,
    pub recency_horizon: i64,
    pub top_k: usize,
}

/// Long-lived model instances shared by every pair of a run.
#[derive(Clone, Copy)]
pub struct ModelSuite<'a> {
    pub embedder: &'a dyn Embedder,
    pub sentiment: &'a dyn SentimentModel,
    pub toxicity: &'a dyn ToxicityClassifier,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    AtLeast,
    AtMost,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCheck {
    pub metric: &'static str,
    pub side: Option<Side>,
    pub value: f64,
    pub threshold: f64,
    pub comparison: Comparison,
    pub passed: bool,
}

impl MetricCheck {
    pub(super) fn floor(
        metric: &'static str,
        side: Option<Side>,
        value: f64,
        threshold: f64,
    ) -> Self {
        Self {
            metric,
            side,
            value,
            threshold,
            comparison: Comparison::AtLeast,
            passed: value >= threshold,
        }
    }

    pub(super) fn ceiling(
        metric: &'static str,
        side: Option<Side>,
        value: f64,
        threshold: f64,
    ) -> Self {
        Self {
            metric,
            side,
            value,
            threshold,
            comparison: Comparison::AtMost,
            passed: value <= threshold,
        }
    }

    pub(super) fn count(side: Side, verdict: bool, count: usize, minimum: u32) -> Self {
        Self {
            metric: "CitationMin",
            side: Some(side),
            value: count as f64,
            threshold: f64::from(minimum),
            comparison: Comparison::AtLeast,
            passed: verdict,
        }
    }

    pub fn label(&self) -> String {
        match self.side {
            Some(side) => format!("{}[{}]", self.metric, side.as_str()),
            None => self.metric.to_string(),
        }
    }

    pub fn message(&self) -> String {
        let direction = match self.comparison {
            Comparison::AtLeast => "below",
            Comparison::AtMost => "above",
        };
        if self.metric == "CitationMin" {
            return format!(
                "{}={} {direction} minimum {}",
                self.label(),
                self.value,
                self.threshold
            );
        }
        format!(
            "{}={:.4} {direction} threshold {}",
            self.label(),
            self.value,
            self.threshold
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Evaluated {
        row: ScorecardRow,
        checks: Vec<MetricCheck>,
    },
    Error {
        pair_id: String,
        message: String,
    },
}

pub struct FairnessGate<'a> {
    pub rag: &'a dyn RagClient,
    pub models: ModelSuite<'a>,
    pub thresholds: ThresholdSet,
    pub authority_weights: &'a AuthorityWeights,
    pub lexicon: &'a SensitiveLexicon,
    pub settings: GateSettings,
}

impl FairnessGate<'_> {
    /// Evaluates one pair to completion. Collaborator failures become
    /// [`PairOutcome::Error`]; threshold misses are ordinary failed rows.
    pub fn evaluate_pair(&self, index: usize, pair: &CounterfactualPair) -> PairOutcome {
        let pair_id = pair.resolved_id(index);
        match self.score_pair(&pair_id, pair) {
            Ok((row, checks)) => PairOutcome::Evaluated { row, checks },
            Err(err) => PairOutcome::Error {
                pair_id,
                message: format!("{err:#}"),
            },
        }
    }

    fn score_pair(
        &self,
        pair_id: &str,
        pair: &CounterfactualPair,
    ) -> Result<(ScorecardRow, Vec<MetricCheck>)> {
        let response_a = self
            .rag
            .query(&pair.query_a)
            .with_context(|| format!("{} client failed on query_a", self.rag.name()))?;
        let response_b = self
            .rag
            .query(&pair.query_b)
            .with_context(|| format!("{} client failed on query_b", self.rag.name()))?;

        let thresholds = &self.thresholds;
        let models = &self.models;
        let (text_a, text_b) = (response_a.text.as_str(), response_b.text.as_str());

        let sps = semantic_parity_score(models.embedder, text_a, text_b)
            .context("semantic parity scoring failed")?;
        let spg = sentiment_polarity_gap(models.sentiment, text_a, text_b)
            .context("sentiment scoring failed")?;
        let blf_gap = bias_lexicon_frequency_gap(text_a, text_b, self.lexicon);
        let les = if pair.is_language_pair {
            Some(
                language_equivalence_score(models.embedder, text_a, text_b)
                    .context("language equivalence scoring failed")?,
            )
        } else {
            None
        };
        let toxicity = match thresholds.toxicity {
            Some(_) => Some((
                toxicity_score(models.toxicity, text_a).context("toxicity scoring failed")?,
                toxicity_score(models.toxicity, text_b).context("toxicity scoring failed")?,
            )),
            None => None,
        };

        let rfi = retrieval_fairness_index(
            &response_a.doc_ids(),
            &response_b.doc_ids(),
            self.settings.top_k,
        );
        let (citations_ok_a, citations_a) =
            citation_completeness(&response_a.citations, thresholds.citation_min);
        let (citations_ok_b, citations_b) =
            citation_completeness(&response_b.citations, thresholds.citation_min);
        let settings = self.settings;
        let dri_a = doc_recency_index(
            &response_a.retrieved,
            settings.active_year,
            settings.recency_horizon,
        );
        let dri_b = doc_recency_index(
            &response_b.retrieved,
            settings.active_year,
            settings.recency_horizon,
        );
        let authority_a = authority_score(&response_a.retrieved, self.authority_weights);
        let authority_b = authority_score(&response_b.retrieved, self.authority_weights);

        let mut checks = vec![
            MetricCheck::floor("SPS", None, sps, thresholds.sps),
            MetricCheck::ceiling("SPG", None, spg, thresholds.spg),
            MetricCheck::ceiling("BLF", None, blf_gap, thresholds.blf),
        ];
        if let Some(les) = les {
            checks.push(MetricCheck::floor("LES", None, les, thresholds.les));
        }
        checks.extend([
            MetricCheck::floor("RFI", None, rfi, thresholds.rfi),
            MetricCheck::count(Side::A, citations_ok_a, citations_a, thresholds.citation_min),
            MetricCheck::count(Side::B, citations_ok_b, citations_b, thresholds.citation_min),
            MetricCheck::floor("DocRecency", Some(Side::A), dri_a, thresholds.doc_recency),
            MetricCheck::floor("DocRecency", Some(Side::B), dri_b, thresholds.doc_recency),
            MetricCheck::floor("Authority", Some(Side::A), authority_a, thresholds.authority),
            MetricCheck::floor("Authority", Some(Side::B), authority_b, thresholds.authority),
        ]);
        if let (Some(ceiling), Some((toxicity_a, toxicity_b))) = (thresholds.toxicity, toxicity) {
            checks.push(MetricCheck::ceiling("Toxicity", Some(Side::A), toxicity_a, ceiling));
            checks.push(MetricCheck::ceiling("Toxicity", Some(Side::B), toxicity_b, ceiling));
        }

        let failed_checks = checks
            .iter()
            .filter(|check| !check.passed)
            .map(MetricCheck::message)
            .collect::<Vec<String>>();

        let row = ScorecardRow {
            pair_id: pair_id.to_string(),
            query_a: pair.query_a.clone(),
            query_b: pair.query_b.clone(),
            is_lang_pair: pair.is_language_pair,
            status: if failed_checks.is_empty() {
                "pass".to_string()
            } else {
                "failed".to_string()
            },
            sps,
            spg,
            blf_gap,
            blf_fraction_a: bias_lexicon_token_fraction(text_a, self.lexicon),
            blf_fraction_b: bias_lexicon_token_fraction(text_b, self.lexicon),
            les,
            rfi,
            citations_a,
            citations_b,
            dri_a,
            dri_b,
            authority_a,
            authority_b,
            toxicity_a: toxicity.map(|(value, _)| value),
            toxicity_b: toxicity.map(|(_, value)| value),
            active_year: settings.active_year,
            thresholds: *thresholds,
            failed_checks,
        };

        Ok((row, checks))
    }
}
