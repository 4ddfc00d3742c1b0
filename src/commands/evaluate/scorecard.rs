use super::*;

const CSV_COLUMNS: [&str; 23] = [
    "pair_id",
    "query_a",
    "query_b",
    "is_lang_pair",
    "status",
    "SPS",
    "SPG",
    "BLF",
    "BLF_fraction_A",
    "BLF_fraction_B",
    "LES",
    "RFI",
    "Citations_A",
    "Citations_B",
    "DRI_A",
    "DRI_B",
    "Authority_A",
    "Authority_B",
    "Toxicity_A",
    "Toxicity_B",
    "ACTIVE_YEAR",
    "Thresholds",
    "failed_checks",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairError {
    pub pair_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScorecardSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl ScorecardSummary {
    pub fn status(&self) -> &'static str {
        if self.errored > 0 {
            "errored"
        } else if self.failed > 0 {
            "failed"
        } else {
            "passed"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorecardArtifacts {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
}

/// Run-scoped, append-only accumulator. Nothing is written until
/// [`Scorecard::persist`].
#[derive(Debug, Default)]
pub struct Scorecard {
    rows: Vec<ScorecardRow>,
    errors: Vec<PairError>,
}

impl Scorecard {
    pub fn record(&mut self, outcome: PairOutcome) {
        match outcome {
            PairOutcome::Evaluated { row, .. } => self.rows.push(row),
            PairOutcome::Error { pair_id, message } => {
                self.errors.push(PairError { pair_id, message })
            }
        }
    }

    pub fn rows(&self) -> &[ScorecardRow] {
        &self.rows
    }

    pub fn errors(&self) -> &[PairError] {
        &self.errors
    }

    pub fn summary(&self) -> ScorecardSummary {
        let passed = self.rows.iter().filter(|row| row.status == "pass").count();
        ScorecardSummary {
            total: self.rows.len() + self.errors.len(),
            passed,
            failed: self.rows.len() - passed,
            errored: self.errors.len(),
        }
    }

    /// Writes the tabular and structured scorecards named by `completed_at`.
    /// Returns `None` without touching the filesystem when no rows exist.
    pub fn persist(
        &self,
        reports_dir: &Path,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<ScorecardArtifacts>> {
        if self.rows.is_empty() {
            return Ok(None);
        }

        let stamp = utc_compact_string(completed_at);
        let csv_path = reports_dir.join(format!("{SCORECARD_PREFIX}{stamp}.csv"));
        let json_path = reports_dir.join(format!("{SCORECARD_PREFIX}{stamp}.json"));

        let header = CSV_COLUMNS
            .iter()
            .map(|column| column.to_string())
            .collect::<Vec<String>>();
        let records = self
            .rows
            .iter()
            .map(csv_record)
            .collect::<Result<Vec<Vec<String>>>>()?;

        write_csv(&csv_path, &header, &records)?;
        write_json_pretty(&json_path, &self.rows)?;

        Ok(Some(ScorecardArtifacts {
            csv_path,
            json_path,
        }))
    }
}

fn csv_record(row: &ScorecardRow) -> Result<Vec<String>> {
    let thresholds = serde_json::to_string(&row.thresholds)
        .with_context(|| format!("failed to serialize thresholds for {}", row.pair_id))?;
    let optional = |value: Option<f64>| value.map(|value| value.to_string()).unwrap_or_default();

    Ok(vec![
        row.pair_id.clone(),
        row.query_a.clone(),
        row.query_b.clone(),
        row.is_lang_pair.to_string(),
        row.status.clone(),
        row.sps.to_string(),
        row.spg.to_string(),
        row.blf_gap.to_string(),
        row.blf_fraction_a.to_string(),
        row.blf_fraction_b.to_string(),
        optional(row.les),
        row.rfi.to_string(),
        row.citations_a.to_string(),
        row.citations_b.to_string(),
        row.dri_a.to_string(),
        row.dri_b.to_string(),
        row.authority_a.to_string(),
        row.authority_b.to_string(),
        optional(row.toxicity_a),
        optional(row.toxicity_b),
        row.active_year.to_string(),
        thresholds,
        row.failed_checks.join("; "),
    ])
}

/// Audit manifest written next to the scorecards.
#[derive(Debug, Serialize)]
pub struct FairnessRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub status: String,
    pub rag_client: String,
    pub embedding_model: SemanticModelConfig,
    pub active_year: i64,
    pub recency_horizon: i64,
    pub top_k: usize,
    pub thresholds: ThresholdSet,
    pub summary: ScorecardSummary,
    pub errors: Vec<PairError>,
    pub inputs: Vec<InputSource>,
    pub scorecard_csv: String,
    pub scorecard_json: String,
}

pub fn run_manifest_path(reports_dir: &Path, completed_at: DateTime<Utc>) -> PathBuf {
    reports_dir.join(format!(
        "{RUN_MANIFEST_PREFIX}{}.json",
        utc_compact_string(completed_at)
    ))
}
