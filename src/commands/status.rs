use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::evaluate::scorecard_file_prefix;
use crate::commands::inputs::load_gate_inputs;
use crate::util::{now_utc_string, read_json};

#[derive(Debug, Deserialize)]
struct StoredRow {
    status: String,
}

#[derive(Debug)]
struct ScorecardListing {
    stamp: String,
    path: PathBuf,
}

pub fn run(args: StatusArgs) -> Result<()> {
    info!(
        data_dir = %args.inputs.data_dir.display(),
        reports_dir = %args.reports_dir.display(),
        checked_at = %now_utc_string(),
        "status requested"
    );

    let inputs = load_gate_inputs(&args.inputs)?;
    let language_pairs = inputs
        .pairs
        .iter()
        .filter(|pair| pair.is_language_pair)
        .count();
    info!(
        pairs = inputs.pairs.len(),
        language_pairs,
        sensitive_terms = inputs.lexicon.len(),
        authority_weights = inputs.authority_weights.len(),
        toxicity_gate = inputs.thresholds.toxicity.is_some(),
        "inputs valid"
    );
    for source in &inputs.sources {
        info!(kind = %source.kind, path = %source.path, sha256 = %source.sha256, "input");
    }

    if !args.reports_dir.exists() {
        warn!(path = %args.reports_dir.display(), "reports directory missing");
        return Ok(());
    }

    let listings = list_scorecards(&args.reports_dir)?;
    if listings.is_empty() {
        warn!(path = %args.reports_dir.display(), "no scorecards found");
        return Ok(());
    }

    info!(scorecards = listings.len(), "scorecards found");
    for listing in listings.iter().take(args.recent) {
        match read_json::<Vec<StoredRow>>(&listing.path) {
            Ok(rows) => {
                let failed = rows.iter().filter(|row| row.status != "pass").count();
                info!(
                    stamp = %listing.stamp,
                    path = %listing.path.display(),
                    rows = rows.len(),
                    failed,
                    "scorecard"
                );
            }
            Err(err) => warn!(
                path = %listing.path.display(),
                error = %format!("{err:#}"),
                "unreadable scorecard"
            ),
        }
    }

    Ok(())
}

/// Structured scorecards in `reports_dir`, newest first.
fn list_scorecards(reports_dir: &Path) -> Result<Vec<ScorecardListing>> {
    let pattern = Regex::new(&format!(
        r"^{}(\d{{8}}T\d{{6}}Z)\.json$",
        regex::escape(scorecard_file_prefix())
    ))
    .context("failed to compile scorecard filename pattern")?;

    let entries = fs::read_dir(reports_dir)
        .with_context(|| format!("failed to read {}", reports_dir.display()))?;

    let mut listings = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", reports_dir.display()))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if let Some(captures) = pattern.captures(name) {
            listings.push(ScorecardListing {
                stamp: captures[1].to_string(),
                path: entry.path(),
            });
        }
    }

    listings.sort_by(|left, right| right.stamp.cmp(&left.stamp));
    Ok(listings)
}
