use super::*;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let started_at = Utc::now();
    let inputs = load_gate_inputs(&args.inputs)?;
    let settings = resolve_gate_settings(&args)?;
    let selected = select_pairs(&inputs.pairs, &args.pair_ids)?;

    let rag: Box<dyn RagClient> = match &args.rag_fixtures {
        Some(path) => {
            let client = FixtureRagClient::load(path)?;
            info!(path = %path.display(), responses = client.len(), "loaded RAG fixtures");
            Box::new(client)
        }
        None => Box::new(SampleRagClient),
    };
    let embedder = LocalHashEmbedder::default();
    let sentiment = LexiconSentiment::new().context("failed to build sentiment model")?;
    let toxicity = LexiconToxicity::new().context("failed to build toxicity model")?;
    let models = ModelSuite {
        embedder: &embedder,
        sentiment: &sentiment,
        toxicity: &toxicity,
    };

    info!(
        pairs = selected.len(),
        rag_client = rag.name(),
        active_year = settings.active_year,
        recency_horizon = settings.recency_horizon,
        top_k = settings.top_k,
        "fairness gate started"
    );

    let scorecard = evaluate_pairs(rag.as_ref(), models, &inputs, settings, &selected);
    let completed_at = Utc::now();
    let summary = scorecard.summary();

    match scorecard.persist(&args.reports_dir, completed_at)? {
        Some(artifacts) => {
            let manifest_path = run_manifest_path(&args.reports_dir, completed_at);
            let manifest = FairnessRunManifest {
                manifest_version: 1,
                run_id: format!("fairness-{}", utc_compact_string(completed_at)),
                started_at: utc_string(started_at),
                completed_at: utc_string(completed_at),
                status: summary.status().to_string(),
                rag_client: rag.name().to_string(),
                embedding_model: embedder.model_config(),
                active_year: settings.active_year,
                recency_horizon: settings.recency_horizon,
                top_k: settings.top_k,
                thresholds: inputs.thresholds,
                summary,
                errors: scorecard.errors().to_vec(),
                inputs: inputs.sources.clone(),
                scorecard_csv: artifacts.csv_path.display().to_string(),
                scorecard_json: artifacts.json_path.display().to_string(),
            };
            write_json_pretty(&manifest_path, &manifest)?;

            info!(
                csv_path = %artifacts.csv_path.display(),
                json_path = %artifacts.json_path.display(),
                manifest_path = %manifest_path.display(),
                "wrote fairness scorecard"
            );
        }
        None => warn!(
            reports_dir = %args.reports_dir.display(),
            "no scorecard rows produced; nothing written"
        ),
    }

    info!(
        total = summary.total,
        rows = scorecard.rows().len(),
        passed = summary.passed,
        failed = summary.failed,
        errored = summary.errored,
        status = summary.status(),
        "fairness gate completed"
    );

    if !args.report_only && (summary.failed > 0 || summary.errored > 0) {
        bail!(
            "fairness gate {}: {} failed and {} errored of {} pairs",
            summary.status(),
            summary.failed,
            summary.errored,
            summary.total
        );
    }

    Ok(())
}

pub(super) fn evaluate_pairs(
    rag: &dyn RagClient,
    models: ModelSuite<'_>,
    inputs: &GateInputs,
    settings: GateSettings,
    selected: &[(usize, &CounterfactualPair)],
) -> Scorecard {
    let gate = FairnessGate {
        rag,
        models,
        thresholds: inputs.thresholds,
        authority_weights: &inputs.authority_weights,
        lexicon: &inputs.lexicon,
        settings,
    };

    let mut scorecard = Scorecard::default();
    for (index, pair) in selected {
        let outcome = gate.evaluate_pair(*index, pair);
        log_outcome(&outcome);
        scorecard.record(outcome);
    }
    scorecard
}

fn log_outcome(outcome: &PairOutcome) {
    match outcome {
        PairOutcome::Evaluated { row, checks } if row.status == "pass" => info!(
            pair_id = %row.pair_id,
            checks = checks.len(),
            sps = row.sps,
            rfi = row.rfi,
            "pair passed"
        ),
        PairOutcome::Evaluated { row, checks } => {
            for check in checks.iter().filter(|check| !check.passed) {
                warn!(
                    pair_id = %row.pair_id,
                    metric = %check.label(),
                    value = check.value,
                    threshold = check.threshold,
                    "{}",
                    check.message()
                );
            }
            warn!(
                pair_id = %row.pair_id,
                failed_checks = row.failed_checks.len(),
                "pair failed fairness gate"
            );
        }
        PairOutcome::Error { pair_id, message } => warn!(
            pair_id = %pair_id,
            error = %message,
            "pair evaluation errored"
        ),
    }
}

fn resolve_gate_settings(args: &EvaluateArgs) -> Result<GateSettings> {
    if args.top_k == 0 {
        bail!("--top-k must be at least 1");
    }
    if args.recency_horizon < 0 {
        bail!("--recency-horizon must not be negative");
    }

    let active_year = match args.active_year {
        Some(year) => year,
        None => match parse_active_year(std::env::var(ACTIVE_YEAR_ENV).ok().as_deref())? {
            Some(year) => year,
            None => i64::from(Utc::now().year()),
        },
    };

    Ok(GateSettings {
        active_year,
        recency_horizon: args.recency_horizon,
        top_k: args.top_k,
    })
}

pub(super) fn parse_active_year(raw: Option<&str>) -> Result<Option<i64>> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let year = value
        .parse::<i64>()
        .with_context(|| format!("{ACTIVE_YEAR_ENV} is not an integer year: {value}"))?;
    Ok(Some(year))
}

pub(super) fn select_pairs<'a>(
    pairs: &'a [CounterfactualPair],
    pair_ids: &[String],
) -> Result<Vec<(usize, &'a CounterfactualPair)>> {
    let indexed = pairs.iter().enumerate().collect::<Vec<_>>();
    if pair_ids.is_empty() {
        return Ok(indexed);
    }

    for requested in pair_ids {
        if !indexed
            .iter()
            .any(|(index, pair)| &pair.resolved_id(*index) == requested)
        {
            bail!("unknown pair id requested: {requested}");
        }
    }

    Ok(indexed
        .into_iter()
        .filter(|(index, pair)| pair_ids.contains(&pair.resolved_id(*index)))
        .collect())
}
