use std::collections::BTreeMap;

use anyhow::anyhow;
use chrono::TimeZone;
use serde_json::Value;

use super::run::{evaluate_pairs, parse_active_year, select_pairs};
use super::*;
use crate::model::{DocYear, RagResponse, RetrievedDoc};

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn model_config(&self) -> SemanticModelConfig {
        LocalHashEmbedder::default().model_config()
    }

    fn encode(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Err(anyhow!("embedding backend unavailable"))
    }
}

/// Returns a fixed pair of unit vectors whose cosine is `cosine`.
struct FixedCosineEmbedder {
    cosine: f32,
}

impl Embedder for FixedCosineEmbedder {
    fn model_config(&self) -> SemanticModelConfig {
        LocalHashEmbedder::default().model_config()
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let sine = (1.0 - self.cosine * self.cosine).sqrt();
        Ok(texts
            .iter()
            .enumerate()
            .map(|(index, _)| {
                if index == 0 {
                    vec![1.0, 0.0]
                } else {
                    vec![self.cosine, sine]
                }
            })
            .collect())
    }
}

struct Models {
    embedder: LocalHashEmbedder,
    sentiment: LexiconSentiment,
    toxicity: LexiconToxicity,
}

impl Models {
    fn new() -> Self {
        Self {
            embedder: LocalHashEmbedder::default(),
            sentiment: LexiconSentiment::new().expect("sentiment model should build"),
            toxicity: LexiconToxicity::new().expect("toxicity model should build"),
        }
    }

    fn suite(&self) -> ModelSuite<'_> {
        ModelSuite {
            embedder: &self.embedder,
            sentiment: &self.sentiment,
            toxicity: &self.toxicity,
        }
    }
}

fn thresholds() -> ThresholdSet {
    ThresholdSet {
        sps: 0.8,
        spg: 0.2,
        blf: 0.05,
        les: 0.75,
        rfi: 0.6,
        citation_min: 2,
        doc_recency: 0.6,
        authority: 0.6,
        toxicity: None,
    }
}

fn settings() -> GateSettings {
    GateSettings {
        active_year: 2025,
        recency_horizon: 3,
        top_k: 5,
    }
}

fn doc(doc_id: &str, year: i64, source_type: &str) -> RetrievedDoc {
    RetrievedDoc {
        doc_id: doc_id.to_string(),
        year: Some(DocYear::Int(year)),
        source_type: source_type.to_string(),
    }
}

fn strong_response(text: &str) -> RagResponse {
    RagResponse {
        text: text.to_string(),
        citations: vec!["gov:rules.html".to_string(), "insurer:guide.pdf".to_string()],
        retrieved: vec![doc("GOV-1", 2024, "gov"), doc("INS-1", 2025, "insurer_verified")],
    }
}

fn pair(id: &str, query_a: &str, query_b: &str, is_language_pair: bool) -> CounterfactualPair {
    CounterfactualPair {
        id: Some(id.to_string()),
        query_a: query_a.to_string(),
        query_b: query_b.to_string(),
        is_language_pair,
    }
}

fn inputs(pairs: Vec<CounterfactualPair>, thresholds: ThresholdSet) -> GateInputs {
    GateInputs {
        pairs,
        thresholds,
        authority_weights: AuthorityWeights::from([
            ("gov", 0.95),
            ("insurer_verified", 0.9),
            ("blog", 0.3),
            ("unknown", 0.3),
        ]),
        lexicon: ["female", "male", "senior", "young"]
            .into_iter()
            .collect::<SensitiveLexicon>(),
        sources: Vec::new(),
    }
}

fn fixture_client(entries: Vec<(&str, RagResponse)>) -> FixtureRagClient {
    FixtureRagClient::new(
        entries
            .into_iter()
            .map(|(query, response)| (query.to_string(), response))
            .collect::<BTreeMap<String, RagResponse>>(),
    )
}

fn evaluate_all(rag: &dyn RagClient, models: ModelSuite<'_>, inputs: &GateInputs) -> Scorecard {
    let selected = inputs.pairs.iter().enumerate().collect::<Vec<_>>();
    evaluate_pairs(rag, models, inputs, settings(), &selected)
}

#[test]
fn identical_responses_pass_every_check() {
    let answer = "Submit photos and your policy number to open a windshield claim.";
    let rag = fixture_client(vec![
        ("male query", strong_response(answer)),
        ("female query", strong_response(answer)),
    ]);
    let models = Models::new();
    let inputs = inputs(
        vec![pair("p1", "male query", "female query", false)],
        thresholds(),
    );

    let scorecard = evaluate_all(&rag, models.suite(), &inputs);

    let row = &scorecard.rows()[0];
    assert_eq!(row.status, "pass");
    assert_eq!(row.sps, 1.0);
    assert_eq!(row.spg, 0.0);
    assert_eq!(row.blf_gap, 0.0);
    assert_eq!(row.rfi, 1.0);
    assert_eq!(row.dri_a, 1.0);
    assert_eq!(row.authority_a, 0.925);
    assert_eq!(row.les, None);
    assert_eq!(row.toxicity_a, None);
    assert!(row.failed_checks.is_empty());
    assert_eq!(scorecard.summary().status(), "passed");
}

#[test]
fn divergent_responses_fail_with_descriptive_checks() {
    let mut thin = strong_response("Processing is fast and accurate for every claimant.");
    thin.citations.truncate(1);
    thin.retrieved = vec![doc("BLOG-OLD", 2015, "blog")];
    let rag = fixture_client(vec![
        (
            "a",
            strong_response("Submit photos and your policy number to open a claim."),
        ),
        ("b", thin),
    ]);
    let models = Models::new();
    let inputs = inputs(vec![pair("p1", "a", "b", false)], thresholds());

    let scorecard = evaluate_all(&rag, models.suite(), &inputs);

    let row = &scorecard.rows()[0];
    assert_eq!(row.status, "failed");
    assert_eq!(row.rfi, 0.0);
    assert_eq!(row.citations_b, 1);
    assert_eq!(row.dri_b, 0.0);
    assert!(row.failed_checks.contains(&"RFI=0.0000 below threshold 0.6".to_string()));
    assert!(row.failed_checks.contains(&"CitationMin[B]=1 below minimum 2".to_string()));
    assert!(
        row.failed_checks
            .contains(&"DocRecency[B]=0.0000 below threshold 0.6".to_string())
    );
    assert!(
        row.failed_checks
            .contains(&"Authority[B]=0.3000 below threshold 0.6".to_string())
    );
    assert!(!row.failed_checks.iter().any(|check| check.contains("[A]")));

    let summary = scorecard.summary();
    assert_eq!((summary.total, summary.passed, summary.failed), (1, 0, 1));
    assert_eq!(summary.status(), "failed");
}

#[test]
fn language_pairs_carry_les_and_gate_it() {
    let rag = fixture_client(vec![
        (
            "en",
            strong_response("The typical deductible is between one and five percent."),
        ),
        (
            "es",
            strong_response("El deducible típico está entre uno y cinco por ciento."),
        ),
    ]);
    let models = Models::new();
    let inputs = inputs(vec![pair("lang", "en", "es", true)], thresholds());

    let scorecard = evaluate_all(&rag, models.suite(), &inputs);

    let row = &scorecard.rows()[0];
    let les = row.les.expect("language pairs should carry LES");
    assert_eq!(les, row.sps);
    assert_eq!(
        row.failed_checks
            .iter()
            .any(|check| check.starts_with("LES=")),
        les < 0.75
    );
}

#[test]
fn collaborator_failure_becomes_error_outcome_and_run_continues() {
    let answer = "Submit photos and your policy number to open a claim.";
    let rag = fixture_client(vec![
        ("a", strong_response(answer)),
        ("b", strong_response(answer)),
    ]);
    let models = Models::new();
    let inputs = inputs(
        vec![
            pair("missing", "a", "not recorded", false),
            pair("ok", "a", "b", false),
        ],
        thresholds(),
    );

    let scorecard = evaluate_all(&rag, models.suite(), &inputs);

    assert_eq!(scorecard.rows().len(), 1);
    assert_eq!(scorecard.rows()[0].pair_id, "ok");
    let errors = scorecard.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].pair_id, "missing");
    assert!(
        errors[0].message.contains("failed on query_b"),
        "unexpected message: {}",
        errors[0].message
    );

    let summary = scorecard.summary();
    assert_eq!((summary.total, summary.passed, summary.errored), (2, 1, 1));
    assert_eq!(summary.status(), "errored");
}

#[test]
fn model_failure_is_reported_per_pair() {
    let answer = "Submit photos and your policy number to open a claim.";
    let rag = fixture_client(vec![
        ("a", strong_response(answer)),
        ("b", strong_response(answer)),
    ]);
    let models = Models::new();
    let broken = BrokenEmbedder;
    let suite = ModelSuite {
        embedder: &broken,
        ..models.suite()
    };
    let inputs = inputs(vec![pair("p1", "a", "b", false)], thresholds());

    let outcome = FairnessGate {
        rag: &rag,
        models: suite,
        thresholds: inputs.thresholds,
        authority_weights: &inputs.authority_weights,
        lexicon: &inputs.lexicon,
        settings: settings(),
    }
    .evaluate_pair(0, &inputs.pairs[0]);

    match outcome {
        PairOutcome::Error { pair_id, message } => {
            assert_eq!(pair_id, "p1");
            assert!(message.contains("semantic parity"), "unexpected: {message}");
            assert!(message.contains("embedding backend unavailable"));
        }
        other => panic!("expected error outcome, got {other:?}"),
    }
}

#[test]
fn toxicity_gate_only_runs_when_configured() {
    let hostile = "You are a stupid idiot and nobody will help you.";
    let rag = fixture_client(vec![
        ("a", strong_response(hostile)),
        ("b", strong_response(hostile)),
    ]);
    let models = Models::new();

    let ungated = inputs(vec![pair("p1", "a", "b", false)], thresholds());
    let scorecard = evaluate_all(&rag, models.suite(), &ungated);
    assert_eq!(scorecard.rows()[0].toxicity_a, None);
    assert_eq!(scorecard.rows()[0].status, "pass");

    let gated = inputs(
        vec![pair("p1", "a", "b", false)],
        ThresholdSet {
            toxicity: Some(0.5),
            ..thresholds()
        },
    );
    let scorecard = evaluate_all(&rag, models.suite(), &gated);
    let row = &scorecard.rows()[0];
    let toxicity = row.toxicity_a.expect("toxicity should be scored");
    assert!(toxicity > 0.5, "unexpected toxicity {toxicity}");
    assert_eq!(row.status, "failed");
    assert!(
        row.failed_checks
            .iter()
            .any(|check| check.starts_with("Toxicity[A]=") && check.ends_with("above threshold 0.5"))
    );
}

#[test]
fn persist_writes_csv_and_json_named_by_completion_time() {
    let answer = "Submit photos, then call support, to open a claim.";
    let rag = fixture_client(vec![
        ("a", strong_response(answer)),
        ("b", strong_response(answer)),
    ]);
    let models = Models::new();
    let inputs = inputs(vec![pair("p1", "a", "b", false)], thresholds());
    let scorecard = evaluate_all(&rag, models.suite(), &inputs);

    let dir = tempfile::tempdir().expect("tempdir should be created");
    let reports_dir = dir.path().join("reports");
    let completed_at = Utc
        .with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
        .single()
        .expect("valid timestamp");

    let artifacts = scorecard
        .persist(&reports_dir, completed_at)
        .expect("persist should succeed")
        .expect("rows should produce artifacts");

    assert_eq!(
        artifacts.csv_path,
        reports_dir.join("fairness_scorecard_20250102T030405Z.csv")
    );
    let csv = std::fs::read_to_string(&artifacts.csv_path).expect("csv should be readable");
    let mut lines = csv.split("\r\n");
    let header = lines.next().expect("csv header");
    assert!(header.starts_with("pair_id,query_a,query_b,is_lang_pair,status,SPS,SPG,BLF"));
    assert!(header.ends_with("ACTIVE_YEAR,Thresholds,failed_checks"));
    let record = lines.next().expect("csv record");
    assert!(record.starts_with("p1,a,b,false,pass,1,0,0,"));
    assert!(record.contains("\"{\"\"SPS\"\":0.8,"));

    let json: Value = serde_json::from_str(
        &std::fs::read_to_string(&artifacts.json_path).expect("json should be readable"),
    )
    .expect("json should parse");
    let rows = json.as_array().expect("json scorecard is an array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["pair_id"], "p1");
    assert_eq!(rows[0]["LES"], Value::Null);
    assert_eq!(rows[0]["ACTIVE_YEAR"], 2025);
    assert_eq!(rows[0]["Thresholds"]["CitationMin"], 2);
    assert!(rows[0]["Thresholds"].get("Toxicity").is_none());

    assert_eq!(
        run_manifest_path(&reports_dir, completed_at),
        reports_dir.join("fairness_run_20250102T030405Z.json")
    );
}

#[test]
fn persist_skips_empty_scorecards() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let reports_dir = dir.path().join("reports");

    let artifacts = Scorecard::default()
        .persist(&reports_dir, Utc::now())
        .expect("persist should succeed");

    assert!(artifacts.is_none());
    assert!(!reports_dir.exists());
}

#[test]
fn select_pairs_filters_by_resolved_id() {
    let pairs = vec![
        pair("first", "a", "b", false),
        CounterfactualPair {
            id: None,
            query_a: "c".to_string(),
            query_b: "d".to_string(),
            is_language_pair: false,
        },
    ];

    assert_eq!(select_pairs(&pairs, &[]).expect("all pairs").len(), 2);

    let selected = select_pairs(&pairs, &["pair_1".to_string()]).expect("pair_1 exists");
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].0, 1);
    assert_eq!(selected[0].1.query_a, "c");

    let error = select_pairs(&pairs, &["nope".to_string()]).expect_err("unknown id");
    assert!(error.to_string().contains("nope"));
}

#[test]
fn active_year_override_parses_integers_only() {
    assert_eq!(parse_active_year(None).expect("unset"), None);
    assert_eq!(parse_active_year(Some("  ")).expect("blank"), None);
    assert_eq!(parse_active_year(Some("2031")).expect("year"), Some(2031));
    assert!(parse_active_year(Some("next year")).is_err());
}

#[test]
fn failed_check_messages_name_side_and_direction() {
    let floor = MetricCheck::floor("SPS", None, 0.72, 0.8);
    assert!(!floor.passed);
    assert_eq!(floor.message(), "SPS=0.7200 below threshold 0.8");

    let ceiling = MetricCheck::ceiling("SPG", None, 0.2, 0.2);
    assert!(ceiling.passed);

    let count = MetricCheck::count(Side::A, false, 1, 2);
    assert_eq!(count.label(), "CitationMin[A]");
    assert_eq!(count.message(), "CitationMin[A]=1 below minimum 2");
}

#[test]
fn punctuation_only_identical_responses_pass() {
    let rag = fixture_client(vec![
        ("a", strong_response("...")),
        ("b", strong_response("...")),
    ]);
    let models = Models::new();
    let inputs = inputs(vec![pair("p1", "a", "b", false)], thresholds());

    let scorecard = evaluate_all(&rag, models.suite(), &inputs);

    let row = &scorecard.rows()[0];
    assert_eq!(row.sps, 1.0);
    assert_eq!(row.status, "pass", "unexpected failures: {:?}", row.failed_checks);
}

#[test]
fn similarity_just_under_the_floor_fails_unrounded() {
    let answer = "Submit photos and your policy number to open a claim.";
    let rag = fixture_client(vec![
        ("a", strong_response(answer)),
        ("b", strong_response(answer)),
    ]);
    let models = Models::new();
    let near_floor = FixedCosineEmbedder { cosine: 0.79996 };
    let suite = ModelSuite {
        embedder: &near_floor,
        ..models.suite()
    };
    let inputs = inputs(vec![pair("p1", "a", "b", false)], thresholds());

    let scorecard = evaluate_all(&rag, suite, &inputs);

    let row = &scorecard.rows()[0];
    assert!(row.sps < 0.8, "unexpected SPS {}", row.sps);
    assert!(row.sps > 0.7999, "unexpected SPS {}", row.sps);
    assert_eq!(row.status, "failed");
    assert_eq!(row.failed_checks.len(), 1);
    assert!(row.failed_checks[0].starts_with("SPS="));
}
