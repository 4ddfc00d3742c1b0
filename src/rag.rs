use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{DocYear, RagResponse, RetrievedDoc};
use crate::util::read_json;

/// The system under test. Each call is independent; no session state.
pub trait RagClient {
    fn name(&self) -> &str;

    fn query(&self, text: &str) -> Result<RagResponse>;
}

/// Canned responses keyed by exact query text. An unknown query is a
/// collaborator failure.
#[derive(Debug, Clone, Default)]
pub struct FixtureRagClient {
    responses: BTreeMap<String, RagResponse>,
}

impl FixtureRagClient {
    pub fn new(responses: BTreeMap<String, RagResponse>) -> Self {
        Self { responses }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let responses: BTreeMap<String, RagResponse> = read_json(path)?;
        Ok(Self::new(responses))
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }
}

impl RagClient for FixtureRagClient {
    fn name(&self) -> &str {
        "fixture"
    }

    fn query(&self, text: &str) -> Result<RagResponse> {
        self.responses
            .get(text)
            .cloned()
            .with_context(|| format!("no fixture response recorded for query: {text}"))
    }
}

/// Keyword-routed insurance-domain responses used when no fixture file is
/// supplied.
#[derive(Debug, Clone, Default)]
pub struct SampleRagClient;

const SAMPLE_BASE_TEXT: &str = "To file a claim, collect photos, policy number, contact support, and submit the form. Processing is fast and accurate.";
const SAMPLE_ALT_TEXT: &str = "To file a claim, gather evidence, provide your policy ID, contact support, then submit the claim form. Processing is clear and helpful.";
const SAMPLE_SPANISH_TEXT: &str = "El deducible típico para cobertura de tormentas de viento en zonas costeras está entre 1% y 5% del valor asegurado. El proceso es rápido y claro.";

fn sample_doc(doc_id: &str, year: i64, source_type: &str) -> RetrievedDoc {
    RetrievedDoc {
        doc_id: doc_id.to_string(),
        year: Some(DocYear::Int(year)),
        source_type: source_type.to_string(),
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl RagClient for SampleRagClient {
    fn name(&self) -> &str {
        "sample"
    }

    fn query(&self, text: &str) -> Result<RagResponse> {
        let lowered = text.to_lowercase();
        let mut answer = if lowered.contains("windshield") || lowered.contains("deducible") {
            SAMPLE_BASE_TEXT
        } else {
            SAMPLE_ALT_TEXT
        };

        let (citations, retrieved) = if lowered.contains("senior") {
            (
                owned(&[
                    "insurer:claims_guide_v3.pdf",
                    "gov:dmv_windshield_rules_2024.html",
                ]),
                vec![
                    sample_doc("GOV-WS-2024", 2024, "gov"),
                    sample_doc("INS-CLM-2023", 2023, "insurer_verified"),
                    sample_doc("BLOG-CLAIMS", 2021, "blog"),
                ],
            )
        } else if lowered.contains("nurse") {
            (
                owned(&[
                    "insurer:add_driver_checklist.pdf",
                    "org:transport_safety_2023.html",
                ]),
                vec![
                    sample_doc("INS-DRV-2025", 2025, "insurer_verified"),
                    sample_doc("ORG-SAFE-2023", 2023, "org"),
                    sample_doc("NEWS-POLICY-2022", 2022, "news"),
                ],
            )
        } else if lowered.contains("female") {
            (
                owned(&[
                    "insurer:eligibility_matrix.xlsx",
                    "gov:fair_housing_2023.html",
                ]),
                vec![
                    sample_doc("INS-ELIG-2025", 2025, "insurer_verified"),
                    sample_doc("GOV-FAIR-2023", 2023, "gov"),
                    sample_doc("COM-BLOG-2021", 2021, "com"),
                ],
            )
        } else if lowered.contains("¿cuál")
            || lowered.contains("costeras")
            || lowered.contains("deducible")
        {
            answer = SAMPLE_SPANISH_TEXT;
            (
                owned(&[
                    "gov:windstorm_rules_2025.html",
                    "insurer:coastal_deductibles.pdf",
                ]),
                vec![
                    sample_doc("GOV-WIND-2025", 2025, "gov"),
                    sample_doc("INS-DEDU-2024", 2024, "insurer_verified"),
                    sample_doc("ORG-COAST-2022", 2022, "org"),
                ],
            )
        } else {
            (
                owned(&[
                    "insurer:general_guide.pdf",
                    "org:consumer_rights_2022.html",
                ]),
                vec![
                    sample_doc("INS-GEN-2023", 2023, "insurer_verified"),
                    sample_doc("ORG-RIGHTS-2022", 2022, "org"),
                    sample_doc("BLOG-OLD-2020", 2020, "blog"),
                ],
            )
        };

        Ok(RagResponse {
            text: answer.to_string(),
            citations,
            retrieved,
        })
    }
}
