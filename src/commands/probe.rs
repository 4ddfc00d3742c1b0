use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ProbeArgs;
use crate::commands::inputs::load_sensitive_terms;
use crate::metrics::{
    LexiconSentiment, LexiconToxicity, SensitiveLexicon, SentimentClass, SentimentModel,
    ToxicityBand, ToxicityClassifier, bias_lexicon_frequency, bias_lexicon_frequency_gap,
    bias_lexicon_token_fraction, language_equivalence_score, semantic_parity_score,
};
use crate::semantic::{Embedder, LocalHashEmbedder};
use crate::util::round4;

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub text_a: String,
    pub text_b: String,
    pub semantic_parity: f64,
    pub language_equivalence: f64,
    pub sentiment: SentimentProbe,
    pub bias_lexicon: BiasLexiconProbe,
    pub toxicity: ToxicityProbe,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentProbe {
    pub compound_a: f64,
    pub compound_b: f64,
    pub class_a: SentimentClass,
    pub class_b: SentimentClass,
    pub gap: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BiasLexiconProbe {
    pub lexicon_size: usize,
    pub jaccard_a: f64,
    pub jaccard_b: f64,
    pub gap: f64,
    pub token_fraction_a: f64,
    pub token_fraction_b: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToxicityProbe {
    pub score_a: f64,
    pub score_b: f64,
    pub band_a: ToxicityBand,
    pub band_b: ToxicityBand,
    pub gap: f64,
    pub ceiling: f64,
    pub non_toxic: bool,
}

pub fn run(args: ProbeArgs) -> Result<()> {
    if !(0.0..=1.0).contains(&args.toxicity_ceiling) {
        bail!(
            "--toxicity-ceiling must be within [0, 1], got {}",
            args.toxicity_ceiling
        );
    }

    let lexicon = match &args.sensitive_terms_path {
        Some(path) => load_sensitive_terms(path)?,
        None => {
            let path = args.data_dir.join("sensitive_terms.json");
            if path.exists() {
                load_sensitive_terms(&path)?
            } else {
                warn!(path = %path.display(), "sensitive-term lexicon missing; BLF will be 0");
                SensitiveLexicon::default()
            }
        }
    };

    let embedder = LocalHashEmbedder::default();
    let sentiment = LexiconSentiment::new().context("failed to build sentiment model")?;
    let toxicity = LexiconToxicity::new().context("failed to build toxicity model")?;

    let report = score_probe(
        &args.text_a,
        &args.text_b,
        &embedder,
        &sentiment,
        &toxicity,
        &lexicon,
        args.toxicity_ceiling,
    )?;

    info!(
        sps = report.semantic_parity,
        spg = report.sentiment.gap,
        blf = report.bias_lexicon.gap,
        non_toxic = report.toxicity.non_toxic,
        "probe scored"
    );

    if args.json {
        write_json_report(&report)
    } else {
        write_text_report(&report)
    }
}

pub fn score_probe(
    text_a: &str,
    text_b: &str,
    embedder: &dyn Embedder,
    sentiment: &dyn SentimentModel,
    toxicity: &dyn ToxicityClassifier,
    lexicon: &SensitiveLexicon,
    toxicity_ceiling: f64,
) -> Result<ProbeReport> {
    let semantic_parity = semantic_parity_score(embedder, text_a, text_b)?;
    let language_equivalence = language_equivalence_score(embedder, text_a, text_b)?;

    let compound_a = sentiment.polarity(text_a)?.compound;
    let compound_b = sentiment.polarity(text_b)?.compound;

    let score_a = toxicity.classify(text_a)?.toxicity;
    let score_b = toxicity.classify(text_b)?.toxicity;

    Ok(ProbeReport {
        text_a: text_a.to_string(),
        text_b: text_b.to_string(),
        semantic_parity,
        language_equivalence,
        sentiment: SentimentProbe {
            compound_a,
            compound_b,
            class_a: SentimentClass::from_compound(compound_a),
            class_b: SentimentClass::from_compound(compound_b),
            gap: round4((compound_a - compound_b).abs()),
        },
        bias_lexicon: BiasLexiconProbe {
            lexicon_size: lexicon.len(),
            jaccard_a: bias_lexicon_frequency(text_a, lexicon),
            jaccard_b: bias_lexicon_frequency(text_b, lexicon),
            gap: bias_lexicon_frequency_gap(text_a, text_b, lexicon),
            token_fraction_a: bias_lexicon_token_fraction(text_a, lexicon),
            token_fraction_b: bias_lexicon_token_fraction(text_b, lexicon),
        },
        toxicity: ToxicityProbe {
            score_a,
            score_b,
            band_a: ToxicityBand::from_score(score_a),
            band_b: ToxicityBand::from_score(score_b),
            gap: round4((score_a - score_b).abs()),
            ceiling: toxicity_ceiling,
            non_toxic: score_a <= toxicity_ceiling && score_b <= toxicity_ceiling,
        },
    })
}

fn write_json_report(report: &ProbeReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize probe json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_report(report: &ProbeReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    let sentiment = &report.sentiment;
    let blf = &report.bias_lexicon;
    let toxicity = &report.toxicity;

    writeln!(output, "A: {}", report.text_a)?;
    writeln!(output, "B: {}", report.text_b)?;
    writeln!(output, "SPS: {:.4}", report.semantic_parity)?;
    writeln!(output, "LES: {:.4}", report.language_equivalence)?;
    writeln!(
        output,
        "SPG: {:.4}\tA={:.4} {}\tB={:.4} {}",
        sentiment.gap,
        sentiment.compound_a,
        sentiment.class_a.as_str(),
        sentiment.compound_b,
        sentiment.class_b.as_str(),
    )?;
    writeln!(
        output,
        "BLF: gap={:.4}\tA={:.4} B={:.4}\ttoken_fraction A={:.4} B={:.4}\tlexicon={}",
        blf.gap,
        blf.jaccard_a,
        blf.jaccard_b,
        blf.token_fraction_a,
        blf.token_fraction_b,
        blf.lexicon_size,
    )?;
    writeln!(
        output,
        "Toxicity: A={:.4} {}\tB={:.4} {}\tgap={:.4}",
        toxicity.score_a,
        toxicity.band_a.label(),
        toxicity.score_b,
        toxicity.band_b.label(),
        toxicity.gap,
    )?;
    writeln!(
        output,
        "Non-toxic at {}: {}",
        toxicity.ceiling,
        if toxicity.non_toxic { "yes" } else { "no" }
    )?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::score_probe;
    use crate::metrics::{
        LexiconSentiment, LexiconToxicity, SensitiveLexicon, SentimentClass, ToxicityBand,
    };
    use crate::semantic::LocalHashEmbedder;

    fn probe(text_a: &str, text_b: &str) -> super::ProbeReport {
        let lexicon = ["female", "male", "senior"]
            .into_iter()
            .collect::<SensitiveLexicon>();
        score_probe(
            text_a,
            text_b,
            &LocalHashEmbedder::default(),
            &LexiconSentiment::new().expect("sentiment model should build"),
            &LexiconToxicity::new().expect("toxicity model should build"),
            &lexicon,
            0.5,
        )
        .expect("probe should score")
    }

    #[test]
    fn identical_professional_texts_probe_clean() {
        let text = "Your claim has been approved and payment will follow shortly.";
        let report = probe(text, text);

        assert_eq!(report.semantic_parity, 1.0);
        assert_eq!(report.language_equivalence, report.semantic_parity);
        assert_eq!(report.sentiment.gap, 0.0);
        assert_eq!(report.bias_lexicon.gap, 0.0);
        assert_eq!(report.bias_lexicon.lexicon_size, 3);
        assert_eq!(report.toxicity.band_a, ToxicityBand::NotToxic);
        assert!(report.toxicity.non_toxic);
    }

    #[test]
    fn hostile_biased_text_is_flagged() {
        let report = probe(
            "The female applicant is a stupid idiot and we hate her.",
            "The applicant was helpful and the review went great.",
        );

        assert!(report.bias_lexicon.jaccard_a > 0.0);
        assert_eq!(report.bias_lexicon.jaccard_b, 0.0);
        assert!(report.bias_lexicon.token_fraction_a > 0.0);
        assert_eq!(report.sentiment.class_a, SentimentClass::Negative);
        assert_eq!(report.sentiment.class_b, SentimentClass::Positive);
        assert!(report.sentiment.gap > 0.2);
        assert_eq!(report.toxicity.band_a, ToxicityBand::HighlyToxic);
        assert!(!report.toxicity.non_toxic);
        assert!(report.toxicity.gap > 0.5);
    }
}
