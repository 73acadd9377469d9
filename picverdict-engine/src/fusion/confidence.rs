//! Confidence Calibrator
//!
//! **[PV-FUS-040]** Converts the margin between the winning and runner-up
//! accumulators into a High/Medium/Low grade, then adjusts the grade using
//! corroboration from the two hardest-to-fake signals (CFA, GAN).
//!
//! The pre-2015 downgrade from the verdict resolver is applied here
//! redundantly, keyed on the triple's nominal maximum rather than the
//! already-overridden verdict, so the calibrator stays consistent even
//! when invoked on its own.

use crate::fusion::ScoreTriple;
use crate::provenance::Provenance;
use crate::records::{CfaEvidence, GanEvidence};
use crate::report::{ConfidenceGrade, Verdict};

/// Gap-ratio thresholds for old images (more lenient: decades of
/// compression flatten every signal)
const OLD_HIGH_THRESHOLD: f64 = 0.15;
const OLD_MEDIUM_THRESHOLD: f64 = 0.08;

/// Gap-ratio thresholds for contemporary images
const STD_HIGH_THRESHOLD: f64 = 0.25;
const STD_MEDIUM_THRESHOLD: f64 = 0.12;

/// Calibration output. The verdict is passed through unchanged except for
/// the redundant pre-2015 correction, which also yields an evidence note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calibration {
    pub verdict: Verdict,
    pub confidence: ConfidenceGrade,
    pub corrective_note: Option<String>,
}

/// Grade the confidence of `verdict` given the score triple and the CFA /
/// GAN records for corroboration.
pub fn calibrate(
    scores: &ScoreTriple,
    verdict: Verdict,
    provenance: &Provenance,
    cfa: &CfaEvidence,
    gan: &GanEvidence,
) -> Calibration {
    let gap_ratio = scores.gap_ratio();

    let (high, medium) = if provenance.is_old_image {
        (OLD_HIGH_THRESHOLD, OLD_MEDIUM_THRESHOLD)
    } else {
        (STD_HIGH_THRESHOLD, STD_MEDIUM_THRESHOLD)
    };

    let mut confidence = if gap_ratio > high {
        ConfidenceGrade::High
    } else if gap_ratio > medium {
        ConfidenceGrade::Medium
    } else {
        ConfidenceGrade::Low
    };

    let mut verdict = verdict;
    let mut corrective_note = None;

    match verdict {
        Verdict::LikelyReal => {
            if provenance.is_old_image {
                // Old images get the benefit of the doubt
                if confidence == ConfidenceGrade::Low {
                    confidence = ConfidenceGrade::Medium;
                }
                // A triple that nominally favored AI generation was only
                // rescued by the age override; cap the grade at Medium.
                if provenance.predates_generative_models()
                    && scores.nominal_max() == Verdict::AiGenerated
                {
                    confidence = ConfidenceGrade::Medium;
                }
            } else if cfa.cfa_pattern_detected {
                if confidence == ConfidenceGrade::Medium {
                    confidence = ConfidenceGrade::High;
                }
            } else if confidence == ConfidenceGrade::High {
                // No CFA: a real-photo call cannot be high confidence
                confidence = ConfidenceGrade::Medium;
            }
        }
        Verdict::AiGenerated => {
            if !cfa.cfa_pattern_detected && gan.gan_signature_detected {
                if confidence == ConfidenceGrade::Medium {
                    confidence = ConfidenceGrade::High;
                }
            }
            if provenance.predates_generative_models() {
                verdict = Verdict::LikelyReal;
                confidence = ConfidenceGrade::Medium;
                corrective_note =
                    Some("✓✓ Corrected: Image too old to be AI-generated".to_string());
            }
        }
        Verdict::AiEdited => {}
    }

    Calibration {
        verdict,
        confidence,
        corrective_note,
    }
}
