//! Evidence Fusion Engine
//!
//! **[PV-FUS-001]** Turns eleven heterogeneous evidence records into one
//! calibrated verdict. Pipeline, strictly one way:
//!
//! records -> provenance -> weight profile -> aggregation -> score triple
//! -> verdict resolution -> confidence calibration -> [`AnalysisReport`]
//!
//! The whole engine is a pure function of the evidence bundle: identical
//! records always produce an identical report.

pub mod aggregator;
pub mod confidence;
pub mod verdict;
pub mod weights;

pub use aggregator::{aggregate, AggregationOutput};
pub use confidence::{calibrate, Calibration};
pub use verdict::{resolve, ResolvedVerdict};
pub use weights::WeightProfile;

use crate::provenance::Provenance;
use crate::records::EvidenceBundle;
use crate::report::{AnalysisReport, Probabilities, RawScores, Verdict};
use serde::{Deserialize, Serialize};

/// The three fusion accumulators. Add-only during aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTriple {
    pub ai_generated: f64,
    pub ai_edited: f64,
    pub real_photo: f64,
}

impl ScoreTriple {
    /// Fixed substitute for an all-zero triple (keeps downstream division
    /// well-defined and yields the documented 20/30/50 split)
    pub const FALLBACK: ScoreTriple = ScoreTriple {
        ai_generated: 20.0,
        ai_edited: 30.0,
        real_photo: 50.0,
    };

    pub fn total(&self) -> f64 {
        self.ai_generated + self.ai_edited + self.real_photo
    }

    /// Replace an all-zero triple with [`Self::FALLBACK`]
    pub fn or_fallback(self) -> Self {
        if self.total() == 0.0 {
            Self::FALLBACK
        } else {
            self
        }
    }

    /// Category holding the largest accumulator, with the fixed tie
    /// precedence ai_generated > ai_edited > real_photo
    pub fn nominal_max(&self) -> Verdict {
        if self.ai_generated >= self.ai_edited && self.ai_generated >= self.real_photo {
            Verdict::AiGenerated
        } else if self.ai_edited >= self.real_photo {
            Verdict::AiEdited
        } else {
            Verdict::LikelyReal
        }
    }

    /// Margin between winner and runner-up, as a fraction of the total
    pub fn gap_ratio(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let mut sorted = [self.ai_generated, self.ai_edited, self.real_photo];
        sorted.sort_by(|a, b| a.total_cmp(b));
        (sorted[2] - sorted[1]) / total
    }

    /// Percentage breakdown, each value independently rounded to two
    /// decimals (the sum may drift slightly from 100; accepted, not fixed)
    pub fn percentages(&self) -> Probabilities {
        let total = self.total();
        Probabilities {
            ai_generated: round2(self.ai_generated / total * 100.0),
            ai_edited: round2(self.ai_edited / total * 100.0),
            real_photo: round2(self.real_photo / total * 100.0),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Classify one image from its complete evidence bundle.
///
/// **[PV-FUS-002]** The pure fusion entry point: no I/O, no shared state,
/// deterministic for identical bundles. `source` only labels the report.
pub fn classify(bundle: &EvidenceBundle, source: impl Into<String>) -> AnalysisReport {
    let provenance = Provenance::from_metadata(&bundle.metadata);
    let profile = WeightProfile::for_provenance(&provenance);

    let AggregationOutput {
        scores,
        evidence,
        mut categorized,
    } = aggregate(bundle, &profile, &provenance);

    let scores = scores.or_fallback();
    let probabilities = scores.percentages();

    let resolved = resolve(&scores, &provenance);
    if let Some(note) = resolved.corrective_note {
        categorized.real_photo.push(note);
    }

    let calibration = calibrate(&scores, resolved.verdict, &provenance, &bundle.cfa, &bundle.gan);
    if let Some(note) = calibration.corrective_note {
        categorized.real_photo.push(note);
    }

    AnalysisReport {
        source: source.into(),
        verdict: calibration.verdict,
        confidence: calibration.confidence,
        probabilities,
        evidence,
        categorized_evidence: categorized,
        raw_scores: RawScores {
            ai_generated: round3(scores.ai_generated),
            ai_edited: round3(scores.ai_edited),
            real_photo: round3(scores.real_photo),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_triple_falls_back_to_20_30_50() {
        let scores = ScoreTriple::default().or_fallback();
        assert_eq!(scores, ScoreTriple::FALLBACK);

        let p = scores.percentages();
        assert_eq!(p.ai_generated, 20.0);
        assert_eq!(p.ai_edited, 30.0);
        assert_eq!(p.real_photo, 50.0);
        assert_eq!(scores.nominal_max(), Verdict::LikelyReal);
    }

    #[test]
    fn test_nonzero_triple_not_substituted() {
        let scores = ScoreTriple {
            ai_generated: 1.0,
            ai_edited: 0.0,
            real_photo: 0.0,
        };
        assert_eq!(scores.or_fallback(), scores);
    }

    #[test]
    fn test_gap_ratio() {
        let scores = ScoreTriple {
            ai_generated: 50.0,
            ai_edited: 30.0,
            real_photo: 20.0,
        };
        assert!((scores.gap_ratio() - 0.2).abs() < 1e-12);
        assert_eq!(ScoreTriple::default().gap_ratio(), 0.0);
    }

    #[test]
    fn test_percentages_rounded_independently() {
        let scores = ScoreTriple {
            ai_generated: 1.0,
            ai_edited: 1.0,
            real_photo: 1.0,
        };
        let p = scores.percentages();
        assert_eq!(p.ai_generated, 33.33);
        assert_eq!(p.ai_edited, 33.33);
        assert_eq!(p.real_photo, 33.33);
        // Sum is 99.99 by design; not renormalized
    }

    #[test]
    fn test_classify_is_deterministic() {
        let bundle = EvidenceBundle::default();
        let a = classify(&bundle, "img.jpg");
        let b = classify(&bundle, "img.jpg");
        assert_eq!(a, b);
    }
}
