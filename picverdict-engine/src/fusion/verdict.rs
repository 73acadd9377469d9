//! Verdict Resolver
//!
//! **[PV-FUS-030]** Picks the majority category from the score triple and
//! applies the provenance overrides. Tie-breaking follows the fixed
//! precedence ai_generated > ai_edited > real_photo as an explicit, tested
//! rule.

use crate::fusion::ScoreTriple;
use crate::provenance::Provenance;
use crate::report::Verdict;

/// Resolver output: the verdict plus any corrective evidence note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVerdict {
    pub verdict: Verdict,
    /// Set when an override rewrote the base pick
    pub corrective_note: Option<String>,
}

/// Resolve the verdict for a (fallback-substituted) score triple.
///
/// Overrides, applied after the base pick, in order:
/// 1. Old image whose real-photo total exceeds 0.7x the AI-generated total
///    is forced to Likely Real Photo.
/// 2. A base pick of AI Generated is forced to Likely Real Photo when the
///    capture year predates modern generative models (< 2015), with a
///    corrective note.
pub fn resolve(scores: &ScoreTriple, provenance: &Provenance) -> ResolvedVerdict {
    if provenance.is_old_image && scores.real_photo > scores.ai_generated * 0.7 {
        return ResolvedVerdict {
            verdict: Verdict::LikelyReal,
            corrective_note: None,
        };
    }

    match scores.nominal_max() {
        Verdict::AiGenerated => {
            if provenance.predates_generative_models() {
                let year = provenance
                    .capture_year
                    .map_or_else(|| "unknown".to_string(), |y| y.to_string());
                ResolvedVerdict {
                    verdict: Verdict::LikelyReal,
                    corrective_note: Some(format!(
                        "✓✓ Image predates modern AI technology ({year})"
                    )),
                }
            } else {
                ResolvedVerdict {
                    verdict: Verdict::AiGenerated,
                    corrective_note: None,
                }
            }
        }
        other => ResolvedVerdict {
            verdict: other,
            corrective_note: None,
        },
    }
}
