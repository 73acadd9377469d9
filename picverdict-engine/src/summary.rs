//! Human-Readable Summary Rendering
//!
//! **[PV-REP-020]** Plain-text rendering of an [`AnalysisReport`] for
//! terminals and logs. Purely presentational; everything shown here is
//! already in the report.

use crate::report::AnalysisReport;
use std::fmt::Write;

const BANNER: &str =
    "============================================================";

/// Render a report as a banner-framed text summary.
///
/// Empty evidence categories are omitted entirely.
pub fn render_summary(report: &AnalysisReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{BANNER}");
    let _ = writeln!(out, "VERDICT: {}", report.verdict);
    let _ = writeln!(out, "CONFIDENCE: {}", report.confidence);
    let _ = writeln!(out, "{BANNER}");
    let _ = writeln!(out, "\nProbability Breakdown:");
    let _ = writeln!(
        out,
        "  AI Generated:  {:.1}%",
        report.probabilities.ai_generated
    );
    let _ = writeln!(out, "  AI Edited:     {:.1}%", report.probabilities.ai_edited);
    let _ = writeln!(
        out,
        "  Real Photo:    {:.1}%",
        report.probabilities.real_photo
    );

    let sections = [
        ("AI Generated Evidence:", &report.categorized_evidence.ai_generated),
        ("AI Edited Evidence:", &report.categorized_evidence.ai_edited),
        ("Real Photo Evidence:", &report.categorized_evidence.real_photo),
    ];
    for (heading, items) in sections {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n\n{heading}");
        for item in items {
            let _ = writeln!(out, "  • {item}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{
        CategorizedEvidence, ConfidenceGrade, Probabilities, RawScores, Verdict,
    };
    use std::collections::BTreeMap;

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            source: "photo.jpg".to_string(),
            verdict: Verdict::LikelyReal,
            confidence: ConfidenceGrade::High,
            probabilities: Probabilities {
                ai_generated: 12.5,
                ai_edited: 20.0,
                real_photo: 67.5,
            },
            evidence: BTreeMap::new(),
            categorized_evidence: CategorizedEvidence {
                ai_generated: Vec::new(),
                ai_edited: Vec::new(),
                real_photo: vec!["✓ CFA pattern detected".to_string()],
            },
            raw_scores: RawScores {
                ai_generated: 12.5,
                ai_edited: 20.0,
                real_photo: 67.5,
            },
        }
    }

    #[test]
    fn test_summary_layout() {
        let text = render_summary(&sample_report());

        assert!(text.starts_with(BANNER));
        assert!(text.contains("VERDICT: Likely Real Photo"));
        assert!(text.contains("CONFIDENCE: High"));
        assert!(text.contains("AI Generated:  12.5%"));
        assert!(text.contains("Real Photo:    67.5%"));
        assert!(text.contains("Real Photo Evidence:"));
        assert!(text.contains("  • ✓ CFA pattern detected"));
    }

    #[test]
    fn test_empty_categories_are_omitted() {
        let text = render_summary(&sample_report());
        assert!(!text.contains("AI Generated Evidence:"));
        assert!(!text.contains("AI Edited Evidence:"));
    }
}
