//! Analysis Report Types
//!
//! **[PV-REP-010]** The final output of one analysis: verdict, confidence
//! grade, probability breakdown, raw fusion scores, and the full evidence
//! trail. Constructed once by the fusion engine, never mutated afterward.

use crate::records::Signal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Three-way classification verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    AiGenerated,
    AiEdited,
    LikelyReal,
}

impl Verdict {
    /// Display label, matching the historical output strings
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::AiGenerated => "AI Generated",
            Verdict::AiEdited => "AI Edited / Modified",
            Verdict::LikelyReal => "Likely Real Photo",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence grade for a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceGrade {
    Low,
    Medium,
    High,
}

impl ConfidenceGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceGrade::High => "High",
            ConfidenceGrade::Medium => "Medium",
            ConfidenceGrade::Low => "Low",
        }
    }
}

impl fmt::Display for ConfidenceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage breakdown over the three categories
///
/// Each value is rounded to two decimals independently; the sum is close
/// to, but not forced to be exactly, 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub ai_generated: f64,
    pub ai_edited: f64,
    pub real_photo: f64,
}

/// Raw accumulator totals after aggregation (rounded to three decimals)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawScores {
    pub ai_generated: f64,
    pub ai_edited: f64,
    pub real_photo: f64,
}

/// Evidence strings grouped by the category they support
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedEvidence {
    pub ai_generated: Vec<String>,
    pub ai_edited: Vec<String>,
    pub real_photo: Vec<String>,
}

/// Complete analysis result for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Label for the analyzed image (file name or caller-supplied tag)
    pub source: String,
    pub verdict: Verdict,
    pub confidence: ConfidenceGrade,
    pub probabilities: Probabilities,
    /// Evidence strings keyed by the signal that produced them
    pub evidence: BTreeMap<Signal, Vec<String>>,
    /// Evidence strings grouped by supported category
    pub categorized_evidence: CategorizedEvidence,
    pub raw_scores: RawScores,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_labels() {
        assert_eq!(Verdict::AiGenerated.as_str(), "AI Generated");
        assert_eq!(Verdict::AiEdited.as_str(), "AI Edited / Modified");
        assert_eq!(Verdict::LikelyReal.as_str(), "Likely Real Photo");
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(ConfidenceGrade::High > ConfidenceGrade::Medium);
        assert!(ConfidenceGrade::Medium > ConfidenceGrade::Low);
    }
}
