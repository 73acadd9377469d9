//! PicVerdict Engine
//!
//! Forensic AI-image classification: eleven independent signal extractors
//! feed a deterministic fusion engine that produces one of three verdicts
//! (AI Generated, AI Edited / Modified, Likely Real Photo) with a graded
//! confidence and a full evidence trail.
//!
//! Typical use:
//!
//! ```no_run
//! use picverdict_engine::Analyzer;
//!
//! # async fn run() -> picverdict_common::Result<()> {
//! let analyzer = Analyzer::new();
//! let report = analyzer.analyze("photo.jpg").await?;
//! println!("{}", picverdict_engine::render_summary(&report));
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod extractors;
pub mod fusion;
pub mod provenance;
pub mod records;
pub mod report;
pub mod summary;

pub use engine::Analyzer;
pub use fusion::{classify, ScoreTriple, WeightProfile};
pub use provenance::Provenance;
pub use records::{EvidenceBundle, MeasurementStatus, Signal, SignalRecord};
pub use report::{AnalysisReport, CategorizedEvidence, ConfidenceGrade, Probabilities, Verdict};
pub use summary::render_summary;
