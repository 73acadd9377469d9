//! Forensic Signal Extractors
//!
//! **[PV-EXT-010]** Eleven independent extractors, one per signal. Each
//! implements the [`SignalExtractor`] trait so the engine and tests stay
//! extractor-agnostic. No extractor reads another's output; all run
//! concurrently and fan in to an [`EvidenceBundle`] before aggregation.
//!
//! **[PV-EXT-020]** Per-signal error isolation: a failing extractor is
//! logged and its slot keeps the neutral defaulted record. Failures never
//! reach the aggregator and never abort the image or the batch.

pub mod benford;
pub mod cfa;
pub mod chromatic;
pub mod color;
pub mod double_jpeg;
pub mod gan_fingerprint;
pub mod gradient;
pub mod jpeg_artifacts;
pub mod metadata;
pub mod noise_inconsistency;
pub mod texture;

pub(crate) mod util;

pub use benford::BenfordAnalyzer;
pub use cfa::CfaDetector;
pub use chromatic::ChromaticAberrationAnalyzer;
pub use color::ColorDistributionAnalyzer;
pub use double_jpeg::DoubleJpegDetector;
pub use gan_fingerprint::GanFingerprintDetector;
pub use gradient::GradientAnalyzer;
pub use jpeg_artifacts::JpegArtifactAnalyzer;
pub use metadata::MetadataExtractor;
pub use noise_inconsistency::NoiseInconsistencyAnalyzer;
pub use texture::TextureConsistencyAnalyzer;

use crate::records::{EvidenceBundle, Signal, SignalRecord};
use futures::future::join_all;
use image::{DynamicImage, ImageFormat};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Everything an extractor may need for one image.
///
/// The engine performs the single decode; extractors never touch the
/// filesystem themselves.
#[derive(Debug, Clone)]
pub struct ImageContext {
    /// Source path (or synthetic label) of the image
    pub path: PathBuf,
    /// Raw undecoded file bytes (EXIF parsing needs the container)
    pub raw_bytes: Vec<u8>,
    /// Container format as sniffed from the bytes
    pub format: Option<ImageFormat>,
    /// Decoded raster image
    pub image: DynamicImage,
}

/// Extractor-local failure, absorbed at the runner boundary
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Pixel data could not be interpreted as required
    #[error("Decode error: {0}")]
    Decode(String),

    /// Numeric computation failed (degenerate input, invalid parameter)
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// Internal processing error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Uniform capability implemented by every signal extractor
///
/// **[PV-EXT-011]** `extract` must not panic; returning `Err` is the only
/// failure path, and the runner converts it into the signal's neutral
/// record.
#[async_trait::async_trait]
pub trait SignalExtractor: Send + Sync {
    /// Signal this extractor measures
    fn signal(&self) -> Signal;

    /// Measure the signal for the given image
    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError>;
}

/// Parallel extractor runner with per-signal error isolation
pub struct ExtractorSet {
    extractors: Vec<Arc<dyn SignalExtractor>>,
}

impl ExtractorSet {
    /// Build a set from explicit extractors (tests use this with mocks)
    pub fn new(extractors: Vec<Arc<dyn SignalExtractor>>) -> Self {
        Self { extractors }
    }

    /// The full production set: all eleven signal extractors
    pub fn full() -> Self {
        Self::new(vec![
            Arc::new(MetadataExtractor),
            Arc::new(JpegArtifactAnalyzer),
            Arc::new(ChromaticAberrationAnalyzer),
            Arc::new(ColorDistributionAnalyzer),
            Arc::new(TextureConsistencyAnalyzer),
            Arc::new(GanFingerprintDetector),
            Arc::new(NoiseInconsistencyAnalyzer),
            Arc::new(BenfordAnalyzer),
            Arc::new(CfaDetector),
            Arc::new(DoubleJpegDetector),
            Arc::new(GradientAnalyzer),
        ])
    }

    /// Run all extractors concurrently and fan in to a complete bundle.
    ///
    /// Slots whose extractor failed (or which no extractor covers) keep
    /// their neutral defaulted record.
    pub async fn extract_all(&self, ctx: &ImageContext) -> EvidenceBundle {
        let futures = self.extractors.iter().map(|extractor| async move {
            let signal = extractor.signal();
            match extractor.extract(ctx).await {
                Ok(record) => {
                    debug!(signal = %signal, path = %ctx.path.display(), "extraction complete");
                    record
                }
                Err(e) => {
                    warn!(
                        signal = %signal,
                        path = %ctx.path.display(),
                        error = %e,
                        "extraction failed; using neutral record"
                    );
                    SignalRecord::neutral(signal)
                }
            }
        });

        let mut bundle = EvidenceBundle::default();
        for record in join_all(futures).await {
            bundle.install(record);
        }
        bundle
    }

    /// Number of extractors in the set
    pub fn count(&self) -> usize {
        self.extractors.len()
    }
}

// ============================================================================
// Mock extractor for testing
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Mock extractor returning a canned record or a forced failure
    pub struct MockExtractor {
        pub record: SignalRecord,
        pub should_fail: bool,
    }

    impl MockExtractor {
        pub fn returning(record: SignalRecord) -> Self {
            Self {
                record,
                should_fail: false,
            }
        }

        pub fn failing(signal: Signal) -> Self {
            Self {
                record: SignalRecord::neutral(signal),
                should_fail: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl SignalExtractor for MockExtractor {
        fn signal(&self) -> Signal {
            self.record.signal()
        }

        async fn extract(&self, _ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
            if self.should_fail {
                Err(ExtractError::Internal("mock failure".to_string()))
            } else {
                Ok(self.record.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{GanEvidence, MeasurementStatus};
    use image::DynamicImage;

    fn test_ctx() -> ImageContext {
        ImageContext {
            path: PathBuf::from("test.png"),
            raw_bytes: Vec::new(),
            format: Some(ImageFormat::Png),
            image: DynamicImage::new_rgb8(16, 16),
        }
    }

    #[tokio::test]
    async fn test_successful_records_installed() {
        let set = ExtractorSet::new(vec![Arc::new(mock::MockExtractor::returning(
            SignalRecord::Gan(GanEvidence {
                gan_signature_detected: true,
                status: MeasurementStatus::Measured,
                ..GanEvidence::default()
            }),
        ))]);

        let bundle = set.extract_all(&test_ctx()).await;
        assert!(bundle.gan.gan_signature_detected);
        assert_eq!(bundle.gan.status, MeasurementStatus::Measured);
    }

    #[tokio::test]
    async fn test_failed_extractor_leaves_neutral_record() {
        let set = ExtractorSet::new(vec![
            Arc::new(mock::MockExtractor::failing(Signal::Cfa)),
            Arc::new(mock::MockExtractor::returning(SignalRecord::Gan(
                GanEvidence {
                    is_suspicious: true,
                    status: MeasurementStatus::Measured,
                    ..GanEvidence::default()
                },
            ))),
        ]);

        let bundle = set.extract_all(&test_ctx()).await;

        // CFA slot stays neutral and marked Defaulted; the failure did not
        // block the GAN extractor
        assert_eq!(bundle.cfa.status, MeasurementStatus::Defaulted);
        assert!(!bundle.cfa.cfa_pattern_detected);
        assert!(bundle.gan.is_suspicious);
    }

    #[test]
    fn test_full_set_covers_all_signals() {
        let set = ExtractorSet::full();
        assert_eq!(set.count(), 11);
    }
}
