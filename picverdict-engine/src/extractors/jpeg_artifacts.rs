//! JPEG Artifact Analyzer
//!
//! **[PV-EXT-040]** Measures 8x8 block-boundary discontinuities in the
//! luminance plane. The mean intensity step at block boundaries estimates
//! how aggressively the image was JPEG-compressed; a clean grid with no
//! boundary steps on a JPEG container is itself unusual.

use crate::extractors::util::gray_f64;
use crate::extractors::{ExtractError, ImageContext, SignalExtractor};
use crate::records::{JpegEvidence, MeasurementStatus, QualityEstimate, Signal, SignalRecord};
use ndarray::Array2;

const BLOCK: usize = 8;

/// Blockiness above this indicates visible compression artifacts
const ARTIFACT_THRESHOLD: f64 = 2.0;
/// Blockiness above this indicates heavy (low-quality) compression
const LOW_QUALITY_THRESHOLD: f64 = 5.0;

pub struct JpegArtifactAnalyzer;

#[async_trait::async_trait]
impl SignalExtractor for JpegArtifactAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Jpeg
    }

    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
        let gray = gray_f64(&ctx.image);
        let blockiness = blockiness_score(&gray);

        let has_artifacts = blockiness > ARTIFACT_THRESHOLD;
        let quality_estimate = if blockiness > LOW_QUALITY_THRESHOLD {
            QualityEstimate::Low
        } else if blockiness > ARTIFACT_THRESHOLD {
            QualityEstimate::Medium
        } else {
            QualityEstimate::HighOrUncompressed
        };

        Ok(SignalRecord::Jpeg(JpegEvidence {
            has_jpeg_artifacts: has_artifacts,
            blockiness_score: blockiness,
            quality_estimate,
            // Pristine pixels are unusual for a capture pipeline
            is_suspicious: quality_estimate == QualityEstimate::HighOrUncompressed,
            status: MeasurementStatus::Measured,
        }))
    }
}

/// Mean absolute intensity step across every 8-pixel row and column
/// boundary, averaged over both directions.
fn blockiness_score(gray: &Array2<f64>) -> f64 {
    let (h, w) = gray.dim();
    if h < 2 * BLOCK || w < 2 * BLOCK {
        return 0.0;
    }

    let mut h_sum = 0.0;
    let mut h_count = 0usize;
    for x in (BLOCK..w).step_by(BLOCK) {
        for y in 0..h {
            h_sum += (gray[(y, x)] - gray[(y, x - 1)]).abs();
            h_count += 1;
        }
    }

    let mut v_sum = 0.0;
    let mut v_count = 0usize;
    for y in (BLOCK..h).step_by(BLOCK) {
        for x in 0..w {
            v_sum += (gray[(y, x)] - gray[(y - 1, x)]).abs();
            v_count += 1;
        }
    }

    if h_count == 0 || v_count == 0 {
        return 0.0;
    }
    (h_sum / h_count as f64 + v_sum / v_count as f64) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat};
    use std::path::PathBuf;

    fn ctx_from(image: DynamicImage) -> ImageContext {
        ImageContext {
            path: PathBuf::from("test.jpg"),
            raw_bytes: Vec::new(),
            format: Some(ImageFormat::Jpeg),
            image,
        }
    }

    #[tokio::test]
    async fn test_flat_image_reads_as_high_quality() {
        let record = JpegArtifactAnalyzer
            .extract(&ctx_from(DynamicImage::new_rgb8(64, 64)))
            .await
            .unwrap();
        let SignalRecord::Jpeg(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(!evidence.has_jpeg_artifacts);
        assert_eq!(
            evidence.quality_estimate,
            QualityEstimate::HighOrUncompressed
        );
        assert!(evidence.is_suspicious);
    }

    #[tokio::test]
    async fn test_blocky_image_reads_as_low_quality() {
        // Alternate 8x8 tiles between dark and bright so every block
        // boundary carries a large step
        let image = GrayImage::from_fn(64, 64, |x, y| {
            if ((x / 8) + (y / 8)) % 2 == 0 {
                image::Luma([220])
            } else {
                image::Luma([30])
            }
        });
        let record = JpegArtifactAnalyzer
            .extract(&ctx_from(DynamicImage::ImageLuma8(image)))
            .await
            .unwrap();
        let SignalRecord::Jpeg(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(evidence.has_jpeg_artifacts);
        assert_eq!(evidence.quality_estimate, QualityEstimate::Low);
        assert!(!evidence.is_suspicious);
    }
}
