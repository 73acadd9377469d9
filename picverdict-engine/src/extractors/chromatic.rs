//! Chromatic Aberration Analyzer
//!
//! **[PV-EXT-050]** Real lenses refract the color channels slightly
//! differently, so channel-wise edge maps disagree near high-contrast
//! boundaries. Rendered and generated images have perfectly aligned
//! channels, which is the anomaly this extractor looks for.

use crate::extractors::{ExtractError, ImageContext, SignalExtractor};
use crate::records::{ChromaticEvidence, MeasurementStatus, Signal, SignalRecord};
use image::GrayImage;
use imageproc::edges::canny;

/// Misalignment rate below this means channels align too well for optics
const ABERRATION_THRESHOLD: f64 = 0.001;

const CANNY_LOW: f32 = 100.0;
const CANNY_HIGH: f32 = 200.0;

pub struct ChromaticAberrationAnalyzer;

#[async_trait::async_trait]
impl SignalExtractor for ChromaticAberrationAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Chromatic
    }

    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
        let rgb = ctx.image.to_rgb8();
        let (w, h) = rgb.dimensions();
        if w < 16 || h < 16 {
            return Ok(SignalRecord::Chromatic(ChromaticEvidence {
                status: MeasurementStatus::Measured,
                ..ChromaticEvidence::default()
            }));
        }

        // One edge map per channel
        let mut planes = Vec::with_capacity(3);
        for c in 0..3 {
            let plane = GrayImage::from_fn(w, h, |x, y| image::Luma([rgb.get_pixel(x, y)[c]]));
            planes.push(canny(&plane, CANNY_LOW, CANNY_HIGH));
        }

        let mismatches = edge_mismatch(&planes[0], &planes[1])
            + edge_mismatch(&planes[1], &planes[2])
            + edge_mismatch(&planes[0], &planes[2]);
        let score = mismatches as f64 / (3.0 * f64::from(w) * f64::from(h));

        let has_aberration = score > ABERRATION_THRESHOLD;
        Ok(SignalRecord::Chromatic(ChromaticEvidence {
            has_chromatic_aberration: has_aberration,
            aberration_score: score,
            pattern_consistency: 0.5,
            is_suspicious: !has_aberration,
            status: MeasurementStatus::Measured,
        }))
    }
}

/// Pixels where exactly one of the two edge maps fires
fn edge_mismatch(a: &GrayImage, b: &GrayImage) -> usize {
    a.pixels()
        .zip(b.pixels())
        .filter(|(pa, pb)| (pa[0] > 0) != (pb[0] > 0))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::path::PathBuf;

    fn ctx_from(image: DynamicImage) -> ImageContext {
        ImageContext {
            path: PathBuf::from("test.png"),
            raw_bytes: Vec::new(),
            format: Some(ImageFormat::Png),
            image,
        }
    }

    #[tokio::test]
    async fn test_aligned_channels_are_suspicious() {
        // Grayscale content: all channels identical, edges align exactly
        let image = RgbImage::from_fn(64, 64, |x, _| {
            let v = if x < 32 { 20 } else { 230 };
            image::Rgb([v, v, v])
        });
        let record = ChromaticAberrationAnalyzer
            .extract(&ctx_from(DynamicImage::ImageRgb8(image)))
            .await
            .unwrap();
        let SignalRecord::Chromatic(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(!evidence.has_chromatic_aberration);
        assert!(evidence.is_suspicious);
        assert_eq!(evidence.aberration_score, 0.0);
    }

    #[tokio::test]
    async fn test_shifted_channel_edges_read_as_aberration() {
        // Red edge at x=30, green/blue edge at x=34: channel edge maps
        // disagree along the boundary
        let image = RgbImage::from_fn(64, 64, |x, _| {
            let r = if x < 30 { 20 } else { 230 };
            let gb = if x < 34 { 20 } else { 230 };
            image::Rgb([r, gb, gb])
        });
        let record = ChromaticAberrationAnalyzer
            .extract(&ctx_from(DynamicImage::ImageRgb8(image)))
            .await
            .unwrap();
        let SignalRecord::Chromatic(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(evidence.has_chromatic_aberration);
        assert!(!evidence.is_suspicious);
    }
}
