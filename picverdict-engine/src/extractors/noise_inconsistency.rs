//! Regional Noise Inconsistency Analyzer
//!
//! **[PV-EXT-100]** Sensor noise is roughly uniform across a real frame.
//! The residual after a Gaussian blur is measured per region on a 4x4
//! grid: denoised (too little noise), wildly uneven noise, and isolated
//! outlier regions each tell a different story about synthesis or
//! compositing.

use crate::extractors::util::{gaussian5, gray_f64, mean, std_dev, variance};
use crate::extractors::{ExtractError, ImageContext, SignalExtractor};
use crate::records::{MeasurementStatus, NoiseConfidence, NoiseEvidence, Signal, SignalRecord};

const GRID: usize = 4;

/// Mean regional noise variance below this means the image was denoised
/// or never had sensor noise
const DENOISED_THRESHOLD: f64 = 5.0;

/// Spread of regional variances above this means inconsistent noise
const SPREAD_THRESHOLD: f64 = 50.0;

/// A region below this variance is effectively noiseless
const REGION_FLOOR: f64 = 1.0;

pub struct NoiseInconsistencyAnalyzer;

#[async_trait::async_trait]
impl SignalExtractor for NoiseInconsistencyAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Noise
    }

    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
        let gray = gray_f64(&ctx.image);
        let (h, w) = gray.dim();
        if h < GRID || w < GRID {
            return Err(ExtractError::Decode(format!(
                "image {w}x{h} too small for a {GRID}x{GRID} noise grid"
            )));
        }

        let blurred = gaussian5(&gray);
        let noise = &gray - &blurred;

        let rh = h / GRID;
        let rw = w / GRID;
        let mut region_vars = Vec::with_capacity(GRID * GRID);
        for gy in 0..GRID {
            for gx in 0..GRID {
                let region = noise.slice(ndarray::s![
                    gy * rh..(gy + 1) * rh,
                    gx * rw..(gx + 1) * rw
                ]);
                let values: Vec<f64> = region.iter().copied().collect();
                region_vars.push(variance(&values));
            }
        }

        let mean_var = mean(&region_vars);
        let std_var = std_dev(&region_vars);
        let suspicious_regions = region_vars
            .iter()
            .filter(|&&v| v < REGION_FLOOR || v > 3.0 * mean_var)
            .count();

        let mut is_suspicious = false;
        let mut confidence = NoiseConfidence::Low;
        if mean_var < DENOISED_THRESHOLD {
            is_suspicious = true;
            confidence = NoiseConfidence::High;
        } else if std_var > SPREAD_THRESHOLD {
            is_suspicious = true;
            confidence = NoiseConfidence::Medium;
        } else if suspicious_regions > region_vars.len() / 2 {
            is_suspicious = true;
            confidence = NoiseConfidence::Medium;
        }

        Ok(SignalRecord::Noise(NoiseEvidence {
            noise_variance_inconsistency: if mean_var > f64::EPSILON {
                std_var / mean_var
            } else {
                0.0
            },
            regions_analyzed: region_vars.len(),
            suspicious_regions,
            noise_variance_std: std_var,
            is_suspicious,
            confidence,
            status: MeasurementStatus::Measured,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat};
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
    async fn test_noiseless_image_flags_denoising_with_high_confidence() {
        let record = NoiseInconsistencyAnalyzer
            .extract(&ctx_from(DynamicImage::new_rgb8(64, 64)))
            .await
            .unwrap();
        let SignalRecord::Noise(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(evidence.is_suspicious);
        assert_eq!(evidence.confidence, NoiseConfidence::High);
        assert_eq!(evidence.regions_analyzed, 16);
        assert_eq!(evidence.suspicious_regions, 16);
    }

    #[tokio::test]
    async fn test_uniform_noise_is_unsuspicious() {
        // Deterministic pseudo-noise, identical statistics everywhere
        let image = GrayImage::from_fn(64, 64, |x, y| {
            let v = 128i32 + ((x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17))) % 41) as i32
                - 20;
            image::Luma([v as u8])
        });
        let record = NoiseInconsistencyAnalyzer
            .extract(&ctx_from(DynamicImage::ImageLuma8(image)))
            .await
            .unwrap();
        let SignalRecord::Noise(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(!evidence.is_suspicious);
        assert_eq!(evidence.confidence, NoiseConfidence::Low);
    }

    #[tokio::test]
    async fn test_undersized_image_is_an_error() {
        let result = NoiseInconsistencyAnalyzer
            .extract(&ctx_from(DynamicImage::new_rgb8(2, 2)))
            .await;
        assert!(result.is_err());
    }
}
