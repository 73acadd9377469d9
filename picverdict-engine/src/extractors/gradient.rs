//! Gradient Anomaly Analyzer
//!
//! **[PV-EXT-130]** Four gradient-field measurements: first-to-second
//! order magnitude ratio (diffusion models produce unnaturally smooth
//! ramps), local direction coherence, sharp-transition topology, and the
//! modality of the magnitude histogram.

use crate::extractors::util::{gray_f64, histogram, mean, percentile, sobel, variance};
use crate::extractors::{ExtractError, ImageContext, SignalExtractor};
use crate::records::{GradientEvidence, MeasurementStatus, Signal, SignalRecord};
use image::GrayImage;
use imageproc::region_labelling::{connected_components, Connectivity};
use ndarray::Array2;

/// First/second order magnitude ratio above this is unnatural smoothing
const SMOOTHNESS_THRESHOLD: f64 = 10.0;

/// Mean windowed direction variance below this is too coherent
const CONSISTENCY_THRESHOLD: f64 = 0.5;

/// Plausible range for the number of distinct sharp-edge regions
const MIN_SHARP_REGIONS: usize = 10;
const MAX_SHARP_REGIONS: usize = 1000;

/// Interior histogram peaks above this indicate banded gradients
const MAX_HISTOGRAM_PEAKS: usize = 5;

const DIRECTION_WINDOW: usize = 16;
const HIST_BINS: usize = 50;

pub struct GradientAnalyzer;

#[async_trait::async_trait]
impl SignalExtractor for GradientAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Gradient
    }

    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
        let gray = gray_f64(&ctx.image);
        let (h, w) = gray.dim();
        if h < DIRECTION_WINDOW || w < DIRECTION_WINDOW {
            return Err(ExtractError::Decode(format!(
                "image {w}x{h} too small for gradient analysis"
            )));
        }

        let (gx, gy) = sobel(&gray);
        let magnitude = Array2::from_shape_fn((h, w), |idx| {
            (gx[idx] * gx[idx] + gy[idx] * gy[idx]).sqrt()
        });
        let direction = Array2::from_shape_fn((h, w), |idx| gy[idx].atan2(gx[idx]));

        // Second-order field from re-deriving each first-order component
        let (gxx, _) = sobel(&gx);
        let (_, gyy) = sobel(&gy);
        let second_mean = mean(
            &magnitude
                .indexed_iter()
                .map(|(idx, _)| (gxx[idx] * gxx[idx] + gyy[idx] * gyy[idx]).sqrt())
                .collect::<Vec<f64>>(),
        );
        let mag_values: Vec<f64> = magnitude.iter().copied().collect();
        let gradient_smoothness = mean(&mag_values) / (second_mean + 1e-6);

        let gradient_consistency = windowed_direction_variance(&direction);
        let sharp_transition_count = sharp_region_count(&magnitude, &mag_values);
        let histogram_peaks = interior_peaks(&mag_values);

        let unnatural_smoothness = gradient_smoothness > SMOOTHNESS_THRESHOLD;
        let too_coherent = gradient_consistency < CONSISTENCY_THRESHOLD;
        let odd_topology = sharp_transition_count < MIN_SHARP_REGIONS
            || sharp_transition_count > MAX_SHARP_REGIONS;
        let banded = histogram_peaks > MAX_HISTOGRAM_PEAKS;

        Ok(SignalRecord::Gradient(GradientEvidence {
            gradient_smoothness,
            gradient_consistency,
            unnatural_smoothness_detected: unnatural_smoothness,
            sharp_transition_count,
            is_suspicious: unnatural_smoothness || too_coherent || odd_topology || banded,
            status: MeasurementStatus::Measured,
        }))
    }
}

/// Mean variance of gradient direction over non-overlapping windows
fn windowed_direction_variance(direction: &Array2<f64>) -> f64 {
    let (h, w) = direction.dim();
    let mut window_vars = Vec::new();
    for wy in 0..h / DIRECTION_WINDOW {
        for wx in 0..w / DIRECTION_WINDOW {
            let window = direction.slice(ndarray::s![
                wy * DIRECTION_WINDOW..(wy + 1) * DIRECTION_WINDOW,
                wx * DIRECTION_WINDOW..(wx + 1) * DIRECTION_WINDOW
            ]);
            let values: Vec<f64> = window.iter().copied().collect();
            window_vars.push(variance(&values));
        }
    }
    mean(&window_vars)
}

/// Connected regions in the mask of magnitudes above the 95th percentile
fn sharp_region_count(magnitude: &Array2<f64>, mag_values: &[f64]) -> usize {
    let threshold = percentile(mag_values, 95.0);
    let (h, w) = magnitude.dim();
    let mask = GrayImage::from_fn(w as u32, h as u32, |x, y| {
        if magnitude[(y as usize, x as usize)] > threshold {
            image::Luma([255u8])
        } else {
            image::Luma([0u8])
        }
    });
    let labels = connected_components(&mask, Connectivity::Eight, image::Luma([0u8]));
    labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize
}

/// Interior local maxima of the 50-bin magnitude histogram
fn interior_peaks(mag_values: &[f64]) -> usize {
    let hi = mag_values.iter().cloned().fold(0.0f64, f64::max);
    if hi <= 0.0 {
        return 0;
    }
    let hist = histogram(mag_values, HIST_BINS, 0.0, hi);
    (1..HIST_BINS - 1)
        .filter(|&i| hist[i] > 0 && hist[i] > hist[i - 1] && hist[i] > hist[i + 1])
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
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
    async fn test_flat_image_has_incoherent_but_not_smooth_gradients() {
        let record = GradientAnalyzer
            .extract(&ctx_from(DynamicImage::new_rgb8(64, 64)))
            .await
            .unwrap();
        let SignalRecord::Gradient(evidence) = record else {
            panic!("wrong record variant");
        };
        // Zero gradients: perfectly coherent directions and no sharp
        // regions, both suspicious; the smoothness ratio stays at zero
        assert!(evidence.is_suspicious);
        assert!(!evidence.unnatural_smoothness_detected);
        assert_eq!(evidence.sharp_transition_count, 0);
        assert_eq!(evidence.gradient_consistency, 0.0);
    }

    #[tokio::test]
    async fn test_undersized_image_is_an_error() {
        let result = GradientAnalyzer
            .extract(&ctx_from(DynamicImage::new_rgb8(8, 8)))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_interior_peaks_empty_field_is_zero() {
        assert_eq!(interior_peaks(&[0.0, 0.0, 0.0]), 0);
    }
}
