//! Texture Consistency Analyzer
//!
//! **[PV-EXT-070]** Local texture statistics plus a clone-stamp check.
//! Generated imagery tends toward either waxy over-smooth surfaces or
//! uniformly over-sharpened detail; copy-paste edits leave a region
//! matching itself elsewhere in the frame.

use crate::extractors::util::{box_mean, convolve3x3, gray_f64, variance, LAPLACIAN};
use crate::extractors::{ExtractError, ImageContext, SignalExtractor};
use crate::records::{MeasurementStatus, Signal, SignalRecord, TextureEvidence};
use image::GrayImage;
use imageproc::template_matching::{match_template, MatchTemplateMethod};
use ndarray::Array2;

const WINDOW: usize = 15;

/// Laplacian-variance band for plausible photographic texture
const SMOOTHNESS_LOW: f64 = 50.0;
const SMOOTHNESS_HIGH: f64 = 5000.0;

/// Normalized cross-correlation above this is a self-match
const MATCH_THRESHOLD: f32 = 0.9;

pub struct TextureConsistencyAnalyzer;

#[async_trait::async_trait]
impl SignalExtractor for TextureConsistencyAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Texture
    }

    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
        let gray = gray_f64(&ctx.image);

        let texture_variance = mean_local_variance(&gray, WINDOW);
        let laplacian = convolve3x3(&gray, &LAPLACIAN);
        let smoothness_score = variance(laplacian.as_slice().unwrap_or(&[]));

        let is_suspicious =
            smoothness_score < SMOOTHNESS_LOW || smoothness_score > SMOOTHNESS_HIGH;

        let (h, w) = gray.dim();
        let repetition_detected =
            h > 100 && w > 100 && texture_variance > 1.0 && self_similarity(&ctx.image.to_luma8());

        Ok(SignalRecord::Texture(TextureEvidence {
            texture_variance,
            smoothness_score,
            repetition_detected,
            is_suspicious,
            status: MeasurementStatus::Measured,
        }))
    }
}

/// Mean over all pixels of the k x k local variance, E[x^2] - E[x]^2
fn mean_local_variance(gray: &Array2<f64>, k: usize) -> f64 {
    let local_mean = box_mean(gray, k);
    let squares = gray.mapv(|v| v * v);
    let local_sq_mean = box_mean(&squares, k);

    let mut sum = 0.0;
    for (m, sq) in local_mean.iter().zip(local_sq_mean.iter()) {
        sum += (sq - m * m).max(0.0);
    }
    sum / local_mean.len() as f64
}

/// Match an interior patch against the whole frame; more than two strong
/// correlation peaks (the patch always matches itself once) means a
/// repeated region.
fn self_similarity(gray: &GrayImage) -> bool {
    let (w, h) = gray.dimensions();
    let template = image::imageops::crop_imm(gray, w / 4, h / 4, w / 4, h / 4).to_image();
    let result = match_template(
        gray,
        &template,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );

    let mut peaks = 0usize;
    let (rw, rh) = result.dimensions();
    for y in 0..rh {
        for x in 0..rw {
            let v = result.get_pixel(x, y)[0];
            if v > MATCH_THRESHOLD && is_local_max(&result, x, y, v) {
                peaks += 1;
            }
        }
    }
    peaks > 2
}

fn is_local_max(result: &image::ImageBuffer<image::Luma<f32>, Vec<f32>>, x: u32, y: u32, v: f32) -> bool {
    let (w, h) = result.dimensions();
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx >= 0 && ny >= 0 && (nx as u32) < w && (ny as u32) < h
                && result.get_pixel(nx as u32, ny as u32)[0] > v
            {
                return false;
            }
        }
    }
    true
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
    async fn test_flat_image_is_suspiciously_smooth() {
        let record = TextureConsistencyAnalyzer
            .extract(&ctx_from(DynamicImage::new_rgb8(64, 64)))
            .await
            .unwrap();
        let SignalRecord::Texture(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(evidence.is_suspicious);
        assert!(evidence.smoothness_score < SMOOTHNESS_LOW);
        assert_eq!(evidence.texture_variance, 0.0);
        assert!(!evidence.repetition_detected);
    }

    #[test]
    fn test_mean_local_variance_checkerboard_positive() {
        let gray = Array2::from_shape_fn((32, 32), |(y, x)| {
            if (x + y) % 2 == 0 {
                255.0
            } else {
                0.0
            }
        });
        assert!(mean_local_variance(&gray, WINDOW) > 1000.0);
    }
}
