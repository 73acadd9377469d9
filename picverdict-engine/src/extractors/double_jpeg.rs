//! Double JPEG Compression Detector
//!
//! **[PV-EXT-120]** Re-saving a JPEG quantizes the DCT coefficients twice
//! with different tables, which leaves periodic gaps in the AC coefficient
//! histograms. Only meaningful on JPEG containers; other formats get the
//! single-save default.

use crate::extractors::util::{gray_f64, variance};
use crate::extractors::{ExtractError, ImageContext, SignalExtractor};
use crate::records::{DoubleJpegEvidence, MeasurementStatus, Signal, SignalRecord};
use image::ImageFormat;
use ndarray::Array2;
use rustdct::DctPlanner;

const BLOCK: usize = 8;
const MAX_BLOCKS: usize = 100;

/// AC coefficient slots inspected per block (raster order, DC skipped)
const AC_COEFFS: std::ops::Range<usize> = 1..10;

const HIST_BINS: usize = 50;

/// Second-derivative sign changes above this mark a periodic histogram
const PERIODICITY_THRESHOLD: usize = 10;

/// Fraction of periodic AC histograms implying a second compression pass
const DOUBLE_THRESHOLD: f64 = 0.3;
/// Fraction implying more than two passes
const TRIPLE_THRESHOLD: f64 = 0.6;

/// Block-boundary step variance above this means mismatched grids
const MISMATCH_THRESHOLD: f64 = 20.0;

pub struct DoubleJpegDetector;

#[async_trait::async_trait]
impl SignalExtractor for DoubleJpegDetector {
    fn signal(&self) -> Signal {
        Signal::DoubleJpeg
    }

    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
        if ctx.format != Some(ImageFormat::Jpeg) {
            return Ok(SignalRecord::DoubleJpeg(DoubleJpegEvidence {
                status: MeasurementStatus::Measured,
                ..DoubleJpegEvidence::default()
            }));
        }

        let gray = gray_f64(&ctx.image);
        let (h, w) = gray.dim();
        if h < BLOCK || w < BLOCK {
            return Err(ExtractError::Decode(format!(
                "image {w}x{h} smaller than one JPEG block"
            )));
        }

        let coefficient_sets = block_dct_coefficients(&gray);
        let mut periodic = 0usize;
        for values in &coefficient_sets {
            if histogram_is_periodic(values) {
                periodic += 1;
            }
        }
        let compression_history_score = periodic as f64 / AC_COEFFS.len() as f64;

        let quantization_mismatch = boundary_step_variance(&gray);
        let grid_mismatch = quantization_mismatch > MISMATCH_THRESHOLD;

        let mut evidence = DoubleJpegEvidence {
            compression_history_score,
            quantization_mismatch,
            status: MeasurementStatus::Measured,
            ..DoubleJpegEvidence::default()
        };

        if compression_history_score > TRIPLE_THRESHOLD {
            evidence.double_compression_detected = true;
            evidence.likely_edited = true;
            evidence.compression_count_estimate = 3;
        } else if compression_history_score > DOUBLE_THRESHOLD {
            evidence.double_compression_detected = true;
            evidence.likely_edited = true;
            evidence.compression_count_estimate = 2;
        }
        if grid_mismatch {
            evidence.double_compression_detected = true;
            evidence.likely_edited = true;
            evidence.compression_count_estimate = evidence.compression_count_estimate.max(2);
        }

        Ok(SignalRecord::DoubleJpeg(evidence))
    }
}

/// For each inspected AC slot, the coefficient values gathered from up to
/// [`MAX_BLOCKS`] aligned 8x8 blocks.
fn block_dct_coefficients(gray: &Array2<f64>) -> Vec<Vec<f64>> {
    let (h, w) = gray.dim();
    let mut planner = DctPlanner::<f64>::new();
    let dct = planner.plan_dct2(BLOCK);

    let mut sets = vec![Vec::new(); AC_COEFFS.len()];
    let mut blocks_done = 0usize;
    'outer: for by in 0..h / BLOCK {
        for bx in 0..w / BLOCK {
            let mut block = [[0.0f64; BLOCK]; BLOCK];
            for y in 0..BLOCK {
                for x in 0..BLOCK {
                    block[y][x] = gray[(by * BLOCK + y, bx * BLOCK + x)];
                }
            }
            // Separable 2D DCT-II on the block
            for row in block.iter_mut() {
                dct.process_dct2(row);
            }
            let mut column = [0.0f64; BLOCK];
            for x in 0..BLOCK {
                for y in 0..BLOCK {
                    column[y] = block[y][x];
                }
                dct.process_dct2(&mut column);
                for y in 0..BLOCK {
                    block[y][x] = column[y];
                }
            }

            for (slot, idx) in AC_COEFFS.enumerate() {
                sets[slot].push(block[idx / BLOCK][idx % BLOCK]);
            }
            blocks_done += 1;
            if blocks_done >= MAX_BLOCKS {
                break 'outer;
            }
        }
    }
    sets
}

/// Periodicity test on one coefficient's histogram: smooth with a 3-bin
/// box, then count sign changes in the second derivative.
fn histogram_is_periodic(values: &[f64]) -> bool {
    if values.len() < HIST_BINS {
        return false;
    }
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if hi - lo < f64::EPSILON {
        return false;
    }

    let hist = crate::extractors::util::histogram(values, HIST_BINS, lo, hi);
    let smoothed: Vec<f64> = (0..HIST_BINS)
        .map(|i| {
            let a = hist[i.saturating_sub(1)] as f64;
            let b = hist[i] as f64;
            let c = hist[(i + 1).min(HIST_BINS - 1)] as f64;
            (a + b + c) / 3.0
        })
        .collect();

    let second: Vec<f64> = (1..HIST_BINS - 1)
        .map(|i| smoothed[i + 1] - 2.0 * smoothed[i] + smoothed[i - 1])
        .collect();
    let crossings = second
        .windows(2)
        .filter(|p| p[0].signum() != p[1].signum() && p[0] != 0.0 && p[1] != 0.0)
        .count();
    crossings > PERIODICITY_THRESHOLD
}

/// Variance of the absolute intensity steps across 8-pixel boundaries
fn boundary_step_variance(gray: &Array2<f64>) -> f64 {
    let (h, w) = gray.dim();
    let mut steps = Vec::new();
    for x in (BLOCK..w).step_by(BLOCK) {
        for y in 0..h {
            steps.push((gray[(y, x)] - gray[(y, x - 1)]).abs());
        }
    }
    for y in (BLOCK..h).step_by(BLOCK) {
        for x in 0..w {
            steps.push((gray[(y, x)] - gray[(y - 1, x)]).abs());
        }
    }
    variance(&steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use std::path::PathBuf;

    fn ctx_from(image: DynamicImage, format: ImageFormat) -> ImageContext {
        ImageContext {
            path: PathBuf::from("test"),
            raw_bytes: Vec::new(),
            format: Some(format),
            image,
        }
    }

    #[tokio::test]
    async fn test_non_jpeg_gets_single_save_default() {
        let record = DoubleJpegDetector
            .extract(&ctx_from(DynamicImage::new_rgb8(64, 64), ImageFormat::Png))
            .await
            .unwrap();
        let SignalRecord::DoubleJpeg(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(!evidence.double_compression_detected);
        assert_eq!(evidence.compression_count_estimate, 1);
        assert_eq!(evidence.status, MeasurementStatus::Measured);
    }

    #[tokio::test]
    async fn test_flat_jpeg_shows_no_compression_history() {
        let record = DoubleJpegDetector
            .extract(&ctx_from(DynamicImage::new_rgb8(64, 64), ImageFormat::Jpeg))
            .await
            .unwrap();
        let SignalRecord::DoubleJpeg(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(!evidence.double_compression_detected);
        assert!(!evidence.likely_edited);
        assert_eq!(evidence.compression_history_score, 0.0);
        assert_eq!(evidence.quantization_mismatch, 0.0);
    }

    #[test]
    fn test_constant_coefficients_are_not_periodic() {
        let values = vec![5.0; 200];
        assert!(!histogram_is_periodic(&values));
    }
}
