//! Color Distribution Analyzer
//!
//! **[PV-EXT-060]** Whole-frame color statistics: generators favor
//! implausibly saturated palettes, and per-channel histograms with a
//! single dominant spike point at synthetic or heavily graded content.

use crate::extractors::{ExtractError, ImageContext, SignalExtractor};
use crate::records::{ColorEvidence, MeasurementStatus, Signal, SignalRecord};

/// Mean saturation (0-255) above this is outside the photographic range
const SATURATION_THRESHOLD: f64 = 180.0;

/// A histogram bin this many times the mean count is a spike
const SPIKE_FACTOR: f64 = 50.0;

pub struct ColorDistributionAnalyzer;

#[async_trait::async_trait]
impl SignalExtractor for ColorDistributionAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Color
    }

    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
        let rgb = ctx.image.to_rgb8();
        let pixel_count = rgb.pixels().len();
        if pixel_count == 0 {
            return Err(ExtractError::Decode("empty image".to_string()));
        }

        let mut hue_hist = [0usize; 256];
        let mut sat_hist = [0usize; 256];
        let mut val_hist = [0usize; 256];
        let mut rgb_hists = [[0usize; 256]; 3];
        let mut sat_sum = 0.0;

        for px in rgb.pixels() {
            let (hue, sat, val) = rgb_to_hsv(px[0], px[1], px[2]);
            hue_hist[hue as usize] += 1;
            sat_hist[sat as usize] += 1;
            val_hist[val as usize] += 1;
            sat_sum += f64::from(sat);
            for c in 0..3 {
                rgb_hists[c][px[c] as usize] += 1;
            }
        }

        let color_saturation_avg = sat_sum / pixel_count as f64;
        let histogram_uniformity =
            (entropy(&hue_hist) + entropy(&sat_hist) + entropy(&val_hist)) / 3.0;

        let mean_count = pixel_count as f64 / 256.0;
        let unusual_patterns = rgb_hists.iter().any(|hist| {
            hist.iter()
                .any(|&count| count as f64 > SPIKE_FACTOR * mean_count)
        });

        let oversaturated = color_saturation_avg > SATURATION_THRESHOLD;
        Ok(SignalRecord::Color(ColorEvidence {
            histogram_uniformity,
            color_saturation_avg,
            unusual_patterns: unusual_patterns || oversaturated,
            ai_signature_detected: oversaturated,
            status: MeasurementStatus::Measured,
        }))
    }
}

/// RGB to HSV with hue on 0-179 and saturation/value on 0-255
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let rf = f64::from(r) / 255.0;
    let gf = f64::from(g) / 255.0;
    let bf = f64::from(b) / 255.0;
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (((gf - bf) / delta).rem_euclid(6.0))
    } else if max == gf {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };
    let sat = if max == 0.0 { 0.0 } else { delta / max };

    (
        (hue / 2.0).round().min(179.0) as u8,
        (sat * 255.0).round() as u8,
        (max * 255.0).round() as u8,
    )
}

/// Shannon entropy in bits of a count histogram
fn entropy(hist: &[usize; 256]) -> f64 {
    let total: usize = hist.iter().sum();
    if total == 0 {
        return 0.0;
    }
    hist.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
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
    async fn test_pure_saturated_color_flags_ai_signature() {
        let image = RgbImage::from_pixel(32, 32, image::Rgb([255, 0, 0]));
        let record = ColorDistributionAnalyzer
            .extract(&ctx_from(DynamicImage::ImageRgb8(image)))
            .await
            .unwrap();
        let SignalRecord::Color(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(evidence.ai_signature_detected);
        assert!(evidence.unusual_patterns);
        assert!(evidence.color_saturation_avg > SATURATION_THRESHOLD);
    }

    #[tokio::test]
    async fn test_gradient_ramp_is_unremarkable() {
        // Low saturation, histogram mass spread over many bins
        let image = RgbImage::from_fn(256, 32, |x, _| {
            let v = x as u8;
            image::Rgb([v, v, v])
        });
        let record = ColorDistributionAnalyzer
            .extract(&ctx_from(DynamicImage::ImageRgb8(image)))
            .await
            .unwrap();
        let SignalRecord::Color(evidence) = record else {
            panic!("wrong record variant");
        };
        assert!(!evidence.ai_signature_detected);
        assert!(!evidence.unusual_patterns);
        assert!(evidence.histogram_uniformity > 0.0);
    }

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0, 255, 255));
        let (h, s, v) = rgb_to_hsv(0, 255, 0);
        assert_eq!((h, s, v), (60, 255, 255));
        assert_eq!(rgb_to_hsv(128, 128, 128).1, 0);
    }
}
