//! Benford's-Law First-Digit Analyzer
//!
//! **[PV-EXT-110]** First significant digits of natural-image gradient
//! magnitudes follow Benford's distribution; synthesized pixel statistics
//! usually do not. Deviation is graded two ways: an L1 distance on the
//! digit frequencies and a chi-square goodness-of-fit test.

use crate::extractors::util::{gray_f64, sobel};
use crate::extractors::{ExtractError, ImageContext, SignalExtractor};
use crate::records::{BenfordEvidence, MeasurementStatus, Signal, SignalRecord};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Chi-square significance level for rejecting Benford conformance
const P_VALUE_THRESHOLD: f64 = 0.05;

/// L1 frequency deviation above this is suspicious on its own
const DEVIATION_THRESHOLD: f64 = 0.15;

/// Minimum usable gradient samples for a meaningful digit distribution
const MIN_SAMPLES: usize = 100;

pub struct BenfordAnalyzer;

#[async_trait::async_trait]
impl SignalExtractor for BenfordAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Benford
    }

    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
        let gray = gray_f64(&ctx.image);
        let (gx, gy) = sobel(&gray);

        let mut digit_counts = [0usize; 9];
        let mut total = 0usize;
        for (x, y) in gx.iter().zip(gy.iter()) {
            let magnitude = (x * x + y * y).sqrt();
            if magnitude > 0.0 {
                digit_counts[first_digit(magnitude) - 1] += 1;
                total += 1;
            }
        }

        if total < MIN_SAMPLES {
            // Not enough edge content to grade; inconclusive measurement
            return Ok(SignalRecord::Benford(BenfordEvidence {
                p_value: 1.0,
                status: MeasurementStatus::Measured,
                ..BenfordEvidence::default()
            }));
        }

        let mut deviation = 0.0;
        let mut chi_square = 0.0;
        for (i, &count) in digit_counts.iter().enumerate() {
            let digit = (i + 1) as f64;
            let expected_freq = (1.0 + 1.0 / digit).log10();
            let observed_freq = count as f64 / total as f64;
            deviation += (observed_freq - expected_freq).abs();

            let expected_count = expected_freq * total as f64;
            chi_square += (count as f64 - expected_count).powi(2) / expected_count.max(1.0);
        }

        let chi_dist = ChiSquared::new(8.0)
            .map_err(|e| ExtractError::Numeric(format!("chi-square distribution: {e}")))?;
        let p_value = 1.0 - chi_dist.cdf(chi_square);

        let rejected = p_value < P_VALUE_THRESHOLD;
        Ok(SignalRecord::Benford(BenfordEvidence {
            benford_deviation: deviation,
            chi_square_statistic: chi_square,
            p_value,
            follows_benford: !rejected,
            is_suspicious: rejected || deviation > DEVIATION_THRESHOLD,
            status: MeasurementStatus::Measured,
        }))
    }
}

/// First significant digit (1-9) of a positive value
fn first_digit(value: f64) -> usize {
    let mut v = value;
    while v < 1.0 {
        v *= 10.0;
    }
    while v >= 10.0 {
        v /= 10.0;
    }
    v as usize
}
