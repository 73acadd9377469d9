//! Evidence Record Types
//!
//! **[PV-REC-010]** One closed struct per forensic signal. Every field an
//! extractor can report is typed here; "missing field" is unrepresentable.
//! `Default` for each record produces the documented neutral values (zero
//! scores, false flags), which is exactly what the parallel runner installs
//! when an extractor fails.
//!
//! **[PV-REC-020]** Each record carries a [`MeasurementStatus`] so callers
//! can distinguish "no anomaly found" from "measurement failed". The score
//! aggregator deliberately ignores the status: defaulted records contribute
//! the same neutral evidence a clean measurement would.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The eleven forensic signals consumed by the fusion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// EXIF / metadata analysis
    Metadata,
    /// JPEG artifact analysis (blockiness, quality estimate)
    Jpeg,
    /// Chromatic aberration analysis
    Chromatic,
    /// Color distribution analysis
    Color,
    /// Texture consistency analysis
    Texture,
    /// GAN frequency-domain fingerprint detection
    Gan,
    /// Regional noise inconsistency analysis
    Noise,
    /// Benford's-law first-digit analysis
    Benford,
    /// CFA (Bayer) sensor pattern detection
    Cfa,
    /// Double JPEG compression detection
    DoubleJpeg,
    /// Gradient smoothness / anomaly analysis
    Gradient,
}

impl Signal {
    /// All signals, in the order the aggregator walks them
    pub const ALL: [Signal; 11] = [
        Signal::Cfa,
        Signal::Gan,
        Signal::Noise,
        Signal::Benford,
        Signal::Metadata,
        Signal::DoubleJpeg,
        Signal::Gradient,
        Signal::Chromatic,
        Signal::Color,
        Signal::Texture,
        Signal::Jpeg,
    ];

    /// Stable key used in evidence maps and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Metadata => "metadata",
            Signal::Jpeg => "jpeg",
            Signal::Chromatic => "chromatic",
            Signal::Color => "color",
            Signal::Texture => "texture",
            Signal::Gan => "gan",
            Signal::Noise => "noise",
            Signal::Benford => "benford",
            Signal::Cfa => "cfa",
            Signal::DoubleJpeg => "double_jpeg",
            Signal::Gradient => "gradient",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a record holds a real measurement or extractor-failure defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeasurementStatus {
    /// Extractor ran to completion
    Measured,
    /// Extractor failed; record holds neutral defaults
    #[default]
    Defaulted,
}

// ============================================================================
// Per-signal records
// ============================================================================

/// Metadata / EXIF evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataEvidence {
    /// Container format as detected from the byte stream (e.g. "JPEG")
    pub format: Option<String>,
    /// Image dimensions (width, height)
    pub dimensions: Option<(u32, u32)>,
    /// EXIF tag name -> stringified value
    pub exif: BTreeMap<String, String>,
    /// Values of software/processing tags found in EXIF
    pub software_tags: Vec<String>,
    /// Human-readable anomaly notes ("No EXIF data found", etc.)
    pub anomalies: Vec<String>,
    pub status: MeasurementStatus,
}

impl MetadataEvidence {
    /// True when any EXIF tag was present
    pub fn has_exif(&self) -> bool {
        !self.exif.is_empty()
    }
}

/// Estimated JPEG compression quality band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityEstimate {
    #[default]
    Unknown,
    /// Quality roughly 60-75
    Low,
    /// Quality roughly 75-90
    Medium,
    /// Quality 90-100, or the image was never JPEG-compressed
    HighOrUncompressed,
}

impl fmt::Display for QualityEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityEstimate::Unknown => "Unknown",
            QualityEstimate::Low => "Low (60-75)",
            QualityEstimate::Medium => "Medium (75-90)",
            QualityEstimate::HighOrUncompressed => "High (90-100) or Uncompressed",
        };
        f.write_str(s)
    }
}

/// JPEG artifact evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JpegEvidence {
    pub has_jpeg_artifacts: bool,
    /// Mean intensity step across 8-pixel block boundaries
    pub blockiness_score: f64,
    pub quality_estimate: QualityEstimate,
    pub is_suspicious: bool,
    pub status: MeasurementStatus,
}

/// Chromatic aberration evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChromaticEvidence {
    pub has_chromatic_aberration: bool,
    /// Per-pixel rate of edge misalignment between color channels
    pub aberration_score: f64,
    pub pattern_consistency: f64,
    pub is_suspicious: bool,
    pub status: MeasurementStatus,
}

/// Color distribution evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorEvidence {
    /// Mean HSV-channel histogram entropy
    pub histogram_uniformity: f64,
    /// Mean saturation over the whole frame (0-255 scale)
    pub color_saturation_avg: f64,
    pub unusual_patterns: bool,
    pub ai_signature_detected: bool,
    pub status: MeasurementStatus,
}

/// Texture consistency evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureEvidence {
    /// Mean local variance over a 15x15 window
    pub texture_variance: f64,
    /// Laplacian variance
    pub smoothness_score: f64,
    /// Self-similar region repeated elsewhere in the frame (clone stamp)
    pub repetition_detected: bool,
    pub is_suspicious: bool,
    pub status: MeasurementStatus,
}

/// GAN fingerprint evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GanEvidence {
    pub gan_signature_detected: bool,
    /// Spread of the radial FFT spectrum differences
    pub frequency_anomaly_score: f64,
    /// Fraction of DCT energy in the high-frequency band
    pub high_freq_pattern_score: f64,
    /// Total spectral residual energy
    pub spectral_residual_score: f64,
    pub is_suspicious: bool,
    pub status: MeasurementStatus,
}

/// Confidence band reported by the noise inconsistency extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseConfidence {
    #[default]
    Low,
    Medium,
    High,
}

/// Regional noise inconsistency evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseEvidence {
    /// Coefficient of variation of per-region noise variances
    pub noise_variance_inconsistency: f64,
    pub regions_analyzed: usize,
    /// Regions with abnormally low or high noise variance
    pub suspicious_regions: usize,
    pub noise_variance_std: f64,
    pub is_suspicious: bool,
    pub confidence: NoiseConfidence,
    pub status: MeasurementStatus,
}

/// Benford's-law evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenfordEvidence {
    /// L1 distance between observed and expected first-digit frequencies
    pub benford_deviation: f64,
    pub chi_square_statistic: f64,
    pub p_value: f64,
    pub follows_benford: bool,
    pub is_suspicious: bool,
    pub status: MeasurementStatus,
}

/// CFA (Bayer) sensor pattern evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfaEvidence {
    pub cfa_pattern_detected: bool,
    /// Mean 2-pixel periodic correlation across channels
    pub cfa_strength: f64,
    /// Description of the detected pattern ("Bayer-like", "None", ...)
    pub pattern_type: String,
    pub is_real_camera: bool,
    pub is_suspicious: bool,
    pub status: MeasurementStatus,
}

impl Default for CfaEvidence {
    fn default() -> Self {
        Self {
            cfa_pattern_detected: false,
            cfa_strength: 0.0,
            pattern_type: "None".to_string(),
            is_real_camera: false,
            is_suspicious: false,
            status: MeasurementStatus::Defaulted,
        }
    }
}

/// Double JPEG compression evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleJpegEvidence {
    pub double_compression_detected: bool,
    /// Fraction of inspected AC coefficients showing periodic histograms
    pub compression_history_score: f64,
    /// Variance of intensity steps across block boundaries
    pub quantization_mismatch: f64,
    pub likely_edited: bool,
    /// Estimated number of compression cycles (1 = single save)
    pub compression_count_estimate: u32,
    pub status: MeasurementStatus,
}

impl Default for DoubleJpegEvidence {
    fn default() -> Self {
        Self {
            double_compression_detected: false,
            compression_history_score: 0.0,
            quantization_mismatch: 0.0,
            likely_edited: false,
            compression_count_estimate: 1,
            status: MeasurementStatus::Defaulted,
        }
    }
}

/// Gradient anomaly evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientEvidence {
    /// First-order to second-order gradient magnitude ratio
    pub gradient_smoothness: f64,
    /// Mean local variance of gradient direction
    pub gradient_consistency: f64,
    pub unnatural_smoothness_detected: bool,
    pub sharp_transition_count: usize,
    pub is_suspicious: bool,
    pub status: MeasurementStatus,
}

// ============================================================================
// Uniform record wrapper and bundle
// ============================================================================

/// Tagged union over all per-signal records
///
/// **[PV-REC-030]** Lets the parallel runner and mocks stay
/// extractor-agnostic while every payload remains a closed struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalRecord {
    Metadata(MetadataEvidence),
    Jpeg(JpegEvidence),
    Chromatic(ChromaticEvidence),
    Color(ColorEvidence),
    Texture(TextureEvidence),
    Gan(GanEvidence),
    Noise(NoiseEvidence),
    Benford(BenfordEvidence),
    Cfa(CfaEvidence),
    DoubleJpeg(DoubleJpegEvidence),
    Gradient(GradientEvidence),
}

impl SignalRecord {
    /// Which signal this record belongs to
    pub fn signal(&self) -> Signal {
        match self {
            SignalRecord::Metadata(_) => Signal::Metadata,
            SignalRecord::Jpeg(_) => Signal::Jpeg,
            SignalRecord::Chromatic(_) => Signal::Chromatic,
            SignalRecord::Color(_) => Signal::Color,
            SignalRecord::Texture(_) => Signal::Texture,
            SignalRecord::Gan(_) => Signal::Gan,
            SignalRecord::Noise(_) => Signal::Noise,
            SignalRecord::Benford(_) => Signal::Benford,
            SignalRecord::Cfa(_) => Signal::Cfa,
            SignalRecord::DoubleJpeg(_) => Signal::DoubleJpeg,
            SignalRecord::Gradient(_) => Signal::Gradient,
        }
    }

    /// Neutral record for `signal`, as installed after extractor failure
    pub fn neutral(signal: Signal) -> Self {
        match signal {
            Signal::Metadata => SignalRecord::Metadata(MetadataEvidence::default()),
            Signal::Jpeg => SignalRecord::Jpeg(JpegEvidence::default()),
            Signal::Chromatic => SignalRecord::Chromatic(ChromaticEvidence::default()),
            Signal::Color => SignalRecord::Color(ColorEvidence::default()),
            Signal::Texture => SignalRecord::Texture(TextureEvidence::default()),
            Signal::Gan => SignalRecord::Gan(GanEvidence::default()),
            Signal::Noise => SignalRecord::Noise(NoiseEvidence::default()),
            Signal::Benford => SignalRecord::Benford(BenfordEvidence::default()),
            Signal::Cfa => SignalRecord::Cfa(CfaEvidence::default()),
            Signal::DoubleJpeg => SignalRecord::DoubleJpeg(DoubleJpegEvidence::default()),
            Signal::Gradient => SignalRecord::Gradient(GradientEvidence::default()),
        }
    }
}

/// Complete set of evidence records for one image
///
/// The aggregator requires all eleven records; the bundle starts neutral
/// and each successful extraction replaces its slot. Immutable once the
/// fan-in barrier completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub metadata: MetadataEvidence,
    pub jpeg: JpegEvidence,
    pub chromatic: ChromaticEvidence,
    pub color: ColorEvidence,
    pub texture: TextureEvidence,
    pub gan: GanEvidence,
    pub noise: NoiseEvidence,
    pub benford: BenfordEvidence,
    pub cfa: CfaEvidence,
    pub double_jpeg: DoubleJpegEvidence,
    pub gradient: GradientEvidence,
}

impl EvidenceBundle {
    /// Replace the slot matching `record`'s signal
    pub fn install(&mut self, record: SignalRecord) {
        match record {
            SignalRecord::Metadata(r) => self.metadata = r,
            SignalRecord::Jpeg(r) => self.jpeg = r,
            SignalRecord::Chromatic(r) => self.chromatic = r,
            SignalRecord::Color(r) => self.color = r,
            SignalRecord::Texture(r) => self.texture = r,
            SignalRecord::Gan(r) => self.gan = r,
            SignalRecord::Noise(r) => self.noise = r,
            SignalRecord::Benford(r) => self.benford = r,
            SignalRecord::Cfa(r) => self.cfa = r,
            SignalRecord::DoubleJpeg(r) => self.double_jpeg = r,
            SignalRecord::Gradient(r) => self.gradient = r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_records_have_zero_scores_and_false_flags() {
        for signal in Signal::ALL {
            let record = SignalRecord::neutral(signal);
            assert_eq!(record.signal(), signal);
        }

        let cfa = CfaEvidence::default();
        assert!(!cfa.cfa_pattern_detected);
        assert_eq!(cfa.cfa_strength, 0.0);
        assert_eq!(cfa.pattern_type, "None");
        assert_eq!(cfa.status, MeasurementStatus::Defaulted);

        let dj = DoubleJpegEvidence::default();
        assert_eq!(dj.compression_count_estimate, 1);
        assert!(!dj.double_compression_detected);
    }

    #[test]
    fn test_bundle_install_replaces_slot() {
        let mut bundle = EvidenceBundle::default();
        bundle.install(SignalRecord::Gan(GanEvidence {
            gan_signature_detected: true,
            status: MeasurementStatus::Measured,
            ..GanEvidence::default()
        }));

        assert!(bundle.gan.gan_signature_detected);
        assert_eq!(bundle.gan.status, MeasurementStatus::Measured);
        // Other slots stay neutral
        assert!(!bundle.cfa.cfa_pattern_detected);
    }

    #[test]
    fn test_signal_keys_are_unique() {
        let mut keys: Vec<&str> = Signal::ALL.iter().map(|s| s.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 11);
    }
}
