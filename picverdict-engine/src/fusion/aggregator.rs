//! Score Aggregator
//!
//! **[PV-FUS-020]** Walks all eleven evidence records and applies one
//! dedicated rule block per signal. A rule block adds some fraction (0 to
//! 1.0) of the signal's configured weight to one or more of the three
//! accumulators; weak measurements split partial credit across two
//! categories to model genuine uncertainty. CFA and double-compression
//! rules consult provenance: their anomalies are far less damning for an
//! image that predates generative models.
//!
//! **[PV-FUS-021]** Every rule block appends at least one evidence string
//! under its signal's key, including when nothing anomalous was found, so
//! the final report is fully auditable. Rule blocks cannot fail: evidence
//! records are contractually complete, with neutral defaults standing in
//! for failed measurements.

use crate::fusion::weights::WeightProfile;
use crate::fusion::ScoreTriple;
use crate::provenance::Provenance;
use crate::records::{EvidenceBundle, NoiseConfidence, QualityEstimate, Signal};
use crate::report::CategorizedEvidence;
use std::collections::BTreeMap;

/// Aggregation result: raw scores plus the full evidence trail
#[derive(Debug, Clone)]
pub struct AggregationOutput {
    pub scores: ScoreTriple,
    pub evidence: BTreeMap<Signal, Vec<String>>,
    pub categorized: CategorizedEvidence,
}

/// Running state shared by the rule blocks
struct Tally {
    scores: ScoreTriple,
    evidence: BTreeMap<Signal, Vec<String>>,
    categorized: CategorizedEvidence,
}

impl Tally {
    fn new() -> Self {
        let mut evidence = BTreeMap::new();
        for signal in Signal::ALL {
            evidence.insert(signal, Vec::new());
        }
        Self {
            scores: ScoreTriple::default(),
            evidence,
            categorized: CategorizedEvidence::default(),
        }
    }

    fn note(&mut self, signal: Signal, text: impl Into<String>) {
        self.evidence.entry(signal).or_default().push(text.into());
    }

    fn for_generated(&mut self, text: impl Into<String>) {
        self.categorized.ai_generated.push(text.into());
    }

    fn for_edited(&mut self, text: impl Into<String>) {
        self.categorized.ai_edited.push(text.into());
    }

    fn for_real(&mut self, text: impl Into<String>) {
        self.categorized.real_photo.push(text.into());
    }
}

/// Year label for evidence strings; old images always have a capture year,
/// but the formatter must not assume it.
fn year_label(provenance: &Provenance) -> String {
    provenance
        .capture_year
        .map_or_else(|| "unknown".to_string(), |y| y.to_string())
}

/// Run all eleven rule blocks against the bundle.
pub fn aggregate(
    bundle: &EvidenceBundle,
    weights: &WeightProfile,
    provenance: &Provenance,
) -> AggregationOutput {
    let mut tally = Tally::new();

    if provenance.is_old_image {
        tally.for_real(format!(
            "✓ Old image from {} (pre-AI era)",
            year_label(provenance)
        ));
    }

    score_cfa(&mut tally, bundle, weights, provenance);
    score_gan(&mut tally, bundle, weights);
    score_noise(&mut tally, bundle, weights);
    score_benford(&mut tally, bundle, weights);
    score_metadata(&mut tally, bundle, weights);
    score_double_jpeg(&mut tally, bundle, weights, provenance);
    score_gradient(&mut tally, bundle, weights);
    score_chromatic(&mut tally, bundle, weights);
    score_color(&mut tally, bundle, weights);
    score_texture(&mut tally, bundle, weights);
    score_jpeg(&mut tally, bundle, weights);

    AggregationOutput {
        scores: tally.scores,
        evidence: tally.evidence,
        categorized: tally.categorized,
    }
}

/// Rule block 1: CFA detection — the most discriminating single test.
fn score_cfa(
    tally: &mut Tally,
    bundle: &EvidenceBundle,
    weights: &WeightProfile,
    provenance: &Provenance,
) {
    let cfa = &bundle.cfa;
    let w = weights.weight(Signal::Cfa);

    if cfa.cfa_pattern_detected {
        tally.scores.real_photo += w;
        tally.for_real(
            "✓✓ Camera sensor pattern (CFA) detected - Strong indicator of real camera photo",
        );
        tally.note(Signal::Cfa, format!("CFA detected: {}", cfa.pattern_type));
    } else if provenance.is_old_image {
        // Absent CFA is expected in an old, repeatedly re-saved image.
        if cfa.cfa_strength >= 0.01 {
            tally.scores.real_photo += w * 0.7;
            tally.for_real(format!(
                "✓ Weak CFA detected ({:.4}) - Acceptable for old/compressed image",
                cfa.cfa_strength
            ));
            tally.note(
                Signal::Cfa,
                format!("Weak CFA (old image): {:.4}", cfa.cfa_strength),
            );
        } else {
            tally.scores.real_photo += w * 0.3;
            tally.scores.ai_edited += w * 0.4;
            tally.for_real(format!(
                "⚠ CFA degraded by age/compression ({})",
                year_label(provenance)
            ));
            tally.note(
                Signal::Cfa,
                format!("CFA lost to compression (pre-{})", year_label(provenance)),
            );
        }
    } else if cfa.cfa_strength < 0.02 {
        tally.scores.ai_generated += w;
        tally.for_generated("⚠⚠ No camera sensor pattern - Not taken with a camera");
        tally.note(Signal::Cfa, "No CFA pattern detected");
    } else {
        tally.scores.ai_edited += w * 0.7;
        tally.scores.ai_generated += w * 0.3;
        tally.for_edited("⚠ Weak camera sensor pattern - Possibly edited or compressed");
        tally.note(Signal::Cfa, format!("Weak CFA: {:.4}", cfa.cfa_strength));
    }
}

/// Rule block 2: GAN frequency-domain fingerprint.
fn score_gan(tally: &mut Tally, bundle: &EvidenceBundle, weights: &WeightProfile) {
    let gan = &bundle.gan;
    let w = weights.weight(Signal::Gan);

    if gan.gan_signature_detected {
        tally.scores.ai_generated += w;
        tally.for_generated(format!(
            "⚠⚠ GAN fingerprint detected (High-freq: {:.4})",
            gan.high_freq_pattern_score
        ));
        tally.note(Signal::Gan, "GAN signature detected");
    } else if gan.is_suspicious {
        tally.scores.ai_generated += w * 0.5;
        tally.scores.ai_edited += w * 0.3;
        tally.for_generated("⚠ Suspicious frequency patterns detected");
        tally.note(Signal::Gan, "Suspicious frequency patterns");
    } else {
        tally.scores.real_photo += w * 0.5;
        tally.for_real("✓ Natural frequency patterns");
        tally.note(Signal::Gan, "Natural frequency patterns");
    }
}

/// Rule block 3: regional noise inconsistency.
fn score_noise(tally: &mut Tally, bundle: &EvidenceBundle, weights: &WeightProfile) {
    let noise = &bundle.noise;
    let w = weights.weight(Signal::Noise);

    if noise.is_suspicious {
        let regions = noise.suspicious_regions;
        if noise.confidence == NoiseConfidence::High && regions >= 3 {
            tally.scores.ai_generated += w;
            tally.for_generated(format!(
                "⚠ Inconsistent noise across {regions} regions - AI artifact"
            ));
            tally.note(
                Signal::Noise,
                format!("High noise inconsistency ({regions} regions)"),
            );
        } else if matches!(
            noise.confidence,
            NoiseConfidence::High | NoiseConfidence::Medium
        ) {
            tally.scores.ai_edited += w;
            tally.for_edited(format!(
                "⚠ Regional noise inconsistency ({regions} regions) - Likely edited"
            ));
            tally.note(
                Signal::Noise,
                format!("Noise inconsistency in {regions} regions"),
            );
        } else {
            tally.scores.ai_edited += w * 0.5;
            tally.for_edited("⚠ Minor noise inconsistencies detected");
            tally.note(Signal::Noise, "Minor noise variations");
        }
    } else {
        tally.scores.real_photo += w;
        tally.for_real("✓ Consistent sensor noise throughout image");
        tally.note(Signal::Noise, "Consistent sensor noise");
    }
}

/// Rule block 4: Benford's-law first-digit distribution.
fn score_benford(tally: &mut Tally, bundle: &EvidenceBundle, weights: &WeightProfile) {
    let benford = &bundle.benford;
    let w = weights.weight(Signal::Benford);

    if benford.follows_benford {
        tally.scores.real_photo += w;
        tally.for_real(format!(
            "✓ Follows Benford's Law (p={:.3}) - Natural distribution",
            benford.p_value
        ));
        tally.note(Signal::Benford, "Follows Benford's Law");
    } else if benford.is_suspicious {
        let deviation = benford.benford_deviation;
        if deviation > 0.15 {
            tally.scores.ai_generated += w;
            tally.for_generated(format!(
                "⚠ Significant deviation from Benford's Law ({deviation:.3}) - Unnatural distribution"
            ));
            tally.note(
                Signal::Benford,
                format!("Deviates from Benford's Law ({deviation:.3})"),
            );
        } else {
            tally.scores.ai_edited += w * 0.6;
            tally.for_edited(format!(
                "⚠ Minor deviation from Benford's Law ({deviation:.3})"
            ));
            tally.note(
                Signal::Benford,
                format!("Minor Benford deviation ({deviation:.3})"),
            );
        }
    } else {
        // Neither conclusion reached (e.g. measurement defaulted)
        tally.note(Signal::Benford, "Benford test inconclusive");
    }
}

/// Rule block 5: metadata presence and software tags.
fn score_metadata(tally: &mut Tally, bundle: &EvidenceBundle, weights: &WeightProfile) {
    let metadata = &bundle.metadata;
    let w = weights.weight(Signal::Metadata);

    if !metadata.has_exif() {
        if metadata.software_tags.is_empty() {
            tally.scores.ai_generated += w;
            tally.for_generated("⚠ No EXIF data - Not from a camera");
            tally.note(Signal::Metadata, "No EXIF data");
        } else {
            let tags = metadata.software_tags.join(", ");
            tally.scores.ai_edited += w;
            tally.for_edited(format!("⚠ Editing software detected: {tags}"));
            tally.note(Signal::Metadata, format!("Software: {tags}"));
        }
    } else {
        tally.scores.real_photo += w;
        tally.for_real("✓ Camera metadata present");
        tally.note(Signal::Metadata, "EXIF data present");

        const EDITOR_TERMS: [&str; 7] =
            ["ai", "neural", "adobe", "photoshop", "gimp", "paint", "canva"];
        let has_editor_tag = metadata.software_tags.iter().any(|tag| {
            let lower = tag.to_lowercase();
            EDITOR_TERMS.iter().any(|term| lower.contains(term))
        });
        if has_editor_tag {
            let tags = metadata.software_tags.join(", ");
            tally.scores.ai_edited += w * 0.5;
            tally.for_edited(format!("⚠ Editing software in metadata: {tags}"));
            tally.note(Signal::Metadata, format!("Editing software: {tags}"));
        }
    }
}

/// Rule block 6: double JPEG compression.
fn score_double_jpeg(
    tally: &mut Tally,
    bundle: &EvidenceBundle,
    weights: &WeightProfile,
    provenance: &Provenance,
) {
    let dj = &bundle.double_jpeg;
    let w = weights.weight(Signal::DoubleJpeg);

    if dj.double_compression_detected {
        if provenance.is_old_image {
            // Old images have usually been re-saved many times.
            tally.scores.real_photo += w * 0.5;
            tally.for_real(format!(
                "✓ Multiple compressions expected for old image ({} cycles)",
                dj.compression_count_estimate
            ));
            tally.note(Signal::DoubleJpeg, "Normal re-compression for old image");
        } else {
            tally.scores.ai_edited += w;
            tally.for_edited(format!(
                "⚠ Double JPEG compression detected ({} cycles)",
                dj.compression_count_estimate
            ));
            tally.note(
                Signal::DoubleJpeg,
                format!("Double compression ({} times)", dj.compression_count_estimate),
            );
        }
    } else if dj.likely_edited {
        if provenance.is_old_image {
            tally.scores.real_photo += w * 0.3;
            tally.note(Signal::DoubleJpeg, "Compression artifacts (age-related)");
        } else {
            tally.scores.ai_edited += w * 0.6;
            tally.for_edited("⚠ Compression artifacts suggest editing");
            tally.note(Signal::DoubleJpeg, "Compression artifacts");
        }
    } else {
        tally.scores.real_photo += w * 0.4;
        tally.note(Signal::DoubleJpeg, "Single compression");
    }
}

/// Rule block 7: gradient smoothness anomalies.
fn score_gradient(tally: &mut Tally, bundle: &EvidenceBundle, weights: &WeightProfile) {
    let gradient = &bundle.gradient;
    let w = weights.weight(Signal::Gradient);

    if gradient.unnatural_smoothness_detected {
        let smoothness = gradient.gradient_smoothness;
        if smoothness > 15.0 {
            tally.scores.ai_generated += w;
            tally.for_generated(format!(
                "⚠ Unnatural smoothness ({smoothness:.1}) - AI artifact"
            ));
            tally.note(
                Signal::Gradient,
                format!("Unnatural smoothness ({smoothness:.1})"),
            );
        } else {
            tally.scores.ai_edited += w * 0.7;
            tally.for_edited(format!("⚠ Smoothing detected ({smoothness:.1})"));
            tally.note(Signal::Gradient, "Smoothing detected");
        }
    } else {
        tally.scores.real_photo += w * 0.5;
        tally.for_real("✓ Natural gradient transitions");
        tally.note(Signal::Gradient, "Natural gradients");
    }
}

/// Rule block 8: chromatic aberration.
fn score_chromatic(tally: &mut Tally, bundle: &EvidenceBundle, weights: &WeightProfile) {
    let chromatic = &bundle.chromatic;
    let w = weights.weight(Signal::Chromatic);

    if chromatic.has_chromatic_aberration {
        tally.scores.real_photo += w;
        tally.for_real(format!(
            "✓ Natural lens aberration present ({:.5})",
            chromatic.aberration_score
        ));
        tally.note(Signal::Chromatic, "Natural lens aberration");
    } else if chromatic.is_suspicious {
        tally.scores.ai_generated += w * 0.6;
        tally.scores.ai_edited += w * 0.4;
        tally.for_generated("⚠ Missing expected lens aberration - Too perfect");
        tally.note(Signal::Chromatic, "Missing lens aberration");
    } else {
        tally.note(Signal::Chromatic, "Aberration measurement inconclusive");
    }
}

/// Rule block 9: color distribution.
fn score_color(tally: &mut Tally, bundle: &EvidenceBundle, weights: &WeightProfile) {
    let color = &bundle.color;
    let w = weights.weight(Signal::Color);

    if color.ai_signature_detected {
        tally.scores.ai_generated += w;
        tally.for_generated(format!(
            "⚠ AI color signature (Saturation: {:.1})",
            color.color_saturation_avg
        ));
        tally.note(Signal::Color, "AI color signature");
    } else if color.unusual_patterns {
        tally.scores.ai_edited += w * 0.7;
        tally.for_edited("⚠ Unusual color distribution patterns");
        tally.note(Signal::Color, "Unusual color patterns");
    } else {
        tally.scores.real_photo += w * 0.5;
        tally.for_real("✓ Natural color distribution");
        tally.note(Signal::Color, "Natural colors");
    }
}

/// Rule block 10: texture consistency.
fn score_texture(tally: &mut Tally, bundle: &EvidenceBundle, weights: &WeightProfile) {
    let texture = &bundle.texture;
    let w = weights.weight(Signal::Texture);

    if texture.repetition_detected {
        tally.scores.ai_edited += w;
        tally.for_edited("⚠ Repetitive texture patterns (clone stamp detected)");
        tally.note(Signal::Texture, "Clone stamp detected");
    } else if texture.is_suspicious {
        let variance = texture.texture_variance;
        if variance < 50.0 {
            tally.scores.ai_generated += w * 0.6;
            tally.for_generated(format!("⚠ Overly uniform texture ({variance:.1})"));
            tally.note(Signal::Texture, "Overly uniform texture");
        } else {
            tally.scores.ai_edited += w * 0.5;
            tally.note(Signal::Texture, "Suspicious texture");
        }
    } else {
        tally.scores.real_photo += w * 0.5;
        tally.for_real("✓ Natural texture variation");
        tally.note(Signal::Texture, "Natural texture");
    }
}

/// Rule block 11: JPEG artifact profile.
fn score_jpeg(tally: &mut Tally, bundle: &EvidenceBundle, weights: &WeightProfile) {
    let jpeg = &bundle.jpeg;
    let w = weights.weight(Signal::Jpeg);

    if jpeg.is_suspicious {
        if jpeg.quality_estimate == QualityEstimate::HighOrUncompressed {
            // Absence of compression loss is unusual for a photo but common
            // for freshly generated output.
            tally.scores.ai_generated += w * 0.6;
            tally.for_generated(format!("⚠ Unusual compression: {}", jpeg.quality_estimate));
            tally.note(
                Signal::Jpeg,
                format!("Unusual compression: {}", jpeg.quality_estimate),
            );
        } else {
            tally.scores.ai_edited += w * 0.5;
            tally.for_edited(format!(
                "⚠ Suspicious JPEG patterns ({})",
                jpeg.quality_estimate
            ));
            tally.note(Signal::Jpeg, "Suspicious patterns");
        }
    } else {
        tally.note(Signal::Jpeg, "Compression profile unremarkable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CfaEvidence, GanEvidence, MeasurementStatus, NoiseEvidence};

    fn standard() -> WeightProfile {
        WeightProfile::standard()
    }

    #[test]
    fn test_every_signal_key_gets_at_least_one_note() {
        let bundle = EvidenceBundle::default();
        let output = aggregate(&bundle, &standard(), &Provenance::default());

        for signal in Signal::ALL {
            let notes = output.evidence.get(&signal).unwrap();
            assert!(
                !notes.is_empty(),
                "signal {signal} produced no evidence note"
            );
        }
    }

    #[test]
    fn test_scores_never_negative() {
        let bundle = EvidenceBundle::default();
        let output = aggregate(&bundle, &standard(), &Provenance::default());

        assert!(output.scores.ai_generated >= 0.0);
        assert!(output.scores.ai_edited >= 0.0);
        assert!(output.scores.real_photo >= 0.0);
    }

    #[test]
    fn test_cfa_detected_credits_real_photo_fully() {
        let mut bundle = EvidenceBundle::default();
        bundle.cfa = CfaEvidence {
            cfa_pattern_detected: true,
            cfa_strength: 0.8,
            pattern_type: "Bayer-like".to_string(),
            is_real_camera: true,
            is_suspicious: false,
            status: MeasurementStatus::Measured,
        };

        let output = aggregate(&bundle, &standard(), &Provenance::default());
        assert!(output.scores.real_photo >= 15.0);
        assert!(output.evidence[&Signal::Cfa][0].contains("Bayer-like"));
    }

    #[test]
    fn test_weak_cfa_splits_credit_on_modern_image() {
        let mut bundle = EvidenceBundle::default();
        bundle.cfa.cfa_strength = 0.05; // weak but present

        let output = aggregate(&bundle, &standard(), &Provenance::default());
        // 15 * 0.7 to edited, 15 * 0.3 to generated from the CFA block
        assert!(output.scores.ai_edited >= 10.5);
        assert!(output.scores.ai_generated >= 4.5);
    }

    #[test]
    fn test_absent_cfa_tolerated_for_old_image() {
        let bundle = EvidenceBundle::default(); // cfa_strength 0.0
        let provenance = Provenance {
            is_old_image: true,
            capture_year: Some(2003),
        };
        let output = aggregate(&bundle, &WeightProfile::old_image(), &provenance);

        // Old-image branch splits 0.3 real / 0.4 edited instead of full AI credit
        let cfa_full = WeightProfile::old_image().weight(Signal::Cfa);
        assert!(output.scores.real_photo >= cfa_full * 0.3);
        assert!(output.evidence[&Signal::Cfa][0].contains("pre-2003"));
    }

    #[test]
    fn test_high_confidence_noise_with_regions_is_generation_evidence() {
        let mut bundle = EvidenceBundle::default();
        bundle.noise = NoiseEvidence {
            is_suspicious: true,
            confidence: NoiseConfidence::High,
            suspicious_regions: 4,
            regions_analyzed: 16,
            ..NoiseEvidence::default()
        };

        let output = aggregate(&bundle, &standard(), &Provenance::default());
        assert!(output.scores.ai_generated >= 12.0);
        assert!(output.categorized.ai_generated.iter().any(|s| s.contains("4 regions")));
    }

    #[test]
    fn test_gan_signature_full_weight() {
        let mut bundle = EvidenceBundle::default();
        bundle.gan = GanEvidence {
            gan_signature_detected: true,
            high_freq_pattern_score: 0.02,
            ..GanEvidence::default()
        };

        let output = aggregate(&bundle, &standard(), &Provenance::default());
        assert!(output.scores.ai_generated >= 12.0);
    }

    #[test]
    fn test_old_image_note_prepended() {
        let provenance = Provenance {
            is_old_image: true,
            capture_year: Some(2001),
        };
        let output = aggregate(
            &EvidenceBundle::default(),
            &WeightProfile::old_image(),
            &provenance,
        );
        assert!(output.categorized.real_photo[0].contains("2001"));
    }
}
