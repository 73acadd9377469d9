//! Weight Profile Selector
//!
//! **[PV-FUS-010]** Two fixed, hand-tuned weight tables. Weights are
//! integers summing to exactly 100 per profile; a profile is selected once
//! per analysis from provenance and passed by value into the aggregator.
//!
//! Rationale: for a contemporary image the CFA sensor pattern and GAN
//! fingerprint are the hardest signals to fake, so they weigh most. An old
//! photograph predates generative models, so CFA absence and
//! double-compression are weak synthesis evidence there (decades of
//! re-saving degrade both), while metadata and GAN-fingerprint absence
//! gain weight.

use crate::provenance::Provenance;
use crate::records::Signal;
use serde::{Deserialize, Serialize};

/// Per-signal integer weights, summing to 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub metadata: u32,
    pub jpeg: u32,
    pub chromatic: u32,
    pub color: u32,
    pub texture: u32,
    pub gan_fingerprint: u32,
    pub noise_inconsistency: u32,
    pub benford_law: u32,
    pub cfa_detection: u32,
    pub double_jpeg: u32,
    pub gradient: u32,
}

impl WeightProfile {
    /// Weight table for contemporary images
    pub fn standard() -> Self {
        let profile = Self {
            cfa_detection: 15,
            gan_fingerprint: 12,
            noise_inconsistency: 12,
            benford_law: 10,
            metadata: 8,
            double_jpeg: 8,
            gradient: 8,
            chromatic: 7,
            color: 7,
            texture: 7,
            jpeg: 6,
        };
        debug_assert_eq!(profile.total(), 100);
        profile
    }

    /// Weight table for images dated before the generative-AI era
    pub fn old_image() -> Self {
        let profile = Self {
            metadata: 15,
            gan_fingerprint: 15,
            chromatic: 12,
            cfa_detection: 10,
            noise_inconsistency: 10,
            benford_law: 8,
            gradient: 8,
            color: 7,
            double_jpeg: 5,
            texture: 5,
            jpeg: 5,
        };
        debug_assert_eq!(profile.total(), 100);
        profile
    }

    /// Select the profile matching the image's provenance
    pub fn for_provenance(provenance: &Provenance) -> Self {
        if provenance.is_old_image {
            Self::old_image()
        } else {
            Self::standard()
        }
    }

    /// Weight assigned to `signal` in this profile
    pub fn weight(&self, signal: Signal) -> f64 {
        let w = match signal {
            Signal::Metadata => self.metadata,
            Signal::Jpeg => self.jpeg,
            Signal::Chromatic => self.chromatic,
            Signal::Color => self.color,
            Signal::Texture => self.texture,
            Signal::Gan => self.gan_fingerprint,
            Signal::Noise => self.noise_inconsistency,
            Signal::Benford => self.benford_law,
            Signal::Cfa => self.cfa_detection,
            Signal::DoubleJpeg => self.double_jpeg,
            Signal::Gradient => self.gradient,
        };
        f64::from(w)
    }

    /// Sum of all eleven weights
    pub fn total(&self) -> u32 {
        Signal::ALL
            .iter()
            .map(|&s| self.weight(s) as u32)
            .sum()
    }
}
