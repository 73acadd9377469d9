//! Provenance Classifier
//!
//! **[PV-PROV-010]** Decides whether an image predates the generative-AI
//! era from its EXIF date fields. Derived once per analysis and held
//! read-only through aggregation, verdict resolution, and calibration.

use crate::records::MetadataEvidence;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// EXIF date fields inspected, in priority order
const DATE_FIELDS: [&str; 3] = ["DateTime", "DateTimeOriginal", "DateTimeDigitized"];

/// First year a capture date is considered plausible
const MIN_PLAUSIBLE_YEAR: i32 = 1990;

/// Images captured before this year predate the generative-AI era
const AI_ERA_YEAR: i32 = 2020;

/// Derived belief about an image's age
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Capture year in [1990, 2020) per EXIF
    pub is_old_image: bool,
    /// Capture year, when it parses cleanly and is plausible
    pub capture_year: Option<i32>,
}

impl Provenance {
    /// Classify provenance from the metadata evidence record.
    ///
    /// **[PV-PROV-020]** The first date field whose leading four characters
    /// parse as digits supplies the year and stops the scan; fields with
    /// unparseable prefixes are skipped silently. No reconciliation across
    /// fields is attempted.
    pub fn from_metadata(metadata: &MetadataEvidence) -> Self {
        let current_year = Utc::now().year();

        for field in DATE_FIELDS {
            let Some(value) = metadata.exif.get(field) else {
                continue;
            };
            if value.len() < 4 {
                continue;
            }
            let Some(prefix) = value.get(..4) else {
                continue;
            };
            let Ok(year) = prefix.parse::<i32>() else {
                // Non-digit prefix: ignore and keep scanning
                continue;
            };
            if prefix.chars().all(|c| c.is_ascii_digit()) {
                let capture_year = if (MIN_PLAUSIBLE_YEAR..=current_year).contains(&year) {
                    Some(year)
                } else {
                    None
                };
                return Self {
                    is_old_image: (MIN_PLAUSIBLE_YEAR..AI_ERA_YEAR).contains(&year),
                    capture_year,
                };
            }
        }

        Self::default()
    }

    /// True when the image is old and predates modern generative models
    pub fn predates_generative_models(&self) -> bool {
        self.is_old_image && self.capture_year.is_some_and(|y| y < 2015)
    }
}
