//! Metadata / EXIF extractor
//!
//! **[PV-EXT-030]** Reads EXIF tags from the raw container bytes via
//! `kamadak-exif`. An image with no EXIF block is a valid measurement (an
//! anomaly note is recorded), not a failure.

use crate::extractors::{ExtractError, ImageContext, SignalExtractor};
use crate::records::{MeasurementStatus, MetadataEvidence, Signal, SignalRecord};
use exif::{In, Reader};

/// Software names in EXIF that indicate post-processing
const EDITING_TOOLS: [&str; 5] = ["photoshop", "gimp", "lightroom", "ai", "upscaler"];

pub struct MetadataExtractor;

#[async_trait::async_trait]
impl SignalExtractor for MetadataExtractor {
    fn signal(&self) -> Signal {
        Signal::Metadata
    }

    async fn extract(&self, ctx: &ImageContext) -> Result<SignalRecord, ExtractError> {
        let mut evidence = MetadataEvidence {
            format: ctx.format.map(|f| format!("{f:?}").to_uppercase()),
            dimensions: Some((ctx.image.width(), ctx.image.height())),
            status: MeasurementStatus::Measured,
            ..MetadataEvidence::default()
        };

        let mut cursor = std::io::Cursor::new(ctx.raw_bytes.as_slice());
        match Reader::new().read_from_container(&mut cursor) {
            Ok(exif_data) => {
                for field in exif_data.fields() {
                    if field.ifd_num != In::PRIMARY {
                        continue;
                    }
                    evidence.exif.insert(
                        field.tag.to_string(),
                        field.display_value().to_string(),
                    );
                }

                if evidence.exif.is_empty() {
                    evidence.anomalies.push("No EXIF data found.".to_string());
                } else if let Some(software) = evidence.exif.get("Software").cloned() {
                    let lower = software.to_lowercase();
                    evidence.software_tags.push(software.clone());
                    if EDITING_TOOLS.iter().any(|tool| lower.contains(tool)) {
                        evidence.anomalies.push(format!(
                            "Potential editing software detected: {software}"
                        ));
                    }
                }
            }
            Err(_) => {
                // PNG/WebP and stripped JPEGs commonly carry no EXIF block
                evidence.anomalies.push("No EXIF data found.".to_string());
            }
        }

        Ok(SignalRecord::Metadata(evidence))
    }
}
