//! Analysis Engine
//!
//! **[PV-ENG-010]** The public entry points: `analyze` for one image and
//! `batch_analyze` for many. The engine performs the single decode per
//! image, fans out to the extractor set, and hands the fused evidence to
//! the classifier. Entry-level failures (missing file, undecodable bytes)
//! are the only errors that surface to callers.

use crate::extractors::{ExtractorSet, ImageContext};
use crate::fusion::classify;
use crate::report::AnalysisReport;
use futures::stream::{self, StreamExt};
use picverdict_common::{EngineConfig, Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Image analysis engine
///
/// Cheap to construct; holds only the extractor set and runtime config.
/// One instance can serve any number of concurrent analyses.
pub struct Analyzer {
    extractors: ExtractorSet,
    config: EngineConfig,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Engine with the full extractor set and default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            extractors: ExtractorSet::full(),
            config,
        }
    }

    /// Analyze a single image file.
    ///
    /// **[PV-ENG-020]** Fails only on entry problems: a missing path or
    /// bytes that do not decode as a raster image. Extractor failures are
    /// absorbed and the analysis still completes.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn analyze(&self, path: impl AsRef<Path>) -> Result<AnalysisReport> {
        let path = path.as_ref();
        if tokio::fs::metadata(path).await.is_err() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let raw_bytes = tokio::fs::read(path).await?;
        let format = image::guess_format(&raw_bytes).ok();
        let image = image::load_from_memory(&raw_bytes)
            .map_err(|e| Error::InvalidImage(format!("{}: {e}", path.display())))?;

        let ctx = ImageContext {
            path: path.to_path_buf(),
            raw_bytes,
            format,
            image,
        };

        let bundle = self.extractors.extract_all(&ctx).await;
        let report = classify(&bundle, path.display().to_string());
        info!(
            verdict = %report.verdict,
            confidence = %report.confidence,
            "analysis complete"
        );
        Ok(report)
    }

    /// Analyze many images with bounded concurrency.
    ///
    /// **[PV-ENG-030]** Per-image isolation: one bad path yields an `Err`
    /// in its own slot and never affects the other images. The result maps
    /// every input path, in path order.
    pub async fn batch_analyze(
        &self,
        paths: &[PathBuf],
    ) -> BTreeMap<PathBuf, Result<AnalysisReport>> {
        stream::iter(paths.iter().cloned())
            .map(|path| async move {
                let result = self.analyze(&path).await;
                (path, result)
            })
            .buffer_unordered(self.config.batch_concurrency.max(1))
            .collect()
            .await
    }
}
