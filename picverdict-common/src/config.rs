//! Engine configuration loading
//!
//! **[PV-CFG-010]** Runtime tunables for the analysis engine. The fusion
//! rule tables themselves are fixed and are NOT configurable; only
//! operational concerns (batch concurrency) live here.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default number of images analyzed concurrently in batch mode
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of images analyzed concurrently by `batch_analyze`
    pub batch_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing keys fall back to defaults. A present-but-invalid file is a
    /// `Config` error rather than a silent fallback.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Cannot read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.batch_concurrency == 0 {
            return Err(Error::Config(
                "batch_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.batch_concurrency, DEFAULT_BATCH_CONCURRENCY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("picverdict.toml");
        fs::write(&path, "batch_concurrency = 8\n").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.batch_concurrency, 8);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("picverdict.toml");
        fs::write(&path, "").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.batch_concurrency, DEFAULT_BATCH_CONCURRENCY);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("picverdict.toml");
        fs::write(&path, "batch_concurrency = 0\n").unwrap();

        assert!(matches!(
            EngineConfig::from_file(&path),
            Err(Error::Config(_))
        ));
    }
}
