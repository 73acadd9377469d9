//! # PicVerdict Common Library
//!
//! Shared code for the PicVerdict forensic analysis engine:
//! - Error types
//! - Engine configuration loading
//! - Tracing/logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::EngineConfig;
pub use error::{Error, Result};
