//! Runtime configuration for the prediction binary.
//!
//! The library core never reads the environment; only `from_env` does,
//! and only the binary calls it.

use std::path::{Path, PathBuf};

use crate::adapters::json::METADATA_FILE;
use crate::adapters::linear::MODEL_FILE;

const MODEL_DIR_ENV: &str = "INSTALLCAST_MODEL_DIR";
const SMOKE_TOLERANCE_ENV: &str = "INSTALLCAST_SMOKE_TOLERANCE";

/// Where the model artifacts live and how strictly to check them.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    /// Directory holding the metadata and model files (default: `models`)
    pub model_dir: PathBuf,

    /// Metadata file name inside `model_dir` (default: `meta_quantile.json`)
    pub metadata_file: String,

    /// Model file name inside `model_dir` (default: `linear_model.json`)
    pub model_file: String,

    /// Absolute tolerance for smoke case comparisons (default: 1e-4)
    pub smoke_tolerance: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            metadata_file: METADATA_FILE.to_string(),
            model_file: MODEL_FILE.to_string(),
            smoke_tolerance: 1e-4,
        }
    }
}

impl PredictorConfig {
    /// Defaults overridden by `INSTALLCAST_MODEL_DIR` and
    /// `INSTALLCAST_SMOKE_TOLERANCE`. Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var(MODEL_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.model_dir = PathBuf::from(dir);
            }
        }
        if let Some(tolerance) = std::env::var(SMOKE_TOLERANCE_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
        {
            config.smoke_tolerance = tolerance;
        }

        config
    }

    #[must_use]
    pub fn with_model_dir(mut self, model_dir: impl AsRef<Path>) -> Self {
        self.model_dir = model_dir.as_ref().to_path_buf();
        self
    }

    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.model_dir.join(&self.metadata_file)
    }

    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = PredictorConfig::default();
        assert_eq!(config.metadata_path(), Path::new("models/meta_quantile.json"));
        assert_eq!(config.model_path(), Path::new("models/linear_model.json"));
    }

    #[test]
    fn test_with_model_dir() {
        let config = PredictorConfig::default().with_model_dir("/opt/model");
        assert_eq!(config.model_path(), Path::new("/opt/model/linear_model.json"));
        assert!((config.smoke_tolerance - 1e-4).abs() < f64::EPSILON);
    }
}
