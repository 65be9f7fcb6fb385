//! JSON adapter: Implementation of MetadataSource over files on disk.
//!
//! Reads `meta_quantile.json` as exported by the training pipeline, the
//! optional smoke case file that accompanies it, and raw listings.

use std::path::{Path, PathBuf};

use crate::domain::{parse_export, AppListing, FeatureMetadata, MetadataError, SmokeCase};
use crate::ports::MetadataSource;

/// Default metadata file name inside a model directory.
pub const METADATA_FILE: &str = "meta_quantile.json";

/// Metadata source backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonMetadataSource {
    path: PathBuf,
}

impl JsonMetadataSource {
    /// Read metadata from an explicit file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read `meta_quantile.json` from a model directory.
    ///
    /// A path that already points at a file is used as is.
    #[must_use]
    pub fn in_dir(model_dir: &Path) -> Self {
        if model_dir.is_file() {
            Self::new(model_dir)
        } else {
            Self::new(model_dir.join(METADATA_FILE))
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetadataSource for JsonMetadataSource {
    fn load(&self) -> Result<FeatureMetadata, MetadataError> {
        let bytes = std::fs::read(&self.path)?;
        let metadata = FeatureMetadata::from_json_slice(&bytes)?;

        tracing::info!(
            "Loaded preprocessing metadata from {:?} (columns={}, numeric={}, n_quantiles={}, buckets={}, fingerprint={})",
            self.path,
            metadata.width(),
            metadata.numeric_indices().len(),
            metadata.n_quantiles(),
            metadata.buckets().len(),
            metadata.fingerprint()
        );

        Ok(metadata)
    }
}

/// Load a smoke case file (a JSON array of cases).
///
/// # Errors
/// Returns `MetadataError` if the file cannot be read or parsed.
pub fn load_smoke_cases(path: &Path) -> Result<Vec<SmokeCase>, MetadataError> {
    let bytes = std::fs::read(path)?;
    let cases: Vec<SmokeCase> = parse_export(&bytes)?;
    tracing::debug!("Loaded {} smoke cases from {:?}", cases.len(), path);
    Ok(cases)
}

/// Load a raw listing (form values as a JSON object).
///
/// # Errors
/// Returns error if the file cannot be read or is not a JSON object.
pub fn load_listing(path: &Path) -> crate::Result<AppListing> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
