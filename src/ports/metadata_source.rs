//! Metadata source port: where the preprocessing bundle comes from.

use crate::domain::{FeatureMetadata, MetadataError};

/// Trait for loading the preprocessing metadata bundle.
///
/// Called once at startup; the result is shared read-only afterwards.
pub trait MetadataSource {
    /// Load and validate the metadata.
    ///
    /// # Errors
    /// Returns `MetadataError` if the bundle cannot be read or is
    /// inconsistent.
    fn load(&self) -> Result<FeatureMetadata, MetadataError>;
}
