//! # Installcast
//!
//! Install-count prediction for app store listings.
//!
//! This crate provides:
//! - The training-time feature preprocessing (median imputation, one-hot
//!   encoding, quantile-to-normal transform) for a single raw listing
//! - A port for the trained regression model and a linear reference adapter
//! - Target inversion and nearest-bucket display of the prediction
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Preprocessing numerics and types (metadata, listing, vector)
//! - `ports`: Trait definitions for the model runtime and metadata source
//! - `adapters`: Concrete implementations (JSON files, linear model)
//! - `application`: The prediction use case
//! - `config`: Model location and tolerances for the binary

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::PredictionService;
pub use domain::{AppListing, FeatureMetadata, FeatureVector, InstallEstimate};

/// Result type for Installcast operations
pub type Result<T> = std::result::Result<T, InstallcastError>;

/// Main error type for Installcast
#[derive(Debug, thiserror::Error)]
pub enum InstallcastError {
    #[error("Metadata unavailable: {0}")]
    Metadata(#[from] domain::MetadataError),

    #[error(transparent)]
    Inference(#[from] ports::RegressorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
