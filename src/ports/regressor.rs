//! Regressor port: Trait for the trained model runtime.
//!
//! The model itself (ONNX graph, linear weights, ...) lives behind this
//! trait; the application only hands it a finished feature row.

use crate::domain::FeatureVector;

/// Errors reported by a model runtime.
#[derive(Debug, thiserror::Error)]
pub enum RegressorError {
    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Model expects {expected} features, got {actual}")]
    InputWidth { expected: usize, actual: usize },

    #[error("Model feature layout does not match metadata: {0}")]
    Layout(String),

    #[error("Model produced a non-finite output")]
    NonFiniteOutput,

    #[error("Inference failed: {0}")]
    Runtime(String),
}

/// Trait for single-row regression inference.
///
/// Implementations receive one `f32` row shaped `[1, width]` and return the
/// scalar prediction on the model's training scale (log1p installs).
pub trait Regressor: Send + Sync {
    /// Number of input features the model expects.
    fn input_width(&self) -> usize;

    /// Run the model on a single feature row.
    ///
    /// # Errors
    /// Returns `RegressorError::InputWidth` when the row has the wrong
    /// length, or a runtime-specific error when inference fails.
    fn predict(&self, features: &FeatureVector) -> Result<f32, RegressorError>;
}
