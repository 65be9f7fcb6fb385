//! Linear adapter: Implementation of Regressor for exported linear models.
//!
//! A ridge/linear regression on the log1p target, exported as plain JSON
//! weights. It runs anywhere without a graph runtime and doubles as the
//! reference model for parity checks of the preprocessing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureMetadata, FeatureVector};
use crate::ports::{Regressor, RegressorError};

/// Default model file name inside a model directory.
pub const MODEL_FILE: &str = "linear_model.json";

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLinearModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Linear regressor over the preprocessed feature row.
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    model: ExportedLinearModel,
}

impl LinearRegressor {
    /// Wrap already parsed parameters.
    ///
    /// # Errors
    /// Returns `RegressorError::Load` if the parameter arrays are
    /// inconsistent or contain non-finite weights.
    pub fn from_model(model: ExportedLinearModel) -> Result<Self, RegressorError> {
        let n = model.feature_names.len();
        if n == 0 {
            return Err(RegressorError::Load("model has no features".into()));
        }
        if model.coefficients.len() != n {
            return Err(RegressorError::Load(format!(
                "{} coefficients for {n} features",
                model.coefficients.len()
            )));
        }
        if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(RegressorError::Load("model weights must be finite".into()));
        }
        Ok(Self { model })
    }

    /// Load `linear_model.json` from a model directory (or a file path).
    ///
    /// # Errors
    /// Returns `RegressorError::Load` if the file is missing or invalid.
    pub fn load(model_dir: &Path) -> Result<Self, RegressorError> {
        let model_path = if model_dir.is_file() {
            model_dir.to_path_buf()
        } else {
            model_dir.join(MODEL_FILE)
        };

        let content = std::fs::read_to_string(&model_path)
            .map_err(|e| RegressorError::Load(format!("{model_path:?}: {e}")))?;
        let model: ExportedLinearModel = serde_json::from_str(&content)
            .map_err(|e| RegressorError::Load(format!("{model_path:?}: {e}")))?;

        let regressor = Self::from_model(model)?;
        tracing::info!(
            "Loaded linear model from {:?} (n_features={})",
            model_path,
            regressor.input_width()
        );
        Ok(regressor)
    }

    /// Check that the model was trained on the metadata's column layout.
    ///
    /// # Errors
    /// Returns `RegressorError::Layout` naming the first differing column.
    pub fn check_layout(&self, metadata: &FeatureMetadata) -> Result<(), RegressorError> {
        let ours = &self.model.feature_names;
        let theirs = metadata.columns();
        if ours.len() != theirs.len() {
            return Err(RegressorError::Layout(format!(
                "model has {} features, metadata has {}",
                ours.len(),
                theirs.len()
            )));
        }
        match ours.iter().zip(theirs).position(|(a, b)| a != b) {
            Some(i) => Err(RegressorError::Layout(format!(
                "column {i} is {:?} in the model but {:?} in the metadata",
                ours[i], theirs[i]
            ))),
            None => Ok(()),
        }
    }
}

impl Regressor for LinearRegressor {
    fn input_width(&self) -> usize {
        self.model.coefficients.len()
    }

    fn predict(&self, features: &FeatureVector) -> Result<f32, RegressorError> {
        let row = features.as_slice();
        if row.len() != self.input_width() {
            return Err(RegressorError::InputWidth {
                expected: self.input_width(),
                actual: row.len(),
            });
        }

        let y = self
            .model
            .coefficients
            .iter()
            .zip(row)
            .fold(self.model.intercept, |acc, (w, &x)| acc + w * f64::from(x))
            as f32;

        if !y.is_finite() {
            return Err(RegressorError::NonFiniteOutput);
        }
        tracing::trace!("Linear model output {y}");
        Ok(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MetadataDocument;
    use tempfile::tempdir;

    fn model() -> ExportedLinearModel {
        ExportedLinearModel {
            feature_names: vec!["a".into(), "b".into()],
            coefficients: vec![2.0, -1.0],
            intercept: 0.5,
        }
    }

    #[test]
    fn test_predict_dot_product() {
        let regressor = LinearRegressor::from_model(model()).expect("valid model");
        let y = regressor
            .predict(&FeatureVector::from_values(vec![1.0, 3.0]))
            .expect("Should predict");
        assert!((y - (-0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_wrong_width() {
        let regressor = LinearRegressor::from_model(model()).expect("valid model");
        let err = regressor
            .predict(&FeatureVector::from_values(vec![1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            RegressorError::InputWidth {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_overflowing_output_is_an_error() {
        let mut m = model();
        m.coefficients = vec![1e300, 0.0];
        let regressor = LinearRegressor::from_model(m).expect("valid model");
        let err = regressor
            .predict(&FeatureVector::from_values(vec![1e10, 0.0]))
            .unwrap_err();
        assert!(matches!(err, RegressorError::NonFiniteOutput));
    }

    #[test]
    fn test_from_model_validates_lengths() {
        let mut m = model();
        m.coefficients.pop();
        assert!(LinearRegressor::from_model(m).is_err());

        let mut m = model();
        m.intercept = f64::NAN;
        assert!(LinearRegressor::from_model(m).is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let temp = tempdir().expect("tempdir");
        let json = serde_json::to_string(&model()).expect("serialize model");
        std::fs::write(temp.path().join(MODEL_FILE), json).expect("write model");

        let regressor = LinearRegressor::load(temp.path()).expect("Should load");
        assert_eq!(regressor.input_width(), 2);

        let missing = tempdir().expect("tempdir");
        assert!(matches!(
            LinearRegressor::load(missing.path()),
            Err(RegressorError::Load(_))
        ));
    }

    #[test]
    fn test_check_layout() {
        let regressor = LinearRegressor::from_model(model()).expect("valid model");
        let document = MetadataDocument {
            feature_cols_order: vec!["a".into(), "c".into()],
            num_col_idx: vec![],
            train_numeric_medians: vec![],
            quantiles: vec![vec![]],
            n_quantiles: 1,
            bins: vec![],
        };
        let meta = FeatureMetadata::from_document(document.clone(), "x".into()).expect("valid");
        let err = regressor.check_layout(&meta).unwrap_err();
        assert!(err.to_string().contains("column 1"));

        let mut document = document;
        document.feature_cols_order = vec!["a".into(), "b".into()];
        let meta = FeatureMetadata::from_document(document, "x".into()).expect("valid");
        assert!(regressor.check_layout(&meta).is_ok());
    }
}
