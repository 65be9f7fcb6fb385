//! Prediction service: Orchestrates preprocessing and inference.
//!
//! This service coordinates:
//! - Feature vector construction against the loaded metadata
//! - The model call through the `Regressor` port
//! - Target inversion and bucketing
//! - The "last displayed estimate" slot

use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::{
    AppListing, FeatureMetadata, FeatureVector, FeatureVectorBuilder, InstallEstimate, SmokeCase,
    SmokeResult,
};
use crate::ports::{MetadataSource, Regressor};
use crate::InstallcastError;

/// Service for running install predictions.
///
/// Metadata is loaded once and never mutated. Requests are independent;
/// the only shared mutable state is the last completed estimate, which the
/// most recently finished request overwrites.
pub struct PredictionService<R>
where
    R: Regressor,
{
    metadata: Arc<FeatureMetadata>,
    regressor: Arc<R>,
    last_estimate: Mutex<Option<InstallEstimate>>,
}

impl<R> PredictionService<R>
where
    R: Regressor,
{
    /// Create a service from already loaded collaborators.
    ///
    /// # Errors
    /// Returns `InstallcastError::Inference` if the model input width does
    /// not match the metadata column count.
    pub fn new(metadata: Arc<FeatureMetadata>, regressor: Arc<R>) -> Result<Self, InstallcastError> {
        if regressor.input_width() != metadata.width() {
            return Err(InstallcastError::Inference(
                crate::ports::RegressorError::InputWidth {
                    expected: regressor.input_width(),
                    actual: metadata.width(),
                },
            ));
        }

        Ok(Self {
            metadata,
            regressor,
            last_estimate: Mutex::new(None),
        })
    }

    /// Load metadata from `source` and build the service.
    ///
    /// # Errors
    /// Returns error if the metadata cannot be loaded or does not fit the
    /// model.
    pub fn load<M: MetadataSource>(source: &M, regressor: Arc<R>) -> Result<Self, InstallcastError> {
        tracing::info!("Initializing prediction service...");
        let metadata = source.load()?;
        Self::new(Arc::new(metadata), regressor)
    }

    #[must_use]
    pub fn metadata(&self) -> &FeatureMetadata {
        &self.metadata
    }

    /// Build the feature row for `listing` without running the model.
    #[must_use]
    pub fn features(&self, listing: &AppListing) -> FeatureVector {
        let (features, report) = FeatureVectorBuilder::new(&self.metadata).build_with_report(listing);

        if !report.imputed.is_empty() {
            tracing::debug!("Imputed from training medians: {:?}", report.imputed);
        }
        for outcome in report.unrecognised() {
            tracing::debug!("Unrecognised categorical level, resolved as {:?}", outcome);
        }
        if !report.zeroed.is_empty() {
            tracing::warn!(
                "Non-finite values reset to zero after preprocessing: {:?}",
                report.zeroed
            );
        }

        features
    }

    /// Run the full pipeline for one listing.
    ///
    /// # Errors
    /// Returns error if the model call fails. The last estimate slot is left
    /// untouched in that case.
    pub fn predict(&self, listing: &AppListing) -> Result<InstallEstimate, InstallcastError> {
        tracing::debug!("Step 1: Building feature vector...");
        let features = self.features(listing);

        tracing::debug!("Step 2: Running model on {} features...", features.len());
        let log_prediction = self.regressor.predict(&features)?;
        if !log_prediction.is_finite() {
            return Err(crate::ports::RegressorError::NonFiniteOutput.into());
        }

        tracing::debug!("Step 3: Inverting target transform and bucketing...");
        let estimate = InstallEstimate::from_log_prediction(
            log_prediction,
            self.metadata.buckets(),
            self.metadata.fingerprint(),
        );

        tracing::info!(
            "Prediction complete: log={:.4}, installs={:.0}, bucket={:?}",
            estimate.log_prediction,
            estimate.installs,
            estimate.bucket
        );

        // The slot holds plain data, so a poisoned lock is still usable.
        *self
            .last_estimate
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(estimate.clone());
        Ok(estimate)
    }

    /// Run the pipeline and render the user-facing line.
    ///
    /// Failures are rendered as `Error: ...` instead of being returned.
    #[must_use]
    pub fn render(&self, listing: &AppListing) -> String {
        match self.predict(listing) {
            Ok(estimate) => estimate.to_string(),
            Err(e) => {
                tracing::error!("Prediction failed: {e}");
                format!("Error: {e}")
            }
        }
    }

    /// The most recently completed estimate, if any.
    #[must_use]
    pub fn last_estimate(&self) -> Option<InstallEstimate> {
        self.last_estimate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rebuild exported vectors and compare them with ours.
    #[must_use]
    pub fn verify_smoke_cases(&self, cases: &[SmokeCase], tolerance: f64) -> Vec<SmokeResult> {
        let results = crate::domain::smoke::verify_smoke_cases(&self.metadata, cases, tolerance);
        let failed = results.iter().filter(|r| !r.passed()).count();
        if failed > 0 {
            tracing::warn!("{failed} of {} smoke cases diverge", results.len());
        } else {
            tracing::info!("All {} smoke cases match", results.len());
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json::{load_smoke_cases, JsonMetadataSource};
    use crate::adapters::linear::LinearRegressor;
    use crate::domain::RawValue;
    use crate::ports::RegressorError;
    use std::path::Path;

    fn create_test_service() -> PredictionService<LinearRegressor> {
        let regressor =
            Arc::new(LinearRegressor::load(Path::new("models")).expect("Model should load for tests"));
        let source = JsonMetadataSource::in_dir(Path::new("models"));
        let service = PredictionService::load(&source, regressor).expect("Should initialize");
        service
            .regressor
            .check_layout(service.metadata())
            .expect("Model and metadata agree");
        service
    }

    fn listing() -> AppListing {
        AppListing {
            category: Some("GAME".into()),
            content_rating: Some("Everyone".into()),
            genre: Some("Action".into()),
            reviews: Some("250000".into()),
            rating: Some(RawValue::Number(4.5)),
            size: Some("45".into()),
            price: Some("0".into()),
            app_type: Some("Free".into()),
        }
    }

    /// Returns a fixed log prediction, or fails when unset.
    struct FixedRegressor {
        width: usize,
        output: Mutex<Option<f32>>,
    }

    impl FixedRegressor {
        fn set_output(&self, output: Option<f32>) {
            *self.output.lock().expect("lock") = output;
        }
    }

    impl Regressor for FixedRegressor {
        fn input_width(&self) -> usize {
            self.width
        }

        fn predict(&self, features: &FeatureVector) -> Result<f32, RegressorError> {
            assert!(features.is_finite());
            self.output
                .lock()
                .expect("lock")
                .ok_or_else(|| RegressorError::Runtime("session closed".into()))
        }
    }

    fn fixed_service(output: Option<f32>) -> PredictionService<FixedRegressor> {
        let metadata = JsonMetadataSource::in_dir(Path::new("models"))
            .load()
            .expect("Should load metadata");
        let regressor = FixedRegressor {
            width: metadata.width(),
            output: Mutex::new(output),
        };
        PredictionService::new(Arc::new(metadata), Arc::new(regressor)).expect("Should initialize")
    }

    #[test]
    fn test_inference_pipeline() {
        let service = create_test_service();
        assert!(service.last_estimate().is_none());

        let estimate = service.predict(&listing()).expect("Should predict");
        assert!(estimate.installs.is_finite());
        assert!(estimate.installs > 0.0);
        assert!(estimate.bucket.is_some());
        assert_eq!(estimate.metadata_fingerprint, service.metadata().fingerprint());
        assert_eq!(service.last_estimate(), Some(estimate));
    }

    #[test]
    fn test_features_match_metadata_width() {
        let service = create_test_service();
        let features = service.features(&AppListing::default());
        assert_eq!(features.len(), service.metadata().width());
        assert!(features.is_finite());
    }

    #[test]
    fn test_render_success_line() {
        // expm1(ln(4001)) = 4000, which is closer to 5,000 than to 1,000.
        let service = fixed_service(Some(4001f32.ln()));
        let line = service.render(&listing());
        assert!(line.starts_with("Predicted installs: 4,000"), "{line}");
        assert!(line.ends_with("(nearest bucket: 5,000+)"), "{line}");
    }

    #[test]
    fn test_render_reports_errors_and_keeps_last_estimate() {
        let service = fixed_service(Some(1.0));
        let estimate = service.predict(&listing()).expect("Should predict");

        service.regressor.set_output(None);
        let line = service.render(&listing());
        assert_eq!(line, "Error: Inference failed: session closed");
        assert_eq!(service.last_estimate(), Some(estimate));

        // The service stays usable after a failure.
        service.regressor.set_output(Some(2.0));
        let next = service.predict(&listing()).expect("Should predict");
        assert_eq!(service.last_estimate(), Some(next));
    }

    #[test]
    fn test_last_completed_request_wins() {
        let service = fixed_service(Some(3.0));
        let first = service.predict(&listing()).expect("first");
        let mut other = listing();
        other.reviews = Some("12".into());
        let second = service.predict(&other).expect("second");
        assert_eq!(service.last_estimate(), Some(second.clone()));
        assert!(second.created_at >= first.created_at);
    }

    #[test]
    fn test_poisoned_slot_still_records_estimates() {
        let service = fixed_service(Some(1.5));
        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _slot = service.last_estimate.lock().expect("lock");
            panic!("worker died while holding the slot");
        }));
        assert!(poisoned.is_err());
        assert!(service.last_estimate.is_poisoned());

        let estimate = service.predict(&listing()).expect("Should predict");
        assert_eq!(service.last_estimate(), Some(estimate));
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let metadata = JsonMetadataSource::in_dir(Path::new("models"))
            .load()
            .expect("Should load metadata");
        let regressor = FixedRegressor {
            width: metadata.width() + 1,
            output: Mutex::new(Some(0.0)),
        };
        let result = PredictionService::new(Arc::new(metadata), Arc::new(regressor));
        assert!(matches!(result, Err(InstallcastError::Inference(_))));
    }

    #[test]
    fn test_bundled_smoke_cases_pass() {
        let service = create_test_service();
        let cases = load_smoke_cases(Path::new("models/smoke_cases.json")).expect("Should load");
        assert!(!cases.is_empty());

        for result in service.verify_smoke_cases(&cases, 1e-4) {
            assert!(result.passed(), "{result:?}");
        }
    }
}
