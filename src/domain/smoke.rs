//! Parity checks against feature vectors exported at training time.
//!
//! A smoke case pairs a raw listing with the vector the training pipeline
//! produced for it. Rebuilding the vector here and diffing column by column
//! catches drift between the two preprocessing implementations.

use serde::{Deserialize, Serialize};

use super::features::FeatureVectorBuilder;
use super::listing::AppListing;
use super::metadata::{FeatureMetadata, NullableNumber};

/// One exported input/vector pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmokeCase {
    #[serde(default)]
    pub name: Option<String>,
    pub inputs: AppListing,
    /// Expected vector; `null` entries are expected to end up as 0.
    pub expected: Vec<NullableNumber>,
}

/// A column that disagrees with the exported vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMismatch {
    pub column: String,
    pub expected: f64,
    pub actual: f64,
}

/// Outcome of a single case.
#[derive(Debug, Clone, PartialEq)]
pub struct SmokeResult {
    pub name: String,
    /// Set when the exported vector has the wrong width.
    pub width_mismatch: Option<(usize, usize)>,
    pub mismatches: Vec<ColumnMismatch>,
}

impl SmokeResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.width_mismatch.is_none() && self.mismatches.is_empty()
    }
}

/// Rebuild the vector for `case` and compare within `tolerance`.
#[must_use]
pub fn verify_smoke_case(
    metadata: &FeatureMetadata,
    case: &SmokeCase,
    index: usize,
    tolerance: f64,
) -> SmokeResult {
    let name = case
        .name
        .clone()
        .unwrap_or_else(|| format!("case #{index}"));
    let actual = FeatureVectorBuilder::new(metadata).build(&case.inputs);

    if case.expected.len() != actual.len() {
        return SmokeResult {
            name,
            width_mismatch: Some((case.expected.len(), actual.len())),
            mismatches: Vec::new(),
        };
    }

    let mismatches = case
        .expected
        .iter()
        .zip(actual.as_slice())
        .zip(metadata.columns())
        .filter_map(|((expected, &actual), column)| {
            let expected = if expected.is_finite() { expected.value() } else { 0.0 };
            let actual = f64::from(actual);
            ((expected - actual).abs() > tolerance).then(|| ColumnMismatch {
                column: column.clone(),
                expected,
                actual,
            })
        })
        .collect();

    SmokeResult {
        name,
        width_mismatch: None,
        mismatches,
    }
}

/// Verify every case in order.
#[must_use]
pub fn verify_smoke_cases(
    metadata: &FeatureMetadata,
    cases: &[SmokeCase],
    tolerance: f64,
) -> Vec<SmokeResult> {
    cases
        .iter()
        .enumerate()
        .map(|(i, case)| verify_smoke_case(metadata, case, i, tolerance))
        .collect()
}
