//! Preprocessing metadata exported alongside the trained model.
//!
//! The document fixes the feature column order, which columns are numeric,
//! the training medians used for imputation, the quantile breakpoints of
//! the fitted quantile transformer and the display buckets. It is parsed
//! once into an immutable [`FeatureMetadata`] and shared for the lifetime
//! of the process.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error type for loading preprocessing metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Failed to read metadata: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata is not UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Invalid metadata format: {0}")]
    Parse(#[from] json5::Error),

    #[error("Inconsistent metadata: {0}")]
    Shape(String),
}

/// A number from a training export that may be missing.
///
/// Exports write non-finite floats as bare `NaN` / `Infinity` /
/// `-Infinity` tokens, as `null`, or as the same tokens quoted. Every
/// non-finite value reads as [`NullableNumber::MISSING`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NullableNumber(pub f64);

impl NullableNumber {
    /// Missing value marker (`null` in the document).
    pub const MISSING: Self = Self(f64::NAN);

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl From<f64> for NullableNumber {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl From<NullableNumber> for f64 {
    fn from(v: NullableNumber) -> Self {
        v.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NullableRepr {
    Number(f64),
    Text(String),
}

fn parse_non_finite_token(token: &str) -> Option<f64> {
    match token.trim().to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "inf" | "infinity" | "+inf" | "+infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        other => other.parse::<f64>().ok(),
    }
}

impl<'de> Deserialize<'de> for NullableNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = match Option::<NullableRepr>::deserialize(deserializer)? {
            None => return Ok(Self::MISSING),
            Some(NullableRepr::Number(v)) => v,
            Some(NullableRepr::Text(s)) => parse_non_finite_token(&s)
                .ok_or_else(|| de::Error::custom(format!("not a number: {s:?}")))?,
        };
        Ok(if value.is_finite() { Self(value) } else { Self::MISSING })
    }
}

impl Serialize for NullableNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let v = self.0;
        if v.is_nan() {
            serializer.serialize_none()
        } else if v == f64::INFINITY {
            serializer.serialize_str("Infinity")
        } else if v == f64::NEG_INFINITY {
            serializer.serialize_str("-Infinity")
        } else {
            serializer.serialize_f64(v)
        }
    }
}

/// Parse an export document (metadata or smoke cases).
///
/// Exports are JSON plus bare `NaN` / `Infinity` tokens, which JSON5
/// accepts natively.
///
/// # Errors
/// Returns `MetadataError::Encoding` or `MetadataError::Parse`.
pub fn parse_export<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, MetadataError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(json5::from_str(text)?)
}

/// On-disk layout of `meta_quantile.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub feature_cols_order: Vec<String>,
    pub num_col_idx: Vec<usize>,
    pub train_numeric_medians: Vec<NullableNumber>,
    /// Shape `[n_quantiles][n_numeric]`.
    pub quantiles: Vec<Vec<NullableNumber>>,
    pub n_quantiles: usize,
    pub bins: Vec<NullableNumber>,
}

/// Validated, immutable preprocessing metadata.
#[derive(Clone)]
pub struct FeatureMetadata {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    numeric_indices: Vec<usize>,
    medians: Vec<f64>,
    /// Breakpoints per numeric column (transposed from the document).
    breakpoints: Vec<Vec<f64>>,
    buckets: Vec<f64>,
    fingerprint: String,
}

impl FeatureMetadata {
    /// Parse and validate a raw metadata document.
    ///
    /// # Errors
    /// Returns `MetadataError::Parse` for a malformed document and
    /// `MetadataError::Shape` when the arrays disagree with each other.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, MetadataError> {
        let document: MetadataDocument = parse_export(bytes)?;
        Self::from_document(document, compute_fingerprint(bytes))
    }

    /// Validate an already parsed document.
    ///
    /// # Errors
    /// Returns `MetadataError::Shape` on any inconsistency that would make
    /// feature construction index out of bounds.
    pub fn from_document(
        document: MetadataDocument,
        fingerprint: String,
    ) -> Result<Self, MetadataError> {
        let n_columns = document.feature_cols_order.len();
        let n_numeric = document.num_col_idx.len();

        if let Some(&bad) = document.num_col_idx.iter().find(|&&j| j >= n_columns) {
            return Err(MetadataError::Shape(format!(
                "numeric column index {bad} out of range for {n_columns} columns"
            )));
        }
        if document.train_numeric_medians.len() != n_numeric {
            return Err(MetadataError::Shape(format!(
                "expected {n_numeric} medians, got {}",
                document.train_numeric_medians.len()
            )));
        }
        if document.n_quantiles == 0 {
            return Err(MetadataError::Shape("n_quantiles must be at least 1".into()));
        }
        if document.quantiles.len() != document.n_quantiles {
            return Err(MetadataError::Shape(format!(
                "expected {} quantile rows, got {}",
                document.n_quantiles,
                document.quantiles.len()
            )));
        }
        if let Some((i, row)) = document
            .quantiles
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n_numeric)
        {
            return Err(MetadataError::Shape(format!(
                "quantile row {i} has {} entries, expected {n_numeric}",
                row.len()
            )));
        }

        let mut column_index = HashMap::with_capacity(n_columns);
        for (i, name) in document.feature_cols_order.iter().enumerate() {
            // First occurrence wins, like a left-to-right name search.
            column_index.entry(name.clone()).or_insert(i);
        }

        let breakpoints = (0..n_numeric)
            .map(|k| document.quantiles.iter().map(|row| row[k].0).collect())
            .collect();

        Ok(Self {
            columns: document.feature_cols_order,
            column_index,
            numeric_indices: document.num_col_idx,
            medians: document.train_numeric_medians.into_iter().map(f64::from).collect(),
            breakpoints,
            // A missing bucket can never be the nearest one.
            buckets: document
                .bins
                .into_iter()
                .filter(|b| b.is_finite())
                .map(f64::from)
                .collect(),
            fingerprint,
        })
    }

    /// Ordered feature column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of feature columns (the model input width).
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Position of a named column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    /// Column positions of the numeric features, in median/quantile order.
    #[must_use]
    pub fn numeric_indices(&self) -> &[usize] {
        &self.numeric_indices
    }

    /// Training median of the `k`-th numeric feature.
    #[must_use]
    pub fn median(&self, k: usize) -> f64 {
        self.medians[k]
    }

    /// Quantile breakpoints of the `k`-th numeric feature.
    #[must_use]
    pub fn breakpoints(&self, k: usize) -> &[f64] {
        &self.breakpoints[k]
    }

    #[must_use]
    pub fn n_quantiles(&self) -> usize {
        self.breakpoints.first().map_or(0, Vec::len)
    }

    /// Display buckets, in document order.
    #[must_use]
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    /// Short identifier of the source document.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl fmt::Debug for FeatureMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureMetadata")
            .field("columns", &self.columns.len())
            .field("numeric", &self.numeric_indices.len())
            .field("n_quantiles", &self.n_quantiles())
            .field("buckets", &self.buckets.len())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// First 8 bytes of the SHA-256 of `bytes`, hex encoded.
fn compute_fingerprint(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};

    let digest = Sha256::digest(bytes);
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}
