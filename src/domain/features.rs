//! Feature vector construction.
//!
//! Reproduces the training-time preprocessing for a single listing:
//! direct numeric columns, the paid indicator, one-hot categorical groups,
//! median imputation and the quantile-to-normal transform of numeric
//! columns. Bad input never fails; it degrades to medians or zeros.

use super::listing::AppListing;
use super::metadata::FeatureMetadata;
use super::probit::{clamp_probability, probit};
use super::quantile::cdf_from_quantiles;

/// Column names the builder writes directly.
pub mod columns {
    pub const PRICE: &str = "Price_num";
    pub const SIZE_MB: &str = "Size_MB";
    pub const REVIEWS: &str = "Reviews_num";
    pub const RATING: &str = "Rating_num";
    pub const TYPE_IS_PAID: &str = "Type_is_paid";
    pub const DAYS_SINCE_UPDATE: &str = "days_since_update";
}

/// One-hot group prefixes.
pub mod groups {
    pub const CATEGORY: &str = "Category_cat_";
    pub const CONTENT_RATING: &str = "ContentRating_cat_";
    pub const GENRE: &str = "Genre_primary_";
}

/// Level name of the shared fallback column of each group.
pub const OTHER_LEVEL: &str = "other";

/// Model input row, in metadata column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    /// Wrap raw values (mostly for adapters and tests).
    #[must_use]
    pub fn from_values(values: Vec<f32>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column.
    #[must_use]
    pub fn get(&self, metadata: &FeatureMetadata, column: &str) -> Option<f32> {
        metadata
            .column_index(column)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Whether every slot is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.values
    }
}

/// How a one-hot group was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneHotOutcome {
    /// `prefix + level` exists and was set.
    Matched(String),
    /// Level unknown; `prefix + "other"` was set.
    FellBack(String),
    /// Neither column exists; nothing was set.
    Unmatched(String),
}

impl OneHotOutcome {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Matched(c) | Self::FellBack(c) | Self::Unmatched(c) => c,
        }
    }
}

/// Side information about a build, for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Names of numeric columns filled from training medians.
    pub imputed: Vec<String>,
    /// One entry per categorical group, in group order.
    pub one_hot: Vec<OneHotOutcome>,
    /// Columns reset to zero by the final finiteness pass.
    pub zeroed: Vec<String>,
}

impl BuildReport {
    /// Groups whose level was not recognised (fallback or no-op).
    pub fn unrecognised(&self) -> impl Iterator<Item = &OneHotOutcome> {
        self.one_hot
            .iter()
            .filter(|o| !matches!(o, OneHotOutcome::Matched(_)))
    }
}

/// Builds [`FeatureVector`]s against a fixed metadata bundle.
pub struct FeatureVectorBuilder<'a> {
    metadata: &'a FeatureMetadata,
}

impl<'a> FeatureVectorBuilder<'a> {
    #[must_use]
    pub fn new(metadata: &'a FeatureMetadata) -> Self {
        Self { metadata }
    }

    /// Build the model input for `listing`.
    #[must_use]
    pub fn build(&self, listing: &AppListing) -> FeatureVector {
        self.build_with_report(listing).0
    }

    /// Build the model input and describe how it was resolved.
    #[must_use]
    pub fn build_with_report(&self, listing: &AppListing) -> (FeatureVector, BuildReport) {
        let mut x = vec![0.0f32; self.metadata.width()];
        let mut report = BuildReport::default();

        // NaN marks a value that still needs imputation.
        self.put(&mut x, columns::PRICE, listing.price());
        self.put(&mut x, columns::SIZE_MB, listing.size_mb());
        self.put(&mut x, columns::REVIEWS, listing.reviews());
        self.put(&mut x, columns::RATING, listing.rating());
        self.put(
            &mut x,
            columns::TYPE_IS_PAID,
            if listing.is_paid() { 1.0 } else { 0.0 },
        );
        self.put(&mut x, columns::DAYS_SINCE_UPDATE, f64::NAN);

        for (prefix, level) in [
            (groups::CATEGORY, listing.category_level()),
            (groups::CONTENT_RATING, listing.content_rating_level()),
            (groups::GENRE, listing.genre_level()),
        ] {
            report.one_hot.push(self.one_hot(&mut x, prefix, &level));
        }

        self.impute(&mut x, &mut report);
        self.quantile_normalize(&mut x);

        for (i, v) in x.iter_mut().enumerate() {
            if !v.is_finite() {
                *v = 0.0;
                report.zeroed.push(self.metadata.columns()[i].clone());
            }
        }

        (FeatureVector { values: x }, report)
    }

    fn put(&self, x: &mut [f32], column: &str, value: f64) {
        if let Some(i) = self.metadata.column_index(column) {
            x[i] = if value.is_finite() { value as f32 } else { f32::NAN };
        }
    }

    fn one_hot(&self, x: &mut [f32], prefix: &str, level: &str) -> OneHotOutcome {
        let column = format!("{prefix}{level}");
        if let Some(i) = self.metadata.column_index(&column) {
            x[i] = 1.0;
            return OneHotOutcome::Matched(column);
        }

        let other = format!("{prefix}{OTHER_LEVEL}");
        match self.metadata.column_index(&other) {
            Some(i) => {
                x[i] = 1.0;
                OneHotOutcome::FellBack(other)
            }
            None => OneHotOutcome::Unmatched(column),
        }
    }

    fn impute(&self, x: &mut [f32], report: &mut BuildReport) {
        for (k, &j) in self.metadata.numeric_indices().iter().enumerate() {
            if !x[j].is_finite() {
                // A missing median imputes as raw zero, still transformed below.
                let median = self.metadata.median(k);
                x[j] = if median.is_finite() { median as f32 } else { 0.0 };
                report.imputed.push(self.metadata.columns()[j].clone());
            }
        }
    }

    fn quantile_normalize(&self, x: &mut [f32]) {
        for (k, &j) in self.metadata.numeric_indices().iter().enumerate() {
            let uniform = cdf_from_quantiles(f64::from(x[j]), self.metadata.breakpoints(k));
            x[j] = probit(clamp_probability(uniform)) as f32;
        }
    }
}
