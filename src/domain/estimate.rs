//! Install-count estimates and display buckets.

use serde::{Deserialize, Serialize};

/// Bucket value closest to `value`.
///
/// Ties go to the earlier entry. Returns `None` for an empty list.
#[must_use]
pub fn nearest_bucket(value: f64, buckets: &[f64]) -> Option<f64> {
    let (&first, rest) = buckets.split_first()?;
    let mut best = first;
    let mut best_distance = (value - first).abs();
    for &bucket in rest {
        let distance = (value - bucket).abs();
        if distance < best_distance {
            best = bucket;
            best_distance = distance;
        }
    }
    Some(best)
}

/// A completed prediction, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallEstimate {
    /// Raw model output (log1p scale)
    pub log_prediction: f32,

    /// `expm1(log_prediction)`
    pub installs: f64,

    /// Nearest display bucket, if the metadata defines any
    pub bucket: Option<f64>,

    /// Fingerprint of the metadata used for preprocessing
    pub metadata_fingerprint: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl InstallEstimate {
    /// Invert the log1p target transform and pick a display bucket.
    #[must_use]
    pub fn from_log_prediction(
        log_prediction: f32,
        buckets: &[f64],
        metadata_fingerprint: impl Into<String>,
    ) -> Self {
        let installs = f64::from(log_prediction).exp_m1();
        Self {
            log_prediction,
            installs,
            bucket: nearest_bucket(installs, buckets),
            metadata_fingerprint: metadata_fingerprint.into(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Installs rounded half up to a whole count.
    #[must_use]
    pub fn rounded_installs(&self) -> f64 {
        (self.installs + 0.5).floor()
    }
}

impl std::fmt::Display for InstallEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Predicted installs: {}",
            format_count(self.rounded_installs())
        )?;
        if let Some(bucket) = self.bucket {
            write!(f, "  (nearest bucket: {}+)", format_count(bucket))?;
        }
        Ok(())
    }
}

/// Format a count with comma thousands separators (`1234567.5` becomes
/// `1,234,567.5`). At most three fraction digits are kept.
#[must_use]
pub fn format_count(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let rendered = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let negative = value < 0.0 && (grouped != "0" || !frac_part.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKETS: [f64; 4] = [100.0, 1000.0, 10000.0, 100000.0];

    #[test]
    fn test_nearest_bucket() {
        assert_eq!(nearest_bucket(4000.0, &BUCKETS), Some(1000.0));
        assert_eq!(nearest_bucket(7000.0, &BUCKETS), Some(10000.0));
        assert_eq!(nearest_bucket(-50.0, &BUCKETS), Some(100.0));
        assert_eq!(nearest_bucket(1e9, &BUCKETS), Some(100000.0));
        assert_eq!(nearest_bucket(5.0, &[]), None);
    }

    #[test]
    fn test_nearest_bucket_ties_keep_first() {
        assert_eq!(nearest_bucket(550.0, &BUCKETS), Some(100.0));
        assert_eq!(nearest_bucket(5.0, &[10.0, 0.0]), Some(10.0));
        assert_eq!(nearest_bucket(5.0, &[0.0, 10.0]), Some(0.0));
    }

    #[test]
    fn test_nearest_bucket_unordered_list() {
        let buckets = [10000.0, 100.0, 1000.0];
        assert_eq!(nearest_bucket(900.0, &buckets), Some(1000.0));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(1234567.0), "1,234,567");
        assert_eq!(format_count(-1234.5), "-1,234.5");
        assert_eq!(format_count(-0.0), "0");
        assert_eq!(format_count(0.1234), "0.123");
        assert_eq!(format_count(f64::INFINITY), "∞");
    }

    #[test]
    fn test_estimate_inverts_log1p() {
        let estimate = InstallEstimate::from_log_prediction(10000f32.ln_1p(), &BUCKETS, "abc");
        assert!((estimate.installs - 10000.0).abs() < 1.0);
        assert_eq!(estimate.bucket, Some(10000.0));
        assert_eq!(estimate.metadata_fingerprint, "abc");
    }

    #[test]
    fn test_display_line() {
        let mut estimate = InstallEstimate::from_log_prediction(0.0, &BUCKETS, "abc");
        estimate.installs = 12345.6;
        estimate.bucket = Some(10000.0);
        assert_eq!(
            estimate.to_string(),
            "Predicted installs: 12,346  (nearest bucket: 10,000+)"
        );

        estimate.bucket = None;
        assert_eq!(estimate.to_string(), "Predicted installs: 12,346");
    }
}
