//! Raw listing input as entered in the prediction form.

use serde::{Deserialize, Serialize};

/// A single form value: free text or an already numeric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Lenient numeric coercion.
    ///
    /// Text is read up to the longest numeric prefix (`"12.5 MB"` is 12.5,
    /// `"1,000"` is 1). Anything unparseable yields NaN.
    #[must_use]
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(v) => *v,
            Self::Text(s) => parse_leading_float(s),
        }
    }

    /// Lower-cased, trimmed categorical level.
    #[must_use]
    pub fn as_level(&self) -> String {
        match self {
            Self::Number(v) => v.to_string(),
            Self::Text(s) => s.trim().to_lowercase(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

/// Raw listing fields. Every field is optional; absent values are
/// treated the same as unparseable ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppListing {
    #[serde(default)]
    pub category: Option<RawValue>,
    #[serde(default)]
    pub content_rating: Option<RawValue>,
    #[serde(default)]
    pub genre: Option<RawValue>,
    /// Review count
    #[serde(default)]
    pub reviews: Option<RawValue>,
    /// Average star rating
    #[serde(default)]
    pub rating: Option<RawValue>,
    /// Download size in MB
    #[serde(default)]
    pub size: Option<RawValue>,
    #[serde(default)]
    pub price: Option<RawValue>,
    /// "Free" or "Paid"
    #[serde(default, rename = "type")]
    pub app_type: Option<RawValue>,
}

impl AppListing {
    #[must_use]
    pub fn reviews(&self) -> f64 {
        number_of(self.reviews.as_ref())
    }

    #[must_use]
    pub fn rating(&self) -> f64 {
        number_of(self.rating.as_ref())
    }

    #[must_use]
    pub fn size_mb(&self) -> f64 {
        number_of(self.size.as_ref())
    }

    #[must_use]
    pub fn price(&self) -> f64 {
        number_of(self.price.as_ref())
    }

    #[must_use]
    pub fn category_level(&self) -> String {
        level_of(self.category.as_ref())
    }

    #[must_use]
    pub fn content_rating_level(&self) -> String {
        level_of(self.content_rating.as_ref())
    }

    #[must_use]
    pub fn genre_level(&self) -> String {
        level_of(self.genre.as_ref())
    }

    /// Whether the listing is a paid app.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        level_of(self.app_type.as_ref()) == "paid"
    }
}

fn number_of(value: Option<&RawValue>) -> f64 {
    value.map_or(f64::NAN, RawValue::as_number)
}

fn level_of(value: Option<&RawValue>) -> String {
    value.map(RawValue::as_level).unwrap_or_default()
}

/// Parse the longest decimal prefix of `s` after leading whitespace.
///
/// Accepts an optional sign, digits with at most one decimal point and an
/// optional exponent. Returns NaN when no digits are found.
fn parse_leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when followed by at least one digit.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}
