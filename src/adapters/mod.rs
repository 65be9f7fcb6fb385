//! Adapters layer: Concrete implementations of ports.
//!
//! - `json`: metadata and smoke cases from JSON files
//! - `linear`: exported linear model as a `Regressor`

pub mod json;
pub mod linear;

pub use json::JsonMetadataSource;
pub use linear::LinearRegressor;
