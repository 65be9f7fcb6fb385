//! Domain layer: Core preprocessing types and numerics.
//!
//! Pure Rust with no I/O. Everything here is deterministic given the
//! metadata bundle and a raw listing.

mod estimate;
pub mod features;
mod listing;
mod metadata;
pub mod probit;
pub mod quantile;
pub mod smoke;

pub use estimate::{format_count, nearest_bucket, InstallEstimate};
pub use features::{BuildReport, FeatureVector, FeatureVectorBuilder, OneHotOutcome};
pub use listing::{AppListing, RawValue};
pub use metadata::{parse_export, FeatureMetadata, MetadataDocument, MetadataError, NullableNumber};
pub use smoke::{SmokeCase, SmokeResult};
