//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the preprocessing core and the outside world (model runtime,
//! metadata storage).

mod metadata_source;
mod regressor;

pub use metadata_source::MetadataSource;
pub use regressor::{Regressor, RegressorError};
