//! Shared document model for TileQuest content.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{Schema, ValidationError, validate, validate_document};
