//! Catalog entity models.

pub mod database;
pub mod entity_reference;
pub mod usage;

pub(crate) mod reader;

// Re-export commonly used types
pub use database::{Database, DATABASE_NAME_MAX_LENGTH, DATABASE_NAME_PATTERN};
pub use entity_reference::{EntityKind, EntityReference, UnknownEntityKind};
pub use usage::{UsageDetails, UsageStats};
