//! Utility functions and helpers.

pub mod fqn;
pub mod id_generator;

// Re-export commonly used types
pub use fqn::FullyQualifiedName;
pub use id_generator::IdGenerator;
