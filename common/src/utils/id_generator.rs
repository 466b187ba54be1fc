//! Unique ID generator.

use uuid::Uuid;

/// Generates identifiers for catalog entities and requests.
pub struct IdGenerator;

impl IdGenerator {
    /// Generates a stable identity for a newly stored entity.
    pub fn entity_id() -> Uuid {
        Uuid::new_v4()
    }

    /// Generates a request ID for tracing.
    pub fn request_id() -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_is_unique() {
        assert_ne!(IdGenerator::entity_id(), IdGenerator::entity_id());
    }

    #[test]
    fn test_request_id_is_a_uuid() {
        assert!(Uuid::parse_str(&IdGenerator::request_id()).is_ok());
    }
}
