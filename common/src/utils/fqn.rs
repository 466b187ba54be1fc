//! Fully qualified names.
//!
//! An FQN is the dotted path of names from the service down to the entity,
//! e.g. `mysql_prod.sales_db`. A part that itself contains a `.` is wrapped in
//! double quotes: `"prod.eu".sales_db`.

const SEPARATOR: char = '.';
const QUOTE: char = '"';

/// Builds and splits fully qualified names.
pub struct FullyQualifiedName;

impl FullyQualifiedName {
    /// Quotes `name` when it contains the separator.
    pub fn quote_name(name: &str) -> String {
        let already_quoted = name.len() >= 2 && name.starts_with(QUOTE) && name.ends_with(QUOTE);
        if name.contains(SEPARATOR) && !already_quoted {
            format!("{QUOTE}{name}{QUOTE}")
        } else {
            name.to_string()
        }
    }

    /// Joins parts into an FQN, quoting where needed.
    pub fn build(parts: &[&str]) -> String {
        parts
            .iter()
            .map(|part| Self::quote_name(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Splits an FQN into its unquoted parts.
    pub fn split(fqn: &str) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;

        for c in fqn.chars() {
            match c {
                QUOTE => in_quotes = !in_quotes,
                SEPARATOR if !in_quotes => parts.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        parts.push(current);
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_plain_parts() {
        assert_eq!(
            FullyQualifiedName::build(&["mysql_prod", "sales_db"]),
            "mysql_prod.sales_db"
        );
    }

    #[test]
    fn test_build_quotes_dotted_parts() {
        assert_eq!(
            FullyQualifiedName::build(&["prod.eu", "sales_db"]),
            "\"prod.eu\".sales_db"
        );
        assert_eq!(FullyQualifiedName::quote_name("\"a.b\""), "\"a.b\"");
    }

    #[test]
    fn test_split_respects_quotes() {
        assert_eq!(
            FullyQualifiedName::split("\"prod.eu\".sales_db"),
            vec!["prod.eu".to_string(), "sales_db".to_string()]
        );
        assert_eq!(FullyQualifiedName::split("single"), vec!["single".to_string()]);
    }

    #[test]
    fn test_split_inverts_build() {
        let parts = ["svc.with.dots", "db"];
        let fqn = FullyQualifiedName::build(&parts);
        assert_eq!(FullyQualifiedName::split(&fqn), parts);
    }
}
