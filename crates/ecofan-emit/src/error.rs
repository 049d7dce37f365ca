//! Emission errors.

use ecofan_core::{Identifier, KeyPath};
use ecofan_schema::ValidationReport;

/// Errors that abort a document pass.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// One or more entries failed schema validation.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationReport),

    #[error("{path}: identifier '{id}' is already declared at {first}")]
    DuplicateIdentifier {
        id: Identifier,
        path: KeyPath,
        first: KeyPath,
    },

    #[error("identifier '{id}' is already bound")]
    Rebind { id: Identifier },

    #[error("{path}: unknown identifier '{id}'")]
    UnknownIdentifier { id: Identifier, path: KeyPath },

    #[error("{path}: '{id}' is a {found}, expected a {expected}")]
    ClassMismatch {
        id: Identifier,
        path: KeyPath,
        expected: String,
        found: String,
    },

    #[error("{path}: no {class} is declared to use as the default")]
    NoDefaultInstance { class: String, path: KeyPath },

    #[error("{path}: several {class} instances are declared ({}), specify one explicitly", join(.candidates))]
    AmbiguousDefault {
        class: String,
        path: KeyPath,
        candidates: Vec<Identifier>,
    },

    /// Each member of the cycle with the path it was declared at.
    #[error("cyclic dependency between identifiers: {}", cycle_path(.cycle))]
    CyclicDependency { cycle: Vec<(Identifier, KeyPath)> },

    #[error("{path}: component '{domain}' not found")]
    UnknownComponent { domain: String, path: KeyPath },

    #[error("{path}: platform '{platform}' not found for component '{domain}'")]
    UnknownPlatform {
        domain: String,
        platform: String,
        path: KeyPath,
    },

    #[error("{path}: action '{name}' not found")]
    UnknownAction { name: String, path: KeyPath },

    #[error("{path}: component '{domain}' requires component '{requires}'")]
    MissingDependency {
        domain: String,
        requires: String,
        path: KeyPath,
    },

    #[error("{path}: component '{domain}' does not support multiple entries")]
    MultipleEntries { domain: String, path: KeyPath },

    #[error("{path}: {message}")]
    InvalidDocument { path: KeyPath, message: String },
}

fn join(ids: &[Identifier]) -> String {
    ids.iter()
        .map(Identifier::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn cycle_path(members: &[(Identifier, KeyPath)]) -> String {
    let mut parts: Vec<String> = members
        .iter()
        .map(|(id, path)| format!("{id} ({path})"))
        .collect();
    if let Some((first, _)) = members.first() {
        parts.push(first.to_string());
    }
    parts.join(" -> ")
}

/// Result type alias for emission.
pub type Result<T> = std::result::Result<T, EmitError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn cycle_display_closes_the_loop() {
        let node = KeyPath::root().key("node");
        let err = EmitError::CyclicDependency {
            cycle: vec![
                (id("a"), node.index(0).key("id")),
                (id("b"), node.index(1).key("id")),
            ],
        };
        assert_eq!(
            err.to_string(),
            "cyclic dependency between identifiers: a (node[0].id) -> b (node[1].id) -> a"
        );
    }

    #[test]
    fn unknown_identifier_names_path() {
        let err = EmitError::UnknownIdentifier {
            id: id("ghost"),
            path: KeyPath::root().key("fan").index(0).key("hub_id"),
        };
        assert_eq!(err.to_string(), "fan[0].hub_id: unknown identifier 'ghost'");
    }

    #[test]
    fn ambiguous_default_lists_candidates() {
        let err = EmitError::AmbiguousDefault {
            class: "Hub".into(),
            path: KeyPath::root().key("fan"),
            candidates: vec![id("h1"), id("h2")],
        };
        assert!(err.to_string().contains("(h1, h2)"));
    }
}
