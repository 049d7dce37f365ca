//! Error types for the core data model.

/// Errors produced while building or decoding core values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Malformed RF address text.
    #[error("invalid RF address '{input}': {reason}")]
    InvalidFormat {
        /// The text that failed to parse.
        input: String,
        /// Human-readable cause.
        reason: &'static str,
    },

    /// A mapping was built with the same key twice.
    #[error("duplicate key '{key}' in mapping")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// An identifier that is empty or contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid identifier '{0}': must be non-empty and use only letters, digits and '_'")]
    InvalidIdentifier(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
