//! Validation errors.

use std::fmt;

use ecofan_core::KeyPath;

/// What kind of rule a [`ValidationError`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required key is absent.
    MissingField,
    /// A key not declared by a closed schema.
    UnknownField,
    /// A value of the wrong shape or outside its allowed range.
    InvalidValue,
    /// A malformed RF address.
    InvalidFormat,
    /// A whole-object cross-field check failed.
    Object,
}

/// One violation, located by its key path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub path: KeyPath,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, path: KeyPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    pub fn missing(path: KeyPath) -> Self {
        let key = path.last_key().unwrap_or_default().to_string();
        Self::new(
            ErrorKind::MissingField,
            path,
            format!("missing required field `{key}`"),
        )
    }

    pub fn invalid(path: KeyPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidValue, path, message)
    }
}

/// All errors collected while validating one or more entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn single(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
    }

    /// True if any error has the given kind.
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n  {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

impl From<ValidationError> for ValidationReport {
    fn from(err: ValidationError) -> Self {
        Self::single(err)
    }
}
