//! Error and problem-report types.
//!
//! Fatal conditions (unreadable documents, broken schemas) are `thiserror`
//! enums. Per-leaf findings are collected as [`Problem`]s so that a single
//! resolution reports every bad path at once.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{ConfigPath, ValueKind};

/// Problem codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemCode {
    /// Leaf has no usable value from any source.
    MissingRequiredField,
    /// Environment string could not be parsed as the declared type.
    TypeCoercionFailure,
    /// Document value has the wrong type for the leaf.
    InvalidFieldValue,
}

impl ProblemCode {
    /// Whether this problem prevents a `Settings` from being handed out.
    pub fn is_fatal(self) -> bool {
        !matches!(self, ProblemCode::TypeCoercionFailure)
    }
}

/// One finding about one configuration path.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub code: ProblemCode,
    pub path: String,
    pub variable: Option<String>,
    pub message: String,
}

impl Problem {
    pub fn new(code: ProblemCode, path: &ConfigPath, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.to_string(),
            variable: None,
            message: message.into(),
        }
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(path: &ConfigPath) -> Self {
        Self::new(
            ProblemCode::MissingRequiredField,
            path,
            format!("{} is required but has not been set", path),
        )
    }

    pub fn coercion_failure(path: &ConfigPath, variable: &str, raw: &str, kind: ValueKind) -> Self {
        Self::new(
            ProblemCode::TypeCoercionFailure,
            path,
            format!("{}={:?} is not a valid {}", variable, raw, kind),
        )
        .with_variable(variable)
    }

    pub fn invalid_value(path: &ConfigPath, expected: ValueKind, found: ValueKind) -> Self {
        Self::new(
            ProblemCode::InvalidFieldValue,
            path,
            format!("expected {} but the document holds {}", expected, found),
        )
    }

    /// A document entry whose shape cannot hold what the schema declares,
    /// such as an array where a scalar leaf or a section is expected.
    pub fn invalid_shape(path: &ConfigPath, expected: &str, found: &str) -> Self {
        Self::new(
            ProblemCode::InvalidFieldValue,
            path,
            format!("expected {} but the document holds {}", expected, found),
        )
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Failure to build a [`Schema`](crate::config::Schema).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{first} and {second} both map to variable {name}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("default for {path} is {found} but the leaf is declared {expected}")]
    DefaultTypeMismatch {
        path: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("duplicate key {path}")]
    DuplicateKey { path: String },

    #[error("schema names must be non-empty and must not contain '.'")]
    InvalidName,
}

/// Failure to read, parse or generate a settings document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read settings document {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings document {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to write settings document {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize default settings: {0}")]
    Serialize(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported value at {path}: {what} cannot be represented")]
    UnsupportedValue { path: String, what: String },

    #[error(
        "settings document version {found} is not compatible with application settings version {expected}"
    )]
    Version { found: String, expected: String },
}

/// A failed resolution, listing every problem found.
#[derive(Error, Debug)]
pub struct ConfigurationError {
    pub problems: Vec<Problem>,
    /// Document generated during this resolution, if any.
    pub document_created: Option<PathBuf>,
    #[source]
    pub cause: Option<ConfigurationCause>,
}

/// Fatal cause that stopped a resolution before validation.
#[derive(Error, Debug)]
pub enum ConfigurationCause {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("invalid value for {variable}: {value:?} (expected one of true, 1, t, false, 0, f)")]
    Toggle { variable: String, value: String },
}

impl ConfigurationError {
    pub fn from_problems(problems: Vec<Problem>, document_created: Option<PathBuf>) -> Self {
        Self {
            problems,
            document_created,
            cause: None,
        }
    }

    pub fn from_cause(cause: impl Into<ConfigurationCause>) -> Self {
        Self {
            problems: Vec::new(),
            document_created: None,
            cause: Some(cause.into()),
        }
    }
}

impl From<DocumentError> for ConfigurationError {
    fn from(err: DocumentError) -> Self {
        Self::from_cause(err)
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref cause) = self.cause {
            return write!(f, "settings could not be resolved: {}", cause);
        }
        write!(
            f,
            "the following settings are missing or invalid ({}):",
            self.problems.len()
        )?;
        for problem in &self.problems {
            write!(f, "\n- {}", problem)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(dotted: &str) -> ConfigPath {
        ConfigPath::parse(dotted).unwrap()
    }

    #[test]
    fn test_only_coercion_failures_are_non_fatal() {
        assert!(!ProblemCode::TypeCoercionFailure.is_fatal());
        assert!(ProblemCode::MissingRequiredField.is_fatal());
        assert!(ProblemCode::InvalidFieldValue.is_fatal());
    }

    #[test]
    fn test_configuration_error_lists_every_problem() {
        let err = ConfigurationError::from_problems(
            vec![
                Problem::missing_field(&path("discord.token")),
                Problem::coercion_failure(
                    &path("database.port"),
                    "KOMODO_DATABASE_PORT",
                    "abc",
                    ValueKind::Integer,
                ),
            ],
            None,
        );
        let text = err.to_string();
        assert!(text.contains("(2)"));
        let token_line = "\n- discord.token: discord.token is required";
        let port_line = "\n- database.port: KOMODO_DATABASE_PORT=\"abc\" is not a valid integer";
        assert!(text.contains(token_line));
        assert!(text.contains(port_line));
    }

    #[test]
    fn test_configuration_error_with_cause() {
        let err = ConfigurationError::from(DocumentError::Version {
            found: "9.0.0".into(),
            expected: "0.1.0".into(),
        });
        assert!(err.to_string().contains("9.0.0"));
        assert!(err.problems.is_empty());
    }
}
