#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use thiserror::Error;

/// Error code constants for type-safe error handling
pub mod code {
    pub const INVALID: &str = "INVALID";
    pub const NOTFOUND: &str = "NOTFOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const DEPENDENCY: &str = "DEPENDENCY";
    pub const CANCELLED: &str = "CANCELLED";
    pub const INTERNAL: &str = "INTERNAL";
}

/// A hierarchical name that does not follow
/// `parent/results/result/records/record` (or `parent/results/result`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameParseError {
    #[error("name {name:?} must have {expected} parts separated by '/', got {actual}")]
    SegmentCount {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("name {name:?} has connector {found:?} at position {position}, expected {expected:?}")]
    Connector {
        name: String,
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error("name {name:?} has an empty {segment} segment")]
    EmptySegment { name: String, segment: &'static str },
}

/// A payload that cannot be wrapped into or unwrapped from its typed envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("unsupported payload kind: {0:?}")]
    UnsupportedKind(String),

    #[error("malformed payload envelope: {0}")]
    MalformedEnvelope(String),

    #[error("cannot decode {kind} payload: {reason}")]
    Decode { kind: &'static str, reason: String },

    #[error("cannot encode {kind} payload: {reason}")]
    Encode { kind: &'static str, reason: String },

    #[error("source object is missing {0}")]
    MissingField(&'static str),
}

#[derive(Error, Debug)]
pub enum ResultsError {
    #[error("Name error: {0}")]
    NameParse(#[from] NameParseError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    #[error("Failed to apply patch to {namespace}/{name}: {reason}")]
    PatchApply {
        namespace: String,
        name: String,
        reason: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Reconciliation cancelled")]
    Cancelled,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ResultsError {
    /// Returns the protocol error code for this error
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NameParse(_)
            | Self::Conversion(_)
            | Self::ConfigError(_)
            | Self::SerializationError(_) => code::INVALID,
            Self::NotFound(_) => code::NOTFOUND,
            Self::Conflict(_) => code::CONFLICT,
            Self::RemoteCall(_) | Self::PatchApply { .. } | Self::IoError(_) => code::DEPENDENCY,
            Self::Cancelled => code::CANCELLED,
            Self::DatabaseError(_) | Self::SqlxError(_) => code::INTERNAL,
        }
    }

    /// Returns the exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NameParse(_) | Self::ConfigError(_) => 2,
            Self::RemoteCall(_) | Self::DatabaseError(_) | Self::SqlxError(_) => 3,
            Self::Conflict(_) => 4,
            Self::NotFound(_) => 5,
            Self::PatchApply { .. } => 6,
            Self::IoError(_) => 7,
            Self::Conversion(_) | Self::SerializationError(_) => 8,
            Self::Cancelled => 9,
        }
    }

    /// True for the one outcome a caller may treat as "nothing left to do".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ResultsError>;

#[cfg(test)]
mod tests {
    use super::{code, ConversionError, NameParseError, ResultsError};

    #[test]
    fn name_errors_are_invalid_input_with_exit_code_two() {
        let err = ResultsError::from(NameParseError::EmptySegment {
            name: "a/results/b/records/".to_string(),
            segment: "record",
        });
        assert_eq!(err.code(), code::INVALID);
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("empty record segment"));
    }

    #[test]
    fn conflicts_and_not_found_keep_distinct_codes() {
        assert_eq!(ResultsError::Conflict("x".into()).code(), code::CONFLICT);
        assert_eq!(ResultsError::NotFound("x".into()).code(), code::NOTFOUND);
        assert!(ResultsError::NotFound("x".into()).is_not_found());
        assert!(!ResultsError::Cancelled.is_not_found());
    }

    #[test]
    fn conversion_errors_render_the_offending_kind() {
        let err = ResultsError::from(ConversionError::UnsupportedKind("x/y".to_string()));
        assert_eq!(err.to_string(), "Conversion error: unsupported payload kind: \"x/y\"");
        assert_eq!(err.exit_code(), 8);
    }
}
