#![forbid(unsafe_code)]

//! Error types for the undo engine.
//!
//! Misuse of the manager (accept without begin, undo while recording, ...)
//! is never an error: those calls are silent no-ops. The only failures that
//! surface are collaborator failures, where an [`UndoObject`] could not
//! reverse or replay its mutation, and configuration loading failures.
//!
//! [`UndoObject`]: crate::UndoObject

use thiserror::Error;

/// Result of reversing or replaying history.
pub type UndoResult<T = ()> = Result<T, UndoError>;

/// A reversible mutation failed to apply.
///
/// Returned by [`UndoObject::undo`](crate::UndoObject::undo) and
/// [`UndoObject::redo`](crate::UndoObject::redo), and propagated unchanged
/// by steps and by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UndoError {
    /// Reversing a mutation failed.
    #[error("undo of '{description}' failed: {reason}")]
    UndoFailed { description: String, reason: String },
    /// Replaying a mutation failed.
    #[error("redo of '{description}' failed: {reason}")]
    RedoFailed { description: String, reason: String },
    /// The object the mutation targets no longer exists.
    #[error("target '{0}' no longer exists")]
    TargetNotFound(String),
    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl UndoError {
    /// Shorthand for [`UndoError::UndoFailed`].
    pub fn undo_failed(description: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UndoFailed {
            description: description.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`UndoError::RedoFailed`].
    pub fn redo_failed(description: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RedoFailed {
            description: description.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from loading an [`UndoConfig`](crate::UndoConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_failed_display() {
        let err = UndoError::undo_failed("Move Object", "object deleted");
        assert_eq!(err.to_string(), "undo of 'Move Object' failed: object deleted");
    }

    #[test]
    fn redo_failed_display() {
        let err = UndoError::redo_failed("Paint", "layer locked");
        assert_eq!(err.to_string(), "redo of 'Paint' failed: layer locked");
    }

    #[test]
    fn target_not_found_display() {
        let err = UndoError::TargetNotFound("Entity42".into());
        assert_eq!(err.to_string(), "target 'Entity42' no longer exists");
    }

    #[test]
    fn validation_joins_messages() {
        let err = ConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConfigError = io.into();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }
}
