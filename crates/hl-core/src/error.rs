use crate::types::{Diagnostic, SourceLocation};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct HerlangError {
    pub code: String,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl HerlangError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(
        code: impl Into<String>,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn unknown_dialect(id: &str) -> Self {
        Self::new(
            "UNKNOWN_DIALECT",
            format!("Dialect \"{}\" is not registered.", id),
        )
    }

    /// Lifts a fatal translation diagnostic into an error for callers that
    /// cannot report diagnostics themselves.
    pub fn translation_syntax(diagnostic: &Diagnostic) -> Self {
        Self {
            code: "TRANSLATION_SYNTAX".to_string(),
            message: diagnostic.render(),
            location: diagnostic
                .line
                .zip(diagnostic.column)
                .map(|(line, column)| SourceLocation { line, column }),
        }
    }
}
