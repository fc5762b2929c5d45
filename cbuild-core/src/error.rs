//! Error taxonomy for sessions, pipelines, and artifacts.

use thiserror::Error;

use crate::diag::{Diagnostic, ParseDiagnosticError};

/// Main cbuild error type.
///
/// Sub-fatal diagnostics never surface here; they are recorded on the
/// produced artifact. Filesystem failures pass through as [`Error::Io`]
/// without reclassification.
#[derive(Error, Debug)]
pub enum Error {
    /// A fatal diagnostic aborted the build. Carries the parsed positional
    /// fields of the first `error`-severity line the toolchain emitted.
    #[error("compilation failed: {0}")]
    Compile(Diagnostic),

    /// A diagnostic line did not match the expected structured format.
    #[error(transparent)]
    DiagnosticParse(#[from] ParseDiagnosticError),

    /// Lookup of a symbol the link image does not define.
    #[error("symbol not found: '{name}'")]
    SymbolNotFound { name: String },

    /// An operation was attempted on a closed artifact, or relocation
    /// itself failed during an implicit-relocation access.
    #[error("invalid state: {what}")]
    InvalidState { what: String },

    /// No usable toolchain or unusable construction arguments.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// Filesystem failure, propagated unmodified.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The parsed diagnostic behind a compile failure, if any.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Error::Compile(diag) => Some(diag),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Severity;

    #[test]
    fn test_compile_error_renders_diagnostic_line() {
        let diag: Diagnostic = "main.c:7: error: expected ';'".parse().unwrap();
        let err = Error::Compile(diag);
        assert_eq!(
            err.to_string(),
            "compilation failed: main.c:7: error: expected ';'"
        );
        assert_eq!(err.diagnostic().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_io_error_passes_through() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from(io);
        assert!(matches!(err, Error::Io(_)));
    }
}
