//! Diagnostic parser for toolchain message lines.
//!
//! The wire format consumed from the compiler is
//! `"<filename>:<lineno>: <severity>: <text>"`. The filename may contain
//! path separators and drive-letter colons, an optional column number after
//! the line number is accepted and discarded, and the free text keeps any
//! embedded colons untruncated.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Severity token of one diagnostic line, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(token: &str) -> Result<Self, ()> {
        match token {
            "note" => Ok(Severity::Note),
            "warning" => Ok(Severity::Warning),
            // gcc and clang spell hard stops as "fatal error"
            "error" | "fatal error" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// One structured message emitted while compiling or linking a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Source file the message points at. Empty for fallback diagnostics
    /// synthesized from unstructured toolchain output.
    pub filename: String,
    /// 1-based line number; 0 for fallback diagnostics.
    pub lineno: u32,
    pub severity: Severity,
    /// Message body, colons and all.
    pub text: String,
}

impl Diagnostic {
    /// Wrap an unstructured fatal toolchain line with best-available fields.
    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            filename: String::new(),
            lineno: 0,
            severity: Severity::Error,
            text: text.into(),
        }
    }

    /// Whether this diagnostic aborts a build.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.filename, self.lineno, self.severity, self.text
        )
    }
}

/// A line that is missing one of the three structured leading fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed diagnostic line: {line:?}")]
pub struct ParseDiagnosticError {
    pub line: String,
}

impl FromStr for Diagnostic {
    type Err = ParseDiagnosticError;

    fn from_str(line: &str) -> Result<Self, ParseDiagnosticError> {
        let malformed = || ParseDiagnosticError {
            line: line.to_string(),
        };

        let mut fields = line.splitn(3, ": ");
        let location = fields.next().unwrap_or_default();
        let severity = fields.next().ok_or_else(malformed)?;
        let text = fields.next().ok_or_else(malformed)?;

        let severity: Severity = severity.parse().map_err(|()| malformed())?;
        let (filename, lineno) = split_location(location).ok_or_else(malformed)?;

        Ok(Diagnostic {
            filename,
            lineno,
            severity,
            text: text.to_string(),
        })
    }
}

/// Split `"<filename>:<lineno>[:<column>]"`. The filename keeps any colons
/// of its own; only trailing numeric segments count as position fields.
fn split_location(location: &str) -> Option<(String, u32)> {
    let segments: Vec<&str> = location.split(':').collect();
    let is_numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let mut trailing = 0;
    while trailing < 2 && trailing + 1 < segments.len() && is_numeric(segments[segments.len() - 1 - trailing]) {
        trailing += 1;
    }
    if trailing == 0 {
        return None;
    }

    let line_index = segments.len() - trailing;
    let lineno: u32 = segments[line_index].parse().ok()?;
    let filename = segments[..line_index].join(":");
    if filename.is_empty() {
        return None;
    }
    Some((filename, lineno))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_line() {
        let diag: Diagnostic = "dir/subdir/name.c:123: error: text and more text"
            .parse()
            .unwrap();
        assert_eq!(diag.filename, "dir/subdir/name.c");
        assert_eq!(diag.lineno, 123);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.text, "text and more text");
    }

    #[test]
    fn test_parse_keeps_colons_in_text() {
        let diag: Diagnostic = "a.c:1: warning: lhs: rhs: tail".parse().unwrap();
        assert_eq!(diag.text, "lhs: rhs: tail");
    }

    #[test]
    fn test_parse_line_with_column() {
        let diag: Diagnostic = "main.c:3:9: warning: \"REDEF\" redefined".parse().unwrap();
        assert_eq!(diag.filename, "main.c");
        assert_eq!(diag.lineno, 3);
        assert_eq!(diag.text, "\"REDEF\" redefined");
    }

    #[test]
    fn test_parse_drive_letter_filename() {
        let diag: Diagnostic = r"C:\src\main.c:10: error: oops".parse().unwrap();
        assert_eq!(diag.filename, r"C:\src\main.c");
        assert_eq!(diag.lineno, 10);
    }

    #[test]
    fn test_parse_fatal_error_token() {
        let diag: Diagnostic = "a.c:1:10: fatal error: missing.h: No such file or directory"
            .parse()
            .unwrap();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.text, "missing.h: No such file or directory");
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!("no structure at all".parse::<Diagnostic>().is_err());
        assert!("collect2: error: ld returned 1 exit status".parse::<Diagnostic>().is_err());
        assert!("a.c:notanumber: error: text".parse::<Diagnostic>().is_err());
        assert!("a.c:1: shrug: text".parse::<Diagnostic>().is_err());
        assert!("a.c:1: warning".parse::<Diagnostic>().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Note < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_display_reproduces_wire_line() {
        let line = "src/a.c:42: warning: unused variable 'x'";
        let diag: Diagnostic = line.parse().unwrap();
        assert_eq!(diag.to_string(), line);
    }

    #[test]
    fn test_fallback_has_best_available_fields() {
        let diag = Diagnostic::fallback("undefined reference to `f'");
        assert_eq!(diag.filename, "");
        assert_eq!(diag.lineno, 0);
        assert!(diag.is_fatal());
    }
}
