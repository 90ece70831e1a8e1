//! The diagnostic record and its builder API.

use std::fmt;

use aster_ir::Span;
use serde::Serialize;

use crate::DiagCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
            Severity::Info => f.write_str("info"),
        }
    }
}

/// A secondary span with context.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Related {
    pub span: Span,
    pub message: String,
}

/// A concrete replacement suggestion ("add ':' at end of line").
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct FixIt {
    pub message: String,
    pub span: Span,
    pub snippet: String,
}

/// A diagnostic with everything downstream tooling needs.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "std::option::Option::is_none")]
    pub code: Option<DiagCode>,
    pub message: String,
    pub span: Span,
    /// Producing stage, e.g. `aster-pii`.
    #[serde(skip_serializing_if = "std::option::Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<Related>,
    /// Key/value payload for code-action generation (function name,
    /// capability name, module name).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<FixIt>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            severity,
            code: None,
            message: message.into(),
            span,
            source: None,
            related_information: Vec::new(),
            data: Vec::new(),
            fixes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, message, span)
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warning, message, span)
    }

    pub fn info(message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Info, message, span)
    }

    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related_information.push(Related { span, message: message.into() });
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.push((key.into(), value.into()));
        self
    }

    /// Attach a concrete replacement suggestion.
    pub fn with_fix(
        mut self,
        message: impl Into<String>,
        span: Span,
        snippet: impl Into<String>,
    ) -> Self {
        self.fixes.push(FixIt {
            message: message.into(),
            span,
            snippet: snippet.into(),
        });
        self
    }

    /// Escalate a warning to an error (used by strict PII mode).
    pub fn escalate(mut self) -> Self {
        if self.severity == Severity::Warning {
            self.severity = Severity::Error;
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Look up a `data` entry by key.
    pub fn data_value(&self, key: &str) -> Option<&str> {
        self.data
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} [{}]: {}", self.severity, code, self.message)?,
            None => write!(f, "{}: {}", self.severity, self.message)?,
        }
        write!(f, " at {}", self.span)?;
        for related in &self.related_information {
            write!(f, "\n  --> {}: {}", related.span, related.message)?;
        }
        for fix in &self.fixes {
            write!(f, "\n  = help: {}", fix.message)?;
        }
        Ok(())
    }
}

/// Sort diagnostics by source position, ascending; stable for equal spans.
pub fn sort_by_position(diags: &mut [Diagnostic]) {
    diags.sort_by_key(|d| (d.span.start, d.span.end));
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_ir::Position;

    fn sp(line: u32, col: u32) -> Span {
        Span::point(Position::new(line, col))
    }

    #[test]
    fn builder_accumulates() {
        let diag = Diagnostic::error("unknown capability `Ftp`", sp(3, 14))
            .with_code(DiagCode::ParseUnknownCapability)
            .with_data("capability", "Ftp")
            .with_fix("use a known capability", sp(3, 14), "Http");

        assert!(diag.is_error());
        assert_eq!(diag.code, Some(DiagCode::ParseUnknownCapability));
        assert_eq!(diag.data_value("capability"), Some("Ftp"));
        assert_eq!(diag.fixes.len(), 1);
    }

    #[test]
    fn escalate_only_touches_warnings() {
        let warn = Diagnostic::warning("PII data transmitted over HTTP", sp(1, 1)).escalate();
        assert_eq!(warn.severity, Severity::Error);
        let info = Diagnostic::info("note", sp(1, 1)).escalate();
        assert_eq!(info.severity, Severity::Info);
    }

    #[test]
    fn display_includes_code_and_span() {
        let diag = Diagnostic::error("boom", sp(2, 5)).with_code(DiagCode::LexIllegalChar);
        let text = diag.to_string();
        assert!(text.contains("error [LEX_ILLEGAL_CHAR]: boom"));
        assert!(text.contains("2:5"));
    }

    #[test]
    fn sort_is_position_ascending() {
        let mut diags = vec![
            Diagnostic::error("b", sp(4, 1)),
            Diagnostic::error("a", sp(1, 2)),
            Diagnostic::error("c", sp(4, 9)),
        ];
        sort_by_position(&mut diags);
        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["a", "b", "c"]);
    }
}
