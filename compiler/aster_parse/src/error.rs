//! Typed parse errors.

use aster_diagnostic::{DiagCode, Diagnostic};
use aster_ir::Span;

/// A parse error: fatal for its enclosing top-level declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub code: DiagCode,
    /// Optional fix-it: (message, snippet) anchored at `span`.
    pub fix: Option<(String, String)>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
            code: DiagCode::ParseExpected,
            fix: None,
        }
    }

    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = code;
        self
    }

    pub fn with_fix(mut self, message: impl Into<String>, snippet: impl Into<String>) -> Self {
        self.fix = Some((message.into(), snippet.into()));
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.message.clone(), self.span).with_code(self.code);
        match &self.fix {
            Some((message, snippet)) => diag.with_fix(message.clone(), self.span, snippet.clone()),
            None => diag,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_ir::Position;

    #[test]
    fn diagnostic_conversion_keeps_fix() {
        let err = ParseError::new("expected ':' at end of line", Span::point(Position::new(2, 40)))
            .with_fix("add ':' at end of line", ":");
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, Some(DiagCode::ParseExpected));
        assert_eq!(diag.fixes.len(), 1);
        assert_eq!(diag.fixes[0].snippet, ":");
    }
}
