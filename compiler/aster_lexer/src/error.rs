//! Typed lexer errors.
//!
//! Lex errors are fatal to the stage; the pipeline converts them into
//! diagnostics at its boundary.

use aster_diagnostic::{DiagCode, Diagnostic};
use aster_ir::Span;
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum LexError {
    #[error("illegal character `{c}`")]
    IllegalChar { c: char, span: Span },

    #[error("indentation of {width} is not a multiple of 2")]
    OddIndent { width: usize, span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("dedent to width {width} matches no enclosing indentation level")]
    DedentMismatch { width: usize, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::IllegalChar { span, .. }
            | LexError::OddIndent { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::DedentMismatch { span, .. } => *span,
        }
    }

    fn code(&self) -> DiagCode {
        match self {
            LexError::IllegalChar { .. } => DiagCode::LexIllegalChar,
            LexError::OddIndent { .. } => DiagCode::LexBadIndent,
            LexError::UnterminatedString { .. } => DiagCode::LexUnterminatedString,
            LexError::DedentMismatch { .. } => DiagCode::LexDedentMismatch,
        }
    }

    /// Convert into a diagnostic, attaching a fix hint where one is obvious.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string(), self.span()).with_code(self.code());
        match self {
            LexError::OddIndent { span, .. } => {
                diag.with_fix("indent in steps of two spaces", *span, "  ")
            }
            LexError::UnterminatedString { span } => {
                diag.with_fix("add a closing quote", Span::point(span.end), "\"")
            }
            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_ir::Position;

    #[test]
    fn diagnostic_carries_code_and_span() {
        let err = LexError::IllegalChar {
            c: '%',
            span: Span::point(Position::new(3, 7)),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, Some(DiagCode::LexIllegalChar));
        assert_eq!(diag.span.start, Position::new(3, 7));
        assert!(diag.message.contains('%'));
    }

    #[test]
    fn odd_indent_has_fix() {
        let err = LexError::OddIndent { width: 3, span: Span::DUMMY };
        assert!(!err.to_diagnostic().fixes.is_empty());
    }
}
