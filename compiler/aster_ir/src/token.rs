//! Tokens produced by the lexer and consumed (post-translation) by the parser.
//!
//! Comments and blank-line bookkeeping live on the trivia channel; the parser
//! only looks at the default channel. `FLOAT` covers both single- and
//! double-precision source literals (the value keeps the decimal text, so
//! nothing is lost by the unification).

use std::fmt;

use crate::{Position, Span};

/// Which channel a token travels on.
///
/// Trivia tokens (comments) are preserved for tooling but skipped by the
/// parser.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Channel {
    #[default]
    Default,
    Trivia,
}

/// Token kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    /// Identifier starting with a lowercase ASCII letter, `_`, or any letter
    /// of a caseless script.
    Ident,
    /// Identifier starting with an uppercase ASCII letter.
    TypeIdent,

    Int,
    /// Integer with an `l`/`L` suffix; value keeps the decimal digits.
    Long,
    /// Decimal literal; value keeps the source text.
    Float,
    Str,
    Bool,
    Null,

    Dot,
    Comma,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Slash,
    Lt,
    Lte,
    Gt,
    Gte,
    At,
    /// `?` suffix building a `Maybe` type.
    Question,
    /// `=>` introducing an arrow-lambda body.
    FatArrow,

    Newline,
    Indent,
    Dedent,
    Eof,

    Comment,
}

impl TokenKind {
    /// True for kinds whose `value` is an identifier-like word the keyword
    /// translator may rewrite.
    pub fn is_word(self) -> bool {
        matches!(self, TokenKind::Ident | TokenKind::TypeIdent)
    }

    /// True for literal kinds.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Str
                | TokenKind::Bool
                | TokenKind::Null
        )
    }
}

/// A token with its source text and position.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub start: Position,
    pub end: Position,
    pub channel: Channel,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        start: Position,
        end: Position,
    ) -> Self {
        Token {
            kind,
            value: value.into(),
            start,
            end,
            channel: Channel::Default,
        }
    }

    /// Create a trivia-channel token.
    pub fn trivia(
        kind: TokenKind,
        value: impl Into<String>,
        start: Position,
        end: Position,
    ) -> Self {
        Token {
            kind,
            value: value.into(),
            start,
            end,
            channel: Channel::Trivia,
        }
    }

    /// The span this token covers.
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// True when the token is on the default channel.
    pub fn is_default_channel(&self) -> bool {
        self.channel == Channel::Default
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?}) @ {}", self.kind, self.value, self.span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_span() {
        let tok = Token::new(
            TokenKind::Ident,
            "greet",
            Position::new(1, 6),
            Position::new(1, 11),
        );
        assert_eq!(tok.span(), Span::new(Position::new(1, 6), Position::new(1, 11)));
        assert!(tok.is_default_channel());
    }

    #[test]
    fn trivia_channel() {
        let tok = Token::trivia(
            TokenKind::Comment,
            "// note",
            Position::new(3, 1),
            Position::new(3, 8),
        );
        assert!(!tok.is_default_channel());
    }

    #[test]
    fn word_and_literal_kinds() {
        assert!(TokenKind::Ident.is_word());
        assert!(TokenKind::TypeIdent.is_word());
        assert!(!TokenKind::Dot.is_word());
        assert!(TokenKind::Long.is_literal());
        assert!(!TokenKind::Eof.is_literal());
    }
}
