//! Token cursor with trivia skipping and keyword matching.

use aster_ir::{Position, Span, Token, TokenKind};

/// Cursor over the token stream.
///
/// Trivia-channel tokens are invisible: `advance` steps over them and
/// `current` never returns one. The last token is always EOF, so `current`
/// is total.
pub struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    eof: Token,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let end = tokens
            .last()
            .map_or(Position::ORIGIN, |t| t.end);
        let mut cursor = Cursor {
            tokens,
            pos: 0,
            eof: Token::new(TokenKind::Eof, "", end, end),
        };
        cursor.skip_trivia();
        cursor
    }

    fn skip_trivia(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|t| !t.is_default_channel())
        {
            self.pos += 1;
        }
    }

    /// The current default-channel token (EOF when exhausted).
    pub fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    /// Lookahead by `n` default-channel tokens.
    pub fn peek(&self, n: usize) -> &Token {
        let mut idx = self.pos;
        let mut remaining = n;
        while remaining > 0 {
            idx += 1;
            while self
                .tokens
                .get(idx)
                .is_some_and(|t| !t.is_default_channel())
            {
                idx += 1;
            }
            remaining -= 1;
        }
        self.tokens.get(idx).unwrap_or(&self.eof)
    }

    pub fn kind(&self) -> TokenKind {
        self.current().kind
    }

    pub fn span(&self) -> Span {
        self.current().span()
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> Span {
        let mut idx = self.pos;
        while idx > 0 {
            idx -= 1;
            if self.tokens.get(idx).is_some_and(Token::is_default_channel) {
                return self.tokens[idx].span();
            }
        }
        Span::DUMMY
    }

    pub fn at_eof(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    /// Consume the current token and return it.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
            self.skip_trivia();
        }
        token
    }

    /// True when the current token is a word matching `keyword`
    /// (ASCII-case-insensitively).
    pub fn check_word(&self, keyword: &str) -> bool {
        let token = self.current();
        token.kind.is_word() && token.value.eq_ignore_ascii_case(keyword)
    }

    /// True when the next `words` all match in sequence.
    pub fn check_words(&self, words: &[&str]) -> bool {
        words.iter().enumerate().all(|(i, w)| {
            let token = if i == 0 { self.current() } else { self.peek(i) };
            token.kind.is_word() && token.value.eq_ignore_ascii_case(w)
        })
    }

    /// Consume a matching keyword, returning whether it was there.
    pub fn eat_word(&mut self, keyword: &str) -> bool {
        if self.check_word(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a run of matching keywords; consumes nothing on a miss.
    pub fn eat_words(&mut self, words: &[&str]) -> bool {
        if self.check_words(words) {
            for _ in words {
                self.advance();
            }
            true
        } else {
            false
        }
    }

    pub fn check_kind(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub fn eat_kind(&mut self, kind: TokenKind) -> bool {
        if self.check_kind(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip NEWLINE tokens.
    pub fn skip_newlines(&mut self) {
        while self.check_kind(TokenKind::Newline) {
            self.advance();
        }
    }

    /// True when `current` directly abuts the previous token (no gap),
    /// used to tell a qualified-name dot from a statement terminator.
    pub fn glued_to_previous(&self) -> bool {
        let prev = self.previous_span();
        let here = self.span();
        prev.end == here.start
    }
}
