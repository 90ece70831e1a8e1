//! The scanner.
//!
//! An explicit state value advanced char-by-char. Positions are measured in
//! Unicode scalar values; `\n`, `\r\n`, and `\r` each count as exactly one
//! line. The indentation stack holds leading-space widths; its depth is
//! bounded by the number of source lines.

use aster_ir::{Position, Token, TokenKind};
use aster_lexicon::Lexicon;

use crate::LexError;

/// Tokenize canonical source for a lexicon.
///
/// The returned stream always ends with EOF, INDENT/DEDENT counts are
/// balanced, and token order matches source order.
pub fn lex(source: &str, lexicon: &Lexicon) -> Result<Vec<Token>, LexError> {
    Scanner::new(source, lexicon).run()
}

struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    indent_stack: Vec<usize>,
    tokens: Vec<Token>,
    lexicon: &'a Lexicon,
}

impl<'a> Scanner<'a> {
    fn new(source: &str, lexicon: &'a Lexicon) -> Self {
        Scanner {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            tokens: Vec::new(),
            lexicon,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            self.line_start()?;
            if self.is_eof() {
                break;
            }
            while !self.is_eof() && !self.at_newline() {
                self.scan_token()?;
            }
            if self.at_newline() {
                self.emit_newline();
            }
        }
        // Balance the stack at EOF.
        let here = self.position();
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, "", here, here));
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", here, here));
        Ok(self.tokens)
    }

    // ─── line structure ────────────────────────────────────────────────

    /// Consume blank and comment-only lines, then process indentation for
    /// the next non-blank line. Blank lines emit nothing structural.
    fn line_start(&mut self) -> Result<(), LexError> {
        loop {
            if self.is_eof() {
                return Ok(());
            }
            let width = self.peek_indent_width();
            match self.peek_at(width) {
                None => {
                    // Trailing spaces at EOF.
                    self.advance_n(width);
                    return Ok(());
                }
                Some('\n' | '\r') => {
                    // Blank line: swallow it whole.
                    self.advance_n(width);
                    self.consume_newline();
                }
                Some('/') if self.peek_at(width + 1) == Some('/') => {
                    self.advance_n(width);
                    self.scan_comment();
                    if self.at_newline() {
                        self.consume_newline();
                    }
                }
                Some('#') => {
                    self.advance_n(width);
                    self.scan_comment();
                    if self.at_newline() {
                        self.consume_newline();
                    }
                }
                Some(_) => {
                    self.apply_indentation(width)?;
                    self.advance_n(width);
                    return Ok(());
                }
            }
        }
    }

    fn apply_indentation(&mut self, width: usize) -> Result<(), LexError> {
        let start = self.position();
        let end = Position::new(self.line, self.col + width_u32(width));
        if width % 2 != 0 {
            return Err(LexError::OddIndent {
                width,
                span: aster_ir::Span::new(start, end),
            });
        }
        let top = *self.indent_stack.last().unwrap_or(&0);
        if width > top {
            self.indent_stack.push(width);
            self.tokens.push(Token::new(TokenKind::Indent, "", start, end));
        } else if width < top {
            while *self.indent_stack.last().unwrap_or(&0) > width {
                self.indent_stack.pop();
                self.tokens.push(Token::new(TokenKind::Dedent, "", start, start));
            }
            if *self.indent_stack.last().unwrap_or(&0) != width {
                return Err(LexError::DedentMismatch {
                    width,
                    span: aster_ir::Span::new(start, end),
                });
            }
        }
        Ok(())
    }

    fn emit_newline(&mut self) {
        let start = self.position();
        self.consume_newline();
        let end = Position::new(start.line, start.column + 1);
        self.tokens.push(Token::new(TokenKind::Newline, "", start, end));
    }

    fn consume_newline(&mut self) {
        match self.peek() {
            Some('\r') => {
                self.pos += 1;
                if self.peek() == Some('\n') {
                    self.pos += 1;
                }
                self.next_line();
            }
            Some('\n') => {
                self.pos += 1;
                self.next_line();
            }
            _ => {}
        }
    }

    fn next_line(&mut self) {
        self.line += 1;
        self.col = 1;
    }

    // ─── tokens ────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Result<(), LexError> {
        let Some(c) = self.peek() else { return Ok(()) };
        if c == ' ' {
            self.advance();
            return Ok(());
        }
        if c == '/' {
            if self.peek_at(1) == Some('/') {
                self.scan_comment();
            } else {
                self.single(TokenKind::Slash);
            }
            return Ok(());
        }
        if c == '#' {
            self.scan_comment();
            return Ok(());
        }
        if is_ident_start(c) {
            self.scan_identifier();
            return Ok(());
        }
        if c.is_ascii_digit() {
            self.scan_number();
            return Ok(());
        }
        if c == self.lexicon.punctuation.string_quotes.open {
            return self.scan_string();
        }

        let punct = self.punctuation_kind(c);
        if let Some(kind) = punct {
            self.single(kind);
            return Ok(());
        }
        match c {
            '<' => {
                self.two_char_compare(TokenKind::Lt, TokenKind::Lte);
                Ok(())
            }
            '>' => {
                self.two_char_compare(TokenKind::Gt, TokenKind::Gte);
                Ok(())
            }
            '=' => {
                let start = self.position();
                if self.peek_at(1) == Some('>') {
                    self.advance();
                    self.advance();
                    self.tokens
                        .push(Token::new(TokenKind::FatArrow, "=>", start, self.position()));
                    Ok(())
                } else {
                    self.advance();
                    Err(LexError::IllegalChar {
                        c,
                        span: aster_ir::Span::new(start, self.position()),
                    })
                }
            }
            _ => {
                let start = self.position();
                self.advance();
                Err(LexError::IllegalChar {
                    c,
                    span: aster_ir::Span::new(start, self.position()),
                })
            }
        }
    }

    /// Map a punctuation char — ASCII or the locale's — to its token kind.
    fn punctuation_kind(&self, c: char) -> Option<TokenKind> {
        let p = &self.lexicon.punctuation;
        if c == '.' || c == p.statement_end {
            return Some(TokenKind::Dot);
        }
        if c == ',' || c == p.list_separator || c == p.enum_separator {
            return Some(TokenKind::Comma);
        }
        if c == ':' || c == p.block_start {
            return Some(TokenKind::Colon);
        }
        if let Some(markers) = p.markers {
            if c == markers.open {
                return Some(TokenKind::LBracket);
            }
            if c == markers.close {
                return Some(TokenKind::RBracket);
            }
        }
        match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '@' => Some(TokenKind::At),
            '?' => Some(TokenKind::Question),
            _ => None,
        }
    }

    fn scan_identifier(&mut self) {
        let start = self.position();
        let mut value = String::new();
        let first = self.peek().unwrap_or(' ');
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let end = self.position();
        let kind = match value.as_str() {
            "true" | "false" => TokenKind::Bool,
            "null" => TokenKind::Null,
            _ if first.is_ascii_uppercase() => TokenKind::TypeIdent,
            _ => TokenKind::Ident,
        };
        self.tokens.push(Token::new(kind, value, start, end));
    }

    fn scan_number(&mut self) {
        let start = self.position();
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.advance();
            } else {
                break;
            }
        }
        // `.` only continues the number when a digit follows; `Return 3.`
        // keeps the dot as the statement terminator.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            digits.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    digits.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let end = self.position();
            self.tokens.push(Token::new(TokenKind::Float, digits, start, end));
            return;
        }
        if matches!(self.peek(), Some('l' | 'L')) {
            self.advance();
            let end = self.position();
            self.tokens.push(Token::new(TokenKind::Long, digits, start, end));
            return;
        }
        let end = self.position();
        self.tokens.push(Token::new(TokenKind::Int, digits, start, end));
    }

    fn scan_string(&mut self) -> Result<(), LexError> {
        let quotes = self.lexicon.punctuation.string_quotes;
        let start = self.position();
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(LexError::UnterminatedString {
                        span: aster_ir::Span::new(start, self.position()),
                    });
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some(c) if c == quotes.close || c == quotes.open => value.push(c),
                        Some(c) => {
                            value.push('\\');
                            value.push(c);
                        }
                        None => {
                            return Err(LexError::UnterminatedString {
                                span: aster_ir::Span::new(start, self.position()),
                            });
                        }
                    }
                    self.advance();
                }
                Some(c) if c == quotes.close => {
                    self.advance();
                    let end = self.position();
                    self.tokens.push(Token::new(TokenKind::Str, value, start, end));
                    return Ok(());
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_comment(&mut self) {
        let start = self.position();
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' || c == '\r' {
                break;
            }
            value.push(c);
            self.advance();
        }
        let end = self.position();
        self.tokens
            .push(Token::trivia(TokenKind::Comment, value, start, end));
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.position();
        let c = self.peek().unwrap_or(' ');
        self.advance();
        self.tokens
            .push(Token::new(kind, c.to_string(), start, self.position()));
    }

    fn two_char_compare(&mut self, plain: TokenKind, with_eq: TokenKind) {
        let start = self.position();
        let mut value = String::new();
        if let Some(c) = self.peek() {
            value.push(c);
        }
        self.advance();
        if self.peek() == Some('=') {
            value.push('=');
            self.advance();
            self.tokens.push(Token::new(with_eq, value, start, self.position()));
        } else {
            self.tokens.push(Token::new(plain, value, start, self.position()));
        }
    }

    // ─── cursor ────────────────────────────────────────────────────────

    fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn at_newline(&self) -> bool {
        matches!(self.peek(), Some('\n' | '\r'))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Leading-space count of the current line (cursor must be at column 1).
    fn peek_indent_width(&self) -> usize {
        let mut width = 0;
        while self.peek_at(width) == Some(' ') {
            width += 1;
        }
        width
    }

    fn advance(&mut self) {
        if self.pos < self.chars.len() {
            self.pos += 1;
            self.col += 1;
        }
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn width_u32(width: usize) -> u32 {
    u32::try_from(width).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use aster_lexicon::{english, simplified_chinese};
    use pretty_assertions::assert_eq;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn default_kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens
            .iter()
            .filter(|t| t.is_default_channel())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn greet_module_has_one_indent_one_dedent() {
        let en = english();
        let src = "this module is demo.greet.\nrule greet given name: Text, produce Text:\n  return \"Hi \".\n";
        let tokens = lex(src, &en).unwrap();
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn newline_styles_are_equivalent() {
        let en = english();
        let lf = lex("let x be 1.\nreturn x.\n", &en).unwrap();
        let crlf = lex("let x be 1.\r\nreturn x.\r\n", &en).unwrap();
        let cr = lex("let x be 1.\rreturn x.\r", &en).unwrap();
        assert_eq!(kinds(&lf), kinds(&crlf));
        assert_eq!(kinds(&lf), kinds(&cr));
        let values = |ts: &[Token]| ts.iter().map(|t| t.value.clone()).collect::<Vec<_>>();
        assert_eq!(values(&lf), values(&crlf));
        assert_eq!(values(&lf), values(&cr));
    }

    #[test]
    fn blank_lines_emit_nothing() {
        let en = english();
        let tokens = lex("let x be 1.\n\n   \nreturn x.\n", &en).unwrap();
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::Indent));
        let newlines = tokens.iter().filter(|t| t.kind == TokenKind::Newline).count();
        assert_eq!(newlines, 2);
    }

    #[test]
    fn comments_are_trivia() {
        let en = english();
        let tokens = lex("let x be 1. // note\n# whole line\nreturn x.\n", &en).unwrap();
        let comments: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .collect();
        assert_eq!(comments.len(), 2);
        assert!(comments.iter().all(|t| !t.is_default_channel()));
        // The comment-only line contributes no NEWLINE.
        let newlines = tokens.iter().filter(|t| t.kind == TokenKind::Newline).count();
        assert_eq!(newlines, 2);
    }

    #[test]
    fn type_ident_by_first_ascii_case() {
        let en = english();
        let tokens = lex("Text text 用户", &en).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::TypeIdent);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[2].kind, TokenKind::Ident);
        assert_eq!(tokens[2].value, "用户");
    }

    #[test]
    fn numbers_int_long_float() {
        let en = english();
        let tokens = lex("42 99L 3.14 7.", &en).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].value, "42");
        assert_eq!(tokens[1].kind, TokenKind::Long);
        assert_eq!(tokens[1].value, "99");
        assert_eq!(tokens[2].kind, TokenKind::Float);
        assert_eq!(tokens[2].value, "3.14");
        // `7.` is an int followed by the statement terminator.
        assert_eq!(tokens[3].kind, TokenKind::Int);
        assert_eq!(tokens[4].kind, TokenKind::Dot);
    }

    #[test]
    fn string_escapes_decode() {
        let en = english();
        let tokens = lex(r#"return "a\n\t\"b\\"."#, &en).unwrap();
        let s = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(s.value, "a\n\t\"b\\");
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let en = english();
        let err = lex("return \"oops\n", &en).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn odd_indentation_is_fatal() {
        let en = english();
        let err = lex("rule f, produce Int:\n   return 1.\n", &en).unwrap_err();
        assert!(matches!(err, LexError::OddIndent { width: 3, .. }));
    }

    #[test]
    fn dedent_mismatch_is_fatal() {
        let en = english();
        let src = "rule f, produce Int:\n    return 1.\n  return 2.\n";
        let err = lex(src, &en).unwrap_err();
        assert!(matches!(err, LexError::DedentMismatch { width: 2, .. }));
    }

    #[test]
    fn illegal_character_is_fatal() {
        let en = english();
        let err = lex("let x be 1 % 2.", &en).unwrap_err();
        assert!(matches!(err, LexError::IllegalChar { c: '%', .. }));
    }

    #[test]
    fn comparisons_and_arrows() {
        let en = english();
        let tokens = lex("< <= > >= => @ ?", &en).unwrap();
        assert_eq!(
            default_kinds(&tokens),
            vec![
                TokenKind::Lt,
                TokenKind::Lte,
                TokenKind::Gt,
                TokenKind::Gte,
                TokenKind::FatArrow,
                TokenKind::At,
                TokenKind::Question,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn bool_and_null_literals() {
        let en = english();
        let tokens = lex("true false null maybe", &en).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Bool);
        assert_eq!(tokens[1].kind, TokenKind::Bool);
        assert_eq!(tokens[2].kind, TokenKind::Null);
        assert_eq!(tokens[3].kind, TokenKind::Ident);
    }

    #[test]
    fn chinese_punctuation_maps_to_structural_tokens() {
        let zh = simplified_chinese();
        let tokens = lex("模块 测试。\n定义 状态 为以下之一 成功、失败。\n", &zh).unwrap();
        let dots = tokens.iter().filter(|t| t.kind == TokenKind::Dot).count();
        assert_eq!(dots, 2);
        let commas = tokens.iter().filter(|t| t.kind == TokenKind::Comma).count();
        assert_eq!(commas, 1);
        assert!(tokens.iter().any(|t| t.value == "为以下之一"));
    }

    #[test]
    fn chinese_corner_strings() {
        let zh = simplified_chinese();
        let tokens = lex("返回 「成功」。", &zh).unwrap();
        let s = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(s.value, "成功");
    }

    #[test]
    fn marker_brackets_become_brackets() {
        let zh = simplified_chinese();
        let tokens = lex("【定义】 用户。", &zh).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LBracket);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].value, "定义");
        assert_eq!(tokens[2].kind, TokenKind::RBracket);
    }

    #[test]
    fn deep_nesting_balances_at_eof() {
        let en = english();
        let src = "a:\n  b:\n    c:\n      d.\n";
        let tokens = lex(src, &en).unwrap();
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, 3);
        assert_eq!(dedents, 3);
    }

    #[test]
    fn token_positions_are_consistent() {
        let en = english();
        let tokens = lex("let x be 1.\n", &en).unwrap();
        for t in &tokens {
            assert!(t.end.line >= t.start.line, "{t:?}");
            if t.end.line == t.start.line {
                assert!(t.end.column >= t.start.column, "{t:?}");
            }
        }
        assert_eq!(tokens[0].start, Position::new(1, 1));
        assert_eq!(tokens[0].end, Position::new(1, 4));
        assert_eq!(tokens[1].start, Position::new(1, 5));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn indent_balance(src in "[a-z :.\n ]{0,300}") {
                let en = english();
                if let Ok(tokens) = lex(&src, &en) {
                    let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
                    let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
                    prop_assert_eq!(indents, dedents);
                    prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
                }
            }

            #[test]
            fn newline_independence(body in "[a-z .]{0,40}") {
                let en = english();
                let lf = lex(&format!("{body}\n{body}\n"), &en);
                let crlf = lex(&format!("{body}\r\n{body}\r\n"), &en);
                match (lf, crlf) {
                    (Ok(a), Ok(b)) => {
                        let ka: Vec<_> = a.iter().map(|t| (t.kind, t.value.clone())).collect();
                        let kb: Vec<_> = b.iter().map(|t| (t.kind, t.value.clone())).collect();
                        prop_assert_eq!(ka, kb);
                    }
                    (Err(_), Err(_)) => {}
                    _ => prop_assert!(false, "LF and CRLF disagreed on success"),
                }
            }
        }
    }
}
