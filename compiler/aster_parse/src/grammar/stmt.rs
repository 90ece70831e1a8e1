//! Statement and pattern parsing.

use aster_ir::{Block, Expr, MatchCase, Pattern, Stmt, TokenKind};
use tracing::trace;

use super::{Parse, Parser};
use crate::ParseError;

impl Parser<'_> {
    /// Statement terminator after an expression. A `function …:` lambda
    /// ends in a block whose tail already consumed the terminator, so the
    /// dot is optional there; everywhere else it is required.
    fn end_of_stmt(&mut self, expr: &Expr) -> Parse<()> {
        if matches!(expr, Expr::Lambda { ret_type: Some(_), .. }) {
            self.cursor.eat_kind(TokenKind::Dot);
            Ok(())
        } else {
            self.expect_dot()
        }
    }

    pub(crate) fn parse_stmt(&mut self) -> Parse<Stmt> {
        trace!(token = %self.cursor.current().value, "statement");
        if self.cursor.check_word("let") {
            return self.parse_let();
        }
        if self.cursor.check_word("set") {
            return self.parse_set();
        }
        if self.cursor.check_word("return") {
            return self.parse_return();
        }
        if self.cursor.check_word("if") {
            return self.parse_if();
        }
        if self.cursor.check_word("match") {
            return self.parse_match();
        }
        if self.cursor.check_word("start") {
            return self.parse_start();
        }
        if self.cursor.check_words(&["wait", "for"]) {
            return self.parse_wait();
        }
        if self.cursor.check_words(&["within", "scope"]) {
            return self.parse_scope();
        }
        self.parse_call_stmt()
    }

    fn parse_let(&mut self) -> Parse<Stmt> {
        let start = self.cursor.span();
        self.cursor.eat_word("let");
        let name = self.expect_any_word("a name")?.value;
        self.expect_keyword("be")?;
        let expr = self.parse_expr()?;
        self.end_of_stmt(&expr)?;
        Ok(Stmt::Let { name, expr, span: start.merge(self.cursor.previous_span()) })
    }

    fn parse_set(&mut self) -> Parse<Stmt> {
        let start = self.cursor.span();
        self.cursor.eat_word("set");
        let name = self.expect_any_word("a name")?.value;
        self.expect_keyword("to")?;
        let expr = self.parse_expr()?;
        self.end_of_stmt(&expr)?;
        Ok(Stmt::Set { name, expr, span: start.merge(self.cursor.previous_span()) })
    }

    /// `Return <expr>.` — optionally followed by a trailing
    /// `It performs … .` sentence that merges into the enclosing function.
    fn parse_return(&mut self) -> Parse<Stmt> {
        let start = self.cursor.span();
        self.cursor.eat_word("return");
        let expr = self.parse_expr()?;
        self.end_of_stmt(&expr)?;
        let span = start.merge(self.cursor.previous_span());
        if self.cursor.check_words(&["it", "performs"]) {
            self.parse_effect_clause()?;
            self.expect_dot()?;
        }
        Ok(Stmt::Return { expr, span })
    }

    /// `If <cond>: …` with `If not` sugar and an optional `Otherwise:` arm.
    fn parse_if(&mut self) -> Parse<Stmt> {
        let start = self.cursor.span();
        self.cursor.eat_word("if");
        let cond = if self.cursor.check_word("not") {
            let not_span = self.cursor.span();
            self.cursor.advance();
            let inner = self.parse_expr()?;
            let span = not_span.merge(inner.span());
            Expr::Call {
                target: Box::new(Expr::Name { name: "not".to_string(), span: not_span }),
                args: vec![inner],
                span,
            }
        } else {
            self.parse_expr()?
        };
        self.expect_colon()?;
        let then_block = self.parse_block()?;

        self.cursor.skip_newlines();
        let else_block = if self.cursor.eat_word("otherwise") {
            self.expect_colon()?;
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            span: start.merge(self.cursor.previous_span()),
        })
    }

    /// `Match <expr>:` with indented `When <pattern>, <tail>` cases.
    fn parse_match(&mut self) -> Parse<Stmt> {
        let start = self.cursor.span();
        self.cursor.eat_word("match");
        let expr = self.parse_expr()?;
        self.expect_colon()?;
        self.cursor.skip_newlines();
        self.expect_kind(TokenKind::Indent, "an indented list of `when` cases")?;

        let mut cases = Vec::new();
        loop {
            self.cursor.skip_newlines();
            if self.cursor.eat_kind(TokenKind::Dedent) || self.cursor.at_eof() {
                break;
            }
            cases.push(self.parse_match_case()?);
        }
        Ok(Stmt::Match { expr, cases, span: start.merge(self.cursor.previous_span()) })
    }

    fn parse_match_case(&mut self) -> Parse<MatchCase> {
        let start = self.cursor.span();
        self.expect_keyword("when")?;
        let pattern = self.parse_pattern()?;
        let body = if self.cursor.eat_kind(TokenKind::Comma) {
            if self.cursor.eat_kind(TokenKind::Colon) {
                self.parse_block()?
            } else {
                let stmt = self.parse_stmt()?;
                let span = stmt.span();
                Block { statements: vec![stmt], span }
            }
        } else {
            self.expect_colon()?;
            self.parse_block()?
        };
        Ok(MatchCase { pattern, body, span: start.merge(self.cursor.previous_span()) })
    }

    fn parse_start(&mut self) -> Parse<Stmt> {
        let start = self.cursor.span();
        self.cursor.eat_word("start");
        let name = self.expect_any_word("a task name")?.value;
        self.expect_keyword("as")?;
        let expr = self.parse_expr()?;
        self.expect_dot()?;
        Ok(Stmt::Start { name, expr, span: start.merge(self.cursor.previous_span()) })
    }

    /// `Wait for A, B and C.`
    fn parse_wait(&mut self) -> Parse<Stmt> {
        let start = self.cursor.span();
        self.cursor.eat_words(&["wait", "for"]);
        let mut names = vec![self.expect_any_word("a task name")?.value];
        loop {
            if self.cursor.eat_kind(TokenKind::Comma) || self.cursor.eat_word("and") {
                names.push(self.expect_any_word("a task name")?.value);
            } else {
                break;
            }
        }
        self.expect_dot()?;
        Ok(Stmt::Wait { names, span: start.merge(self.cursor.previous_span()) })
    }

    fn parse_scope(&mut self) -> Parse<Stmt> {
        let start = self.cursor.span();
        self.cursor.eat_words(&["within", "scope"]);
        self.expect_colon()?;
        let block = self.parse_block()?;
        Ok(Stmt::Block { block, span: start.merge(self.cursor.previous_span()) })
    }

    /// A bare call used as a statement.
    fn parse_call_stmt(&mut self) -> Parse<Stmt> {
        let start = self.cursor.span();
        let expr = self.parse_expr()?;
        if !expr.is_call() {
            return Err(ParseError::new(
                "expected a statement; a bare expression must be a call",
                expr.span(),
            ));
        }
        self.expect_dot()?;
        Ok(Stmt::Call { expr, span: start.merge(self.cursor.previous_span()) })
    }

    /// Patterns: `null`, an integer, a binding name, or a constructor.
    pub(crate) fn parse_pattern(&mut self) -> Parse<Pattern> {
        let token = self.cursor.current().clone();
        match token.kind {
            TokenKind::Null => {
                self.cursor.advance();
                Ok(Pattern::Null { span: token.span() })
            }
            TokenKind::Int => {
                self.cursor.advance();
                let value = token.value.parse::<i64>().map_err(|_| {
                    ParseError::new(
                        format!("integer pattern `{}` is out of range", token.value),
                        token.span(),
                    )
                })?;
                Ok(Pattern::Int { value, span: token.span() })
            }
            kind if kind.is_word() => {
                self.cursor.advance();
                let name = token.value.clone();
                let span = token.span();
                if self.cursor.check_kind(TokenKind::LParen) {
                    self.cursor.advance();
                    let mut names = Vec::new();
                    if !self.cursor.check_kind(TokenKind::RParen) {
                        names.push(self.expect_any_word("a binding name")?.value);
                        while self.cursor.eat_kind(TokenKind::Comma) {
                            names.push(self.expect_any_word("a binding name")?.value);
                        }
                    }
                    self.expect_kind(TokenKind::RParen, "`)`")?;
                    let span = span.merge(self.cursor.previous_span());
                    return Ok(Pattern::Ctor { type_name: name, names, span });
                }
                let is_ctor = token.kind == TokenKind::TypeIdent
                    || self.enum_variants.contains(&name);
                if is_ctor {
                    Ok(Pattern::Ctor { type_name: name, names: Vec::new(), span })
                } else {
                    Ok(Pattern::Name { name, span })
                }
            }
            _ => Err(ParseError::new(
                format!("expected a pattern, found `{}`", token.value),
                token.span(),
            )),
        }
    }
}
