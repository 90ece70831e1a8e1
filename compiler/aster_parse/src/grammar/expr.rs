//! Expression parsing.

use aster_ir::{Block, Expr, Field, Stmt, TokenKind, Type};

use super::{Parse, Parser};
use crate::ParseError;

impl Parser<'_> {
    pub(crate) fn parse_expr(&mut self) -> Parse<Expr> {
        let lhs = self.parse_primary()?;

        // Comparison operators: token or phrase form.
        let op = match self.cursor.kind() {
            TokenKind::Lt => Some("<"),
            TokenKind::Lte => Some("<="),
            TokenKind::Gt => Some(">"),
            TokenKind::Gte => Some(">="),
            _ if self.cursor.check_words(&["greater", "than"]) => Some(">"),
            _ if self.cursor.check_words(&["less", "than"]) => Some("<"),
            _ => None,
        };
        let Some(op) = op else { return Ok(lhs) };

        let op_span = self.cursor.span();
        if self.cursor.current().kind.is_word() {
            self.cursor.advance();
            self.cursor.advance();
        } else {
            self.cursor.advance();
        }
        let rhs = self.parse_primary()?;
        let span = lhs.span().merge(rhs.span());
        Ok(Expr::Call {
            target: Box::new(Expr::Name { name: op.to_string(), span: op_span }),
            args: vec![lhs, rhs],
            span,
        })
    }

    fn parse_primary(&mut self) -> Parse<Expr> {
        let token = self.cursor.current().clone();
        match token.kind {
            TokenKind::Str => {
                self.cursor.advance();
                let span = token.span();
                Ok(Expr::Str { value: token.value, span })
            }
            TokenKind::Int => {
                self.cursor.advance();
                let value = token.value.parse::<i64>().map_err(|_| {
                    ParseError::new(
                        format!("integer literal `{}` is out of range", token.value),
                        token.span(),
                    )
                })?;
                Ok(Expr::Int { value, span: token.span() })
            }
            TokenKind::Long => {
                self.cursor.advance();
                let span = token.span();
                Ok(Expr::Long { value: token.value, span })
            }
            TokenKind::Float => {
                self.cursor.advance();
                let span = token.span();
                Ok(Expr::Float { value: token.value, span })
            }
            TokenKind::Bool => {
                self.cursor.advance();
                Ok(Expr::Bool { value: token.value == "true", span: token.span() })
            }
            TokenKind::Null => {
                self.cursor.advance();
                Ok(Expr::Null { span: token.span() })
            }
            TokenKind::LParen => self.parse_arrow_lambda(),
            kind if kind.is_word() => self.parse_word_expr(),
            _ => Err(ParseError::new(
                format!("expected an expression, found `{}`", token.value),
                token.span(),
            )),
        }
    }

    fn parse_word_expr(&mut self) -> Parse<Expr> {
        let token = self.cursor.current().clone();
        let span = token.span();

        if token.value.eq_ignore_ascii_case("none") {
            self.cursor.advance();
            return Ok(Expr::NoneLit { span });
        }
        if self.cursor.check_word("await") {
            self.cursor.advance();
            let inner = self.parse_expr()?;
            let span = span.merge(inner.span());
            return Ok(Expr::Await { expr: Box::new(inner), span });
        }
        if self.cursor.check_word("function") {
            return self.parse_function_lambda();
        }

        // `Some(x)` / `Ok(x)` / `Err(x)` wrappers.
        let wrapper = ["some", "ok", "err"]
            .iter()
            .find(|w| token.value.eq_ignore_ascii_case(w))
            .copied();
        if let Some(wrapper) = wrapper {
            if self.cursor.peek(1).kind == TokenKind::LParen {
                self.cursor.advance();
                self.cursor.advance();
                let inner = self.parse_expr()?;
                self.expect_kind(TokenKind::RParen, "`)`")?;
                let span = span.merge(self.cursor.previous_span());
                let expr = Box::new(inner);
                return Ok(match wrapper {
                    "some" => Expr::Some { expr, span },
                    "ok" => Expr::Ok { expr, span },
                    _ => Expr::Err { expr, span },
                });
            }
        }

        let name = self.qualified_name("a name")?;

        // `User with id: "1", name: "Ann"` — record construction.
        if token.kind == TokenKind::TypeIdent && self.cursor.eat_word("with") {
            let mut fields = Vec::new();
            loop {
                let field_name = self.expect_any_word("a field name")?.value;
                self.expect_kind(TokenKind::Colon, "`:`")?;
                let value = self.parse_expr()?;
                fields.push((field_name, value));
                let next_is_field = self.cursor.check_kind(TokenKind::Comma)
                    && self.cursor.peek(1).kind.is_word()
                    && self.cursor.peek(2).kind == TokenKind::Colon;
                if next_is_field {
                    self.cursor.advance();
                } else {
                    break;
                }
            }
            let span = span.merge(self.cursor.previous_span());
            return Ok(Expr::Construct { type_name: name, fields, span });
        }

        if self.cursor.check_kind(TokenKind::LParen) {
            self.cursor.advance();
            let mut args = Vec::new();
            if !self.cursor.check_kind(TokenKind::RParen) {
                args.push(self.parse_expr()?);
                while self.cursor.eat_kind(TokenKind::Comma) {
                    args.push(self.parse_expr()?);
                }
            }
            self.expect_kind(TokenKind::RParen, "`)`")?;
            let full = span.merge(self.cursor.previous_span());
            return Ok(Expr::Call {
                target: Box::new(Expr::Name { name, span }),
                args,
                span: full,
            });
        }

        let span = span.merge(self.cursor.previous_span());
        Ok(Expr::Name { name, span })
    }

    /// `function with p: T and q: U, produce R: <tail>`.
    fn parse_function_lambda(&mut self) -> Parse<Expr> {
        let start = self.cursor.span();
        self.cursor.eat_word("function");
        self.expect_keyword("with")?;

        let mut params = Vec::new();
        loop {
            params.push(self.parse_field()?);
            if self.cursor.eat_word("and") {
                continue;
            }
            if self.cursor.check_kind(TokenKind::Comma) {
                if self.cursor.peek(1).value.eq_ignore_ascii_case("produce") {
                    self.cursor.advance();
                    break;
                }
                self.cursor.advance();
                continue;
            }
            break;
        }
        self.expect_keyword("produce")?;
        let ret_type = self.parse_type()?;
        self.expect_colon()?;
        let body = self.parse_block()?;
        let span = start.merge(self.cursor.previous_span());
        Ok(Expr::Lambda { params, ret_type: Some(ret_type), body, span })
    }

    /// Arrow lambda: `(p as T, q as U) => expr`.
    fn parse_arrow_lambda(&mut self) -> Parse<Expr> {
        let start = self.cursor.span();
        self.expect_kind(TokenKind::LParen, "`(`")?;
        let mut params: Vec<Field> = Vec::new();
        loop {
            let name_token = self.expect_any_word("a parameter name")?;
            let name = name_token.value.clone();
            let name_span = name_token.span();
            self.expect_keyword("as")?;
            let ty: Type = self.parse_type()?;
            params.push(Field {
                name,
                ty,
                constraints: Vec::new(),
                span: name_span.merge(self.cursor.previous_span()),
            });
            if !self.cursor.eat_kind(TokenKind::Comma) {
                break;
            }
        }
        self.expect_kind(TokenKind::RParen, "`)`")?;
        self.expect_kind(TokenKind::FatArrow, "`=>`")?;
        let body_expr = self.parse_expr()?;
        let body_span = body_expr.span();
        let body = Block {
            statements: vec![Stmt::Return { expr: body_expr, span: body_span }],
            span: body_span,
        };
        let span = start.merge(self.cursor.previous_span());
        Ok(Expr::Lambda { params, ret_type: None, body, span })
    }
}
