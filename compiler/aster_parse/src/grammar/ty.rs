//! Type and constraint parsing.

use aster_diagnostic::DiagCode;
use aster_ir::{Constraint, Sensitivity, TokenKind, Type};

use super::{Parse, Parser};
use crate::ParseError;

impl Parser<'_> {
    /// Parse a type expression, including the `?` Maybe suffix.
    pub(crate) fn parse_type(&mut self) -> Parse<Type> {
        let mut ty = self.parse_type_base()?;
        while self.cursor.eat_kind(TokenKind::Question) {
            let span = ty.span().merge(self.cursor.previous_span());
            ty = Type::Maybe { inner: Box::new(ty), span };
        }
        Ok(ty)
    }

    fn parse_type_base(&mut self) -> Parse<Type> {
        // `@pii(Level, category) T`
        if self.cursor.check_kind(TokenKind::At) {
            return self.parse_pii_type();
        }

        let start = self.cursor.span();
        let token = self.expect_any_word("a type")?;
        let name = token.value.clone();

        if name.eq_ignore_ascii_case("option") && self.cursor.eat_word("of") {
            let inner = self.parse_type()?;
            let span = start.merge(self.cursor.previous_span());
            return Ok(Type::Option { inner: Box::new(inner), span });
        }
        if name.eq_ignore_ascii_case("result") && self.cursor.eat_word("of") {
            let ok = self.parse_type()?;
            self.expect_keyword("or")?;
            let err = self.parse_type()?;
            let span = start.merge(self.cursor.previous_span());
            return Ok(Type::Result { ok: Box::new(ok), err: Box::new(err), span });
        }
        if name.eq_ignore_ascii_case("list") && self.cursor.eat_word("of") {
            let inner = self.parse_type()?;
            let span = start.merge(self.cursor.previous_span());
            return Ok(Type::List { inner: Box::new(inner), span });
        }
        if name.eq_ignore_ascii_case("map") {
            let key = self.parse_type()?;
            self.expect_keyword("to")?;
            let value = self.parse_type()?;
            let span = start.merge(self.cursor.previous_span());
            return Ok(Type::Map { key: Box::new(key), value: Box::new(value), span });
        }

        // `Base of A and B` / `Base of A, B` — generic application.
        if self.cursor.eat_word("of") {
            let mut args = vec![self.parse_type()?];
            while self.cursor.eat_kind(TokenKind::Comma) || self.cursor.eat_word("and") {
                args.push(self.parse_type()?);
            }
            let span = start.merge(self.cursor.previous_span());
            return Ok(Type::App { base: name, args, span });
        }

        let span = token.span();
        if self.is_type_var(&name) {
            Ok(Type::Var { name, span })
        } else {
            Ok(Type::Name { name, span })
        }
    }

    /// Declared type parameters become `TypeVar`; without a declared list,
    /// single capital letters are treated as type variables best-effort.
    fn is_type_var(&self, name: &str) -> bool {
        if self.type_params.iter().any(|p| p == name) {
            return true;
        }
        self.type_params.is_empty()
            && name.len() == 1
            && name.chars().all(|c| c.is_ascii_uppercase())
    }

    fn parse_pii_type(&mut self) -> Parse<Type> {
        let start = self.cursor.span();
        self.cursor.advance(); // `@`
        let marker = self.expect_any_word("`pii`")?;
        if !marker.value.eq_ignore_ascii_case("pii") {
            return Err(ParseError::new(
                format!("expected `pii` after `@`, found `{}`", marker.value),
                marker.span(),
            ));
        }
        self.expect_kind(TokenKind::LParen, "`(`")?;
        let level = self.expect_any_word("a sensitivity level")?;
        let Some(sensitivity) = Sensitivity::parse_name(&level.value) else {
            return Err(ParseError::new(
                format!("unknown PII sensitivity `{}` (expected L1, L2, or L3)", level.value),
                level.span(),
            ));
        };
        self.expect_kind(TokenKind::Comma, "`,`")?;
        let category = self.expect_any_word("a PII category")?.value;
        self.expect_kind(TokenKind::RParen, "`)`")?;
        let base = self.parse_type()?;
        let span = start.merge(self.cursor.previous_span());
        Ok(Type::Pii { base: Box::new(base), sensitivity, category, span })
    }

    /// Inline constraints after a field or parameter type.
    pub(crate) fn parse_constraints(&mut self) -> Parse<Vec<Constraint>> {
        let mut constraints = Vec::new();
        loop {
            if self.cursor.eat_word("required") {
                constraints.push(Constraint::Required);
                continue;
            }
            if self.cursor.eat_word("between") {
                let min = self.constraint_number()?;
                self.expect_keyword("and")?;
                let max = self.constraint_number()?;
                constraints.push(Constraint::Range { min: Some(min), max: Some(max) });
                continue;
            }
            if self.cursor.eat_word("matching") {
                let token = self.expect_kind(TokenKind::Str, "a pattern string")?;
                constraints.push(Constraint::Pattern { regexp: token.value });
                continue;
            }
            break;
        }
        Ok(constraints)
    }

    fn constraint_number(&mut self) -> Parse<f64> {
        let token = self.cursor.current().clone();
        match token.kind {
            TokenKind::Int | TokenKind::Float => {
                self.cursor.advance();
                token.value.parse::<f64>().map_err(|_| {
                    ParseError::new(
                        format!("malformed number `{}` in constraint", token.value),
                        token.span(),
                    )
                    .with_code(DiagCode::ParseBadConstraint)
                })
            }
            _ => Err(ParseError::new(
                format!("expected a number in range constraint, found `{}`", token.value),
                token.span(),
            )
            .with_code(DiagCode::ParseBadConstraint)),
        }
    }
}
