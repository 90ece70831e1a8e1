//! Grammar productions.
//!
//! One file per grammar area: declarations here, statements in `stmt`,
//! expressions in `expr`, types and constraints in `ty`.

mod expr;
mod stmt;
mod ty;


use std::sync::Arc;

use aster_diagnostic::DiagCode;
use aster_ir::{
    Block, Capability, Data, Decl, EnumDecl, Field, Func, Import, Module, Span, Token, TokenKind,
    Type,
};
use aster_lexicon::Lexicon;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::{infer, Cursor, ParseError};

pub(crate) type Parse<T> = Result<T, ParseError>;

/// Accumulated effect clause state for the function being parsed.
///
/// Trailing `It performs …` sentences after `Return` statements merge into
/// the same accumulator; explicitness never downgrades.
#[derive(Default)]
pub(crate) struct EffectAcc {
    pub effects: Vec<String>,
    pub caps: Vec<Capability>,
    pub explicit: bool,
}

impl EffectAcc {
    fn push_effect(&mut self, name: &str) {
        let name = name.to_lowercase();
        if !self.effects.contains(&name) {
            self.effects.push(name);
        }
    }

    fn push_cap(&mut self, cap: Capability) {
        if !self.caps.contains(&cap) {
            self.caps.push(cap);
        }
    }
}

/// Parser state.
pub struct Parser<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) errors: Vec<ParseError>,
    /// Variant names of enums declared so far; lets caseless-script
    /// patterns resolve to constructors.
    pub(crate) enum_variants: FxHashSet<String>,
    /// Type parameters of the function being parsed.
    pub(crate) type_params: Vec<String>,
    pub(crate) effect_acc: EffectAcc,
    pub(crate) lexicon: Arc<Lexicon>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], lexicon: Arc<Lexicon>) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            errors: Vec::new(),
            enum_variants: FxHashSet::default(),
            type_params: Vec::new(),
            effect_acc: EffectAcc::default(),
            lexicon,
        }
    }

    /// Parse a whole module; collects one error per failed declaration.
    pub fn parse_module(mut self) -> Result<Module, Vec<ParseError>> {
        debug!("parsing module");
        let start = self.cursor.span();
        self.cursor.skip_newlines();

        let name = if self.cursor.check_words(&["this", "module", "is"]) {
            match self.module_header() {
                Ok(n) => Some(n),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                    None
                }
            }
        } else {
            None
        };

        let mut decls = Vec::new();
        loop {
            self.cursor.skip_newlines();
            if self.cursor.at_eof() {
                break;
            }
            match self.parse_decl() {
                Ok(decl) => decls.push(decl),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        let span = start.merge(self.cursor.previous_span());
        if self.errors.is_empty() {
            Ok(Module { name, decls, span })
        } else {
            Err(self.errors)
        }
    }

    fn module_header(&mut self) -> Parse<String> {
        self.cursor.eat_words(&["this", "module", "is"]);
        let name = self.qualified_name("module name")?;
        self.expect_dot()?;
        Ok(name)
    }

    /// Skip to the next statement terminator at the top indentation level.
    fn synchronize(&mut self) {
        let mut depth = 0i32;
        while !self.cursor.at_eof() {
            match self.cursor.kind() {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => depth -= 1,
                TokenKind::Dot
                    if depth <= 0
                        && matches!(
                            self.cursor.peek(1).kind,
                            TokenKind::Newline | TokenKind::Eof
                        ) =>
                {
                    self.cursor.advance();
                    return;
                }
                _ => {}
            }
            self.cursor.advance();
        }
    }

    fn parse_decl(&mut self) -> Parse<Decl> {
        if self.cursor.check_word("use") {
            return self.parse_import().map(Decl::Import);
        }
        if self.cursor.check_word("define") {
            return self.parse_define();
        }
        if self.cursor.check_word("rule") || self.cursor.check_word("to") {
            return self.parse_func().map(Decl::Func);
        }
        let token = self.cursor.current();
        let mut message = format!("expected a declaration, found `{}`", token.value);
        if let Some((locale, english)) = foreign_keyword_hint(&token.value, &self.lexicon.id) {
            message.push_str(&format!(
                " (`{}` is the {locale} word for `{english}` — is the source locale right?)",
                token.value
            ));
        }
        Err(ParseError::new(message, token.span()).with_code(DiagCode::ParseUnexpectedKeyword))
    }

    fn parse_import(&mut self) -> Parse<Import> {
        let start = self.cursor.span();
        self.cursor.eat_word("use");
        let name = self.qualified_name("import path")?;
        let as_name = if self.cursor.eat_word("as") {
            Some(self.expect_any_word("import alias")?.value)
        } else {
            None
        };
        self.expect_dot()?;
        Ok(Import {
            name,
            as_name,
            span: start.merge(self.cursor.previous_span()),
        })
    }

    /// `Define X with …` / `Define X has …` / `Define X as one of …`.
    fn parse_define(&mut self) -> Parse<Decl> {
        let start = self.cursor.span();
        self.cursor.eat_word("define");
        let name_token = self.expect_any_word("type name")?;
        let name = name_token.value.clone();
        let name_span = name_token.span();

        if self.cursor.eat_words(&["as", "one", "of"]) {
            let mut variants = Vec::new();
            let mut variant_spans = Vec::new();
            loop {
                let token = self.expect_any_word("enum variant")?;
                variants.push(token.value.clone());
                variant_spans.push(token.span());
                if !self.cursor.eat_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect_dot()?;
            for variant in &variants {
                self.enum_variants.insert(variant.clone());
            }
            return Ok(Decl::Enum(EnumDecl {
                name,
                variants,
                name_span,
                variant_spans,
                span: start.merge(self.cursor.previous_span()),
            }));
        }

        let fields = if self.cursor.eat_word("with") || self.cursor.eat_word("has") {
            self.parse_field_list()?
        } else {
            Vec::new()
        };
        self.expect_dot()?;
        Ok(Decl::Data(Data {
            name,
            fields,
            name_span,
            span: start.merge(self.cursor.previous_span()),
        }))
    }

    fn parse_field_list(&mut self) -> Parse<Vec<Field>> {
        let mut fields = vec![self.parse_field()?];
        while self.cursor.eat_kind(TokenKind::Comma) {
            fields.push(self.parse_field()?);
        }
        Ok(fields)
    }

    /// A field or parameter: `name (:|as) Type constraints*`, with the type
    /// inferred from the name and constraints when absent.
    pub(crate) fn parse_field(&mut self) -> Parse<Field> {
        let name_token = self.expect_any_word("field name")?;
        let name = name_token.value.clone();
        let name_span = name_token.span();

        let explicit_type =
            if self.cursor.eat_kind(TokenKind::Colon) || self.cursor.eat_word("as") {
                Some(self.parse_type()?)
            } else {
                None
            };
        let constraints = self.parse_constraints()?;

        let ty = match explicit_type {
            Some(t) => t,
            None => {
                let inferred = infer::infer_type(&name, &constraints, &self.lexicon);
                Type::Name {
                    name: inferred.type_name().to_string(),
                    span: name_span,
                }
            }
        };
        Ok(Field {
            name,
            ty,
            constraints,
            span: name_span.merge(self.cursor.previous_span()),
        })
    }

    /// `Rule name (of T …)? (given …)? ,? produce Type …`.
    fn parse_func(&mut self) -> Parse<Func> {
        let start = self.cursor.span();
        self.cursor.advance(); // `rule` or `to`
        let name_token = self.expect_any_word("rule name")?;
        let name = name_token.value.clone();
        let name_span = name_token.span();
        debug!(rule = %name, "parsing function");

        self.type_params = Vec::new();
        self.effect_acc = EffectAcc::default();

        if self.cursor.eat_word("of") {
            loop {
                let param = self.expect_any_word("type parameter")?;
                self.type_params.push(param.value.clone());
                if self.cursor.eat_kind(TokenKind::Comma) || self.cursor.eat_word("and") {
                    continue;
                }
                break;
            }
        }

        let mut params = Vec::new();
        if self.cursor.eat_word("given") {
            loop {
                params.push(self.parse_field()?);
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
        }

        self.cursor.eat_kind(TokenKind::Comma);
        self.expect_keyword("produce")?;
        let ret_type = self.parse_type()?;

        if self.cursor.check_words(&["it", "performs"]) {
            self.parse_effect_clause()?;
        }

        let body = if self.cursor.eat_kind(TokenKind::Colon) {
            Some(self.parse_block()?)
        } else {
            self.expect_dot()?;
            self.cursor.skip_newlines();
            if self.cursor.check_words(&["it", "performs"]) {
                self.parse_effect_clause()?;
                if self.cursor.eat_kind(TokenKind::Colon) {
                    Some(self.parse_block()?)
                } else {
                    self.expect_dot()?;
                    None
                }
            } else {
                None
            }
        };

        let acc = std::mem::take(&mut self.effect_acc);
        let type_params = std::mem::take(&mut self.type_params);
        Ok(Func {
            name,
            type_params,
            params,
            ret_type,
            effects: acc.effects,
            effect_caps: acc.caps,
            effect_caps_explicit: acc.explicit,
            body,
            name_span,
            span: start.merge(self.cursor.previous_span()),
        })
    }

    /// `It performs <items> ([caps])?` — items may be effect names or bare
    /// capability names; brackets or bare capabilities make the set
    /// explicit. An empty bracket list stays implicit.
    pub(crate) fn parse_effect_clause(&mut self) -> Parse<()> {
        self.cursor.eat_words(&["it", "performs"]);

        while self.cursor.current().kind.is_word() {
            let token = self.expect_any_word("effect name")?;
            let value = token.value.clone();
            if value.eq_ignore_ascii_case("io") || value.eq_ignore_ascii_case("cpu") {
                self.effect_acc.push_effect(&value);
            } else if let Some(cap) = Capability::parse_name(&value) {
                self.effect_acc.push_cap(cap);
                self.effect_acc.explicit = true;
            } else {
                // Unknown effects are the lowerer's diagnostic.
                self.effect_acc.push_effect(&value);
            }
            if self.cursor.eat_word("and") || self.cursor.eat_kind(TokenKind::Comma) {
                continue;
            }
            break;
        }

        if self.cursor.eat_kind(TokenKind::LBracket) {
            while !self.cursor.check_kind(TokenKind::RBracket) {
                let token = self.expect_any_word("capability name")?;
                let Some(cap) = Capability::parse_name(&token.value) else {
                    return Err(ParseError::new(
                        format!("unknown capability `{}`", token.value),
                        token.span(),
                    )
                    .with_code(DiagCode::ParseUnknownCapability));
                };
                self.effect_acc.push_cap(cap);
                self.effect_acc.explicit = true;
                if !self.cursor.eat_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect_kind(TokenKind::RBracket, "`]`")?;
        }
        Ok(())
    }

    /// A `:`-introduced block: indented statements or one inline statement.
    pub(crate) fn parse_block(&mut self) -> Parse<Block> {
        let start = self.cursor.span();
        if self.cursor.check_kind(TokenKind::Newline) {
            self.cursor.skip_newlines();
            self.expect_kind(TokenKind::Indent, "an indented block")?;
            let mut statements = Vec::new();
            loop {
                self.cursor.skip_newlines();
                if self.cursor.eat_kind(TokenKind::Dedent) || self.cursor.at_eof() {
                    break;
                }
                statements.push(self.parse_stmt()?);
            }
            Ok(Block {
                statements,
                span: start.merge(self.cursor.previous_span()),
            })
        } else {
            let stmt = self.parse_stmt()?;
            let span = stmt.span();
            Ok(Block { statements: vec![stmt], span })
        }
    }

    // ─── small helpers ─────────────────────────────────────────────────

    /// A dotted identifier path; dots must abut both neighbors, so a
    /// statement terminator (always followed by a gap) never merges in.
    pub(crate) fn qualified_name(&mut self, what: &str) -> Parse<String> {
        let mut name = self.expect_any_word(what)?.value;
        while self.cursor.check_kind(TokenKind::Dot) && self.cursor.glued_to_previous() {
            let dot_end = self.cursor.span().end;
            let next = self.cursor.peek(1);
            if next.kind.is_word() && next.start == dot_end {
                self.cursor.advance();
                let word = self.cursor.advance();
                name.push('.');
                name.push_str(&word.value);
            } else {
                break;
            }
        }
        Ok(name)
    }

    pub(crate) fn expect_any_word(&mut self, what: &str) -> Parse<Token> {
        if self.cursor.current().kind.is_word() {
            Ok(self.cursor.advance())
        } else {
            let token = self.cursor.current();
            Err(ParseError::new(
                format!("expected {what}, found `{}`", describe(token)),
                token.span(),
            ))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Parse<Token> {
        if self.cursor.check_word(keyword) {
            Ok(self.cursor.advance())
        } else {
            let token = self.cursor.current();
            Err(ParseError::new(
                format!("expected `{keyword}`, found `{}`", describe(token)),
                token.span(),
            ))
        }
    }

    pub(crate) fn expect_kind(&mut self, kind: TokenKind, what: &str) -> Parse<Token> {
        if self.cursor.check_kind(kind) {
            Ok(self.cursor.advance())
        } else {
            let token = self.cursor.current();
            let mut err = ParseError::new(
                format!("expected {what}, found `{}`", describe(token)),
                token.span(),
            );
            if matches!(kind, TokenKind::RParen | TokenKind::RBracket) {
                err = err.with_code(DiagCode::ParseUnbalancedParens);
            }
            Err(err)
        }
    }

    pub(crate) fn expect_dot(&mut self) -> Parse<()> {
        if self.cursor.eat_kind(TokenKind::Dot) {
            Ok(())
        } else {
            let token = self.cursor.current();
            let span = Span::point(self.cursor.previous_span().end);
            Err(
                ParseError::new(format!("expected `.`, found `{}`", describe(token)), span)
                    .with_fix("add '.' at end of statement", "."),
            )
        }
    }

    pub(crate) fn expect_colon(&mut self) -> Parse<()> {
        if self.cursor.eat_kind(TokenKind::Colon) {
            Ok(())
        } else {
            let token = self.cursor.current();
            let span = Span::point(self.cursor.previous_span().end);
            Err(
                ParseError::new(format!("expected `:`, found `{}`", describe(token)), span)
                    .with_fix("add ':' at end of line", ":"),
            )
        }
    }
}

/// Cross-locale habit hint: an unexpected word that is a keyword of some
/// other registered locale gets a note naming that locale and the English
/// equivalent. Advisory only.
fn foreign_keyword_hint(word: &str, current_locale: &str) -> Option<(String, &'static str)> {
    for id in aster_lexicon::registry::locale_ids() {
        if id == current_locale {
            continue;
        }
        let Some(lexicon) = aster_lexicon::registry::get(&id) else { continue };
        for (kind, spelling) in lexicon.keywords() {
            if spelling.eq_ignore_ascii_case(word) && spelling != kind.english() {
                return Some((id, kind.english()));
            }
        }
    }
    None
}

/// Human-readable token description for error messages.
fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Newline => "end of line".to_string(),
        TokenKind::Indent => "indent".to_string(),
        TokenKind::Dedent => "dedent".to_string(),
        TokenKind::Eof => "end of file".to_string(),
        _ => token.value.clone(),
    }
}
