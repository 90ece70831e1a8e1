//! Surface AST produced by the parser.
//!
//! Shapes mirror the Core IR one-to-one; the lowerer makes the implicit
//! parts (capability expansion, lambda captures, PII aggregation) explicit.

use crate::{Capability, Constraint, Sensitivity, Span};

/// A parsed source module.
#[derive(Clone, PartialEq, Debug)]
pub struct Module {
    /// Dotted module path from `This module is …`, when present.
    pub name: Option<String>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Decl {
    Import(Import),
    Data(Data),
    Enum(EnumDecl),
    Func(Func),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Import(d) => d.span,
            Decl::Data(d) => d.span,
            Decl::Enum(d) => d.span,
            Decl::Func(d) => d.span,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Import {
    pub name: String,
    pub as_name: Option<String>,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Data {
    pub name: String,
    pub fields: Vec<Field>,
    pub name_span: Span,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<String>,
    pub name_span: Span,
    pub variant_spans: Vec<Span>,
    pub span: Span,
}

/// A function declaration (`Rule …` / `To …`).
///
/// `effects` is unvalidated here — the lowerer rejects unknown effect names.
/// `effect_caps` is only what the source spelled out; resolution to the
/// canonical set happens during lowering.
#[derive(Clone, PartialEq, Debug)]
pub struct Func {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<Field>,
    pub ret_type: Type,
    pub effects: Vec<String>,
    pub effect_caps: Vec<Capability>,
    pub effect_caps_explicit: bool,
    pub body: Option<Block>,
    pub name_span: Span,
    pub span: Span,
}

/// A record field or function parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub constraints: Vec<Constraint>,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Type {
    Name { name: String, span: Span },
    Var { name: String, span: Span },
    App { base: String, args: Vec<Type>, span: Span },
    Maybe { inner: Box<Type>, span: Span },
    Option { inner: Box<Type>, span: Span },
    Result { ok: Box<Type>, err: Box<Type>, span: Span },
    List { inner: Box<Type>, span: Span },
    Map { key: Box<Type>, value: Box<Type>, span: Span },
    Func { params: Vec<Type>, ret: Box<Type>, span: Span },
    Pii { base: Box<Type>, sensitivity: Sensitivity, category: String, span: Span },
}

impl Type {
    pub fn span(&self) -> Span {
        match self {
            Type::Name { span, .. }
            | Type::Var { span, .. }
            | Type::App { span, .. }
            | Type::Maybe { span, .. }
            | Type::Option { span, .. }
            | Type::Result { span, .. }
            | Type::List { span, .. }
            | Type::Map { span, .. }
            | Type::Func { span, .. }
            | Type::Pii { span, .. } => *span,
        }
    }

    /// Walk the type tree collecting every PII annotation, outermost first.
    pub fn pii_leaves(&self) -> Vec<(Sensitivity, &str)> {
        let mut out = Vec::new();
        self.collect_pii(&mut out);
        out
    }

    fn collect_pii<'a>(&'a self, out: &mut Vec<(Sensitivity, &'a str)>) {
        match self {
            Type::Pii { base, sensitivity, category, .. } => {
                out.push((*sensitivity, category.as_str()));
                base.collect_pii(out);
            }
            Type::Maybe { inner, .. } | Type::Option { inner, .. } | Type::List { inner, .. } => {
                inner.collect_pii(out);
            }
            Type::Result { ok, err, .. } => {
                ok.collect_pii(out);
                err.collect_pii(out);
            }
            Type::Map { key, value, .. } => {
                key.collect_pii(out);
                value.collect_pii(out);
            }
            Type::App { args, .. } => {
                for arg in args {
                    arg.collect_pii(out);
                }
            }
            Type::Func { params, ret, .. } => {
                for p in params {
                    p.collect_pii(out);
                }
                ret.collect_pii(out);
            }
            Type::Name { .. } | Type::Var { .. } => {}
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Stmt {
    Let { name: String, expr: Expr, span: Span },
    Set { name: String, expr: Expr, span: Span },
    Return { expr: Expr, span: Span },
    If { cond: Expr, then_block: Block, else_block: Option<Block>, span: Span },
    Match { expr: Expr, cases: Vec<MatchCase>, span: Span },
    /// `Within scope:` block.
    Block { block: Block, span: Span },
    Start { name: String, expr: Expr, span: Span },
    Wait { names: Vec<String>, span: Span },
    /// A bare call used as a statement.
    Call { expr: Expr, span: Span },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let { span, .. }
            | Stmt::Set { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Match { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::Start { span, .. }
            | Stmt::Wait { span, .. }
            | Stmt::Call { span, .. } => *span,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Expr {
    Name { name: String, span: Span },
    Bool { value: bool, span: Span },
    Null { span: Span },
    Int { value: i64, span: Span },
    /// Digits preserved as text for arbitrary precision.
    Long { value: String, span: Span },
    /// Decimal text preserved; covers source FLOAT and DOUBLE.
    Float { value: String, span: Span },
    Str { value: String, span: Span },
    NoneLit { span: Span },
    Some { expr: Box<Expr>, span: Span },
    Ok { expr: Box<Expr>, span: Span },
    Err { expr: Box<Expr>, span: Span },
    Construct { type_name: String, fields: Vec<(String, Expr)>, span: Span },
    Call { target: Box<Expr>, args: Vec<Expr>, span: Span },
    Lambda { params: Vec<Field>, ret_type: Option<Type>, body: Block, span: Span },
    Await { expr: Box<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Name { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Null { span }
            | Expr::Int { span, .. }
            | Expr::Long { span, .. }
            | Expr::Float { span, .. }
            | Expr::Str { span, .. }
            | Expr::NoneLit { span }
            | Expr::Some { span, .. }
            | Expr::Ok { span, .. }
            | Expr::Err { span, .. }
            | Expr::Construct { span, .. }
            | Expr::Call { span, .. }
            | Expr::Lambda { span, .. }
            | Expr::Await { span, .. } => *span,
        }
    }

    /// True for call expressions (used for bare-call statements).
    pub fn is_call(&self) -> bool {
        matches!(self, Expr::Call { .. })
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Pattern {
    Null { span: Span },
    Int { value: i64, span: Span },
    /// Binds the scrutinee to a fresh name.
    Name { name: String, span: Span },
    /// Constructor match, optionally binding payload names.
    Ctor { type_name: String, names: Vec<String>, span: Span },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Null { span }
            | Pattern::Int { span, .. }
            | Pattern::Name { span, .. }
            | Pattern::Ctor { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    fn sp(l: u32, c: u32) -> Span {
        Span::point(Position::new(l, c))
    }

    #[test]
    fn pii_leaves_nested() {
        let ty = Type::List {
            inner: Box::new(Type::Pii {
                base: Box::new(Type::Name { name: "Text".into(), span: sp(1, 1) }),
                sensitivity: Sensitivity::L2,
                category: "email".into(),
                span: sp(1, 1),
            }),
            span: sp(1, 1),
        };
        assert_eq!(ty.pii_leaves(), vec![(Sensitivity::L2, "email")]);
    }

    #[test]
    fn pii_leaves_in_result_arms() {
        let pii = |cat: &str, s: Sensitivity| Type::Pii {
            base: Box::new(Type::Name { name: "Text".into(), span: sp(1, 1) }),
            sensitivity: s,
            category: cat.into(),
            span: sp(1, 1),
        };
        let ty = Type::Result {
            ok: Box::new(pii("email", Sensitivity::L2)),
            err: Box::new(pii("name", Sensitivity::L1)),
            span: sp(1, 1),
        };
        let leaves = ty.pii_leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0], (Sensitivity::L2, "email"));
        assert_eq!(leaves[1], (Sensitivity::L1, "name"));
    }

    #[test]
    fn decl_span_dispatch() {
        let import = Decl::Import(Import { name: "demo".into(), as_name: None, span: sp(2, 1) });
        assert_eq!(import.span(), sp(2, 1));
    }
}
