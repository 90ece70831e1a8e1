//! Core IR — the lowered, analysis-ready representation.
//!
//! Same shape as the surface AST with the implicit parts made explicit:
//! resolved `effectCaps`, lambda capture lists, aggregated PII metadata,
//! bare calls rewritten to `Let "_"`, and `Within scope` blocks as `Scope`.
//! Every node family serializes with a `kind` discriminant so the JSON
//! matches the envelope contract in [`crate::json`].

use serde::{Deserialize, Serialize};

use crate::{Capability, Constraint, Effect, Sensitivity, Span};

/// Where a Core IR node came from, for diagnostics.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Origin {
    pub file: String,
    pub span: Span,
}

impl Origin {
    pub fn new(file: impl Into<String>, span: Span) -> Self {
        Origin { file: file.into(), span }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreModule {
    #[serde(skip_serializing_if = "std::option::Option::is_none")]
    pub name: Option<String>,
    pub decls: Vec<CoreDecl>,
    pub span: Span,
    pub origin: Origin,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CoreDecl {
    Import(CoreImport),
    Data(CoreData),
    Enum(CoreEnum),
    Func(CoreFunc),
}

impl CoreDecl {
    /// Declaration name as visible to other declarations.
    pub fn name(&self) -> &str {
        match self {
            CoreDecl::Import(d) => d.as_name.as_deref().unwrap_or(&d.name),
            CoreDecl::Data(d) => &d.name,
            CoreDecl::Enum(d) => &d.name,
            CoreDecl::Func(d) => &d.name,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreImport {
    pub name: String,
    #[serde(skip_serializing_if = "std::option::Option::is_none")]
    pub as_name: Option<String>,
    pub span: Span,
    pub origin: Origin,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreData {
    pub name: String,
    pub fields: Vec<CoreField>,
    pub name_span: Span,
    pub span: Span,
    pub origin: Origin,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreEnum {
    pub name: String,
    pub variants: Vec<String>,
    pub name_span: Span,
    pub variant_spans: Vec<Span>,
    pub span: Span,
    pub origin: Origin,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreFunc {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<CoreField>,
    pub ret_type: CoreType,
    pub effects: Vec<Effect>,
    /// Resolved capability set in canonical order.
    pub effect_caps: Vec<Capability>,
    /// True when the source gave a verbatim capability list.
    pub effect_caps_explicit: bool,
    /// Highest sensitivity over parameter and return PII leaves.
    #[serde(skip_serializing_if = "std::option::Option::is_none")]
    pub pii_level: Option<Sensitivity>,
    /// PII categories in first-appearance order.
    pub pii_categories: Vec<String>,
    #[serde(skip_serializing_if = "std::option::Option::is_none")]
    pub body: Option<CoreBlock>,
    pub name_span: Span,
    pub span: Span,
    pub origin: Origin,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CoreType,
    pub constraints: Vec<Constraint>,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CoreType {
    #[serde(rename = "TypeName")]
    Name { name: String, span: Span },
    #[serde(rename = "TypeVar")]
    Var { name: String, span: Span },
    #[serde(rename = "TypeApp")]
    App { base: String, args: Vec<CoreType>, span: Span },
    Maybe { inner: Box<CoreType>, span: Span },
    Option { inner: Box<CoreType>, span: Span },
    Result { ok: Box<CoreType>, err: Box<CoreType>, span: Span },
    List { inner: Box<CoreType>, span: Span },
    Map { key: Box<CoreType>, value: Box<CoreType>, span: Span },
    #[serde(rename = "FuncType")]
    Func { params: Vec<CoreType>, ret: Box<CoreType>, span: Span },
    #[serde(rename = "PiiType")]
    Pii { base: Box<CoreType>, sensitivity: Sensitivity, category: String, span: Span },
}

impl CoreType {
    pub fn span(&self) -> Span {
        match self {
            CoreType::Name { span, .. }
            | CoreType::Var { span, .. }
            | CoreType::App { span, .. }
            | CoreType::Maybe { span, .. }
            | CoreType::Option { span, .. }
            | CoreType::Result { span, .. }
            | CoreType::List { span, .. }
            | CoreType::Map { span, .. }
            | CoreType::Func { span, .. }
            | CoreType::Pii { span, .. } => *span,
        }
    }

    /// Collect PII annotations anywhere inside this type, outermost first.
    pub fn pii_leaves(&self) -> Vec<(Sensitivity, &str)> {
        let mut out = Vec::new();
        self.collect_pii(&mut out);
        out
    }

    fn collect_pii<'a>(&'a self, out: &mut Vec<(Sensitivity, &'a str)>) {
        match self {
            CoreType::Pii { base, sensitivity, category, .. } => {
                out.push((*sensitivity, category.as_str()));
                base.collect_pii(out);
            }
            CoreType::Maybe { inner, .. }
            | CoreType::Option { inner, .. }
            | CoreType::List { inner, .. } => inner.collect_pii(out),
            CoreType::Result { ok, err, .. } => {
                ok.collect_pii(out);
                err.collect_pii(out);
            }
            CoreType::Map { key, value, .. } => {
                key.collect_pii(out);
                value.collect_pii(out);
            }
            CoreType::App { args, .. } => {
                for arg in args {
                    arg.collect_pii(out);
                }
            }
            CoreType::Func { params, ret, .. } => {
                for p in params {
                    p.collect_pii(out);
                }
                ret.collect_pii(out);
            }
            CoreType::Name { .. } | CoreType::Var { .. } => {}
        }
    }

    /// True when any PII annotation occurs inside this type.
    pub fn has_pii(&self) -> bool {
        !self.pii_leaves().is_empty()
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CoreBlock {
    pub statements: Vec<CoreStmt>,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CoreStmt {
    Let { name: String, expr: CoreExpr, span: Span },
    Set { name: String, expr: CoreExpr, span: Span },
    Return { expr: CoreExpr, span: Span },
    If {
        cond: CoreExpr,
        #[serde(rename = "thenBlock")]
        then_block: CoreBlock,
        #[serde(rename = "elseBlock", skip_serializing_if = "std::option::Option::is_none")]
        else_block: Option<CoreBlock>,
        span: Span,
    },
    Match { expr: CoreExpr, cases: Vec<CoreMatchCase>, span: Span },
    Scope { statements: Vec<CoreStmt>, span: Span },
    Start { name: String, expr: CoreExpr, span: Span },
    Wait { names: Vec<String>, span: Span },
}

impl CoreStmt {
    pub fn span(&self) -> Span {
        match self {
            CoreStmt::Let { span, .. }
            | CoreStmt::Set { span, .. }
            | CoreStmt::Return { span, .. }
            | CoreStmt::If { span, .. }
            | CoreStmt::Match { span, .. }
            | CoreStmt::Scope { span, .. }
            | CoreStmt::Start { span, .. }
            | CoreStmt::Wait { span, .. } => *span,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CoreMatchCase {
    pub pattern: CorePattern,
    pub body: CoreBlock,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CorePattern {
    PatNull { span: Span },
    PatInt { value: i64, span: Span },
    PatName { name: String, span: Span },
    PatCtor {
        #[serde(rename = "typeName")]
        type_name: String,
        names: Vec<String>,
        span: Span,
    },
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CoreConstructField {
    pub name: String,
    pub value: CoreExpr,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CoreExpr {
    Name { name: String, span: Span },
    Bool { value: bool, span: Span },
    Null { span: Span },
    Int { value: i64, span: Span },
    Long { value: String, span: Span },
    Float { value: String, span: Span },
    #[serde(rename = "String")]
    Str { value: String, span: Span },
    #[serde(rename = "None")]
    NoneLit { span: Span },
    Some { expr: Box<CoreExpr>, span: Span },
    Ok { expr: Box<CoreExpr>, span: Span },
    Err { expr: Box<CoreExpr>, span: Span },
    Construct {
        #[serde(rename = "typeName")]
        type_name: String,
        fields: Vec<CoreConstructField>,
        span: Span,
    },
    Call { target: Box<CoreExpr>, args: Vec<CoreExpr>, span: Span },
    Lambda {
        params: Vec<CoreField>,
        #[serde(rename = "retType", skip_serializing_if = "std::option::Option::is_none")]
        ret_type: Option<CoreType>,
        body: CoreBlock,
        /// Free names of the body, in first-use order.
        captures: Vec<String>,
        span: Span,
    },
    Await { expr: Box<CoreExpr>, span: Span },
}

impl CoreExpr {
    pub fn span(&self) -> Span {
        match self {
            CoreExpr::Name { span, .. }
            | CoreExpr::Bool { span, .. }
            | CoreExpr::Null { span }
            | CoreExpr::Int { span, .. }
            | CoreExpr::Long { span, .. }
            | CoreExpr::Float { span, .. }
            | CoreExpr::Str { span, .. }
            | CoreExpr::NoneLit { span }
            | CoreExpr::Some { span, .. }
            | CoreExpr::Ok { span, .. }
            | CoreExpr::Err { span, .. }
            | CoreExpr::Construct { span, .. }
            | CoreExpr::Call { span, .. }
            | CoreExpr::Lambda { span, .. }
            | CoreExpr::Await { span, .. } => *span,
        }
    }

    /// Qualified name of a call target, when the target is a plain name.
    pub fn target_name(&self) -> Option<&str> {
        match self {
            CoreExpr::Name { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::Position;

    fn sp() -> Span {
        Span::point(Position::ORIGIN)
    }

    fn origin() -> Origin {
        Origin::new("test.aster", sp())
    }

    #[test]
    fn decl_name_prefers_alias() {
        let decl = CoreDecl::Import(CoreImport {
            name: "demo.http".into(),
            as_name: Some("web".into()),
            span: sp(),
            origin: origin(),
        });
        assert_eq!(decl.name(), "web");
    }

    #[test]
    fn stmt_kind_tags() {
        let stmt = CoreStmt::Scope { statements: vec![], span: sp() };
        let json = serde_json::to_value(&stmt).unwrap();
        assert_eq!(json["kind"], "Scope");
    }

    #[test]
    fn expr_string_tag() {
        let expr = CoreExpr::Str { value: "Hi".into(), span: sp() };
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["kind"], "String");
        assert_eq!(json["value"], "Hi");
    }

    #[test]
    fn none_literal_tag() {
        let expr = CoreExpr::NoneLit { span: sp() };
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["kind"], "None");
    }

    #[test]
    fn type_tags_match_contract() {
        let ty = CoreType::Pii {
            base: Box::new(CoreType::Name { name: "Text".into(), span: sp() }),
            sensitivity: Sensitivity::L2,
            category: "email".into(),
            span: sp(),
        };
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json["kind"], "PiiType");
        assert_eq!(json["sensitivity"], "L2");
        assert_eq!(json["base"]["kind"], "TypeName");
    }

    #[test]
    fn pattern_round_trip() {
        let pat = CorePattern::PatCtor {
            type_name: "Ok".into(),
            names: vec!["v".into()],
            span: sp(),
        };
        let json = serde_json::to_string(&pat).unwrap();
        let back: CorePattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pat);
    }

    #[test]
    fn has_pii_through_map_value() {
        let ty = CoreType::Map {
            key: Box::new(CoreType::Name { name: "Text".into(), span: sp() }),
            value: Box::new(CoreType::Pii {
                base: Box::new(CoreType::Name { name: "Text".into(), span: sp() }),
                sensitivity: Sensitivity::L3,
                category: "ssn".into(),
                span: sp(),
            }),
            span: sp(),
        };
        assert!(ty.has_pii());
        assert_eq!(ty.pii_leaves()[0].0, Sensitivity::L3);
    }
}
