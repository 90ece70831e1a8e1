//! AST → Core IR lowering.
//!
//! Makes the implicit parts of the surface explicit: resolved capability
//! sets in canonical order, lambda capture lists, aggregated PII metadata,
//! bare calls as `Let "_"`, and `Within scope` blocks as `Scope`. Lowering
//! is fatal only on an unknown effect name; everything else is a
//! shape-preserving walk.

mod captures;

use aster_diagnostic::{DiagCode, Diagnostic};
use aster_ir::{
    Block, Capability, CoreBlock, CoreConstructField, CoreData, CoreDecl, CoreEnum, CoreExpr,
    CoreField, CoreFunc, CoreImport, CoreMatchCase, CoreModule, CorePattern, CoreStmt, CoreType,
    Decl, Effect, Expr, Field, Func, MatchCase, Module, Origin, Pattern, Sensitivity, Span, Stmt,
    Type,
};
use tracing::debug;

pub use captures::free_names;

/// Fatal lowering failure.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct LowerError {
    pub message: String,
    pub span: Span,
}

impl LowerError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.message.clone(), self.span).with_code(DiagCode::UnknownEffect)
    }
}

impl std::fmt::Display for LowerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

impl std::error::Error for LowerError {}

/// Lower a module, attributing origins to `<source>`.
pub fn lower_module(module: &Module) -> Result<CoreModule, LowerError> {
    lower_module_in_file(module, "<source>")
}

/// Lower a module, attributing origins to `file`.
pub fn lower_module_in_file(module: &Module, file: &str) -> Result<CoreModule, LowerError> {
    debug!(name = ?module.name, "lowering module");
    let lowerer = Lowerer::new(module, file);
    lowerer.run(module)
}

struct Lowerer {
    file: String,
    /// Names declared at module level; never captured by lambdas.
    module_names: Vec<String>,
}

impl Lowerer {
    fn new(module: &Module, file: &str) -> Self {
        let module_names = module
            .decls
            .iter()
            .map(|decl| match decl {
                Decl::Import(i) => i.as_name.clone().unwrap_or_else(|| i.name.clone()),
                Decl::Data(d) => d.name.clone(),
                Decl::Enum(e) => e.name.clone(),
                Decl::Func(f) => f.name.clone(),
            })
            .collect();
        Lowerer { file: file.to_string(), module_names }
    }

    fn origin(&self, span: Span) -> Origin {
        Origin::new(self.file.clone(), span)
    }

    fn run(&self, module: &Module) -> Result<CoreModule, LowerError> {
        let mut decls = Vec::with_capacity(module.decls.len());
        for decl in &module.decls {
            decls.push(self.lower_decl(decl)?);
        }
        Ok(CoreModule {
            name: module.name.clone(),
            decls,
            span: module.span,
            origin: self.origin(module.span),
        })
    }

    fn lower_decl(&self, decl: &Decl) -> Result<CoreDecl, LowerError> {
        match decl {
            Decl::Import(import) => Ok(CoreDecl::Import(CoreImport {
                name: import.name.clone(),
                as_name: import.as_name.clone(),
                span: import.span,
                origin: self.origin(import.span),
            })),
            Decl::Data(data) => Ok(CoreDecl::Data(CoreData {
                name: data.name.clone(),
                fields: data.fields.iter().map(|f| self.lower_field(f)).collect(),
                name_span: data.name_span,
                span: data.span,
                origin: self.origin(data.span),
            })),
            Decl::Enum(decl) => Ok(CoreDecl::Enum(CoreEnum {
                name: decl.name.clone(),
                variants: decl.variants.clone(),
                name_span: decl.name_span,
                variant_spans: decl.variant_spans.clone(),
                span: decl.span,
                origin: self.origin(decl.span),
            })),
            Decl::Func(func) => self.lower_func(func).map(CoreDecl::Func),
        }
    }

    fn lower_func(&self, func: &Func) -> Result<CoreFunc, LowerError> {
        let mut effects = Vec::with_capacity(func.effects.len());
        for name in &func.effects {
            let effect: Effect = name.parse().map_err(|()| LowerError {
                message: format!("unknown effect `{name}` (expected `io` or `cpu`)"),
                span: func.name_span,
            })?;
            if !effects.contains(&effect) {
                effects.push(effect);
            }
        }

        let effect_caps = if func.effect_caps_explicit {
            // Verbatim from source.
            func.effect_caps.clone()
        } else {
            derive_caps(&effects)
        };

        let (pii_level, pii_categories) = aggregate_pii(&func.params, &func.ret_type);

        let params: Vec<CoreField> = func.params.iter().map(|f| self.lower_field(f)).collect();
        let body = func
            .body
            .as_ref()
            .map(|b| self.lower_block(b));

        Ok(CoreFunc {
            name: func.name.clone(),
            type_params: func.type_params.clone(),
            params,
            ret_type: lower_type(&func.ret_type),
            effects,
            effect_caps,
            effect_caps_explicit: func.effect_caps_explicit,
            pii_level,
            pii_categories,
            body,
            name_span: func.name_span,
            span: func.span,
            origin: self.origin(func.span),
        })
    }

    fn lower_field(&self, field: &Field) -> CoreField {
        CoreField {
            name: field.name.clone(),
            ty: lower_type(&field.ty),
            constraints: field.constraints.clone(),
            span: field.span,
        }
    }

    fn lower_block(&self, block: &Block) -> CoreBlock {
        CoreBlock {
            statements: block.statements.iter().map(|s| self.lower_stmt(s)).collect(),
            span: block.span,
        }
    }

    fn lower_stmt(&self, stmt: &Stmt) -> CoreStmt {
        match stmt {
            Stmt::Let { name, expr, span } => CoreStmt::Let {
                name: name.clone(),
                expr: self.lower_expr(expr),
                span: *span,
            },
            Stmt::Set { name, expr, span } => CoreStmt::Set {
                name: name.clone(),
                expr: self.lower_expr(expr),
                span: *span,
            },
            Stmt::Return { expr, span } => CoreStmt::Return {
                expr: self.lower_expr(expr),
                span: *span,
            },
            Stmt::If { cond, then_block, else_block, span } => CoreStmt::If {
                cond: self.lower_expr(cond),
                then_block: self.lower_block(then_block),
                else_block: else_block.as_ref().map(|b| self.lower_block(b)),
                span: *span,
            },
            Stmt::Match { expr, cases, span } => CoreStmt::Match {
                expr: self.lower_expr(expr),
                cases: cases.iter().map(|c| self.lower_case(c)).collect(),
                span: *span,
            },
            Stmt::Block { block, span } => CoreStmt::Scope {
                statements: block.statements.iter().map(|s| self.lower_stmt(s)).collect(),
                span: *span,
            },
            Stmt::Start { name, expr, span } => CoreStmt::Start {
                name: name.clone(),
                expr: self.lower_expr(expr),
                span: *span,
            },
            Stmt::Wait { names, span } => CoreStmt::Wait {
                names: names.clone(),
                span: *span,
            },
            // A standalone call becomes a discarded binding.
            Stmt::Call { expr, span } => CoreStmt::Let {
                name: "_".to_string(),
                expr: self.lower_expr(expr),
                span: *span,
            },
        }
    }

    fn lower_case(&self, case: &MatchCase) -> CoreMatchCase {
        CoreMatchCase {
            pattern: lower_pattern(&case.pattern),
            body: self.lower_block(&case.body),
            span: case.span,
        }
    }

    fn lower_expr(&self, expr: &Expr) -> CoreExpr {
        match expr {
            Expr::Name { name, span } => CoreExpr::Name { name: name.clone(), span: *span },
            Expr::Bool { value, span } => CoreExpr::Bool { value: *value, span: *span },
            Expr::Null { span } => CoreExpr::Null { span: *span },
            Expr::Int { value, span } => CoreExpr::Int { value: *value, span: *span },
            Expr::Long { value, span } => CoreExpr::Long { value: value.clone(), span: *span },
            Expr::Float { value, span } => CoreExpr::Float { value: value.clone(), span: *span },
            Expr::Str { value, span } => CoreExpr::Str { value: value.clone(), span: *span },
            Expr::NoneLit { span } => CoreExpr::NoneLit { span: *span },
            Expr::Some { expr, span } => CoreExpr::Some {
                expr: Box::new(self.lower_expr(expr)),
                span: *span,
            },
            Expr::Ok { expr, span } => CoreExpr::Ok {
                expr: Box::new(self.lower_expr(expr)),
                span: *span,
            },
            Expr::Err { expr, span } => CoreExpr::Err {
                expr: Box::new(self.lower_expr(expr)),
                span: *span,
            },
            Expr::Construct { type_name, fields, span } => CoreExpr::Construct {
                type_name: type_name.clone(),
                fields: fields
                    .iter()
                    .map(|(name, value)| CoreConstructField {
                        name: name.clone(),
                        value: self.lower_expr(value),
                    })
                    .collect(),
                span: *span,
            },
            Expr::Call { target, args, span } => CoreExpr::Call {
                target: Box::new(self.lower_expr(target)),
                args: args.iter().map(|a| self.lower_expr(a)).collect(),
                span: *span,
            },
            Expr::Lambda { params, ret_type, body, span } => {
                let captures =
                    captures::lambda_captures(params, body, &self.module_names);
                CoreExpr::Lambda {
                    params: params.iter().map(|f| self.lower_field(f)).collect(),
                    ret_type: ret_type.as_ref().map(lower_type),
                    body: self.lower_block(body),
                    captures,
                    span: *span,
                }
            }
            Expr::Await { expr, span } => CoreExpr::Await {
                expr: Box::new(self.lower_expr(expr)),
                span: *span,
            },
        }
    }
}

/// Implicit capability derivation: union over per-effect families in the
/// canonical order.
fn derive_caps(effects: &[Effect]) -> Vec<Capability> {
    let mut caps = Vec::new();
    for effect in effects {
        match effect {
            Effect::Io => caps.extend_from_slice(&Capability::IO_IMPLICIT),
            Effect::Cpu => caps.push(Capability::Cpu),
        }
    }
    Capability::canonical_order(&caps)
}

/// Max sensitivity and first-appearance category union over parameter and
/// return types.
fn aggregate_pii(params: &[Field], ret_type: &Type) -> (Option<Sensitivity>, Vec<String>) {
    let mut level: Option<Sensitivity> = None;
    let mut categories: Vec<String> = Vec::new();
    let mut merge = |leaves: Vec<(Sensitivity, &str)>| {
        for (sensitivity, category) in leaves {
            level = Some(level.map_or(sensitivity, |l| l.max(sensitivity)));
            if !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
    };
    for param in params {
        merge(param.ty.pii_leaves());
    }
    merge(ret_type.pii_leaves());
    (level, categories)
}

fn lower_pattern(pattern: &Pattern) -> CorePattern {
    match pattern {
        Pattern::Null { span } => CorePattern::PatNull { span: *span },
        Pattern::Int { value, span } => CorePattern::PatInt { value: *value, span: *span },
        Pattern::Name { name, span } => CorePattern::PatName { name: name.clone(), span: *span },
        Pattern::Ctor { type_name, names, span } => CorePattern::PatCtor {
            type_name: type_name.clone(),
            names: names.clone(),
            span: *span,
        },
    }
}

fn lower_type(ty: &Type) -> CoreType {
    match ty {
        Type::Name { name, span } => CoreType::Name { name: name.clone(), span: *span },
        Type::Var { name, span } => CoreType::Var { name: name.clone(), span: *span },
        Type::App { base, args, span } => CoreType::App {
            base: base.clone(),
            args: args.iter().map(lower_type).collect(),
            span: *span,
        },
        Type::Maybe { inner, span } => CoreType::Maybe {
            inner: Box::new(lower_type(inner)),
            span: *span,
        },
        Type::Option { inner, span } => CoreType::Option {
            inner: Box::new(lower_type(inner)),
            span: *span,
        },
        Type::Result { ok, err, span } => CoreType::Result {
            ok: Box::new(lower_type(ok)),
            err: Box::new(lower_type(err)),
            span: *span,
        },
        Type::List { inner, span } => CoreType::List {
            inner: Box::new(lower_type(inner)),
            span: *span,
        },
        Type::Map { key, value, span } => CoreType::Map {
            key: Box::new(lower_type(key)),
            value: Box::new(lower_type(value)),
            span: *span,
        },
        Type::Func { params, ret, span } => CoreType::Func {
            params: params.iter().map(lower_type).collect(),
            ret: Box::new(lower_type(ret)),
            span: *span,
        },
        Type::Pii { base, sensitivity, category, span } => CoreType::Pii {
            base: Box::new(lower_type(base)),
            sensitivity: *sensitivity,
            category: category.clone(),
            span: *span,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use aster_canon::canonicalize;
    use aster_lexer::lex;
    use aster_lexicon::english;
    use pretty_assertions::assert_eq;

    fn lower_en(source: &str) -> CoreModule {
        let en = english();
        let canonical = canonicalize(source, &en);
        let tokens = lex(&canonical, &en).unwrap();
        let module = aster_parse::parse(&tokens).unwrap();
        lower_module(&module).unwrap()
    }

    fn first_func(core: &CoreModule) -> &CoreFunc {
        core.decls
            .iter()
            .find_map(|d| match d {
                CoreDecl::Func(f) => Some(f),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn empty_effects_stay_empty() {
        let core = lower_en("Rule audit, produce Int. It performs [].\n");
        let func = first_func(&core);
        assert!(func.effects.is_empty());
        assert!(func.effect_caps.is_empty());
        assert!(!func.effect_caps_explicit);
    }

    #[test]
    fn io_derives_full_family() {
        let core = lower_en("Rule pull, produce Int. It performs io.\n");
        let func = first_func(&core);
        assert_eq!(func.effects, vec![Effect::Io]);
        assert_eq!(func.effect_caps, Capability::IO_IMPLICIT.to_vec());
        assert!(!func.effect_caps_explicit);
    }

    #[test]
    fn cpu_derives_cpu_only() {
        let core = lower_en("Rule crunch, produce Int. It performs cpu.\n");
        let func = first_func(&core);
        assert_eq!(func.effects, vec![Effect::Cpu]);
        assert_eq!(func.effect_caps, vec![Capability::Cpu]);
        assert!(!func.effect_caps_explicit);
    }

    #[test]
    fn io_and_cpu_derive_in_canonical_order() {
        let core = lower_en("Rule both, produce Int. It performs cpu and io.\n");
        let func = first_func(&core);
        assert_eq!(func.effect_caps, Capability::CANONICAL.to_vec());
    }

    #[test]
    fn explicit_caps_are_verbatim() {
        let core = lower_en("Rule sync, produce Int. It performs io and cpu and Http.\n");
        let func = first_func(&core);
        assert_eq!(func.effects, vec![Effect::Io, Effect::Cpu]);
        assert_eq!(func.effect_caps, vec![Capability::Http]);
        assert!(func.effect_caps_explicit);
    }

    #[test]
    fn unknown_effect_is_fatal() {
        let en = english();
        let canonical = canonicalize("Rule f, produce Int. It performs net.\n", &en);
        let tokens = lex(&canonical, &en).unwrap();
        let module = aster_parse::parse(&tokens).unwrap();
        let err = lower_module(&module).unwrap_err();
        assert!(err.message.contains("net"));
    }

    #[test]
    fn lambda_captures_enclosing_param() {
        let core = lower_en(
            "Rule makeAdder given base: Int, produce Fn1:\n  Return (value as Int) => base.\n",
        );
        let func = first_func(&core);
        let body = func.body.as_ref().unwrap();
        let CoreStmt::Return { expr: CoreExpr::Lambda { captures, .. }, .. } =
            &body.statements[0]
        else {
            panic!("expected lambda");
        };
        assert_eq!(captures, &vec!["base".to_string()]);
    }

    #[test]
    fn lambda_does_not_capture_own_params_or_module_names() {
        let core = lower_en(
            "Rule helper, produce Int:\n  Return 1.\nRule mk given seed: Int, produce Fn1:\n  Return (v as Int) => helper(v).\n",
        );
        let funcs: Vec<&CoreFunc> = core
            .decls
            .iter()
            .filter_map(|d| match d {
                CoreDecl::Func(f) => Some(f),
                _ => None,
            })
            .collect();
        let body = funcs[1].body.as_ref().unwrap();
        let CoreStmt::Return { expr: CoreExpr::Lambda { captures, .. }, .. } =
            &body.statements[0]
        else {
            panic!("expected lambda");
        };
        assert!(captures.is_empty(), "got {captures:?}");
    }

    #[test]
    fn bare_call_becomes_discard_let() {
        let core = lower_en("Rule log, produce Int:\n  Audit.record(\"x\").\n  Return 1.\n");
        let func = first_func(&core);
        let body = func.body.as_ref().unwrap();
        let CoreStmt::Let { name, expr, .. } = &body.statements[0] else {
            panic!("expected let");
        };
        assert_eq!(name, "_");
        assert!(matches!(expr, CoreExpr::Call { .. }));
    }

    #[test]
    fn within_scope_becomes_scope() {
        let core =
            lower_en("Rule s, produce Int:\n  Within scope:\n    Let x be 1.\n  Return 2.\n");
        let func = first_func(&core);
        let body = func.body.as_ref().unwrap();
        assert!(matches!(&body.statements[0], CoreStmt::Scope { statements, .. } if statements.len() == 1));
    }

    #[test]
    fn pii_aggregates_max_level_and_ordered_categories() {
        let core = lower_en(
            "Rule send given email: @pii(L2, email) Text, name: @pii(L1, name) Text, produce @pii(L3, ssn) Text. It performs [].\n",
        );
        let func = first_func(&core);
        assert_eq!(func.pii_level, Some(Sensitivity::L3));
        assert_eq!(func.pii_categories, vec!["email", "name", "ssn"]);
    }

    #[test]
    fn no_pii_means_none() {
        let core = lower_en("Rule plain given x: Int, produce Int.\n");
        let func = first_func(&core);
        assert_eq!(func.pii_level, None);
        assert!(func.pii_categories.is_empty());
    }

    #[test]
    fn patterns_map_one_to_one() {
        let core = lower_en(
            "Rule m given v: Int, produce Text:\n  Match v:\n    When 0, Return \"zero\".\n    When null, Return \"null\".\n    When Some(x), Return \"some\".\n    When other, Return \"other\".\n  Return \"done\".\n",
        );
        let func = first_func(&core);
        let body = func.body.as_ref().unwrap();
        let CoreStmt::Match { cases, .. } = &body.statements[0] else { panic!("match") };
        assert!(matches!(cases[0].pattern, CorePattern::PatInt { value: 0, .. }));
        assert!(matches!(cases[1].pattern, CorePattern::PatNull { .. }));
        assert!(matches!(&cases[2].pattern, CorePattern::PatCtor { type_name, .. } if type_name == "Some"));
        assert!(matches!(&cases[3].pattern, CorePattern::PatName { name, .. } if name == "other"));
    }

    #[test]
    fn determinism_same_input_same_core() {
        let src = "This module is demo.greet.\nRule greet given name: Text, produce Text:\n  Return \"Hi \".\n";
        let a = lower_en(src);
        let b = lower_en(src);
        assert_eq!(aster_ir::json::pruned_value(&a), aster_ir::json::pruned_value(&b));
    }

    #[test]
    fn greet_round_trips_through_json() {
        let core = lower_en(
            "This module is demo.greet.\nRule greet given name: Text, produce Text:\n  Return \"Hi \".\n",
        );
        let json = aster_ir::json::serialize_core_ir(&core, None);
        assert!(aster_ir::json::is_valid_core_ir_json(&json));
        let back = aster_ir::json::deserialize_core_ir(&json).unwrap();
        assert_eq!(aster_ir::json::serialize_core_ir(&back, None), json);
    }
}
