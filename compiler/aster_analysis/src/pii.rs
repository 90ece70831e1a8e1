//! PII taint analysis.
//!
//! Parameters annotated `@pii(...)` start tainted; taint flows through
//! assignment, construction, call returns (unless the callee is a known
//! sanitizer), and pattern bindings. A tainted argument reaching an HTTP
//! sink raises a transmission diagnostic plus a missing-consent diagnostic.
//! Severity is Warning by default, Error in strict mode. Every diagnostic
//! carries `source = "aster-pii"`.

use aster_diagnostic::{sort_by_position, DiagCode, Diagnostic};
use aster_ir::{
    CoreBlock, CoreDecl, CoreExpr, CoreFunc, CoreModule, CorePattern, CoreStmt, Sensitivity,
};
use rustc_hash::FxHashMap;
use tracing::debug;

const SOURCE: &str = "aster-pii";

/// Analyzer options.
#[derive(Clone, Debug)]
pub struct PiiOptions {
    /// Escalate findings to errors.
    pub strict: bool,
    /// Call targets treated as network sinks.
    pub sinks: Vec<String>,
    /// Call targets that clear taint.
    pub sanitizers: Vec<String>,
}

impl Default for PiiOptions {
    fn default() -> Self {
        PiiOptions {
            strict: false,
            sinks: vec![
                "Http.post".to_string(),
                "Http.put".to_string(),
                "Http.get".to_string(),
            ],
            sanitizers: vec![
                "Pii.redact".to_string(),
                "Pii.hash".to_string(),
                "Pii.anonymize".to_string(),
            ],
        }
    }
}

/// PII flow analysis with default options.
pub fn check_pii_flow(core: &CoreModule) -> Vec<Diagnostic> {
    check_pii_flow_with(core, &PiiOptions::default())
}

/// PII flow analysis with explicit options.
pub fn check_pii_flow_with(core: &CoreModule, options: &PiiOptions) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for decl in &core.decls {
        if let CoreDecl::Func(func) = decl {
            check_func(func, options, &mut diags);
        }
    }
    sort_by_position(&mut diags);
    diags
}

/// Taint tag: sensitivity plus the category it came from.
type Taint = (Sensitivity, String);

fn check_func(func: &CoreFunc, options: &PiiOptions, diags: &mut Vec<Diagnostic>) {
    let Some(body) = &func.body else { return };
    debug!(func = %func.name, "checking PII flow");

    let mut tainted: FxHashMap<String, Taint> = FxHashMap::default();
    for param in &func.params {
        if let Some((sensitivity, category)) = param.ty.pii_leaves().first() {
            tainted.insert(param.name.clone(), (*sensitivity, (*category).to_string()));
        }
    }
    check_block(body, &mut tainted, func, options, diags);
}

fn check_block(
    block: &CoreBlock,
    tainted: &mut FxHashMap<String, Taint>,
    func: &CoreFunc,
    options: &PiiOptions,
    diags: &mut Vec<Diagnostic>,
) {
    for stmt in &block.statements {
        check_stmt(stmt, tainted, func, options, diags);
    }
}

fn check_stmt(
    stmt: &CoreStmt,
    tainted: &mut FxHashMap<String, Taint>,
    func: &CoreFunc,
    options: &PiiOptions,
    diags: &mut Vec<Diagnostic>,
) {
    match stmt {
        CoreStmt::Let { name, expr, .. }
        | CoreStmt::Set { name, expr, .. }
        | CoreStmt::Start { name, expr, .. } => {
            check_expr(expr, tainted, func, options, diags);
            match taint_of(expr, tainted, options) {
                Some(taint) => {
                    tainted.insert(name.clone(), taint);
                }
                None => {
                    tainted.remove(name);
                }
            }
        }
        CoreStmt::Return { expr, .. } => {
            check_expr(expr, tainted, func, options, diags);
        }
        CoreStmt::If { cond, then_block, else_block, .. } => {
            check_expr(cond, tainted, func, options, diags);
            let mut then_env = tainted.clone();
            check_block(then_block, &mut then_env, func, options, diags);
            if let Some(block) = else_block {
                let mut else_env = tainted.clone();
                check_block(block, &mut else_env, func, options, diags);
            }
        }
        CoreStmt::Match { expr, cases, .. } => {
            check_expr(expr, tainted, func, options, diags);
            let scrutinee = taint_of(expr, tainted, options);
            for case in cases {
                let mut env = tainted.clone();
                // Pattern bindings inherit the scrutinee's taint.
                if let Some(taint) = &scrutinee {
                    bind_pattern(&case.pattern, taint, &mut env);
                }
                check_block(&case.body, &mut env, func, options, diags);
            }
        }
        CoreStmt::Scope { statements, .. } => {
            let mut env = tainted.clone();
            for stmt in statements {
                check_stmt(stmt, &mut env, func, options, diags);
            }
        }
        CoreStmt::Wait { .. } => {}
    }
}

fn bind_pattern(pattern: &CorePattern, taint: &Taint, env: &mut FxHashMap<String, Taint>) {
    match pattern {
        CorePattern::PatName { name, .. } => {
            env.insert(name.clone(), taint.clone());
        }
        CorePattern::PatCtor { names, .. } => {
            for name in names {
                env.insert(name.clone(), taint.clone());
            }
        }
        CorePattern::PatNull { .. } | CorePattern::PatInt { .. } => {}
    }
}

/// Walk an expression reporting sink violations in nested calls.
fn check_expr(
    expr: &CoreExpr,
    tainted: &FxHashMap<String, Taint>,
    func: &CoreFunc,
    options: &PiiOptions,
    diags: &mut Vec<Diagnostic>,
) {
    match expr {
        CoreExpr::Call { target, args, span } => {
            for arg in args {
                check_expr(arg, tainted, func, options, diags);
            }
            let Some(name) = target.target_name() else { return };
            if !options.sinks.iter().any(|s| s == name) {
                return;
            }
            let leaked = args
                .iter()
                .find_map(|arg| taint_of(arg, tainted, options));
            if let Some((sensitivity, category)) = leaked {
                let base = |message: String, code: DiagCode| {
                    let diag = Diagnostic::warning(message, *span)
                        .with_code(code)
                        .with_source(SOURCE)
                        .with_data("function", &func.name)
                        .with_data("category", &category)
                        .with_data("sensitivity", sensitivity.as_str());
                    if options.strict {
                        diag.escalate()
                    } else {
                        diag
                    }
                };
                diags.push(base(
                    format!(
                        "PII data transmitted over HTTP: `{category}` ({sensitivity}) reaches `{name}`"
                    ),
                    DiagCode::PiiHttpLeak,
                ));
                diags.push(base(
                    format!(
                        "PII data sent via `{name}` without a consent check for `{category}`"
                    ),
                    DiagCode::PiiMissingConsent,
                ));
            }
        }
        CoreExpr::Some { expr, .. }
        | CoreExpr::Ok { expr, .. }
        | CoreExpr::Err { expr, .. }
        | CoreExpr::Await { expr, .. } => check_expr(expr, tainted, func, options, diags),
        CoreExpr::Construct { fields, .. } => {
            for field in fields {
                check_expr(&field.value, tainted, func, options, diags);
            }
        }
        CoreExpr::Lambda { body, .. } => {
            let mut env = tainted.clone();
            for stmt in &body.statements {
                check_stmt(stmt, &mut env, func, options, diags);
            }
        }
        _ => {}
    }
}

/// Taint of a value expression, if any.
fn taint_of(
    expr: &CoreExpr,
    tainted: &FxHashMap<String, Taint>,
    options: &PiiOptions,
) -> Option<Taint> {
    match expr {
        CoreExpr::Name { name, .. } => tainted.get(name).cloned(),
        CoreExpr::Some { expr, .. }
        | CoreExpr::Ok { expr, .. }
        | CoreExpr::Err { expr, .. }
        | CoreExpr::Await { expr, .. } => taint_of(expr, tainted, options),
        CoreExpr::Construct { fields, .. } => fields
            .iter()
            .filter_map(|f| taint_of(&f.value, tainted, options))
            .max_by_key(|(sensitivity, _)| *sensitivity),
        CoreExpr::Call { target, args, .. } => {
            // Sanitizers clear taint; any other call propagates the
            // highest argument taint into its result.
            if let Some(name) = target.target_name() {
                if options.sanitizers.iter().any(|s| s == name) {
                    return None;
                }
            }
            args.iter()
                .filter_map(|arg| taint_of(arg, tainted, options))
                .max_by_key(|(sensitivity, _)| *sensitivity)
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use aster_canon::canonicalize;
    use aster_diagnostic::Severity;
    use aster_lexer::lex;
    use aster_lexicon::english;

    fn lower_en(source: &str) -> CoreModule {
        let en = english();
        let canonical = canonicalize(source, &en);
        let tokens = lex(&canonical, &en).unwrap();
        let module = aster_parse::parse(&tokens).unwrap();
        aster_lower::lower_module(&module).unwrap()
    }

    const LEAKY: &str = "Rule send given email: @pii(L2, email) Text, produce Text. It performs io [Http]: Return Http.post(\"/x\", email).\n";

    #[test]
    fn direct_leak_produces_both_diagnostics() {
        let core = lower_en(LEAKY);
        let diags = check_pii_flow(&core);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.source.as_deref() == Some("aster-pii")));
        assert!(diags[0].message.contains("PII data transmitted over HTTP"));
        assert_eq!(diags[0].code, Some(DiagCode::PiiHttpLeak));
        assert_eq!(diags[1].code, Some(DiagCode::PiiMissingConsent));
    }

    #[test]
    fn default_severity_is_warning_strict_is_error() {
        let core = lower_en(LEAKY);
        let relaxed = check_pii_flow(&core);
        assert!(relaxed.iter().all(|d| d.severity == Severity::Warning));
        let strict = check_pii_flow_with(
            &core,
            &PiiOptions { strict: true, ..PiiOptions::default() },
        );
        assert!(strict.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn taint_flows_through_let_chain() {
        let core = lower_en(
            "Rule relay given email: @pii(L2, email) Text, produce Text. It performs io [Http]:\n  Let copy be email.\n  Let wrapped be Text.concat(copy, \"!\").\n  Return Http.post(\"/x\", wrapped).\n",
        );
        let diags = check_pii_flow(&core);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].data_value("category"), Some("email"));
    }

    #[test]
    fn sanitizer_clears_taint() {
        let core = lower_en(
            "Rule safe given email: @pii(L2, email) Text, produce Text. It performs io [Http]:\n  Let masked be Pii.redact(email).\n  Return Http.post(\"/x\", masked).\n",
        );
        assert!(check_pii_flow(&core).is_empty());
    }

    #[test]
    fn untainted_arguments_are_silent() {
        let core = lower_en(
            "Rule plain given body: Text, produce Text. It performs io [Http]:\n  Return Http.post(\"/x\", body).\n",
        );
        assert!(check_pii_flow(&core).is_empty());
    }

    #[test]
    fn pattern_bindings_inherit_taint() {
        let core = lower_en(
            "Rule pick given secret: @pii(L3, ssn) Text, produce Text. It performs io [Http]:\n  Match secret:\n    When v, Return Http.post(\"/x\", v).\n  Return \"done\".\n",
        );
        let diags = check_pii_flow(&core);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].data_value("sensitivity"), Some("L3"));
    }

    #[test]
    fn construct_carries_highest_taint() {
        let core = lower_en(
            "Define Payload with body: Text.\nRule wrap given email: @pii(L2, email) Text, produce Text. It performs io [Http]:\n  Let p be Payload with body: email.\n  Return Http.post(\"/x\", p).\n",
        );
        let diags = check_pii_flow(&core);
        assert_eq!(diags.len(), 2);
    }
}
