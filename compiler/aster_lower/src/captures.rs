//! Lambda free-variable analysis.
//!
//! A single pass over the lambda body that tracks the set of names in
//! scope (parameters, `let`/`start` bindings, pattern bindings) and
//! collects free identifiers in first-use order. Module-level declaration
//! names and built-in intrinsic roots never count as captures.

use aster_ir::{Block, Expr, Field, Pattern, Stmt};
use rustc_hash::FxHashSet;

/// Roots of built-in qualified names (`Http.post`, `Pii.redact`, …) plus
/// bare intrinsics; never treated as free.
const INTRINSIC_ROOTS: [&str; 12] = [
    "Http", "Sql", "Time", "Files", "Secrets", "Ai", "Crypto", "Math", "Pii", "not", "print",
    "log",
];

/// Captures for a lambda: free names of `body` minus its own `params`,
/// module-level names, and intrinsics. Stable first-use order.
pub(crate) fn lambda_captures(
    params: &[Field],
    body: &Block,
    module_names: &[String],
) -> Vec<String> {
    let mut bound: FxHashSet<String> = params.iter().map(|p| p.name.clone()).collect();
    let mut free = Vec::new();
    block_free_names(body, &mut bound, &mut free);
    free.retain(|name| {
        let root = name.split('.').next().unwrap_or(name);
        !module_names.iter().any(|m| m == root) && !INTRINSIC_ROOTS.contains(&root)
    });
    free
}

/// Free identifiers of a block given names already in scope.
///
/// Bindings introduced inside the block are scoped to it.
pub fn free_names(block: &Block, in_scope: &[String]) -> Vec<String> {
    let mut bound: FxHashSet<String> = in_scope.iter().cloned().collect();
    let mut free = Vec::new();
    block_free_names(block, &mut bound, &mut free);
    free
}

fn block_free_names(block: &Block, bound: &mut FxHashSet<String>, free: &mut Vec<String>) {
    // Clone at entry: bindings do not leak out of the block.
    let mut scope = bound.clone();
    for stmt in &block.statements {
        stmt_free_names(stmt, &mut scope, free);
    }
}

fn stmt_free_names(stmt: &Stmt, bound: &mut FxHashSet<String>, free: &mut Vec<String>) {
    match stmt {
        Stmt::Let { name, expr, .. } | Stmt::Start { name, expr, .. } => {
            expr_free_names(expr, bound, free);
            bound.insert(name.clone());
        }
        Stmt::Set { name, expr, .. } => {
            note_use(name, bound, free);
            expr_free_names(expr, bound, free);
        }
        Stmt::Return { expr, .. } => expr_free_names(expr, bound, free),
        Stmt::If { cond, then_block, else_block, .. } => {
            expr_free_names(cond, bound, free);
            block_free_names(then_block, bound, free);
            if let Some(block) = else_block {
                block_free_names(block, bound, free);
            }
        }
        Stmt::Match { expr, cases, .. } => {
            expr_free_names(expr, bound, free);
            for case in cases {
                let mut case_scope = bound.clone();
                bind_pattern(&case.pattern, &mut case_scope);
                block_free_names(&case.body, &mut case_scope, free);
            }
        }
        Stmt::Block { block, .. } => block_free_names(block, bound, free),
        Stmt::Wait { names, .. } => {
            for name in names {
                note_use(name, bound, free);
            }
        }
        Stmt::Call { expr, .. } => expr_free_names(expr, bound, free),
    }
}

fn bind_pattern(pattern: &Pattern, bound: &mut FxHashSet<String>) {
    match pattern {
        Pattern::Name { name, .. } => {
            bound.insert(name.clone());
        }
        Pattern::Ctor { names, .. } => {
            for name in names {
                bound.insert(name.clone());
            }
        }
        Pattern::Null { .. } | Pattern::Int { .. } => {}
    }
}

fn expr_free_names(expr: &Expr, bound: &mut FxHashSet<String>, free: &mut Vec<String>) {
    match expr {
        Expr::Name { name, .. } => note_use(name, bound, free),
        Expr::Some { expr, .. }
        | Expr::Ok { expr, .. }
        | Expr::Err { expr, .. }
        | Expr::Await { expr, .. } => expr_free_names(expr, bound, free),
        Expr::Construct { fields, .. } => {
            for (_, value) in fields {
                expr_free_names(value, bound, free);
            }
        }
        Expr::Call { target, args, .. } => {
            expr_free_names(target, bound, free);
            for arg in args {
                expr_free_names(arg, bound, free);
            }
        }
        Expr::Lambda { params, body, .. } => {
            // Inner lambda: its params shadow, the rest stays free here.
            let mut inner = bound.clone();
            for param in params {
                inner.insert(param.name.clone());
            }
            block_free_names(body, &mut inner, free);
        }
        Expr::Bool { .. }
        | Expr::Null { .. }
        | Expr::Int { .. }
        | Expr::Long { .. }
        | Expr::Float { .. }
        | Expr::Str { .. }
        | Expr::NoneLit { .. } => {}
    }
}

/// Record a use of `name` as free when no binding covers it (the root
/// segment of a dotted name is what binds).
fn note_use(name: &str, bound: &FxHashSet<String>, free: &mut Vec<String>) {
    let root = name.split('.').next().unwrap_or(name);
    if !bound.contains(root) && !free.iter().any(|f| f == root) {
        free.push(root.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_ir::{Position, Span};

    fn sp() -> Span {
        Span::point(Position::ORIGIN)
    }

    fn name(n: &str) -> Expr {
        Expr::Name { name: n.to_string(), span: sp() }
    }

    fn block(statements: Vec<Stmt>) -> Block {
        Block { statements, span: sp() }
    }

    #[test]
    fn let_binds_for_later_statements() {
        let b = block(vec![
            Stmt::Let { name: "x".into(), expr: name("seed"), span: sp() },
            Stmt::Return { expr: name("x"), span: sp() },
        ]);
        assert_eq!(free_names(&b, &[]), vec!["seed"]);
    }

    #[test]
    fn use_before_binding_is_free() {
        let b = block(vec![
            Stmt::Return { expr: name("x"), span: sp() },
            Stmt::Let { name: "x".into(), expr: name("y"), span: sp() },
        ]);
        assert_eq!(free_names(&b, &[]), vec!["x", "y"]);
    }

    #[test]
    fn pattern_bindings_scope_to_their_case() {
        let case_body = block(vec![Stmt::Return { expr: name("v"), span: sp() }]);
        let b = block(vec![Stmt::Match {
            expr: name("subject"),
            cases: vec![aster_ir::MatchCase {
                pattern: Pattern::Ctor {
                    type_name: "Some".into(),
                    names: vec!["v".into()],
                    span: sp(),
                },
                body: case_body,
                span: sp(),
            }],
            span: sp(),
        }]);
        assert_eq!(free_names(&b, &[]), vec!["subject"]);
    }

    #[test]
    fn dotted_names_bind_by_root() {
        let b = block(vec![Stmt::Return {
            expr: Expr::Call {
                target: Box::new(name("client.fetch")),
                args: vec![],
                span: sp(),
            },
            span: sp(),
        }]);
        assert_eq!(free_names(&b, &["client".to_string()]), Vec::<String>::new());
        assert_eq!(free_names(&b, &[]), vec!["client"]);
    }

    #[test]
    fn first_use_order_is_stable() {
        let b = block(vec![Stmt::Return {
            expr: Expr::Call {
                target: Box::new(name("f")),
                args: vec![name("b"), name("a"), name("b")],
                span: sp(),
            },
            span: sp(),
        }]);
        assert_eq!(free_names(&b, &[]), vec!["f", "b", "a"]);
    }
}
