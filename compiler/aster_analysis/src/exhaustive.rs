//! Match-exhaustiveness hints over closed enums.
//!
//! A match whose cases are all constructors of one declared enum, with no
//! binding or null catch-all, should cover every variant. Non-exhaustive
//! matches get a warning, never a hard error.

use aster_diagnostic::{sort_by_position, DiagCode, Diagnostic};
use aster_ir::{CoreBlock, CoreDecl, CoreModule, CorePattern, CoreStmt};
use rustc_hash::FxHashMap;

pub fn check_exhaustiveness(core: &CoreModule) -> Vec<Diagnostic> {
    let mut enums: FxHashMap<&str, (&str, &Vec<String>)> = FxHashMap::default();
    for decl in &core.decls {
        if let CoreDecl::Enum(e) = decl {
            for variant in &e.variants {
                enums.insert(variant.as_str(), (e.name.as_str(), &e.variants));
            }
        }
    }

    let mut diags = Vec::new();
    for decl in &core.decls {
        if let CoreDecl::Func(func) = decl {
            if let Some(body) = &func.body {
                check_block(body, &enums, &mut diags);
            }
        }
    }
    sort_by_position(&mut diags);
    diags
}

fn check_block(
    block: &CoreBlock,
    enums: &FxHashMap<&str, (&str, &Vec<String>)>,
    diags: &mut Vec<Diagnostic>,
) {
    for stmt in &block.statements {
        check_stmt(stmt, enums, diags);
    }
}

fn check_stmt(
    stmt: &CoreStmt,
    enums: &FxHashMap<&str, (&str, &Vec<String>)>,
    diags: &mut Vec<Diagnostic>,
) {
    match stmt {
        CoreStmt::Match { cases, span, .. } => {
            for case in cases {
                check_block(&case.body, enums, diags);
            }

            let mut covered: Vec<&str> = Vec::new();
            let mut enum_info: Option<(&str, &Vec<String>)> = None;
            for case in cases {
                match &case.pattern {
                    CorePattern::PatCtor { type_name, .. } => {
                        let Some(info) = enums.get(type_name.as_str()) else { return };
                        match enum_info {
                            None => enum_info = Some(*info),
                            Some((name, _)) if name == info.0 => {}
                            // Mixed enums: not our hint to give.
                            Some(_) => return,
                        }
                        covered.push(type_name.as_str());
                    }
                    // A binding or null case catches everything else.
                    CorePattern::PatName { .. } | CorePattern::PatNull { .. } => return,
                    CorePattern::PatInt { .. } => return,
                }
            }
            let Some((enum_name, variants)) = enum_info else { return };
            let missing: Vec<&str> = variants
                .iter()
                .map(String::as_str)
                .filter(|v| !covered.contains(v))
                .collect();
            if !missing.is_empty() {
                diags.push(
                    Diagnostic::warning(
                        format!(
                            "match over `{enum_name}` does not cover: {}",
                            missing.join(", ")
                        ),
                        *span,
                    )
                    .with_code(DiagCode::MatchNotExhaustive)
                    .with_data("enum", enum_name),
                );
            }
        }
        CoreStmt::If { then_block, else_block, .. } => {
            check_block(then_block, enums, diags);
            if let Some(block) = else_block {
                check_block(block, enums, diags);
            }
        }
        CoreStmt::Scope { statements, .. } => {
            for stmt in statements {
                check_stmt(stmt, enums, diags);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use aster_canon::canonicalize;
    use aster_lexer::lex;
    use aster_lexicon::english;

    fn lower_en(source: &str) -> CoreModule {
        let en = english();
        let canonical = canonicalize(source, &en);
        let tokens = lex(&canonical, &en).unwrap();
        let module = aster_parse::parse(&tokens).unwrap();
        aster_lower::lower_module(&module).unwrap()
    }

    #[test]
    fn missing_variant_is_hinted() {
        let core = lower_en(
            "Define Status as one of Active, Paused, Closed.\nRule s given v: Status, produce Int:\n  Match v:\n    When Active, Return 1.\n    When Paused, Return 2.\n  Return 0.\n",
        );
        let diags = check_exhaustiveness(&core);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("Closed"));
        assert_eq!(diags[0].severity, aster_diagnostic::Severity::Warning);
    }

    #[test]
    fn full_coverage_is_silent() {
        let core = lower_en(
            "Define Status as one of Active, Closed.\nRule s given v: Status, produce Int:\n  Match v:\n    When Active, Return 1.\n    When Closed, Return 2.\n  Return 0.\n",
        );
        assert!(check_exhaustiveness(&core).is_empty());
    }

    #[test]
    fn binding_case_is_a_catch_all() {
        let core = lower_en(
            "Define Status as one of Active, Paused, Closed.\nRule s given v: Status, produce Int:\n  Match v:\n    When Active, Return 1.\n    When other, Return 0.\n  Return 0.\n",
        );
        assert!(check_exhaustiveness(&core).is_empty());
    }
}
