//! Declared-vs-required effect checking and capability enforcement.

use aster_diagnostic::{sort_by_position, DiagCode, Diagnostic};
use aster_ir::{
    Capability, CoreBlock, CoreDecl, CoreExpr, CoreFunc, CoreModule, CoreStmt, Effect, Span,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::{check_exhaustiveness, CapabilityManifest, EffectTable};

/// The full semantic check: effects, capabilities, manifest policy, and the
/// exhaustiveness hint, with the built-in signature table.
pub fn typecheck_module_with_capabilities(
    core: &CoreModule,
    manifest: Option<&CapabilityManifest>,
) -> Vec<Diagnostic> {
    let mut diags = check_effects(core, &EffectTable::builtin(), manifest);
    diags.extend(check_exhaustiveness(core));
    sort_by_position(&mut diags);
    diags
}

/// Effect/capability analysis with an explicit signature table.
///
/// Never fails; analyzes the whole module even when early functions have
/// problems.
pub fn check_effects(
    core: &CoreModule,
    table: &EffectTable,
    manifest: Option<&CapabilityManifest>,
) -> Vec<Diagnostic> {
    let checker = Checker::new(core, table);
    let mut diags = Vec::new();
    for decl in &core.decls {
        if let CoreDecl::Func(func) = decl {
            checker.check_func(func, manifest, &mut diags);
        }
    }
    sort_by_position(&mut diags);
    diags
}

/// Effects and capabilities a body actually needs.
#[derive(Clone, Default)]
struct Required {
    effects: Vec<Effect>,
    caps: Vec<Capability>,
}

impl Required {
    fn add_effect(&mut self, effect: Effect) {
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
    }

    fn add_cap(&mut self, cap: Capability) {
        if !self.caps.contains(&cap) {
            self.caps.push(cap);
        }
    }

    fn merge(&mut self, other: &Required) {
        for effect in &other.effects {
            self.add_effect(*effect);
        }
        for cap in &other.caps {
            self.add_cap(*cap);
        }
    }
}

struct Checker<'a> {
    funcs: FxHashMap<&'a str, &'a CoreFunc>,
    table: &'a EffectTable,
    module_name: String,
}

impl<'a> Checker<'a> {
    fn new(core: &'a CoreModule, table: &'a EffectTable) -> Self {
        let mut funcs = FxHashMap::default();
        for decl in &core.decls {
            if let CoreDecl::Func(func) = decl {
                funcs.insert(func.name.as_str(), func);
            }
        }
        Checker {
            funcs,
            table,
            module_name: core.name.clone().unwrap_or_else(|| "module".to_string()),
        }
    }

    fn check_func(
        &self,
        func: &'a CoreFunc,
        manifest: Option<&CapabilityManifest>,
        diags: &mut Vec<Diagnostic>,
    ) {
        debug!(func = %func.name, "checking effects");
        let qualified = format!("{}.{}", self.module_name, func.name);

        if let Some(body) = &func.body {
            let mut visiting = FxHashSet::default();
            visiting.insert(func.name.as_str());
            let required = self.required_of_block(body, &mut visiting);

            for effect in &required.effects {
                if !func.effects.contains(effect) {
                    diags.push(
                        Diagnostic::error(
                            format!(
                                "function `{}` performs `{effect}` but does not declare it",
                                func.name
                            ),
                            func.name_span,
                        )
                        .with_code(DiagCode::missing_effect(*effect))
                        .with_data("function", &func.name)
                        .with_data("effect", effect.as_str()),
                    );
                }
            }
            for effect in &func.effects {
                if !required.effects.contains(effect) {
                    diags.push(
                        Diagnostic::error(
                            format!(
                                "function `{}` declares `{effect}` but never performs it",
                                func.name
                            ),
                            func.name_span,
                        )
                        .with_code(DiagCode::superfluous_effect(*effect))
                        .with_data("function", &func.name)
                        .with_data("effect", effect.as_str()),
                    );
                }
            }

            // Capability enforcement over direct call sites.
            for (callee, span) in call_sites(body) {
                for cap in self.caps_of_call(&callee) {
                    if !func.effect_caps.contains(&cap) {
                        diags.push(
                            Diagnostic::error(
                                format!(
                                    "call to `{callee}` needs capability {cap}, which `{}` does not hold",
                                    func.name
                                ),
                                span,
                            )
                            .with_code(DiagCode::CapabilityNotAllowed)
                            .with_data("function", &func.name)
                            .with_data("capability", cap.as_str()),
                        );
                    }
                }
            }
        }

        if let Some(manifest) = manifest {
            if !func.effect_caps.is_empty() {
                if manifest.denies(&qualified) {
                    diags.push(
                        Diagnostic::error(
                            format!(
                                "function `{qualified}` holds capabilities denied by the capability manifest"
                            ),
                            func.name_span,
                        )
                        .with_code(DiagCode::CapabilityManifest)
                        .with_data("function", &qualified)
                        .with_data("module", &self.module_name),
                    );
                } else if !manifest.allows(&qualified) {
                    diags.push(
                        Diagnostic::error(
                            format!(
                                "function `{qualified}` is not allowed capabilities by the capability manifest"
                            ),
                            func.name_span,
                        )
                        .with_code(DiagCode::CapabilityManifest)
                        .with_data("function", &qualified)
                        .with_data("module", &self.module_name),
                    );
                }
            }
        }
    }

    /// Capabilities a direct call needs: a built-in's signature capability,
    /// or everything a local callee actually requires.
    fn caps_of_call(&self, callee: &str) -> Vec<Capability> {
        if let Some((_, cap)) = self.table.lookup(callee) {
            return vec![cap];
        }
        match self.funcs.get(callee) {
            Some(local) => {
                let mut visiting = FxHashSet::default();
                self.required_of_func(local, &mut visiting).caps
            }
            None => Vec::new(),
        }
    }

    /// Transitive requirement of a function: its body when present, its
    /// declaration otherwise.
    fn required_of_func(&self, func: &CoreFunc, visiting: &mut FxHashSet<&'a str>) -> Required {
        let Some(name) = self.funcs.get_key_value(func.name.as_str()).map(|(k, _)| *k) else {
            return Required::default();
        };
        if !visiting.insert(name) {
            // Cycle: the other frame accounts for this function.
            return Required::default();
        }
        let result = match &func.body {
            Some(body) => self.required_of_block(body, visiting),
            None => {
                let mut req = Required::default();
                for effect in &func.effects {
                    req.add_effect(*effect);
                }
                for cap in &func.effect_caps {
                    req.add_cap(*cap);
                }
                req
            }
        };
        visiting.remove(name);
        result
    }

    fn required_of_block(&self, body: &CoreBlock, visiting: &mut FxHashSet<&'a str>) -> Required {
        let mut required = Required::default();
        for (callee, _) in call_sites(body) {
            if let Some((effect, cap)) = self.table.lookup(&callee) {
                required.add_effect(effect);
                required.add_cap(cap);
                continue;
            }
            if let Some(local) = self.funcs.get(callee.as_str()) {
                for effect in &local.effects {
                    required.add_effect(*effect);
                }
                required.merge(&self.required_of_func(local, visiting));
            }
        }
        required
    }
}

/// Every call target name in a body, nested expressions and lambda bodies
/// included, in source order.
fn call_sites(body: &CoreBlock) -> Vec<(String, Span)> {
    let mut sites = Vec::new();
    for stmt in &body.statements {
        stmt_calls(stmt, &mut sites);
    }
    sites
}

fn stmt_calls(stmt: &CoreStmt, sites: &mut Vec<(String, Span)>) {
    match stmt {
        CoreStmt::Let { expr, .. }
        | CoreStmt::Set { expr, .. }
        | CoreStmt::Return { expr, .. }
        | CoreStmt::Start { expr, .. } => expr_calls(expr, sites),
        CoreStmt::If { cond, then_block, else_block, .. } => {
            expr_calls(cond, sites);
            for stmt in &then_block.statements {
                stmt_calls(stmt, sites);
            }
            if let Some(block) = else_block {
                for stmt in &block.statements {
                    stmt_calls(stmt, sites);
                }
            }
        }
        CoreStmt::Match { expr, cases, .. } => {
            expr_calls(expr, sites);
            for case in cases {
                for stmt in &case.body.statements {
                    stmt_calls(stmt, sites);
                }
            }
        }
        CoreStmt::Scope { statements, .. } => {
            for stmt in statements {
                stmt_calls(stmt, sites);
            }
        }
        CoreStmt::Wait { .. } => {}
    }
}

fn expr_calls(expr: &CoreExpr, sites: &mut Vec<(String, Span)>) {
    match expr {
        CoreExpr::Call { target, args, span } => {
            if let Some(name) = target.target_name() {
                sites.push((name.to_string(), *span));
            } else {
                expr_calls(target, sites);
            }
            for arg in args {
                expr_calls(arg, sites);
            }
        }
        CoreExpr::Some { expr, .. }
        | CoreExpr::Ok { expr, .. }
        | CoreExpr::Err { expr, .. }
        | CoreExpr::Await { expr, .. } => expr_calls(expr, sites),
        CoreExpr::Construct { fields, .. } => {
            for field in fields {
                expr_calls(&field.value, sites);
            }
        }
        CoreExpr::Lambda { body, .. } => {
            for stmt in &body.statements {
                stmt_calls(stmt, sites);
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

    fn codes(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().filter_map(|d| d.code.map(|c| c.as_str())).collect()
    }

    #[test]
    fn undeclared_io_is_missing() {
        let core = lower_en(
            "Rule fetch given url: Text, produce Text:\n  Return Http.get(url).\n",
        );
        let diags = typecheck_module_with_capabilities(&core, None);
        assert!(codes(&diags).contains(&"EFF_MISSING_IO"));
        // Also missing the HTTP capability, since none were derived.
        assert!(codes(&diags).contains(&"CAPABILITY_NOT_ALLOWED"));
    }

    #[test]
    fn declared_io_is_clean() {
        let core = lower_en(
            "Rule fetch given url: Text, produce Text. It performs io:\n  Return Http.get(url).\n",
        );
        let diags = typecheck_module_with_capabilities(&core, None);
        assert!(diags.is_empty(), "got {diags:?}");
    }

    #[test]
    fn unused_declared_effect_is_superfluous() {
        let core = lower_en(
            "Rule pure given x: Int, produce Int. It performs io:\n  Return x.\n",
        );
        let diags = typecheck_module_with_capabilities(&core, None);
        assert_eq!(codes(&diags), vec!["EFF_SUPERFLUOUS_IO"]);
    }

    #[test]
    fn transitive_effects_through_local_calls() {
        let core = lower_en(
            "Rule inner given url: Text, produce Text. It performs io:\n  Return Http.get(url).\nRule outer given url: Text, produce Text:\n  Return inner(url).\n",
        );
        let diags = typecheck_module_with_capabilities(&core, None);
        let missing: Vec<_> = diags
            .iter()
            .filter(|d| d.code == Some(DiagCode::EffMissingIo))
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].data_value("function"), Some("outer"));
    }

    #[test]
    fn explicit_caps_must_cover_calls() {
        let core = lower_en(
            "Rule mixed given url: Text, produce Text. It performs io [Sql]:\n  Return Http.get(url).\n",
        );
        let diags = typecheck_module_with_capabilities(&core, None);
        let cap_diags: Vec<_> = diags
            .iter()
            .filter(|d| d.code == Some(DiagCode::CapabilityNotAllowed))
            .collect();
        assert_eq!(cap_diags.len(), 1);
        assert_eq!(cap_diags[0].data_value("capability"), Some("HTTP"));
    }

    #[test]
    fn recursion_terminates() {
        let core = lower_en(
            "Rule ping given n: Int, produce Int:\n  Return pong(n).\nRule pong given n: Int, produce Int:\n  Return ping(n).\n",
        );
        let diags = typecheck_module_with_capabilities(&core, None);
        assert!(diags.is_empty(), "got {diags:?}");
    }

    #[test]
    fn manifest_deny_rejects() {
        let core = lower_en(
            "This module is demo.net.\nRule fetch given url: Text, produce Text. It performs io:\n  Return Http.get(url).\n",
        );
        let manifest =
            CapabilityManifest::from_json(r#"{ "allow": [], "deny": ["demo.net.fetch"] }"#)
                .unwrap();
        let diags = typecheck_module_with_capabilities(&core, Some(&manifest));
        let manifest_diags: Vec<_> = diags
            .iter()
            .filter(|d| d.code == Some(DiagCode::CapabilityManifest))
            .collect();
        assert_eq!(manifest_diags.len(), 1);
        assert!(manifest_diags[0].message.contains("capability manifest"));
        assert_eq!(manifest_diags[0].data_value("function"), Some("demo.net.fetch"));
    }

    #[test]
    fn manifest_wildcard_allows_module() {
        let core = lower_en(
            "This module is demo.net.\nRule fetch given url: Text, produce Text. It performs io:\n  Return Http.get(url).\n",
        );
        let manifest =
            CapabilityManifest::from_json(r#"{ "allow": ["demo.net.*"], "deny": [] }"#).unwrap();
        let diags = typecheck_module_with_capabilities(&core, Some(&manifest));
        assert!(diags.is_empty(), "got {diags:?}");
    }

    #[test]
    fn manifest_allow_list_excludes_others() {
        let core = lower_en(
            "This module is demo.net.\nRule fetch given url: Text, produce Text. It performs io:\n  Return Http.get(url).\n",
        );
        let manifest =
            CapabilityManifest::from_json(r#"{ "allow": ["other.mod.*"], "deny": [] }"#).unwrap();
        let diags = typecheck_module_with_capabilities(&core, Some(&manifest));
        assert!(codes(&diags).contains(&"CAPABILITY_MANIFEST"));
    }

    #[test]
    fn pure_functions_ignore_manifest() {
        let core = lower_en("Rule pure given x: Int, produce Int:\n  Return x.\n");
        let manifest =
            CapabilityManifest::from_json(r#"{ "allow": ["nothing.*"], "deny": [] }"#).unwrap();
        let diags = typecheck_module_with_capabilities(&core, Some(&manifest));
        assert!(diags.is_empty(), "got {diags:?}");
    }
}
