//! Capability manifest: allow/deny policy over qualified function names.

use serde::Deserialize;

/// `{ "allow": ["module.func", "module.*"], "deny": [...] }`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CapabilityManifest {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

impl CapabilityManifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether `qualified` (`module.func`) matches any allow entry.
    /// An empty allow list permits everything.
    pub fn allows(&self, qualified: &str) -> bool {
        self.allow.is_empty() || self.allow.iter().any(|p| pattern_matches(p, qualified))
    }

    /// Whether `qualified` matches any deny entry.
    pub fn denies(&self, qualified: &str) -> bool {
        self.deny.iter().any(|p| pattern_matches(p, qualified))
    }
}

/// `module.*` matches every function in `module`; anything else is exact.
fn pattern_matches(pattern: &str, qualified: &str) -> bool {
    match pattern.strip_suffix(".*") {
        Some(prefix) => qualified
            .rsplit_once('.')
            .is_some_and(|(module, _)| module == prefix),
        None => pattern == qualified,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_wildcard_patterns() {
        assert!(pattern_matches("demo.send", "demo.send"));
        assert!(!pattern_matches("demo.send", "demo.send2"));
        assert!(pattern_matches("demo.*", "demo.send"));
        assert!(!pattern_matches("demo.*", "other.send"));
        assert!(!pattern_matches("demo.*", "demo.sub.send"));
    }

    #[test]
    fn empty_allow_permits_everything() {
        let manifest = CapabilityManifest::default();
        assert!(manifest.allows("any.func"));
        assert!(!manifest.denies("any.func"));
    }

    #[test]
    fn parses_from_json() {
        let manifest =
            CapabilityManifest::from_json(r#"{ "allow": ["demo.*"], "deny": ["demo.bad"] }"#)
                .unwrap();
        assert!(manifest.allows("demo.good"));
        assert!(manifest.denies("demo.bad"));
        assert!(!manifest.allows("other.func"));
    }
}
