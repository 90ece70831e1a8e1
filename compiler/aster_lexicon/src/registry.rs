//! Process-wide lexicon registry.
//!
//! Initialized with the built-in locales on first access and effectively
//! immutable afterwards; the only sanctioned mutation outside startup is
//! [`reset`], which tests use to restore the seeded state. Lexicons are
//! handed out as `Arc`s — no per-document state lives here.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::locales::{english, german, simplified_chinese};
use crate::Lexicon;

struct Registry {
    lexicons: FxHashMap<String, Arc<Lexicon>>,
    default_id: String,
}

impl Registry {
    fn seeded() -> Self {
        let mut lexicons = FxHashMap::default();
        for lexicon in [english(), simplified_chinese(), german()] {
            lexicons.insert(lexicon.id.clone(), Arc::new(lexicon));
        }
        Registry {
            lexicons,
            default_id: "en".to_string(),
        }
    }
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::seeded()));

/// Register (or replace) a lexicon.
pub fn register(lexicon: Lexicon) {
    let mut registry = REGISTRY.write();
    registry.lexicons.insert(lexicon.id.clone(), Arc::new(lexicon));
}

/// Look up a lexicon by id.
pub fn get(id: &str) -> Option<Arc<Lexicon>> {
    REGISTRY.read().lexicons.get(id).cloned()
}

/// Change the process default. Returns false when `id` is unknown.
pub fn set_default(id: &str) -> bool {
    let mut registry = REGISTRY.write();
    if registry.lexicons.contains_key(id) {
        registry.default_id = id.to_string();
        true
    } else {
        false
    }
}

/// The current default lexicon.
pub fn get_default() -> Arc<Lexicon> {
    let registry = REGISTRY.read();
    registry
        .lexicons
        .get(&registry.default_id)
        .cloned()
        .unwrap_or_else(|| Arc::new(english()))
}

/// Registered locale ids, sorted.
pub fn locale_ids() -> Vec<String> {
    let mut ids: Vec<String> = REGISTRY.read().lexicons.keys().cloned().collect();
    ids.sort();
    ids
}

/// Restore the seeded built-in state. Test use only.
pub fn reset() {
    *REGISTRY.write() = Registry::seeded();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_seeded() {
        reset();
        assert!(get("en").is_some());
        assert!(get("zh-CN").is_some());
        assert!(get("de").is_some());
        assert!(get("fr").is_none());
    }

    #[test]
    fn default_follows_set_default() {
        reset();
        assert_eq!(get_default().id, "en");
        assert!(!set_default("xx"));
        assert!(set_default("de"));
        assert_eq!(get_default().id, "de");
        reset();
        assert_eq!(get_default().id, "en");
    }

    #[test]
    fn locale_ids_sorted() {
        reset();
        let ids = locale_ids();
        assert_eq!(ids, vec!["de", "en", "zh-CN"]);
    }
}
