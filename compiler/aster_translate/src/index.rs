//! Phrase index construction and caching.

use std::sync::Arc;

use aster_lexicon::{KeywordKind, Lexicon};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

#[derive(Clone, Debug)]
struct Entry {
    english: String,
    priority: u8,
}

/// Source-phrase → target-phrase index for one lexicon pair.
///
/// Keys are lowercased source phrases (1..N words, single-space joined).
#[derive(Clone, Debug, Default)]
pub struct PhraseIndex {
    entries: FxHashMap<String, Entry>,
    max_words: usize,
}

impl PhraseIndex {
    /// Build the index for a `(source, target)` pair.
    ///
    /// For every keyword kind defined in both lexicons this adds the whole
    /// phrase, per-word mappings when the word counts line up, and custom
    /// rule variants (so `zurueck` resolves even in un-canonicalized text).
    pub fn build(source: &Lexicon, target: &Lexicon) -> Self {
        let mut index = PhraseIndex::default();
        for kind in KeywordKind::ALL {
            let (Some(src), Some(tgt)) = (source.keyword(kind), target.keyword(kind)) else {
                continue;
            };
            let priority = kind.priority();
            index.add(src, tgt, priority);

            let src_words: Vec<&str> = src.split_whitespace().collect();
            let tgt_words: Vec<&str> = tgt.split_whitespace().collect();
            if src_words.len() == tgt_words.len() && src_words.len() > 1 {
                for (s, t) in src_words.iter().zip(&tgt_words) {
                    index.add(s, t, priority);
                }
            }

            for rule in &source.canonicalization.custom_rules {
                if let Some(literal) = literal_of(&rule.pattern) {
                    if src.contains(&rule.replacement) {
                        let variant = src.replace(&rule.replacement, &literal);
                        if variant != src {
                            index.add(&variant, tgt, priority);
                        }
                    }
                }
            }
        }
        index
    }

    fn add(&mut self, key: &str, english: &str, priority: u8) {
        let key = normalize_key(key);
        let words = key.split(' ').count();
        match self.entries.get(&key) {
            Some(existing) if existing.priority >= priority => {}
            _ => {
                self.entries.insert(
                    key,
                    Entry { english: english.to_string(), priority },
                );
            }
        }
        self.max_words = self.max_words.max(words);
    }

    /// Look up a lowercased phrase.
    pub fn lookup(&self, phrase: &str) -> Option<&str> {
        self.entries
            .get(&normalize_key(phrase))
            .map(|e| e.english.as_str())
    }

    /// Longest key length, in words.
    pub fn max_words(&self) -> usize {
        self.max_words.max(1)
    }
}

/// Lowercase and single-space a phrase key.
fn normalize_key(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the plain literal from a `\b`-anchored pattern, when it is one.
fn literal_of(pattern: &str) -> Option<String> {
    let stripped = pattern.replace("\\b", "");
    if !stripped.is_empty() && stripped.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Some(stripped)
    } else {
        None
    }
}

type PairKey = (String, String);

static INDEX_CACHE: Lazy<RwLock<FxHashMap<PairKey, Arc<PhraseIndex>>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Cached index for a lexicon pair, keyed by the two locale ids.
pub(crate) fn cached_index(source: &Lexicon, target: &Lexicon) -> Arc<PhraseIndex> {
    let key = (source.id.clone(), target.id.clone());
    if let Some(index) = INDEX_CACHE.read().get(&key) {
        return Arc::clone(index);
    }
    let built = Arc::new(PhraseIndex::build(source, target));
    INDEX_CACHE.write().insert(key, Arc::clone(&built));
    built
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_lexicon::{english, german, simplified_chinese};

    #[test]
    fn whole_phrase_lookup() {
        let index = PhraseIndex::build(&simplified_chinese(), &english());
        assert_eq!(index.lookup("模块"), Some("this module is"));
        assert_eq!(index.lookup("为以下之一"), Some("as one of"));
        assert_eq!(index.lookup("返回"), Some("return"));
    }

    #[test]
    fn custom_rule_variant_resolves() {
        let index = PhraseIndex::build(&german(), &english());
        assert_eq!(index.lookup("zurück"), Some("return"));
        assert_eq!(index.lookup("zurueck"), Some("return"));
    }

    #[test]
    fn per_word_mappings_when_counts_match() {
        let index = PhraseIndex::build(&german(), &english());
        // "dieses modul ist" ↔ "this module is": three words each.
        assert_eq!(index.lookup("modul"), Some("module"));
    }

    #[test]
    fn priority_breaks_duplicate_keys() {
        // `若` is claimed by both If (priority 2) and Match (priority 1);
        // the plain index resolves to `if`, the compound pass overrides.
        let index = PhraseIndex::build(&simplified_chinese(), &english());
        assert_eq!(index.lookup("若"), Some("if"));
    }

    #[test]
    fn identity_pair_maps_to_self() {
        let en = english();
        let index = PhraseIndex::build(&en, &en);
        assert_eq!(index.lookup("produce"), Some("produce"));
        assert_eq!(index.lookup("as one of"), Some("as one of"));
    }

    #[test]
    fn max_words_reflects_longest_key() {
        let index = PhraseIndex::build(&english(), &english());
        assert!(index.max_words() >= 3);
    }
}
