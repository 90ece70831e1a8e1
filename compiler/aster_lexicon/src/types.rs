//! Lexicon value types.

use rustc_hash::FxHashMap;

use crate::KeywordKind;

/// How whitespace behaves in the locale's script.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum WhitespaceMode {
    /// Space-separated words; runs of spaces collapse.
    Ascii,
    /// CJK text: no space requirement between words, whitespace before
    /// punctuation is dropped entirely.
    Chinese,
}

/// String delimiter pair, e.g. `"…"` or `「…」`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct StringQuotes {
    pub open: char,
    pub close: char,
}

/// Bracket pair wrapping marker keywords, e.g. `【定义】`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Markers {
    pub open: char,
    pub close: char,
}

/// Locale punctuation configuration.
#[derive(Clone, PartialEq, Debug)]
pub struct Punctuation {
    pub statement_end: char,
    pub list_separator: char,
    pub enum_separator: char,
    pub block_start: char,
    pub string_quotes: StringQuotes,
    pub markers: Option<Markers>,
}

/// A regex rewrite applied during canonicalization (outside strings).
#[derive(Clone, PartialEq, Debug)]
pub struct CustomRule {
    pub pattern: String,
    pub replacement: String,
}

/// Resolution table for a localized word that maps to several English roles.
///
/// `contexts` pairs the English keyword value of the second-to-last emitted
/// token with the translation to choose when it matches; `default` applies
/// otherwise.
#[derive(Clone, PartialEq, Debug)]
pub struct DuplicateRule {
    pub word: String,
    pub contexts: Vec<(String, String)>,
    pub default: String,
}

/// An opener keyword whose meaning depends on contextual keywords appearing
/// later, possibly on following lines (e.g. `若 … 为` reads as
/// `match … when`, plain `若` as `if`).
#[derive(Clone, PartialEq, Debug)]
pub struct CompoundPattern {
    pub opener: String,
    pub contextual: Vec<String>,
    pub opener_english: String,
    pub contextual_english: String,
}

/// A name-pattern type-inference overlay rule supplied by the locale.
#[derive(Clone, PartialEq, Debug)]
pub struct InferenceRule {
    pub pattern: String,
    pub ty: InferredType,
    pub priority: i32,
}

/// Primitive types the inference helpers can produce.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum InferredType {
    Text,
    Int,
    Float,
    Bool,
    DateTime,
}

impl InferredType {
    /// Surface type name, as the parser spells it.
    pub fn type_name(self) -> &'static str {
        match self {
            InferredType::Text => "Text",
            InferredType::Int => "Int",
            InferredType::Float => "Float",
            InferredType::Bool => "Bool",
            InferredType::DateTime => "DateTime",
        }
    }
}

/// Canonicalization configuration for a locale.
#[derive(Clone, PartialEq, Debug)]
pub struct Canonicalization {
    pub whitespace_mode: WhitespaceMode,
    pub full_width_to_half: bool,
    pub remove_articles: bool,
    pub articles: Vec<String>,
    pub custom_rules: Vec<CustomRule>,
    pub allowed_duplicates: Vec<DuplicateRule>,
    pub compound_patterns: Vec<CompoundPattern>,
}

impl Default for Canonicalization {
    fn default() -> Self {
        Canonicalization {
            whitespace_mode: WhitespaceMode::Ascii,
            full_width_to_half: false,
            remove_articles: false,
            articles: Vec::new(),
            custom_rules: Vec::new(),
            allowed_duplicates: Vec::new(),
            compound_patterns: Vec::new(),
        }
    }
}

/// One locale's complete configuration.
#[derive(Clone, PartialEq, Debug)]
pub struct Lexicon {
    pub id: String,
    pub name: String,
    keywords: FxHashMap<KeywordKind, String>,
    pub punctuation: Punctuation,
    pub canonicalization: Canonicalization,
    pub inference_rules: Vec<InferenceRule>,
}

impl Lexicon {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        keywords: FxHashMap<KeywordKind, String>,
        punctuation: Punctuation,
        canonicalization: Canonicalization,
    ) -> Self {
        Lexicon {
            id: id.into(),
            name: name.into(),
            keywords,
            punctuation,
            canonicalization,
            inference_rules: Vec::new(),
        }
    }

    /// Localized spelling for a keyword kind, if the locale defines one.
    pub fn keyword(&self, kind: KeywordKind) -> Option<&str> {
        self.keywords.get(&kind).map(String::as_str)
    }

    /// Iterate `(kind, localized spelling)` pairs.
    pub fn keywords(&self) -> impl Iterator<Item = (KeywordKind, &str)> {
        self.keywords.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// All keyword phrases containing whitespace, longest first.
    ///
    /// Sorted descending by character length so greedy matching prefers
    /// the most specific phrase (`as one of` before `as`).
    pub fn multi_word_keywords(&self) -> Vec<&str> {
        let mut phrases: Vec<&str> = self
            .keywords
            .values()
            .map(String::as_str)
            .filter(|v| v.contains(char::is_whitespace))
            .collect();
        phrases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        phrases
    }

    /// The compound pattern whose opener matches `word`, if any.
    pub fn compound_for_opener(&self, word: &str) -> Option<&CompoundPattern> {
        self.canonicalization
            .compound_patterns
            .iter()
            .find(|p| p.opener == word)
    }

    /// The duplicate-resolution rule for `word`, if any.
    pub fn duplicate_rule(&self, word: &str) -> Option<&DuplicateRule> {
        self.canonicalization
            .allowed_duplicates
            .iter()
            .find(|r| r.word == word)
    }

    pub fn with_inference_rules(mut self, rules: Vec<InferenceRule>) -> Self {
        self.inference_rules = rules;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locales::english;

    #[test]
    fn multi_word_keywords_longest_first() {
        let lexicon = english();
        let phrases = lexicon.multi_word_keywords();
        assert!(phrases.contains(&"as one of"));
        assert!(phrases.contains(&"this module is"));
        let as_one_of = phrases.iter().position(|p| *p == "as one of");
        let wait_for = phrases.iter().position(|p| *p == "wait for");
        assert!(as_one_of < wait_for, "longer phrase must sort first");
    }

    #[test]
    fn keyword_lookup() {
        let lexicon = english();
        assert_eq!(lexicon.keyword(KeywordKind::Produce), Some("produce"));
        assert_eq!(lexicon.keyword(KeywordKind::Performs), Some("it performs"));
    }
}
