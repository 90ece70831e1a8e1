//! English locale — the canonical vocabulary.

use rustc_hash::FxHashMap;

use crate::{
    Canonicalization, InferenceRule, InferredType, KeywordKind, Lexicon, Punctuation,
    StringQuotes, WhitespaceMode,
};

/// Name-based inference overlays for English identifiers: booleans and
/// datetime-ish suffixes.
fn inference_overlays() -> Vec<InferenceRule> {
    let rule = |pattern: &str, ty, priority| InferenceRule {
        pattern: pattern.to_string(),
        ty,
        priority,
    };
    vec![
        rule("^(is|has|can|should|allow)[A-Z_].*$", InferredType::Bool, 20),
        rule("^(is|has|can|should|allow)$", InferredType::Bool, 20),
        rule(".*(Flag|Enabled|Active)$", InferredType::Bool, 20),
        rule(".*(Date|Time|Timestamp|Created|Updated|Modified)$", InferredType::DateTime, 15),
        rule(".*At$", InferredType::DateTime, 15),
    ]
}

/// The English lexicon.
pub fn english() -> Lexicon {
    let mut keywords = FxHashMap::default();
    for kind in KeywordKind::ALL {
        keywords.insert(kind, kind.english().to_string());
    }

    let punctuation = Punctuation {
        statement_end: '.',
        list_separator: ',',
        enum_separator: ',',
        block_start: ':',
        string_quotes: StringQuotes { open: '"', close: '"' },
        markers: None,
    };

    let canonicalization = Canonicalization {
        whitespace_mode: WhitespaceMode::Ascii,
        full_width_to_half: false,
        remove_articles: true,
        articles: vec!["a".to_string(), "an".to_string(), "the".to_string()],
        custom_rules: Vec::new(),
        allowed_duplicates: Vec::new(),
        compound_patterns: Vec::new(),
    };

    Lexicon::new("en", "English", keywords, punctuation, canonicalization)
        .with_inference_rules(inference_overlays())
}
