//! German locale.
//!
//! Carries custom rules folding ASCII digraph spellings into umlauts
//! (`zurueck` → `zurück`), German quotation marks (`„…“`), and article
//! removal for `der`/`die`/`das` and the indefinite forms.

use rustc_hash::FxHashMap;

use crate::{
    Canonicalization, CustomRule, KeywordKind, Lexicon, Punctuation, StringQuotes,
    WhitespaceMode,
};

/// The German lexicon (`de`).
pub fn german() -> Lexicon {
    let pairs: &[(KeywordKind, &str)] = &[
        (KeywordKind::ModuleDecl, "dieses modul ist"),
        (KeywordKind::Import, "verwende"),
        (KeywordKind::As, "als"),
        (KeywordKind::Define, "definiere"),
        (KeywordKind::With, "mit"),
        (KeywordKind::Has, "hat"),
        (KeywordKind::AsOneOf, "als eines von"),
        (KeywordKind::Rule, "regel"),
        (KeywordKind::To, "zu"),
        (KeywordKind::Of, "von"),
        (KeywordKind::Given, "gegeben"),
        (KeywordKind::Produce, "erzeuge"),
        (KeywordKind::Performs, "es verwendet"),
        (KeywordKind::Return, "zurück"),
        (KeywordKind::Let, "sei"),
        (KeywordKind::Be, "gleich"),
        (KeywordKind::Set, "setze"),
        (KeywordKind::If, "falls"),
        (KeywordKind::Otherwise, "sonst"),
        (KeywordKind::Match, "prüfe"),
        (KeywordKind::When, "wenn"),
        (KeywordKind::Not, "nicht"),
        (KeywordKind::And, "und"),
        (KeywordKind::Or, "oder"),
        (KeywordKind::Start, "starte"),
        (KeywordKind::Wait, "warte auf"),
        (KeywordKind::WithinScope, "im bereich"),
        (KeywordKind::Function, "funktion"),
        (KeywordKind::Await, "erwarte"),
        (KeywordKind::OptionType, "option"),
        (KeywordKind::ResultType, "ergebnis"),
        (KeywordKind::ListType, "liste"),
        (KeywordKind::MapType, "zuordnung"),
        (KeywordKind::Required, "erforderlich"),
        (KeywordKind::Between, "zwischen"),
        (KeywordKind::Matching, "passend zu"),
        (KeywordKind::GreaterThan, "größer als"),
        (KeywordKind::LessThan, "kleiner als"),
        (KeywordKind::True, "wahr"),
        (KeywordKind::False, "falsch"),
        (KeywordKind::Null, "null"),
        (KeywordKind::NoneKw, "nichts"),
        (KeywordKind::SomeKw, "etwas"),
        (KeywordKind::OkKw, "ok"),
        (KeywordKind::ErrKw, "fehler"),
    ];
    let mut keywords = FxHashMap::default();
    for (kind, word) in pairs {
        keywords.insert(*kind, (*word).to_string());
    }

    let punctuation = Punctuation {
        statement_end: '.',
        list_separator: ',',
        enum_separator: ',',
        block_start: ':',
        string_quotes: StringQuotes { open: '„', close: '“' },
        markers: None,
    };

    let umlaut = |pattern: &str, replacement: &str| CustomRule {
        pattern: pattern.to_string(),
        replacement: replacement.to_string(),
    };
    let canonicalization = Canonicalization {
        whitespace_mode: WhitespaceMode::Ascii,
        full_width_to_half: false,
        remove_articles: true,
        articles: ["der", "die", "das", "ein", "eine", "einen"]
            .iter()
            .map(|a| (*a).to_string())
            .collect(),
        custom_rules: vec![
            umlaut(r"\bzurueck\b", "zurück"),
            umlaut(r"\bgroesser\b", "größer"),
            umlaut(r"\bpruefe\b", "prüfe"),
        ],
        allowed_duplicates: Vec::new(),
        compound_patterns: Vec::new(),
    };

    Lexicon::new("de", "Deutsch", keywords, punctuation, canonicalization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umlaut_rules_present() {
        let lexicon = german();
        assert!(lexicon
            .canonicalization
            .custom_rules
            .iter()
            .any(|r| r.replacement == "zurück"));
    }

    #[test]
    fn return_keyword_uses_umlaut() {
        let lexicon = german();
        assert_eq!(lexicon.keyword(KeywordKind::Return), Some("zurück"));
    }
}
