//! Simplified Chinese locale.
//!
//! Uses full-width punctuation (`。`, `，`, `、`, `：`), corner-bracket
//! string quotes (`「…」`), and `【…】` marker keywords. `若` and `为` are
//! context-dependent: `若 … 为` reads as `match … when`, `令 … 为` as
//! `let … be`.

use rustc_hash::FxHashMap;

use crate::{
    Canonicalization, CompoundPattern, DuplicateRule, KeywordKind, Lexicon, Markers,
    Punctuation, StringQuotes, WhitespaceMode,
};

/// The Simplified Chinese lexicon (`zh-CN`).
pub fn simplified_chinese() -> Lexicon {
    let pairs: &[(KeywordKind, &str)] = &[
        (KeywordKind::ModuleDecl, "模块"),
        (KeywordKind::Import, "引入"),
        (KeywordKind::As, "作为"),
        (KeywordKind::Define, "定义"),
        (KeywordKind::With, "包含"),
        (KeywordKind::Has, "拥有"),
        (KeywordKind::AsOneOf, "为以下之一"),
        (KeywordKind::Rule, "规则"),
        (KeywordKind::To, "至"),
        (KeywordKind::Of, "的"),
        (KeywordKind::Given, "包含"),
        (KeywordKind::Produce, "产出"),
        (KeywordKind::Performs, "它执行"),
        (KeywordKind::Return, "返回"),
        (KeywordKind::Let, "令"),
        (KeywordKind::Be, "为"),
        (KeywordKind::Set, "设置"),
        (KeywordKind::If, "若"),
        (KeywordKind::Otherwise, "否则"),
        (KeywordKind::Match, "若"),
        (KeywordKind::When, "为"),
        (KeywordKind::Not, "非"),
        (KeywordKind::And, "和"),
        (KeywordKind::Or, "或"),
        (KeywordKind::Start, "启动"),
        (KeywordKind::Wait, "等待"),
        (KeywordKind::WithinScope, "在作用域内"),
        (KeywordKind::Function, "函数"),
        (KeywordKind::Await, "等候"),
        (KeywordKind::OptionType, "可选"),
        (KeywordKind::ResultType, "结果"),
        (KeywordKind::ListType, "列表"),
        (KeywordKind::MapType, "映射"),
        (KeywordKind::Required, "必填"),
        (KeywordKind::Between, "介于"),
        (KeywordKind::Matching, "匹配"),
        (KeywordKind::GreaterThan, "大于"),
        (KeywordKind::LessThan, "小于"),
        (KeywordKind::True, "真"),
        (KeywordKind::False, "假"),
        (KeywordKind::Null, "空"),
        (KeywordKind::NoneKw, "无"),
        (KeywordKind::SomeKw, "有"),
        (KeywordKind::OkKw, "正确"),
        (KeywordKind::ErrKw, "错误"),
    ];
    let mut keywords = FxHashMap::default();
    for (kind, word) in pairs {
        keywords.insert(*kind, (*word).to_string());
    }

    let punctuation = Punctuation {
        statement_end: '。',
        list_separator: '，',
        enum_separator: '、',
        block_start: '：',
        string_quotes: StringQuotes { open: '「', close: '」' },
        markers: Some(Markers { open: '【', close: '】' }),
    };

    let canonicalization = Canonicalization {
        whitespace_mode: WhitespaceMode::Chinese,
        full_width_to_half: true,
        remove_articles: false,
        articles: Vec::new(),
        custom_rules: Vec::new(),
        allowed_duplicates: vec![
            DuplicateRule {
                word: "为".to_string(),
                contexts: vec![("let".to_string(), "be".to_string())],
                default: "when".to_string(),
            },
            DuplicateRule {
                word: "包含".to_string(),
                contexts: vec![("define".to_string(), "with".to_string())],
                default: "given".to_string(),
            },
        ],
        compound_patterns: vec![
            CompoundPattern {
                opener: "若".to_string(),
                contextual: vec!["为".to_string()],
                opener_english: "match".to_string(),
                contextual_english: "when".to_string(),
            },
            CompoundPattern {
                opener: "令".to_string(),
                contextual: vec!["为".to_string()],
                opener_english: "let".to_string(),
                contextual_english: "be".to_string(),
            },
        ],
    };

    Lexicon::new(
        "zh-CN",
        "简体中文",
        keywords,
        punctuation,
        canonicalization,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_rules_cover_wei() {
        let lexicon = simplified_chinese();
        let rule = lexicon.duplicate_rule("为").unwrap();
        assert_eq!(rule.default, "when");
        assert_eq!(rule.contexts[0], ("let".to_string(), "be".to_string()));
    }

    #[test]
    fn compound_opener_ruo() {
        let lexicon = simplified_chinese();
        let pattern = lexicon.compound_for_opener("若").unwrap();
        assert_eq!(pattern.opener_english, "match");
        assert_eq!(pattern.contextual_english, "when");
    }

    #[test]
    fn full_width_punctuation() {
        let lexicon = simplified_chinese();
        assert_eq!(lexicon.punctuation.statement_end, '。');
        assert_eq!(lexicon.punctuation.string_quotes.open, '「');
        assert!(lexicon.punctuation.markers.is_some());
    }
}
