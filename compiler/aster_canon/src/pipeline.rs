//! The canonicalization pipeline.
//!
//! Steps run in a fixed order; every regex step operates only on non-string
//! segments. The output is idempotent: canonical text passes through every
//! step unchanged.

use std::sync::Arc;

use aster_lexicon::Lexicon;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::segment::map_outside_strings;

/// Placeholder delimiters protecting multi-word keywords from the article
/// and vocabulary steps. Private-use characters never occur in source.
const PROTECT_OPEN: char = '\u{E000}';
const PROTECT_CLOSE: char = '\u{E001}';

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").unwrap_or_else(|_| unreachable!()));
static COLLAPSE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^ \n])[ ]{2,}").unwrap_or_else(|_| unreachable!()));
static TRAILING_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ ]+\n").unwrap_or_else(|_| unreachable!()));

/// Canonicalization options: the lexicon plus an optional identifier
/// vocabulary mapping localized names to canonical ones.
#[derive(Clone)]
pub struct Options {
    pub lexicon: Arc<Lexicon>,
    pub vocabulary: Option<FxHashMap<String, String>>,
}

impl Options {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Options { lexicon, vocabulary: None }
    }

    pub fn with_vocabulary(mut self, vocabulary: FxHashMap<String, String>) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }
}

/// Canonicalize `source` for `lexicon`.
pub fn canonicalize(source: &str, lexicon: &Lexicon) -> String {
    run(source, lexicon, None)
}

/// Canonicalize with an identifier vocabulary.
pub fn canonicalize_with_options(source: &str, options: &Options) -> String {
    run(source, &options.lexicon, options.vocabulary.as_ref())
}

fn run(source: &str, lexicon: &Lexicon, vocabulary: Option<&FxHashMap<String, String>>) -> String {
    let quotes = lexicon.punctuation.string_quotes;
    let had_trailing_newline = source.ends_with('\n') || source.ends_with('\r');

    // 1–2: newline and tab normalization.
    let mut text = normalize_newlines(source);
    text = text.replace('\t', "  ");

    // 3: whole-line comments become empty lines (line count preserved).
    text = strip_comment_lines(&text);

    // 4: quote normalization; after this the locale quote pair is the only
    // string delimiter, so segmentation is reliable for later steps.
    text = normalize_quotes(&text, lexicon);

    // 5: locale custom rules.
    for rule in &lexicon.canonicalization.custom_rules {
        if let Ok(re) = Regex::new(&rule.pattern) {
            text = map_outside_strings(&text, quotes, |s| {
                re.replace_all(s, rule.replacement.as_str()).into_owned()
            });
        }
    }

    // 6: full-width folding.
    if lexicon.canonicalization.full_width_to_half {
        text = map_outside_strings(&text, quotes, fold_full_width);
    }

    // 7: tighten whitespace before terminators.
    let terminators = [
        lexicon.punctuation.statement_end,
        lexicon.punctuation.list_separator,
        lexicon.punctuation.enum_separator,
        lexicon.punctuation.block_start,
        '\n',
    ];
    text = map_outside_strings(&text, quotes, |s| tighten_before(s, &terminators));

    // 8: protect multi-word keywords behind placeholders.
    let phrases: Vec<String> = lexicon
        .multi_word_keywords()
        .iter()
        .map(|p| (*p).to_string())
        .collect();
    for (index, phrase) in phrases.iter().enumerate() {
        if let Some(re) = phrase_regex(phrase) {
            let placeholder = format!("{PROTECT_OPEN}{index}{PROTECT_CLOSE}");
            text = map_outside_strings(&text, quotes, |s| {
                re.replace_all(s, placeholder.as_str()).into_owned()
            });
        }
    }

    // 9: article removal (whole words, outside strings).
    if lexicon.canonicalization.remove_articles && !lexicon.canonicalization.articles.is_empty() {
        if let Some(re) = article_regex(&lexicon.canonicalization.articles) {
            text = map_outside_strings(&text, quotes, |s| re.replace_all(s, "").into_owned());
        }
    }

    // 10: restore placeholders, lowercased.
    text = PLACEHOLDER
        .replace_all(&text, |caps: &regex::Captures<'_>| {
            caps.get(1)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .and_then(|i| phrases.get(i))
                .map(|p| p.to_lowercase())
                .unwrap_or_default()
        })
        .into_owned();

    // 11: identifier vocabulary.
    if let Some(vocab) = vocabulary {
        let mut entries: Vec<(&String, &String)> = vocab.iter().collect();
        entries.sort();
        for (localized, canonical) in entries {
            text = map_outside_strings(&text, quotes, |s| {
                replace_word(s, localized, canonical)
            });
        }
    }

    // 12: re-tighten whitespace (leading indentation untouched). The
    // terminator pass runs again because article removal can leave a
    // stranded space in front of punctuation.
    text = map_outside_strings(&text, quotes, |s| {
        let s = COLLAPSE_RUNS.replace_all(s, "$1 ").into_owned();
        let s = TRAILING_SPACES.replace_all(&s, "\n").into_owned();
        tighten_before(&s, &terminators)
    });

    // 13: trailing newline policy follows the input.
    if had_trailing_newline {
        if !text.ends_with('\n') {
            text.push('\n');
        }
    } else {
        while text.ends_with('\n') {
            text.pop();
        }
    }
    text
}

fn normalize_newlines(source: &str) -> String {
    source.replace("\r\n", "\n").replace('\r', "\n")
}

fn strip_comment_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with('#') {
            lines.push("");
        } else {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Smart quote characters recognized on top of the locale's own pair.
fn is_smart_quote(c: char) -> bool {
    matches!(c, '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}')
}

/// Unify string delimiters to the locale pair.
///
/// Outside a string, any smart quote or raw `"` opens; inside, any of them
/// closes (raw `"` occurrences therefore alternate open/close). Escapes
/// survive untouched.
fn normalize_quotes(text: &str, lexicon: &Lexicon) -> String {
    let q = lexicon.punctuation.string_quotes;
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
            } else if c == '\\' {
                escaped = true;
                out.push(c);
            } else if c == q.close || is_smart_quote(c) || c == '"' {
                out.push(q.close);
                in_string = false;
            } else {
                out.push(c);
            }
        } else if c == q.open || is_smart_quote(c) || c == '"' {
            out.push(q.open);
            in_string = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Fold full-width ASCII forms (U+FF01–U+FF5E) and the ideographic space.
fn fold_full_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => {
                char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

/// Drop space runs that directly precede one of `terminators`.
fn tighten_before(s: &str, terminators: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending = String::new();
    for c in s.chars() {
        if c == ' ' {
            pending.push(c);
            continue;
        }
        if !pending.is_empty() {
            if !terminators.contains(&c) {
                out.push_str(&pending);
            }
            pending.clear();
        }
        out.push(c);
    }
    out.push_str(&pending);
    out
}

/// Case-insensitive whole-phrase regex, spaces matching any run of blanks
/// within a single line.
fn phrase_regex(phrase: &str) -> Option<Regex> {
    let parts: Vec<String> = phrase.split_whitespace().map(|w| regex::escape(w)).collect();
    if parts.len() < 2 {
        return None;
    }
    Regex::new(&format!(r"(?i)\b{}\b", parts.join("[ ]+"))).ok()
}

/// Articles match case-sensitively: a capitalized single-letter identifier
/// (a type parameter `A`) must never be mistaken for the article `a`.
fn article_regex(articles: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = articles.iter().map(|a| regex::escape(a)).collect();
    Regex::new(&format!(r"\b(?:{})\b[ ]?", alternatives.join("|"))).ok()
}

/// Whole-word replacement; falls back to plain substring replacement for
/// scripts where `\b` has no meaning.
fn replace_word(s: &str, word: &str, replacement: &str) -> String {
    let ascii_word = word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ascii_word {
        match Regex::new(&format!(r"\b{}\b", regex::escape(word))) {
            Ok(re) => re.replace_all(s, replacement).into_owned(),
            Err(_) => s.to_string(),
        }
    } else {
        s.replace(word, replacement)
    }
}
