//! Locale definitions for the Aster front-end.
//!
//! A [`Lexicon`] drives canonicalization, lexing, and keyword translation
//! for one locale. The process-wide [`registry`] holds every registered
//! lexicon plus a default; it is initialized once and effectively read-only
//! afterwards (tests may reset it explicitly).

mod keyword;
mod locales;
pub mod registry;
mod types;

pub use keyword::KeywordKind;
pub use locales::{english, german, simplified_chinese};
pub use types::{
    Canonicalization, CompoundPattern, CustomRule, DuplicateRule, InferenceRule, InferredType,
    Lexicon, Markers, Punctuation, StringQuotes, WhitespaceMode,
};
