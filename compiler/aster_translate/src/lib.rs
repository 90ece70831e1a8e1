//! Keyword translation.
//!
//! Rewrites localized IDENT/TYPE_IDENT token values to the canonical English
//! vocabulary before parsing. Other token kinds pass through. The phrase
//! table for a `(source, target)` lexicon pair is built once and cached by
//! pair identity.

mod index;
mod pass;

pub use index::PhraseIndex;
pub use pass::{translate, translate_to_english};
