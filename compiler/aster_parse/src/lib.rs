//! Recursive descent parser over canonical-English tokens.
//!
//! The parser assumes the keyword translator has already run (or that the
//! source was English to begin with); keyword matching is case-insensitive.
//! Errors are fatal per top-level declaration: the parser records the error,
//! synchronizes at the next statement terminator at column 1, and continues,
//! so one bad declaration does not hide the rest.

mod cursor;
mod error;
mod grammar;
pub mod infer;

pub use cursor::Cursor;
pub use error::ParseError;
pub use grammar::Parser;

use aster_ir::{Module, Token};
use aster_lexicon::{registry, Lexicon};
use aster_translate::translate_to_english;

/// Parse a canonical-English token stream.
pub fn parse(tokens: &[Token]) -> Result<Module, Vec<ParseError>> {
    Parser::new(tokens, registry::get_default()).parse_module()
}

/// Translate from `lexicon` to English, then parse.
pub fn parse_with_lexicon(
    tokens: &[Token],
    lexicon: &Lexicon,
) -> Result<Module, Vec<ParseError>> {
    let translated = translate_to_english(tokens, lexicon);
    let arc = registry::get(&lexicon.id)
        .unwrap_or_else(|| std::sync::Arc::new(lexicon.clone()));
    Parser::new(&translated, arc).parse_module()
}
