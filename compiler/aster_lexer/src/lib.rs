//! Indentation-sensitive lexer.
//!
//! A single synchronous pass over the canonical source. The scanner is an
//! explicit value — `{chars, pos, line, col, indent stack}` — advanced one
//! character at a time; INDENT/DEDENT tokens are derived from the leading
//! width of each non-blank line and are balanced at EOF. Comments travel on
//! the trivia channel; blank and comment-only lines produce no structural
//! tokens at all.

mod error;
mod scanner;

pub use error::LexError;
pub use scanner::lex;

use aster_ir::Token;
use aster_lexicon::registry;

/// Lex with the process-default lexicon.
pub fn lex_with_default(source: &str) -> Result<Vec<Token>, LexError> {
    lex(source, &registry::get_default())
}
