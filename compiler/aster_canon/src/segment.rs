//! String-literal segmentation.
//!
//! Splits source text into alternating non-string and string spans using the
//! locale's quote pair. A backslash escapes the next character inside a
//! string, so `\"` (or the locale equivalent) never closes. An unterminated
//! string extends to the end of the text; the lexer reports it later.

use aster_lexicon::StringQuotes;

/// One span of the source, tagged by whether it is string-literal content.
///
/// String segments include their delimiters.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Segment {
    pub text: String,
    pub is_string: bool,
}

/// Split `text` into alternating segments.
///
/// Concatenating the segment texts reproduces the input exactly.
pub fn segments(text: &str, quotes: StringQuotes) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quotes.close {
                out.push(Segment { text: std::mem::take(&mut current), is_string: true });
                in_string = false;
            }
            continue;
        }
        if c == quotes.open {
            if !current.is_empty() {
                out.push(Segment { text: std::mem::take(&mut current), is_string: false });
            }
            current.push(c);
            in_string = true;
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        out.push(Segment { text: current, is_string: in_string });
    }
    out
}

/// Apply `transform` to every non-string segment and reassemble.
pub fn map_outside_strings(
    text: &str,
    quotes: StringQuotes,
    transform: impl Fn(&str) -> String,
) -> String {
    segments(text, quotes)
        .into_iter()
        .map(|seg| if seg.is_string { seg.text } else { transform(&seg.text) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII: StringQuotes = StringQuotes { open: '"', close: '"' };
    const CORNER: StringQuotes = StringQuotes { open: '「', close: '」' };

    #[test]
    fn round_trips_exactly() {
        let text = "Return \"Hi \". // done";
        let joined: String = segments(text, ASCII).into_iter().map(|s| s.text).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn escaped_quote_does_not_close() {
        let segs = segments(r#"x "a\"b" y"#, ASCII);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].text, r#""a\"b""#);
        assert!(segs[1].is_string);
    }

    #[test]
    fn corner_quotes() {
        let segs = segments("返回 「成功」。", CORNER);
        assert_eq!(segs.len(), 3);
        assert!(segs[1].is_string);
        assert_eq!(segs[1].text, "「成功」");
    }

    #[test]
    fn unterminated_string_reaches_end() {
        let segs = segments("let x be \"oops", ASCII);
        assert_eq!(segs.len(), 2);
        assert!(segs[1].is_string);
    }

    #[test]
    fn transform_skips_strings() {
        let out = map_outside_strings("AA \"AA\" AA", ASCII, |s| s.to_lowercase());
        assert_eq!(out, "aa \"AA\" aa");
    }
}
