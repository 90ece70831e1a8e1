//! Diagnostic emitters: one human-readable, one JSON-lines.

use crate::Diagnostic;

/// Render diagnostics for a terminal, one block per diagnostic.
pub fn emit_human(file: &str, diags: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diag in diags {
        out.push_str(&format!("{file}: {diag}\n"));
    }
    out
}

/// Render diagnostics as JSON lines, one object per line.
pub fn emit_json(diags: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diag in diags {
        if let Ok(line) = serde_json::to_string(diag) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}
