//! Raw story text to paragraph normalization.
//!
//! Story files are line oriented. Authoring tools may prefix every line with
//! a line number followed by a marker (`12→text`) and may emit a numbered
//! title line (`1→제목 : ...`). Normalization strips both and returns one
//! paragraph per non-blank line.

/// Knobs for [`normalize_text_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Marker that follows a numeric line prefix.
    pub line_number_marker: char,
    /// Lines containing this token are dropped entirely.
    pub title_marker: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            line_number_marker: '→',
            title_marker: "→제목".to_string(),
        }
    }
}

/// Normalize raw story text with default options.
pub fn normalize_text(raw: &str) -> Vec<String> {
    normalize_text_with(raw, &NormalizeOptions::default())
}

/// Normalize raw story text into non-empty, trimmed paragraphs.
///
/// Blank-line runs collapse and blank separators are not emitted, so every
/// returned entry is non-empty.
pub fn normalize_text_with(raw: &str, opts: &NormalizeOptions) -> Vec<String> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut out = Vec::with_capacity(raw.len() / 64 + 1);
    for line in raw.lines() {
        if !opts.title_marker.is_empty() && line.contains(opts.title_marker.as_str()) {
            continue;
        }
        let text = strip_line_number(line, opts.line_number_marker).trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }
    out
}

/// Strip a `<ws><digits><marker>` prefix, returning the rest of the line.
///
/// Lines without the full prefix are returned unchanged.
fn strip_line_number(line: &str, marker: char) -> &str {
    let rest = line.trim_start();
    let digits_end = rest
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(rest.len(), |(idx, _)| idx);
    if digits_end == 0 {
        return line;
    }
    match rest[digits_end..].strip_prefix(marker) {
        Some(tail) => tail,
        None => line,
    }
}
