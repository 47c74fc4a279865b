//! Text normalization shared by the loader, the search engine and callers.
//!
//! Every function here is pure and total. `normalize_for_search` has to stay
//! byte-for-byte compatible with the normalization that produced the
//! `title_normalized_wp` / `title_normalized_wpc` fields of the corpus export,
//! otherwise searches silently miss entries.

/// Characters trimmed from both ends of a search query
const EDGE_PUNCTUATION: [char; 3] = ['-', ',', ' '];

/// Remove bracketed content from a phrase.
///
/// Innermost `(...)` spans are removed until none remain, then the same for
/// `[...]`. Whitespace is collapsed afterwards and a dangling ` , ` left by a
/// removed span becomes `, `.
pub fn strip_bracketed_content(text: &str) -> String {
    let mut content = text.to_string();

    while let Some(stripped) = remove_innermost(&content, '(', ')') {
        content = stripped;
    }
    while let Some(stripped) = remove_innermost(&content, '[', ']') {
        content = stripped;
    }

    let collapsed = collapse_whitespace(&content).replace(" , ", ", ");
    collapsed.trim().to_string()
}

/// Remove every innermost `open ... close` span in a single left-to-right pass.
///
/// Returns `None` when nothing was removed, so callers can loop until the
/// text is stable.
fn remove_innermost(text: &str, open: char, close: char) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut span_start: Option<usize> = None;
    let mut removed = false;

    for (i, ch) in text.char_indices() {
        if ch == open {
            // An inner opening bracket discards the outer candidate
            if let Some(start) = span_start {
                out.push_str(&text[start..i]);
            }
            span_start = Some(i);
        } else if ch == close && span_start.is_some() {
            span_start = None;
            removed = true;
        } else if span_start.is_none() {
            out.push(ch);
        }
    }

    if let Some(start) = span_start {
        out.push_str(&text[start..]);
    }

    removed.then_some(out)
}

/// Lowercase and drop the accents used in Catalan vowels.
///
/// This is not general Unicode folding: only à è é í ï ò ó ú ü are mapped.
pub fn to_lowercase_no_accents(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|ch| match ch {
            'à' => 'a',
            'è' | 'é' => 'e',
            'í' | 'ï' => 'i',
            'ò' | 'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

/// Normalize raw text into the form stored in the corpus normalized fields.
pub fn normalize_for_search(text: &str) -> String {
    // Parentheses go before the ellipsis rewrite so the result is stable
    // under a second pass. The export normalizer did both in one pass, so
    // titles like "..(." normalize to "…" here but were stored as "...":
    // such entries show up as inconsistent in `dsff stats`.
    let replaced = text
        .replace('’', "'")
        .replace(['(', ')'], "")
        .replace("...", "…");

    let collapsed = collapse_whitespace(&replaced);
    let trimmed = collapsed.trim_matches(&EDGE_PUNCTUATION[..]);

    to_lowercase_no_accents(trimmed)
}

/// Collapse runs of Unicode whitespace into single spaces, trimming both ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
