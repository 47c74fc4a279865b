//! Concept naming helpers: URL slugs, display titles and letter keys.

use super::normalize::to_lowercase_no_accents;

/// Separator used between words in a concept slug
pub const SLUG_SEPARATOR: char = '_';

/// Build the URL-safe slug for a concept name (`Fer Goig` -> `fer_goig`)
pub fn concept_slug(concept: &str) -> String {
    concept
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(&SLUG_SEPARATOR.to_string())
}

/// Map a slug back to the concept key it was built from.
///
/// The result is compared case-insensitively against concept names, so the
/// lowercasing done by [`concept_slug`] does not need to be undone.
pub fn concept_from_slug(slug: &str) -> String {
    slug.replace(SLUG_SEPARATOR, " ")
}

/// Display form of a concept: lowercase with a space before each digit
/// (`GEL1` -> `gel 1`)
pub fn concept_title(concept: &str) -> String {
    let mut title = String::with_capacity(concept.len() + 2);
    for ch in concept.chars() {
        if ch.is_ascii_digit() {
            title.push(' ');
        }
        title.push(ch);
    }
    title.to_lowercase()
}

/// Key of the letter index a concept belongs to.
///
/// The first character is accent-stripped and uppercased. Returns `None` for
/// an empty concept.
pub fn letter_key(concept: &str) -> Option<String> {
    let first = concept.chars().next()?;
    Some(to_lowercase_no_accents(&first.to_string()).to_uppercase())
}

/// Check that a letter page parameter is a single uppercase ASCII letter
pub fn is_valid_letter(letter: &str) -> bool {
    let bytes = letter.as_bytes();
    bytes.len() == 1 && bytes[0].is_ascii_uppercase()
}

/// Parse a raw 1-based page parameter, falling back to the first page
pub fn parse_page_param(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(page) if page > 0 => page,
        _ => 1,
    }
}
