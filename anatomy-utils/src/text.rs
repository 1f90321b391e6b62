//! Text normalization for guess matching.
//!
//! Card answers can carry diacritics (Latin anatomy terms, loanwords) while
//! the player types plain ASCII. Matching happens on a normalized form:
//! lowercased, with combining marks stripped, everything else untouched.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize text for letter matching.
///
/// Decomposes to NFD, drops combining marks, and lowercases. Spaces and
/// punctuation pass through verbatim, so the normalized form has one
/// character per visible slot of the original.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Whether a normalized character is something the player can guess.
///
/// Answers are ASCII after normalization, so a guessable letter is exactly
/// one of `a..=z`.
pub fn is_guessable_letter(c: char) -> bool {
    c.is_ascii_lowercase()
}
