//! Pronunciation fixes applied to a segment before it is re-synthesized.
//!
//! Two kinds of fix are supported: a grave accent on the stressed vowel of a
//! word, and an IPA `<phoneme>` element wrapping the word. Both replace every
//! whole-word occurrence of the word in the segment text.

use crate::error::{Result, StudycastError};
use regex::Regex;
use std::sync::OnceLock;

/// Longest selection accepted as a single word.
pub const MAX_WORD_CHARS: usize = 50;

fn phoneme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<phoneme\b[^>]*>(.*?)</phoneme>").expect("Invalid regex"))
}

/// Trim `word` and check that it is one word of reasonable length.
pub fn check_single_word(word: &str) -> Result<&str> {
    let word = word.trim();
    if word.is_empty() {
        return Err(StudycastError::InvalidInput("the word is empty".to_string()));
    }
    if word.chars().any(char::is_whitespace) || word.chars().count() > MAX_WORD_CHARS {
        return Err(StudycastError::InvalidInput(format!(
            "'{}' is not a single word",
            word
        )));
    }
    Ok(word)
}

fn is_vowel(c: char) -> bool {
    "aeiouAEIOU".contains(c)
}

fn grave(c: char) -> char {
    match c {
        'a' => 'à',
        'e' => 'è',
        'i' => 'ì',
        'o' => 'ò',
        'u' => 'ù',
        'A' => 'À',
        'E' => 'È',
        'I' => 'Ì',
        'O' => 'Ò',
        'U' => 'Ù',
        other => other,
    }
}

/// Put a grave accent on the `nth` vowel of `word` (1-based).
///
/// Only unaccented `a e i o u` count as vowels.
pub fn stress_vowel(word: &str, nth: usize) -> Result<String> {
    let word = check_single_word(word)?;
    let vowels = word.chars().filter(|c| is_vowel(*c)).count();
    if nth == 0 || nth > vowels {
        return Err(StudycastError::InvalidInput(format!(
            "'{}' has {} vowels, cannot stress vowel {}",
            word, vowels, nth
        )));
    }

    let mut seen = 0;
    Ok(word
        .chars()
        .map(|c| {
            if is_vowel(c) {
                seen += 1;
                if seen == nth {
                    return grave(c);
                }
            }
            c
        })
        .collect())
}

/// Strip the slashes a transcription is often wrapped in.
pub fn sanitize_ipa(raw: &str) -> String {
    let ipa = raw.trim();
    let ipa = ipa.strip_prefix('/').unwrap_or(ipa);
    let ipa = ipa.strip_suffix('/').unwrap_or(ipa);
    ipa.trim().to_string()
}

/// SSML element telling the synthesizer how to pronounce `word`.
pub fn phoneme_tag(word: &str, ipa: &str) -> String {
    format!(
        "<phoneme alphabet=\"ipa\" ph=\"{}\">{}</phoneme>",
        ipa.replace('"', "&quot;"),
        word
    )
}

/// Replace the markup of `<phoneme>` elements with the word they wrap.
pub fn strip_phoneme_markup(text: &str) -> String {
    phoneme_regex().replace_all(text, "$1").into_owned()
}

/// Replace every whole-word occurrence of `word` in `text`.
///
/// Fails when `word` does not occur, so a typo never passes silently.
pub fn replace_word(text: &str, word: &str, replacement: &str) -> Result<String> {
    let word = check_single_word(word)?;
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(word)))
        .map_err(|e| StudycastError::InvalidInput(e.to_string()))?;

    if !pattern.is_match(text) {
        return Err(StudycastError::InvalidInput(format!(
            "'{}' does not occur in the segment",
            word
        )));
    }
    Ok(pattern
        .replace_all(text, regex::NoExpand(replacement))
        .into_owned())
}
