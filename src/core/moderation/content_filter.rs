// Pattern matching against the lexicon.
//
// Three checks run per entry, in order, and the first hit wins:
// 1. the raw text contains the phrase verbatim
// 2. the normalized text contains the normalized phrase
// 3. the raw text matches the phrase with arbitrary whitespace between its characters
//
// The fuzzy patterns are compiled once when the filter is built and reused for
// every call, so checking a submission never touches the regex compiler.

use super::lexicon::{standard_lexicon, LexiconEntry};
use regex::Regex;

/// Reduce text to its canonical comparison form.
///
/// Keeps CJK unified ideographs (U+4E00..=U+9FA5), ASCII letters and ASCII
/// digits, lowercasing the letters. Everything else is deleted rather than
/// replaced, so "a b" and "ab" collapse to the same form.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| is_canonical(*c))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn is_canonical(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Build the "characters may be separated by whitespace" pattern for a phrase.
fn fuzzy_pattern(phrase: &str) -> String {
    let gapped = phrase
        .chars()
        .map(|c| regex::escape(c.encode_utf8(&mut [0u8; 4])))
        .collect::<Vec<_>>()
        .join(r"\s*");
    format!("(?i){}", gapped)
}

/// One lexicon entry with its derived forms.
#[derive(Debug)]
struct CompiledEntry {
    entry: LexiconEntry,
    normalized: String,
    fuzzy: Regex,
}

impl CompiledEntry {
    fn compile(entry: LexiconEntry) -> Result<Self, regex::Error> {
        Ok(Self {
            entry,
            normalized: normalize(entry.phrase),
            fuzzy: Regex::new(&fuzzy_pattern(entry.phrase))?,
        })
    }

    fn matches(&self, raw: &str, normalized: &str) -> bool {
        if raw.contains(self.entry.phrase) {
            return true;
        }
        if !self.normalized.is_empty() && normalized.contains(&self.normalized) {
            return true;
        }
        self.fuzzy.is_match(raw)
    }
}

/// The compiled lexicon. Immutable once built; share it behind an `Arc`.
#[derive(Debug)]
pub struct ContentFilter {
    entries: Vec<CompiledEntry>,
}

impl ContentFilter {
    /// Compile a filter over the given entries, keeping their order.
    pub fn new(lexicon: &[LexiconEntry]) -> Result<Self, regex::Error> {
        let entries = lexicon
            .iter()
            .copied()
            .map(CompiledEntry::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Compile the built-in lexicon.
    pub fn from_standard_lexicon() -> Result<Self, regex::Error> {
        Self::new(&standard_lexicon())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// The first lexicon entry the text trips, if any. `None` means the text
    /// is not blocked.
    pub fn find_match(&self, text: &str) -> Option<&LexiconEntry> {
        let normalized = normalize(text);
        self.entries
            .iter()
            .find(|compiled| compiled.matches(text, &normalized))
            .map(|compiled| &compiled.entry)
    }
}
