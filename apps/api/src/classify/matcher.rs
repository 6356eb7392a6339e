//! Lexical Matcher — stage 1 of the pipeline.
//!
//! Pure and synchronous. A bio matches when it contains one of the literal
//! signal tokens anywhere (case-insensitive substring), or names a book of
//! scripture as a whole word, optionally followed by a possessive or plural
//! suffix ("John's", "Psalms").

use once_cell::sync::Lazy;
use regex::Regex;

/// Signal words matched as case-insensitive substrings.
const SIGNAL_WORDS: &[&str] = &[
    "jesus",
    "christ",
    "christian",
    "god",
    "lord",
    "bible",
    "believer",
    "disciple",
    "faith",
    "saved",
    "born again",
    "church",
    "worship",
];

/// Symbols and shorthand matched the same way as `SIGNAL_WORDS`.
const SIGNAL_TOKENS: &[&str] = &[
    "\u{2020}", // †
    "\u{271D}", // ✝
    "cross",
    "amen",
    "agtg",
    "jesusfreak",
    "bibleverse",
];

/// Canonical book names, matched on word boundaries only.
const BOOKS: &[&str] = &[
    "genesis", "exodus", "leviticus", "numbers", "deuteronomy", "joshua", "judges", "ruth",
    "samuel", "kings", "chronicles", "ezra", "nehemiah", "esther", "job", "psalm", "psalms",
    "proverbs", "ecclesiastes", "song", "songs", "canticles", "isaiah", "jeremiah",
    "lamentations", "ezekiel", "daniel", "hosea", "joel", "amos", "obadiah", "jonah", "micah",
    "nahum", "habakkuk", "zephaniah", "haggai", "zechariah", "malachi", "matthew", "mark",
    "luke", "john", "acts", "romans", "corinthians", "galatians", "ephesians", "philippians",
    "colossians", "thessalonians", "timothy", "titus", "philemon", "hebrews", "james", "peter",
    "jude", "revelation", "rev",
];

static BOOK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})(?:['\u{{2019}}]s|s)?\b", BOOKS.join("|")))
        .expect("book pattern")
});

/// Returns true when `text` carries an explicit signal that needs no further review.
pub fn matches(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    let lowered = text.to_lowercase();
    SIGNAL_WORDS
        .iter()
        .chain(SIGNAL_TOKENS)
        .any(|token| lowered.contains(token))
        || BOOK_PATTERN.is_match(text)
}
