//! Stage-2 wire format: tagged batch serialization and reply parsing.
//!
//! Each queued bio is sent as one `TAG|text` line, where TAG is the 1-based
//! queue position zero-padded to a fixed width. The reply must carry one
//! `TAG|verdict` line per bio. Lines without a `|` are commentary and are
//! skipped; every tagged line is validated, and the batch is rejected as a
//! whole if anything is off.
//!
//! A reply with no tagged line at all is read positionally: one
//! whitespace-separated verdict per bio, in queue order, which is the shape
//! older saved prompts ask for. The token count must match exactly.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::profile::Verdict;

static DELIMITERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[|\p{Cc}]").expect("delimiter regex"));

/// Why a stage-2 reply could not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReply {
    #[error("reply was empty")]
    Empty,

    #[error("expected {expected} verdicts, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("unparsable tag in line '{0}'")]
    BadTag(String),

    #[error("tag {tag} outside 1..={count}")]
    TagOutOfRange { tag: usize, count: usize },

    #[error("tag {0} appears more than once")]
    DuplicateTag(usize),
}

fn tag_width(count: usize) -> usize {
    count.to_string().len().max(3)
}

/// Flattens a bio onto one line and strips anything that could forge a tag or delimiter.
/// Emoji and punctuation are kept; they are often the only signal left for review.
pub fn sanitize_bio(text: &str) -> String {
    DELIMITERS
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serializes queued bios as `TAG|text` lines, in queue order.
pub fn serialize_batch<S: AsRef<str>>(texts: &[S]) -> String {
    let width = tag_width(texts.len());
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{:0width$}|{}", i + 1, sanitize_bio(text.as_ref())))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses a reply into exactly `expected` verdicts, ordered by tag.
pub fn parse_reply(reply: &str, expected: usize) -> Result<Vec<Verdict>, MalformedReply> {
    if reply.trim().is_empty() {
        return Err(MalformedReply::Empty);
    }
    if !reply.contains('|') {
        return parse_positional(reply, expected);
    }

    let mut slots: Vec<Option<Verdict>> = vec![None; expected];
    let mut got = 0usize;

    for line in reply.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((raw_tag, rest)) = line.split_once('|') else {
            continue;
        };

        // Tolerate list/markdown decoration in front of the tag.
        let raw_tag = raw_tag
            .trim_start_matches(|c: char| matches!(c, '-' | '*' | '`' | '#' | '>') || c.is_whitespace())
            .trim();
        let tag: usize = raw_tag
            .parse()
            .map_err(|_| MalformedReply::BadTag(line.to_string()))?;
        if tag == 0 || tag > expected {
            return Err(MalformedReply::TagOutOfRange {
                tag,
                count: expected,
            });
        }

        let slot = &mut slots[tag - 1];
        if slot.is_some() {
            return Err(MalformedReply::DuplicateTag(tag));
        }
        let token = rest
            .split(|c: char| c.is_whitespace() || c == '|')
            .find(|t| !t.is_empty())
            .unwrap_or("");
        *slot = Some(Verdict::from_token(token));
        got += 1;
    }

    if got != expected {
        return Err(MalformedReply::CountMismatch { expected, got });
    }

    Ok(slots.into_iter().flatten().collect())
}

fn parse_positional(reply: &str, expected: usize) -> Result<Vec<Verdict>, MalformedReply> {
    let tokens: Vec<&str> = reply.split_whitespace().collect();
    if tokens.len() != expected {
        return Err(MalformedReply::CountMismatch {
            expected,
            got: tokens.len(),
        });
    }
    Ok(tokens.into_iter().map(Verdict::from_token).collect())
}
