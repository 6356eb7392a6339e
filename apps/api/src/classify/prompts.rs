// Stage-2 instruction text.
// Only the criteria block is operator-editable; the header and footer are
// fixed here and never persisted.

pub const INSTRUCTION_HEADER: &str = "\
You review short social-media bios, one per line. \
Each line starts with a numeric tag, then a `|`, then the bio text.\n\n";

pub const DEFAULT_CRITERIA: &str = "\
Say yes if the bio contains an explicit Christian signal: e.g. the words Jesus, Christ, \
Christian, Bible, a Scripture reference (John 3:16, 1 Cor 13:4-8, etc.), a cross emoji, \
'saved by grace', 'follower of Christ', or similar.\n\
If the bio does not clearly show Christian affiliation, say no.";

pub const INSTRUCTION_FOOTER: &str = "\n\n\
OUTPUT FORMAT (strict):\n\
- Reply with exactly one line per bio, in the form TAG|yes or TAG|no.\n\
- Copy each TAG exactly as given, including leading zeros.\n\
- Do NOT skip, merge, or add lines. Do NOT include explanations or markdown.";

/// Joins the fixed header and footer around the editable criteria.
pub fn build_instruction(criteria: &str) -> String {
    format!("{INSTRUCTION_HEADER}{criteria}{INSTRUCTION_FOOTER}")
}

/// Appends the output contract to a full prompt saved by an older deployment.
/// The stored text may ask for a different reply shape; the footer comes last so
/// the tagged format is the final instruction the model reads.
pub fn build_legacy_instruction(prompt: &str) -> String {
    format!("{prompt}{INSTRUCTION_FOOTER}")
}
