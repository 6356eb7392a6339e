/// Final classification of a single bio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Yes,
    No,
}

impl Verdict {
    /// Normalizes a raw verdict token. Anything not recognizably affirmative is `No`.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric());
        if token
            .chars()
            .next()
            .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
        {
            Verdict::Yes
        } else {
            Verdict::No
        }
    }

    pub fn is_yes(self) -> bool {
        self == Verdict::Yes
    }
}

/// One unit of classification input. Lives only for the duration of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Unique within a batch; used to reattach verdicts after filtering.
    pub identifier: String,
    pub text: String,
}

impl Profile {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
        }
    }

    /// Builds profiles keyed by their position in the request, as the HTTP layer does.
    pub fn from_positions<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Profile::new(i.to_string(), text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_tokens_normalize_to_yes() {
        for token in ["yes", "YES", "Yes.", "**yes**", "y", " yes "] {
            assert_eq!(Verdict::from_token(token), Verdict::Yes, "token {token:?}");
        }
    }

    #[test]
    fn test_everything_else_normalizes_to_no() {
        for token in ["no", "NO", "maybe", "", "unsure", "n/a", "1"] {
            assert_eq!(Verdict::from_token(token), Verdict::No, "token {token:?}");
        }
    }

    #[test]
    fn test_from_positions_uses_stringified_index() {
        let profiles = Profile::from_positions(["a", "b"]);
        assert_eq!(profiles[0].identifier, "0");
        assert_eq!(profiles[1].identifier, "1");
        assert_eq!(profiles[1].text, "b");
    }
}
