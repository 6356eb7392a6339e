//! Per-call completion overrides, filtered through explicit allow-lists.
//!
//! Unrecognized values are dropped, never rejected: a caller asking for an
//! unknown model simply gets the configured default.

use serde::Serialize;
use tracing::debug;

/// Models a caller may select per request.
pub const SUPPORTED_MODELS: &[&str] = &[
    "gpt-4.1-mini",
    "gpt-4.1",
    "gpt-4.1-nano",
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-5",
    "gpt-5-mini",
    "gpt-5-nano",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Low,
    Medium,
    High,
}

impl Verbosity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Validated overrides for a single completion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub verbosity: Option<Verbosity>,
}

impl CompletionOptions {
    /// Builds options from untrusted request strings, keeping only allow-listed values.
    pub fn from_raw(model: Option<&str>, effort: Option<&str>, verbosity: Option<&str>) -> Self {
        let model = model.and_then(|m| {
            let m = m.trim().to_ascii_lowercase();
            if is_known_model(&m) {
                Some(m)
            } else {
                debug!("Ignoring unsupported model override '{m}'");
                None
            }
        });
        let reasoning_effort = effort.and_then(|e| {
            let parsed = ReasoningEffort::parse(e);
            if parsed.is_none() {
                debug!("Ignoring unsupported reasoning_effort '{e}'");
            }
            parsed
        });
        let verbosity = verbosity.and_then(|v| {
            let parsed = Verbosity::parse(v);
            if parsed.is_none() {
                debug!("Ignoring unsupported verbosity '{v}'");
            }
            parsed
        });

        Self {
            model,
            reasoning_effort,
            verbosity,
        }
    }
}

pub fn is_known_model(model: &str) -> bool {
    SUPPORTED_MODELS.contains(&model)
}

/// Only the gpt-5 family accepts `reasoning_effort` / `verbosity`.
pub(crate) fn supports_reasoning_controls(model: &str) -> bool {
    model.starts_with("gpt-5")
}
