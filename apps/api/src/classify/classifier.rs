//! Batch Classifier — two-stage pipeline.
//!
//! 1. Every bio runs through the lexical matcher. Matches are final `yes`.
//!    Blank bios are final `no`. Everything else is queued in input order.
//! 2. The queue goes to the completion backend in exactly one call. The reply
//!    is parsed against the tags that were sent. Any failure (transport,
//!    empty content, malformed reply) leaves the whole queue at `no`.
//!
//! The instruction is a per-call argument. Callers resolve overrides before
//! calling in; nothing here reads or mutates shared prompt state.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::classify::matcher;
use crate::classify::reply::{parse_reply, serialize_batch, MalformedReply};
use crate::llm_client::{CompletionBackend, CompletionOptions, CompletionRequest, LlmError};
use crate::models::profile::{Profile, Verdict};

/// Reasons the stage-2 batch was discarded.
#[derive(Debug, Error)]
pub enum RemoteStageError {
    #[error("completion call failed: {0}")]
    Remote(#[from] LlmError),

    #[error("malformed reply: {0}")]
    Malformed(#[from] MalformedReply),
}

#[derive(Clone)]
pub struct BatchClassifier {
    backend: Arc<dyn CompletionBackend>,
}

impl BatchClassifier {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Returns the identifiers of every `yes` profile, in input order.
    pub async fn classify(
        &self,
        profiles: &[Profile],
        instruction: &str,
        options: &CompletionOptions,
    ) -> Vec<String> {
        let verdicts = self.verdicts(profiles, instruction, options).await;
        profiles
            .iter()
            .zip(verdicts)
            .filter(|(_, verdict)| verdict.is_yes())
            .map(|(profile, _)| profile.identifier.clone())
            .collect()
    }

    /// Assigns exactly one verdict to every profile, positionally.
    #[instrument(skip_all, fields(batch_id = %Uuid::new_v4(), items = profiles.len()))]
    pub async fn verdicts(
        &self,
        profiles: &[Profile],
        instruction: &str,
        options: &CompletionOptions,
    ) -> Vec<Verdict> {
        let mut verdicts = vec![Verdict::No; profiles.len()];
        let mut queued: Vec<usize> = Vec::new();

        for (i, profile) in profiles.iter().enumerate() {
            if matcher::matches(&profile.text) {
                verdicts[i] = Verdict::Yes;
            } else if !profile.text.trim().is_empty() {
                queued.push(i);
            }
        }

        info!(
            "Keyword stage matched {} of {} bios; {} queued for review",
            verdicts.iter().filter(|v| v.is_yes()).count(),
            profiles.len(),
            queued.len()
        );

        if queued.is_empty() {
            return verdicts;
        }

        let texts: Vec<&str> = queued.iter().map(|&i| profiles[i].text.as_str()).collect();
        match self.resolve_remote(&texts, instruction, options).await {
            Ok(remote) => {
                for (&i, verdict) in queued.iter().zip(remote) {
                    verdicts[i] = verdict;
                }
            }
            Err(e) => warn!(
                "Review stage discarded ({e}); {} queued bios default to no",
                queued.len()
            ),
        }

        verdicts
    }

    async fn resolve_remote(
        &self,
        texts: &[&str],
        instruction: &str,
        options: &CompletionOptions,
    ) -> Result<Vec<Verdict>, RemoteStageError> {
        let content = serialize_batch(texts);
        let reply = self
            .backend
            .complete(CompletionRequest {
                instruction,
                content: &content,
                options,
            })
            .await?;
        Ok(parse_reply(&reply, texts.len())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::classify::prompts::build_instruction;

    #[derive(Debug, Clone)]
    struct RecordedCall {
        instruction: String,
        content: String,
        options: CompletionOptions,
    }

    /// Backend that answers from a closure over the serialized batch and records every call.
    struct StubBackend<F> {
        reply: F,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl<F> StubBackend<F>
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync,
    {
        fn new(reply: F) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<F> CompletionBackend for StubBackend<F>
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync,
    {
        async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(RecordedCall {
                instruction: request.instruction.to_string(),
                content: request.content.to_string(),
                options: request.options.clone(),
            });
            (self.reply)(request.content)
        }
    }

    /// Answers `yes` for every queued line whose text contains "surf", echoing tags in reverse.
    fn surf_judge(content: &str) -> Result<String, LlmError> {
        Ok(content
            .lines()
            .rev()
            .map(|line| {
                let (tag, text) = line.split_once('|').unwrap();
                let verdict = if text.contains("surf") { "yes" } else { "no" };
                format!("{tag}|{verdict}")
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn instruction() -> String {
        build_instruction("test criteria")
    }

    #[tokio::test]
    async fn test_example_batch_sends_only_unresolved_bio() {
        let backend = StubBackend::new(|_| Ok("001|no".to_string()));
        let classifier = BatchClassifier::new(backend.clone());
        let profiles = Profile::from_positions([
            "John 3:16 is my favorite verse",
            "just a dog mom",
            "\u{271D}\u{FE0F} living for Him",
        ]);

        let flagged = classifier
            .classify(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(flagged, vec!["0".to_string(), "2".to_string()]);
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].content, "001|just a dog mom");
    }

    #[tokio::test]
    async fn test_keyword_matches_skip_remote_call() {
        let backend = StubBackend::new(|_| panic!("remote stage must not run"));
        let classifier = BatchClassifier::new(backend.clone());
        let profiles = Profile::from_positions(["Saved by grace", "amen", "JESUS first"]);

        let flagged = classifier
            .classify(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(flagged, vec!["0", "1", "2"]);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_bios_are_no_without_remote_call() {
        let backend = StubBackend::new(|_| Ok("001|yes".to_string()));
        let classifier = BatchClassifier::new(backend.clone());
        let profiles = Profile::from_positions(["", "   ", "church kid"]);

        let verdicts = classifier
            .verdicts(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(verdicts, vec![Verdict::No, Verdict::No, Verdict::Yes]);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_verdicts_reattach_by_tag() {
        let backend = StubBackend::new(surf_judge);
        let classifier = BatchClassifier::new(backend.clone());
        let profiles = Profile::from_positions([
            "surf and sun",
            "amen",
            "accountant",
            "surfing every weekend",
            "knitting",
        ]);

        let flagged = classifier
            .classify(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(flagged, vec!["0", "1", "3"]);
        assert_eq!(
            backend.calls()[0].content,
            "001|surf and sun\n002|accountant\n003|surfing every weekend\n004|knitting"
        );
    }

    #[tokio::test]
    async fn test_short_reply_falls_back_for_whole_queue() {
        // Tag 1 says yes, but tag 2 is missing: nothing from the reply is trusted.
        let backend = StubBackend::new(|_| Ok("001|yes".to_string()));
        let classifier = BatchClassifier::new(backend.clone());
        let profiles = Profile::from_positions(["surfer", "God is good", "baker"]);

        let verdicts = classifier
            .verdicts(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(verdicts, vec![Verdict::No, Verdict::Yes, Verdict::No]);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_tag_falls_back_for_whole_queue() {
        let backend = StubBackend::new(|_| Ok("001|yes\nxx|yes".to_string()));
        let classifier = BatchClassifier::new(backend);
        let profiles = Profile::from_positions(["surfer", "baker"]);

        let flagged = classifier
            .classify(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert!(flagged.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_keyword_results() {
        let backend = StubBackend::new(|_| Err(LlmError::EmptyContent));
        let classifier = BatchClassifier::new(backend.clone());
        let profiles = Profile::from_positions(["dog mom", "Psalm 23", "runner"]);

        let flagged = classifier
            .classify(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(flagged, vec!["1"]);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_tokens_normalize_to_no() {
        let backend = StubBackend::new(|_| Ok("001|probably\n002|Y".to_string()));
        let classifier = BatchClassifier::new(backend);
        let profiles = Profile::from_positions(["a", "b"]);

        let verdicts = classifier
            .verdicts(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(verdicts, vec![Verdict::No, Verdict::Yes]);
    }

    #[tokio::test]
    async fn test_every_profile_gets_exactly_one_verdict() {
        let backend = StubBackend::new(surf_judge);
        let classifier = BatchClassifier::new(backend);
        let profiles = Profile::from_positions(["", "surf", "amen", "x", "  ", "surfboard"]);

        let verdicts = classifier
            .verdicts(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(verdicts.len(), profiles.len());
    }

    #[tokio::test]
    async fn test_identifiers_come_from_profiles_not_positions() {
        let backend = StubBackend::new(surf_judge);
        let classifier = BatchClassifier::new(backend);
        let profiles = vec![
            Profile::new("@kai", "surf coach"),
            Profile::new("@lee", "tax advisor"),
            Profile::new("@ana", "bible study leader"),
        ];

        let flagged = classifier
            .classify(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(flagged, vec!["@kai", "@ana"]);
    }

    #[tokio::test]
    async fn test_same_batch_twice_is_idempotent() {
        let backend = StubBackend::new(surf_judge);
        let classifier = BatchClassifier::new(backend);
        let profiles = Profile::from_positions(["surf", "amen", "chess", "surfing"]);

        let first = classifier
            .classify(&profiles, &instruction(), &CompletionOptions::default())
            .await;
        let second = classifier
            .classify(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_instruction_and_options_are_passed_per_call() {
        let backend = StubBackend::new(|_| Ok("001|no".to_string()));
        let classifier = BatchClassifier::new(backend.clone());
        let profiles = Profile::from_positions(["chess"]);
        let options = CompletionOptions::from_raw(Some("gpt-5-mini"), Some("low"), None);

        classifier
            .classify(&profiles, &build_instruction("override"), &options)
            .await;
        classifier
            .classify(&profiles, &instruction(), &CompletionOptions::default())
            .await;

        let calls = backend.calls();
        assert_eq!(calls[0].instruction, build_instruction("override"));
        assert_eq!(calls[0].options, options);
        assert_eq!(calls[1].instruction, instruction());
        assert_eq!(calls[1].options, CompletionOptions::default());
    }
}
