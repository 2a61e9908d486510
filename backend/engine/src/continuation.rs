//! Completion pipeline: throttle + retry + continuation reassembly.
//!
//! A single completion call can be truncated by the backend's per-call
//! output ceiling. The prompt instructs the model to end truncated output
//! with a marker string; when the marker shows up, the pipeline strips it
//! and asks the backend to continue from where it stopped, appending each
//! chunk until a reply arrives without the marker (or the round cap is
//! hit, since the uncapped protocol has unbounded worst-case cost).

use std::sync::Arc;

use tracing::{debug, info};

use stackforge_core::{BackendError, ChatMessage, CompletionBackend, CompletionOptions};

use crate::retry::RetryPolicy;
use crate::throttle::{estimate_tokens, TokenThrottle};

/// Sentinel the prompt instructs the backend to append when its output was
/// truncated.
pub const CONTINUATION_MARKER: &str = "[CONTINUE]";

pub const DEFAULT_MAX_CONTINUATIONS: u32 = 8;

const CONTINUE_INSTRUCTION: &str =
    "Continue exactly where you stopped. Do not repeat completed sections.";

/// Drives logical completions: every backend call passes through the shared
/// token throttle and the per-call retry policy; multi-part responses are
/// reassembled into one document.
pub struct CompletionPipeline {
    backend: Arc<dyn CompletionBackend>,
    throttle: Arc<TokenThrottle>,
    retry: RetryPolicy,
    max_continuations: u32,
}

impl CompletionPipeline {
    pub fn new(backend: Arc<dyn CompletionBackend>, throttle: Arc<TokenThrottle>) -> Self {
        Self {
            backend,
            throttle,
            retry: RetryPolicy::default(),
            max_continuations: DEFAULT_MAX_CONTINUATIONS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_continuations(mut self, max: u32) -> Self {
        self.max_continuations = max;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// One throttled, retried completion call with no continuation
    /// handling. Used for conversational turns and the edit engine's
    /// affected-file selection, where truncation is not a concern.
    pub async fn complete_once(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, BackendError> {
        let estimated: u64 = messages.iter().map(|m| estimate_tokens(&m.content)).sum();
        self.throttle.admit(estimated).await;
        self.retry
            .run(self.backend.name(), || self.backend.complete(messages, options))
            .await
    }

    /// A full logical completion: keeps requesting continuations while the
    /// reply carries the marker, concatenating chunks with the marker
    /// removed.
    pub async fn complete_reassembled(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, BackendError> {
        let mut history = messages.to_vec();
        let base_len = history.len();

        let mut assembled = self.complete_once(&history, options).await?;
        let mut rounds = 0u32;

        while assembled.contains(CONTINUATION_MARKER) {
            assembled = assembled.replace(CONTINUATION_MARKER, "");
            if rounds >= self.max_continuations {
                info!(rounds, "continuation cap reached; returning partial document");
                break;
            }
            rounds += 1;
            debug!(rounds, "response truncated; requesting continuation");

            // The working tail is rebuilt each round so the history stays
            // [base…, assistant(everything so far), user(continue)].
            history.truncate(base_len);
            history.push(ChatMessage::assistant(assembled.clone()));
            history.push(ChatMessage::user(CONTINUE_INSTRUCTION));

            let next = self.complete_once(&history, options).await?;
            assembled.push_str(&next);
        }

        Ok(assembled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_provider::MockBackend;

    fn pipeline(mock: Arc<MockBackend>) -> CompletionPipeline {
        CompletionPipeline::new(mock, Arc::new(TokenThrottle::default()))
    }

    #[tokio::test]
    async fn no_marker_means_single_call() {
        let mock = Arc::new(MockBackend::scripted(["complete text"]));
        let result = pipeline(mock.clone())
            .complete_reassembled(&[ChatMessage::user("go")], &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(result, "complete text");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn marker_triggers_exactly_one_continuation() {
        let mock = Arc::new(MockBackend::scripted([
            format!("partial text{CONTINUATION_MARKER}"),
            "rest of text".to_string(),
        ]));
        let result = pipeline(mock.clone())
            .complete_reassembled(&[ChatMessage::user("go")], &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(result, "partial textrest of text");
        assert_eq!(mock.call_count(), 2);

        // The continuation request carries the accumulated text and the
        // continue instruction.
        let calls = mock.calls();
        let second = &calls[1];
        assert_eq!(second[1].content, "partial text");
        assert_eq!(second[2].content, CONTINUE_INSTRUCTION);
    }

    #[tokio::test]
    async fn chained_markers_reassemble_in_order() {
        let mock = Arc::new(MockBackend::scripted([
            format!("one {CONTINUATION_MARKER}"),
            format!("two {CONTINUATION_MARKER}"),
            "three".to_string(),
        ]));
        let result = pipeline(mock.clone())
            .complete_reassembled(&[ChatMessage::user("go")], &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(result, "one two three");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn round_cap_bounds_runaway_continuations() {
        let mock = Arc::new(MockBackend::repeating(format!(
            "chunk{CONTINUATION_MARKER}"
        )));
        let result = pipeline(mock.clone())
            .with_max_continuations(2)
            .complete_reassembled(&[ChatMessage::user("go")], &CompletionOptions::default())
            .await
            .unwrap();
        // Initial call + 2 continuations, marker never left in the output.
        assert_eq!(mock.call_count(), 3);
        assert_eq!(result, "chunkchunkchunk");
    }

    #[tokio::test]
    async fn backend_error_mid_continuation_propagates() {
        let mock = Arc::new(MockBackend::with_outcomes(vec![
            Ok(format!("start{CONTINUATION_MARKER}")),
            Err(stackforge_core::BackendError::permanent("mock", "boom")),
        ]));
        let err = pipeline(mock)
            .complete_reassembled(&[ChatMessage::user("go")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.message, "boom");
    }
}
