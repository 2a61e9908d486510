//! Scripted backend for tests and credential-free local runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use stackforge_core::{BackendError, ChatMessage, CompletionBackend, CompletionOptions};

const PROVIDER: &str = "mock";

/// Tiny well-formed document the `mock` provider kind serves, so the whole
/// pipeline is exercisable without credentials.
pub const SAMPLE_DOCUMENT: &str = "#### README.md\n```markdown\n# Sample App\nGenerated by the mock backend.\n```\n\n#### src/index.js\n```javascript\nconsole.log('sample');\n```\n";

enum Script {
    /// Pop replies front to back; error once exhausted.
    Queue(VecDeque<Result<String, BackendError>>),
    /// Serve the same reply forever.
    Repeat(String),
}

/// A completion backend driven by a prepared script.
///
/// Records every received message list so tests can assert on call counts
/// and prompt contents.
pub struct MockBackend {
    script: Mutex<Script>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockBackend {
    /// Queue of successful replies, served in order.
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_outcomes(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// Queue of explicit outcomes, errors included.
    pub fn with_outcomes(outcomes: Vec<Result<String, BackendError>>) -> Self {
        Self {
            script: Mutex::new(Script::Queue(outcomes.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with the same text.
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(Script::Repeat(reply.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of completion calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Message lists received, in call order.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let mut script = self.script.lock().unwrap();
        match &mut *script {
            Script::Queue(queue) => queue
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::permanent(PROVIDER, "mock script exhausted"))),
            Script::Repeat(reply) => Ok(reply.clone()),
        }
    }
}
