use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, ForgeError};
use crate::fileset::ProjectBundle;
use crate::message::ChatMessage;

/// Sampling options forwarded to a completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 8192,
            top_p: 0.9,
            frequency_penalty: 0.1,
            presence_penalty: 0.1,
        }
    }
}

/// A remote chat-completion capability.
///
/// Implementations wrap one concrete provider API and must be safe to call
/// concurrently for independent sessions. Failures carry the
/// transient/permanent split the retry layer keys on.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Send the ordered message list and return the generated text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, BackendError>;
}

/// Durable storage for generated bundles, keyed by session id.
///
/// The edit flow reloads bundles through this seam, so a process restart
/// between generate and edit is survivable with a persistent impl.
#[async_trait]
pub trait BundleStore: Send + Sync {
    async fn save(&self, session_id: &str, bundle: &ProjectBundle) -> Result<(), ForgeError>;

    async fn load(&self, session_id: &str) -> Result<Option<ProjectBundle>, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_generation_profile() {
        let opts = CompletionOptions::default();
        assert_eq!(opts.temperature, 0.3);
        assert_eq!(opts.max_tokens, 8192);
        assert_eq!(opts.top_p, 0.9);
    }

    #[test]
    fn options_serialize_camel_case() {
        let json = serde_json::to_string(&CompletionOptions::default()).unwrap();
        assert!(json.contains("maxTokens"));
        assert!(json.contains("frequencyPenalty"));
    }
}
