//! Google Gemini (generative language API) backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use stackforge_core::{BackendError, ChatMessage, CompletionBackend, CompletionOptions, Role};

use crate::{map_transport_error, transient_status};

const PROVIDER: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Backend for the Google generative-content API.
///
/// The chat history maps onto Gemini's shape: the leading system message
/// becomes `systemInstruction`, user turns stay `user`, assistant turns
/// become `model`.
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn to_request(messages: &[ChatMessage], options: &CompletionOptions) -> GenerateRequest {
    let mut system_instruction = None;
    let mut contents = Vec::new();

    for message in messages {
        match message.role {
            Role::System if system_instruction.is_none() => {
                system_instruction = Some(Content {
                    role: None,
                    parts: vec![Part {
                        text: message.content.clone(),
                    }],
                });
            }
            // Gemini has no mid-conversation system role.
            Role::System | Role::User => contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            }),
            Role::Assistant => contents.push(Content {
                role: Some("model".to_string()),
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            }),
        }
    }

    GenerateRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
            top_p: options.top_p,
        },
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, BackendError> {
        let body = to_request(messages, options);

        debug!(model = %self.model, messages = messages.len(), "sending generateContent request");

        let response = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(BackendError {
                provider: PROVIDER.to_string(),
                message: format!("{status}: {body_text}"),
                transient: transient_status(status),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::permanent(PROVIDER, format!("malformed response: {e}")))?;

        let text = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(BackendError::permanent(
                PROVIDER,
                "response contained no candidates",
            ));
        }
        Ok(text)
    }
}
