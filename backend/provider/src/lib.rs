pub mod azure;
pub mod gemini;
pub mod mock;

use std::sync::Arc;

use anyhow::{bail, Result};
use reqwest::StatusCode;

use stackforge_config::{ProviderConfig, ProviderKind};
use stackforge_core::{BackendError, CompletionBackend};

pub use azure::AzureOpenAiBackend;
pub use gemini::GeminiBackend;
pub use mock::MockBackend;

/// Build the configured completion backend.
pub fn build_backend(config: &ProviderConfig) -> Result<Arc<dyn CompletionBackend>> {
    match config.kind {
        ProviderKind::AzureOpenai => {
            let backend = AzureOpenAiBackend::new(
                require(&config.api_key, "provider.apiKey")?,
                require(&config.endpoint, "provider.endpoint")?,
                require(&config.deployment, "provider.deployment")?,
                require(&config.api_version, "provider.apiVersion")?,
            );
            Ok(Arc::new(backend))
        }
        ProviderKind::Gemini => {
            let backend = GeminiBackend::new(
                require(&config.api_key, "provider.apiKey")?,
                require(&config.model, "provider.model")?,
            );
            Ok(Arc::new(backend))
        }
        ProviderKind::Mock => Ok(Arc::new(MockBackend::repeating(mock::SAMPLE_DOCUMENT))),
    }
}

fn require(value: &Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => bail!("missing required config value: {key}"),
    }
}

/// HTTP statuses worth retrying: rate limits, request timeouts, and 5xx.
pub(crate) fn transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Map a reqwest transport failure onto the backend error taxonomy.
/// Connection and timeout faults are transient; everything else
/// (malformed request, body decode) is not.
pub(crate) fn map_transport_error(provider: &str, err: reqwest::Error) -> BackendError {
    if err.is_connect() || err.is_timeout() {
        BackendError::transient(provider, err.to_string())
    } else {
        BackendError::permanent(provider, err.to_string())
    }
}
