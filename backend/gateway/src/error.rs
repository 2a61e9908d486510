//! Error-to-response mapping for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use stackforge_core::ForgeError;

/// Wrapper giving every `ForgeError` a status classification and a JSON
/// body. Callers can always tell bad input (4xx) from upstream trouble
/// (502/503) from internal faults (500).
#[derive(Debug)]
pub struct ApiError(pub ForgeError);

impl From<ForgeError> for ApiError {
    fn from(err: ForgeError) -> Self {
        Self(err)
    }
}

fn classify(err: &ForgeError) -> (StatusCode, &'static str) {
    match err {
        ForgeError::InputTooShort { .. } => (StatusCode::BAD_REQUEST, "badInput"),
        ForgeError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "unknownSession"),
        ForgeError::NoAffectedFiles => (StatusCode::UNPROCESSABLE_ENTITY, "noAffectedFiles"),
        ForgeError::Backend(e) if e.transient => {
            (StatusCode::SERVICE_UNAVAILABLE, "upstreamUnavailable")
        }
        ForgeError::Backend(_) => (StatusCode::BAD_GATEWAY, "upstreamRejected"),
        ForgeError::Config(_) | ForgeError::Storage(_) | ForgeError::Other(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = classify(&self.0);
        if status.is_server_error() {
            error!(kind, error = %self.0, "request failed");
        }
        (
            status,
            Json(json!({
                "error": self.0.to_string(),
                "kind": kind,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_core::BackendError;

    #[test]
    fn status_classification_covers_taxonomy() {
        let cases = [
            (
                ForgeError::InputTooShort { len: 2, min: 10 },
                StatusCode::BAD_REQUEST,
            ),
            (
                ForgeError::SessionNotFound("x".into()),
                StatusCode::NOT_FOUND,
            ),
            (ForgeError::NoAffectedFiles, StatusCode::UNPROCESSABLE_ENTITY),
            (
                BackendError::transient("azure", "429").into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                BackendError::permanent("azure", "401").into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ForgeError::Storage("lost".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(classify(&err).0, expected, "for {err}");
        }
    }
}
