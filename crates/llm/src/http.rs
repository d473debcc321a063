//! Shared JSON-over-HTTP transport and status mapping.

use std::time::Duration;

use pipeline::{BackendError, BackendKind};
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Longest provider error body carried into an error message.
const MAX_ERROR_DETAIL: usize = 200;

/// A reqwest client bound to one backend kind, so every error it produces
/// names the backend.
#[derive(Debug, Clone)]
pub(crate) struct JsonTransport {
    client: reqwest::Client,
    backend: BackendKind,
}

impl JsonTransport {
    pub(crate) fn new(client: reqwest::Client, backend: BackendKind) -> Self {
        Self { client, backend }
    }

    /// POSTs `body` and decodes a successful response into `T`.
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<T, BackendError> {
        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        debug!(backend = %self.backend, url, "sending generation request");
        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                backend: self.backend,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let err = self.status_error(response).await;
            warn!(backend = %self.backend, status = status.as_u16(), error = %err, "generation request rejected");
            return Err(err);
        }

        let text = response.text().await.map_err(|e| BackendError::Transport {
            backend: self.backend,
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| BackendError::MalformedResponse {
            backend: self.backend,
            message: e.to_string(),
        })
    }

    async fn status_error(&self, response: Response) -> BackendError {
        let status = response.status();
        let retry_after = retry_after(&response);
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Authentication {
                backend: self.backend,
                message: error_detail(&body),
            },
            StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited {
                backend: self.backend,
                retry_after,
            },
            _ => BackendError::Upstream {
                backend: self.backend,
                status: status.as_u16(),
                message: error_detail(&body),
            },
        }
    }
}

/// Reads a `Retry-After` header given in whole seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Pulls `error.message` out of a provider error body; both OpenAI and
/// Anthropic use that shape. Falls back to the truncated raw body.
fn error_detail(body: &str) -> String {
    let structured = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    structured.unwrap_or_else(|| body.trim().chars().take(MAX_ERROR_DETAIL).collect())
}
