//! Anthropic messages backend.

use async_trait::async_trait;
use pipeline::{BackendError, BackendKind, GenerationBackend, GenerationRequest};
use serde::Deserialize;
use serde_json::json;

use crate::http::JsonTransport;
use crate::settings::ProviderSettings;

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Backend speaking the Anthropic messages API.
#[derive(Debug, Clone)]
pub struct AnthropicBackend {
    settings: ProviderSettings,
    transport: JsonTransport,
}

impl AnthropicBackend {
    pub fn new(settings: ProviderSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(client: reqwest::Client, settings: ProviderSettings) -> Self {
        Self {
            settings,
            transport: JsonTransport::new(client, BackendKind::Anthropic),
        }
    }
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Anthropic
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, BackendError> {
        let body = json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "messages": [{ "role": "user", "content": request.prompt }],
            "temperature": request.temperature.as_f64(),
        });

        let api_key = request.credential.map(|c| c.expose()).unwrap_or_default();
        let headers = [("x-api-key", api_key), ("anthropic-version", ANTHROPIC_VERSION)];

        let response: MessagesResponse = self
            .transport
            .post_json(&self.settings.endpoint(MESSAGES_PATH), &headers, &body)
            .await?;

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(BackendError::EmptyResponse {
                backend: BackendKind::Anthropic,
            });
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}
