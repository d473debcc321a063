//! OpenAI chat completions backend.
//!
//! The same wire format serves the `local` backend: a co-located,
//! OpenAI-compatible server (llama.cpp, Ollama, vLLM) reached without
//! a credential.

use async_trait::async_trait;
use pipeline::{BackendError, BackendKind, GenerationBackend, GenerationRequest};
use serde::Deserialize;
use serde_json::json;

use crate::http::JsonTransport;
use crate::settings::ProviderSettings;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Backend speaking the OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    kind: BackendKind,
    settings: ProviderSettings,
    transport: JsonTransport,
}

impl OpenAiBackend {
    /// The remote `openai` backend. Requests carry the step credential as a
    /// bearer token.
    pub fn new(settings: ProviderSettings) -> Self {
        Self::with_client(reqwest::Client::new(), BackendKind::OpenAi, settings)
    }

    /// The `local` backend: an OpenAI-compatible endpoint called without
    /// authentication.
    pub fn local(settings: ProviderSettings) -> Self {
        Self::with_client(reqwest::Client::new(), BackendKind::Local, settings)
    }

    pub fn with_client(client: reqwest::Client, kind: BackendKind, settings: ProviderSettings) -> Self {
        Self {
            kind,
            settings,
            transport: JsonTransport::new(client, kind),
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, BackendError> {
        let body = json!({
            "model": self.settings.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "max_tokens": self.settings.max_tokens,
            "temperature": request.temperature.as_f64(),
        });

        let bearer = request
            .credential
            .filter(|_| self.kind.is_remote())
            .map(|credential| format!("Bearer {}", credential.expose()));
        let mut headers = Vec::with_capacity(1);
        if let Some(bearer) = bearer.as_deref() {
            headers.push(("Authorization", bearer));
        }

        let response: ChatCompletion = self
            .transport
            .post_json(&self.settings.endpoint(CHAT_COMPLETIONS_PATH), &headers, &body)
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(BackendError::EmptyResponse { backend: self.kind })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
