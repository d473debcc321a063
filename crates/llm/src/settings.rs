//! Endpoint and model settings for each HTTP backend.

use serde::{Deserialize, Serialize};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Where a backend sends requests and which model it asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Scheme and host, without the API path. A trailing `/` is ignored.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl ProviderSettings {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            max_tokens,
        }
    }

    /// OpenAI's public endpoint with the default chat model.
    pub fn openai() -> Self {
        Self::new(OPENAI_BASE_URL, OPENAI_MODEL, DEFAULT_MAX_TOKENS)
    }

    /// Anthropic's public endpoint with the default model.
    pub fn anthropic() -> Self {
        Self::new(ANTHROPIC_BASE_URL, ANTHROPIC_MODEL, DEFAULT_MAX_TOKENS)
    }

    /// Joins `path` onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
