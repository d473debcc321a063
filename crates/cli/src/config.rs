//! Application configuration.
//!
//! Loaded from a TOML file. `${VAR}` references are expanded from the
//! environment before parsing; unset variables expand to the empty string,
//! so a step whose key is missing fails with a missing-credential error
//! when it runs.
//!
//! ```toml
//! [chain]
//! num_steps = 2
//!
//! [[chain.steps]]
//! prompt = "Analyze: {input}"
//! model = "local"
//!
//! [[chain.steps]]
//! prompt = "Recommend based on: {previous}"
//! model = "openai"
//! api_key = "${OPENAI_API_KEY}"
//! temperature = 0.3
//!
//! [local]
//! base_url = "http://localhost:11434"
//! model = "llama3"
//!
//! [runtime]
//! request_timeout_secs = 60
//!
//! [telemetry]
//! log_format = "json"
//! otlp_endpoint = "http://localhost:4317"
//! ```

use std::path::{Path, PathBuf};

use llm::{ProviderSettings, DEFAULT_MAX_TOKENS};
use pipeline::ChainSettings;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SERVICE_NAME: &str = "prompt-chain";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chain: ChainSettings,
    pub providers: ProvidersConfig,
    /// OpenAI-compatible endpoint serving the `local` backend. When absent
    /// the local backend is unavailable and steps selecting it halt.
    pub local: Option<LocalConfig>,
    pub runtime: RuntimeConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderOverrides,
    pub anthropic: ProviderOverrides,
}

/// Partial provider settings; unset fields keep the provider defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderOverrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

impl ProviderOverrides {
    pub fn apply(&self, defaults: ProviderSettings) -> ProviderSettings {
        ProviderSettings::new(
            self.base_url.clone().unwrap_or(defaults.base_url),
            self.model.clone().unwrap_or(defaults.model),
            self.max_tokens.unwrap_or(defaults.max_tokens),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl LocalConfig {
    pub fn settings(&self) -> ProviderSettings {
        ProviderSettings::new(
            self.base_url.clone(),
            self.model.clone(),
            self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Per-call backend timeout. Unset means no timeout.
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_format: LogFormat,
    /// OTLP gRPC collector. Spans are exported only when set.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            otlp_endpoint: None,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Expands `${VAR}` references in `raw`, then parses it.
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(&expand_env_vars(raw))
    }
}

/// Replaces every `${VAR}` with the value of `VAR`, or nothing if unset.
/// An unterminated `${` is kept as written.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                result.push_str(&std::env::var(name).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{BackendKind, ConfigurationError, DEFAULT_STEP_COUNT};

    #[test]
    fn expand_env_vars_substitutes_set_variables() {
        std::env::set_var("PROMPT_CHAIN_TEST_KEY", "sk-123");
        let expanded = expand_env_vars("api_key = \"${PROMPT_CHAIN_TEST_KEY}\"");
        assert_eq!(expanded, "api_key = \"sk-123\"");
    }

    #[test]
    fn expand_env_vars_drops_unset_variables() {
        let expanded = expand_env_vars("a${PROMPT_CHAIN_TEST_UNSET_VAR}b");
        assert_eq!(expanded, "ab");
    }

    #[test]
    fn expand_env_vars_keeps_unterminated_reference() {
        assert_eq!(expand_env_vars("cost: ${5"), "cost: ${5");
        assert_eq!(expand_env_vars("no refs"), "no refs");
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.chain.num_steps, DEFAULT_STEP_COUNT);
        assert!(config.local.is_none());
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
        assert_eq!(config.telemetry.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.runtime.request_timeout_secs, None);
    }

    #[test]
    fn full_file_parses_every_section() {
        let raw = r#"
            [chain]
            num_steps = 2

            [[chain.steps]]
            prompt = "Analyze: {input}"
            model = "local"

            [[chain.steps]]
            prompt = "Recommend based on: {previous}"
            model = "anthropic"
            api_key = "ak"
            temperature = 0.3

            [providers.anthropic]
            model = "claude-3-5-sonnet-latest"

            [local]
            base_url = "http://localhost:11434/"
            model = "llama3"

            [runtime]
            request_timeout_secs = 30

            [telemetry]
            log_format = "json"
            otlp_endpoint = "http://collector:4317"
        "#;

        let config = AppConfig::parse(raw).unwrap();

        assert_eq!(config.chain.steps.len(), 2);
        assert_eq!(config.chain.steps[1].temperature, Some(0.3));

        let anthropic = config.providers.anthropic.apply(ProviderSettings::anthropic());
        assert_eq!(anthropic.model, "claude-3-5-sonnet-latest");
        assert_eq!(anthropic.base_url, "https://api.anthropic.com");
        assert_eq!(anthropic.max_tokens, DEFAULT_MAX_TOKENS);

        let local = config.local.as_ref().unwrap().settings();
        assert_eq!(local.base_url, "http://localhost:11434");

        assert_eq!(config.runtime.request_timeout_secs, Some(30));
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(
            config.telemetry.otlp_endpoint.as_deref(),
            Some("http://collector:4317")
        );
    }

    #[test]
    fn unset_key_variable_surfaces_as_missing_credential() {
        let raw = r#"
            [chain]
            num_steps = 1

            [[chain.steps]]
            model = "openai"
            api_key = "${PROMPT_CHAIN_TEST_NEVER_SET}"
        "#;

        let chain = AppConfig::parse(raw).unwrap().chain.into_chain_config().unwrap();

        assert_eq!(
            chain.steps()[0].validate(),
            Err(ConfigurationError::MissingCredential {
                backend: BackendKind::OpenAi
            })
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let err = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
