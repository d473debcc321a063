//! Step and chain configuration.
//!
//! [`ChainSettings`] is the raw configuration surface supplied by the
//! runtime (deserialisable, all fields optional with defaults).
//! [`ChainSettings::into_chain_config`] turns it into an immutable
//! [`ChainConfig`], rejecting chain-level problems (step count, temperature
//! range) up front.
//!
//! Per-step problems that the runtime is expected to surface as a halted
//! chain (unknown backend, missing credential, empty template) are *not*
//! rejected here; they are reported by [`StepConfig::validate`] when the step
//! is reached.

use serde::{Deserialize, Serialize};

use crate::{BackendKind, ChainConfigError, ConfigurationError, Credential, StepOrdinal, Temperature};

/// Upper bound on the number of steps in one chain.
pub const MAX_STEPS: usize = 10;

/// Step count used when the settings do not declare one.
pub const DEFAULT_STEP_COUNT: usize = 2;

/// Template used for step 1 when none is configured.
pub const FIRST_STEP_TEMPLATE: &str = "Process the following: {input}";

/// Template used for steps 2..N when none is configured.
pub const FOLLOW_UP_TEMPLATE: &str = "Continue with: {previous}";

/// Backend selector used when none is configured.
pub const DEFAULT_BACKEND: &str = "local";

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// One configured step.
///
/// The backend selector is kept as configured text so an unknown selector
/// can halt the chain at this step rather than failing the whole node.
#[derive(Debug, Clone, PartialEq)]
pub struct StepConfig {
    ordinal: StepOrdinal,
    template: String,
    backend: String,
    credential: Option<Credential>,
    temperature: Temperature,
}

impl StepConfig {
    /// Creates a step with no credential and the default temperature.
    pub fn new(ordinal: StepOrdinal, template: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            ordinal,
            template: template.into(),
            backend: backend.into(),
            credential: None,
            temperature: Temperature::DEFAULT,
        }
    }

    /// Sets the backend credential.
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn ordinal(&self) -> StepOrdinal {
        self.ordinal
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// The backend selector exactly as configured.
    pub fn backend_selector(&self) -> &str {
        &self.backend
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    /// Checks that this step can be dispatched and returns its backend kind.
    ///
    /// Order of checks: known backend, credential for remote backends,
    /// non-empty template.
    pub fn validate(&self) -> Result<BackendKind, ConfigurationError> {
        let kind = BackendKind::from_selector(&self.backend).ok_or_else(|| {
            ConfigurationError::UnknownBackend {
                selector: self.backend.clone(),
            }
        })?;

        if kind.is_remote() && self.credential.is_none() {
            return Err(ConfigurationError::MissingCredential { backend: kind });
        }

        if self.template.trim().is_empty() {
            return Err(ConfigurationError::EmptyTemplate);
        }

        Ok(kind)
    }
}

/// An ordered, immutable sequence of 1..=[`MAX_STEPS`] steps.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainConfig {
    steps: Vec<StepConfig>,
}

impl ChainConfig {
    /// Builds a chain, checking the step count and that ordinals run
    /// `1, 2, ..., N` in order.
    pub fn new(steps: Vec<StepConfig>) -> Result<Self, ChainConfigError> {
        if steps.is_empty() || steps.len() > MAX_STEPS {
            return Err(ChainConfigError::StepCountOutOfRange {
                requested: steps.len(),
                max: MAX_STEPS,
            });
        }

        for (position, step) in steps.iter().enumerate() {
            if StepOrdinal::from_index(position) != Some(step.ordinal) {
                return Err(ChainConfigError::NonContiguousOrdinals {
                    position,
                    found: step.ordinal,
                });
            }
        }

        Ok(Self { steps })
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[StepConfig] {
        &self.steps
    }

    /// Number of active steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Raw settings
// ---------------------------------------------------------------------------

/// Per-step settings as supplied by the runtime. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSettings {
    /// Prompt template. `None` selects the positional default; an explicit
    /// empty string is kept and reported as [`ConfigurationError::EmptyTemplate`].
    #[serde(default)]
    pub prompt: Option<String>,

    /// Backend selector (`local`, `openai`, `anthropic`).
    #[serde(default)]
    pub model: Option<String>,

    /// Backend credential. Empty means "none".
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature in `[0.0, 1.0]`.
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// The chain configuration surface: a declared step count plus per-step
/// settings. Entries past `num_steps` are inactive and ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    #[serde(default = "default_step_count")]
    pub num_steps: usize,

    #[serde(default)]
    pub steps: Vec<StepSettings>,
}

fn default_step_count() -> usize {
    DEFAULT_STEP_COUNT
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            num_steps: DEFAULT_STEP_COUNT,
            steps: Vec::new(),
        }
    }
}

impl ChainSettings {
    /// Resolves defaults and validates chain-level constraints.
    pub fn into_chain_config(self) -> Result<ChainConfig, ChainConfigError> {
        if self.num_steps == 0 || self.num_steps > MAX_STEPS {
            return Err(ChainConfigError::StepCountOutOfRange {
                requested: self.num_steps,
                max: MAX_STEPS,
            });
        }

        let mut declared = self.steps.into_iter();
        let mut steps = Vec::with_capacity(self.num_steps);

        for index in 0..self.num_steps {
            let ordinal = StepOrdinal::from_index(index).ok_or(ChainConfigError::StepCountOutOfRange {
                requested: self.num_steps,
                max: MAX_STEPS,
            })?;
            let settings = declared.next().unwrap_or_default();

            let template = settings.prompt.unwrap_or_else(|| {
                if ordinal.is_first() {
                    FIRST_STEP_TEMPLATE.to_string()
                } else {
                    FOLLOW_UP_TEMPLATE.to_string()
                }
            });
            let backend = settings.model.unwrap_or_else(|| DEFAULT_BACKEND.to_string());

            let temperature = match settings.temperature {
                Some(value) => Temperature::new(value)
                    .ok_or(ChainConfigError::TemperatureOutOfRange { ordinal, value })?,
                None => Temperature::DEFAULT,
            };

            steps.push(
                StepConfig::new(ordinal, template, backend)
                    .with_credential(settings.api_key.and_then(Credential::new))
                    .with_temperature(temperature),
            );
        }

        ChainConfig::new(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordinal(n: u32) -> StepOrdinal {
        StepOrdinal::new(n).unwrap()
    }

    #[test]
    fn defaults_fill_missing_steps() {
        let config = ChainSettings::default().into_chain_config().unwrap();

        assert_eq!(config.len(), 2);
        let first = &config.steps()[0];
        let second = &config.steps()[1];
        assert_eq!(first.template(), FIRST_STEP_TEMPLATE);
        assert_eq!(second.template(), FOLLOW_UP_TEMPLATE);
        assert_eq!(first.backend_selector(), "local");
        assert_eq!(first.temperature(), Temperature::DEFAULT);
        assert!(first.credential().is_none());
    }

    #[test]
    fn step_count_is_bounded() {
        for requested in [0, MAX_STEPS + 1] {
            let settings = ChainSettings {
                num_steps: requested,
                steps: Vec::new(),
            };
            assert_eq!(
                settings.into_chain_config(),
                Err(ChainConfigError::StepCountOutOfRange {
                    requested,
                    max: MAX_STEPS
                })
            );
        }

        let settings = ChainSettings {
            num_steps: MAX_STEPS,
            steps: Vec::new(),
        };
        assert_eq!(settings.into_chain_config().unwrap().len(), MAX_STEPS);
    }

    #[test]
    fn steps_past_the_declared_count_are_inactive() {
        let settings = ChainSettings {
            num_steps: 1,
            steps: vec![StepSettings::default(), StepSettings::default()],
        };
        assert_eq!(settings.into_chain_config().unwrap().len(), 1);
    }

    #[test]
    fn out_of_range_temperature_is_rejected_up_front() {
        let settings = ChainSettings {
            num_steps: 2,
            steps: vec![
                StepSettings::default(),
                StepSettings {
                    temperature: Some(1.5),
                    ..StepSettings::default()
                },
            ],
        };
        assert_eq!(
            settings.into_chain_config(),
            Err(ChainConfigError::TemperatureOutOfRange {
                ordinal: ordinal(2),
                value: 1.5
            })
        );
    }

    #[test]
    fn blank_api_key_means_no_credential() {
        let settings = ChainSettings {
            num_steps: 1,
            steps: vec![StepSettings {
                model: Some("openai".into()),
                api_key: Some(String::new()),
                ..StepSettings::default()
            }],
        };
        let config = settings.into_chain_config().unwrap();
        assert!(config.steps()[0].credential().is_none());
    }

    #[test]
    fn non_contiguous_ordinals_are_rejected() {
        let steps = vec![
            StepConfig::new(ordinal(1), "a", "local"),
            StepConfig::new(ordinal(3), "b", "local"),
        ];
        assert_eq!(
            ChainConfig::new(steps),
            Err(ChainConfigError::NonContiguousOrdinals {
                position: 1,
                found: ordinal(3)
            })
        );
    }

    #[test]
    fn validation_order_backend_then_credential_then_template() {
        let unknown = StepConfig::new(ordinal(1), "", "mistral");
        assert_eq!(
            unknown.validate(),
            Err(ConfigurationError::UnknownBackend {
                selector: "mistral".into()
            })
        );

        let keyless = StepConfig::new(ordinal(1), "", "anthropic");
        assert_eq!(
            keyless.validate(),
            Err(ConfigurationError::MissingCredential {
                backend: BackendKind::Anthropic
            })
        );

        let empty = StepConfig::new(ordinal(1), "  ", "local");
        assert_eq!(empty.validate(), Err(ConfigurationError::EmptyTemplate));

        let ok = StepConfig::new(ordinal(1), "{input}", "openai")
            .with_credential(Credential::new("sk-test"));
        assert_eq!(ok.validate(), Ok(BackendKind::OpenAi));
    }

    #[test]
    fn local_backend_ignores_missing_credential() {
        let step = StepConfig::new(ordinal(1), "Summarise: {input}", "local");
        assert_eq!(step.validate(), Ok(BackendKind::Local));
    }

    #[test]
    fn settings_deserialise_with_defaults() {
        let settings: ChainSettings = serde_json::from_value(serde_json::json!({
            "steps": [{ "prompt": "Analyze: {input}" }]
        }))
        .unwrap();
        assert_eq!(settings.num_steps, DEFAULT_STEP_COUNT);
        assert_eq!(settings.steps[0].prompt.as_deref(), Some("Analyze: {input}"));
        assert!(settings.steps[0].model.is_none());
    }
}
