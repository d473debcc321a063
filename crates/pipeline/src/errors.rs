//! Error and retry-policy types for the prompt chain domain.
//!
//! Step-level failures ([`ConfigurationError`], [`BackendError`], unified as
//! [`StepFailure`]) halt a chain but are never escalated as process faults:
//! the orchestrator turns them into a halted outcome. [`ChainConfigError`] is
//! raised earlier, when a node is configured, and prevents any step from
//! running.
//!
//! [`RetryPolicy`] is reported by backend errors so the surrounding runtime can
//! make its own decision; the chain engine never retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BackendKind, StepOrdinal};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable`: timeouts, transport failures, rate limits, 5xx responses.
/// - `NonRetryable`: rejected credentials, malformed or empty responses,
///   invalid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt, when the provider said
        /// so (e.g. a `Retry-After` header).
        after: Option<Duration>,
    },
    /// The operation must not be retried as-is.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Step failures
// ---------------------------------------------------------------------------

/// A step's configuration is unusable. Detected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The backend selector does not name a known [`BackendKind`].
    #[error("unknown backend '{selector}'")]
    UnknownBackend {
        /// The selector as configured.
        selector: String,
    },

    /// A remote backend was selected without a credential.
    #[error("backend '{backend}' requires a credential")]
    MissingCredential {
        /// The remote backend that was selected.
        backend: BackendKind,
    },

    /// The prompt template is empty or whitespace only.
    #[error("prompt template is empty")]
    EmptyTemplate,

    /// The local backend was selected but no upstream model is connected.
    #[error("local backend selected but no upstream model is connected")]
    LocalBackendUnavailable,

    /// A remote backend was selected but no client for it was registered.
    #[error("backend '{backend}' has no registered client")]
    BackendNotRegistered {
        /// The backend without a client.
        backend: BackendKind,
    },
}

/// A backend call failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// The provider rejected the credential (HTTP 401/403).
    #[error("{backend}: authentication rejected: {message}")]
    Authentication {
        /// Backend that rejected the call.
        backend: BackendKind,
        /// Provider-supplied detail.
        message: String,
    },

    /// The provider is throttling requests (HTTP 429).
    #[error("{backend}: rate limited")]
    RateLimited {
        /// Backend that throttled the call.
        backend: BackendKind,
        /// Provider-suggested wait, when supplied.
        retry_after: Option<Duration>,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("{backend}: malformed response: {message}")]
    MalformedResponse {
        /// Backend that produced the response.
        backend: BackendKind,
        /// Decoding failure detail.
        message: String,
    },

    /// The response decoded but contained no text.
    #[error("{backend}: response contained no text")]
    EmptyResponse {
        /// Backend that produced the response.
        backend: BackendKind,
    },

    /// Any other non-success HTTP status.
    #[error("{backend}: upstream returned HTTP {status}: {message}")]
    Upstream {
        /// Backend that failed.
        backend: BackendKind,
        /// HTTP status code.
        status: u16,
        /// Provider-supplied detail.
        message: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("{backend}: transport failure: {message}")]
    Transport {
        /// Backend that could not be reached.
        backend: BackendKind,
        /// Transport failure detail.
        message: String,
    },

    /// The call did not complete within the configured request timeout.
    #[error("{backend}: no response within {}ms", .after.as_millis())]
    Timeout {
        /// Backend that timed out.
        backend: BackendKind,
        /// The timeout that elapsed.
        after: Duration,
    },
}

impl BackendError {
    /// The backend that produced this error.
    pub fn backend(&self) -> BackendKind {
        match self {
            BackendError::Authentication { backend, .. }
            | BackendError::RateLimited { backend, .. }
            | BackendError::MalformedResponse { backend, .. }
            | BackendError::EmptyResponse { backend }
            | BackendError::Upstream { backend, .. }
            | BackendError::Transport { backend, .. }
            | BackendError::Timeout { backend, .. } => *backend,
        }
    }

    /// Whether the surrounding runtime could safely retry the call.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            BackendError::RateLimited { retry_after, .. } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            BackendError::Transport { .. } | BackendError::Timeout { .. } => {
                RetryPolicy::Retryable { after: None }
            }
            BackendError::Upstream { status, .. } if *status >= 500 => {
                RetryPolicy::Retryable { after: None }
            }
            _ => RetryPolicy::NonRetryable,
        }
    }
}

/// Why a single step did not produce a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepFailure {
    /// The step was rejected before any backend call.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl StepFailure {
    /// Retry guidance for the surrounding runtime. Configuration failures are
    /// never retryable.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            StepFailure::Configuration(_) => RetryPolicy::NonRetryable,
            StepFailure::Backend(e) => e.retry_policy(),
        }
    }
}

// ---------------------------------------------------------------------------
// Chain-level configuration errors
// ---------------------------------------------------------------------------

/// A chain configuration was rejected when the node was configured.
///
/// Produced at configuration time; no step ever runs with an invalid chain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainConfigError {
    /// The declared step count is outside `1..=max`.
    #[error("chain must declare between 1 and {max} steps, got {requested}")]
    StepCountOutOfRange {
        /// Declared step count.
        requested: usize,
        /// Maximum supported step count.
        max: usize,
    },

    /// A step's temperature is outside `[0.0, 1.0]`.
    #[error("step {ordinal}: temperature {value} is outside 0.0..=1.0")]
    TemperatureOutOfRange {
        /// The offending step.
        ordinal: StepOrdinal,
        /// The configured value.
        value: f64,
    },

    /// Step ordinals are not `1, 2, ..., N` in order.
    #[error("step at position {position} has ordinal {found}; ordinals must be contiguous from 1")]
    NonContiguousOrdinals {
        /// Zero-based position in the step list.
        position: usize,
        /// The ordinal found at that position.
        found: StepOrdinal,
    },
}
