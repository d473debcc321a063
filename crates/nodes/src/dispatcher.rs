//! Backend dispatch.
//!
//! [`BackendDispatcher`] maps each [`BackendKind`] to at most one registered
//! [`GenerationBackend`]. It checks credentials before any I/O, applies the
//! optional per-request timeout, and rejects empty generations. It never
//! retries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pipeline::{
    BackendError, BackendKind, ConfigurationError, Credential, GenerationBackend,
    GenerationRequest, StepFailure, Temperature,
};
use tracing::debug;

/// Routes generation calls to the backend selected by a step.
///
/// Cheap to clone; registered backends are shared.
#[derive(Clone, Default)]
pub struct BackendDispatcher {
    backends: HashMap<BackendKind, Arc<dyn GenerationBackend>>,
    request_timeout: Option<Duration>,
}

impl BackendDispatcher {
    /// A dispatcher with no backends and no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` under its own [`GenerationBackend::kind`],
    /// replacing any previous registration for that kind.
    pub fn with_backend(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    /// Bounds every backend call; an overlong call fails with
    /// [`BackendError::Timeout`].
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Generates text for `prompt` on `backend`.
    ///
    /// Remote backends require `credential`; the local backend never
    /// receives one.
    pub async fn generate(
        &self,
        prompt: &str,
        backend: BackendKind,
        credential: Option<&Credential>,
        temperature: Temperature,
    ) -> Result<String, StepFailure> {
        if backend.is_remote() && credential.is_none() {
            return Err(ConfigurationError::MissingCredential { backend }.into());
        }

        let client = self.backends.get(&backend).ok_or(match backend {
            BackendKind::Local => ConfigurationError::LocalBackendUnavailable,
            remote => ConfigurationError::BackendNotRegistered { backend: remote },
        })?;

        let request = GenerationRequest {
            prompt,
            credential: if backend.is_remote() { credential } else { None },
            temperature,
        };

        debug!(%backend, %temperature, "dispatching generation request");

        let call = client.generate(request);
        let text = match self.request_timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .map_err(|_| BackendError::Timeout { backend, after })??,
            None => call.await?,
        };

        if text.trim().is_empty() {
            return Err(BackendError::EmptyResponse { backend }.into());
        }

        Ok(text)
    }
}

impl std::fmt::Debug for BackendDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.backends.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("BackendDispatcher")
            .field("backends", &kinds)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
