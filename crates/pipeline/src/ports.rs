//! Port traits implemented by infrastructure and by the surrounding runtime.
//!
//! - [`GenerationBackend`]: one concrete text-generation backend. Implemented
//!   by the `llm` crate for remote providers and by whatever adapts the
//!   upstream in-pipeline model for [`BackendKind::Local`].
//! - [`OutputSink`]: where the node writes its per-step and final frames.

use async_trait::async_trait;
use thiserror::Error;

use crate::{BackendError, BackendKind, Credential, Frame, StepOrdinal, Temperature};

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// One atomic generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Fully resolved prompt text.
    pub prompt: &'a str,
    /// Step credential. Always `Some` for remote backends; `None` for local.
    pub credential: Option<&'a Credential>,
    /// Sampling temperature in `[0.0, 1.0]`; the backend maps it onto its
    /// own scale.
    pub temperature: Temperature,
}

/// A text-generation capability.
///
/// Implementations hold no per-call mutable state and must be safe to call
/// from concurrent invocations. They do not retry; every failure is mapped
/// onto [`BackendError`] and returned.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Which backend kind this implementation serves.
    fn kind(&self) -> BackendKind;

    /// Sends `request` and returns the generated text.
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A named output of the chain node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputChannel {
    /// `step{n}`: the result of one step.
    Step(StepOrdinal),
    /// `final`: the aggregate result of the invocation.
    Final,
}

impl std::fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputChannel::Step(ordinal) => write!(f, "step{ordinal}"),
            OutputChannel::Final => f.write_str("final"),
        }
    }
}

/// The runtime refused a frame (e.g. the downstream channel is closed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("output '{channel}' rejected the frame")]
pub struct OutputRejected {
    pub channel: OutputChannel,
}

/// Destination for frames produced by the chain node.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Delivers `frame` on `channel`.
    async fn emit(&self, channel: OutputChannel, frame: Frame) -> Result<(), OutputRejected>;
}
