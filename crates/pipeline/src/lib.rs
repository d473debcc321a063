//! Core domain for the prompt chain node.
//!
//! This crate contains every domain concept used by the chain engine: step
//! and chain configuration, the template resolver, step results and history,
//! the frame payload model, error types, and the port traits that
//! infrastructure implements. Infrastructure crates implement the traits
//! defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; the `llm` crate and the surrounding runtime
//! define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`StepOrdinal`, `InvocationId`, `NodeId`, ...) |
//! | [`types`] | Value types (`BackendKind`, `Credential`, `Temperature`, `Timestamp`) |
//! | [`errors`] | Step failures, chain configuration errors, retry policy |
//! | [`config`] | `StepConfig`, `ChainConfig`, and the raw `ChainSettings` surface |
//! | [`template`] | `{input}` / `{previous}` resolution |
//! | [`history`] | `StepResult` and the append-only `ChainHistory` |
//! | [`context`] | Per-invocation `ExecutionContext` |
//! | [`payload`] | `Frame`, well-known keys, input extraction |
//! | [`ports`] | `GenerationBackend` and `OutputSink` traits |

pub mod config;
pub mod context;
pub mod errors;
pub mod history;
pub mod identifiers;
pub mod payload;
pub mod ports;
pub mod template;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{
    ChainConfig, ChainSettings, StepConfig, StepSettings, DEFAULT_BACKEND, DEFAULT_STEP_COUNT,
    FIRST_STEP_TEMPLATE, FOLLOW_UP_TEMPLATE, MAX_STEPS,
};
pub use context::ExecutionContext;
pub use errors::{BackendError, ChainConfigError, ConfigurationError, RetryPolicy, StepFailure};
pub use history::{ChainHistory, HistoryEntry, StepResult};
pub use identifiers::{InvocationId, NodeId, StepOrdinal};
pub use payload::{extract_input, keys, Frame, InputSource, InputText};
pub use ports::{GenerationBackend, GenerationRequest, OutputChannel, OutputRejected, OutputSink};
pub use template::{resolve, INPUT_PLACEHOLDER, PREVIOUS_PLACEHOLDER};
pub use types::{BackendKind, Credential, Temperature, Timestamp};
