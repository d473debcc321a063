//! Prompt chain node implementation.
//!
//! This crate provides the chain engine: the [`BackendDispatcher`] that routes
//! each step to its backend, the [`StepExecutor`] that validates, resolves and
//! dispatches one step, the [`ChainOrchestrator`] state machine that drives
//! the steps in order, the [`OutputEmitter`] that writes per-step and final
//! frames, and the [`PromptChainNode`] façade the runtime talks to.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** This crate sequences calls between business logic
//! in the [`pipeline`] crate and infrastructure behind its port traits
//! ([`pipeline::GenerationBackend`], [`pipeline::OutputSink`]). It performs
//! no network I/O of its own.

pub mod dispatcher;
pub mod emitter;
pub mod executor;
pub mod node;
pub mod orchestrator;
pub mod sink;

pub use dispatcher::BackendDispatcher;
pub use emitter::{final_frame, step_frame, OutputEmitter};
pub use executor::{StepExecutor, StepRunner};
pub use node::{NodeError, PromptChainNode};
pub use orchestrator::{ChainOrchestrator, ChainOutcome, ChainState};
pub use sink::{ChannelSink, CollectingSink, Emitted};
