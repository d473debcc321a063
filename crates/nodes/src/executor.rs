//! Single-step execution.

use async_trait::async_trait;
use pipeline::{resolve, ExecutionContext, StepConfig, StepFailure, StepResult};
use tracing::{debug, info};

use crate::dispatcher::BackendDispatcher;

/// Number of prompt characters included in debug logs.
const PROMPT_LOG_CHARS: usize = 100;

/// Runs one step against the current execution context.
///
/// The orchestrator only depends on this trait, so a different scheduler
/// (or a test double) can replace [`StepExecutor`] without touching
/// orchestration logic.
#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Executes `step`. Must not mutate anything reachable from `context`.
    async fn execute(
        &self,
        step: &StepConfig,
        context: &ExecutionContext,
    ) -> Result<StepResult, StepFailure>;
}

/// The production [`StepRunner`]: validate, resolve, dispatch.
#[derive(Debug, Clone)]
pub struct StepExecutor {
    dispatcher: BackendDispatcher,
}

impl StepExecutor {
    pub fn new(dispatcher: BackendDispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl StepRunner for StepExecutor {
    async fn execute(
        &self,
        step: &StepConfig,
        context: &ExecutionContext,
    ) -> Result<StepResult, StepFailure> {
        let backend = step.validate()?;

        let prompt = resolve(step.template(), context.input(), context.previous_output());
        debug!(
            step = %step.ordinal(),
            prompt = %truncate(&prompt, PROMPT_LOG_CHARS),
            "resolved prompt"
        );

        let output = self
            .dispatcher
            .generate(&prompt, backend, step.credential(), step.temperature())
            .await?;
        info!(step = %step.ordinal(), %backend, chars = output.len(), "backend responded");

        Ok(StepResult::new(step.ordinal(), prompt, output, backend))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
