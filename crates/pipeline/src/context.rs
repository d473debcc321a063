//! Per-invocation execution state.

use crate::{ChainHistory, InvocationId, StepResult};

/// Transient state of one chain invocation.
///
/// Created when a frame arrives and dropped when the final output has been
/// emitted. Never shared between invocations.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    invocation: InvocationId,
    input: String,
    previous: String,
    history: ChainHistory,
}

impl ExecutionContext {
    /// Starts an invocation; `previous` begins equal to `input`.
    pub fn new(input: impl Into<String>) -> Self {
        let input = input.into();
        Self {
            invocation: InvocationId::new_random(),
            previous: input.clone(),
            input,
            history: ChainHistory::new(),
        }
    }

    pub fn invocation(&self) -> InvocationId {
        self.invocation
    }

    /// The original input text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The latest step output, or the input before any step has completed.
    pub fn previous(&self) -> &str {
        &self.previous
    }

    /// The previous step's output, or `None` before the first step completes.
    pub fn previous_output(&self) -> Option<&str> {
        if self.history.is_empty() {
            None
        } else {
            Some(&self.previous)
        }
    }

    pub fn history(&self) -> &ChainHistory {
        &self.history
    }

    /// Appends a completed step and makes its output the new `previous`.
    pub fn complete_step(&mut self, result: StepResult) {
        self.previous = result.output().to_string();
        self.history.record(result);
    }

    /// Ends the invocation, yielding the last available output and the
    /// history.
    pub fn finish(self) -> (String, ChainHistory) {
        (self.previous, self.history)
    }
}
