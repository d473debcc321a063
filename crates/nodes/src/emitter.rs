//! Output emission.
//!
//! Each emitted frame is a copy of the incoming frame with `chain_*` keys
//! overlaid. [`OutputEmitter::finish`] consumes the emitter, so at most one
//! final frame can be written per invocation.

use pipeline::{keys, ChainHistory, Frame, OutputChannel, OutputRejected, OutputSink, StepResult};
use serde_json::{json, Value};
use tracing::debug;

use crate::orchestrator::ChainOutcome;

/// Writes per-step and final frames for one invocation.
pub struct OutputEmitter<'a> {
    source: &'a Frame,
    sink: &'a dyn OutputSink,
    steps_emitted: usize,
}

impl<'a> OutputEmitter<'a> {
    pub fn new(source: &'a Frame, sink: &'a dyn OutputSink) -> Self {
        Self {
            source,
            sink,
            steps_emitted: 0,
        }
    }

    /// Emits the frame for `result` on its `step{n}` channel. `history` must
    /// already contain `result`.
    pub async fn emit_step(
        &mut self,
        result: &StepResult,
        history: &ChainHistory,
    ) -> Result<(), OutputRejected> {
        let channel = OutputChannel::Step(result.ordinal());
        self.sink
            .emit(channel, step_frame(self.source, result, history))
            .await?;
        self.steps_emitted += 1;
        debug!(%channel, "emitted step output");
        Ok(())
    }

    /// Emits the aggregate frame on the `final` channel.
    pub async fn finish(self, outcome: &ChainOutcome) -> Result<(), OutputRejected> {
        debug_assert_eq!(self.steps_emitted, outcome.history.len());
        self.sink
            .emit(OutputChannel::Final, final_frame(self.source, outcome))
            .await?;
        debug!(steps = self.steps_emitted, "emitted final output");
        Ok(())
    }
}

/// Builds the frame for one completed step.
pub fn step_frame(source: &Frame, result: &StepResult, history: &ChainHistory) -> Frame {
    source.derive([
        (keys::CHAIN_STEP, json!(result.ordinal().get())),
        (keys::CHAIN_PROMPT, json!(result.prompt())),
        (keys::CHAIN_OUTPUT, json!(result.output())),
        (keys::CHAIN_MODEL, json!(result.backend().as_str())),
        (keys::CHAIN_HISTORY, history.to_json()),
    ])
}

/// Builds the aggregate frame for a finished invocation.
pub fn final_frame(source: &Frame, outcome: &ChainOutcome) -> Frame {
    let mut entries: Vec<(&'static str, Value)> = vec![
        (keys::CHAIN_FINAL_OUTPUT, json!(outcome.final_output)),
        (keys::CHAIN_STEPS, json!(outcome.steps_executed())),
        (keys::CHAIN_COMPLETE, json!(outcome.is_complete())),
        (keys::CHAIN_HISTORY, outcome.history.to_json()),
    ];

    let error = match (&outcome.failure, &outcome.rejected) {
        (Some(failure), _) => Some(failure.to_string()),
        (None, Some(rejected)) => Some(rejected.to_string()),
        (None, None) => None,
    };
    if let Some(error) = error {
        entries.push((keys::CHAIN_ERROR, json!(error)));
    }
    if let Some(ordinal) = outcome.state.halted_at() {
        entries.push((keys::CHAIN_FAILED_STEP, json!(ordinal.get())));
    }

    source.derive(entries)
}
