//! Chain orchestration.
//!
//! One [`ChainOrchestrator::run`] call is one invocation: it extracts the
//! input from the frame, drives the [`StepRunner`] over the steps in
//! ascending order, emits each step's frame before starting the next, and
//! emits exactly one final frame whatever the terminal state.
//!
//! ```text
//! Idle ─► Running(1) ─► Running(2) ─► … ─► Running(N) ─► Completed
//!             │             │                   │
//!             └─────────────┴───────────────────┴─► HaltedOnConfig(i)
//!                                                  HaltedOnBackendFailure(i)
//!                                                  HaltedOnOutput(i)
//! ```

use pipeline::{
    extract_input, ChainConfig, ChainHistory, ExecutionContext, Frame, InputSource, InvocationId,
    OutputRejected, OutputSink, StepFailure, StepOrdinal,
};
use tracing::{info, info_span, warn, Instrument};

use crate::emitter::OutputEmitter;
use crate::executor::StepRunner;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Orchestrator state for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// No step has started.
    Idle,
    /// Step `i` is executing.
    Running(StepOrdinal),
    /// Every step succeeded.
    Completed,
    /// Step `i` failed validation; steps after it never ran.
    HaltedOnConfig(StepOrdinal),
    /// Step `i`'s backend call failed; steps after it never ran.
    HaltedOnBackendFailure(StepOrdinal),
    /// Step `i` produced a result but its frame was rejected by the sink.
    HaltedOnOutput(StepOrdinal),
}

impl ChainState {
    /// Returns `true` for `Completed` and both halted states.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ChainState::Completed
                | ChainState::HaltedOnConfig(_)
                | ChainState::HaltedOnBackendFailure(_)
                | ChainState::HaltedOnOutput(_)
        )
    }

    /// The step that halted the chain, if it halted.
    pub fn halted_at(self) -> Option<StepOrdinal> {
        match self {
            ChainState::HaltedOnConfig(i)
            | ChainState::HaltedOnBackendFailure(i)
            | ChainState::HaltedOnOutput(i) => Some(i),
            _ => None,
        }
    }

    fn start(self, ordinal: StepOrdinal) -> Self {
        debug_assert!(
            matches!(self, ChainState::Idle | ChainState::Running(_)),
            "cannot start a step from {self:?}"
        );
        ChainState::Running(ordinal)
    }

    fn halt(self, failure: &StepFailure) -> Self {
        match (self, failure) {
            (ChainState::Running(i), StepFailure::Configuration(_)) => ChainState::HaltedOnConfig(i),
            (ChainState::Running(i), StepFailure::Backend(_)) => {
                ChainState::HaltedOnBackendFailure(i)
            }
            (other, _) => other,
        }
    }

    fn reject_output(self) -> Self {
        match self {
            ChainState::Running(i) => ChainState::HaltedOnOutput(i),
            other => other,
        }
    }

    fn complete(self) -> Self {
        match self {
            ChainState::Running(_) => ChainState::Completed,
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// The result of one invocation, returned after the final frame is emitted.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub invocation: InvocationId,
    /// Always a terminal state.
    pub state: ChainState,
    /// Output of the last completed step, or the input if none completed.
    pub final_output: String,
    pub history: ChainHistory,
    /// The failure that halted the chain, if any.
    pub failure: Option<StepFailure>,
    /// The step frame the sink refused, if that is what halted the chain.
    pub rejected: Option<OutputRejected>,
}

impl ChainOutcome {
    /// `true` only when every step completed.
    pub fn is_complete(&self) -> bool {
        self.state == ChainState::Completed
    }

    /// Number of steps that produced a result.
    pub fn steps_executed(&self) -> usize {
        self.history.len()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives a [`StepRunner`] over a chain, one invocation per call to
/// [`ChainOrchestrator::run`]. Holds no per-invocation state, so one
/// orchestrator can serve concurrent invocations.
#[derive(Debug, Clone)]
pub struct ChainOrchestrator<R> {
    runner: R,
}

impl<R: StepRunner> ChainOrchestrator<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Runs `config` against `frame`, writing outputs to `sink`.
    ///
    /// Step failures never surface as `Err`; they end the chain in a halted
    /// state reported by the returned outcome and the final frame. `Err` is
    /// returned only when the sink rejects a frame. A rejected step frame
    /// halts the chain, the final frame is still emitted, and then the
    /// rejection is returned.
    pub async fn run(
        &self,
        config: &ChainConfig,
        frame: &Frame,
        sink: &dyn OutputSink,
    ) -> Result<ChainOutcome, OutputRejected> {
        let input = extract_input(frame);
        if input.source == InputSource::Missing {
            warn!("no input text found in frame; running chain with empty input");
        }

        let mut context = ExecutionContext::new(input.text);
        let span = info_span!(
            "chain.invoke",
            invocation = %context.invocation(),
            steps = config.len()
        );

        async move {
            info!("starting prompt chain");
            let mut emitter = OutputEmitter::new(frame, sink);
            let mut state = ChainState::Idle;
            let mut failure = None;
            let mut rejected = None;

            for step in config.steps() {
                state = state.start(step.ordinal());
                let step_span = info_span!(
                    "chain.step",
                    step = %step.ordinal(),
                    backend = step.backend_selector()
                );

                match self.runner.execute(step, &context).instrument(step_span).await {
                    Ok(result) => {
                        let mut emitted_history = context.history().clone();
                        emitted_history.record(result.clone());

                        match emitter.emit_step(&result, &emitted_history).await {
                            Ok(()) => context.complete_step(result),
                            Err(err) => {
                                warn!(
                                    step = %step.ordinal(),
                                    error = %err,
                                    "step output rejected; halting chain"
                                );
                                state = state.reject_output();
                                rejected = Some(err);
                                break;
                            }
                        }
                    }
                    Err(err) => {
                        warn!(
                            step = %step.ordinal(),
                            error = %err,
                            retry = ?err.retry_policy(),
                            "step failed; halting chain"
                        );
                        state = state.halt(&err);
                        failure = Some(err);
                        break;
                    }
                }
            }

            state = state.complete();
            let invocation = context.invocation();
            let (final_output, history) = context.finish();
            let outcome = ChainOutcome {
                invocation,
                state,
                final_output,
                history,
                failure,
                rejected,
            };
            debug_assert!(outcome.state.is_terminal());

            emitter.finish(&outcome).await?;
            info!(
                complete = outcome.is_complete(),
                executed = outcome.steps_executed(),
                "prompt chain finished"
            );
            match outcome.rejected.clone() {
                Some(err) => Err::<ChainOutcome, OutputRejected>(err),
                None => Ok(outcome),
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{BackendError, BackendKind, ConfigurationError};

    fn ordinal(n: u32) -> StepOrdinal {
        StepOrdinal::new(n).unwrap()
    }

    #[test]
    fn successful_run_transitions_to_completed() {
        let state = ChainState::Idle
            .start(ordinal(1))
            .start(ordinal(2))
            .complete();
        assert_eq!(state, ChainState::Completed);
        assert!(state.is_terminal());
        assert_eq!(state.halted_at(), None);
    }

    #[test]
    fn failure_kind_selects_the_halted_state() {
        let config = StepFailure::from(ConfigurationError::EmptyTemplate);
        let backend = StepFailure::from(BackendError::EmptyResponse {
            backend: BackendKind::Local,
        });

        let halted = ChainState::Running(ordinal(3)).halt(&config);
        assert_eq!(halted, ChainState::HaltedOnConfig(ordinal(3)));

        let halted = ChainState::Running(ordinal(2)).halt(&backend);
        assert_eq!(halted, ChainState::HaltedOnBackendFailure(ordinal(2)));
        assert_eq!(halted.halted_at(), Some(ordinal(2)));
    }

    #[test]
    fn rejected_output_halts_the_running_step() {
        let halted = ChainState::Running(ordinal(2)).reject_output();
        assert_eq!(halted, ChainState::HaltedOnOutput(ordinal(2)));
        assert!(halted.is_terminal());
        assert_eq!(halted.halted_at(), Some(ordinal(2)));
    }

    #[test]
    fn completing_a_halted_chain_keeps_the_halt() {
        let halted = ChainState::HaltedOnConfig(ordinal(1));
        assert_eq!(halted.complete(), halted);
    }

    #[test]
    fn idle_and_running_are_not_terminal() {
        assert!(!ChainState::Idle.is_terminal());
        assert!(!ChainState::Running(ordinal(1)).is_terminal());
    }
}
