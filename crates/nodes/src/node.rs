//! The prompt chain node as seen by the surrounding runtime.

use pipeline::{
    ChainConfig, ChainConfigError, ChainSettings, Frame, NodeId, OutputChannel, OutputRejected,
    OutputSink,
};
use thiserror::Error;
use tracing::{info_span, Instrument};

use crate::dispatcher::BackendDispatcher;
use crate::executor::{StepExecutor, StepRunner};
use crate::orchestrator::{ChainOrchestrator, ChainOutcome};

/// Errors the node returns to the runtime.
///
/// Step failures are not among them: they end the chain in a halted outcome.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The runtime refused one of the node's output frames.
    #[error(transparent)]
    Output(#[from] OutputRejected),
}

/// A configured prompt chain node.
///
/// Configuration is validated once, at construction. Each call to
/// [`PromptChainNode::process`] is an independent invocation.
#[derive(Debug, Clone)]
pub struct PromptChainNode<R = StepExecutor> {
    id: NodeId,
    config: ChainConfig,
    orchestrator: ChainOrchestrator<R>,
}

impl PromptChainNode<StepExecutor> {
    /// Builds a node from raw settings, dispatching through `dispatcher`.
    ///
    /// Fails if the step count or a temperature is out of range; no step
    /// ever runs with such a configuration.
    pub fn new(
        id: NodeId,
        settings: ChainSettings,
        dispatcher: BackendDispatcher,
    ) -> Result<Self, ChainConfigError> {
        let config = settings.into_chain_config()?;
        Ok(Self::with_runner(id, config, StepExecutor::new(dispatcher)))
    }
}

impl<R: StepRunner> PromptChainNode<R> {
    /// Builds a node around an already validated chain and a custom runner.
    pub fn with_runner(id: NodeId, config: ChainConfig, runner: R) -> Self {
        Self {
            id,
            config,
            orchestrator: ChainOrchestrator::new(runner),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// The outputs this node can write to: `step1..stepN`, then `final`.
    pub fn outputs(&self) -> Vec<OutputChannel> {
        self.config
            .steps()
            .iter()
            .map(|step| OutputChannel::Step(step.ordinal()))
            .chain(std::iter::once(OutputChannel::Final))
            .collect()
    }

    /// Runs the chain for one incoming frame.
    pub async fn process(&self, frame: Frame, sink: &dyn OutputSink) -> Result<ChainOutcome, NodeError> {
        let span = info_span!("node.process", node = %self.id);
        let outcome = self
            .orchestrator
            .run(&self.config, &frame, sink)
            .instrument(span)
            .await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{StepSettings, MAX_STEPS};

    fn node_id() -> NodeId {
        NodeId::new("chain").unwrap()
    }

    #[test]
    fn too_many_steps_are_rejected_at_construction() {
        let settings = ChainSettings {
            num_steps: MAX_STEPS + 1,
            steps: Vec::new(),
        };
        let err = PromptChainNode::new(node_id(), settings, BackendDispatcher::new()).unwrap_err();
        assert_eq!(
            err,
            ChainConfigError::StepCountOutOfRange {
                requested: MAX_STEPS + 1,
                max: MAX_STEPS
            }
        );
    }

    #[test]
    fn outputs_list_active_steps_then_final() {
        let settings = ChainSettings {
            num_steps: 3,
            steps: vec![StepSettings::default()],
        };
        let node = PromptChainNode::new(node_id(), settings, BackendDispatcher::new()).unwrap();

        let names: Vec<String> = node.outputs().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["step1", "step2", "step3", "final"]);
    }
}
