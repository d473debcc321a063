//! Step results and the append-only history of one invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BackendKind, StepOrdinal, Timestamp};

/// The record of one successfully completed step.
///
/// Immutable once created: fields are private and there are no mutators.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    ordinal: StepOrdinal,
    prompt: String,
    output: String,
    backend: BackendKind,
    completed_at: Timestamp,
}

impl StepResult {
    /// Records a completed step, stamped with the current time.
    pub fn new(ordinal: StepOrdinal, prompt: String, output: String, backend: BackendKind) -> Self {
        Self {
            ordinal,
            prompt,
            output,
            backend,
            completed_at: Timestamp::now(),
        }
    }

    pub fn ordinal(&self) -> StepOrdinal {
        self.ordinal
    }

    /// The resolved prompt that was sent to the backend.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The text the backend returned.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// The wire shape of this result inside emitted frames.
    pub fn to_entry(&self) -> HistoryEntry {
        HistoryEntry {
            step: self.ordinal.get(),
            prompt: self.prompt.clone(),
            output: self.output.clone(),
            backend: self.backend.as_str().to_string(),
            completed_at: self.completed_at,
        }
    }
}

/// One history element as written into emitted frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub step: u32,
    pub prompt: String,
    pub output: String,
    pub backend: String,
    pub completed_at: Timestamp,
}

/// Ordered record of the step results of one invocation.
///
/// Insertion order is execution order. Entries can be appended but never
/// replaced or removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainHistory {
    results: Vec<StepResult>,
}

impl ChainHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result. Results must arrive in ascending ordinal order with
    /// no gaps.
    pub fn record(&mut self, result: StepResult) {
        debug_assert_eq!(
            StepOrdinal::from_index(self.results.len()),
            Some(result.ordinal()),
            "history must grow in execution order"
        );
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn last(&self) -> Option<&StepResult> {
        self.results.last()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.results.iter().map(StepResult::to_entry).collect()
    }

    /// The history as a JSON array of [`HistoryEntry`] objects.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.entries()).unwrap_or_default()
    }
}
