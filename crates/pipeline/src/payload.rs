//! The frame carried between pipeline nodes, and the well-known keys the
//! chain node reads from and writes into it.
//!
//! The node treats [`Frame::other_data`] as an opaque mapping: it reads
//! [`keys::MESSAGE`] or [`keys::API`], and writes only `chain_*` keys into
//! copies of the incoming frame. Unrelated keys are carried through as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known keys in [`Frame::other_data`].
pub mod keys {
    /// Free-text input message.
    pub const MESSAGE: &str = "message";
    /// Chat-style message list (`[{ "role": ..., "content": ... }]`).
    pub const API: &str = "api";

    /// Per-step output: step ordinal.
    pub const CHAIN_STEP: &str = "chain_step";
    /// Per-step output: resolved prompt.
    pub const CHAIN_PROMPT: &str = "chain_prompt";
    /// Per-step output: generated text.
    pub const CHAIN_OUTPUT: &str = "chain_output";
    /// Per-step output: backend identifier.
    pub const CHAIN_MODEL: &str = "chain_model";
    /// Per-step and final output: history accumulated so far.
    pub const CHAIN_HISTORY: &str = "chain_history";

    /// Final output: last available output text.
    pub const CHAIN_FINAL_OUTPUT: &str = "chain_final_output";
    /// Final output: number of steps actually executed.
    pub const CHAIN_STEPS: &str = "chain_steps";
    /// Final output: `true` only when every step completed.
    pub const CHAIN_COMPLETE: &str = "chain_complete";
    /// Final output on halt: the failure message.
    pub const CHAIN_ERROR: &str = "chain_error";
    /// Final output on halt: ordinal of the step that failed.
    pub const CHAIN_FAILED_STEP: &str = "chain_failed_step";
}

/// A unit of data flowing between pipeline nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Runtime-assigned frame identifier, propagated unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,

    /// Transport headers, propagated unchanged.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Auxiliary data mapping.
    #[serde(default)]
    pub other_data: Map<String, Value>,
}

impl Frame {
    /// A frame carrying only a free-text [`keys::MESSAGE`].
    pub fn with_message(message: impl Into<String>) -> Self {
        let mut other_data = Map::new();
        other_data.insert(keys::MESSAGE.to_string(), Value::String(message.into()));
        Self {
            other_data,
            ..Self::default()
        }
    }

    /// Copies this frame and overlays `entries` onto the copy's
    /// `other_data`. The original is left untouched.
    pub fn derive<I>(&self, entries: I) -> Frame
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let mut derived = self.clone();
        for (key, value) in entries {
            derived.other_data.insert(key.to_string(), value);
        }
        derived
    }

    /// Reads a string value from `other_data`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.other_data.get(key).and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Input extraction
// ---------------------------------------------------------------------------

/// Where the chain's input text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// [`keys::MESSAGE`].
    Message,
    /// The latest user entry in [`keys::API`].
    Api,
    /// Neither location held any text; the input is empty.
    Missing,
}

/// The chain's input text and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputText {
    pub text: String,
    pub source: InputSource,
}

/// Extracts the chain input from `frame`.
///
/// [`keys::MESSAGE`] wins when it holds non-blank text; otherwise the latest
/// `role == "user"` entry of [`keys::API`] is used. Content may be a string
/// or a list of parts, in which case the `type == "text"` parts are joined
/// with a space. When neither yields text the result is empty with
/// [`InputSource::Missing`]; this is not an error.
pub fn extract_input(frame: &Frame) -> InputText {
    if let Some(text) = frame.other_data.get(keys::MESSAGE).and_then(message_text) {
        return InputText {
            text,
            source: InputSource::Message,
        };
    }

    if let Some(text) = frame.other_data.get(keys::API).and_then(latest_user_text) {
        return InputText {
            text,
            source: InputSource::Api,
        };
    }

    InputText {
        text: String::new(),
        source: InputSource::Missing,
    }
}

fn message_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    non_blank(text)
}

fn latest_user_text(value: &Value) -> Option<String> {
    let entry = value
        .as_array()?
        .iter()
        .rev()
        .find(|entry| entry.get("role").and_then(Value::as_str) == Some("user"))?;

    let text = match entry.get("content")? {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" "),
        _ => return None,
    };
    non_blank(text)
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
