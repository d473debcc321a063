//! Newtype domain identifiers.
//!
//! Every concept with an identity is a distinct newtype wrapping a primitive,
//! so a [`StepOrdinal`] can never be confused with a raw count or a
//! [`NodeId`] with arbitrary text.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MAX_STEPS;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Identifies a node instance within the surrounding pipeline graph.
    ///
    /// Used only for log correlation; the engine never routes on it.
    NodeId
}

// ---------------------------------------------------------------------------
// Step ordinals
// ---------------------------------------------------------------------------

/// 1-based position of a step within a chain.
///
/// Always in `1..=MAX_STEPS`. Ordinals double as output channel names
/// (`step1`, `step2`, ...), so the bound is part of the node's external
/// interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepOrdinal(u32);

impl StepOrdinal {
    /// The first step of every chain.
    pub const FIRST: StepOrdinal = StepOrdinal(1);

    /// Creates an ordinal, returning `None` outside `1..=MAX_STEPS`.
    pub fn new(value: u32) -> Option<Self> {
        if (1..=MAX_STEPS as u32).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Ordinal for the zero-based position `index` in a step list.
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index + 1).ok().and_then(Self::new)
    }

    /// Returns the underlying 1-based value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns `true` for step 1.
    pub fn is_first(self) -> bool {
        self.0 == 1
    }
}

impl std::fmt::Display for StepOrdinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one chain invocation (one input payload).
///
/// Generated fresh for every processed frame and attached to the invocation
/// span so all step activity for one payload can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_rejects_zero_and_values_past_the_step_limit() {
        assert!(StepOrdinal::new(0).is_none());
        assert!(StepOrdinal::new(MAX_STEPS as u32 + 1).is_none());
        assert_eq!(StepOrdinal::new(10).map(StepOrdinal::get), Some(10));
    }

    #[test]
    fn ordinal_from_index_is_one_based() {
        assert_eq!(StepOrdinal::from_index(0), Some(StepOrdinal::FIRST));
        assert_eq!(StepOrdinal::from_index(9).map(StepOrdinal::get), Some(10));
        assert!(StepOrdinal::from_index(10).is_none());
    }

    #[test]
    fn empty_node_id_is_rejected() {
        assert!(NodeId::new("").is_none());
        assert_eq!(NodeId::new("chain").unwrap().as_str(), "chain");
    }
}
