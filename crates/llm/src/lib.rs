//! Text generation backends over HTTP.
//!
//! Implements [`pipeline::GenerationBackend`] for OpenAI, for Anthropic, and
//! for a co-located OpenAI-compatible server that serves the `local` backend.
//! Adding a provider means adding a module here and a [`pipeline::BackendKind`]
//! variant; the chain engine does not change.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, request formatting, response
//! parsing and status-code mapping live here. The [`pipeline`] crate sees
//! only [`pipeline::GenerationBackend`] and [`pipeline::BackendError`].
//!
//! ## Module Layout
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | `settings`    | [`ProviderSettings`]: base URL, model, token limit    |
//! | `http`        | Shared JSON transport and HTTP status mapping         |
//! | `openai`      | [`OpenAiBackend`] (remote `openai` and `local`)        |
//! | `anthropic`   | [`AnthropicBackend`]                                   |

mod anthropic;
mod http;
mod openai;
mod settings;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;
pub use settings::{
    ProviderSettings, ANTHROPIC_BASE_URL, ANTHROPIC_MODEL, DEFAULT_MAX_TOKENS, OPENAI_BASE_URL,
    OPENAI_MODEL,
};
