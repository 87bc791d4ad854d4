#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

//! CraftChat — conversational-AI request dispatcher for game servers.
//!
//! Given a player identifier, a free-text message, and an optional persona,
//! a [`Dispatcher`] produces a generated reply from one externally configured
//! AI backend, keeping a bounded per-player rolling history as context for
//! subsequent turns. Three wire protocols hide behind one `send` operation:
//! the native generative-content protocol, a custom relay protocol, and the
//! OpenAI-compatible chat-completion protocol.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod persona;
pub mod protocols;
pub mod util;

pub use config::{
    BackendConfig, GenerationParams, ProtocolKind, ProxyKind, ProxySettings, TimeoutSettings,
};
pub use dispatch::Dispatcher;
pub use error::DispatchError;
pub use history::{ConversationTurn, Role};
pub use persona::Persona;
