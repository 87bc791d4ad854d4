//! Wire-protocol adapters — one per supported backend contract.
//!
//! Three incompatible external contracts hide behind the `WireProtocol`
//! trait: the native generative-content protocol (Direct), a custom relay
//! protocol (Relay), and the OpenAI-compatible chat-completion protocol.
//! The factory below picks the adapter once per backend; nothing re-inspects
//! the protocol kind on the request path.

mod direct;
mod openai;
mod relay;
pub mod traits;

pub use direct::DirectProtocol;
pub use openai::OpenAiProtocol;
pub use relay::RelayProtocol;
pub use traits::{AuthScheme, WireProtocol};

use crate::config::{BackendConfig, ProtocolKind};
use crate::error::DispatchError;

/// Select the adapter for a backend's configured protocol kind.
///
/// # Errors
///
/// Returns `DispatchError::Configuration` for an unrecognized kind; no
/// network call is ever attempted for such a backend.
pub fn create_adapter(config: &BackendConfig) -> Result<Box<dyn WireProtocol>, DispatchError> {
    match &config.protocol {
        ProtocolKind::Direct => Ok(Box::new(DirectProtocol::new())),
        ProtocolKind::Relay => Ok(Box::new(RelayProtocol::new())),
        ProtocolKind::OpenAiCompatible => {
            Ok(Box::new(OpenAiProtocol::new(config.generation.clone())))
        }
        ProtocolKind::Unknown(other) => Err(DispatchError::Configuration {
            backend: config.name.clone(),
            reason: format!("unknown protocol kind \"{other}\", valid: direct, proxy, openai"),
        }),
    }
}

// ── Tests ────────────────────────────────────────────────────────
