//! `WireProtocol` trait — implement for any backend wire contract.
//!
//! An adapter knows how to turn one chat turn (message + optional persona +
//! prior history) into its protocol's JSON request body, and how to pull the
//! reply text back out of the protocol's success envelope. Transport, auth
//! header placement, and history bookkeeping live in the dispatcher; adapters
//! stay pure request/response shape logic.

use crate::error::DispatchError;
use crate::history::ConversationTurn;
use crate::persona::Persona;

/// How a backend expects its credential delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>` request header.
    Bearer,
    /// `key=<credential>` URL query parameter, the Direct upstream's
    /// convention.
    QueryKey,
}

/// One backend wire contract: build a request body, parse a success envelope.
///
/// Implementations are selected once per backend at `Dispatcher::new`, not by
/// a string comparison on every call.
pub trait WireProtocol: Send + Sync + std::fmt::Debug {
    /// Uppercase protocol tag used in diagnostics (e.g. "DIRECT").
    fn label(&self) -> &'static str;

    /// Where the credential goes, when one is configured.
    fn auth_scheme(&self) -> AuthScheme;

    /// Build the JSON request body for one chat turn.
    ///
    /// `history` is the player's prior turns, oldest first; it never contains
    /// the current `message`.
    fn build_body(
        &self,
        message: &str,
        persona: Option<&Persona>,
        history: &[ConversationTurn],
    ) -> Result<serde_json::Value, DispatchError>;

    /// Extract the reply text from an already-parsed success envelope.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Protocol` when the envelope is valid JSON but
    /// does not have this protocol's expected shape.
    fn parse_reply(&self, envelope: serde_json::Value) -> Result<String, DispatchError>;
}

/// Shared helper: encode a typed request struct into a JSON body.
pub(crate) fn encode_body<T: serde::Serialize>(request: &T) -> Result<serde_json::Value, DispatchError> {
    serde_json::to_value(request).map_err(|e| DispatchError::Protocol {
        reason: format!("failed to encode request body: {e}"),
    })
}

/// Shared helper: decode a success envelope into a typed response struct.
pub(crate) fn decode_envelope<T: serde::de::DeserializeOwned>(
    protocol: &str,
    envelope: serde_json::Value,
) -> Result<T, DispatchError> {
    serde_json::from_value(envelope).map_err(|e| DispatchError::Protocol {
        reason: format!("{protocol} response missing expected fields: {e}"),
    })
}
