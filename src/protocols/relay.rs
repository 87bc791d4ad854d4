//! Relay protocol — the simplified custom intermediary contract.
//!
//! Requests are a flat `{message, persona?, history?}` object; replies are a
//! single top-level `response` string. Optional fields are omitted entirely
//! when absent, matching what relay servers in the field expect.

use crate::error::DispatchError;
use crate::history::ConversationTurn;
use crate::persona::Persona;
use crate::protocols::traits::{decode_envelope, encode_body, AuthScheme, WireProtocol};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub struct RelayProtocol;

impl RelayProtocol {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    persona: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<&'a [ConversationTurn]>,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    response: String,
}

impl WireProtocol for RelayProtocol {
    fn label(&self) -> &'static str {
        "RELAY"
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::Bearer
    }

    fn build_body(
        &self,
        message: &str,
        persona: Option<&Persona>,
        history: &[ConversationTurn],
    ) -> Result<serde_json::Value, DispatchError> {
        encode_body(&RelayRequest {
            message,
            persona: persona.map(Persona::context),
            history: if history.is_empty() {
                None
            } else {
                Some(history)
            },
        })
    }

    fn parse_reply(&self, envelope: serde_json::Value) -> Result<String, DispatchError> {
        let response: RelayResponse = decode_envelope("relay", envelope)?;
        Ok(response.response)
    }
}

// ── Tests ────────────────────────────────────────────────────────
