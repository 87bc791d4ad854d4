//! Direct protocol — the native generative-content contract.
//!
//! Requests carry a `contents` array of role-tagged part lists plus a fixed
//! camelCase `generationConfig`; replies come back as
//! `candidates[0].content.parts[0].text`. The credential travels as a `key`
//! URL query parameter rather than a header.

use crate::error::DispatchError;
use crate::history::ConversationTurn;
use crate::persona::Persona;
use crate::protocols::traits::{decode_envelope, encode_body, AuthScheme, WireProtocol};
use serde::{Deserialize, Serialize};

// Fixed sampling defaults for this protocol; configured generation
// parameters are not consulted.
const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.95;
const TOP_K: u32 = 40;
const MAX_OUTPUT_TOKENS: u32 = 1024;

#[derive(Debug)]
pub struct DirectProtocol;

impl DirectProtocol {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
    role: String,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: String,
}

fn content(role: &str, text: &str) -> Content {
    Content {
        parts: vec![Part {
            text: text.to_string(),
        }],
        role: role.to_string(),
    }
}

impl WireProtocol for DirectProtocol {
    fn label(&self) -> &'static str {
        "DIRECT"
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::QueryKey
    }

    fn build_body(
        &self,
        message: &str,
        persona: Option<&Persona>,
        history: &[ConversationTurn],
    ) -> Result<serde_json::Value, DispatchError> {
        let mut contents = Vec::with_capacity(history.len() + 2);

        // The persona rides as a synthetic user turn, but only at the start
        // of a conversation; afterwards the history already carries it.
        if history.is_empty() {
            if let Some(persona) = persona {
                contents.push(content("user", persona.context()));
            }
        }

        for turn in history {
            contents.push(content(turn.role.as_str(), &turn.content));
        }
        contents.push(content("user", message));

        encode_body(&GenerateRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                top_k: TOP_K,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        })
    }

    fn parse_reply(&self, envelope: serde_json::Value) -> Result<String, DispatchError> {
        let response: GenerateResponse = decode_envelope("direct", envelope)?;
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| DispatchError::Protocol {
                reason: "direct response has no candidates".to_string(),
            })
    }
}

// ── Tests ────────────────────────────────────────────────────────
