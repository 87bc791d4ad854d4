//! OpenAI-compatible protocol — the chat-completion contract.
//!
//! Requests carry a `messages` array plus snake_case sampling parameters read
//! from configuration; replies come back as `choices[0].message.content`.
//! A persona becomes a leading system-role message.

use crate::config::GenerationParams;
use crate::error::DispatchError;
use crate::history::{ConversationTurn, Role};
use crate::persona::Persona;
use crate::protocols::traits::{decode_envelope, encode_body, AuthScheme, WireProtocol};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub struct OpenAiProtocol {
    params: GenerationParams,
}

impl OpenAiProtocol {
    pub fn new(params: GenerationParams) -> Self {
        Self { params }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

impl Message {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

impl WireProtocol for OpenAiProtocol {
    fn label(&self) -> &'static str {
        "OPENAI"
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
        let mut messages = Vec::with_capacity(history.len() + 2);

        if let Some(persona) = persona {
            messages.push(Message::new(Role::System.as_str(), persona.context()));
        }
        for turn in history {
            messages.push(Message::new(turn.role.as_str(), &turn.content));
        }
        messages.push(Message::new(Role::User.as_str(), message));

        encode_body(&ChatRequest {
            model: &self.params.model,
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            top_p: self.params.top_p,
            frequency_penalty: self.params.frequency_penalty,
            presence_penalty: self.params.presence_penalty,
            messages,
        })
    }

    fn parse_reply(&self, envelope: serde_json::Value) -> Result<String, DispatchError> {
        let response: ChatResponse = decode_envelope("openai", envelope)?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| DispatchError::Protocol {
                reason: "openai response has no choices".to_string(),
            })
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> OpenAiProtocol {
        OpenAiProtocol::new(GenerationParams::default())
    }

    fn body(
        message: &str,
        persona: Option<&Persona>,
        history: &[ConversationTurn],
    ) -> serde_json::Value {
        adapter().build_body(message, persona, history).unwrap()
    }

    #[test]
    fn body_uses_messages_not_contents() {
        let b = body("hi", None, &[]);
        assert!(b.get("messages").is_some());
        assert!(b.get("contents").is_none());
    }

    #[test]
    fn sampling_params_are_snake_case() {
        let b = body("hi", None, &[]);
        assert_eq!(b["top_p"], 0.95);
        assert_eq!(b["max_tokens"], 1024);
        assert_eq!(b["frequency_penalty"], 0.0);
        assert_eq!(b["presence_penalty"], 0.0);
        assert!(b.get("topP").is_none());
        assert!(b.get("generationConfig").is_none());
    }

    #[test]
    fn configured_params_are_honored() {
        let params = GenerationParams {
            model: "gpt-4".to_string(),
            temperature: 0.1,
            max_tokens: 64,
            ..GenerationParams::default()
        };
        let b = OpenAiProtocol::new(params).build_body("hi", None, &[]).unwrap();
        assert_eq!(b["model"], "gpt-4");
        assert_eq!(b["temperature"], 0.1);
        assert_eq!(b["max_tokens"], 64);
    }

    #[test]
    fn persona_becomes_leading_system_message() {
        let persona = Persona::new("You are a pirate.");
        let b = body("ahoy", Some(&persona), &[]);
        let messages = b["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You are a pirate.");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "ahoy");
    }

    #[test]
    fn history_precedes_current_message() {
        let history = [
            ConversationTurn::user("one"),
            ConversationTurn::assistant("two"),
        ];
        let b = body("three", None, &history);
        let messages = b["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["content"], "one");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["content"], "three");
    }

    #[test]
    fn persona_leads_even_with_history() {
        let persona = Persona::new("ctx");
        let history = [
            ConversationTurn::user("one"),
            ConversationTurn::assistant("two"),
        ];
        let b = body("three", Some(&persona), &history);
        let messages = b["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
    }

    #[test]
    fn reply_parses_first_choice() {
        let envelope = serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        });
        let reply = adapter().parse_reply(envelope).unwrap();
        assert_eq!(reply, "first");
    }

    #[test]
    fn empty_choices_is_protocol_error() {
        let envelope = serde_json::json!({"choices": []});
        let err = adapter().parse_reply(envelope).unwrap_err();
        assert!(matches!(err, DispatchError::Protocol { .. }));
    }

    #[test]
    fn missing_choices_is_protocol_error() {
        let envelope = serde_json::json!({"error": {"message": "quota"}});
        let err = adapter().parse_reply(envelope).unwrap_err();
        assert!(matches!(err, DispatchError::Protocol { .. }));
    }

    #[test]
    fn credential_goes_in_bearer_header() {
        assert_eq!(adapter().auth_scheme(), AuthScheme::Bearer);
    }
}
