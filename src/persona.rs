//! Persona — a reusable system-prompt-like context string.
//!
//! Personas are stored and selected by an external collaborator; the
//! dispatcher only consumes the derived context string. Where it lands in the
//! request depends on the protocol: a leading synthetic user turn (Direct), a
//! system-role message (OpenAI-compatible), or a bare `persona` field (Relay).

/// Read-only persona context handed in by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    context: String,
}

impl Persona {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }

    /// The context string injected into outbound requests.
    pub fn context(&self) -> &str {
        &self.context
    }
}
