//! Classified failure taxonomy for dispatcher calls.
//!
//! Every failure that can escape `Dispatcher::send` is one of the four
//! variants below; raw `reqwest` errors never cross the crate boundary.
//! Raw request/response bodies are only visible on the `tracing` debug
//! channel, with credentials redacted.

use crate::util::redact_key_param;
use thiserror::Error;

/// A classified dispatcher failure.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Operator-fixable problem: unknown protocol kind, missing endpoint URL,
    /// or a 404 from upstream (which almost always means a wrong URL).
    /// Not worth retrying until the configuration changes.
    #[error("backend \"{backend}\" misconfigured: {reason}")]
    Configuration { backend: String, reason: String },

    /// Upstream answered with a non-success status other than 404. The raw
    /// error body is carried for diagnostics; retry policy is up to the
    /// caller.
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16, body: String },

    /// Connection failure, timeout, or a body that is not even valid JSON.
    /// Potentially transient; safe to retry at caller discretion.
    #[error("transport failure: {reason}")]
    Transport { reason: String, timeout: bool },

    /// The response parsed as JSON but did not contain the expected success
    /// fields. Signals an upstream contract change or a misconfigured
    /// protocol kind.
    #[error("unexpected response shape: {reason}")]
    Protocol { reason: String },
}

impl DispatchError {
    /// Classify a transport-layer error, redacting any credential that
    /// reqwest echoes back in the URL it reports.
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        Self::Transport {
            reason: redact_key_param(&err.to_string()),
            timeout: err.is_timeout(),
        }
    }

    /// Whether a retry at the caller level could plausibly succeed without
    /// an operator fixing anything first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message_names_backend() {
        let err = DispatchError::Configuration {
            backend: "main".into(),
            reason: "missing url".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("main"));
        assert!(msg.contains("missing url"));
    }

    #[test]
    fn upstream_message_carries_status_not_body() {
        let err = DispatchError::Upstream {
            status: 500,
            body: "secret internals".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(
            !msg.contains("secret internals"),
            "raw body must stay out of the caller-facing message"
        );
    }

    #[test]
    fn only_transport_is_retryable() {
        let transport = DispatchError::Transport {
            reason: "connection refused".into(),
            timeout: false,
        };
        let config = DispatchError::Configuration {
            backend: "b".into(),
            reason: "r".into(),
        };
        let protocol = DispatchError::Protocol { reason: "r".into() };
        assert!(transport.is_retryable());
        assert!(!config.is_retryable());
        assert!(!protocol.is_retryable());
    }
}
