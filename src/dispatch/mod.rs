//! Dispatcher — one backend, one history table, one `send` operation.
//!
//! A `Dispatcher` binds a validated `BackendConfig` to its protocol adapter,
//! an HTTP client with the backend's timeouts and optional proxy baked in,
//! and a per-player history window. Callers issue `send` from their own
//! async tasks; the dispatcher owns no thread pool, and concurrency is
//! whatever the callers choose.

use crate::config::{BackendConfig, ProxySettings};
use crate::error::DispatchError;
use crate::history::{ConversationTurn, HistoryStore};
use crate::persona::Persona;
use crate::protocols::{self, AuthScheme, WireProtocol};
use crate::util::{redact_key_param, truncate_with_ellipsis};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

// Debug lines carry raw bodies capped to this many characters.
const DEBUG_BODY_CHARS: usize = 2048;

/// Request dispatcher for a single configured AI backend.
#[derive(Debug)]
pub struct Dispatcher {
    config: BackendConfig,
    adapter: Box<dyn WireProtocol>,
    client: Client,
    endpoint: String,
    history: HistoryStore,
}

impl Dispatcher {
    /// Bind a backend config to its protocol adapter and HTTP client.
    ///
    /// The adapter is selected here, once; the two hard configuration
    /// conditions (unknown protocol kind, missing URL for protocols without
    /// a built-in default) are also reported here, before any call is made.
    /// Proxy settings, when enabled, become part of this dispatcher's own
    /// client; they are never installed as process-wide state, so
    /// dispatchers with different proxy needs can run concurrently without
    /// interfering.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Configuration` for an unknown protocol kind,
    /// a missing endpoint URL, or an unusable proxy address.
    pub fn new(
        config: BackendConfig,
        max_history_pairs: usize,
        proxy: Option<&ProxySettings>,
    ) -> Result<Self, DispatchError> {
        let adapter = protocols::create_adapter(&config)?;
        let endpoint = config
            .resolved_url()
            .ok_or_else(|| DispatchError::Configuration {
                backend: config.name.clone(),
                reason: format!("protocol {} requires a url", adapter.label()),
            })?;

        let mut builder = Client::builder()
            .connect_timeout(Duration::from_millis(config.timeout.connect_ms))
            .timeout(Duration::from_millis(config.timeout.read_ms));

        if let Some(proxy) = proxy.filter(|p| p.enabled) {
            debug!(
                backend = %config.name,
                proxy = %proxy.url(),
                "routing backend through forward proxy"
            );
            let proxy =
                reqwest::Proxy::all(proxy.url()).map_err(|e| DispatchError::Configuration {
                    backend: config.name.clone(),
                    reason: format!("invalid proxy address: {e}"),
                })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| DispatchError::Configuration {
            backend: config.name.clone(),
            reason: format!("failed to build http client: {e}"),
        })?;

        Ok(Self {
            config,
            adapter,
            client,
            endpoint,
            history: HistoryStore::new(max_history_pairs),
        })
    }

    /// Send one chat turn for a player and return the generated reply.
    ///
    /// Builds the protocol-specific request from the message, the optional
    /// persona, and the player's prior history; POSTs it with the backend's
    /// auth convention; classifies every failure; and appends the exchange
    /// to history only after a fully successful parse. No failure path
    /// mutates history, so it never holds an unanswered user turn.
    ///
    /// # Errors
    ///
    /// - `Configuration`: upstream returned 404 (almost always a wrong URL).
    /// - `Upstream`: any other non-success status, with the raw error body.
    /// - `Transport`: connection failure, timeout, or a non-JSON body.
    /// - `Protocol`: JSON body without the expected success fields.
    pub async fn send(
        &self,
        player_id: &str,
        message: &str,
        persona: Option<&Persona>,
    ) -> Result<String, DispatchError> {
        let history = self.history.snapshot(player_id);
        let body = self.adapter.build_body(message, persona, &history)?;
        debug!(
            backend = %self.config.name,
            url = %self.endpoint,
            body = %truncate_with_ellipsis(&body.to_string(), DEBUG_BODY_CHARS),
            "dispatching chat turn"
        );

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = self.config.credential() {
            request = match self.adapter.auth_scheme() {
                AuthScheme::Bearer => request.bearer_auth(key),
                AuthScheme::QueryKey => request.query(&[("key", key)]),
            };
        }

        let response = request
            .send()
            .await
            .map_err(|e| DispatchError::from_reqwest(&e))?;
        let status = response.status();
        debug!(backend = %self.config.name, status = status.as_u16(), "upstream responded");

        if status == StatusCode::NOT_FOUND {
            warn!(backend = %self.config.name, url = %self.endpoint, "endpoint not found");
            return Err(DispatchError::Configuration {
                backend: self.config.name.clone(),
                reason: "endpoint not found (404), check the configured url".to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| DispatchError::from_reqwest(&e))?;

        if !status.is_success() {
            warn!(
                backend = %self.config.name,
                status = status.as_u16(),
                "upstream request failed"
            );
            debug!(
                backend = %self.config.name,
                body = %truncate_with_ellipsis(&redact_key_param(&text), DEBUG_BODY_CHARS),
                "upstream error body"
            );
            return Err(DispatchError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(
            backend = %self.config.name,
            body = %truncate_with_ellipsis(&text, DEBUG_BODY_CHARS),
            "upstream raw response"
        );

        let envelope: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| DispatchError::Transport {
                reason: format!("response body is not valid JSON: {e}"),
                timeout: false,
            })?;
        let reply = self.adapter.parse_reply(envelope)?;

        let entries = self.history.record_exchange(player_id, message, &reply);
        debug!(
            backend = %self.config.name,
            player = player_id,
            entries,
            "history updated"
        );

        Ok(reply)
    }

    /// Drop one player's history. No-op if the player has none.
    pub fn clear_history(&self, player_id: &str) {
        self.history.clear(player_id);
    }

    /// Drop every player's history. The lifecycle layer calls this before
    /// discarding a dispatcher on shutdown or reload.
    pub fn clear_all_history(&self) {
        self.history.clear_all();
    }

    /// Copy of a player's current history, oldest turn first.
    pub fn history(&self, player_id: &str) -> Vec<ConversationTurn> {
        self.history.snapshot(player_id)
    }

    /// Number of stored turns for a player.
    pub fn history_len(&self, player_id: &str) -> usize {
        self.history.len(player_id)
    }

    /// Stable `name (PROTOCOL)` label for diagnostics.
    pub fn endpoint_info(&self) -> String {
        format!("{} ({})", self.config.name, self.adapter.label())
    }

    /// Configured selection weight, consumed by an external multi-backend
    /// selector. This component never chooses between backends itself.
    pub fn weight(&self) -> u32 {
        self.config.weight
    }
}

// ── Tests ────────────────────────────────────────────────────────
//
// Construction and classification tests live here; everything that needs a
// live HTTP exchange is covered by the wiremock suite in tests/.
