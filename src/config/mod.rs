//! Backend configuration — typed view over loader-supplied backend tables.
//!
//! The configuration loader hands each backend entry over as an untyped
//! `toml::value::Table` edited by server operators. Construction is
//! deliberately permissive: absent or wrong-typed keys fall back to documented
//! defaults instead of failing, so one malformed entry cannot take the whole
//! plugin down at load time. The only hard conditions (unknown protocol kind,
//! missing URL for Relay/OpenAI-compatible backends) are reported when the
//! backend is first used, at `Dispatcher::new`.

use toml::value::{Table, Value};

/// Built-in endpoint for the Direct protocol when no `url` is configured.
pub const DIRECT_DEFAULT_URL: &str =
    "https://generativelanguage.googleapis.com/v1/models/gemini-pro:generateContent";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

// ── Protocol kind ────────────────────────────────────────────────

/// Which of the supported wire contracts a backend speaks.
///
/// Parsed from the loader's `type` string. Unrecognized strings are preserved
/// as `Unknown` so config construction never fails; they surface as a
/// configuration error when a dispatcher is built for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolKind {
    /// Native generative-content protocol (`contents`/`candidates` envelope).
    Direct,
    /// Custom relay protocol (`{message, persona, history}` in, `{response}` out).
    Relay,
    /// OpenAI-compatible chat completion (`messages`/`choices` envelope).
    OpenAiCompatible,
    /// Anything else the operator typed; rejected at first use.
    Unknown(String),
}

impl ProtocolKind {
    /// Parse a loader-supplied `type` string. Case-insensitive.
    ///
    /// The legacy loader spelling for the relay protocol is `"proxy"`;
    /// `"relay"` is accepted as an alias.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "direct" => Self::Direct,
            "proxy" | "relay" => Self::Relay,
            "openai" => Self::OpenAiCompatible,
            _ => Self::Unknown(raw.to_string()),
        }
    }
}

// ── Generation parameters ────────────────────────────────────────

/// Model and sampling parameters for a backend.
///
/// The Direct protocol ignores configured values and uses the fixed defaults
/// below; the OpenAI-compatible protocol reads all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_tokens: u32,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_tokens: 1024,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────

/// Connect/read timeouts for one backend, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSettings {
    pub connect_ms: u64,
    pub read_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connect_ms: DEFAULT_TIMEOUT_MS,
            read_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

// ── Proxy ────────────────────────────────────────────────────────

/// Forward-proxy flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    Http,
    Socks,
}

/// Optional forward proxy for outbound backend calls.
///
/// Applied per dispatcher at client construction, never as process-global
/// state, so concurrent dispatchers with different proxy needs cannot
/// interfere with each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub kind: ProxyKind,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: 0,
            kind: ProxyKind::Http,
        }
    }
}

impl ProxySettings {
    /// Proxy URL in the scheme reqwest expects.
    pub fn url(&self) -> String {
        match self.kind {
            ProxyKind::Http => format!("http://{}:{}", self.host, self.port),
            ProxyKind::Socks => format!("socks5://{}:{}", self.host, self.port),
        }
    }
}

// ── Backend config ───────────────────────────────────────────────

/// Immutable description of one AI backend.
///
/// Constructed once at (re)load time from the loader's untyped table and
/// replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub name: String,
    pub protocol: ProtocolKind,
    pub url: Option<String>,
    pub key: Option<String>,
    pub weight: u32,
    pub generation: GenerationParams,
    pub timeout: TimeoutSettings,
}

impl BackendConfig {
    /// Build a config from an untyped backend table and its `type` string.
    ///
    /// Every lookup is defensive: missing or wrong-typed values fall back to
    /// defaults, numeric values are coerced across integer/float
    /// representations, and construction itself never fails.
    pub fn from_table(table: &Table, protocol: &str) -> Self {
        let defaults = GenerationParams::default();
        let generation = GenerationParams {
            model: str_or(table, "model", &defaults.model),
            temperature: f64_or(table, "temperature", defaults.temperature),
            top_p: f64_or(table, "top_p", defaults.top_p),
            top_k: u32_or(table, "top_k", defaults.top_k),
            max_tokens: u32_or(table, "max_tokens", defaults.max_tokens),
            frequency_penalty: f64_or(table, "frequency_penalty", defaults.frequency_penalty),
            presence_penalty: f64_or(table, "presence_penalty", defaults.presence_penalty),
        };

        let timeout = match table.get("timeout") {
            Some(Value::Table(nested)) => TimeoutSettings {
                connect_ms: u64_or(nested, "connect", DEFAULT_TIMEOUT_MS),
                read_ms: u64_or(nested, "read", DEFAULT_TIMEOUT_MS),
            },
            _ => TimeoutSettings::default(),
        };

        Self {
            name: str_or(table, "name", "unnamed"),
            protocol: ProtocolKind::parse(protocol),
            url: opt_str(table, "url"),
            key: opt_str(table, "key"),
            weight: u32_or(table, "weight", 1),
            generation,
            timeout,
        }
    }

    /// Endpoint URL with the Direct protocol's built-in default applied.
    ///
    /// `None` means the backend needs a URL and none was configured.
    pub fn resolved_url(&self) -> Option<String> {
        match (&self.protocol, &self.url) {
            (_, Some(url)) => Some(url.clone()),
            (ProtocolKind::Direct, None) => Some(DIRECT_DEFAULT_URL.to_string()),
            _ => None,
        }
    }

    /// Credential, with empty strings treated as absent.
    pub fn credential(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }
}

// ── Defensive table lookups ──────────────────────────────────────

fn opt_str(table: &Table, field: &str) -> Option<String> {
    match table.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn str_or(table: &Table, field: &str, default: &str) -> String {
    opt_str(table, field).unwrap_or_else(|| default.to_string())
}

fn f64_or(table: &Table, field: &str, default: f64) -> f64 {
    match table.get(field) {
        Some(Value::Float(f)) => *f,
        #[allow(clippy::cast_precision_loss)]
        Some(Value::Integer(i)) => *i as f64,
        _ => default,
    }
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn u64_or(table: &Table, field: &str, default: u64) -> u64 {
    match table.get(field) {
        Some(Value::Integer(i)) if *i >= 0 => *i as u64,
        Some(Value::Float(f)) if *f >= 0.0 => *f as u64,
        _ => default,
    }
}

fn u32_or(table: &Table, field: &str, default: u32) -> u32 {
    u32::try_from(u64_or(table, field, u64::from(default))).unwrap_or(default)
}

// ── Tests ────────────────────────────────────────────────────────
