use std::net::SocketAddr;

use serde::Deserialize;

use stackduel_core::net::protocol::MAX_MESSAGE_SIZE;
use stackduel_core::penalty::PenaltyPolicy;
use stackduel_core::player::DEFAULT_MAX_NAME_LEN;

const CONFIG_FILE: &str = "stackduel.toml";

/// Top-level server configuration, loaded from `stackduel.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    pub limits: LimitsConfig,
    pub matchmaking: MatchmakingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            web_root: "web".to_string(),
            limits: LimitsConfig::default(),
            matchmaking: MatchmakingConfig::default(),
        }
    }
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    /// Inbound frames per second per connection. Game updates arrive once
    /// per animation frame, so this sits above 60.
    pub ws_rate_limit_per_sec: f64,
    pub player_message_buffer: usize,
    /// Largest inbound text frame accepted, in bytes.
    pub max_message_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            ws_rate_limit_per_sec: 120.0,
            player_message_buffer: 256,
            max_message_size: 16 * 1024,
        }
    }
}

/// Pairing and relay behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    pub max_name_len: usize,
    /// Push `waiting_players_update` to every connection when the queue changes.
    pub broadcast_waiting_list: bool,
    pub penalty_policy: PenaltyPolicy,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            max_name_len: DEFAULT_MAX_NAME_LEN,
            broadcast_waiting_list: true,
            penalty_policy: PenaltyPolicy::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("listen_addr {0:?} is not a valid socket address")]
    InvalidListenAddr(String),
    #[error("{0} must be > 0")]
    NotPositive(&'static str),
    #[error("limits.max_message_size must be at most {MAX_MESSAGE_SIZE}")]
    MessageSizeTooLarge,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(self.listen_addr.clone()));
        }
        if self.limits.max_ws_connections == 0 {
            return Err(ConfigError::NotPositive("limits.max_ws_connections"));
        }
        if self.limits.ws_rate_limit_per_sec <= 0.0 {
            return Err(ConfigError::NotPositive("limits.ws_rate_limit_per_sec"));
        }
        if self.limits.player_message_buffer == 0 {
            return Err(ConfigError::NotPositive("limits.player_message_buffer"));
        }
        if self.limits.max_message_size == 0 {
            return Err(ConfigError::NotPositive("limits.max_message_size"));
        }
        if self.limits.max_message_size > MAX_MESSAGE_SIZE {
            return Err(ConfigError::MessageSizeTooLarge);
        }
        if self.matchmaking.max_name_len == 0 {
            return Err(ConfigError::NotPositive("matchmaking.max_name_len"));
        }
        Ok(())
    }

    /// Load config from `stackduel.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(content) => Self::from_toml_or_default(&content),
            Err(_) => {
                tracing::info!("No {CONFIG_FILE} found, using defaults");
                Self::default()
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    fn from_toml_or_default(content: &str) -> Self {
        match toml::from_str::<Self>(content) {
            Ok(cfg) => {
                tracing::info!("Loaded configuration from {CONFIG_FILE}");
                cfg
            },
            Err(e) => {
                tracing::warn!("Failed to parse {CONFIG_FILE}: {e}, using defaults");
                Self::default()
            },
        }
    }

    /// Apply `STACKDUEL_*` and `PORT` overrides read through `lookup`.
    /// Empty or unparseable values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(addr) = var("STACKDUEL_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(port) = var("PORT") {
            match (self.listen_addr.parse::<SocketAddr>(), port.parse::<u16>()) {
                (Ok(mut addr), Ok(port)) => {
                    addr.set_port(port);
                    self.listen_addr = addr.to_string();
                },
                _ => tracing::warn!(%port, "Ignoring PORT override"),
            }
        }
        if let Some(root) = var("STACKDUEL_WEB_ROOT") {
            self.web_root = root;
        }

        // Limits overrides
        if let Some(n) = var("STACKDUEL_MAX_WS_CONNECTIONS").and_then(|v| v.parse::<usize>().ok()) {
            self.limits.max_ws_connections = n;
        }
        if let Some(n) = var("STACKDUEL_WS_RATE_LIMIT").and_then(|v| v.parse::<f64>().ok()) {
            self.limits.ws_rate_limit_per_sec = n;
        }
        if let Some(n) = var("STACKDUEL_PLAYER_MESSAGE_BUFFER").and_then(|v| v.parse::<usize>().ok()) {
            self.limits.player_message_buffer = n;
        }

        if let Some(policy) = var("STACKDUEL_PENALTY_POLICY") {
            match policy.parse::<PenaltyPolicy>() {
                Ok(p) => self.matchmaking.penalty_policy = p,
                Err(e) => tracing::warn!("Ignoring STACKDUEL_PENALTY_POLICY: {e}"),
            }
        }
    }
}
