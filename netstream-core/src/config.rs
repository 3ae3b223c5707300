use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub signaling: SignalingConfig,
    pub webrtc: WebRTCConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// How long shutdown waits for open connections to close
    pub drain_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 8080,
            drain_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

/// Signaling connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    /// Largest accepted inbound frame, in bytes
    pub max_message_size: usize,
    /// Interval between server pings
    pub ping_interval_seconds: u64,
    /// A connection silent for longer than this is considered dead
    pub ping_timeout_seconds: u64,
    /// Outbound frames queued per connection before sends start failing
    pub outbound_buffer: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024,
            ping_interval_seconds: 5,
            ping_timeout_seconds: 30,
            outbound_buffer: 128,
        }
    }
}

/// A STUN or TURN server handed to browsers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    #[must_use]
    pub fn stun(url: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
            username: None,
            credential: None,
        }
    }

    #[must_use]
    pub fn turn(url: &str, username: &str, credential: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
            username: Some(username.to_string()),
            credential: Some(credential.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebRTCConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for WebRTCConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                IceServerConfig::stun("stun:stun.l.google.com:19302"),
                IceServerConfig::stun("stun:stun1.l.google.com:19302"),
                IceServerConfig::stun("stun:stun2.l.google.com:19302"),
                IceServerConfig::stun("stun:stun3.l.google.com:19302"),
                IceServerConfig::stun("stun:stun4.l.google.com:19302"),
                // Public relay for clients behind symmetric NAT
                IceServerConfig::turn(
                    "turn:openrelay.metered.ca:80",
                    "openrelayproject",
                    "openrelayproject",
                ),
                IceServerConfig::turn(
                    "turn:openrelay.metered.ca:443",
                    "openrelayproject",
                    "openrelayproject",
                ),
            ],
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // NETSTREAM_SERVER__HTTP_PORT, NETSTREAM_SIGNALING__MAX_CHAT_LENGTH, ...
        builder = builder.add_source(
            Environment::with_prefix("NETSTREAM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }

    /// Check every setting, collecting all problems
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }
        if self.server.http_port == 0 {
            errors.push("server.http_port must be greater than 0".to_string());
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            ));
        }
        if crate::logging::parse_log_level(&self.logging.level).is_err() {
            errors.push(format!("logging.level is invalid: \"{}\"", self.logging.level));
        }

        let signaling = &self.signaling;
        if signaling.max_message_size < 1024 {
            errors.push("signaling.max_message_size must be at least 1024 bytes".to_string());
        }
        if signaling.ping_interval_seconds == 0 {
            errors.push("signaling.ping_interval_seconds must be greater than 0".to_string());
        }
        if signaling.ping_timeout_seconds <= signaling.ping_interval_seconds {
            errors.push(
                "signaling.ping_timeout_seconds must be greater than ping_interval_seconds"
                    .to_string(),
            );
        }
        if signaling.outbound_buffer == 0 {
            errors.push("signaling.outbound_buffer must be greater than 0".to_string());
        }

        for (index, server) in self.webrtc.ice_servers.iter().enumerate() {
            if server.urls.is_empty() {
                errors.push(format!("webrtc.ice_servers[{index}] has no urls"));
            }
            for url in &server.urls {
                let is_turn = url.starts_with("turn:") || url.starts_with("turns:");
                if !(is_turn || url.starts_with("stun:") || url.starts_with("stuns:")) {
                    errors.push(format!(
                        "webrtc.ice_servers[{index}] url must start with stun: or turn:, got \"{url}\""
                    ));
                }
                if is_turn && (server.username.is_none() || server.credential.is_none()) {
                    errors.push(format!(
                        "webrtc.ice_servers[{index}] TURN url \"{url}\" requires username and credential"
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
