//! Client configuration loading from file and environment variables.

use mentor_transport::WsConfig;
use mentor_types::ConversationIdentity;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where the mentor endpoint lives.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Voice reply playback settings.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Endpoint addresses and timeouts.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the persistent channel, e.g. `ws://localhost:8000`.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Base URL of the request/response fallback.
    #[serde(default = "default_http_url")]
    pub http_url: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Identity the conversation is scoped to. Numeric identities are sent
    /// as numbers.
    #[serde(default = "default_identity")]
    pub identity: ConversationIdentity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Directory voice replies are written to when played.
    #[serde(default = "default_audio_dir")]
    pub output_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "mentor_transport=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_ws_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_http_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_identity() -> ConversationIdentity {
    ConversationIdentity::from(1)
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("mentor-audio")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            http_url: default_http_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            identity: default_identity(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            output_dir: default_audio_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl EndpointConfig {
    pub fn ws_config(&self) -> WsConfig {
        let mut config = WsConfig::new(self.ws_url.clone());
        config.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MENTOR_WS_URL` overrides `endpoint.ws_url`
/// - `MENTOR_HTTP_URL` overrides `endpoint.http_url`
/// - `MENTOR_CONNECT_TIMEOUT_SECS` overrides `endpoint.connect_timeout_secs`
/// - `MENTOR_REQUEST_TIMEOUT_SECS` overrides `endpoint.request_timeout_secs`
/// - `MENTOR_IDENTITY` overrides `conversation.identity`
/// - `MENTOR_AUDIO_DIR` overrides `audio.output_dir`
/// - `MENTOR_LOG_LEVEL` overrides `logging.level`
/// - `MENTOR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies overrides from `lookup`. Unparsable numbers and blank values
/// are ignored.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = var("MENTOR_WS_URL") {
        config.endpoint.ws_url = url;
    }
    if let Some(url) = var("MENTOR_HTTP_URL") {
        config.endpoint.http_url = url;
    }
    if let Some(secs) = var("MENTOR_CONNECT_TIMEOUT_SECS") {
        if let Ok(parsed) = secs.trim().parse() {
            config.endpoint.connect_timeout_secs = parsed;
        }
    }
    if let Some(secs) = var("MENTOR_REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = secs.trim().parse() {
            config.endpoint.request_timeout_secs = parsed;
        }
    }
    if let Some(identity) = var("MENTOR_IDENTITY") {
        config.conversation.identity = ConversationIdentity::new(identity.trim());
    }
    if let Some(dir) = var("MENTOR_AUDIO_DIR") {
        config.audio.output_dir = PathBuf::from(dir);
    }
    if let Some(level) = var("MENTOR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("MENTOR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_local_endpoint() {
        let config = Config::default();
        assert_eq!(config.endpoint.ws_url, "ws://localhost:8000");
        assert_eq!(config.endpoint.http_url, "http://localhost:8000");
        assert_eq!(config.endpoint.connect_timeout_secs, 10);
        assert_eq!(config.endpoint.request_timeout_secs, 30);
        assert_eq!(config.conversation.identity.as_str(), "1");
        assert_eq!(config.audio.output_dir, PathBuf::from("mentor-audio"));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn reads_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[endpoint]
ws_url = "ws://mentor.internal:9000"
request_timeout_secs = 5

[conversation]
identity = 42

[logging]
json = true
"#
        )
        .unwrap();

        let mut config: Config =
            toml::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        apply_env_overrides(&mut config, |_| None);

        assert_eq!(config.endpoint.ws_url, "ws://mentor.internal:9000");
        assert_eq!(config.endpoint.http_url, "http://localhost:8000");
        assert_eq!(config.endpoint.request_timeout_secs, 5);
        assert_eq!(config.endpoint.connect_timeout_secs, 10);
        assert_eq!(config.conversation.identity.as_str(), "42");
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn string_identity_in_toml() {
        let config: Config = toml::from_str("[conversation]\nidentity = \"coach-7\"\n").unwrap();
        assert_eq!(config.conversation.identity.as_str(), "coach-7");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.endpoint.request_timeout_secs, 30);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[endpoint\nws_url = ").unwrap();
        let result = load_config(file.path().to_str());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                ("MENTOR_WS_URL", "ws://10.0.0.2:8000"),
                ("MENTOR_HTTP_URL", "http://10.0.0.2:8000"),
                ("MENTOR_CONNECT_TIMEOUT_SECS", "3"),
                ("MENTOR_REQUEST_TIMEOUT_SECS", "not-a-number"),
                ("MENTOR_IDENTITY", " 9 "),
                ("MENTOR_AUDIO_DIR", "/tmp/replies"),
                ("MENTOR_LOG_LEVEL", "debug"),
                ("MENTOR_LOG_JSON", "1"),
            ]),
        );

        assert_eq!(config.endpoint.ws_url, "ws://10.0.0.2:8000");
        assert_eq!(config.endpoint.http_url, "http://10.0.0.2:8000");
        assert_eq!(config.endpoint.connect_timeout_secs, 3);
        assert_eq!(config.endpoint.request_timeout_secs, 30);
        assert_eq!(config.conversation.identity.as_str(), "9");
        assert_eq!(config.audio.output_dir, PathBuf::from("/tmp/replies"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[("MENTOR_WS_URL", "  "), ("MENTOR_IDENTITY", "")]),
        );
        assert_eq!(config.endpoint.ws_url, "ws://localhost:8000");
        assert_eq!(config.conversation.identity.as_str(), "1");
    }

    #[test]
    fn ws_config_carries_timeout() {
        let mut endpoint = EndpointConfig::default();
        endpoint.connect_timeout_secs = 2;
        let ws = endpoint.ws_config();
        assert_eq!(ws.connect_timeout, Duration::from_secs(2));
        assert_eq!(endpoint.request_timeout(), Duration::from_secs(30));
    }
}
