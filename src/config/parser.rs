use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// RCON connection parameters for a single server.
///
/// The static `password` is only a last-resort fallback: the session
/// coordinator supersedes it with the dynamically fetched per-server secret
/// before use (see [`Settings::require_fetched_password`] for the policy
/// when that fetch fails).
///
/// # Examples
///
/// ```
/// use craft_console::config::RconConfig;
///
/// let config = RconConfig::default();
/// assert_eq!(config.host, "127.0.0.1");
/// assert_eq!(config.port, 25575);
/// assert!(config.password.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RconConfig {
    /// Host the RCON endpoint listens on.
    pub host: String,

    /// Port the RCON endpoint listens on.
    pub port: u16,

    /// Statically configured password, used only when the dynamic fetch
    /// fails and the policy allows falling back.
    pub password: String,
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 25575,
            password: String::new(),
        }
    }
}

/// Tunable settings for the session core.
///
/// All durations are expressed in whole seconds in the JSON form and
/// exposed as [`Duration`] through accessor methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound on any single gateway call, in seconds.
    #[serde(rename = "operationTimeoutSecs")]
    pub operation_timeout_secs: u64,

    /// Fleet-wide health monitor cadence, in seconds.
    #[serde(rename = "pollIntervalSecs")]
    pub poll_interval_secs: u64,

    /// Adaptive monitor cadence while a connect attempt is in flight.
    #[serde(rename = "activePollIntervalSecs")]
    pub active_poll_interval_secs: u64,

    /// Adaptive monitor cadence while the fleet is settled.
    #[serde(rename = "idlePollIntervalSecs")]
    pub idle_poll_interval_secs: u64,

    /// When `true`, a failed password fetch fails the connect attempt
    /// instead of falling back to the statically configured password.
    #[serde(rename = "requireFetchedPassword")]
    pub require_fetched_password: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            operation_timeout_secs: 10,
            poll_interval_secs: 5,
            active_poll_interval_secs: 3,
            idle_poll_interval_secs: 15,
            require_fetched_password: false,
        }
    }
}

impl Settings {
    /// Upper bound on any single gateway call.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Fleet-wide health monitor cadence.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Adaptive monitor cadence while a connect attempt is in flight.
    pub fn active_poll_interval(&self) -> Duration {
        Duration::from_secs(self.active_poll_interval_secs)
    }

    /// Adaptive monitor cadence while the fleet is settled.
    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_secs(self.idle_poll_interval_secs)
    }
}

/// Main configuration for the session core.
///
/// # JSON Schema
///
/// The configuration follows this JSON schema (every section optional):
///
/// ```json
/// {
///   "defaults": {"host": "127.0.0.1", "port": 25575, "password": ""},
///   "servers": {
///     "Survival": {"host": "127.0.0.1", "port": 25580, "password": ""}
///   },
///   "settings": {
///     "operationTimeoutSecs": 10,
///     "pollIntervalSecs": 5,
///     "activePollIntervalSecs": 3,
///     "idlePollIntervalSecs": 15,
///     "requireFetchedPassword": false
///   }
/// }
/// ```
///
/// # Examples
///
/// ```
/// use craft_console::config::Config;
///
/// let config = Config::parse_from_str(r#"{"defaults": {"port": 25590}}"#).unwrap();
/// assert_eq!(config.defaults.port, 25590);
/// assert_eq!(config.defaults.host, "127.0.0.1");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection parameters used for servers without an explicit entry.
    pub defaults: RconConfig,

    /// Per-server connection overrides, keyed by server name.
    pub servers: HashMap<String, RconConfig>,

    /// Core behavior settings.
    pub settings: Settings,
}

impl Config {
    /// Loads a configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be read
    /// * The file contents are not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        Self::parse_from_str(&content)
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The string is not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }

    /// Connection parameters for a server: its override if present,
    /// otherwise the defaults.
    pub fn connection_for(&self, server_name: &str) -> RconConfig {
        self.servers
            .get(server_name)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"{
            "defaults": {"host": "0.0.0.0", "port": 25575, "password": "fallback"},
            "servers": {
                "Survival": {"host": "127.0.0.1", "port": 25580}
            },
            "settings": {"operationTimeoutSecs": 3, "requireFetchedPassword": true}
        }"#;

        let config = Config::parse_from_str(config_str).unwrap();

        assert_eq!(config.defaults.host, "0.0.0.0");
        assert_eq!(config.defaults.password, "fallback");

        let survival = &config.servers["Survival"];
        assert_eq!(survival.port, 25580);
        // Unspecified fields fall back to RconConfig defaults, not the
        // top-level defaults section.
        assert!(survival.password.is_empty());

        assert_eq!(config.settings.operation_timeout(), Duration::from_secs(3));
        assert!(config.settings.require_fetched_password);
        assert_eq!(config.settings.poll_interval_secs, 5);
    }

    #[test]
    fn test_connection_for_prefers_override() {
        let config_str = r#"{"servers": {"Creative": {"port": 25581}}}"#;
        let config = Config::parse_from_str(config_str).unwrap();

        assert_eq!(config.connection_for("Creative").port, 25581);
        assert_eq!(config.connection_for("Survival").port, 25575);
    }
}
