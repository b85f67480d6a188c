use craft_console::config::{validate_config, Config, RconConfig, Settings};
use craft_console::error::Error;
use std::time::Duration;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config = Config::parse_from_str("{}").unwrap();

    assert_eq!(config.defaults, RconConfig::default());
    assert!(config.servers.is_empty());
    assert_eq!(config.settings, Settings::default());
}

#[test]
fn test_parse_full_config() {
    let config_str = r#"{
        "defaults": {"host": "0.0.0.0", "port": 25575, "password": "fallback"},
        "servers": {
            "Survival": {"host": "127.0.0.1", "port": 25580},
            "Creative": {"port": 25581}
        },
        "settings": {
            "operationTimeoutSecs": 4,
            "pollIntervalSecs": 7,
            "activePollIntervalSecs": 2,
            "idlePollIntervalSecs": 20,
            "requireFetchedPassword": true
        }
    }"#;

    let config = Config::parse_from_str(config_str).unwrap();

    assert_eq!(config.defaults.host, "0.0.0.0");
    assert_eq!(config.defaults.password, "fallback");
    assert_eq!(config.servers.len(), 2);
    assert_eq!(config.servers["Survival"].port, 25580);
    assert_eq!(config.servers["Creative"].port, 25581);

    assert_eq!(config.settings.operation_timeout(), Duration::from_secs(4));
    assert_eq!(config.settings.poll_interval(), Duration::from_secs(7));
    assert_eq!(
        config.settings.active_poll_interval(),
        Duration::from_secs(2)
    );
    assert_eq!(
        config.settings.idle_poll_interval(),
        Duration::from_secs(20)
    );
    assert!(config.settings.require_fetched_password);
}

#[test]
fn test_parse_rejects_malformed_json() {
    let result = Config::parse_from_str("{not json");

    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_connection_for_falls_back_to_defaults() {
    let config_str = r#"{
        "defaults": {"port": 25590},
        "servers": {"Survival": {"port": 25591}}
    }"#;
    let config = Config::parse_from_str(config_str).unwrap();

    assert_eq!(config.connection_for("Survival").port, 25591);
    assert_eq!(config.connection_for("Unknown").port, 25590);
}

#[test]
fn test_validate_accepts_defaults() {
    validate_config(&Config::default()).unwrap();
}

#[test]
fn test_validate_rejects_zero_port() {
    let mut config = Config::default();
    config.servers.insert(
        "Survival".to_string(),
        RconConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            password: String::new(),
        },
    );

    let err = validate_config(&config).unwrap_err();
    assert!(matches!(err, Error::ConfigInvalid(_)));
    assert!(err.to_string().contains("Survival"));
}

#[test]
fn test_validate_rejects_empty_host() {
    let mut config = Config::default();
    config.defaults.host = String::new();

    assert!(matches!(
        validate_config(&config),
        Err(Error::ConfigInvalid(_))
    ));
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let mut config = Config::default();
    config.settings.operation_timeout_secs = 0;

    assert!(matches!(
        validate_config(&config),
        Err(Error::ConfigInvalid(_))
    ));
}

#[test]
fn test_validate_rejects_zero_poll_interval() {
    let mut config = Config::default();
    config.settings.idle_poll_interval_secs = 0;

    assert!(matches!(
        validate_config(&config),
        Err(Error::ConfigInvalid(_))
    ));
}
