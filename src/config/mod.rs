//! Configuration module for craft-console.
//!
//! This module handles parsing, validation, and access to configuration
//! settings for the session core: default connection parameters, per-server
//! overrides, the gateway operation timeout, monitor cadences, and the
//! password fallback policy. Configurations load from files or strings in
//! JSON format.
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use craft_console::config::Config;
//!
//! let config = Config::from_file("config.json").unwrap();
//! println!("Default RCON port: {}", config.defaults.port);
//! ```
//!
//! Creating a configuration programmatically:
//! ```
//! use craft_console::config::{Config, RconConfig, Settings};
//! use std::collections::HashMap;
//!
//! let mut servers = HashMap::new();
//! servers.insert(
//!     "Survival".to_string(),
//!     RconConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 25580,
//!         password: String::new(),
//!     },
//! );
//!
//! let config = Config {
//!     defaults: RconConfig::default(),
//!     servers,
//!     settings: Settings::default(),
//! };
//! assert_eq!(config.defaults.port, 25575);
//! ```
mod parser;
pub mod validator;

pub use parser::{Config, RconConfig, Settings};
pub use validator::validate_config;
