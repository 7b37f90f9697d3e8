//! Service configuration.
//!
//! Loaded from an optional TOML file; every field has a default, so an empty
//! file (or no file) is a valid configuration.
//!
//! ```toml
//! [server]
//! bind_address = "127.0.0.1:8080"
//!
//! [logging]
//! filter = "greeter=debug"
//! verbose_payloads = true
//! ```

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive. `RUST_LOG` takes precedence.
    pub filter: String,

    /// Force payload logging on even if `greeter::payload` is not at DEBUG.
    pub verbose_payloads: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "greeter=info".to_owned(), verbose_payloads: false }
    }
}

impl Config {
    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.bind_address.port(), 8080);
        assert_eq!(config.logging.filter, "greeter=info");
        assert!(!config.logging.verbose_payloads);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml("[logging]\nverbose_payloads = true\n").unwrap();
        assert!(config.logging.verbose_payloads);
        assert_eq!(config.logging.filter, "greeter=info");
    }

    #[test]
    fn rejects_bad_addresses_and_unknown_keys() {
        let bad_addr = Config::from_toml("[server]\nbind_address = \"nowhere\"\n");
        assert!(matches!(bad_addr, Err(Error::Config(_))));

        let typo = Config::from_toml("[logging]\nverbose = true\n");
        assert!(matches!(typo, Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
