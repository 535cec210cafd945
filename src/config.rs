//! Configuration management for the interbank ledger

use crate::blockchain::GENESIS_PROOF;
use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Proof sealed into the genesis block.
    #[serde(default = "default_genesis_proof")]
    pub genesis_proof: u64,
    /// Proof used when the operator does not supply one at seal time.
    #[serde(default = "default_block_proof")]
    pub block_proof: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_proof: default_genesis_proof(),
            block_proof: default_block_proof(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, ChainError> {
        self.level
            .parse::<tracing::Level>()
            .map_err(|_| ChainError::ConfigError(format!("Unknown log level '{}'", self.level)))
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.database.path.trim().is_empty() {
            return Err(ChainError::ConfigError(
                "database.path must be set in config.toml".to_string(),
            ));
        }

        self.logging.max_level()?;
        Ok(())
    }
}

/// Load `config.toml` from the working directory.
pub fn load_config() -> Result<Config, ChainError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    let config = if path.exists() {
        let config_str = fs::read_to_string(path)?;
        parse_config(&config_str)?
    } else {
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

pub fn parse_config(config_str: &str) -> Result<Config, ChainError> {
    Ok(toml::from_str(config_str)?)
}

fn default_database_path() -> String {
    "./data/transactions.db".to_string()
}

fn default_genesis_proof() -> u64 {
    GENESIS_PROOF
}

fn default_block_proof() -> u64 {
    GENESIS_PROOF
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config_from("/definitely/not/here/config.toml").unwrap();
        assert_eq!(config.database.path, "./data/transactions.db");
        assert_eq!(config.ledger.genesis_proof, 100);
        assert_eq!(config.ledger.block_proof, 100);
        assert_eq!(config.logging.max_level().unwrap(), tracing::Level::INFO);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = parse_config(
            r#"
            [ledger]
            block_proof = 35293

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.block_proof, 35293);
        assert_eq!(config.ledger.genesis_proof, 100);
        assert_eq!(config.database.path, "./data/transactions.db");
        assert_eq!(config.logging.max_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[database]\npath = \"/tmp/ledger-audit.db\"").unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.database.path, "/tmp/ledger-audit.db");
    }

    #[test]
    fn test_rejects_empty_database_path() {
        let config = parse_config("[database]\npath = \"\"").unwrap();
        assert!(matches!(config.validate(), Err(ChainError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let config = parse_config("[logging]\nlevel = \"chatty\"").unwrap();
        assert!(matches!(config.validate(), Err(ChainError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        assert!(matches!(
            parse_config("[ledger\nblock_proof = "),
            Err(ChainError::ConfigError(_))
        ));
    }
}
