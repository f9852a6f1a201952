//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: optional TOML file, then environment overrides,
/// then validation.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_file(path)?,
        None => ServiceConfig::default(),
    };
    finish(config, |key| std::env::var(key).ok())
}

fn parse_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

fn finish<F>(mut config: ServiceConfig, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = apply_env_overrides(&mut config, lookup);
    if let Err(mut semantic) = validate_config(&config) {
        errors.append(&mut semantic);
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

/// Apply `RPC_URL`, `CHAIN_ID`, `CONTRACT_ADDRESS`, `DATABASE_URL`,
/// `BIND_ADDRESS` and `LOG_LEVEL` on top of the file values.
fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    if let Some(v) = lookup("RPC_URL") {
        config.blockchain.rpc_url = v;
    }
    if let Some(v) = lookup("CHAIN_ID") {
        match v.trim().parse() {
            Ok(id) => config.blockchain.chain_id = id,
            Err(_) => errors.push(ValidationError {
                field: "CHAIN_ID".to_string(),
                message: format!("not a chain id: '{}'", v),
            }),
        }
    }
    if let Some(v) = lookup("CONTRACT_ADDRESS") {
        config.blockchain.contract_address = v.trim().to_string();
    }
    if let Some(v) = lookup("DATABASE_URL") {
        config.database.url = v;
    }
    if let Some(v) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("LOG_LEVEL") {
        config.observability.log_level = v;
    }

    errors
}
