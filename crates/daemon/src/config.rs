//! Environment configuration, loaded once at startup.

use std::env;
use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;

const ENV_FILE: &str = "./.env";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("reading ./.env: {0}")]
    EnvFile(#[from] dotenv::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `debug`, `info` or `error`.
    pub log_level: String,
    /// RPC endpoint URL.
    pub node: String,
    /// Account id of the pool contract.
    pub stake_pool: String,
    /// Base58-encoded signer secret key.
    pub key_pair: String,
    /// Account id the signer key belongs to.
    pub key_pair_account_id: String,
}

impl Config {
    /// Load `./.env` when present, then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenv::from_path(Path::new(ENV_FILE)) {
            Ok(()) => {}
            Err(dotenv::Error::Io(ref err)) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        Ok(Self {
            log_level: optional("LOG_LEVEL", "info"),
            node: required("NODE")?,
            stake_pool: required("STAKE_POOL")?,
            key_pair: required("KEY_PAIR")?,
            key_pair_account_id: required("KEY_PAIR_ACCOUNT_ID")?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_missing_and_empty() {
        env::remove_var("STAKEWARD_TEST_REQUIRED");
        assert!(matches!(
            required("STAKEWARD_TEST_REQUIRED"),
            Err(ConfigError::Missing("STAKEWARD_TEST_REQUIRED"))
        ));

        env::set_var("STAKEWARD_TEST_REQUIRED", "");
        assert!(required("STAKEWARD_TEST_REQUIRED").is_err());

        env::set_var("STAKEWARD_TEST_REQUIRED", "value");
        assert_eq!(required("STAKEWARD_TEST_REQUIRED").unwrap(), "value");
        env::remove_var("STAKEWARD_TEST_REQUIRED");
    }

    #[test]
    fn test_optional_falls_back() {
        env::remove_var("STAKEWARD_TEST_OPTIONAL");
        assert_eq!(optional("STAKEWARD_TEST_OPTIONAL", "info"), "info");

        env::set_var("STAKEWARD_TEST_OPTIONAL", "debug");
        assert_eq!(optional("STAKEWARD_TEST_OPTIONAL", "info"), "debug");
        env::remove_var("STAKEWARD_TEST_OPTIONAL");
    }
}
