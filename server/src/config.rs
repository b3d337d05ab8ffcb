use commonware_codec::DecodeExt;
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::from_hex_formatted;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::Level;

/// On-disk configuration for the [crate::Service].
#[derive(Deserialize, Serialize)]
pub struct Config {
    pub port: u16,
    /// Ledger storage directory; omitted means ephemeral state.
    pub directory: Option<String>,
    /// Hex public key allowed to sign privileged instructions; omitted
    /// disables them entirely.
    pub admin_public_key: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            directory: None,
            admin_public_key: None,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be hex: {value}")]
    InvalidHex { field: &'static str, value: String },
    #[error("{field} is invalid: {value}")]
    InvalidDecode {
        field: &'static str,
        value: String,
        #[source]
        source: commonware_codec::Error,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
}

pub struct ValidatedConfig {
    pub port: u16,
    pub directory: Option<PathBuf>,
    pub admin: Option<PublicKey>,
    pub log_level: Level,
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let admin = match &self.admin_public_key {
            Some(value) => {
                let raw = from_hex_formatted(value).ok_or(ConfigError::InvalidHex {
                    field: "admin_public_key",
                    value: value.clone(),
                })?;
                let key = PublicKey::decode(raw.as_ref()).map_err(|source| {
                    ConfigError::InvalidDecode {
                        field: "admin_public_key",
                        value: value.clone(),
                        source,
                    }
                })?;
                Some(key)
            }
            None => None,
        };

        let log_level = Level::from_str(&self.log_level).map_err(|_| {
            ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            }
        })?;

        Ok(ValidatedConfig {
            port: self.port,
            directory: self.directory.map(PathBuf::from),
            admin,
            log_level,
        })
    }
}
