//! Transaction manager configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::credentials::Credentials;
use crate::SdkError;

/// What happens to the nonce of a transaction whose receipt never arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutNoncePolicy {
    /// The nonce stays consumed; later sends use the next one
    #[default]
    Advance,
    /// The nonce stays consumed, and the caller may re-sign a replacement
    /// transaction with it through `replace_transaction`
    AllowReplacement,
}

/// Transaction manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// EIP-155 chain ID; legacy signatures when unset
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Gas price in wei
    #[serde(default = "default_gas_price")]
    pub gas_price: u64,
    /// Gas limit
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Delay between receipt queries
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Receipt queries after the first one
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    /// Nonce handling for timed-out transactions
    #[serde(default)]
    pub timeout_nonce_policy: TimeoutNoncePolicy,
    /// Environment variable holding the hex private key
    #[serde(default)]
    pub private_key_env: Option<String>,
}

fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_gas_price() -> u64 {
    22_000_000_000
}

fn default_gas_limit() -> u64 {
    4_300_000
}

fn default_poll_interval_ms() -> u64 {
    15_000
}

fn default_poll_attempts() -> u32 {
    40
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chain_id: None,
            gas_price: default_gas_price(),
            gas_limit: default_gas_limit(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_attempts: default_poll_attempts(),
            timeout_nonce_policy: TimeoutNoncePolicy::default(),
            private_key_env: None,
        }
    }
}

impl ManagerConfig {
    /// Parse from TOML text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, SdkError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SdkError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Delay between receipt queries
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load signing credentials from the configured environment variable
    pub fn credentials(&self) -> Result<Credentials, SdkError> {
        let var = self
            .private_key_env
            .as_deref()
            .ok_or_else(|| SdkError::Config("private_key_env is not set".to_string()))?;
        Credentials::from_env(var)
    }
}
