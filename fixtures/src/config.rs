//! Fixture configuration.

use std::path::PathBuf;
use std::time::Duration;

use near_workspaces::types::{Gas, NearToken};
use serde::Deserialize;
use tracing::debug;

use crate::error::{FixtureError, FixtureResult};

/// Env var pointing at an optional JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "FIXTURES_CONFIG";
/// Env var overriding the compiled artifact directory.
pub const ARTIFACTS_DIR_ENV: &str = "FIXTURES_ARTIFACTS_DIR";

/// Settings shared by every fixture built against one sandbox.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Directory holding compiled `<contract>.wasm` artifacts.
    pub artifacts_dir: PathBuf,
    /// Number of signing identities handed out, deployer included.
    pub signer_count: usize,
    /// Initial balance of each non-root signer, in NEAR.
    pub signer_balance_near: u128,
    /// Initial balance of each deployed contract account, in NEAR.
    pub contract_balance_near: u128,
    /// Gas attached to the initializing call, in TGas.
    pub deploy_gas_tgas: u64,
    /// Upper bound on a whole deployment (account, code, init).
    pub deploy_timeout_secs: u64,
    /// Method called right after the code is deployed.
    pub init_method: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            // Relative to the crate running the tests
            artifacts_dir: PathBuf::from("../../res"),
            signer_count: 5,
            signer_balance_near: 100,
            contract_balance_near: 5,
            deploy_gas_tgas: 300,
            deploy_timeout_secs: 120,
            init_method: "new".to_string(),
        }
    }
}

impl FixtureConfig {
    /// Load configuration from the environment.
    ///
    /// Reads the JSON file named by `FIXTURES_CONFIG` if set, then applies
    /// `FIXTURES_ARTIFACTS_DIR` on top.
    pub fn from_env() -> FixtureResult<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => {
                debug!("Loading fixture config from {:?}", path);
                Self::from_json(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };

        if let Some(dir) = std::env::var_os(ARTIFACTS_DIR_ENV) {
            config.artifacts_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> FixtureResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no deployment could succeed with.
    pub fn validate(&self) -> FixtureResult<()> {
        if self.signer_count == 0 {
            return Err(FixtureError::config("signer_count must be at least 1"));
        }
        if self.deploy_gas_tgas == 0 || self.deploy_gas_tgas > 300 {
            return Err(FixtureError::config(format!(
                "deploy_gas_tgas must be within 1..=300, got {}",
                self.deploy_gas_tgas
            )));
        }
        if self.deploy_timeout_secs == 0 {
            return Err(FixtureError::config("deploy_timeout_secs must be positive"));
        }
        if self.init_method.is_empty() {
            return Err(FixtureError::config("init_method must not be empty"));
        }
        Ok(())
    }

    /// Initial balance of each non-root signer.
    pub fn signer_balance(&self) -> NearToken {
        NearToken::from_near(self.signer_balance_near)
    }

    /// Initial balance of each deployed contract account.
    pub fn contract_balance(&self) -> NearToken {
        NearToken::from_near(self.contract_balance_near)
    }

    /// Gas attached to the initializing call.
    pub fn deploy_gas(&self) -> Gas {
        Gas::from_tgas(self.deploy_gas_tgas)
    }

    /// Upper bound on one whole deployment.
    pub fn deploy_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FixtureConfig::default();
        config.validate().unwrap();
        assert_eq!(config.signer_count, 5);
        assert_eq!(config.init_method, "new");
        assert_eq!(config.deploy_gas(), Gas::from_tgas(300));
    }

    #[test]
    fn json_overrides_only_given_fields() {
        let config = FixtureConfig::from_json(
            r#"{ "artifacts_dir": "/tmp/artifacts", "deploy_timeout_secs": 30 }"#,
        )
        .unwrap();

        assert_eq!(config.artifacts_dir, PathBuf::from("/tmp/artifacts"));
        assert_eq!(config.deploy_timeout(), Duration::from_secs(30));
        assert_eq!(config.signer_count, 5);
    }

    #[test]
    fn zero_signers_is_rejected() {
        let err = FixtureConfig::from_json(r#"{ "signer_count": 0 }"#).unwrap_err();
        assert!(matches!(err, FixtureError::Config(_)));
    }

    #[test]
    fn gas_above_transaction_limit_is_rejected() {
        let err = FixtureConfig::from_json(r#"{ "deploy_gas_tgas": 301 }"#).unwrap_err();
        assert!(err.to_string().contains("deploy_gas_tgas"));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = FixtureConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, FixtureError::Json(_)));
    }
}
