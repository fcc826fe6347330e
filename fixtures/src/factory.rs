//! Contract factories backed by compiled wasm artifacts.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use near_workspaces::{Account, Contract};
use serde_json::json;
use tracing::{debug, info};

use crate::chain::SandboxChain;
use crate::error::{DeploymentFailure, FixtureError, FixtureResult};

/// Resolves contract names to compiled artifacts in one directory.
#[derive(Debug, Clone)]
pub struct ArtifactRegistry {
    dir: PathBuf,
}

impl ArtifactRegistry {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the artifact for `contract_name` (`"Vault"` -> `vault.wasm`).
    pub fn artifact_path(&self, contract_name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.wasm", artifact_stem(contract_name)))
    }

    /// Load the artifact for `contract_name` into a factory.
    pub fn get_factory(&self, contract_name: &str) -> FixtureResult<ContractFactory> {
        let path = self.artifact_path(contract_name);

        let wasm = std::fs::read(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FixtureError::deployment(
                contract_name,
                DeploymentFailure::ArtifactNotFound { path: path.clone() },
            ),
            _ => FixtureError::Io(err),
        })?;

        if wasm.is_empty() {
            return Err(FixtureError::deployment(
                contract_name,
                DeploymentFailure::EmptyArtifact { path },
            ));
        }

        debug!("Loaded {} ({} bytes)", path.display(), wasm.len());

        Ok(ContractFactory {
            name: contract_name.to_string(),
            stem: artifact_stem(contract_name),
            wasm: Arc::new(wasm),
        })
    }
}

/// `"Vault"` -> `"vault"`, `"StakingPool"` -> `"staking_pool"`.
fn artifact_stem(contract_name: &str) -> String {
    let mut stem = String::with_capacity(contract_name.len() + 4);
    for (i, ch) in contract_name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                stem.push('_');
            }
            stem.push(ch.to_ascii_lowercase());
        } else if ch == '-' {
            stem.push('_');
        } else {
            stem.push(ch);
        }
    }
    stem
}

/// Bound a deployment of `contract` by `timeout`.
pub(crate) async fn with_deploy_timeout<T, F>(contract: &str, timeout: Duration, deploy: F) -> FixtureResult<T>
where
    F: Future<Output = FixtureResult<T>>,
{
    tokio::time::timeout(timeout, deploy)
        .await
        .map_err(|_| FixtureError::deployment(contract, DeploymentFailure::Timeout(timeout)))?
}

/// Deploys fresh instances of one contract.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    name: String,
    stem: String,
    wasm: Arc<Vec<u8>>,
}

impl ContractFactory {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &[u8] {
        &self.wasm
    }

    /// Deploy with the first signer of `chain` as deployer.
    pub async fn deploy(&self, chain: &SandboxChain) -> FixtureResult<Contract> {
        let signers = chain.get_signers().await?;
        let deployer = signers
            .first()
            .ok_or_else(|| FixtureError::identity("no signers available"))?;
        self.deploy_from(chain, deployer).await
    }

    /// Deploy a new instance and initialize it with a call signed by `deployer`.
    ///
    /// The instance lives on a fresh sub-account `<stem>-<n>.<deployer>`
    /// funded by the deployer. Returns once the init call has finalized.
    pub async fn deploy_from(&self, chain: &SandboxChain, deployer: &Account) -> FixtureResult<Contract> {
        let timeout = chain.config().deploy_timeout();
        let label = format!("{}-{}", self.stem, chain.next_label_index());

        info!("Deploying '{}' from {} as {}", self.name, deployer.id(), label);

        let contract = with_deploy_timeout(
            &self.name,
            timeout,
            self.deploy_and_init(chain, deployer, &label),
        )
        .await?;

        chain.record_deployment(contract.id().clone()).await;
        Ok(contract)
    }

    async fn deploy_and_init(
        &self,
        chain: &SandboxChain,
        deployer: &Account,
        label: &str,
    ) -> FixtureResult<Contract> {
        let config = chain.config();
        let rpc = |err: String| FixtureError::deployment(&self.name, DeploymentFailure::Rpc(err));
        let reverted =
            |err: String| FixtureError::deployment(&self.name, DeploymentFailure::Reverted(err));

        // Create and fund the contract account
        let account = deployer
            .create_subaccount(label)
            .initial_balance(config.contract_balance())
            .transact()
            .await
            .map_err(|err| rpc(err.to_string()))?
            .into_result()
            .map_err(|err| reverted(err.to_string()))?;

        // Deploy the code
        let contract = account
            .deploy(&self.wasm)
            .await
            .map_err(|err| rpc(err.to_string()))?
            .into_result()
            .map_err(|err| reverted(err.to_string()))?;

        // Initialize as the deployer so it becomes the predecessor of `new`
        let outcome = deployer
            .call(contract.id(), &config.init_method)
            .args_json(json!({}))
            .gas(config.deploy_gas())
            .transact()
            .await
            .map_err(|err| rpc(err.to_string()))?;

        debug!("Init logs of {}: {:?}", contract.id(), outcome.logs());

        outcome
            .into_result()
            .map_err(|err| reverted(err.to_string()))?;

        Ok(contract)
    }
}
