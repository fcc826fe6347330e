//! Sandbox chain handle.
//!
//! Wraps a `near-workspaces` sandbox worker together with the state the
//! fixtures need to share: the memoized signer list, the contracts deployed
//! so far (the scope of a snapshot), a label counter used to derive fresh
//! contract account names, and a count of successful deployments.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use near_workspaces::network::Sandbox;
use near_workspaces::{Account, AccountId, Worker};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use crate::cache::SnapshotBackend;
use crate::config::FixtureConfig;
use crate::error::{FixtureError, FixtureResult};
use crate::factory::{ArtifactRegistry, ContractFactory};

/// Raw storage of one contract: key/value pairs as stored on chain.
pub type ContractState = HashMap<Vec<u8>, Vec<u8>>;

/// Storage of every tracked contract at one point in time.
#[derive(Debug, Clone, Default)]
pub struct ChainSnapshot {
    contracts: Vec<(AccountId, ContractState)>,
}

impl ChainSnapshot {
    pub fn contract_state(&self, id: &AccountId) -> Option<&ContractState> {
        self.contracts
            .iter()
            .find(|(account, _)| account == id)
            .map(|(_, state)| state)
    }

    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }
}

/// Shared handle to one running sandbox.
#[derive(Clone)]
pub struct SandboxChain {
    worker: Worker<Sandbox>,
    config: Arc<FixtureConfig>,
    signers: Arc<OnceCell<Vec<Account>>>,
    tracked: Arc<Mutex<Vec<AccountId>>>,
    labels: Arc<AtomicU64>,
    deployments: Arc<AtomicU64>,
}

impl SandboxChain {
    /// Spawn a fresh sandbox node.
    pub async fn start(config: FixtureConfig) -> FixtureResult<Self> {
        config.validate()?;

        info!("Starting sandbox");
        let worker = near_workspaces::sandbox()
            .await
            .map_err(|err| FixtureError::sandbox(format!("failed to start: {err}")))?;

        Ok(Self::with_worker(worker, config))
    }

    /// Wrap an already running sandbox worker.
    pub fn with_worker(worker: Worker<Sandbox>, config: FixtureConfig) -> Self {
        Self {
            worker,
            config: Arc::new(config),
            signers: Arc::new(OnceCell::new()),
            tracked: Arc::new(Mutex::new(Vec::new())),
            labels: Arc::new(AtomicU64::new(0)),
            deployments: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn worker(&self) -> &Worker<Sandbox> {
        &self.worker
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Ordered signing identities: the sandbox root account first, then funded
    /// sub-accounts `signer-1`, `signer-2`, ...
    ///
    /// Created on first use and stable for the lifetime of this sandbox.
    pub async fn get_signers(&self) -> FixtureResult<Vec<Account>> {
        let signers = self
            .signers
            .get_or_try_init(|| self.provision_signers())
            .await?;
        Ok(signers.clone())
    }

    /// Resolve the factory for `contract_name` from the configured artifacts.
    pub fn get_factory(&self, contract_name: &str) -> FixtureResult<ContractFactory> {
        ArtifactRegistry::new(&self.config.artifacts_dir).get_factory(contract_name)
    }

    /// Number of contracts successfully deployed and initialized through this
    /// chain so far. Failed or timed-out attempts are not counted.
    pub fn deployment_count(&self) -> u64 {
        self.deployments.load(Ordering::SeqCst)
    }

    /// Raw storage of a contract as currently on chain.
    pub async fn contract_state(&self, id: &AccountId) -> FixtureResult<ContractState> {
        self.worker
            .view_state(id)
            .await
            .map_err(|err| FixtureError::query(id, "view_state", err))
    }

    /// Reserve the next contract account index. Never reused, even when the
    /// deployment using it fails.
    pub(crate) fn next_label_index(&self) -> u64 {
        self.labels.fetch_add(1, Ordering::SeqCst)
    }

    /// Count a finished deployment and include it in every subsequent snapshot.
    pub(crate) async fn record_deployment(&self, id: AccountId) {
        self.deployments.fetch_add(1, Ordering::SeqCst);

        let mut tracked = self.tracked.lock().await;
        if !tracked.contains(&id) {
            debug!("Tracking contract {} for snapshots", id);
            tracked.push(id);
        }
    }

    async fn provision_signers(&self) -> FixtureResult<Vec<Account>> {
        let count = self.config.signer_count;
        info!("Provisioning {} signer(s)", count);

        let root = self
            .worker
            .root_account()
            .map_err(|err| FixtureError::identity(format!("root account unavailable: {err}")))?;

        let mut signers = Vec::with_capacity(count);
        for i in 1..count {
            let signer = root
                .create_subaccount(&format!("signer-{i}"))
                .initial_balance(self.config.signer_balance())
                .transact()
                .await
                .map_err(|err| FixtureError::identity(format!("signer-{i}: {err}")))?
                .into_result()
                .map_err(|err| FixtureError::identity(format!("signer-{i}: {err}")))?;
            signers.push(signer);
        }
        signers.insert(0, root);

        ensure_distinct(signers.iter().map(|signer| signer.id()))?;
        Ok(signers)
    }
}

/// Fails if any two account ids are equal.
pub fn ensure_distinct<'a>(ids: impl IntoIterator<Item = &'a AccountId>) -> FixtureResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(FixtureError::identity(format!(
                "duplicate signing identity {id}"
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl SnapshotBackend for SandboxChain {
    type Snapshot = ChainSnapshot;

    async fn snapshot(&self) -> FixtureResult<ChainSnapshot> {
        let tracked = self.tracked.lock().await.clone();

        let mut contracts = Vec::with_capacity(tracked.len());
        for id in tracked {
            let state = self
                .worker
                .view_state(&id)
                .await
                .map_err(|err| FixtureError::snapshot(format!("view_state of {id}: {err}")))?;
            debug!("Captured {} storage key(s) of {}", state.len(), id);
            contracts.push((id, state));
        }

        Ok(ChainSnapshot { contracts })
    }

    async fn restore(&self, snapshot: &ChainSnapshot) -> FixtureResult<()> {
        for (id, state) in &snapshot.contracts {
            debug!("Restoring {} storage key(s) of {}", state.len(), id);
            self.worker
                .patch(id)
                .states(
                    state
                        .iter()
                        .map(|(key, value)| (key.as_slice(), value.as_slice())),
                )
                .transact()
                .await
                .map_err(|err| FixtureError::snapshot(format!("patch state of {id}: {err}")))?;

            // Patching cannot delete keys written after the snapshot
            let current = self
                .worker
                .view_state(id)
                .await
                .map_err(|err| FixtureError::snapshot(format!("view_state of {id}: {err}")))?;
            if let Some(diff) = state_diff(state, &current) {
                return Err(FixtureError::snapshot(format!(
                    "storage of {id} differs from snapshot after restore: {diff}"
                )));
            }
        }
        Ok(())
    }
}

/// Describes how `actual` differs from `expected`, or `None` if identical.
pub fn state_diff(expected: &ContractState, actual: &ContractState) -> Option<String> {
    let mut extra: Vec<String> = actual
        .keys()
        .filter(|key| !expected.contains_key(*key))
        .map(|key| String::from_utf8_lossy(key).into_owned())
        .collect();
    let mut missing: Vec<String> = expected
        .keys()
        .filter(|key| !actual.contains_key(*key))
        .map(|key| String::from_utf8_lossy(key).into_owned())
        .collect();
    let mut changed: Vec<String> = expected
        .iter()
        .filter(|(key, value)| actual.get(*key).is_some_and(|current| current != *value))
        .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
        .collect();

    if extra.is_empty() && missing.is_empty() && changed.is_empty() {
        return None;
    }

    extra.sort();
    missing.sort();
    changed.sort();
    Some(format!(
        "extra keys {extra:?}, missing keys {missing:?}, changed keys {changed:?}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<AccountId> {
        names.iter().map(|name| name.parse().unwrap()).collect()
    }

    #[test]
    fn distinct_identities_pass() {
        let accounts = ids(&[
            "test.near",
            "signer-1.test.near",
            "signer-2.test.near",
            "signer-3.test.near",
            "signer-4.test.near",
        ]);
        ensure_distinct(&accounts).unwrap();
    }

    #[test]
    fn duplicate_identity_is_reported() {
        let accounts = ids(&["test.near", "signer-1.test.near", "test.near"]);

        let err = ensure_distinct(&accounts).unwrap_err();
        assert!(matches!(err, FixtureError::Identity(_)));
        assert!(err.to_string().contains("test.near"));
    }

    fn state(entries: &[(&str, &str)]) -> ContractState {
        entries
            .iter()
            .map(|(key, value)| (key.as_bytes().to_vec(), value.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn identical_state_has_no_diff() {
        let baseline = state(&[("STATE", "owner")]);
        assert_eq!(state_diff(&baseline, &baseline.clone()), None);
    }

    #[test]
    fn key_written_after_snapshot_is_reported() {
        let baseline = state(&[("STATE", "owner")]);
        let current = state(&[("STATE", "owner"), ("EXTRA", "1")]);

        let diff = state_diff(&baseline, &current).unwrap();
        assert!(diff.contains(r#"extra keys ["EXTRA"]"#), "{diff}");
    }

    #[test]
    fn changed_and_missing_keys_are_reported() {
        let baseline = state(&[("STATE", "owner"), ("OTHER", "x")]);
        let current = state(&[("STATE", "thief")]);

        let diff = state_diff(&baseline, &current).unwrap();
        assert!(diff.contains(r#"missing keys ["OTHER"]"#), "{diff}");
        assert!(diff.contains(r#"changed keys ["STATE"]"#), "{diff}");
    }

    #[test]
    fn snapshot_lookup_by_account() {
        let vault: AccountId = "vault-0.test.near".parse().unwrap();
        let mut state = ContractState::new();
        state.insert(b"STATE".to_vec(), vec![1, 2, 3]);

        let snapshot = ChainSnapshot {
            contracts: vec![(vault.clone(), state)],
        };

        assert_eq!(snapshot.contract_count(), 1);
        assert_eq!(
            snapshot.contract_state(&vault).unwrap().get(b"STATE".as_slice()),
            Some(&vec![1, 2, 3])
        );
        assert!(snapshot
            .contract_state(&"other.test.near".parse().unwrap())
            .is_none());
    }
}
