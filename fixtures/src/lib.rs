//! Sandbox deployment fixtures for the Vault contract.
//!
//! The crate deploys the compiled Vault into a `near-workspaces` sandbox,
//! hands out the signing identities around it, and lets tests reuse one
//! deployment through snapshot and restore instead of redeploying.
//!
//! # Example
//!
//! ```ignore
//! use vault_fixtures::prelude::*;
//!
//! #[tokio::test]
//! async fn sets_deployer_as_owner() -> anyhow::Result<()> {
//!     let chain = SandboxChain::start(FixtureConfig::from_env()?).await?;
//!     let fixtures = FixtureCache::new(chain.clone());
//!
//!     let fixture = fixtures.load(deploy_vault_fixture).await?;
//!     verify_owner_is_deployer(&chain, &fixture).await?;
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod factory;
pub mod vault;

use tracing_subscriber::EnvFilter;

pub mod prelude {
    //! Re-exports commonly used types for convenience.
    pub use crate::assertions::{expect_eq, query_owner, verify_owner_is_deployer};
    pub use crate::cache::{FixtureCache, SnapshotBackend};
    pub use crate::chain::{ChainSnapshot, SandboxChain};
    pub use crate::config::FixtureConfig;
    pub use crate::error::{DeploymentFailure, FixtureError, FixtureResult};
    pub use crate::factory::{ArtifactRegistry, ContractFactory};
    pub use crate::vault::{deploy_vault_fixture, VaultFixture, VAULT_CONTRACT};
}

/// Install a test-friendly `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
