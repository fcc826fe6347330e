//! The Vault deployment fixture.

use near_workspaces::{Account, AccountId, Contract};

use crate::chain::{ensure_distinct, SandboxChain};
use crate::error::{FixtureError, FixtureResult};

/// Contract name the Vault artifact is registered under.
pub const VAULT_CONTRACT: &str = "Vault";

/// Number of identities the fixture hands out.
pub const VAULT_FIXTURE_SIGNERS: usize = 5;

/// A freshly deployed Vault and the identities around it.
#[derive(Clone)]
pub struct VaultFixture {
    pub vault: Contract,
    /// Deployer of `vault`.
    pub owner: Account,
    pub account_one: Account,
    pub account_two: Account,
    pub account_three: Account,
    pub account_four: Account,
}

impl VaultFixture {
    /// All identities, deployer first.
    pub fn identities(&self) -> [&Account; VAULT_FIXTURE_SIGNERS] {
        [
            &self.owner,
            &self.account_one,
            &self.account_two,
            &self.account_three,
            &self.account_four,
        ]
    }

    pub fn identity_ids(&self) -> Vec<&AccountId> {
        self.identities().into_iter().map(|account| account.id()).collect()
    }
}

/// Deploy a new Vault from the first of five signers.
pub async fn deploy_vault_fixture(chain: SandboxChain) -> FixtureResult<VaultFixture> {
    let signers = chain.get_signers().await?;
    if signers.len() < VAULT_FIXTURE_SIGNERS {
        return Err(FixtureError::identity(format!(
            "vault fixture needs {VAULT_FIXTURE_SIGNERS} signers, sandbox provides {}",
            signers.len()
        )));
    }

    let mut signers = signers.into_iter();
    let mut next = || {
        signers
            .next()
            .ok_or_else(|| FixtureError::identity("signer list exhausted"))
    };
    let owner = next()?;
    let account_one = next()?;
    let account_two = next()?;
    let account_three = next()?;
    let account_four = next()?;

    let factory = chain.get_factory(VAULT_CONTRACT)?;
    let vault = factory.deploy_from(&chain, &owner).await?;

    let fixture = VaultFixture {
        vault,
        owner,
        account_one,
        account_two,
        account_three,
        account_four,
    };
    ensure_distinct(fixture.identity_ids())?;

    Ok(fixture)
}
