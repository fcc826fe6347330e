//! Owner queries and equality checks.

use std::fmt::Display;

use near_workspaces::network::Sandbox;
use near_workspaces::{AccountId, Worker};
use tracing::debug;

use crate::chain::SandboxChain;
use crate::error::{FixtureError, FixtureResult};
use crate::vault::VaultFixture;

/// View method exposing the recorded owner.
pub const OWNER_METHOD: &str = "owner";

/// Read the `owner` of the contract at `contract_id`.
///
/// Fails with a query error if the account does not exist, has no code, is
/// not initialized, or answers with something that is not an account id.
pub async fn query_owner(worker: &Worker<Sandbox>, contract_id: &AccountId) -> FixtureResult<AccountId> {
    let result = worker
        .view(contract_id, OWNER_METHOD)
        .await
        .map_err(|err| FixtureError::query(contract_id, OWNER_METHOD, err))?;

    let raw: String = result
        .json()
        .map_err(|err| FixtureError::query(contract_id, OWNER_METHOD, err))?;

    let owner = raw.parse::<AccountId>().map_err(|err| {
        FixtureError::query(
            contract_id,
            OWNER_METHOD,
            format!("invalid account id {raw:?}: {err}"),
        )
    })?;

    debug!("{} is owned by {}", contract_id, owner);
    Ok(owner)
}

/// Exact equality check reported as a structured failure.
pub fn expect_eq<T>(subject: &str, actual: &T, expected: &T) -> FixtureResult<()>
where
    T: PartialEq + Display + ?Sized,
{
    if actual == expected {
        Ok(())
    } else {
        Err(FixtureError::assertion(subject, expected, actual))
    }
}

/// Check that the vault's recorded owner is the deploying identity.
pub async fn verify_owner_is_deployer(chain: &SandboxChain, fixture: &VaultFixture) -> FixtureResult<()> {
    let owner = query_owner(chain.worker(), fixture.vault.id()).await?;
    expect_eq("vault owner", &owner, fixture.owner.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_accounts_pass() {
        let deployer: AccountId = "test.near".parse().unwrap();
        expect_eq("vault owner", &deployer, &deployer.clone()).unwrap();
    }

    #[test]
    fn substituted_identity_fails_with_both_values() {
        let deployer: AccountId = "test.near".parse().unwrap();
        let other: AccountId = "signer-1.test.near".parse().unwrap();

        let err = expect_eq("vault owner", &deployer, &other).unwrap_err();

        match err {
            FixtureError::Assertion {
                subject,
                expected,
                actual,
            } => {
                assert_eq!(subject, "vault owner");
                assert_eq!(expected, "signer-1.test.near");
                assert_eq!(actual, "test.near");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accounts_differing_in_one_byte_fail() {
        let a: AccountId = "signer-1.test.near".parse().unwrap();
        let b: AccountId = "signer-2.test.near".parse().unwrap();

        assert!(expect_eq("vault owner", &a, &b).unwrap_err().is_assertion());
    }

    #[test]
    fn works_on_unsized_values() {
        expect_eq("label", "vault", "vault").unwrap();
        assert!(expect_eq("label", "vault", "vaulT").is_err());
    }
}
