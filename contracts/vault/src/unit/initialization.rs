use super::test_utils::{alice, get_context, get_relayed_context, identities, owner};

use crate::contract::Vault;
use near_sdk::{env, test_utils::get_logs, testing_env, NearToken};

#[test]
fn test_vault_initialization_sets_deployer_as_owner() {
    // Owner deploys the vault
    let context = get_context(owner(), NearToken::from_near(10), None);
    testing_env!(context);

    let vault = Vault::new();

    assert_eq!(vault.owner, owner());
}

#[test]
fn test_vault_initialization_owner_differs_from_other_identities() {
    let [deployer, others @ ..] = identities();

    let context = get_context(deployer.clone(), NearToken::from_near(10), None);
    testing_env!(context);

    let vault = Vault::new();

    assert_eq!(vault.owner, deployer);
    for other in others {
        assert_ne!(vault.owner, other, "Owner must not match {other}");
    }
}

#[test]
fn test_vault_initialization_uses_predecessor_not_signer() {
    // alice signs, but owner.near is the account that actually calls `new`
    let context = get_relayed_context(alice(), owner());
    testing_env!(context);

    let vault = Vault::new();

    assert_eq!(vault.owner, owner());
}

#[test]
fn test_vault_initialization_emits_vault_created() {
    let context = get_context(owner(), NearToken::from_near(10), None);
    testing_env!(context);

    let _vault = Vault::new();

    let logs = get_logs();
    let found = logs.iter().any(|log| {
        log.starts_with("EVENT_JSON:")
            && log.contains(r#""event":"vault_created""#)
            && log.contains(r#""owner":"owner.near""#)
    });
    assert!(
        found,
        "Expected 'vault_created' log not found. Logs: {:?}",
        logs
    );
}

#[test]
#[should_panic(expected = "Contract already initialized")]
fn test_vault_initialization_rejects_second_init() {
    let context = get_context(owner(), NearToken::from_near(10), None);
    testing_env!(context);

    // Persist the first instance so state exists
    let vault = Vault::new();
    env::state_write(&vault);

    // Any further init attempt must fail
    Vault::new();
}
