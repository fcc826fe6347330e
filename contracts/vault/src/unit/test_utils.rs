#![allow(dead_code)]
use near_sdk::{test_utils::VMContextBuilder, AccountId, NearToken};

pub fn alice() -> AccountId {
    "alice.near".parse().unwrap()
}

pub fn bob() -> AccountId {
    "bob.near".parse().unwrap()
}

pub fn owner() -> AccountId {
    "owner.near".parse().unwrap()
}

pub fn vault_account() -> AccountId {
    "vault-0.owner.near".parse().unwrap()
}

/// The five signing identities a deployment fixture hands out, deployer first.
pub fn identities() -> [AccountId; 5] {
    [
        owner(),
        alice(),
        bob(),
        "carol.near".parse().unwrap(),
        "dave.near".parse().unwrap(),
    ]
}

pub fn get_context(
    predecessor: AccountId,
    account_balance: NearToken,
    attached_deposit: Option<NearToken>,
) -> near_sdk::VMContext {
    let mut builder = VMContextBuilder::new();

    // The vault lives on its own account and is called by the deployer
    builder.current_account_id(vault_account());
    builder.predecessor_account_id(predecessor);
    builder.account_balance(account_balance);

    if let Some(deposit) = attached_deposit {
        builder.attached_deposit(deposit);
    }

    builder.build()
}

/// Context where the transaction signer and the immediate caller differ,
/// as when another contract forwards the init call.
pub fn get_relayed_context(signer: AccountId, predecessor: AccountId) -> near_sdk::VMContext {
    let mut builder = VMContextBuilder::new();

    builder.current_account_id(vault_account());
    builder.signer_account_id(signer);
    builder.predecessor_account_id(predecessor);
    builder.account_balance(NearToken::from_near(10));

    builder.build()
}
