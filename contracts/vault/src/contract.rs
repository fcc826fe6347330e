use crate::log_event;

use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::{env, near_bindgen, AccountId, PanicOnDefault};

#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct Vault {
    pub(crate) owner: AccountId,
}

#[near_bindgen]
impl Vault {
    /// Initializes the vault. The account that sends the init call becomes the owner.
    ///
    /// State is checked here rather than by the generated init guard, so the
    /// rejection message is the same natively and on chain.
    #[init(ignore_state)]
    pub fn new() -> Self {
        assert!(!env::state_exists(), "Contract already initialized");

        let owner = env::predecessor_account_id();

        log_event!(
            "vault_created",
            near_sdk::serde_json::json!({
                "owner": owner,
                "vault": env::current_account_id()
            })
        );

        Self { owner }
    }
}
