use crate::contract::{Vault, VaultExt};
use near_sdk::{near_bindgen, AccountId};

#[near_bindgen]
impl Vault {
    /// Returns the account recorded as the vault owner.
    pub fn owner(&self) -> AccountId {
        self.owner.clone()
    }
}
