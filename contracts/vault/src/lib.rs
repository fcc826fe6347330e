#[macro_use]
mod macros;

mod contract;
pub use contract::{Vault, VaultExt};

mod view;

#[cfg(test)]
mod unit;
