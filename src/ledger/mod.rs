pub mod balances;
pub mod registry;

pub use balances::TokenLedger;
pub use registry::AgentRegistry;

use thiserror::Error;

use crate::mining::types::{AgentId, Address};

/// Number of decimals every amount is expressed in.
pub const DECIMALS: u8 = 8;

/// One whole coin in base units.
pub const COIN: u64 = 100_000_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("agent {0} does not exist")]
    UnknownAgent(String),

    #[error("cannot mint to the zero address")]
    MintToZero,

    #[error("balance overflow")]
    Overflow,
}

/// Proves which account currently controls an agent identity.
pub trait OwnershipRegistry {
    /// Fails for identities that were never issued.
    fn owner_of(&self, agent: AgentId) -> Result<Address, LedgerError>;
}

/// Fungible balance book of the mined token.
pub trait BalanceLedger {
    fn mint(&mut self, to: Address, amount: u64) -> Result<(), LedgerError>;
    fn balance_of(&self, account: &Address) -> u64;
    fn total_supply(&self) -> u64;

    /// Credit several accounts. Implementations should apply all or none;
    /// the default applies them one by one.
    fn mint_many(&mut self, credits: &[(Address, u64)]) -> Result<(), LedgerError> {
        for (to, amount) in credits {
            self.mint(*to, *amount)?;
        }
        Ok(())
    }

    fn decimals(&self) -> u8 {
        DECIMALS
    }
}
