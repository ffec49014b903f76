use std::collections::HashMap;

use super::{BalanceLedger, LedgerError};
use crate::mining::types::Address;

/// A simple in-memory balance book over a HashMap.
/// Only supports minting; transfers are out of scope for the node.
#[derive(Debug, Default, Clone)]
pub struct TokenLedger {
    balances: HashMap<Address, u64>,
    total_supply: u64,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalanceLedger for TokenLedger {
    fn mint(&mut self, to: Address, amount: u64) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::MintToZero);
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.total_supply = supply;
        Ok(())
    }

    fn mint_many(&mut self, credits: &[(Address, u64)]) -> Result<(), LedgerError> {
        // dry run on a scratch copy of the touched balances
        let mut supply = self.total_supply;
        let mut touched: HashMap<Address, u64> = HashMap::new();
        for (to, amount) in credits {
            if to.is_zero() {
                return Err(LedgerError::MintToZero);
            }
            supply = supply.checked_add(*amount).ok_or(LedgerError::Overflow)?;
            let current = touched
                .get(to)
                .copied()
                .unwrap_or_else(|| self.balance_of(to));
            let next = current.checked_add(*amount).ok_or(LedgerError::Overflow)?;
            touched.insert(*to, next);
        }
        self.balances.extend(touched);
        self.total_supply = supply;
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u64 {
        self.total_supply
    }
}
