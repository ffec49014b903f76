use std::collections::HashMap;

use super::{LedgerError, OwnershipRegistry};
use crate::mining::types::{AgentId, Address};

/// In-memory agent identity registry: agent id -> controlling account.
#[derive(Debug, Default, Clone)]
pub struct AgentRegistry {
    owners: HashMap<AgentId, Address>,
    next_id: u64,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            owners: HashMap::new(),
            next_id: 1,
        }
    }

    /// Issue a fresh identity to `owner` and return its id.
    pub fn issue(&mut self, owner: Address) -> Result<AgentId, LedgerError> {
        if owner.is_zero() {
            return Err(LedgerError::MintToZero);
        }
        let id = AgentId::from(self.next_id.max(1));
        self.next_id = self.next_id.max(1) + 1;
        self.owners.insert(id, owner);
        Ok(id)
    }

    /// Move an existing identity to a new controller.
    pub fn transfer(&mut self, agent: AgentId, to: Address) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::MintToZero);
        }
        match self.owners.get_mut(&agent) {
            Some(owner) => {
                *owner = to;
                Ok(())
            }
            None => Err(LedgerError::UnknownAgent(agent.to_string())),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.owners.len()
    }
}

impl OwnershipRegistry for AgentRegistry {
    fn owner_of(&self, agent: AgentId) -> Result<Address, LedgerError> {
        self.owners
            .get(&agent)
            .copied()
            .ok_or_else(|| LedgerError::UnknownAgent(agent.to_string()))
    }
}
