use serde::Serialize;
use std::collections::HashMap;

use super::error::{MiningError, Result};
use super::pow::commit_hash;
use super::types::{AgentId, Address, Word, hex_word};

/// A pending commitment for one agent in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commitment {
    #[serde(with = "hex_word")]
    pub hash: Word,
    pub block: u64,
    pub committer: Address,
}

/// Commitments keyed by (round, agent). A commitment is single-use and only
/// valid in the round it was made in.
#[derive(Debug, Default, Clone)]
pub struct CommitRegistry {
    commits: HashMap<(u64, AgentId), Commitment>,
}

impl CommitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the commitment for `(round, agent)`.
    pub fn commit(
        &mut self,
        round: u64,
        agent: AgentId,
        hash: Word,
        committer: Address,
        block: u64,
    ) -> Result<()> {
        if hash == [0u8; 32] {
            return Err(MiningError::EmptyCommit);
        }
        self.commits.insert(
            (round, agent),
            Commitment {
                hash,
                block,
                committer,
            },
        );
        Ok(())
    }

    /// Validate a reveal against the stored commitment. Read-only: the engine
    /// consumes the commitment with `consume` once the whole reveal succeeds.
    pub fn check_reveal(
        &self,
        round: u64,
        agent: AgentId,
        caller: &Address,
        secret: &Word,
        current_block: u64,
        cooldown: u64,
    ) -> Result<&Commitment> {
        let stored = match self.commits.get(&(round, agent)) {
            Some(c) if &c.committer == caller => c,
            _ => return Err(MiningError::NoValidCommit),
        };
        if current_block < stored.block.saturating_add(cooldown) {
            return Err(MiningError::RevealTooEarly {
                committed_at: stored.block,
                current: current_block,
                cooldown,
            });
        }
        if commit_hash(agent, secret, caller) != stored.hash {
            return Err(MiningError::CommitMismatch);
        }
        Ok(stored)
    }

    /// Remove a commitment so it cannot be revealed twice.
    pub fn consume(&mut self, round: u64, agent: AgentId) -> Result<Commitment> {
        self.commits
            .remove(&(round, agent))
            .ok_or(MiningError::NoValidCommit)
    }

    pub fn get(&self, round: u64, agent: AgentId) -> Option<&Commitment> {
        self.commits.get(&(round, agent))
    }

    /// Drop everything from rounds before `round`. Those entries are already
    /// unusable; this only reclaims memory.
    pub fn prune_before(&mut self, round: u64) -> usize {
        let before = self.commits.len();
        self.commits.retain(|(r, _), _| *r >= round);
        before - self.commits.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}
