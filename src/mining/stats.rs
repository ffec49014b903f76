use serde::Serialize;
use std::collections::HashMap;

use super::error::{MiningError, Result};
use super::types::AgentId;

/// Per-agent mining record. Keyed by agent, not account: ownership can move.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    pub wins: u64,
    pub total_earned: u64,
    pub last_win_round: u64,
}

#[derive(Debug, Default, Clone)]
pub struct StatsTracker {
    by_agent: HashMap<AgentId, AgentStats>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the record after a win without storing it.
    pub fn preview_win(&self, agent: AgentId, miner_amount: u64, round: u64) -> Result<AgentStats> {
        let current = self.get(agent);
        let total_earned = current
            .total_earned
            .checked_add(miner_amount)
            .ok_or(MiningError::EarnedOverflow)?;
        Ok(AgentStats {
            wins: current.wins.saturating_add(1),
            total_earned,
            last_win_round: round,
        })
    }

    pub fn record_win(&mut self, agent: AgentId, miner_amount: u64, round: u64) -> Result<AgentStats> {
        let next = self.preview_win(agent, miner_amount, round)?;
        self.by_agent.insert(agent, next);
        Ok(next)
    }

    /// Zeroed record for agents that never won.
    pub fn get(&self, agent: AgentId) -> AgentStats {
        self.by_agent.get(&agent).copied().unwrap_or_default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_agent.len()
    }
}
