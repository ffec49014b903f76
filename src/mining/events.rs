use log::info;
use primitive_types::U256;
use serde::Serialize;
use std::collections::VecDeque;

use super::reward::RewardSplit;
use super::types::{AgentId, Address, Word, hex_word};

/// Lifecycle notifications emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MiningEvent {
    RoundStarted {
        round: u64,
        difficulty: U256,
        #[serde(with = "hex_word")]
        seed: Word,
    },
    Committed {
        round: u64,
        agent: AgentId,
        committer: Address,
    },
    MineSuccess {
        round: u64,
        agent: AgentId,
        nonce: U256,
        hash: U256,
        miner: Address,
        validator: Address,
        split: RewardSplit,
    },
    DifficultyAdjusted {
        epoch: u64,
        old: U256,
        new: U256,
        elapsed: u64,
        expected: u64,
    },
    RoundForceAdvanced {
        round: u64,
        caller: Address,
    },
    EmergencyReset {
        round: u64,
        old_difficulty: U256,
        caller: Address,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
}

/// Bounded in-memory event journal, oldest dropped first.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<(u64, MiningEvent)>,
    next_seq: u64,
    capacity: usize,
}

impl EventLog {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            next_seq: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, event: MiningEvent) {
        info!("EVENT #{} {:?}", self.next_seq, event);
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back((self.next_seq, event));
        self.next_seq += 1;
    }

    /// Events with sequence number >= `from`.
    pub fn since(&self, from: u64) -> impl Iterator<Item = &(u64, MiningEvent)> {
        self.events.iter().filter(move |(seq, _)| *seq >= from)
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&MiningEvent> {
        self.events.back().map(|(_, e)| e)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}
