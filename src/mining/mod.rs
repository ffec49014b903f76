pub mod access;
pub mod commit;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod events;
pub mod pow;
pub mod randomness;
pub mod reward;
pub mod stats;
pub mod types;

#[cfg(test)]
mod scenarios;

pub use engine::AgentMiner;
pub use error::{ErrorKind, MiningError, Result};
pub use events::MiningEvent;
pub use types::{AgentId, Address, BlockInfo, CallContext, Word};

use crate::ledger::COIN;

/// Reward of the first era (50 coins).
pub const INITIAL_REWARD: u64 = 50 * COIN;

/// Rounds per halving era.
pub const HALVING_INTERVAL: u64 = 210_000;

/// Hard supply ceiling (21M coins).
pub const SUPPLY_CAP: u64 = 21_000_000 * COIN;

/// Rounds per difficulty epoch.
pub const EPOCH_LENGTH: u64 = 2016;

/// Target seconds per round.
pub const TARGET_ROUND_TIME_SECS: u64 = 600;

/// Per-epoch retarget bound: difficulty moves at most by this factor.
pub const MAX_ADJUSTMENT_FACTOR: u64 = 4;

/// Difficulty floor (target = full hash space).
pub const MIN_DIFFICULTY: u64 = 1;

/// Difficulty ceiling as a power of two; keeps the target at 2^32 or above.
pub const MAX_DIFFICULTY_BITS: u32 = 224;

/// Blocks a commitment must age before it can be revealed.
pub const REVEAL_COOLDOWN_BLOCKS: u64 = 2;

/// Blocks after round start before anyone may force-advance.
pub const REVEAL_DEADLINE_BLOCKS: u64 = 256;

/// Emergency reset fires once an epoch has run this many times its expected duration.
pub const EMERGENCY_MULTIPLIER: u64 = 10;

/// Basis point denominator for reward shares.
pub const BPS_DENOMINATOR: u64 = 10_000;

pub const MINER_SHARE_BPS: u64 = 9_000;
pub const VALIDATOR_SHARE_BPS: u64 = 500;
pub const TREASURY_SHARE_BPS: u64 = 500;
