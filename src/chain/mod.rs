use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::mining::randomness::EntropySource;
use crate::mining::{BlockInfo, Word};

/// Derives block height from wall time: one block every `block_time_secs`
/// since `genesis_time`.
#[derive(Debug, Clone)]
pub struct ChainClock {
    genesis_time: i64,
    block_time_secs: u64,
}

impl ChainClock {
    pub fn new(genesis_time: i64, block_time_secs: u64) -> Self {
        Self {
            genesis_time,
            block_time_secs: block_time_secs.max(1),
        }
    }

    /// Clock whose genesis is now.
    pub fn starting_now(block_time_secs: u64) -> Self {
        Self::new(Utc::now().timestamp(), block_time_secs)
    }

    pub fn block_at(&self, unix_secs: i64) -> BlockInfo {
        let since = (unix_secs - self.genesis_time).max(0) as u64;
        BlockInfo {
            number: since / self.block_time_secs,
            timestamp: unix_secs.max(0) as u64,
        }
    }

    pub fn current_block(&self) -> BlockInfo {
        self.block_at(Utc::now().timestamp())
    }
}

/// Node entropy: OS randomness as primary, a hash chain over block data as
/// fallback. The fallback is predictable and only covers a failing OS RNG.
#[derive(Debug, Default)]
pub struct HostEntropy {
    last: Word,
}

impl HostEntropy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntropySource for HostEntropy {
    fn primary(&mut self, _block: &BlockInfo) -> Word {
        let mut out = [0u8; 32];
        if OsRng.try_fill_bytes(&mut out).is_err() {
            return [0u8; 32];
        }
        out
    }

    fn fallback(&mut self, block: &BlockInfo) -> Word {
        let mut hasher = Sha256::new();
        hasher.update(self.last);
        hasher.update(block.number.to_be_bytes());
        hasher.update(block.timestamp.to_be_bytes());
        self.last = hasher.finalize().into();
        self.last
    }
}
