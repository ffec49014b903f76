use primitive_types::U256;
use std::env;
use std::str::FromStr;

use crate::mining::{
    self, Address, BPS_DENOMINATOR, MiningError, Result,
};

/// Protocol tunables. Defaults are the production constants; tests shrink
/// epochs and intervals to keep scenarios short.
#[derive(Debug, Clone)]
pub struct MiningConfig {
    pub initial_reward: u64,
    pub halving_interval: u64,
    pub supply_cap: u64,
    pub epoch_length: u64,
    pub target_round_time_secs: u64,
    pub max_adjustment_factor: u64,
    pub min_difficulty: U256,
    pub max_difficulty: U256,
    pub initial_difficulty: U256,
    pub reveal_cooldown_blocks: u64,
    pub reveal_deadline_blocks: u64,
    pub emergency_multiplier: u64,
    pub miner_share_bps: u64,
    pub validator_share_bps: u64,
    pub treasury_share_bps: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            initial_reward: mining::INITIAL_REWARD,
            halving_interval: mining::HALVING_INTERVAL,
            supply_cap: mining::SUPPLY_CAP,
            epoch_length: mining::EPOCH_LENGTH,
            target_round_time_secs: mining::TARGET_ROUND_TIME_SECS,
            max_adjustment_factor: mining::MAX_ADJUSTMENT_FACTOR,
            min_difficulty: U256::from(mining::MIN_DIFFICULTY),
            max_difficulty: U256::one() << mining::MAX_DIFFICULTY_BITS,
            initial_difficulty: U256::from(mining::MIN_DIFFICULTY),
            reveal_cooldown_blocks: mining::REVEAL_COOLDOWN_BLOCKS,
            reveal_deadline_blocks: mining::REVEAL_DEADLINE_BLOCKS,
            emergency_multiplier: mining::EMERGENCY_MULTIPLIER,
            miner_share_bps: mining::MINER_SHARE_BPS,
            validator_share_bps: mining::VALIDATOR_SHARE_BPS,
            treasury_share_bps: mining::TREASURY_SHARE_BPS,
        }
    }
}

impl MiningConfig {
    /// Defaults overridden by `MINING_*` environment variables (after `.env` is loaded).
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            initial_reward: env_or("MINING_INITIAL_REWARD", d.initial_reward),
            halving_interval: env_or("MINING_HALVING_INTERVAL", d.halving_interval),
            supply_cap: env_or("MINING_SUPPLY_CAP", d.supply_cap),
            epoch_length: env_or("MINING_EPOCH_LENGTH", d.epoch_length),
            target_round_time_secs: env_or("MINING_TARGET_ROUND_TIME_SECS", d.target_round_time_secs),
            max_adjustment_factor: env_or("MINING_MAX_ADJUSTMENT_FACTOR", d.max_adjustment_factor),
            min_difficulty: env_u256_or("MINING_MIN_DIFFICULTY", d.min_difficulty),
            max_difficulty: env_u256_or("MINING_MAX_DIFFICULTY", d.max_difficulty),
            initial_difficulty: env_u256_or("MINING_INITIAL_DIFFICULTY", d.initial_difficulty),
            reveal_cooldown_blocks: env_or("MINING_REVEAL_COOLDOWN_BLOCKS", d.reveal_cooldown_blocks),
            reveal_deadline_blocks: env_or("MINING_REVEAL_DEADLINE_BLOCKS", d.reveal_deadline_blocks),
            emergency_multiplier: env_or("MINING_EMERGENCY_MULTIPLIER", d.emergency_multiplier),
            miner_share_bps: env_or("MINING_MINER_SHARE_BPS", d.miner_share_bps),
            validator_share_bps: env_or("MINING_VALIDATOR_SHARE_BPS", d.validator_share_bps),
            treasury_share_bps: env_or("MINING_TREASURY_SHARE_BPS", d.treasury_share_bps),
        }
    }

    /// Check internal consistency. Called once by the engine constructor.
    pub fn validate(&self) -> Result<()> {
        let bps = self.miner_share_bps + self.validator_share_bps + self.treasury_share_bps;
        if bps != BPS_DENOMINATOR {
            return Err(MiningError::InvalidShares(bps));
        }
        if self.min_difficulty.is_zero() {
            return Err(MiningError::InvalidConfig("min difficulty must be > 0"));
        }
        if self.min_difficulty > self.max_difficulty {
            return Err(MiningError::InvalidConfig("min difficulty above max difficulty"));
        }
        if self.initial_difficulty < self.min_difficulty
            || self.initial_difficulty > self.max_difficulty
        {
            return Err(MiningError::InvalidConfig("initial difficulty out of bounds"));
        }
        if self.max_adjustment_factor < 2 {
            return Err(MiningError::InvalidConfig("max adjustment factor must be >= 2"));
        }
        if self.epoch_length == 0 || self.halving_interval == 0 || self.target_round_time_secs == 0
        {
            return Err(MiningError::InvalidConfig("epoch, halving and round time must be > 0"));
        }
        if self.emergency_multiplier == 0 {
            return Err(MiningError::InvalidConfig("emergency multiplier must be > 0"));
        }
        Ok(())
    }
}

/// Accounts fixed at deployment.
#[derive(Debug, Clone, Copy)]
pub struct Deployment {
    pub registry: Address,
    pub treasury: Address,
    pub admin: Address,
}

impl Deployment {
    pub fn validate(&self) -> Result<()> {
        if self.registry.is_zero() {
            return Err(MiningError::ZeroAddress("registry"));
        }
        if self.treasury.is_zero() {
            return Err(MiningError::ZeroAddress("treasury"));
        }
        if self.admin.is_zero() {
            return Err(MiningError::ZeroAddress("admin"));
        }
        Ok(())
    }

    /// Read `REGISTRY_ADDRESS`, `TREASURY_ADDRESS`, `ADMIN_ADDRESS`.
    /// Missing or malformed values become the zero address and fail validation.
    pub fn from_env() -> Self {
        Self {
            registry: env_or("REGISTRY_ADDRESS", Address::ZERO),
            treasury: env_or("TREASURY_ADDRESS", Address::ZERO),
            admin: env_or("ADMIN_ADDRESS", Address::ZERO),
        }
    }
}

/// HTTP node settings.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub block_time_secs: u64,
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8080),
            block_time_secs: env_or("BLOCK_TIME_SECS", 12u64).max(1),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u256_or(key: &str, default: U256) -> U256 {
    env::var(key)
        .ok()
        .and_then(|v| {
            let v = v.trim();
            match v.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16).ok(),
                None => U256::from_dec_str(v).ok(),
            }
        })
        .unwrap_or(default)
}
