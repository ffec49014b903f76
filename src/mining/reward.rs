use serde::Serialize;

use super::BPS_DENOMINATOR;
use super::error::{MiningError, Result};

/// Emission schedule and split.
#[derive(Debug, Clone, Copy)]
pub struct EmissionParams {
    pub initial_reward: u64,
    pub halving_interval: u64,
    pub supply_cap: u64,
}

/// Halving-adjusted reward for `round`. Zero from era 64 on.
pub fn era_reward(initial_reward: u64, halving_interval: u64, round: u64) -> u64 {
    let era = round / halving_interval.max(1);
    if era >= 64 {
        return 0;
    }
    initial_reward >> era
}

/// Clip `reward` so that issuance never passes the cap.
pub fn cap_reward(reward: u64, total_issued: u64, supply_cap: u64) -> u64 {
    reward.min(supply_cap.saturating_sub(total_issued))
}

/// Reward actually mintable for `round` given what was already issued.
pub fn mintable_reward(params: &EmissionParams, round: u64, total_issued: u64) -> u64 {
    cap_reward(
        era_reward(params.initial_reward, params.halving_interval, round),
        total_issued,
        params.supply_cap,
    )
}

/// Three-way split of one round's reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardSplit {
    pub miner: u64,
    pub validator: u64,
    pub treasury: u64,
}

impl RewardSplit {
    /// Miner and validator get floor(reward * bps / 10000); the treasury
    /// takes the remainder so the parts always add up to `reward`.
    pub fn compute(reward: u64, miner_bps: u64, validator_bps: u64) -> Result<Self> {
        if miner_bps + validator_bps > BPS_DENOMINATOR {
            return Err(MiningError::InvalidShares(miner_bps + validator_bps));
        }
        let share = |bps: u64| (reward as u128 * bps as u128 / BPS_DENOMINATOR as u128) as u64;
        let miner = share(miner_bps);
        let validator = share(validator_bps);
        Ok(Self {
            miner,
            validator,
            treasury: reward - miner - validator,
        })
    }

    pub fn total(&self) -> u64 {
        self.miner + self.validator + self.treasury
    }
}
