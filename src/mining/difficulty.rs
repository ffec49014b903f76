use primitive_types::{U256, U512};
use serde::Serialize;

use super::error::{MiningError, Result};

/// Bounds and pacing for retargeting.
#[derive(Debug, Clone, Copy)]
pub struct RetargetParams {
    pub epoch_length: u64,
    pub target_round_time_secs: u64,
    pub max_adjustment_factor: u64,
    pub min_difficulty: U256,
    pub max_difficulty: U256,
    pub emergency_multiplier: u64,
}

/// Outcome of one epoch retarget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adjustment {
    pub epoch: u64,
    pub old: U256,
    pub new: U256,
    pub elapsed: u64,
    pub expected: u64,
}

/// Proportional retarget: `old * expected / elapsed`, bounded per epoch by
/// `factor` and globally by `[min, max]`. `elapsed == 0` counts as maximally fast.
pub fn retarget(
    old: U256,
    elapsed: u64,
    expected: u64,
    factor: u64,
    min: U256,
    max: U256,
) -> U256 {
    let factor = U256::from(factor);
    let upper = old.saturating_mul(factor);
    let lower = old / factor;

    let proposed = if elapsed == 0 {
        upper
    } else {
        let scaled = old.full_mul(U256::from(expected)) / U512::from(elapsed);
        U256::try_from(scaled).unwrap_or(U256::MAX)
    };

    proposed.clamp(lower, upper).clamp(min, max)
}

/// Current difficulty plus the epoch window it is measured over.
#[derive(Debug, Clone, Serialize)]
pub struct DifficultyState {
    pub difficulty: U256,
    pub epoch: u64,
    pub epoch_start_time: u64,
    pub epoch_start_round: u64,
}

impl DifficultyState {
    pub fn new(initial: U256, start_time: u64, start_round: u64) -> Self {
        Self {
            difficulty: initial,
            epoch: 0,
            epoch_start_time: start_time,
            epoch_start_round: start_round,
        }
    }

    pub fn rounds_in_epoch(&self, current_round: u64) -> u64 {
        current_round.saturating_sub(self.epoch_start_round)
    }

    pub fn is_due(&self, params: &RetargetParams, current_round: u64) -> bool {
        self.rounds_in_epoch(current_round) >= params.epoch_length
    }

    pub fn rounds_until_adjustment(&self, params: &RetargetParams, current_round: u64) -> u64 {
        params
            .epoch_length
            .saturating_sub(self.rounds_in_epoch(current_round))
    }

    /// Retarget if the epoch boundary has been reached.
    pub fn maybe_adjust(
        &mut self,
        params: &RetargetParams,
        now: u64,
        current_round: u64,
    ) -> Option<Adjustment> {
        if !self.is_due(params, current_round) {
            return None;
        }
        let rounds = self.rounds_in_epoch(current_round);
        let elapsed = now.saturating_sub(self.epoch_start_time);
        let expected = rounds.saturating_mul(params.target_round_time_secs);
        let old = self.difficulty;
        let new = retarget(
            old,
            elapsed,
            expected,
            params.max_adjustment_factor,
            params.min_difficulty,
            params.max_difficulty,
        );

        let adj = Adjustment {
            epoch: self.epoch,
            old,
            new,
            elapsed,
            expected,
        };
        self.difficulty = new;
        self.epoch += 1;
        self.epoch_start_time = now;
        self.epoch_start_round = current_round;
        Some(adj)
    }

    /// Earliest timestamp at which an emergency reset is allowed.
    pub fn emergency_available_at(&self, params: &RetargetParams) -> u64 {
        let expected = params
            .epoch_length
            .saturating_mul(params.target_round_time_secs);
        self.epoch_start_time
            .saturating_add(expected.saturating_mul(params.emergency_multiplier))
            .saturating_add(1)
    }

    /// Allowed once the epoch has run strictly longer than
    /// `emergency_multiplier` times its expected duration.
    pub fn check_emergency(&self, params: &RetargetParams, now: u64) -> Result<()> {
        let available_at = self.emergency_available_at(params);
        if now < available_at {
            return Err(MiningError::TooEarlyForEmergency { available_at, now });
        }
        Ok(())
    }

    /// Force the floor and restart the epoch window. Returns the old difficulty.
    pub fn reset_to_floor(&mut self, params: &RetargetParams, now: u64, current_round: u64) -> U256 {
        let old = self.difficulty;
        self.difficulty = params.min_difficulty;
        self.epoch += 1;
        self.epoch_start_time = now;
        self.epoch_start_round = current_round;
        old
    }
}
