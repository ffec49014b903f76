use log::{debug, info, warn};
use primitive_types::U256;
use serde::Serialize;

use super::access::{AccessGate, ReentrancyLock};
use super::commit::{CommitRegistry, Commitment};
use super::difficulty::{Adjustment, DifficultyState, RetargetParams};
use super::error::{MiningError, Result};
use super::events::{EventLog, MiningEvent};
use super::pow;
use super::randomness::{EntropySource, draw_seed};
use super::reward::{self, EmissionParams, RewardSplit};
use super::stats::{AgentStats, StatsTracker};
use super::types::{AgentId, Address, BlockInfo, CallContext, Word, hex_word};
use crate::config::{Deployment, MiningConfig};
use crate::ledger::{BalanceLedger, OwnershipRegistry};

/// The active round.
#[derive(Debug, Clone, Serialize)]
pub struct Round {
    pub number: u64,
    pub start_time: u64,
    pub start_block: u64,
    #[serde(with = "hex_word")]
    pub seed: Word,
}

/// Everything the engine mutates. Cloned as a unit to roll back a call
/// whose final ledger write fails.
#[derive(Debug, Clone)]
struct MiningState {
    round: Round,
    difficulty: DifficultyState,
    commits: CommitRegistry,
    stats: StatsTracker,
    total_issued: u64,
    gate: AccessGate,
}

/// Result of a winning reveal.
#[derive(Debug, Clone, Serialize)]
pub struct MineOutcome {
    pub round: u64,
    pub hash: U256,
    pub miner: Address,
    pub validator: Address,
    pub split: RewardSplit,
    pub next_round: u64,
    pub adjustment: Option<Adjustment>,
}

/// Read-only snapshot for dashboards and miners.
#[derive(Debug, Clone, Serialize)]
pub struct MiningInfo {
    pub round: Round,
    pub epoch: u64,
    pub epoch_length: u64,
    pub rounds_in_epoch: u64,
    pub difficulty: U256,
    pub target: U256,
    pub current_reward: u64,
    pub total_issued: u64,
    pub supply_cap: u64,
    pub remaining_supply: u64,
    pub rounds_until_adjustment: u64,
    pub deadline_block: u64,
    pub emergency_available_at: u64,
    pub paused: bool,
    pub finished: bool,
    pub admin: Address,
    pub treasury: Address,
    pub registry: Address,
}

/// Agent-gated PoW issuance: commit-reveal rounds, retargeting, halving
/// emission and the liveness fallbacks.
///
/// Each entry point follows the same shape: external reads, then local
/// mutation, then ledger writes. A failing call leaves no trace.
pub struct AgentMiner<R, L, E> {
    config: MiningConfig,
    deployment: Deployment,
    registry: R,
    ledger: L,
    entropy: E,
    lock: ReentrancyLock,
    events: EventLog,
    state: MiningState,
}

impl<R, L, E> AgentMiner<R, L, E>
where
    R: OwnershipRegistry,
    L: BalanceLedger,
    E: EntropySource,
{
    /// Validate configuration and open round 1 at `genesis`.
    pub fn new(
        config: MiningConfig,
        deployment: Deployment,
        registry: R,
        ledger: L,
        mut entropy: E,
        genesis: BlockInfo,
    ) -> Result<Self> {
        config.validate()?;
        deployment.validate()?;
        let seed = draw_seed(&mut entropy, &genesis)?;

        let state = MiningState {
            round: Round {
                number: 1,
                start_time: genesis.timestamp,
                start_block: genesis.number,
                seed,
            },
            difficulty: DifficultyState::new(config.initial_difficulty, genesis.timestamp, 1),
            commits: CommitRegistry::new(),
            stats: StatsTracker::new(),
            total_issued: 0,
            gate: AccessGate::new(deployment.admin),
        };

        let mut miner = Self {
            config,
            deployment,
            registry,
            ledger,
            entropy,
            lock: ReentrancyLock::new(),
            events: EventLog::default(),
            state,
        };
        miner.events.push(MiningEvent::RoundStarted {
            round: 1,
            difficulty: miner.state.difficulty.difficulty,
            seed,
        });
        info!(
            "MINING - round 1 opened at block {} (difficulty={})",
            genesis.number, miner.state.difficulty.difficulty
        );
        Ok(miner)
    }

    /* -------------------- Entry points -------------------- */

    /// Record a commitment for `agent` in the current round. Caller must own the agent.
    pub fn commit(&mut self, ctx: &CallContext, agent: AgentId, commit_hash: Word) -> Result<()> {
        let _guard = self.lock.enter()?;
        self.state.gate.ensure_not_paused()?;
        self.ensure_not_finished()?;

        let owner = self.registry.owner_of(agent)?;
        if owner != ctx.caller {
            return Err(MiningError::NotAgentOwner {
                agent: agent.to_string(),
            });
        }

        let round = self.state.round.number;
        self.state
            .commits
            .commit(round, agent, commit_hash, ctx.caller, ctx.block.number)?;

        debug!(
            "COMMIT round={} agent={} by {} at block {}",
            round, agent, ctx.caller, ctx.block.number
        );
        self.events.push(MiningEvent::Committed {
            round,
            agent,
            committer: ctx.caller,
        });
        Ok(())
    }

    /// Reveal `secret` and a PoW `nonce`. On success the round is finalized:
    /// rewards are minted, stats updated, difficulty retargeted when due and
    /// the next round opened.
    pub fn reveal(
        &mut self,
        ctx: &CallContext,
        agent: AgentId,
        nonce: U256,
        secret: Word,
    ) -> Result<MineOutcome> {
        let _guard = self.lock.enter()?;
        self.state.gate.ensure_not_paused()?;
        self.ensure_not_finished()?;

        // external reads
        let miner = self.registry.owner_of(agent)?;
        if miner.is_zero() {
            return Err(MiningError::ZeroAddress("agent owner"));
        }
        if miner != ctx.caller {
            return Err(MiningError::NotAgentOwner {
                agent: agent.to_string(),
            });
        }

        let round = self.state.round.number;
        self.state.commits.check_reveal(
            round,
            agent,
            &ctx.caller,
            &secret,
            ctx.block.number,
            self.config.reveal_cooldown_blocks,
        )?;

        let es = pow::enhanced_seed(&self.state.round.seed, &secret);
        let hash = match pow::verify(agent, nonce, &es, self.current_target()) {
            Ok(h) => h,
            Err(e) => {
                warn!("REVEAL round={} agent={} rejected: {}", round, agent, e);
                return Err(e);
            }
        };

        let amount = self.current_reward();
        let split = RewardSplit::compute(
            amount,
            self.config.miner_share_bps,
            self.config.validator_share_bps,
        )?;
        self.state.stats.preview_win(agent, split.miner, round)?;

        let mut difficulty = self.state.difficulty.clone();
        let adjustment = difficulty.maybe_adjust(&self.retarget_params(), ctx.block.timestamp, round + 1);
        let seed = draw_seed(&mut self.entropy, &ctx.block)?;

        // local mutation
        let snapshot = self.state.clone();
        self.state.commits.consume(round, agent)?;
        self.state.stats.record_win(agent, split.miner, round)?;
        self.state.total_issued += amount;
        self.state.difficulty = difficulty;
        self.open_round(round + 1, &ctx.block, seed);

        // ledger writes last
        let credits: Vec<(Address, u64)> = [
            (miner, split.miner),
            (ctx.caller, split.validator),
            (self.deployment.treasury, split.treasury),
        ]
        .into_iter()
        .filter(|(_, amt)| *amt > 0)
        .collect();
        if let Err(e) = self.ledger.mint_many(&credits) {
            self.state = snapshot;
            return Err(e.into());
        }

        info!(
            "MINED round {} agent={} miner={} validator={} reward={} (hash={:#x})",
            round, agent, miner, ctx.caller, amount, hash
        );
        self.events.push(MiningEvent::MineSuccess {
            round,
            agent,
            nonce,
            hash,
            miner,
            validator: ctx.caller,
            split,
        });
        self.emit_round_transition(adjustment.as_ref());

        Ok(MineOutcome {
            round,
            hash,
            miner,
            validator: ctx.caller,
            split,
            next_round: round + 1,
            adjustment,
        })
    }

    /// Close an unsolved round once its reveal deadline has passed. No reward.
    pub fn force_advance(&mut self, ctx: &CallContext) -> Result<u64> {
        let _guard = self.lock.enter()?;
        self.state.gate.ensure_not_paused()?;

        let deadline = self.deadline_block();
        if ctx.block.number < deadline {
            return Err(MiningError::DeadlineNotReached {
                deadline,
                current: ctx.block.number,
            });
        }

        let round = self.state.round.number;
        let mut difficulty = self.state.difficulty.clone();
        let adjustment = difficulty.maybe_adjust(&self.retarget_params(), ctx.block.timestamp, round + 1);
        let seed = draw_seed(&mut self.entropy, &ctx.block)?;

        self.state.difficulty = difficulty;
        self.open_round(round + 1, &ctx.block, seed);

        info!(
            "FORCE-ADVANCE round {} orphaned by {} at block {}",
            round, ctx.caller, ctx.block.number
        );
        self.events.push(MiningEvent::RoundForceAdvanced {
            round,
            caller: ctx.caller,
        });
        self.emit_round_transition(adjustment.as_ref());
        Ok(round + 1)
    }

    /// Permissionless circuit breaker for a stalled epoch: difficulty to the
    /// floor, epoch and round clocks restarted, fresh seed. Works while paused.
    pub fn emergency_reset(&mut self, ctx: &CallContext) -> Result<()> {
        let _guard = self.lock.enter()?;
        let params = self.retarget_params();
        self.state
            .difficulty
            .check_emergency(&params, ctx.block.timestamp)?;
        let seed = draw_seed(&mut self.entropy, &ctx.block)?;

        let round = self.state.round.number;
        let old = self
            .state
            .difficulty
            .reset_to_floor(&params, ctx.block.timestamp, round);
        self.open_round(round, &ctx.block, seed);

        warn!(
            "EMERGENCY RESET by {} at round {}: difficulty {} -> {}",
            ctx.caller, round, old, self.state.difficulty.difficulty
        );
        self.events.push(MiningEvent::EmergencyReset {
            round,
            old_difficulty: old,
            caller: ctx.caller,
        });
        self.emit_round_transition(None);
        Ok(())
    }

    pub fn pause(&mut self, ctx: &CallContext) -> Result<()> {
        let cap = self.state.gate.authorize_admin(&ctx.caller)?;
        if self.state.gate.set_paused(&cap, true) {
            info!("MINING paused by {}", ctx.caller);
            self.events.push(MiningEvent::Paused { by: ctx.caller });
        }
        Ok(())
    }

    pub fn unpause(&mut self, ctx: &CallContext) -> Result<()> {
        let cap = self.state.gate.authorize_admin(&ctx.caller)?;
        if self.state.gate.set_paused(&cap, false) {
            info!("MINING unpaused by {}", ctx.caller);
            self.events.push(MiningEvent::Unpaused { by: ctx.caller });
        }
        Ok(())
    }

    /* -------------------- Queries -------------------- */

    /// Binding hash the engine expects for `(agent, secret, account)`.
    pub fn commit_hash(agent: AgentId, secret: &Word, account: &Address) -> Word {
        pow::commit_hash(agent, secret, account)
    }

    pub fn current_round(&self) -> u64 {
        self.state.round.number
    }

    #[cfg(test)]
    pub(crate) fn round(&self) -> &Round {
        &self.state.round
    }

    pub fn difficulty(&self) -> U256 {
        self.state.difficulty.difficulty
    }

    pub fn current_target(&self) -> U256 {
        pow::target(self.state.difficulty.difficulty, self.config.min_difficulty)
    }

    /// Reward the current round would mint, after the supply cap.
    pub fn current_reward(&self) -> u64 {
        reward::mintable_reward(
            &self.emission_params(),
            self.state.round.number,
            self.state.total_issued,
        )
    }

    pub fn rounds_until_adjustment(&self) -> u64 {
        self.state
            .difficulty
            .rounds_until_adjustment(&self.retarget_params(), self.state.round.number)
    }

    /// Rounds completed in the current epoch.
    pub fn epoch_progress(&self) -> u64 {
        self.state.difficulty.rounds_in_epoch(self.state.round.number)
    }

    /// Earliest timestamp at which `emergency_reset` may fire.
    pub fn emergency_available_at(&self) -> u64 {
        self.state
            .difficulty
            .emergency_available_at(&self.retarget_params())
    }

    pub fn deadline_block(&self) -> u64 {
        self.state
            .round
            .start_block
            .saturating_add(self.config.reveal_deadline_blocks)
    }

    pub fn total_issued(&self) -> u64 {
        self.state.total_issued
    }

    /// True once nothing more can be issued.
    pub fn is_mining_finished(&self) -> bool {
        self.total_issued() >= self.config.supply_cap || self.current_reward() == 0
    }

    pub fn is_paused(&self) -> bool {
        self.state.gate.is_paused()
    }

    pub fn agent_stats(&self, agent: AgentId) -> AgentStats {
        self.state.stats.get(agent)
    }

    pub fn commitment(&self, agent: AgentId) -> Option<&Commitment> {
        self.state.commits.get(self.state.round.number, agent)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// The registry is an external collaborator; the node and tests drive it directly.
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    #[cfg(test)]
    pub(crate) fn entropy_mut(&mut self) -> &mut E {
        &mut self.entropy
    }

    #[cfg(test)]
    pub(crate) fn reentrancy_lock(&self) -> &ReentrancyLock {
        &self.lock
    }

    #[cfg(test)]
    pub(crate) fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[cfg(test)]
    pub(crate) fn stats_mut(&mut self) -> &mut StatsTracker {
        &mut self.state.stats
    }

    /// Off-chain miner helper: search nonces for `(agent, secret)` against the
    /// current round's seed and target. Returns the nonce and its work hash.
    pub fn search_nonce(
        &self,
        agent: AgentId,
        secret: &Word,
        start: U256,
        max_tries: u64,
    ) -> Option<(U256, U256)> {
        let es = pow::enhanced_seed(&self.state.round.seed, secret);
        pow::search_nonce(agent, &es, self.current_target(), start, max_tries)
    }

    pub fn mining_info(&self) -> MiningInfo {
        MiningInfo {
            round: self.state.round.clone(),
            epoch: self.state.difficulty.epoch,
            epoch_length: self.config.epoch_length,
            rounds_in_epoch: self.epoch_progress(),
            difficulty: self.difficulty(),
            target: self.current_target(),
            current_reward: self.current_reward(),
            total_issued: self.total_issued(),
            supply_cap: self.config.supply_cap,
            remaining_supply: self.config.supply_cap.saturating_sub(self.state.total_issued),
            rounds_until_adjustment: self.rounds_until_adjustment(),
            deadline_block: self.deadline_block(),
            emergency_available_at: self.emergency_available_at(),
            paused: self.is_paused(),
            finished: self.is_mining_finished(),
            admin: self.state.gate.admin(),
            treasury: self.deployment.treasury,
            registry: self.deployment.registry,
        }
    }

    /* -------------------- Internals -------------------- */

    fn ensure_not_finished(&self) -> Result<()> {
        if self.is_mining_finished() {
            return Err(MiningError::MiningFinished);
        }
        Ok(())
    }

    fn open_round(&mut self, number: u64, block: &BlockInfo, seed: Word) {
        self.state.round = Round {
            number,
            start_time: block.timestamp,
            start_block: block.number,
            seed,
        };
        let pruned = self.state.commits.prune_before(number);
        if pruned > 0 {
            debug!("pruned {} stale commitments", pruned);
        }
    }

    fn emit_round_transition(&mut self, adjustment: Option<&Adjustment>) {
        if let Some(adj) = adjustment {
            info!(
                "DIFFICULTY - epoch {} retarget {} -> {} (elapsed={}s expected={}s)",
                adj.epoch, adj.old, adj.new, adj.elapsed, adj.expected
            );
            self.events.push(MiningEvent::DifficultyAdjusted {
                epoch: adj.epoch,
                old: adj.old,
                new: adj.new,
                elapsed: adj.elapsed,
                expected: adj.expected,
            });
        }
        self.events.push(MiningEvent::RoundStarted {
            round: self.state.round.number,
            difficulty: self.state.difficulty.difficulty,
            seed: self.state.round.seed,
        });
    }

    fn retarget_params(&self) -> RetargetParams {
        RetargetParams {
            epoch_length: self.config.epoch_length,
            target_round_time_secs: self.config.target_round_time_secs,
            max_adjustment_factor: self.config.max_adjustment_factor,
            min_difficulty: self.config.min_difficulty,
            max_difficulty: self.config.max_difficulty,
            emergency_multiplier: self.config.emergency_multiplier,
        }
    }

    fn emission_params(&self) -> EmissionParams {
        EmissionParams {
            initial_reward: self.config.initial_reward,
            halving_interval: self.config.halving_interval,
            supply_cap: self.config.supply_cap,
        }
    }
}
