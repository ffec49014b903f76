//! End-to-end round scenarios against in-memory collaborators.

use primitive_types::U256;

use super::engine::{AgentMiner, MineOutcome};
use super::pow;
use super::randomness::testing::ScriptedEntropy;
use super::{AgentId, Address, CallContext, MiningError, MiningEvent, Result, Word};
use crate::config::{Deployment, MiningConfig};
use crate::ledger::{
    AgentRegistry, BalanceLedger, COIN, LedgerError, OwnershipRegistry, TokenLedger,
};

const GENESIS_TIME: u64 = 1_700_000_000;

/// Token ledger whose mints can be made to fail.
#[derive(Default)]
struct FailingLedger {
    inner: TokenLedger,
    fail_mints: bool,
}

impl BalanceLedger for FailingLedger {
    fn mint(&mut self, to: Address, amount: u64) -> std::result::Result<(), LedgerError> {
        if self.fail_mints {
            return Err(LedgerError::Overflow);
        }
        self.inner.mint(to, amount)
    }

    fn balance_of(&self, account: &Address) -> u64 {
        self.inner.balance_of(account)
    }

    fn total_supply(&self) -> u64 {
        self.inner.total_supply()
    }

    fn mint_many(&mut self, credits: &[(Address, u64)]) -> std::result::Result<(), LedgerError> {
        if self.fail_mints {
            return Err(LedgerError::Overflow);
        }
        self.inner.mint_many(credits)
    }
}

pub(crate) struct Harness<L = TokenLedger> {
    pub miner: AgentMiner<AgentRegistry, L, ScriptedEntropy>,
    pub admin: Address,
    pub treasury: Address,
    pub alice: Address,
    pub bob: Address,
    pub mallory: Address,
    pub agent: AgentId,
    pub block: u64,
    pub time: u64,
}

impl Harness {
    pub fn new(config: MiningConfig) -> Self {
        Self::with_ledger(config, TokenLedger::new())
    }
}

impl<L: BalanceLedger> Harness<L> {
    pub fn with_ledger(config: MiningConfig, ledger: L) -> Self {
        let admin = Address([0xad; 20]);
        let treasury = Address([0x7e; 20]);
        let alice = Address([0xa1; 20]);
        let bob = Address([0xb0; 20]);
        let mallory = Address([0x66; 20]);

        let mut registry = AgentRegistry::new();
        let agent = registry.issue(alice).unwrap();
        registry.issue(bob).unwrap();

        let deployment = Deployment {
            registry: Address([0x99; 20]),
            treasury,
            admin,
        };
        let genesis = CallContext::new(admin, 100, GENESIS_TIME).block;
        let miner = AgentMiner::new(
            config,
            deployment,
            registry,
            ledger,
            ScriptedEntropy::new(),
            genesis,
        )
        .unwrap();

        Self {
            miner,
            admin,
            treasury,
            alice,
            bob,
            mallory,
            agent,
            block: 100,
            time: GENESIS_TIME,
        }
    }

    pub fn ctx(&self, who: Address) -> CallContext {
        CallContext::new(who, self.block, self.time)
    }

    pub fn advance(&mut self, blocks: u64, secs: u64) {
        self.block += blocks;
        self.time += secs;
    }

    pub fn commit(&mut self, who: Address, agent: AgentId, secret: &Word) -> Result<()> {
        let hash = pow::commit_hash(agent, secret, &who);
        let ctx = self.ctx(who);
        self.miner.commit(&ctx, agent, hash)
    }

    /// Find a nonce for the current round's seed and difficulty.
    pub fn solve(&self, agent: AgentId, secret: &Word) -> U256 {
        self.miner
            .search_nonce(agent, secret, U256::zero(), 1_000_000)
            .expect("difficulty low enough for tests")
            .0
    }

    pub fn reveal(&mut self, who: Address, agent: AgentId, secret: Word) -> Result<MineOutcome> {
        let nonce = self.solve(agent, &secret);
        let ctx = self.ctx(who);
        self.miner.reveal(&ctx, agent, nonce, secret)
    }

    /// Commit, wait out the cooldown, solve and reveal.
    pub fn mine_round(&mut self, who: Address, agent: AgentId, secret: Word) -> Result<MineOutcome> {
        self.commit(who, agent, &secret)?;
        self.advance(2, 2);
        self.reveal(who, agent, secret)
    }

    pub fn balance(&self, who: &Address) -> u64 {
        self.miner.ledger().balance_of(who)
    }
}

fn secret(n: u8) -> Word {
    [n; 32]
}

#[test]
fn scenario_a_commit_wait_reveal_pays_out() {
    let mut h = Harness::new(MiningConfig::default());
    let reward = h.miner.current_reward();
    assert_eq!(reward, 50 * COIN);

    let out = h.mine_round(h.alice, h.agent, secret(1)).unwrap();

    assert_eq!(out.round, 1);
    assert_eq!(h.miner.current_round(), 2);
    assert_eq!(out.split.total(), reward);
    // owner revealing their own solution gets miner + validator share
    assert_eq!(h.balance(&h.alice), reward / 100 * 95);
    assert_eq!(h.balance(&h.treasury), reward / 100 * 5);
    assert_eq!(h.miner.total_issued(), reward);
    assert_eq!(h.miner.ledger().total_supply(), reward);

    let stats = h.miner.agent_stats(h.agent);
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.total_earned, out.split.miner);
    assert_eq!(stats.last_win_round, 1);

    let events: Vec<_> = h.miner.events().since(0).map(|(_, e)| e.clone()).collect();
    assert!(matches!(events[0], MiningEvent::RoundStarted { round: 1, .. }));
    assert!(matches!(events[1], MiningEvent::Committed { round: 1, .. }));
    assert!(matches!(events[2], MiningEvent::MineSuccess { round: 1, .. }));
    assert!(matches!(events[3], MiningEvent::RoundStarted { round: 2, .. }));
}

#[test]
fn scenario_b_cooldown_is_two_blocks() {
    let mut h = Harness::new(MiningConfig::default());
    let s = secret(2);
    h.commit(h.alice, h.agent, &s).unwrap();

    h.advance(1, 12);
    let err = h.reveal(h.alice, h.agent, s).unwrap_err();
    assert!(matches!(err, MiningError::RevealTooEarly { .. }));
    assert_eq!(h.miner.current_round(), 1);
    assert!(h.miner.commitment(h.agent).is_some());

    h.advance(1, 12);
    assert!(h.reveal(h.alice, h.agent, s).is_ok());
    assert_eq!(h.miner.current_round(), 2);
}

#[test]
fn scenario_c_force_advance_after_deadline_mints_nothing() {
    let mut h = Harness::new(MiningConfig::default());
    let s = secret(3);
    h.commit(h.alice, h.agent, &s).unwrap();

    h.advance(255, 255 * 12);
    let err = h.miner.force_advance(&h.ctx(h.mallory)).unwrap_err();
    assert_eq!(
        err,
        MiningError::DeadlineNotReached {
            deadline: 356,
            current: 355
        }
    );

    h.advance(1, 12);
    assert_eq!(h.miner.force_advance(&h.ctx(h.mallory)).unwrap(), 2);
    assert_eq!(h.miner.current_round(), 2);
    assert_eq!(h.miner.total_issued(), 0);
    assert_eq!(h.miner.ledger().total_supply(), 0);
    assert!(matches!(
        h.miner.events().last(),
        Some(MiningEvent::RoundStarted { round: 2, .. })
    ));

    // the round-1 commitment died with the round
    let err = h.reveal(h.alice, h.agent, s).unwrap_err();
    assert_eq!(err, MiningError::NoValidCommit);

    // the deadline restarts with the new round
    let err = h.miner.force_advance(&h.ctx(h.mallory)).unwrap_err();
    assert!(matches!(err, MiningError::DeadlineNotReached { .. }));
}

#[test]
fn scenario_d_fast_epoch_raises_difficulty_up_to_factor() {
    let cfg = MiningConfig {
        epoch_length: 4,
        initial_difficulty: U256::from(1000u64),
        ..MiningConfig::default()
    };
    let mut h = Harness::new(cfg);
    let before = h.miner.difficulty();

    let mut adjustment = None;
    for i in 0..4u8 {
        assert_eq!(h.miner.rounds_until_adjustment(), 4 - i as u64);
        let out = h.mine_round(h.alice, h.agent, secret(10 + i)).unwrap();
        adjustment = out.adjustment;
    }

    let adj = adjustment.expect("epoch boundary reached");
    assert_eq!(adj.old, before);
    assert_eq!(adj.elapsed, 8);
    assert_eq!(adj.expected, 4 * 600);
    let after = h.miner.difficulty();
    assert!(after > before);
    assert_eq!(after, before * U256::from(4u8));
    assert_eq!(h.miner.rounds_until_adjustment(), 4);
    assert_eq!(h.miner.current_target(), U256::MAX / after);
    assert!(h.miner.events().since(0).any(|(_, e)| matches!(
        e,
        MiningEvent::DifficultyAdjusted { epoch: 0, .. }
    )));
}

#[test]
fn scenario_e_stalled_epoch_allows_anonymous_floor_reset() {
    let cfg = MiningConfig {
        initial_difficulty: U256::one() << 200,
        ..MiningConfig::default()
    };
    let mut h = Harness::new(cfg);
    let s = secret(4);
    h.commit(h.alice, h.agent, &s).unwrap();
    h.advance(2, 24);
    let err = h
        .miner
        .reveal(&h.ctx(h.alice), h.agent, U256::zero(), s)
        .unwrap_err();
    assert_eq!(err, MiningError::InvalidNonce);
    // atomic: the commitment survives a failed reveal
    assert!(h.miner.commitment(h.agent).is_some());

    let stall = 10 * 2016 * 600;
    h.time = GENESIS_TIME + stall;
    h.block += 1000;
    let err = h.miner.emergency_reset(&h.ctx(h.mallory)).unwrap_err();
    assert!(matches!(err, MiningError::TooEarlyForEmergency { .. }));

    h.time += 1;
    h.miner.emergency_reset(&h.ctx(h.mallory)).unwrap();
    assert_eq!(h.miner.difficulty(), U256::one());
    assert_eq!(h.miner.current_round(), 1);
    assert_eq!(h.miner.round().start_block, h.block);
    assert_eq!(h.miner.mining_info().epoch, 1);

    // alice's commitment is still for round 1; mine against the new seed
    h.advance(1, 12);
    assert!(h.reveal(h.alice, h.agent, s).is_ok());
}

#[test]
fn second_reveal_of_consumed_commit_fails() {
    let mut h = Harness::new(MiningConfig::default());
    let s = secret(5);
    h.mine_round(h.alice, h.agent, s).unwrap();
    let err = h.reveal(h.alice, h.agent, s).unwrap_err();
    assert_eq!(err, MiningError::NoValidCommit);
    assert_eq!(h.miner.current_round(), 2);
}

#[test]
fn captured_reveal_cannot_be_replayed_from_another_account() {
    let mut h = Harness::new(MiningConfig::default());
    let s = secret(6);
    h.commit(h.alice, h.agent, &s).unwrap();
    h.advance(2, 24);

    let nonce = h.solve(h.agent, &s);
    let err = h
        .miner
        .reveal(&h.ctx(h.mallory), h.agent, nonce, s)
        .unwrap_err();
    assert!(matches!(err, MiningError::NotAgentOwner { .. }));

    // nor commit for an agent mallory does not own
    let err = h.commit(h.mallory, h.agent, &s).unwrap_err();
    assert!(matches!(err, MiningError::NotAgentOwner { .. }));

    // alice still wins
    assert!(h.miner.reveal(&h.ctx(h.alice), h.agent, nonce, s).is_ok());
    assert_eq!(h.balance(&h.mallory), 0);
}

#[test]
fn wrong_secret_is_a_mismatch() {
    let mut h = Harness::new(MiningConfig::default());
    h.commit(h.alice, h.agent, &secret(7)).unwrap();
    h.advance(2, 24);
    let err = h.reveal(h.alice, h.agent, secret(8)).unwrap_err();
    assert_eq!(err, MiningError::CommitMismatch);
}

#[test]
fn commit_rejects_empty_hash_and_unknown_agent() {
    let mut h = Harness::new(MiningConfig::default());
    let ctx = h.ctx(h.alice);
    assert_eq!(
        h.miner.commit(&ctx, h.agent, [0u8; 32]),
        Err(MiningError::EmptyCommit)
    );
    let err = h
        .miner
        .commit(&ctx, AgentId::from(999u64), [1u8; 32])
        .unwrap_err();
    assert_eq!(err.code(), "unknown_agent");
}

#[test]
fn former_owner_cannot_reveal_after_transfer() {
    let mut h = Harness::new(MiningConfig::default());
    let s = secret(9);
    h.commit(h.alice, h.agent, &s).unwrap();
    h.miner.registry_mut().transfer(h.agent, h.bob).unwrap();
    h.advance(2, 24);

    let err = h.reveal(h.alice, h.agent, s).unwrap_err();
    assert!(matches!(err, MiningError::NotAgentOwner { .. }));
    assert_eq!(h.miner.current_round(), 1);
    assert_eq!(h.miner.total_issued(), 0);
    assert_eq!(h.balance(&h.alice), 0);
    assert!(h.miner.commitment(h.agent).is_some());

    // the new owner has no commitment of their own yet
    let err = h.reveal(h.bob, h.agent, s).unwrap_err();
    assert_eq!(err, MiningError::NoValidCommit);

    // once they commit, the agent mines for them and stats follow the agent
    let out = h.mine_round(h.bob, h.agent, secret(90)).unwrap();
    assert_eq!(out.miner, h.bob);
    assert_eq!(out.validator, h.bob);
    assert_eq!(h.miner.registry().owner_of(h.agent).unwrap(), h.bob);
    assert_eq!(h.miner.agent_stats(h.agent).total_earned, out.split.miner);
}

#[test]
fn failed_mint_rolls_back_the_whole_reveal() {
    let cfg = MiningConfig {
        epoch_length: 1,
        initial_difficulty: U256::from(4u8),
        ..MiningConfig::default()
    };
    let mut h = Harness::with_ledger(cfg, FailingLedger::default());
    let s = secret(95);
    h.commit(h.alice, h.agent, &s).unwrap();
    h.advance(2, 24);

    let round = h.miner.mining_info().round;
    let difficulty = h.miner.difficulty();
    let events = h.miner.events().next_seq();

    h.miner.ledger_mut().fail_mints = true;
    let err = h.reveal(h.alice, h.agent, s).unwrap_err();
    assert_eq!(err, MiningError::Ledger(LedgerError::Overflow));

    // epoch_length 1 means this reveal would also have retargeted
    let info = h.miner.mining_info();
    assert_eq!(info.round.number, round.number);
    assert_eq!(info.round.seed, round.seed);
    assert_eq!(info.epoch, 0);
    assert_eq!(h.miner.difficulty(), difficulty);
    assert_eq!(h.miner.total_issued(), 0);
    assert_eq!(h.miner.agent_stats(h.agent).wins, 0);
    assert!(h.miner.commitment(h.agent).is_some());
    assert_eq!(h.miner.events().next_seq(), events);
    assert_eq!(h.miner.ledger().total_supply(), 0);

    h.miner.ledger_mut().fail_mints = false;
    let out = h.reveal(h.alice, h.agent, s).unwrap();
    assert!(out.adjustment.is_some());
    assert_eq!(h.balance(&h.alice), out.split.miner + out.split.validator);
}

#[test]
fn earned_overflow_aborts_reveal_without_side_effects() {
    let mut h = Harness::new(MiningConfig::default());
    h.miner
        .stats_mut()
        .record_win(h.agent, u64::MAX - 1, 0)
        .unwrap();
    let s = secret(96);
    h.commit(h.alice, h.agent, &s).unwrap();
    h.advance(2, 24);

    let err = h.reveal(h.alice, h.agent, s).unwrap_err();
    assert_eq!(err, MiningError::EarnedOverflow);
    assert_eq!(h.miner.current_round(), 1);
    assert_eq!(h.miner.total_issued(), 0);
    assert_eq!(h.miner.agent_stats(h.agent).wins, 1);
    assert!(h.miner.commitment(h.agent).is_some());
    assert_eq!(h.miner.ledger().total_supply(), 0);
}

#[test]
fn rounds_increase_by_exactly_one() {
    let mut h = Harness::new(MiningConfig::default());
    let agent_b = AgentId::from(2u64);
    let mut last = h.miner.current_round();
    for i in 0..6u8 {
        if i % 3 == 2 {
            h.advance(256, 256 * 12);
            h.miner.force_advance(&h.ctx(h.mallory)).unwrap();
        } else if i % 2 == 0 {
            h.mine_round(h.alice, h.agent, secret(20 + i)).unwrap();
        } else {
            h.mine_round(h.bob, agent_b, secret(20 + i)).unwrap();
        }
        assert_eq!(h.miner.current_round(), last + 1);
        last += 1;
    }
}

#[test]
fn halving_follows_round_number() {
    let cfg = MiningConfig {
        initial_reward: 50,
        halving_interval: 2,
        ..MiningConfig::default()
    };
    let mut h = Harness::new(cfg);
    let mut minted = Vec::new();
    for i in 0..3u8 {
        let out = h.mine_round(h.alice, h.agent, secret(30 + i)).unwrap();
        minted.push(out.split.total());
    }
    // rounds 1, 2, 3 -> eras 0, 1, 1
    assert_eq!(minted, vec![50, 25, 25]);
    assert_eq!(h.miner.current_reward(), 12);
}

#[test]
fn supply_cap_ends_mining() {
    let cfg = MiningConfig {
        initial_reward: 50,
        supply_cap: 120,
        ..MiningConfig::default()
    };
    let mut h = Harness::new(cfg);
    h.mine_round(h.alice, h.agent, secret(40)).unwrap();
    h.mine_round(h.alice, h.agent, secret(41)).unwrap();
    assert_eq!(h.miner.current_reward(), 20);

    let out = h.mine_round(h.alice, h.agent, secret(42)).unwrap();
    assert_eq!(out.split.total(), 20);
    assert_eq!(out.split.miner, 18);
    assert_eq!(out.split.validator, 1);
    assert_eq!(out.split.treasury, 1);
    assert_eq!(h.miner.total_issued(), 120);
    assert!(h.miner.is_mining_finished());
    assert!(h.miner.mining_info().finished);

    assert_eq!(
        h.commit(h.alice, h.agent, &secret(43)),
        Err(MiningError::MiningFinished)
    );
    assert_eq!(
        h.miner
            .reveal(&h.ctx(h.alice), h.agent, U256::zero(), secret(43))
            .unwrap_err(),
        MiningError::MiningFinished
    );
    assert_eq!(h.miner.ledger().total_supply(), 120);
}

#[test]
fn pause_blocks_mining_but_not_emergency_reset() {
    let mut h = Harness::new(MiningConfig::default());
    assert_eq!(
        h.miner.pause(&h.ctx(h.alice)),
        Err(MiningError::NotAdmin)
    );
    h.miner.pause(&h.ctx(h.admin)).unwrap();
    assert!(h.miner.is_paused());

    assert_eq!(
        h.commit(h.alice, h.agent, &secret(50)),
        Err(MiningError::Paused)
    );
    h.advance(300, 3600);
    assert_eq!(
        h.miner.force_advance(&h.ctx(h.bob)),
        Err(MiningError::Paused)
    );

    h.time = GENESIS_TIME + 10 * 2016 * 600 + 1;
    h.miner.emergency_reset(&h.ctx(h.bob)).unwrap();

    h.miner.unpause(&h.ctx(h.admin)).unwrap();
    assert!(h.mine_round(h.alice, h.agent, secret(51)).is_ok());
    assert!(h.miner.events().since(0).any(|(_, e)| matches!(e, MiningEvent::Paused { .. })));
    assert!(h.miner.events().since(0).any(|(_, e)| matches!(e, MiningEvent::Unpaused { .. })));
}

#[test]
fn missing_entropy_aborts_reveal_without_side_effects() {
    let mut h = Harness::new(MiningConfig::default());
    let s = secret(60);
    h.commit(h.alice, h.agent, &s).unwrap();
    h.advance(2, 24);

    h.miner.entropy_mut().primary_on = false;
    h.miner.entropy_mut().fallback_on = false;
    let err = h.reveal(h.alice, h.agent, s).unwrap_err();
    assert_eq!(err, MiningError::NoRandomnessSource);
    assert_eq!(h.miner.current_round(), 1);
    assert_eq!(h.miner.total_issued(), 0);
    assert_eq!(h.miner.agent_stats(h.agent).wins, 0);
    assert!(h.miner.commitment(h.agent).is_some());

    // fallback alone is enough
    h.miner.entropy_mut().fallback_on = true;
    assert!(h.reveal(h.alice, h.agent, s).is_ok());
}

#[test]
fn force_advance_retargets_slow_epochs() {
    let cfg = MiningConfig {
        epoch_length: 2,
        initial_difficulty: U256::from(1000u64),
        ..MiningConfig::default()
    };
    let mut h = Harness::new(cfg);
    for _ in 0..2 {
        h.advance(256, 100_000);
        h.miner.force_advance(&h.ctx(h.mallory)).unwrap();
    }
    // far too slow: bounded to a quarter
    assert_eq!(h.miner.difficulty(), U256::from(250u64));
    assert_eq!(h.miner.total_issued(), 0);
}

#[test]
fn reentrant_call_is_rejected() {
    let mut h = Harness::new(MiningConfig::default());
    let guard = h.miner.reentrancy_lock().enter().unwrap();
    let hash = pow::commit_hash(h.agent, &secret(70), &h.alice);
    let ctx = h.ctx(h.alice);
    assert_eq!(
        h.miner.commit(&ctx, h.agent, hash),
        Err(MiningError::Reentrancy)
    );
    drop(guard);
    assert!(h.miner.commit(&ctx, h.agent, hash).is_ok());
}

#[test]
fn construction_validates_inputs() {
    let registry = AgentRegistry::new();
    let block = CallContext::new(Address::ZERO, 1, GENESIS_TIME).block;
    let ok = Address([1; 20]);

    let bad_deploy = Deployment {
        registry: ok,
        treasury: ok,
        admin: Address::ZERO,
    };
    let err = AgentMiner::new(
        MiningConfig::default(),
        bad_deploy,
        registry.clone(),
        TokenLedger::new(),
        ScriptedEntropy::new(),
        block,
    )
    .err()
    .unwrap();
    assert_eq!(err, MiningError::ZeroAddress("admin"));

    let deploy = Deployment {
        registry: ok,
        treasury: ok,
        admin: ok,
    };
    let bad_cfg = MiningConfig {
        miner_share_bps: 9_500,
        ..MiningConfig::default()
    };
    let err = AgentMiner::new(
        bad_cfg,
        deploy,
        registry.clone(),
        TokenLedger::new(),
        ScriptedEntropy::new(),
        block,
    )
    .err()
    .unwrap();
    assert_eq!(err, MiningError::InvalidShares(10_500));

    let mut dead = ScriptedEntropy::new();
    dead.primary_on = false;
    dead.fallback_on = false;
    let err = AgentMiner::new(
        MiningConfig::default(),
        deploy,
        registry,
        TokenLedger::new(),
        dead,
        block,
    )
    .err()
    .unwrap();
    assert_eq!(err, MiningError::NoRandomnessSource);
}

#[test]
fn mining_info_reflects_state() {
    let mut h = Harness::new(MiningConfig::default());
    let info = h.miner.mining_info();
    assert_eq!(info.round.number, 1);
    assert_eq!(info.difficulty, U256::one());
    assert_eq!(info.target, U256::MAX);
    assert_eq!(info.current_reward, 50 * COIN);
    assert_eq!(info.rounds_until_adjustment, 2016);
    assert_eq!(info.deadline_block, 100 + 256);
    assert_eq!(info.remaining_supply, info.supply_cap);
    assert_eq!(info.rounds_in_epoch, 0);
    assert!(!info.paused);

    h.mine_round(h.alice, h.agent, secret(80)).unwrap();
    let info = h.miner.mining_info();
    assert_eq!(info.round.number, 2);
    assert_eq!(info.rounds_until_adjustment, 2015);
    assert_eq!(info.remaining_supply, info.supply_cap - 50 * COIN);
    assert_eq!(h.miner.epoch_progress(), 1);
    assert_eq!(info.rounds_in_epoch, 1);
    assert_eq!(info.epoch_length, 2016);
    assert_eq!(
        h.miner.emergency_available_at(),
        GENESIS_TIME + 2016 * 600 * 10 + 1
    );
}
