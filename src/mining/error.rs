use serde::Serialize;
use thiserror::Error;

use crate::ledger::LedgerError;

pub type Result<T> = std::result::Result<T, MiningError>;

/// Broad failure classes. Callers decide how to recover from the class alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller is not allowed to do this. Re-derive credentials; never retry as-is.
    Authorization,
    /// A prior step is missing or it is too early. Wait or redo the prior step.
    ProtocolSequence,
    /// The submitted proof is wrong. Search further off-line.
    ProofValidity,
    /// Permanent: nothing more can be issued or recorded.
    Exhausted,
    /// Deployment or host environment is broken. Needs an operator.
    Configuration,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("caller does not own agent {agent}")]
    NotAgentOwner { agent: String },

    #[error("caller is not the admin")]
    NotAdmin,

    #[error("mining is paused")]
    Paused,

    #[error("reentrant call rejected")]
    Reentrancy,

    #[error("commit hash must not be empty")]
    EmptyCommit,

    #[error("no valid commitment for this agent in the current round")]
    NoValidCommit,

    #[error("reveal too early: committed at block {committed_at}, now {current}, cooldown {cooldown}")]
    RevealTooEarly {
        committed_at: u64,
        current: u64,
        cooldown: u64,
    },

    #[error("revealed secret does not match the commitment")]
    CommitMismatch,

    #[error("round deadline not reached: deadline block {deadline}, now {current}")]
    DeadlineNotReached { deadline: u64, current: u64 },

    #[error("too early for emergency reset: available at {available_at}, now {now}")]
    TooEarlyForEmergency { available_at: u64, now: u64 },

    #[error("nonce does not meet the current target")]
    InvalidNonce,

    #[error("mining finished: supply cap reached")]
    MiningFinished,

    #[error("agent earnings counter overflow")]
    EarnedOverflow,

    #[error("zero address for {0}")]
    ZeroAddress(&'static str),

    #[error("reward shares sum to {0} bps, expected 10000")]
    InvalidShares(u64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("no randomness source available")]
    NoRandomnessSource,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl MiningError {
    pub fn kind(&self) -> ErrorKind {
        use MiningError::*;
        match self {
            NotAgentOwner { .. } | NotAdmin | Paused | Reentrancy => ErrorKind::Authorization,
            EmptyCommit
            | NoValidCommit
            | RevealTooEarly { .. }
            | CommitMismatch
            | DeadlineNotReached { .. }
            | TooEarlyForEmergency { .. } => ErrorKind::ProtocolSequence,
            InvalidNonce => ErrorKind::ProofValidity,
            MiningFinished | EarnedOverflow => ErrorKind::Exhausted,
            ZeroAddress(_) | InvalidShares(_) | InvalidConfig(_) | NoRandomnessSource => {
                ErrorKind::Configuration
            }
            Ledger(LedgerError::UnknownAgent(_)) => ErrorKind::Authorization,
            Ledger(_) => ErrorKind::Configuration,
        }
    }

    /// Stable machine-readable code, e.g. `reveal_too_early`.
    pub fn code(&self) -> &'static str {
        use MiningError::*;
        match self {
            NotAgentOwner { .. } => "not_agent_owner",
            NotAdmin => "not_admin",
            Paused => "paused",
            Reentrancy => "reentrancy",
            EmptyCommit => "empty_commit",
            NoValidCommit => "no_valid_commit",
            RevealTooEarly { .. } => "reveal_too_early",
            CommitMismatch => "commit_mismatch",
            DeadlineNotReached { .. } => "deadline_not_reached",
            TooEarlyForEmergency { .. } => "too_early_for_emergency",
            InvalidNonce => "invalid_nonce",
            MiningFinished => "mining_finished",
            EarnedOverflow => "earned_overflow",
            ZeroAddress(_) => "zero_address",
            InvalidShares(_) => "invalid_shares",
            InvalidConfig(_) => "invalid_config",
            NoRandomnessSource => "no_randomness_source",
            Ledger(LedgerError::UnknownAgent(_)) => "unknown_agent",
            Ledger(_) => "ledger_error",
        }
    }
}
