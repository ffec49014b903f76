use chrono::Utc;
use primitive_types::U256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::sync::Mutex;

use crate::chain::{ChainClock, HostEntropy};
use crate::ledger::{AgentRegistry, TokenLedger};
use crate::mining::commit::Commitment;
use crate::mining::stats::AgentStats;
use crate::mining::types::hex_word;
use crate::mining::{AgentId, AgentMiner, Address, CallContext, MiningEvent, Word};
use crate::wallet;

/// Signed requests older than this are rejected.
pub const MAX_REQUEST_AGE_SECS: i64 = 300;

pub type NodeMiner = AgentMiner<AgentRegistry, TokenLedger, HostEntropy>;

/// Shared application state: one engine behind one lock, so requests are
/// applied one at a time like transactions in a block.
pub struct AppState {
    pub miner: Mutex<NodeMiner>,
    pub clock: ChainClock,
}

impl AppState {
    pub fn new(miner: NodeMiner, clock: ChainClock) -> Self {
        Self {
            miner: Mutex::new(miner),
            clock,
        }
    }

    pub fn call_context(&self, caller: Address) -> CallContext {
        CallContext {
            caller,
            block: self.clock.current_block(),
        }
    }
}

/* ---------- Signed envelope ---------- */

/// Envelope of every mutating request. `body` keeps the exact JSON text the
/// client sent; the signature covers those bytes (see
/// `wallet::action_sighash`) and the body is parsed only after it verifies.
#[derive(Deserialize)]
pub struct Signed {
    pub pubkey: String,
    pub signature: String,
    pub issued_at: i64,
    pub body: Box<RawValue>,
}

#[derive(Debug)]
pub enum EnvelopeError {
    Unauthenticated(&'static str),
    MalformedBody(String),
}

impl Signed {
    /// Verify freshness and signature, then parse the body.
    /// Returns the signer's address with the typed body.
    pub fn open<T: DeserializeOwned>(&self, action: &str) -> Result<(Address, T), EnvelopeError> {
        let age = Utc::now().timestamp() - self.issued_at;
        if !(-MAX_REQUEST_AGE_SECS..=MAX_REQUEST_AGE_SECS).contains(&age) {
            return Err(EnvelopeError::Unauthenticated(
                "request expired or issued in the future",
            ));
        }
        let caller = wallet::authenticate(
            action,
            self.issued_at,
            self.body.get().as_bytes(),
            &self.pubkey,
            &self.signature,
        )
        .map_err(EnvelopeError::Unauthenticated)?;
        let body = serde_json::from_str(self.body.get())
            .map_err(|e| EnvelopeError::MalformedBody(e.to_string()))?;
        Ok((caller, body))
    }
}

#[derive(Deserialize)]
pub struct Empty {}

/* ---------- Mining API Models ---------- */

#[derive(Deserialize)]
pub struct CommitHashRequest {
    pub agent_id: AgentId,
    #[serde(with = "hex_word")]
    pub secret: Word,
    pub account: Address,
}

#[derive(Serialize)]
pub struct CommitHashResponse {
    #[serde(with = "hex_word")]
    pub commit_hash: Word,
}

#[derive(Deserialize)]
pub struct CommitBody {
    pub agent_id: AgentId,
    #[serde(with = "hex_word")]
    pub commit_hash: Word,
}

#[derive(Serialize)]
pub struct CommitResponse {
    pub round: u64,
    pub agent_id: AgentId,
    pub committer: Address,
    pub reveal_from_block: u64,
}

#[derive(Deserialize)]
pub struct RevealBody {
    pub agent_id: AgentId,
    pub nonce: U256,
    #[serde(with = "hex_word")]
    pub secret: Word,
}

#[derive(Deserialize)]
pub struct SearchNonceRequest {
    pub agent_id: AgentId,
    #[serde(with = "hex_word")]
    pub secret: Word,
    #[serde(default)]
    pub start: U256,
    pub max_tries: Option<u64>,
}

#[derive(Serialize)]
pub struct SearchNonceResponse {
    pub round: u64,
    pub nonce: Option<U256>,
    pub hash: Option<U256>,
}

#[derive(Serialize)]
pub struct RoundResponse {
    pub round: u64,
    pub difficulty: U256,
}

#[derive(Serialize)]
pub struct PauseResponse {
    pub paused: bool,
}

/* ---------- Agent API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterAgentRequest {
    pub owner: Address,
}

#[derive(Serialize)]
pub struct RegisterAgentResponse {
    pub agent_id: AgentId,
    pub owner: Address,
}

#[derive(Deserialize)]
pub struct TransferAgentBody {
    pub to: Address,
}

#[derive(Serialize)]
pub struct AgentStatsResponse {
    pub agent_id: AgentId,
    pub owner: Option<Address>,
    pub stats: AgentStats,
    pub pending_commitment: Option<Commitment>,
}

/* ---------- Ledger / events ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: Address,
    pub balance: u64,
    pub total_supply: u64,
    pub decimals: u8,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub since: Option<u64>,
}

#[derive(Serialize)]
pub struct EventEntry {
    pub seq: u64,
    #[serde(flatten)]
    pub event: MiningEvent,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub next_seq: u64,
    pub events: Vec<EventEntry>,
}
