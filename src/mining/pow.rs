use primitive_types::U256;
use sha2::{Digest, Sha256};

use super::error::{MiningError, Result};
use super::types::{AgentId, Address, Word, u256_to_word, word_to_u256};

/// Field type tags for the hash preimage encoding.
const TAG_UINT: u8 = 0x01;
const TAG_BYTES32: u8 = 0x02;
const TAG_ADDRESS: u8 = 0x03;

const DOMAIN_COMMIT: &[u8] = b"agent-pow/commit/v1";
const DOMAIN_SEED: &[u8] = b"agent-pow/seed/v1";
const DOMAIN_WORK: &[u8] = b"agent-pow/work/v1";

/// One field of a hash preimage.
pub enum Field<'a> {
    Uint(U256),
    Bytes32(&'a Word),
    Address(&'a Address),
}

/// SHA-256 over `len(domain) || domain || (tag || 32-byte word)*`.
/// Every field occupies exactly 33 bytes, so distinct inputs never
/// share a preimage.
pub fn tagged_hash(domain: &[u8], fields: &[Field<'_>]) -> Word {
    let mut hasher = Sha256::new();
    hasher.update((domain.len() as u32).to_be_bytes());
    hasher.update(domain);
    for field in fields {
        let (tag, word) = match field {
            Field::Uint(v) => (TAG_UINT, u256_to_word(*v)),
            Field::Bytes32(w) => (TAG_BYTES32, **w),
            Field::Address(a) => (TAG_ADDRESS, a.to_word()),
        };
        hasher.update([tag]);
        hasher.update(word);
    }
    hasher.finalize().into()
}

/// Binding hash a miner commits to. Includes the committing account so a
/// captured reveal cannot be replayed from another account.
pub fn commit_hash(agent: AgentId, secret: &Word, account: &Address) -> Word {
    tagged_hash(
        DOMAIN_COMMIT,
        &[
            Field::Uint(agent),
            Field::Bytes32(secret),
            Field::Address(account),
        ],
    )
}

/// H(round_seed XOR secret).
pub fn enhanced_seed(round_seed: &Word, secret: &Word) -> Word {
    let mut mixed = [0u8; 32];
    for (i, byte) in mixed.iter_mut().enumerate() {
        *byte = round_seed[i] ^ secret[i];
    }
    tagged_hash(DOMAIN_SEED, &[Field::Bytes32(&mixed)])
}

/// PoW hash of a candidate solution, as an unsigned 256-bit integer.
pub fn work_hash(agent: AgentId, nonce: U256, enhanced_seed: &Word) -> U256 {
    let digest = tagged_hash(
        DOMAIN_WORK,
        &[
            Field::Uint(agent),
            Field::Uint(nonce),
            Field::Bytes32(enhanced_seed),
        ],
    );
    word_to_u256(&digest)
}

/// `U256::MAX / max(difficulty, floor)`. A zero difficulty is treated as the floor.
pub fn target(difficulty: U256, floor: U256) -> U256 {
    let effective = difficulty.max(floor).max(U256::one());
    U256::MAX / effective
}

/// Check a nonce against `target`. Returns the work hash on success.
pub fn verify(agent: AgentId, nonce: U256, enhanced_seed: &Word, target: U256) -> Result<U256> {
    let hash = work_hash(agent, nonce, enhanced_seed);
    if hash < target {
        Ok(hash)
    } else {
        Err(MiningError::InvalidNonce)
    }
}

/// Off-line nonce search: tries `start, start+1, ...` up to `max_tries`
/// candidates. Returns `(nonce, hash)` for the first one below `target`.
pub fn search_nonce(
    agent: AgentId,
    enhanced_seed: &Word,
    target: U256,
    start: U256,
    max_tries: u64,
) -> Option<(U256, U256)> {
    let mut nonce = start;
    for _ in 0..max_tries {
        let hash = work_hash(agent, nonce, enhanced_seed);
        if hash < target {
            return Some((nonce, hash));
        }
        nonce = nonce.overflowing_add(U256::one()).0;
    }
    None
}
