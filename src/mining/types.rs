use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Agent identity token id.
pub type AgentId = U256;

/// A raw 32-byte word (secrets, seeds, commit hashes).
pub type Word = [u8; 32];

/// 20-byte account identifier. The all-zero value is reserved as "null".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Left-pad into a 32-byte word, the same way an address occupies an ABI slot.
    pub fn to_word(&self) -> Word {
        let mut out = [0u8; 32];
        out[12..].copy_from_slice(&self.0);
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_start_matches("0x");
        let bytes = hex::decode(raw).map_err(|_| "invalid address hex")?;
        if bytes.len() != 20 {
            return Err("address must be 20 bytes");
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Address(out))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Host block data visible to a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: u64, // Unix seconds
}

/// Who is calling, and in which block.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    pub caller: Address,
    pub block: BlockInfo,
}

impl CallContext {
    pub fn new(caller: Address, number: u64, timestamp: u64) -> Self {
        Self {
            caller,
            block: BlockInfo { number, timestamp },
        }
    }
}

pub fn u256_to_word(value: U256) -> Word {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

pub fn word_to_u256(word: &Word) -> U256 {
    U256::from_big_endian(word)
}

/// Hex (0x-prefixed) serde helpers for 32-byte words.
pub mod hex_word {
    use super::Word;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(word: &Word, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(word)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Word, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse(s: &str) -> Result<Word, &'static str> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x")).map_err(|_| "invalid hex")?;
        if bytes.len() != 32 {
            return Err("expected 32 bytes");
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(out)
    }
}
