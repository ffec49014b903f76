use log::{debug, warn};

use super::error::{MiningError, Result};
use super::types::{BlockInfo, Word};

/// Host-provided entropy. Both sources are observed at the block the
/// round begins in; a zero word means "not available".
pub trait EntropySource {
    fn primary(&mut self, block: &BlockInfo) -> Word;
    fn fallback(&mut self, block: &BlockInfo) -> Word;
}

/// Draw a round seed: primary if non-zero, else fallback, else fail.
/// Never returns the zero word.
pub fn draw_seed<E: EntropySource + ?Sized>(source: &mut E, block: &BlockInfo) -> Result<Word> {
    let primary = source.primary(block);
    if primary != [0u8; 32] {
        debug!("seed drawn from primary source at block {}", block.number);
        return Ok(primary);
    }
    let fallback = source.fallback(block);
    if fallback != [0u8; 32] {
        warn!(
            "primary entropy unavailable at block {}, using fallback",
            block.number
        );
        return Ok(fallback);
    }
    Err(MiningError::NoRandomnessSource)
}
