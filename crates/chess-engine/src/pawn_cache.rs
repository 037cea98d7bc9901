//! Cache of pawn structure scores keyed by the pawn-only signature.
//!
//! Many otherwise unrelated positions share a pawn skeleton, so the score is
//! stored once per skeleton. One always-replace entry per slot.

use crate::config::{EngineConfig, TABLE_BITS_RANGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PawnEntry {
    signature: u64,
    score: i32,
}

#[derive(Debug, Clone)]
pub struct PawnStructureCache {
    slots: Vec<Option<PawnEntry>>,
    mask: u64,
}

impl PawnStructureCache {
    /// A cache of `1 << bits` slots.
    ///
    /// # Panics
    ///
    /// If `bits` is outside `1..=28`.
    pub fn with_bits(bits: u32) -> Self {
        assert!(TABLE_BITS_RANGE.contains(&bits), "pawn cache bits out of range: {bits}");
        let capacity = 1usize << bits;
        tracing::debug!(slots = capacity, "allocating pawn structure cache");
        PawnStructureCache {
            slots: vec![None; capacity],
            mask: (capacity - 1) as u64,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_bits(config.pawn_cache_bits)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn index(&self, signature: u64) -> usize {
        (signature & self.mask) as usize
    }

    pub fn lookup(&self, signature: u64) -> Option<i32> {
        self.slots[self.index(signature)]
            .filter(|entry| entry.signature == signature)
            .map(|entry| entry.score)
    }

    pub fn store(&mut self, signature: u64, score: i32) {
        let index = self.index(signature);
        self.slots[index] = Some(PawnEntry { signature, score });
    }

    /// The cached score, or `evaluate()` stored and returned on a miss.
    pub fn get_or_insert_with(&mut self, signature: u64, evaluate: impl FnOnce() -> i32) -> i32 {
        if let Some(score) = self.lookup(signature) {
            return score;
        }
        let score = evaluate();
        self.store(signature, score);
        score
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
        tracing::debug!(slots = self.slots.len(), "cleared pawn structure cache");
    }
}

impl Default for PawnStructureCache {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
