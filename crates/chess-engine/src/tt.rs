//! Transposition table.
//!
//! A fixed number of slots, indexed by the low bits of the position
//! signature. Each slot keeps two entries: a depth-preferred one that is only
//! displaced by deeper analysis, and an always-replace one that takes
//! everything else. A hit requires the full signature to match; a slot shared
//! by a different position is a miss.
//!
//! Hits are advisory. Writes are plain overwrites, so a table shared between
//! searches must sit behind a lock and its contents never trusted over
//! re-derivation.

use crate::config::{EngineConfig, TABLE_BITS_RANGE};
use chess_core::Move;
use std::sync::atomic::{AtomicU64, Ordering};

/// How a stored score relates to the true value of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The exact value (principal variation node).
    Exact,
    /// A refutation cut the search off; the value is at least the score.
    LowerBound,
    /// No move raised alpha; the value is at most the score.
    UpperBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub signature: u64,
    pub depth: u32,
    pub score: i32,
    pub kind: NodeKind,
    pub best_move: Option<Move>,
}

/// What a successful [`TranspositionTable::lookup`] hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHit {
    pub score: i32,
    pub kind: NodeKind,
    pub best_move: Option<Move>,
}

impl From<TableEntry> for TableHit {
    fn from(entry: TableEntry) -> Self {
        TableHit {
            score: entry.score,
            kind: entry.kind,
            best_move: entry.best_move,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    depth_preferred: TableEntry,
    always_replace: TableEntry,
}

impl Slot {
    /// The entry for `signature`, depth-preferred first.
    fn matching(&self, signature: u64) -> Option<&TableEntry> {
        [&self.depth_preferred, &self.always_replace]
            .into_iter()
            .find(|entry| entry.signature == signature)
    }
}

#[derive(Debug)]
pub struct TranspositionTable {
    slots: Vec<Option<Slot>>,
    mask: u64,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: u64,
}

impl TranspositionTable {
    /// A table of `1 << bits` slots.
    ///
    /// # Panics
    ///
    /// If `bits` is outside `1..=28`.
    pub fn with_bits(bits: u32) -> Self {
        assert!(TABLE_BITS_RANGE.contains(&bits), "transposition table bits out of range: {bits}");
        let capacity = 1usize << bits;
        tracing::debug!(slots = capacity, "allocating transposition table");
        TranspositionTable {
            slots: vec![None; capacity],
            mask: (capacity - 1) as u64,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: 0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_bits(config.tt_bits)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn slot(&self, signature: u64) -> Option<&Slot> {
        self.slots[(signature & self.mask) as usize].as_ref()
    }

    /// The stored result for `signature` if it was searched at least
    /// `required_depth` plies deep.
    pub fn lookup(&self, signature: u64, required_depth: u32) -> Option<TableHit> {
        let hit = self.slot(signature).and_then(|slot| {
            [slot.depth_preferred, slot.always_replace]
                .into_iter()
                .find(|entry| entry.signature == signature && entry.depth >= required_depth)
        });
        match hit {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.into())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn store(&mut self, signature: u64, depth: u32, score: i32, kind: NodeKind, best_move: Option<Move>) {
        let entry = TableEntry {
            signature,
            depth,
            score,
            kind,
            best_move,
        };
        self.stores += 1;
        let index = (signature & self.mask) as usize;
        match self.slots[index].as_mut() {
            Some(slot) if depth > slot.depth_preferred.depth => slot.depth_preferred = entry,
            Some(slot) => slot.always_replace = entry,
            None => {
                self.slots[index] = Some(Slot {
                    depth_preferred: entry,
                    always_replace: entry,
                })
            }
        }
    }

    /// Stored best move for `signature` at any depth.
    pub fn best_move(&self, signature: u64) -> Option<Move> {
        self.slot(signature)?.matching(signature)?.best_move
    }

    /// Whether `signature` was last stored as an exact (PV) node.
    pub fn is_pv_node(&self, signature: u64) -> bool {
        self.slot(signature)
            .and_then(|slot| slot.matching(signature))
            .is_some_and(|entry| entry.kind == NodeKind::Exact)
    }

    /// Empties every slot and resets the statistics.
    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.stores = 0;
        tracing::debug!(slots = self.slots.len(), "cleared transposition table");
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores,
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{Color, Piece, Square};

    const SIG: u64 = 0xDEAD_BEEF_0000_0123;

    fn pawn_push(from: &str, to: &str) -> Move {
        let square = |s: &str| Square::from_algebraic(s).unwrap();
        Move::quiet(Color::White, Piece::Pawn, square(from), square(to))
    }

    fn e2e4() -> Move {
        pawn_push("e2", "e4")
    }

    fn d2d4() -> Move {
        pawn_push("d2", "d4")
    }

    fn slot(table: &TranspositionTable, signature: u64) -> Slot {
        table.slot(signature).copied().unwrap()
    }

    #[test]
    fn store_then_lookup() {
        let mut table = TranspositionTable::with_bits(8);
        table.store(SIG, 4, 35, NodeKind::Exact, Some(e2e4()));
        assert_eq!(
            table.lookup(SIG, 4),
            Some(TableHit {
                score: 35,
                kind: NodeKind::Exact,
                best_move: Some(e2e4())
            })
        );
        // Shallower requests are served by deeper results.
        assert!(table.lookup(SIG, 1).is_some());
    }

    #[test]
    fn deeper_requirement_misses() {
        let mut table = TranspositionTable::with_bits(8);
        table.store(SIG, 4, 35, NodeKind::Exact, None);
        assert_eq!(table.lookup(SIG, 5), None);
        assert_eq!(table.stats(), TableStats { hits: 0, misses: 1, stores: 1 });
    }

    #[test]
    fn empty_slot_fills_both_entries() {
        let mut table = TranspositionTable::with_bits(8);
        table.store(SIG, 3, 10, NodeKind::LowerBound, None);
        let slot = slot(&table, SIG);
        assert_eq!(slot.depth_preferred, slot.always_replace);
        assert_eq!(slot.depth_preferred.depth, 3);
    }

    #[test]
    fn shallower_store_keeps_deep_entry() {
        let mut table = TranspositionTable::with_bits(8);
        table.store(SIG, 6, 100, NodeKind::Exact, Some(e2e4()));
        table.store(SIG, 2, -40, NodeKind::UpperBound, Some(d2d4()));

        let slot = slot(&table, SIG);
        assert_eq!(slot.depth_preferred.depth, 6);
        assert_eq!(slot.depth_preferred.score, 100);
        assert_eq!(slot.always_replace.depth, 2);
        assert_eq!(slot.always_replace.score, -40);

        assert_eq!(table.lookup(SIG, 6).map(|hit| hit.score), Some(100));
    }

    #[test]
    fn equal_depth_goes_to_always_replace() {
        let mut table = TranspositionTable::with_bits(8);
        table.store(SIG, 4, 1, NodeKind::Exact, None);
        table.store(SIG, 4, 2, NodeKind::Exact, None);
        let slot = slot(&table, SIG);
        assert_eq!(slot.depth_preferred.score, 1);
        assert_eq!(slot.always_replace.score, 2);
    }

    #[test]
    fn deeper_store_replaces_depth_preferred() {
        let mut table = TranspositionTable::with_bits(8);
        table.store(SIG, 2, 1, NodeKind::UpperBound, None);
        table.store(SIG, 5, 2, NodeKind::Exact, None);
        let slot = slot(&table, SIG);
        assert_eq!(slot.depth_preferred.depth, 5);
        assert_eq!(slot.always_replace.depth, 2);
    }

    #[test]
    fn aliasing_signature_is_a_miss() {
        let mut table = TranspositionTable::with_bits(8);
        let alias = SIG ^ (1 << 40);
        assert_eq!(SIG & table.mask, alias & table.mask);

        table.store(SIG, 5, 7, NodeKind::Exact, Some(e2e4()));
        assert_eq!(table.lookup(alias, 0), None);
        assert_eq!(table.best_move(alias), None);
        assert!(!table.is_pv_node(alias));

        // The alias lands in always-replace; both are retrievable.
        table.store(alias, 1, 9, NodeKind::LowerBound, Some(d2d4()));
        assert_eq!(table.lookup(alias, 1).map(|hit| hit.score), Some(9));
        assert_eq!(table.lookup(SIG, 5).map(|hit| hit.score), Some(7));
    }

    #[test]
    fn best_move_ignores_depth() {
        let mut table = TranspositionTable::with_bits(8);
        table.store(SIG, 1, 0, NodeKind::UpperBound, Some(d2d4()));
        assert_eq!(table.lookup(SIG, 10), None);
        assert_eq!(table.best_move(SIG), Some(d2d4()));
        assert!(!table.is_pv_node(SIG));
    }

    #[test]
    fn pv_node_query() {
        let mut table = TranspositionTable::with_bits(8);
        table.store(SIG, 3, 0, NodeKind::Exact, None);
        assert!(table.is_pv_node(SIG));
        assert!(!table.is_pv_node(SIG + 1));
    }

    #[test]
    fn clear_empties_everything() {
        let mut table = TranspositionTable::with_bits(4);
        for sig in 0..64 {
            table.store(sig, 1, 0, NodeKind::Exact, None);
        }
        table.clear();
        assert!((0..64).all(|sig| table.lookup(sig, 0).is_none()));
        assert_eq!(table.stats().stores, 0);
    }

    #[test]
    fn sized_from_config() {
        let config = EngineConfig {
            tt_bits: 6,
            ..EngineConfig::default()
        };
        assert_eq!(TranspositionTable::from_config(&config).capacity(), 64);
    }

    #[test]
    #[should_panic]
    fn zero_bits_panics() {
        TranspositionTable::with_bits(0);
    }
}
