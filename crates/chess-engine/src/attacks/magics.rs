//! Magic-multiplier lookup for sliding pieces.
//!
//! For a slider on square `s` only the squares in its relevance mask can block
//! it. `(occupancy & mask).wrapping_mul(magic) >> shift` maps every subset of
//! that mask to a slot in a dense per-square block, and every subset landing in
//! the same slot has the same attack set. The multipliers below were found
//! offline; [`SliderTable::build`] checks them while it fills the table.

use crate::Bitboard;
use chess_core::Square;

/// The two sliding movement patterns. Queens combine both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    Bishop,
    Rook,
}

impl Slider {
    /// Ray directions as (file step, rank step).
    const fn directions(self) -> [(i8, i8); 4] {
        match self {
            Slider::Bishop => [(1, 1), (-1, 1), (1, -1), (-1, -1)],
            Slider::Rook => [(0, 1), (0, -1), (1, 0), (-1, 0)],
        }
    }

    const fn magics(self) -> &'static [u64; 64] {
        match self {
            Slider::Bishop => &BISHOP_MAGICS,
            Slider::Rook => &ROOK_MAGICS,
        }
    }
}

/// Per-square hashing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Magic {
    /// Squares that can block the slider, board edges excluded.
    pub mask: Bitboard,
    pub magic: u64,
    /// `64 - mask.count()`.
    pub shift: u8,
    /// Start of this square's block in the flat attack vector.
    pub offset: usize,
}

impl Magic {
    #[inline]
    pub fn index(&self, occupied: Bitboard) -> usize {
        let relevant = (occupied & self.mask).0;
        self.offset + (relevant.wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// All attack sets for one slider kind, one block per square.
pub struct SliderTable {
    magics: [Magic; 64],
    attacks: Vec<Bitboard>,
}

impl SliderTable {
    /// Builds the table by ray tracing every blocker subset of every square.
    ///
    /// # Panics
    ///
    /// Panics if two subsets that trace to different attack sets share a
    /// slot. That means a multiplier constant is wrong.
    pub fn build(slider: Slider) -> Self {
        let mut magics = [Magic {
            mask: Bitboard::EMPTY,
            magic: 0,
            shift: 0,
            offset: 0,
        }; 64];
        let mut attacks = Vec::new();
        let mut filled = Vec::new();

        for sq in Square::all() {
            let mask = relevance_mask(slider, sq);
            let bits = mask.count();
            let magic = Magic {
                mask,
                magic: slider.magics()[sq.index() as usize],
                shift: (64 - bits) as u8,
                offset: attacks.len(),
            };
            attacks.resize(magic.offset + (1usize << bits), Bitboard::EMPTY);
            filled.resize(attacks.len(), false);

            for blockers in mask.subsets() {
                let traced = trace_attacks(slider, sq, blockers);
                let slot = magic.index(blockers);
                assert!(
                    !filled[slot] || attacks[slot] == traced,
                    "{:?} multiplier for {} maps two blocker sets with different attacks to one slot",
                    slider,
                    sq
                );
                attacks[slot] = traced;
                filled[slot] = true;
            }
            magics[sq.index() as usize] = magic;
        }

        SliderTable { magics, attacks }
    }

    #[inline]
    pub fn attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.attacks[self.magics[sq.index() as usize].index(occupied)]
    }

    #[inline]
    pub fn magic(&self, sq: Square) -> &Magic {
        &self.magics[sq.index() as usize]
    }

    /// Number of attack sets stored.
    pub fn len(&self) -> usize {
        self.attacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }
}

/// Squares between `sq` and the board edge along the slider's rays, with the
/// final square of each ray left out: a piece there cannot hide anything.
pub fn relevance_mask(slider: Slider, sq: Square) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for (df, dr) in slider.directions() {
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            if next.offset(df, dr).is_none() {
                break;
            }
            mask.set(next);
            cur = next;
        }
    }
    mask
}

/// Walks each ray from `sq` until it leaves the board or hits a blocker. The
/// blocker square itself is included.
pub fn trace_attacks(slider: Slider, sq: Square, blockers: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for (df, dr) in slider.directions() {
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            attacks.set(next);
            if blockers.contains(next) {
                break;
            }
            cur = next;
        }
    }
    attacks
}

#[rustfmt::skip]
const BISHOP_MAGICS: [u64; 64] = [
    0x89a1_1218_9604_0240, 0x2004_8448_0200_2010, 0x2068_0800_5192_1000, 0x6288_0a02_2020_0808,
    0x0004_0420_0400_0000, 0x0100_8220_2020_0011, 0xc004_4422_2012_000a, 0x0028_8088_0121_6001,
    0x0400_4920_8840_8100, 0x0201_c401_040c_0084, 0x0084_0800_910a_0010, 0x0000_0820_8024_0060,
    0x2000_8405_0400_6000, 0x3001_0c41_0840_5004, 0x1008_0054_1008_0802, 0x8144_0422_0910_0900,
    0x0208_0810_2001_4400, 0x0048_0020_1208_ca00, 0x0f18_1404_0801_2008, 0x1004_0028_0210_2001,
    0x0841_0008_2008_0811, 0x0040_2002_00a4_2008, 0x0000_8000_5404_2000, 0x8801_0400_410c_9000,
    0x0520_0404_7010_4290, 0x1004_0400_5150_0081, 0x2002_0818_3308_0021, 0x0004_00c0_0c01_0142,
    0x9414_0820_0c00_2000, 0x0658_8100_0080_6011, 0x0188_0710_4044_0a00, 0x4800_4040_0201_1c00,
    0x0104_4420_4040_4200, 0x000a_4160_100c_0801, 0x0004_0224_0112_0400, 0x80c0_0404_0008_0120,
    0x8040_0100_4082_0802, 0x0480_8107_0002_0090, 0x0102_008e_0004_0242, 0x0809_0052_0205_0100,
    0x8002_0242_2010_4080, 0x0431_0088_0414_2000, 0x0019_0018_0208_1400, 0x0200_0142_0804_0080,
    0x3308_0820_0820_0100, 0x0410_1050_0040_c020, 0x4012_020c_0421_0308, 0x2082_20a2_0200_4080,
    0x0111_0401_2008_2000, 0x6803_0401_4128_0a00, 0x2101_0042_0241_0000, 0x8200_0000_4110_8022,
    0x0000_0210_8208_8000, 0x0002_4102_0401_0040, 0x0040_1004_0080_9000, 0x0822_0882_2082_0214,
    0x0040_8080_9001_2004, 0x0091_0224_0402_18c9, 0x0402_8144_2201_5008, 0x0090_0140_0484_2410,
    0x0001_0000_4230_4105, 0x0010_0088_3041_2a00, 0x2520_0810_9000_8908, 0x4010_2000_a0a6_0140,
];

#[rustfmt::skip]
const ROOK_MAGICS: [u64; 64] = [
    0x0a80_02c0_0010_8020, 0x06c0_0049_b000_2001, 0x0100_2000_1009_0040, 0x2480_0410_0080_0801,
    0x0280_0280_0400_0800, 0x0900_4100_0804_0022, 0x0280_0200_0100_1080, 0x2880_0020_4100_0080,
    0xa000_8000_8040_0034, 0x0004_8080_2000_4000, 0x2290_8020_0480_1000, 0x0411_000d_0010_0020,
    0x0402_8008_0004_0080, 0x000b_0004_0100_4208, 0x2409_0001_0004_0200, 0x0001_0021_0000_4082,
    0x0022_8780_01e2_4000, 0x1090_8100_2100_4010, 0x0801_0300_4020_0012, 0x0500_8080_0800_1000,
    0x0a08_0180_1400_0880, 0x8000_8080_0400_0200, 0x0201_0080_8001_0200, 0x0801_0200_0044_1091,
    0x0000_8000_8020_4005, 0x1040_2000_4010_0048, 0x0000_1202_0040_2082, 0x0d14_8804_8010_0080,
    0x0012_0402_8008_0080, 0x0100_0400_8002_0080, 0x9020_0100_8080_0200, 0x0813_2412_0014_8449,
    0x0491_6040_0180_0080, 0x0100_4010_0040_2001, 0x4820_0100_2100_1040, 0x0400_4022_0200_0812,
    0x0209_0090_0500_0802, 0x0810_8006_0180_0400, 0x4301_0832_1400_0150, 0x2040_2645_8e00_1401,
    0x0040_2040_0080_8000, 0x8001_0080_4001_0020, 0x8410_8208_2042_0010, 0x1003_0010_0009_0020,
    0x0804_0400_0800_8080, 0x0012_0008_1002_0004, 0x1000_1002_0004_0208, 0x4300_00a0_4402_0001,
    0x0280_0090_2341_0300, 0x00e0_1000_4000_2240, 0x0000_2001_0040_1700, 0x2244_1004_0800_8080,
    0x0008_0004_0080_1980, 0x0002_0008_1004_0200, 0x8010_1002_2881_0400, 0x2000_0090_4421_0200,
    0x4080_0080_4010_2101, 0x0040_0020_8041_1d01, 0x2005_5240_6000_0901, 0x0502_0010_0840_0422,
    0x489a_0008_1020_0402, 0x0001_0044_0008_0a13, 0x4000_0110_0802_0084, 0x0026_0021_1405_8042,
];
