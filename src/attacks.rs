//! Attack and move-target generation for every piece type.
//!
//! Leaper targets (knight, king, pawn attacks) come from fixed per-square
//! tables. Sliding-piece targets are the ray scans demanded by the rules —
//! stop at and include the first blocker in each direction — served through
//! plain magic bitboards so the scan collapses to one multiply and a table
//! lookup. Everything is built once per process behind a `OnceLock` and
//! never mutated afterwards, so boards on any thread can share it freely.

use crate::types::{Bitboard, Color, Square};
use std::sync::OnceLock;

// =========================================================================
// Public access
// =========================================================================

/// The process-wide attack tables, built on first use.
pub fn tables() -> &'static AttackTables {
    static TABLES: OnceLock<AttackTables> = OnceLock::new();
    TABLES.get_or_init(AttackTables::init)
}

/// Precomputed attack tables for every piece type.
pub struct AttackTables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    /// `pawn[color][square]` — the two (or one, at board edges) capture
    /// targets of a pawn. File wrap-around is clamped at build time: a pawn
    /// on the a-file never "attacks" the h-file.
    pawn: [[Bitboard; 64]; 2],
    rook_magics: [Magic; 64],
    bishop_magics: [Magic; 64],
    rook_table: Vec<Vec<Bitboard>>,
    bishop_table: Vec<Vec<Bitboard>>,
}

/// Magic multiplier entry for one square.
struct Magic {
    mask: Bitboard,
    factor: u64,
    shift: u8,
}

#[inline]
fn magic_index(m: &Magic, occupied: Bitboard) -> usize {
    (((occupied & m.mask).0.wrapping_mul(m.factor)) >> m.shift) as usize
}

impl AttackTables {
    // -------------------------------------------------------------------
    // Leapers
    // -------------------------------------------------------------------

    /// Knight targets from `sq`, restricted to the allowed-targets mask
    /// (typically "everything not occupied by the mover's own side").
    #[inline]
    pub fn knight_attacks(&self, sq: Square, allowed: Bitboard) -> Bitboard {
        self.knight[sq.0 as usize] & allowed
    }

    /// King targets from `sq`, restricted to the allowed-targets mask.
    #[inline]
    pub fn king_attacks(&self, sq: Square, allowed: Bitboard) -> Bitboard {
        self.king[sq.0 as usize] & allowed
    }

    /// Raw pawn attack pattern (the diagonals only, no occupancy applied).
    #[inline]
    pub fn pawn_attacks(&self, color: Color, sq: Square) -> Bitboard {
        self.pawn[color.index()][sq.0 as usize]
    }

    // -------------------------------------------------------------------
    // Pawn move targets
    // -------------------------------------------------------------------

    /// Capture targets for a pawn of `color` on `sq`.
    ///
    /// A diagonal is a capture target when it holds any piece (the caller
    /// masks away friendly occupancy), or when it is the landing square of
    /// an en-passant capture of `ep_target` (the capturable pawn's own
    /// square, which differs from the landing square).
    #[inline]
    pub fn pawn_captures(
        &self,
        color: Color,
        sq: Square,
        occupied: Bitboard,
        ep_target: Option<Square>,
    ) -> Bitboard {
        let mut targets = occupied;
        if let Some(ep) = ep_target {
            let ep_bb = Bitboard::from_square(ep);
            targets |= match color {
                Color::White => Bitboard(ep_bb.0 << 8),
                Color::Black => Bitboard(ep_bb.0 >> 8),
            };
        }
        self.pawn[color.index()][sq.0 as usize] & targets
    }

    /// Quiet advance targets for a pawn of `color` on `sq`: the single push
    /// when unblocked, plus the double push from the start rank when both
    /// squares are free.
    pub fn pawn_advances(&self, color: Color, sq: Square, occupied: Bitboard) -> Bitboard {
        let step: i16 = match color {
            Color::White => 8,
            Color::Black => -8,
        };
        let one = sq.0 as i16 + step;
        if !(0..64).contains(&one) {
            return Bitboard::EMPTY;
        }
        let one_sq = Square(one as u8);
        let mut targets = Bitboard::EMPTY;
        if !occupied.is_set(one_sq) {
            targets.set(one_sq);
            let start_rank = match color {
                Color::White => 1,
                Color::Black => 6,
            };
            if sq.rank() == start_rank {
                let two_sq = Square((one + step) as u8);
                if !occupied.is_set(two_sq) {
                    targets.set(two_sq);
                }
            }
        }
        targets
    }

    // -------------------------------------------------------------------
    // Sliders
    // -------------------------------------------------------------------

    /// Rook targets from `sq` given the full occupancy.
    #[inline]
    pub fn rook_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let m = &self.rook_magics[sq.0 as usize];
        self.rook_table[sq.0 as usize][magic_index(m, occupied)]
    }

    /// Bishop targets from `sq` given the full occupancy.
    #[inline]
    pub fn bishop_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let m = &self.bishop_magics[sq.0 as usize];
        self.bishop_table[sq.0 as usize][magic_index(m, occupied)]
    }

    /// Queen targets: union of the rook and bishop ray scans.
    #[inline]
    pub fn queen_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.rook_attacks(sq, occupied) | self.bishop_attacks(sq, occupied)
    }
}

// =========================================================================
// Table construction
// =========================================================================

const ROOK_DELTAS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DELTAS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl AttackTables {
    fn init() -> Self {
        let (rook_magics, rook_table) = find_magics(&ROOK_DELTAS, 0xD4F1_9C62_8AE5_3B07);
        let (bishop_magics, bishop_table) = find_magics(&BISHOP_DELTAS, 0x6E21_B0D9_5C84_F713);
        AttackTables {
            knight: leaper_table(&KNIGHT_OFFSETS),
            king: leaper_table(&KING_OFFSETS),
            pawn: pawn_table(),
            rook_magics,
            bishop_magics,
            rook_table,
            bishop_table,
        }
    }
}

/// Per-square target mask for a fixed-offset leaper (knight or king).
fn leaper_table(offsets: &[(i8, i8); 8]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    for sq in 0..64u8 {
        let rank = (sq >> 3) as i8;
        let file = (sq & 7) as i8;
        let mut bb = 0u64;
        for &(dr, df) in offsets {
            let (r, f) = (rank + dr, file + df);
            if (0..8).contains(&r) && (0..8).contains(&f) {
                bb |= 1u64 << (r * 8 + f);
            }
        }
        table[sq as usize] = Bitboard(bb);
    }
    table
}

/// Pawn attack diagonals for both colours, clamped at the a/h files.
fn pawn_table() -> [[Bitboard; 64]; 2] {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for sq in 0..64u8 {
        let rank = (sq >> 3) as i8;
        let file = (sq & 7) as i8;
        for (idx, dr) in [(Color::White.index(), 1i8), (Color::Black.index(), -1i8)] {
            let r = rank + dr;
            if !(0..8).contains(&r) {
                continue;
            }
            let mut bb = 0u64;
            if file > 0 {
                bb |= 1u64 << (r * 8 + file - 1);
            }
            if file < 7 {
                bb |= 1u64 << (r * 8 + file + 1);
            }
            table[idx][sq as usize] = Bitboard(bb);
        }
    }
    table
}

// -------------------------------------------------------------------------
// Ray scanning (used to fill the magic tables, and as the ground truth in
// tests)
// -------------------------------------------------------------------------

/// Scan outwards along each delta, stopping at and including the first
/// blocker.
fn ray_attacks(sq: u8, blockers: u64, deltas: &[(i8, i8)]) -> u64 {
    let rank = (sq >> 3) as i8;
    let file = (sq & 7) as i8;
    let mut attacks = 0u64;
    for &(dr, df) in deltas {
        let (mut r, mut f) = (rank + dr, file + df);
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let bit = 1u64 << (r * 8 + f);
            attacks |= bit;
            if blockers & bit != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

/// Relevant-occupancy mask: every ray square whose successor is still on
/// the board (edge squares never influence the scan result).
fn relevant_mask(sq: u8, deltas: &[(i8, i8)]) -> u64 {
    let rank = (sq >> 3) as i8;
    let file = (sq & 7) as i8;
    let mut mask = 0u64;
    for &(dr, df) in deltas {
        let (mut r, mut f) = (rank + dr, file + df);
        while (0..8).contains(&r)
            && (0..8).contains(&f)
            && (0..8).contains(&(r + dr))
            && (0..8).contains(&(f + df))
        {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }
    mask
}

/// Enumerate every subset of `mask` (Carry-Rippler).
fn subsets(mask: u64) -> Vec<u64> {
    let mut out = Vec::new();
    let mut subset = 0u64;
    loop {
        out.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    out
}

// -------------------------------------------------------------------------
// Magic search
// -------------------------------------------------------------------------

/// xorshift64* step for the magic search.
fn next_random(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    *state = x;
    x.wrapping_mul(0x2545_F491_4F6C_DD1D)
}

/// Sparse candidate: AND of three randoms keeps few bits set, which is far
/// more likely to hash collision-free.
fn sparse_random(state: &mut u64) -> u64 {
    next_random(state) & next_random(state) & next_random(state)
}

/// Find a collision-free magic factor for each square and fill its attack
/// table. Usually well under a hundred candidates per square; whole-process
/// initialisation stays in the tens of milliseconds.
fn find_magics(deltas: &[(i8, i8)], seed: u64) -> ([Magic; 64], Vec<Vec<Bitboard>>) {
    let mut rng = seed;
    let mut magics: [Magic; 64] = std::array::from_fn(|_| Magic {
        mask: Bitboard::EMPTY,
        factor: 0,
        shift: 0,
    });
    let mut tables: Vec<Vec<Bitboard>> = Vec::with_capacity(64);

    for sq in 0..64u8 {
        let mask = relevant_mask(sq, deltas);
        let bits = mask.count_ones() as u8;
        let shift = 64 - bits;
        let size = 1usize << bits;

        let blockers = subsets(mask);
        let attacks: Vec<u64> = blockers
            .iter()
            .map(|&b| ray_attacks(sq, b, deltas))
            .collect();

        let mut table = vec![Bitboard::EMPTY; size];
        let factor = loop {
            let candidate = sparse_random(&mut rng);
            // Cheap filter: sparse high bits of candidate * mask hash badly.
            if (candidate.wrapping_mul(mask) & 0xFF00_0000_0000_0000).count_ones() < 6 {
                continue;
            }

            let mut filled = vec![false; size];
            table.iter_mut().for_each(|t| *t = Bitboard::EMPTY);
            let mut ok = true;
            for (i, &b) in blockers.iter().enumerate() {
                let idx = (b.wrapping_mul(candidate) >> shift) as usize;
                if !filled[idx] {
                    filled[idx] = true;
                    table[idx] = Bitboard(attacks[i]);
                } else if table[idx].0 != attacks[i] {
                    // Mapping two blocker sets to one slot is fine only when
                    // they produce the same attack set.
                    ok = false;
                    break;
                }
            }
            if ok {
                break candidate;
            }
        };

        magics[sq as usize] = Magic {
            mask: Bitboard(mask),
            factor,
            shift,
        };
        tables.push(table);
    }

    (magics, tables)
}

// =========================================================================
// Tests
// =========================================================================
