//! Zobrist hashing: random keys for incremental position identification.
//!
//! Every hashable feature of a position — a piece standing on a square, the
//! side to move, the castling-rights mask, the en-passant file — owns one
//! random 64-bit key. The position key is the XOR of all applicable keys,
//! which makes make/undo updates O(1): XOR the keys of exactly the features
//! that changed.
//!
//! The tables are built once per process from a fixed seed, so keys (and
//! therefore position hashes) are stable across runs and across boards.

use crate::types::{Color, PieceType, Square};
use std::sync::OnceLock;

/// Number of (colour, piece type) combinations.
const PIECE_KINDS: usize = 12;
/// One key per possible castling-rights bitmask (0..16).
const CASTLING_KEYS: usize = 16;
/// One key per en-passant file.
const EP_KEYS: usize = 8;

// ---------------------------------------------------------------------------
// Key tables
// ---------------------------------------------------------------------------

/// Immutable Zobrist key tables, shared by every board in the process.
pub struct Zobrist {
    /// `piece[color * 6 + piece_type][square]`.
    piece: [[u64; Square::NUM]; PIECE_KINDS],
    /// XOR'd into the key whenever it is Black's turn.
    black_to_move: u64,
    castling: [u64; CASTLING_KEYS],
    en_passant: [u64; EP_KEYS],
}

static KEYS: OnceLock<Zobrist> = OnceLock::new();

/// The process-wide Zobrist keys, built on first use.
pub fn keys() -> &'static Zobrist {
    KEYS.get_or_init(Zobrist::init)
}

impl Zobrist {
    fn init() -> Self {
        let mut rng = SplitMix64::new(0x9E37_79B9_7F4A_7C15);

        let mut piece = [[0u64; Square::NUM]; PIECE_KINDS];
        for kind in piece.iter_mut() {
            for key in kind.iter_mut() {
                *key = rng.next_u64();
            }
        }

        let black_to_move = rng.next_u64();

        let mut castling = [0u64; CASTLING_KEYS];
        for key in castling.iter_mut() {
            *key = rng.next_u64();
        }

        let mut en_passant = [0u64; EP_KEYS];
        for key in en_passant.iter_mut() {
            *key = rng.next_u64();
        }

        Zobrist {
            piece,
            black_to_move,
            castling,
            en_passant,
        }
    }

    /// Key for a piece of the given colour and type on a square.
    #[inline]
    pub fn piece_key(&self, color: Color, kind: PieceType, sq: Square) -> u64 {
        self.piece[color.index() * PieceType::COUNT + kind.index()][sq.0 as usize]
    }

    /// Key toggled when the side to move changes.
    #[inline]
    pub fn side_key(&self) -> u64 {
        self.black_to_move
    }

    /// Key for a castling-rights bitmask (0..16).
    #[inline]
    pub fn castling_key(&self, rights_bits: u8) -> u64 {
        self.castling[rights_bits as usize]
    }

    /// Key for an en-passant file (0..8).
    #[inline]
    pub fn ep_key(&self, file: u8) -> u64 {
        self.en_passant[file as usize]
    }
}

// ---------------------------------------------------------------------------
// SplitMix64 — deterministic seeding PRNG
// ---------------------------------------------------------------------------

/// SplitMix64: tiny, fast, and well distributed — the usual choice for
/// seeding fixed key tables.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        SplitMix64 { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
