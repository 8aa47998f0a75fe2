//! Castling context: the static square and move tables that describe how
//! king-side and queen-side castling works for each colour.
//!
//! The tables are plain constants — the standard game has exactly one
//! castling geometry — and are passed explicitly to the code that needs
//! them (move application, backup construction, move generation) instead of
//! being duplicated at every call site.

use crate::types::{Bitboard, CastleRight, CastlingRights, Color, Move, Square};

/// Immutable description of castling geometry for both colours.
///
/// All per-wing arrays are indexed `[color][wing]` with wing 0 = king side,
/// wing 1 = queen side.
pub struct CastlingContext {
    king_moves: [[Move; 2]; 2],
    rook_moves: [[Move; 2]; 2],
    /// Squares the king passes through or lands on (the start square is
    /// covered separately by the not-in-check precondition).
    transit: [[Bitboard; 2]; 2],
    /// Squares between king and rook that must be empty.
    path: [[Bitboard; 2]; 2],
    /// Per-square rights mask: AND the rights bitfield with the masks of a
    /// move's origin and destination to apply the narrowing rules (king
    /// move loses both wings, rook move or rook capture loses one).
    rights_masks: [u8; 64],
}

/// The standard-chess castling context.
pub fn context() -> &'static CastlingContext {
    &STANDARD
}

static STANDARD: CastlingContext = CastlingContext {
    king_moves: [
        [
            // White: e1->g1, e1->c1.
            Move::new(Square(4), Square(6)),
            Move::new(Square(4), Square(2)),
        ],
        [
            // Black: e8->g8, e8->c8.
            Move::new(Square(60), Square(62)),
            Move::new(Square(60), Square(58)),
        ],
    ],
    rook_moves: [
        [
            // White: h1->f1, a1->d1.
            Move::new(Square(7), Square(5)),
            Move::new(Square(0), Square(3)),
        ],
        [
            // Black: h8->f8, a8->d8.
            Move::new(Square(63), Square(61)),
            Move::new(Square(56), Square(59)),
        ],
    ],
    transit: [
        // f1+g1, d1+c1.
        [Bitboard(0x60), Bitboard(0x0C)],
        // f8+g8, d8+c8.
        [Bitboard(0x6000_0000_0000_0000), Bitboard(0x0C00_0000_0000_0000)],
    ],
    path: [
        // f1+g1, d1+c1+b1.
        [Bitboard(0x60), Bitboard(0x0E)],
        // f8+g8, d8+c8+b8.
        [Bitboard(0x6000_0000_0000_0000), Bitboard(0x0E00_0000_0000_0000)],
    ],
    rights_masks: {
        let mut m = [0b1111u8; 64];
        // a1: white queen side; e1: both white wings; h1: white king side.
        m[0] = 0b1111 & !CastlingRights::WHITE_QUEENSIDE;
        m[4] = 0b1111 & !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
        m[7] = 0b1111 & !CastlingRights::WHITE_KINGSIDE;
        // a8 / e8 / h8 for black.
        m[56] = 0b1111 & !CastlingRights::BLACK_QUEENSIDE;
        m[60] = 0b1111 & !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
        m[63] = 0b1111 & !CastlingRights::BLACK_KINGSIDE;
        m
    },
};

/// Wing index for a specific castle right. Only the two single-wing values
/// identify a castle move; anything else is a caller bug.
fn wing(right: CastleRight) -> usize {
    match right {
        CastleRight::KingSide => 0,
        CastleRight::QueenSide => 1,
        CastleRight::None | CastleRight::KingAndQueenSide => {
            panic!("{right:?} does not name a castle wing")
        }
    }
}

impl CastlingContext {
    /// If `mv` is the king shift of a castle for `color`, the wing it
    /// belongs to (`KingSide` or `QueenSide`).
    pub fn castle_wing(&self, color: Color, mv: Move) -> Option<CastleRight> {
        let moves = &self.king_moves[color.index()];
        if mv == moves[0] {
            Some(CastleRight::KingSide)
        } else if mv == moves[1] {
            Some(CastleRight::QueenSide)
        } else {
            None
        }
    }

    /// Is `mv` a castle king shift for `color`?
    #[inline]
    pub fn is_castle_move(&self, color: Color, mv: Move) -> bool {
        self.castle_wing(color, mv).is_some()
    }

    /// The king's move for a castle of the given wing.
    #[inline]
    pub fn king_castle_move(&self, color: Color, right: CastleRight) -> Move {
        self.king_moves[color.index()][wing(right)]
    }

    /// The rook's companion move for a castle of the given wing.
    #[inline]
    pub fn rook_castle_move(&self, color: Color, right: CastleRight) -> Move {
        self.rook_moves[color.index()][wing(right)]
    }

    /// Squares the king crosses or lands on; none may be attacked.
    #[inline]
    pub fn transit_squares(&self, color: Color, right: CastleRight) -> Bitboard {
        self.transit[color.index()][wing(right)]
    }

    /// Squares between king and rook; all must be empty.
    #[inline]
    pub fn path_squares(&self, color: Color, right: CastleRight) -> Bitboard {
        self.path[color.index()][wing(right)]
    }

    /// Rights-narrowing mask for a square touched by a move.
    #[inline]
    pub fn rights_mask(&self, sq: Square) -> u8 {
        self.rights_masks[sq.0 as usize]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
