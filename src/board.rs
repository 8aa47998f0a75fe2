//! The mutable chess position and its state machine.
//!
//! `Board` stores piece placement as 12 bitboards (2 colours × 6 piece
//! types) plus redundant occupancy boards, the side to move, castling
//! rights, the en-passant square pair, the move clocks, an incrementally
//! maintained Zobrist key, and a history stack of move backups. Every
//! mutation goes through `do_move` / `do_null_move` / `undo_move`, and every
//! mutation is exactly invertible through the backup on top of the stack.

use crate::attacks;
use crate::backup::MoveBackup;
use crate::castle;
use crate::movegen::{self, MoveGeneratorError};
use crate::types::{
    Bitboard, CastleRight, CastlingRights, ChessError, Color, Move, Piece, PieceType, Square,
};
use crate::zobrist;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A complete chess position with reversible mutation.
///
/// Board layout follows LERF (Little-Endian Rank-File) mapping:
/// a1 = 0, b1 = 1, … h1 = 7, a2 = 8, … h8 = 63.
///
/// A board is not safe for concurrent mutation; clone it to explore
/// variations in parallel. A clone is fully independent, history included.
#[derive(Clone, Debug)]
pub struct Board {
    /// Piece bitboards: `pieces[color][piece_type]`.
    pub(crate) pieces: [[Bitboard; PieceType::COUNT]; 2],
    /// Per-colour occupancy (union of that colour's piece boards).
    pub(crate) occupied: [Bitboard; 2],
    /// Total occupancy.
    pub(crate) all_occupied: Bitboard,
    pub(crate) side_to_move: Color,
    pub(crate) castling_rights: CastlingRights,
    /// Square skipped by the most recent double pawn push (the landing
    /// square of an en-passant capture).
    pub(crate) en_passant: Option<Square>,
    /// Square of the pawn that can actually be captured en passant. Only
    /// set when at least one enemy pawn could play the capture without
    /// exposing its own king; this is the value the hash folds in.
    pub(crate) en_passant_target: Option<Square>,
    /// Half-move clock for the fifty-move rule (reset on pawn move or
    /// capture).
    pub(crate) halfmove_clock: u16,
    /// Full-move number (starts at 1, incremented after Black's move).
    pub(crate) fullmove_number: u16,
    /// Incrementally maintained Zobrist key. Excludes the move clocks.
    pub(crate) key: u64,
    /// Applied moves, most recent last. Strictly LIFO.
    pub(crate) history: Vec<MoveBackup>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Board {
    /// Board at the standard starting position.
    pub fn new() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting FEN is always valid")
    }

    fn empty() -> Self {
        Board {
            pieces: [[Bitboard::EMPTY; PieceType::COUNT]; 2],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            key: 0,
            history: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    /// Castling availability of one side as a `CastleRight`.
    #[inline]
    pub fn castle_right(&self, color: Color) -> CastleRight {
        self.castling_rights.right(color)
    }

    /// Square skipped by the last double pawn push, if any.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Square of the pawn capturable en passant, if the capture is actually
    /// playable.
    #[inline]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// The incremental Zobrist key. This is the chess-semantic position
    /// hash: it covers placement, side to move, castling rights and
    /// playable en passant, and deliberately excludes the move clocks
    /// (unlike the `std::hash::Hash` implementation).
    #[inline]
    pub fn zobrist_key(&self) -> u64 {
        self.key
    }

    /// The applied-move history, oldest first.
    pub fn history(&self) -> &[MoveBackup] {
        &self.history
    }

    /// Bitboard of one concrete piece.
    #[inline]
    pub fn piece_bitboard(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.color.index()][piece.kind.index()]
    }

    /// Bitboard of all pieces of one colour.
    #[inline]
    pub fn side_bitboard(&self, color: Color) -> Bitboard {
        self.occupied[color.index()]
    }

    /// Bitboard of all pieces of both colours.
    #[inline]
    pub fn occupancy(&self) -> Bitboard {
        self.all_occupied
    }

    #[inline]
    pub(crate) fn bb(&self, color: Color, kind: PieceType) -> Bitboard {
        self.pieces[color.index()][kind.index()]
    }

    /// What piece (if any) stands on a square?
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        let bb = Bitboard::from_square(sq);
        if (self.all_occupied & bb).is_empty() {
            return None;
        }
        let color = if (self.occupied[Color::White.index()] & bb).is_not_empty() {
            Color::White
        } else {
            Color::Black
        };
        for &kind in &PieceType::ALL {
            if (self.pieces[color.index()][kind.index()] & bb).is_not_empty() {
                return Some(Piece::new(color, kind));
            }
        }
        None
    }

    /// The king square for a colour.
    #[inline]
    pub fn king_sq(&self, color: Color) -> Square {
        self.pieces[color.index()][PieceType::King.index()]
            .lsb()
            .expect("each side keeps exactly one king")
    }

    // -----------------------------------------------------------------------
    // Low-level piece placement
    // -----------------------------------------------------------------------

    /// Place a piece. Does not touch the Zobrist key.
    #[inline]
    pub(crate) fn put_piece(&mut self, sq: Square, color: Color, kind: PieceType) {
        let bb = Bitboard::from_square(sq);
        self.pieces[color.index()][kind.index()] |= bb;
        self.occupied[color.index()] |= bb;
        self.all_occupied |= bb;
    }

    /// Remove a piece. Does not touch the Zobrist key.
    #[inline]
    pub(crate) fn remove_piece(&mut self, sq: Square, color: Color, kind: PieceType) {
        let bb = Bitboard::from_square(sq);
        self.pieces[color.index()][kind.index()] &= !bb;
        self.occupied[color.index()] &= !bb;
        self.all_occupied &= !bb;
    }

    #[inline]
    fn put_piece_hash(&mut self, sq: Square, color: Color, kind: PieceType) {
        self.put_piece(sq, color, kind);
        self.key ^= zobrist::keys().piece_key(color, kind, sq);
    }

    #[inline]
    fn remove_piece_hash(&mut self, sq: Square, color: Color, kind: PieceType) {
        self.remove_piece(sq, color, kind);
        self.key ^= zobrist::keys().piece_key(color, kind, sq);
    }

    /// Verify the redundant occupancy boards against the piece boards, and
    /// that no square is claimed by two piece boards at once.
    pub(crate) fn is_consistent(&self) -> bool {
        let mut union = Bitboard::EMPTY;
        let mut total = 0u32;
        for color in [Color::White, Color::Black] {
            let mut side = Bitboard::EMPTY;
            for &kind in &PieceType::ALL {
                let bb = self.pieces[color.index()][kind.index()];
                total += bb.pop_count();
                side |= bb;
            }
            if side != self.occupied[color.index()] {
                return false;
            }
            union |= side;
        }
        union == self.all_occupied && union.pop_count() == total
    }

    // -----------------------------------------------------------------------
    // Attack queries
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of colour `by`?
    ///
    /// Reverse-direction reuse of the attack generators: an enemy piece
    /// attacks `sq` exactly when `sq`'s own attack pattern of that piece
    /// type covers the enemy piece.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        let t = attacks::tables();
        let occ = self.all_occupied;

        if (t.pawn_attacks(!by, sq) & self.bb(by, PieceType::Pawn)).is_not_empty() {
            return true;
        }
        if (t.knight_attacks(sq, Bitboard::ALL) & self.bb(by, PieceType::Knight)).is_not_empty() {
            return true;
        }
        if (t.king_attacks(sq, Bitboard::ALL) & self.bb(by, PieceType::King)).is_not_empty() {
            return true;
        }
        let rook_queen = self.bb(by, PieceType::Rook) | self.bb(by, PieceType::Queen);
        if (t.rook_attacks(sq, occ) & rook_queen).is_not_empty() {
            return true;
        }
        let bishop_queen = self.bb(by, PieceType::Bishop) | self.bb(by, PieceType::Queen);
        (t.bishop_attacks(sq, occ) & bishop_queen).is_not_empty()
    }

    /// Is the side-to-move's king currently attacked?
    #[inline]
    pub fn is_king_attacked(&self) -> bool {
        self.is_square_attacked(self.king_sq(self.side_to_move), !self.side_to_move)
    }

    /// Can `color` castle on `wing` right now, rights aside: king and rook
    /// on their home squares, the path between them empty, the king neither
    /// in check nor crossing or landing on an attacked square.
    pub fn castle_playable(&self, color: Color, wing: CastleRight) -> bool {
        let ctx = castle::context();
        let king_move = ctx.king_castle_move(color, wing);
        if self.king_sq(color) != king_move.from {
            return false;
        }
        let rook_move = ctx.rook_castle_move(color, wing);
        if !self.bb(color, PieceType::Rook).is_set(rook_move.from) {
            return false;
        }
        if (self.all_occupied & ctx.path_squares(color, wing)).is_not_empty() {
            return false;
        }
        let them = !color;
        if self.is_square_attacked(king_move.from, them) {
            return false;
        }
        let mut transit = ctx.transit_squares(color, wing);
        while let Some(sq) = transit.pop_lsb() {
            if self.is_square_attacked(sq, them) {
                return false;
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Move application
    // -----------------------------------------------------------------------

    /// Apply a move. Returns whether the move was accepted.
    ///
    /// With `validate` set, the call is all-or-nothing: a move whose origin
    /// does not hold a mover-side piece, whose destination holds a friendly
    /// piece, or whose castle shape is not backed by the matching right is
    /// rejected before any mutation, and a move that leaves the mover's own
    /// king attacked is rolled back through its backup. Trusted callers
    /// (the generator's legality probe, perft loops) pass `validate =
    /// false` and only ever feed pseudo-legal moves.
    pub fn do_move(&mut self, mv: Move, validate: bool) -> bool {
        let ctx = castle::context();
        let us = self.side_to_move;
        let them = !us;

        let backup = MoveBackup::record(self, Some(mv), ctx);
        let moving = match backup.moving_piece {
            Some(piece) => piece,
            None => {
                if validate {
                    tracing::trace!(%mv, "rejected move: empty origin square");
                    return false;
                }
                panic!("do_move: no piece on {} (board:\n{self})", mv.from);
            }
        };

        if validate {
            if moving.color != us {
                tracing::trace!(%mv, "rejected move: piece belongs to the opponent");
                return false;
            }
            if let Some(target) = self.piece_at(mv.to) {
                if target.color == us {
                    tracing::trace!(%mv, "rejected move: destination holds a friendly piece");
                    return false;
                }
            }
            if moving.kind == PieceType::King {
                if let Some(wing) = ctx.castle_wing(us, mv) {
                    if !self.castling_rights.allows(us, wing) {
                        tracing::trace!(%mv, "rejected move: castle right not held");
                        return false;
                    }
                    if backup.rook_castle_move.is_some() && !self.castle_playable(us, wing) {
                        tracing::trace!(%mv, "rejected move: castle path blocked or attacked");
                        return false;
                    }
                }
            }
        }

        let zk = zobrist::keys();

        // En passant never survives a move.
        if self.en_passant_target.is_some() {
            let ep = self.en_passant.expect("capturable target implies a skipped square");
            self.key ^= zk.ep_key(ep.file());
        }
        self.en_passant = None;
        self.en_passant_target = None;

        // Rights narrow when a move touches a king or rook home square
        // (covers king moves, rook moves and captures of unmoved rooks).
        let new_rights = CastlingRights(
            self.castling_rights.bits() & ctx.rights_mask(mv.from) & ctx.rights_mask(mv.to),
        );
        if new_rights != self.castling_rights {
            self.key ^= zk.castling_key(self.castling_rights.bits());
            self.key ^= zk.castling_key(new_rights.bits());
            self.castling_rights = new_rights;
        }

        // Remove the captured piece; for en passant its square is not mv.to.
        if let Some((captured, cap_sq)) = backup.captured {
            self.remove_piece_hash(cap_sq, captured.color, captured.kind);
        }

        // Move the piece, substituting on promotion.
        self.remove_piece_hash(mv.from, us, moving.kind);
        let landing = mv.promotion.unwrap_or(moving.kind);
        self.put_piece_hash(mv.to, us, landing);

        // Companion rook shift when the move is a castle.
        if let Some(rook_move) = backup.rook_castle_move {
            self.remove_piece_hash(rook_move.from, us, PieceType::Rook);
            self.put_piece_hash(rook_move.to, us, PieceType::Rook);
        }

        // Clocks.
        if moving.kind == PieceType::Pawn || backup.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        // A double pawn push opens en passant; the hash only sees it when
        // the capture is actually playable.
        if moving.kind == PieceType::Pawn && mv.from.0.abs_diff(mv.to.0) == 16 {
            let skipped = Square((mv.from.0 + mv.to.0) / 2);
            self.en_passant = Some(skipped);
            if self.ep_capture_exists(us, mv.to, skipped) {
                self.en_passant_target = Some(mv.to);
                self.key ^= zk.ep_key(skipped.file());
            }
        }

        self.side_to_move = them;
        self.key ^= zk.side_key();

        self.history.push(backup);

        if validate && self.is_square_attacked(self.king_sq(us), them) {
            let backup = self.history.pop().expect("entry was just pushed");
            backup.restore(self);
            tracing::trace!(%mv, "rejected move: own king left attacked");
            return false;
        }

        true
    }

    /// Undo the most recent move (or null move), restoring the exact prior
    /// state. Returns the move that was undone (`None` for a null move).
    ///
    /// # Panics
    ///
    /// Panics when the history is empty — undoing a move that was never
    /// made is a programming error, not an input error.
    pub fn undo_move(&mut self) -> Option<Move> {
        let backup = self
            .history
            .pop()
            .expect("undo_move called with an empty history");
        let mv = backup.mv;
        backup.restore(self);
        mv
    }

    /// Flip the side to move without moving a piece, for search-style
    /// probing. Undone through `undo_move` like any real move.
    pub fn do_null_move(&mut self) {
        let backup = MoveBackup::record(self, None, castle::context());
        let zk = zobrist::keys();

        if self.en_passant_target.is_some() {
            let ep = self.en_passant.expect("capturable target implies a skipped square");
            self.key ^= zk.ep_key(ep.file());
        }
        self.en_passant = None;
        self.en_passant_target = None;

        self.side_to_move = !self.side_to_move;
        self.key ^= zk.side_key();

        self.history.push(backup);
    }

    /// Would this move be legal to play right now?
    ///
    /// The move is applied speculatively through the same rollback path
    /// `do_move` uses, and undone before returning. `full_validation`
    /// re-checks the pseudo-legality invariants for moves that did not come
    /// from the generator.
    pub fn is_move_legal(&mut self, mv: Move, full_validation: bool) -> bool {
        if full_validation {
            match self.piece_at(mv.from) {
                Some(piece) if piece.color == self.side_to_move => {}
                _ => return false,
            }
            if let Some(target) = self.piece_at(mv.to) {
                if target.color == self.side_to_move {
                    return false;
                }
            }
        }
        if !self.do_move(mv, true) {
            return false;
        }
        self.undo_move();
        true
    }

    /// All legal moves in the current position. An empty list is a valid
    /// (terminal) result.
    pub fn legal_moves(&self) -> Result<Vec<Move>, MoveGeneratorError> {
        movegen::generate_legal_moves(self)
    }

    // -----------------------------------------------------------------------
    // En passant playability
    // -----------------------------------------------------------------------

    /// After a double push by `us` landing on `pawn_sq` over `skipped`: can
    /// any enemy pawn actually play the en-passant capture?
    fn ep_capture_exists(&self, us: Color, pawn_sq: Square, skipped: Square) -> bool {
        let t = attacks::tables();
        let them = !us;
        // Enemy pawns on the squares from which `skipped` is a pawn attack.
        let mut capturers = t.pawn_attacks(us, skipped) & self.bb(them, PieceType::Pawn);
        while let Some(from) = capturers.pop_lsb() {
            if !self.ep_capture_exposes_king(them, from, pawn_sq, skipped) {
                return true;
            }
        }
        false
    }

    /// Does capturing en passant (capturer moves `from` → `landing`,
    /// removing the pawn on `captured_sq`) leave the capturer's king open
    /// to a slider? Both pawns leave their rank at once, so this is the one
    /// discovered-check shape a plain pin test misses.
    fn ep_capture_exposes_king(
        &self,
        capturer: Color,
        from: Square,
        captured_sq: Square,
        landing: Square,
    ) -> bool {
        let t = attacks::tables();
        let attacker = !capturer;
        let king = self.king_sq(capturer);
        let occ = (self.all_occupied
            ^ Bitboard::from_square(from)
            ^ Bitboard::from_square(captured_sq))
            | Bitboard::from_square(landing);

        let rook_queen = self.bb(attacker, PieceType::Rook) | self.bb(attacker, PieceType::Queen);
        if (t.rook_attacks(king, occ) & rook_queen).is_not_empty() {
            return true;
        }
        let bishop_queen =
            self.bb(attacker, PieceType::Bishop) | self.bb(attacker, PieceType::Queen);
        (t.bishop_attacks(king, occ) & bishop_queen).is_not_empty()
    }

    // -----------------------------------------------------------------------
    // Zobrist recomputation
    // -----------------------------------------------------------------------

    /// Recompute the Zobrist key from scratch. The incremental key must
    /// always equal this.
    pub fn compute_zobrist(&self) -> u64 {
        let zk = zobrist::keys();
        let mut key = 0u64;
        for color in [Color::White, Color::Black] {
            for &kind in &PieceType::ALL {
                for sq in self.bb(color, kind).iter() {
                    key ^= zk.piece_key(color, kind, sq);
                }
            }
        }
        if self.side_to_move == Color::Black {
            key ^= zk.side_key();
        }
        key ^= zk.castling_key(self.castling_rights.bits());
        if self.en_passant_target.is_some() {
            let ep = self.en_passant.expect("capturable target implies a skipped square");
            key ^= zk.ep_key(ep.file());
        }
        key
    }

    // -----------------------------------------------------------------------
    // Draw classification
    // -----------------------------------------------------------------------

    /// Threefold repetition: the current position (by Zobrist key, which
    /// ignores the move clocks) occurred at least twice before.
    ///
    /// Only positions since the last irreversible move can match, and only
    /// at two-ply strides (same side to move).
    pub fn is_repetition(&self) -> bool {
        let moves_played = self.history.len();
        let window = moves_played.min(self.halfmove_clock as usize);
        let current = self.key;
        let mut seen = 1;
        let mut back = 2;
        while back <= window {
            if self.history[moves_played - back].hash_key == current {
                seen += 1;
                if seen >= 3 {
                    return true;
                }
            }
            back += 2;
        }
        false
    }

    /// Neither side retains enough material to ever deliver mate.
    ///
    /// Covers bare kings, a lone minor piece, and bishop-only positions
    /// where every bishop lives on one square colour (opposite-coloured
    /// bishops can still support mating play and are not classified as
    /// insufficient).
    pub fn is_insufficient_material(&self) -> bool {
        for color in [Color::White, Color::Black] {
            if self.bb(color, PieceType::Pawn).is_not_empty()
                || self.bb(color, PieceType::Rook).is_not_empty()
                || self.bb(color, PieceType::Queen).is_not_empty()
            {
                return false;
            }
        }

        let knights = self.bb(Color::White, PieceType::Knight)
            | self.bb(Color::Black, PieceType::Knight);
        let bishops = self.bb(Color::White, PieceType::Bishop)
            | self.bb(Color::Black, PieceType::Bishop);
        let minors = knights.pop_count() + bishops.pop_count();

        if minors <= 1 {
            return true;
        }
        if knights.is_not_empty() {
            return false;
        }
        // Bishops only: insufficient when they all share one square colour.
        (bishops & Bitboard::LIGHT_SQUARES) == bishops
            || (bishops & Bitboard::LIGHT_SQUARES).is_empty()
    }

    /// Checkmate: the side to move has no legal move and its king is
    /// attacked.
    pub fn is_mated(&self) -> bool {
        self.is_king_attacked() && self.has_no_legal_moves()
    }

    /// Stalemate: the side to move has no legal move but is not in check.
    pub fn is_stalemate(&self) -> bool {
        !self.is_king_attacked() && self.has_no_legal_moves()
    }

    /// Any draw condition: stalemate, repetition, fifty-move rule or
    /// insufficient material.
    pub fn is_draw(&self) -> bool {
        self.is_repetition()
            || self.halfmove_clock >= 100
            || self.is_insufficient_material()
            || self.is_stalemate()
    }

    fn has_no_legal_moves(&self) -> bool {
        movegen::generate_legal_moves(self)
            .map(|moves| moves.is_empty())
            .unwrap_or(false)
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    /// Structural equality extended to the move sequence that produced the
    /// position.
    pub fn strict_equals(&self, other: &Board) -> bool {
        self == other
            && self.history.len() == other.history.len()
            && self
                .history
                .iter()
                .zip(&other.history)
                .all(|(a, b)| a.mv == b.mv)
    }

    /// A repetition-grade identity string: the piece placement, side to
    /// move, castling rights and (only when actually capturable) the
    /// en-passant square. Stable across boards; independent of the 64-bit
    /// key representation.
    pub fn position_id(&self) -> String {
        let fen = self.to_fen_compact();
        fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Value equality over the chess-relevant state: placement, side to move,
/// castling rights and the *effective* en-passant state (the capturable
/// target; a skipped square nobody can capture onto does not distinguish
/// positions). Counters and history are excluded; see
/// [`Board::strict_equals`] for history-sensitive equality. Equal boards
/// always share a Zobrist key.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.pieces == other.pieces
            && self.side_to_move == other.side_to_move
            && self.castling_rights == other.castling_rights
            && self.en_passant_target == other.en_passant_target
    }
}

impl Eq for Board {}

/// Collection hashing over exactly the fields `PartialEq` compares, as the
/// `Hash`/`Eq` contract requires. For a counter-sensitive fingerprint use
/// [`Board::structural_hash`].
impl std::hash::Hash for Board {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.pieces.hash(state);
        self.side_to_move.hash(state);
        self.castling_rights.hash(state);
        self.en_passant_target.hash(state);
    }
}

impl Board {
    /// Full structural fingerprint including the move clocks — two boards
    /// that are value-equal but differ in clock state hash differently
    /// here. Distinct from [`Board::zobrist_key`], which deliberately
    /// excludes the clocks for chess-semantic position comparison.
    pub fn structural_hash(&self) -> u64 {
        // Fold the clocks into the position key with the same mixer the
        // Zobrist tables are seeded with.
        let mut h = self.key;
        h ^= (self.halfmove_clock as u64) | ((self.fullmove_number as u64) << 16);
        h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        h ^ (h >> 31)
    }
}

// ---------------------------------------------------------------------------
// FEN
// ---------------------------------------------------------------------------

impl Board {
    /// Parse a FEN string.
    ///
    /// Validates all six fields and requires exactly one king per side.
    /// The board starts with an empty history.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut board = Board::empty();

        // ----- Field 1: piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8;
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(ChessError::InvalidFen(format!(
                        "too many squares in rank {}",
                        rank + 1
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid empty-square count '{ch}'"
                        )));
                    }
                    file += digit as u8;
                } else if let Some(piece) = Piece::from_char(ch) {
                    board.put_piece(Square::from_file_rank(file, rank), piece.color, piece.kind);
                    file += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board.bb(color, PieceType::King).pop_count();
            if kings != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "{color} has {kings} kings (expected 1)"
                )));
            }
        }

        // ----- Field 2: side to move -----
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )))
            }
        };

        // ----- Field 3: castling availability -----
        board.castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::InvalidFen(format!("invalid castling string: '{}'", fields[2]))
        })?;

        // ----- Field 4: en passant -----
        if fields[3] != "-" {
            let ep = Square::from_algebraic(fields[3]).ok_or_else(|| {
                ChessError::InvalidFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            if ep.rank() != 2 && ep.rank() != 5 {
                return Err(ChessError::InvalidFen(format!(
                    "en passant square {} is not on rank 3 or 6",
                    fields[3]
                )));
            }
            board.en_passant = Some(ep);
            // Rank 3 means a white pawn just double-pushed, rank 6 a black
            // one. The target only counts when the capture is playable.
            let (pusher, pawn_sq) = if ep.rank() == 2 {
                (Color::White, Square(ep.0 + 8))
            } else {
                (Color::Black, Square(ep.0 - 8))
            };
            if board.bb(pusher, PieceType::Pawn).is_set(pawn_sq)
                && board.ep_capture_exists(pusher, pawn_sq, ep)
            {
                board.en_passant_target = Some(pawn_sq);
            }
        }

        // ----- Field 5: half-move clock -----
        board.halfmove_clock = fields[4]
            .parse::<u16>()
            .map_err(|_| ChessError::InvalidFen(format!("invalid halfmove clock: '{}'", fields[4])))?;

        // ----- Field 6: full-move number -----
        board.fullmove_number = fields[5]
            .parse::<u16>()
            .map_err(|_| ChessError::InvalidFen(format!("invalid fullmove number: '{}'", fields[5])))?;
        if board.fullmove_number == 0 {
            return Err(ChessError::InvalidFen(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        board.key = board.compute_zobrist();
        Ok(board)
    }

    /// Replace the whole position from a FEN string, resetting the history.
    /// Leaves the board untouched on a parse failure.
    pub fn load_from_fen(&mut self, fen: &str) -> Result<(), ChessError> {
        let board = Self::from_fen(fen)?;
        *self = board;
        tracing::debug!(fen, "loaded position from FEN");
        Ok(())
    }

    /// Export the position as FEN. The en-passant field prints the skipped
    /// square whenever one exists.
    pub fn to_fen(&self) -> String {
        self.fen_with_ep(self.en_passant)
    }

    /// Export the position as FEN, omitting the en-passant field unless a
    /// legal en-passant capture actually exists.
    pub fn to_fen_compact(&self) -> String {
        let ep = if self.en_passant_target.is_some() {
            self.en_passant
        } else {
            None
        };
        self.fen_with_ep(ep)
    }

    fn fen_with_ep(&self, ep: Option<Square>) -> String {
        let mut fen = String::with_capacity(80);

        for rank in (0..8).rev() {
            let mut empty_run = 0u8;
            for file in 0..8 {
                match self.piece_at(Square::from_file_rank(file, rank)) {
                    Some(piece) => {
                        if empty_run > 0 {
                            fen.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                fen.push((b'0' + empty_run) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());

        fen.push(' ');
        match ep {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());
        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for Board {
    /// Plain 8×8 text grid, rank 8 on top. Debugging aid.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let ch = match self.piece_at(Square::from_file_rank(file, rank)) {
                    Some(piece) => piece.to_char(),
                    None => '.',
                };
                write!(f, "{ch}")?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
