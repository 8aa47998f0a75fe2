//! Move backups: the inverse-operation payload of the position state
//! machine.
//!
//! A backup is taken immediately before a move mutates the board and holds
//! everything needed to invert the mutation exactly: the scalar state that
//! the move overwrites, the captured piece and the square it stood on (for
//! en passant that square differs from the move's destination), the moving
//! piece identity (so a promotion is undone back to a pawn), and the rook's
//! companion move when the move is a castle.
//!
//! Backups live on the board's history stack, strictly LIFO. Each backup
//! restores exactly one move; branching exploration clones the board
//! instead of branching the history.

use crate::board::Board;
use crate::castle::CastlingContext;
use crate::types::{CastlingRights, Color, Move, Piece, PieceType, Square};

/// Snapshot of everything a single move destroys.
#[derive(Clone, Debug)]
pub struct MoveBackup {
    /// The move this backup can revert. `None` marks a null move: side and
    /// bookkeeping flip, but no piece moves.
    pub mv: Option<Move>,
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub en_passant_target: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
    /// Incremental hash before the move.
    pub hash_key: u64,
    /// The piece standing on the origin square (pre-promotion identity).
    pub moving_piece: Option<Piece>,
    /// Captured piece and the square it actually stood on.
    pub captured: Option<(Piece, Square)>,
    /// The rook's shift when the move is a castle.
    pub rook_castle_move: Option<Move>,
    /// Whether the move is an en-passant capture.
    pub is_en_passant: bool,
}

impl MoveBackup {
    /// Snapshot the board before `mv` is applied, classifying the move's
    /// special nature (capture square, en passant, castle) from the current
    /// position and the given castling context.
    pub fn record(board: &Board, mv: Option<Move>, ctx: &CastlingContext) -> MoveBackup {
        let mut backup = MoveBackup {
            mv,
            side_to_move: board.side_to_move(),
            castling_rights: board.castling_rights(),
            en_passant: board.en_passant(),
            en_passant_target: board.en_passant_target(),
            halfmove_clock: board.halfmove_clock(),
            fullmove_number: board.fullmove_number(),
            hash_key: board.zobrist_key(),
            moving_piece: None,
            captured: None,
            rook_castle_move: None,
            is_en_passant: false,
        };

        let mv = match mv {
            Some(mv) => mv,
            None => return backup,
        };

        let moving = board.piece_at(mv.from);
        backup.moving_piece = moving;
        let moving = match moving {
            Some(p) => p,
            None => return backup,
        };

        if let Some(captured) = board.piece_at(mv.to) {
            backup.captured = Some((captured, mv.to));
        } else if moving.kind == PieceType::Pawn
            && mv.from.file() != mv.to.file()
            && board.en_passant() == Some(mv.to)
        {
            // The captured pawn sits behind the landing square.
            let cap_sq = match moving.color {
                Color::White => Square(mv.to.0 - 8),
                Color::Black => Square(mv.to.0 + 8),
            };
            if let Some(pawn) = board.piece_at(cap_sq) {
                backup.captured = Some((pawn, cap_sq));
                backup.is_en_passant = true;
            }
        }

        if moving.kind == PieceType::King {
            if let Some(wing) = ctx.castle_wing(moving.color, mv) {
                let rook_move = ctx.rook_castle_move(moving.color, wing);
                // No rook on its home square means this is a bare king move
                // that merely looks like a castle; undo must not conjure a
                // rook shift.
                if board.piece_bitboard(Piece::new(moving.color, PieceType::Rook))
                    .is_set(rook_move.from)
                {
                    backup.rook_castle_move = Some(rook_move);
                }
            }
        }

        backup
    }

    /// Whether the backed-up move is a castle.
    #[inline]
    pub fn is_castle_move(&self) -> bool {
        self.rook_castle_move.is_some()
    }

    /// Put the board back exactly as it was when this backup was recorded.
    ///
    /// The caller must pass the same board the backup was taken from; the
    /// history stack guarantees that for normal use.
    pub fn restore(&self, board: &mut Board) {
        board.side_to_move = self.side_to_move;
        board.castling_rights = self.castling_rights;
        board.en_passant = self.en_passant;
        board.en_passant_target = self.en_passant_target;
        board.halfmove_clock = self.halfmove_clock;
        board.fullmove_number = self.fullmove_number;

        if let Some(mv) = self.mv {
            let moving = self
                .moving_piece
                .expect("backup of a real move records its moving piece");

            if let Some(rook_move) = self.rook_castle_move {
                board.remove_piece(rook_move.to, moving.color, PieceType::Rook);
                board.put_piece(rook_move.from, moving.color, PieceType::Rook);
            }

            // Remove whatever landed (the promotion piece if any), put the
            // original piece back on the origin.
            let landed = mv.promotion.unwrap_or(moving.kind);
            board.remove_piece(mv.to, moving.color, landed);
            board.put_piece(mv.from, moving.color, moving.kind);

            if let Some((captured, sq)) = self.captured {
                board.put_piece(sq, captured.color, captured.kind);
            }
        }

        board.key = self.hash_key;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::castle;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn record_plain_move() {
        let board = Board::new();
        let mv = Move::new(sq("g1"), sq("f3"));
        let backup = MoveBackup::record(&board, Some(mv), castle::context());
        assert_eq!(backup.mv, Some(mv));
        assert_eq!(
            backup.moving_piece,
            Some(Piece::new(Color::White, PieceType::Knight))
        );
        assert_eq!(backup.captured, None);
        assert!(!backup.is_castle_move());
        assert!(!backup.is_en_passant);
        assert_eq!(backup.hash_key, board.zobrist_key());
    }

    #[test]
    fn record_capture_square() {
        let board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
                .unwrap();
        let backup = MoveBackup::record(&board, Some(Move::new(sq("e4"), sq("d5"))), castle::context());
        assert_eq!(
            backup.captured,
            Some((Piece::new(Color::Black, PieceType::Pawn), sq("d5")))
        );
        assert!(!backup.is_en_passant);
    }

    #[test]
    fn record_en_passant_capture_square_differs_from_destination() {
        let board =
            Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let backup = MoveBackup::record(&board, Some(Move::new(sq("e5"), sq("f6"))), castle::context());
        assert!(backup.is_en_passant);
        assert_eq!(
            backup.captured,
            Some((Piece::new(Color::Black, PieceType::Pawn), sq("f5")))
        );
    }

    #[test]
    fn record_castle_includes_rook_move() {
        let board = Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let backup = MoveBackup::record(&board, Some(Move::new(sq("e1"), sq("g1"))), castle::context());
        assert!(backup.is_castle_move());
        assert_eq!(backup.rook_castle_move, Some(Move::new(sq("h1"), sq("f1"))));
    }

    #[test]
    fn record_castle_shape_without_rook_is_plain_king_move() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w K - 0 1").unwrap();
        let backup = MoveBackup::record(&board, Some(Move::new(sq("e1"), sq("g1"))), castle::context());
        assert!(!backup.is_castle_move());
        assert_eq!(backup.rook_castle_move, None);
    }

    #[test]
    fn null_backup_restores_scalars_only() {
        let mut board =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        let reference = board.clone();
        let backup = MoveBackup::record(&board, None, castle::context());

        board.do_null_move();
        assert_ne!(board.side_to_move(), reference.side_to_move());

        backup.restore(&mut board);
        assert_eq!(board, reference);
        assert_eq!(board.zobrist_key(), reference.zobrist_key());
    }
}
