//! Pseudo-legal and legal move generation.
//!
//! The per-piece generators append to a caller-provided list and are purely
//! pseudo-legal: correct by piece-movement rules, blind to king safety.
//! `generate_legal_moves` filters the pseudo-legal list by speculatively
//! applying each move on a probe clone of the board — the same rollback
//! path `Board::do_move` uses for validated play.

use crate::attacks;
use crate::board::Board;
use crate::castle;
use crate::types::{Bitboard, CastleRight, Color, Move, PieceType, Square};

/// Defensive failure while probing move legality. A position with zero
/// legal moves is a normal terminal result, not an error; this fires only
/// when the speculative apply/undo pass is detected to have corrupted the
/// probe board.
#[derive(Debug, thiserror::Error)]
#[error("could not generate legal moves: {reason}")]
pub struct MoveGeneratorError {
    pub reason: String,
}

// =========================================================================
// Aggregate generators
// =========================================================================

/// All pseudo-legal moves for the side to move.
pub fn generate_pseudo_legal_moves(board: &Board) -> Vec<Move> {
    let us = board.side_to_move();
    let not_friendly = !board.side_bitboard(us);

    let mut moves = Vec::with_capacity(64);
    generate_pawn_captures(board, &mut moves);
    generate_pawn_moves(board, &mut moves);
    generate_knight_moves(board, &mut moves, not_friendly);
    generate_bishop_moves(board, &mut moves, not_friendly);
    generate_rook_moves(board, &mut moves, not_friendly);
    generate_queen_moves(board, &mut moves, not_friendly);
    generate_king_moves(board, &mut moves, not_friendly);
    generate_castle_moves(board, &mut moves);
    moves
}

/// All pseudo-legal captures for the side to move (used by capture-only
/// search).
pub fn generate_pseudo_legal_captures(board: &Board) -> Vec<Move> {
    let them = !board.side_to_move();
    let enemy = board.side_bitboard(them);

    let mut moves = Vec::with_capacity(16);
    generate_pawn_captures(board, &mut moves);
    generate_knight_moves(board, &mut moves, enemy);
    generate_bishop_moves(board, &mut moves, enemy);
    generate_rook_moves(board, &mut moves, enemy);
    generate_queen_moves(board, &mut moves, enemy);
    generate_king_moves(board, &mut moves, enemy);
    moves
}

/// All legal moves for the side to move. An empty list is a valid result
/// (checkmate or stalemate).
pub fn generate_legal_moves(board: &Board) -> Result<Vec<Move>, MoveGeneratorError> {
    let pseudo = generate_pseudo_legal_moves(board);
    let mut probe = board.clone();
    let mut legal = Vec::with_capacity(pseudo.len());
    for mv in pseudo {
        if probe.is_move_legal(mv, false) {
            legal.push(mv);
        }
    }
    if !probe.is_consistent() || !probe.strict_equals(board) {
        tracing::warn!(fen = %board.to_fen(), "legality probe diverged from its source position");
        return Err(MoveGeneratorError {
            reason: format!("probe board diverged while simulating moves in {}", board.to_fen()),
        });
    }
    Ok(legal)
}

/// Legal moves originating from one square.
pub fn legal_moves_from(board: &Board, from: Square) -> Result<Vec<Move>, MoveGeneratorError> {
    Ok(generate_legal_moves(board)?
        .into_iter()
        .filter(|m| m.from == from)
        .collect())
}

// =========================================================================
// Pawns
// =========================================================================

/// Pawn captures, including en passant and capture-promotions.
pub fn generate_pawn_captures(board: &Board, moves: &mut Vec<Move>) {
    let t = attacks::tables();
    let us = board.side_to_move();
    let not_friendly = !board.side_bitboard(us);
    let mut pawns = board.bb(us, PieceType::Pawn);

    while let Some(from) = pawns.pop_lsb() {
        let targets =
            t.pawn_captures(us, from, board.occupancy(), board.en_passant_target()) & not_friendly;
        push_pawn_targets(us, from, targets, moves);
    }
}

/// Quiet pawn advances (single and double pushes), including promotions.
pub fn generate_pawn_moves(board: &Board, moves: &mut Vec<Move>) {
    let t = attacks::tables();
    let us = board.side_to_move();
    let mut pawns = board.bb(us, PieceType::Pawn);

    while let Some(from) = pawns.pop_lsb() {
        let targets = t.pawn_advances(us, from, board.occupancy());
        push_pawn_targets(us, from, targets, moves);
    }
}

/// Append pawn moves to the list, expanding far-rank landings into the four
/// promotion choices.
fn push_pawn_targets(us: Color, from: Square, mut targets: Bitboard, moves: &mut Vec<Move>) {
    let promo_rank = match us {
        Color::White => 7,
        Color::Black => 0,
    };
    while let Some(to) = targets.pop_lsb() {
        if to.rank() == promo_rank {
            for promo in [
                PieceType::Queen,
                PieceType::Rook,
                PieceType::Bishop,
                PieceType::Knight,
            ] {
                moves.push(Move::with_promotion(from, to, promo));
            }
        } else {
            moves.push(Move::new(from, to));
        }
    }
}

// =========================================================================
// Leapers and sliders
// =========================================================================

/// Knight moves restricted to `mask`.
pub fn generate_knight_moves(board: &Board, moves: &mut Vec<Move>, mask: Bitboard) {
    let t = attacks::tables();
    let us = board.side_to_move();
    let mut knights = board.bb(us, PieceType::Knight);

    while let Some(from) = knights.pop_lsb() {
        let mut targets = t.knight_attacks(from, mask);
        while let Some(to) = targets.pop_lsb() {
            moves.push(Move::new(from, to));
        }
    }
}

/// Bishop moves restricted to `mask`.
pub fn generate_bishop_moves(board: &Board, moves: &mut Vec<Move>, mask: Bitboard) {
    let t = attacks::tables();
    let us = board.side_to_move();
    let mut bishops = board.bb(us, PieceType::Bishop);

    while let Some(from) = bishops.pop_lsb() {
        let mut targets = t.bishop_attacks(from, board.occupancy()) & mask;
        while let Some(to) = targets.pop_lsb() {
            moves.push(Move::new(from, to));
        }
    }
}

/// Rook moves restricted to `mask`.
pub fn generate_rook_moves(board: &Board, moves: &mut Vec<Move>, mask: Bitboard) {
    let t = attacks::tables();
    let us = board.side_to_move();
    let mut rooks = board.bb(us, PieceType::Rook);

    while let Some(from) = rooks.pop_lsb() {
        let mut targets = t.rook_attacks(from, board.occupancy()) & mask;
        while let Some(to) = targets.pop_lsb() {
            moves.push(Move::new(from, to));
        }
    }
}

/// Queen moves restricted to `mask`.
pub fn generate_queen_moves(board: &Board, moves: &mut Vec<Move>, mask: Bitboard) {
    let t = attacks::tables();
    let us = board.side_to_move();
    let mut queens = board.bb(us, PieceType::Queen);

    while let Some(from) = queens.pop_lsb() {
        let mut targets = t.queen_attacks(from, board.occupancy()) & mask;
        while let Some(to) = targets.pop_lsb() {
            moves.push(Move::new(from, to));
        }
    }
}

/// King moves (castling excluded) restricted to `mask`.
pub fn generate_king_moves(board: &Board, moves: &mut Vec<Move>, mask: Bitboard) {
    let t = attacks::tables();
    let us = board.side_to_move();
    let mut kings = board.bb(us, PieceType::King);

    while let Some(from) = kings.pop_lsb() {
        let mut targets = t.king_attacks(from, mask);
        while let Some(to) = targets.pop_lsb() {
            moves.push(Move::new(from, to));
        }
    }
}

// =========================================================================
// Castling
// =========================================================================

/// Castle moves. Offered only when the mover is not in check, holds the
/// right, the king and rook stand on their home squares, the path between
/// them is empty, and no square the king crosses or lands on is attacked.
pub fn generate_castle_moves(board: &Board, moves: &mut Vec<Move>) {
    let us = board.side_to_move();
    let ctx = castle::context();
    for right in [CastleRight::KingSide, CastleRight::QueenSide] {
        if board.castling_rights().allows(us, right) && board.castle_playable(us, right) {
            moves.push(ctx.king_castle_move(us, right));
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
