//! Board behaviour acceptance suite: SAN-driven game replays exercising
//! repetition detection, undo idempotence, hash discipline and FEN round
//! trips the way a PGN-replaying consumer would.

use chesskit::board::Board;
use chesskit::san;
use chesskit::types::{CastleRight, Color, Move, PieceType, Square};

fn sq(name: &str) -> Square {
    Square::from_algebraic(name).unwrap()
}

/// Replay a whitespace-separated SAN sequence ("e4 e5 Nf3 ..." — move
/// numbers like "1." are tolerated and skipped).
fn play(board: &mut Board, sans: &str) {
    for token in sans.split_whitespace() {
        let token = token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
        if token.is_empty() {
            continue;
        }
        let mv = san::parse_san(board, token)
            .unwrap_or_else(|e| panic!("cannot play '{token}': {e}"));
        assert!(board.do_move(mv, true), "legal SAN move '{token}' was rejected");
    }
}

// =====================================================================
// Threefold repetition
// =====================================================================

#[test]
fn bishop_shuttle_is_a_repetition() {
    let mut board = Board::new();
    play(
        &mut board,
        "e4 e5 Be2 Be7 Bf1 Bf8 Bd3 Bd6 Bf1 Bf8 Bd3 Bd6 Bf1 Bf8",
    );
    assert!(board.is_repetition());
    assert!(board.is_draw());
}

#[test]
fn king_trip_breaks_the_repetition() {
    // The piece placement recurs, but the king excursion destroys both
    // castling rights, so the later occurrences are different positions
    // from the earlier ones.
    let mut board = Board::new();
    play(
        &mut board,
        "e4 e5 Nf3 Nf6 Ng1 Ng8 Ke2 Ke7 Ke1 Ke8 Na3 Na6 Nb1 Nb8",
    );
    assert!(!board.is_repetition());
    assert_eq!(board.castle_right(Color::White), CastleRight::None);
    assert_eq!(board.castle_right(Color::Black), CastleRight::None);
}

#[test]
fn knight_and_bishop_shuttle_is_a_repetition() {
    let mut board = Board::new();
    play(
        &mut board,
        "1. Nf3 Nf6 2. Nc3 c5 3. e3 d5 4. Be2 Ne4 5. Bf1 Nf6 6. Be2 Ne4 7. Bf1 Nf6",
    );
    assert!(board.is_repetition());
}

#[test]
fn repetition_counting_is_window_bounded() {
    // Two occurrences on each side of an irreversible pawn move never add
    // up to three.
    let mut board = Board::new();
    play(&mut board, "Nf3 Nf6 Ng1 Ng8 e4 e5 Nf3 Nf6 Ng1 Ng8");
    assert!(!board.is_repetition());
}

// =====================================================================
// Undo idempotence across a replayed game
// =====================================================================

#[test]
fn full_game_unwinds_to_the_start() {
    let sans = "e4 e5 Nf3 Nc6 Bb5 a6 Ba4 Nf6 O-O Be7 Re1 b5 Bb3 d6 c3 O-O h3 Na5 Bc2 c5 d4 Qc7";
    let mut board = Board::new();

    let mut fens = vec![board.to_fen()];
    let mut keys = vec![board.zobrist_key()];
    for token in sans.split_whitespace() {
        let mv = san::parse_san(&board, token).unwrap();
        assert!(board.do_move(mv, true));
        fens.push(board.to_fen());
        keys.push(board.zobrist_key());
        assert_eq!(board.zobrist_key(), board.compute_zobrist());
    }

    // Unwind one move at a time; every intermediate state must match what
    // the forward pass saw, hash included.
    for i in (0..sans.split_whitespace().count()).rev() {
        board.undo_move();
        assert_eq!(board.to_fen(), fens[i], "FEN mismatch after undo to ply {i}");
        assert_eq!(board.zobrist_key(), keys[i]);
        assert_eq!(board.history().len(), i);
    }
    assert!(board.strict_equals(&Board::new()));
}

#[test]
fn undo_across_en_passant_and_underpromotion() {
    // A contrived but legal line with an en-passant capture and an
    // under-promoting capture of the b8 knight.
    let mut board = Board::new();
    play(&mut board, "e4 Nf6 e5 d5 exd6 e6 dxc7 Bd7 Nf3 Qe7");
    let mid_fen = board.to_fen();
    let mid_key = board.zobrist_key();

    play(&mut board, "cxb8=N Rxb8");
    board.undo_move();
    board.undo_move();

    assert_eq!(board.to_fen(), mid_fen);
    assert_eq!(board.zobrist_key(), mid_key);
}

// =====================================================================
// FEN round trips under play
// =====================================================================

#[test]
fn every_position_of_a_game_round_trips_through_fen() {
    let sans = "d4 d5 c4 e6 Nc3 Nf6 Bg5 Be7 e3 O-O Nf3 h6 Bh4 b6 cxd5 Nxd5";
    let mut board = Board::new();
    for token in sans.split_whitespace() {
        let mv = san::parse_san(&board, token).unwrap();
        board.do_move(mv, true);

        let reloaded = Board::from_fen(&board.to_fen()).unwrap();
        assert_eq!(reloaded, board);
        assert_eq!(reloaded.zobrist_key(), board.zobrist_key());
        assert_eq!(reloaded.to_fen(), board.to_fen());
    }
}

// =====================================================================
// Branching exploration via clones
// =====================================================================

#[test]
fn cloned_branches_never_touch_the_parent() {
    let mut board = Board::new();
    play(&mut board, "e4 c5 Nf3");
    let snapshot_fen = board.to_fen();
    let snapshot_len = board.history().len();

    // Explore every reply on clones, two plies deep.
    for mv in board.legal_moves().unwrap() {
        let mut branch = board.clone();
        assert!(branch.do_move(mv, false));
        for reply in branch.legal_moves().unwrap() {
            let mut leaf = branch.clone();
            assert!(leaf.do_move(reply, false));
        }
    }

    assert_eq!(board.to_fen(), snapshot_fen);
    assert_eq!(board.history().len(), snapshot_len);
    assert_eq!(board.zobrist_key(), board.compute_zobrist());
}

// =====================================================================
// Draw states reached through play
// =====================================================================

#[test]
fn capturing_down_to_lone_bishops_draws() {
    // Same-coloured surviving bishops.
    let board =
        Board::from_fen("8/8/8/4k3/5b2/3K4/8/2B5 w - - 0 1").unwrap();
    assert!(board.is_insufficient_material());
    assert!(board.is_draw());

    let board =
        Board::from_fen("8/8/8/4k3/5b2/3K4/2B5/8 w - - 0 1").unwrap();
    assert!(!board.is_insufficient_material());
}

#[test]
fn scholars_mate_ends_the_game() {
    let mut board = Board::new();
    play(&mut board, "e4 e5 Bc4 Nc6 Qh5 Nf6 Qxf7#");
    assert!(board.is_mated());
    assert!(board.legal_moves().unwrap().is_empty());
    assert!(!board.is_draw());
}

// =====================================================================
// Position identity for de-duplication
// =====================================================================

#[test]
fn transposition_shares_a_position_id() {
    let mut via_d4 = Board::new();
    play(&mut via_d4, "d4 d5 Nf3 Nf6");
    let mut via_nf3 = Board::new();
    play(&mut via_nf3, "Nf3 Nf6 d4 d5");

    assert_eq!(via_d4.position_id(), via_nf3.position_id());
    assert_eq!(via_d4.zobrist_key(), via_nf3.zobrist_key());
    assert_eq!(via_d4, via_nf3);
    assert!(!via_d4.strict_equals(&via_nf3));
}

// =====================================================================
// Promotion interplay with draw material
// =====================================================================

#[test]
fn promotion_restores_sufficient_material() {
    let mut board = Board::from_fen("4k3/6P1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert!(!board.is_insufficient_material());
    let promo = Move::with_promotion(sq("g7"), sq("g8"), PieceType::Queen);
    assert!(board.do_move(promo, true));
    assert!(!board.is_insufficient_material());
    board.undo_move();
    assert_eq!(
        board.piece_at(sq("g7")).map(|p| p.kind),
        Some(PieceType::Pawn)
    );
}
