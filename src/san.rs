//! Standard Algebraic Notation encoding and parsing.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q`, `Raxd1`.
//!
//! This is a boundary layer for callers that replay annotated move
//! sequences; the engine core itself only deals in coordinate moves.

use crate::board::Board;
use crate::castle;
use crate::movegen;
use crate::types::{ChessError, Move, PieceType, Square};

// =========================================================================
// Encoding
// =========================================================================

/// Convert a move to SAN.
///
/// `legal` must be the legal-move list of the position (passed in to avoid
/// redundant generation). Check and mate suffixes are not appended; callers
/// that want them add `+`/`#` after applying the move.
pub fn move_to_san(board: &Board, mv: Move, legal: &[Move]) -> String {
    let piece = board
        .piece_at(mv.from)
        .expect("SAN encoding of a move with an empty origin");

    // Castling.
    if piece.kind == PieceType::King && castle::context().is_castle_move(piece.color, mv) {
        return if mv.to.file() > mv.from.file() {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let is_capture = board.piece_at(mv.to).is_some()
        || (piece.kind == PieceType::Pawn
            && mv.from.file() != mv.to.file()
            && board.en_passant() == Some(mv.to));

    let mut san = String::with_capacity(8);

    if piece.kind == PieceType::Pawn {
        if is_capture {
            san.push((b'a' + mv.from.file()) as char);
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(promo.san_letter());
        }
    } else {
        san.push(piece.kind.san_letter());
        san.push_str(&disambiguation(board, mv, piece.kind, legal));
        if is_capture {
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
    }

    san
}

/// File/rank qualifier when several same-type pieces reach the same square.
fn disambiguation(board: &Board, mv: Move, kind: PieceType, legal: &[Move]) -> String {
    let us = board.side_to_move();
    let rivals: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.to == mv.to
                && m.from != mv.from
                && board
                    .piece_at(m.from)
                    .map(|p| p.color == us && p.kind == kind)
                    .unwrap_or(false)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|m| m.from.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|m| m.from.rank() == mv.from.rank());

    match (shares_file, shares_rank) {
        (false, _) => format!("{}", (b'a' + mv.from.file()) as char),
        (true, false) => format!("{}", (b'1' + mv.from.rank()) as char),
        (true, true) => mv.from.to_algebraic(),
    }
}

// =========================================================================
// Parsing
// =========================================================================

/// Parse a SAN token against the current position, returning the unique
/// matching legal move.
///
/// Accepts `e4`, `Nf3`, `Bxe5`, `O-O`, `O-O-O`, `e8=Q` and friends; check,
/// mate and annotation suffixes (`+`, `#`, `!`, `?`) are ignored.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, ChessError> {
    let legal = movegen::generate_legal_moves(board).map_err(|e| ChessError::InvalidSan {
        san: san.to_string(),
        reason: e.to_string(),
    })?;
    let trimmed = san.trim_end_matches(['+', '#', '!', '?']);

    if trimmed == "O-O" || trimmed == "0-0" {
        return find_castle(board, &legal, san, true);
    }
    if trimmed == "O-O-O" || trimmed == "0-0-0" {
        return find_castle(board, &legal, san, false);
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.is_empty() {
        return Err(ChessError::InvalidSan {
            san: san.to_string(),
            reason: "empty token".into(),
        });
    }

    // Promotion suffix.
    let (chars, promotion) = if chars.len() >= 2 && chars[chars.len() - 2] == '=' {
        let promo = match chars[chars.len() - 1] {
            'Q' | 'q' => PieceType::Queen,
            'R' | 'r' => PieceType::Rook,
            'B' | 'b' => PieceType::Bishop,
            'N' | 'n' => PieceType::Knight,
            other => {
                return Err(ChessError::InvalidSan {
                    san: san.to_string(),
                    reason: format!("invalid promotion piece '{other}'"),
                })
            }
        };
        (&chars[..chars.len() - 2], Some(promo))
    } else {
        (&chars[..], None)
    };

    // Leading piece letter; none means a pawn move.
    let (kind, rest) = match chars.first().copied() {
        Some('N') => (PieceType::Knight, &chars[1..]),
        Some('B') => (PieceType::Bishop, &chars[1..]),
        Some('R') => (PieceType::Rook, &chars[1..]),
        Some('Q') => (PieceType::Queen, &chars[1..]),
        Some('K') => (PieceType::King, &chars[1..]),
        _ => (PieceType::Pawn, chars),
    };

    let rest: Vec<char> = rest.iter().copied().filter(|&c| c != 'x').collect();
    if rest.len() < 2 {
        return Err(ChessError::InvalidSan {
            san: san.to_string(),
            reason: "token too short".into(),
        });
    }

    let dest_str: String = rest[rest.len() - 2..].iter().collect();
    let dest = Square::from_algebraic(&dest_str)
        .ok_or_else(|| ChessError::InvalidSquare(dest_str.clone()))?;

    let qualifier = &rest[..rest.len() - 2];
    let want_file: Option<u8> = qualifier
        .iter()
        .find(|c| c.is_ascii_lowercase())
        .map(|&c| c as u8 - b'a');
    let want_rank: Option<u8> = qualifier
        .iter()
        .find(|c| c.is_ascii_digit())
        .map(|&c| c as u8 - b'1');

    let us = board.side_to_move();
    let candidates: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            if m.to != dest || m.promotion != promotion {
                return false;
            }
            let piece = match board.piece_at(m.from) {
                Some(p) => p,
                None => return false,
            };
            if piece.color != us || piece.kind != kind {
                return false;
            }
            if let Some(f) = want_file {
                if m.from.file() != f {
                    return false;
                }
            }
            if let Some(r) = want_rank {
                if m.from.rank() != r {
                    return false;
                }
            }
            // A plain king step to a castle destination must not swallow
            // the castle move's notation.
            !(piece.kind == PieceType::King && castle::context().is_castle_move(us, **m))
        })
        .collect();

    match candidates.len() {
        1 => Ok(*candidates[0]),
        0 => Err(ChessError::InvalidSan {
            san: san.to_string(),
            reason: "no legal move matches".into(),
        }),
        n => Err(ChessError::InvalidSan {
            san: san.to_string(),
            reason: format!("{n} legal moves match"),
        }),
    }
}

fn find_castle(
    board: &Board,
    legal: &[Move],
    san: &str,
    kingside: bool,
) -> Result<Move, ChessError> {
    let us = board.side_to_move();
    let ctx = castle::context();
    legal
        .iter()
        .find(|m| {
            board
                .piece_at(m.from)
                .map(|p| p.kind == PieceType::King)
                .unwrap_or(false)
                && ctx.is_castle_move(us, **m)
                && (m.to.file() > m.from.file()) == kingside
        })
        .copied()
        .ok_or_else(|| ChessError::InvalidSan {
            san: san.to_string(),
            reason: "castle is not legal here".into(),
        })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    fn san_of(fen: &str, mv: Move) -> String {
        let b = board(fen);
        let legal = movegen::generate_legal_moves(&b).unwrap();
        move_to_san(&b, mv, &legal)
    }

    // -------------------------------------------------------------------
    // Encoding
    // -------------------------------------------------------------------

    #[test]
    fn pawn_push() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(san_of(fen, Move::new(sq("e2"), sq("e4"))), "e4");
    }

    #[test]
    fn pawn_capture_keeps_departure_file() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        assert_eq!(san_of(fen, Move::new(sq("e4"), sq("d5"))), "exd5");
    }

    #[test]
    fn en_passant_reads_as_a_capture() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        assert_eq!(san_of(fen, Move::new(sq("e5"), sq("f6"))), "exf6");
    }

    #[test]
    fn promotion_suffix() {
        let fen = "7k/4P3/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(
            san_of(fen, Move::with_promotion(sq("e7"), sq("e8"), PieceType::Queen)),
            "e8=Q"
        );
    }

    #[test]
    fn piece_moves_and_captures() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(san_of(fen, Move::new(sq("g1"), sq("f3"))), "Nf3");

        let fen = "rnbqk1nr/pppp1ppp/4p3/8/1b6/2N5/PPPPPPPP/R1BQKBNR b KQkq - 2 2";
        assert_eq!(san_of(fen, Move::new(sq("b4"), sq("c3"))), "Bxc3");
    }

    #[test]
    fn castle_notation() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        assert_eq!(san_of(fen, Move::new(sq("e1"), sq("g1"))), "O-O");
        assert_eq!(san_of(fen, Move::new(sq("e1"), sq("c1"))), "O-O-O");
    }

    #[test]
    fn file_disambiguation() {
        // Rooks on a1 and h1 both reach e1.
        let fen = "4k3/8/8/8/8/4K3/8/R6R w - - 0 1";
        assert_eq!(san_of(fen, Move::new(sq("a1"), sq("e1"))), "Rae1");
    }

    #[test]
    fn rank_disambiguation() {
        let fen = "R3k3/8/8/8/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, Move::new(sq("a1"), sq("a4"))), "R1a4");
    }

    // -------------------------------------------------------------------
    // Parsing
    // -------------------------------------------------------------------

    #[test]
    fn parse_pawn_and_piece_moves() {
        let b = Board::new();
        assert_eq!(parse_san(&b, "e4").unwrap(), Move::new(sq("e2"), sq("e4")));
        assert_eq!(parse_san(&b, "Nf3").unwrap(), Move::new(sq("g1"), sq("f3")));
    }

    #[test]
    fn parse_strips_suffixes() {
        let b = Board::new();
        assert_eq!(parse_san(&b, "e4!?").unwrap(), Move::new(sq("e2"), sq("e4")));
        assert_eq!(parse_san(&b, "Nf3+").unwrap(), Move::new(sq("g1"), sq("f3")));
    }

    #[test]
    fn parse_castles() {
        let b = board("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        assert_eq!(parse_san(&b, "O-O").unwrap(), Move::new(sq("e1"), sq("g1")));
        assert_eq!(parse_san(&b, "O-O-O").unwrap(), Move::new(sq("e1"), sq("c1")));
    }

    #[test]
    fn parse_promotion() {
        let b = board("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            parse_san(&b, "e8=Q").unwrap(),
            Move::with_promotion(sq("e7"), sq("e8"), PieceType::Queen)
        );
        // Without the suffix the promotion moves must not match.
        assert!(parse_san(&b, "e8").is_err());
    }

    #[test]
    fn parse_disambiguated_moves() {
        let b = board("4k3/8/8/8/8/4K3/8/R6R w - - 0 1");
        assert_eq!(parse_san(&b, "Rae1").unwrap(), Move::new(sq("a1"), sq("e1")));
        assert_eq!(parse_san(&b, "Rhe1").unwrap(), Move::new(sq("h1"), sq("e1")));
        // Ambiguous without the qualifier.
        assert!(parse_san(&b, "Re1").is_err());
    }

    #[test]
    fn parse_rejects_impossible_moves() {
        let b = Board::new();
        assert!(parse_san(&b, "Qh5").is_err());
        assert!(parse_san(&b, "").is_err());
        assert!(parse_san(&b, "xx").is_err());
    }

    // -------------------------------------------------------------------
    // Round trips
    // -------------------------------------------------------------------

    #[test]
    fn encode_parse_round_trip() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        ] {
            let b = board(fen);
            let legal = movegen::generate_legal_moves(&b).unwrap();
            for m in &legal {
                let san = move_to_san(&b, *m, &legal);
                let parsed = parse_san(&b, &san).unwrap();
                assert_eq!(parsed, *m, "round trip failed for '{san}' in {fen}");
            }
        }
    }
}
