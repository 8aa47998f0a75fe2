//! chesskit — a bitboard chess rules engine.
//!
//! The crate models a chess position ([`Board`]), mutates it move by move
//! under the full rules of the game (castling, en passant, promotion,
//! check, draw conditions), and enumerates legal moves from any position.
//! Every mutation is exactly reversible through a backup stack, and the
//! position keeps an incrementally maintained Zobrist key that always
//! equals a from-scratch recomputation.
//!
//! ```
//! use chesskit::{Board, Move, Square};
//!
//! let mut board = Board::new();
//! let mv = Move::new(
//!     Square::from_algebraic("e2").unwrap(),
//!     Square::from_algebraic("e4").unwrap(),
//! );
//! assert!(board.do_move(mv, true));
//! assert_eq!(board.legal_moves().unwrap().len(), 20);
//! board.undo_move();
//! assert_eq!(board.to_fen(), chesskit::board::STARTING_FEN);
//! ```

pub mod attacks;
pub mod backup;
pub mod board;
pub mod castle;
pub mod movegen;
pub mod san;
pub mod types;
pub mod zobrist;

pub use backup::MoveBackup;
pub use board::Board;
pub use movegen::{generate_legal_moves, generate_pseudo_legal_moves, MoveGeneratorError};
pub use types::*;
