//! Core vocabulary for kibitz: squares, moves, coordinate notation, and the
//! contract a chess engine must satisfy to sit behind a session.

mod chess_move;
mod engine;
mod error;
pub mod notation;
mod pending;
mod piece_kind;
mod square;
mod verify;

pub use chess_move::{Move, MoveKind, PromotionPiece};
pub use engine::{Engine, EngineSettings, FIFTY_MOVE_PLIES, STARTING_FEN, SearchLimits};
pub use error::{EngineError, SearchError};
pub use pending::{PendingSearch, SearchReply, SearchStatus, StopHandle, pending_search};
pub use piece_kind::PieceKind;
pub use square::{CastleSide, Square};
pub use verify::{Candidate, LegalityVerifier};
