//! The contract between the session layer and a chess engine.

use std::time::Duration;

use crate::chess_move::Move;
use crate::error::EngineError;
use crate::pending::{SearchReply, StopHandle};

/// FEN of the standard initial position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Half-move clock value (in plies) at which the 50-move rule applies.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Limits for a single search request.
///
/// The session layer only forwards these; what each field means in detail
/// is up to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLimits {
    /// Search to this depth only.
    pub depth: Option<u8>,
    /// Hard time budget for the move.
    pub movetime: Option<Duration>,
    /// Search this many nodes only.
    pub nodes: Option<u64>,
    /// Keep searching until stopped.
    pub infinite: bool,
    /// Never answer before this much time has passed, unless stopped.
    pub min_think: Duration,
    /// Playing strength, 0..=20.
    pub skill: u8,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            depth: None,
            movetime: None,
            nodes: None,
            infinite: false,
            min_think: Duration::ZERO,
            skill: 20,
        }
    }
}

/// Resource settings for an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Number of search worker threads.
    pub threads: usize,
    /// Search cache size in megabytes.
    pub hash_mb: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            threads: 1,
            hash_mb: 16,
        }
    }
}

/// A chess engine as seen from the session bridge.
///
/// The engine owns rules and search. The caller owns the position and the
/// snapshots returned by [`do_move`](Engine::do_move), and hands them back
/// on [`undo_move`](Engine::undo_move). Moves are always in engine form:
/// castling is "king captures own rook".
pub trait Engine {
    /// Full position state, including whatever history repetition
    /// detection needs.
    type Position: Clone + Send + 'static;

    /// Data needed to take one move back.
    type Snapshot;

    /// Build a position from a six-field FEN.
    fn parse_position(&self, fen: &str, chess960: bool) -> Result<Self::Position, EngineError>;

    /// Render a position as FEN.
    fn to_fen(&self, pos: &Self::Position) -> String;

    /// Every legal move in `pos`.
    fn legal_moves(&self, pos: &Self::Position) -> Vec<Move>;

    /// Play `mv` in place, returning what is needed to undo it.
    fn do_move(&self, pos: &mut Self::Position, mv: Move) -> Result<Self::Snapshot, EngineError>;

    /// Take back `mv`, which must be the last move played on `pos`.
    fn undo_move(&self, pos: &mut Self::Position, mv: Move, snapshot: Self::Snapshot);

    /// Plies since the last capture or pawn move.
    fn halfmove_clock(&self, pos: &Self::Position) -> u32;

    /// Whether the current position has occurred three times.
    fn is_repetition(&self, pos: &Self::Position) -> bool;

    /// Start searching `pos` on the engine's worker threads.
    ///
    /// Must return without waiting for the result. The engine delivers
    /// exactly one move through `reply`, or drops it on failure.
    fn start_search(
        &mut self,
        pos: &Self::Position,
        limits: &SearchLimits,
        reply: SearchReply,
    ) -> Result<(), EngineError>;

    /// Handle that ends the running search early.
    fn stop_handle(&self) -> StopHandle;

    /// Apply thread and cache settings. Called only between searches.
    fn configure(&mut self, settings: &EngineSettings);

    /// Forget search state carried between games.
    fn clear(&mut self);

    /// Free worker resources. The engine may be configured again afterwards.
    fn release(&mut self) {}
}
