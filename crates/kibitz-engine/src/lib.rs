//! Reference engine for kibitz.
//!
//! Rules come from `shakmaty`; search is a worker pool that ranks root moves
//! by material. It exists so sessions can be driven end to end, not to play
//! strong chess.

pub mod control;
pub mod eval;
pub mod pool;
pub mod position;

use kibitz_core::{
    Engine, EngineError, EngineSettings, Move, SearchLimits, SearchReply, StopHandle,
};
use tracing::debug;

pub use control::SearchControl;
pub use pool::{ScoreCache, SearchPool, SearchResult};
pub use position::{GamePosition, Snapshot};

/// [`Engine`] implementation over `shakmaty` positions.
#[derive(Debug)]
pub struct ReferenceEngine {
    pool: SearchPool,
}

impl ReferenceEngine {
    /// Create an engine with default settings (one thread, 16 MB cache).
    pub fn new() -> Self {
        Self::with_settings(&EngineSettings::default())
    }

    /// Create an engine with explicit settings.
    pub fn with_settings(settings: &EngineSettings) -> Self {
        Self {
            pool: SearchPool::new(settings),
        }
    }

    /// The worker pool, for inspection.
    pub fn pool(&self) -> &SearchPool {
        &self.pool
    }
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for ReferenceEngine {
    type Position = GamePosition;
    type Snapshot = Snapshot;

    fn parse_position(&self, fen: &str, chess960: bool) -> Result<GamePosition, EngineError> {
        GamePosition::from_fen(fen, chess960)
    }

    fn to_fen(&self, pos: &GamePosition) -> String {
        pos.fen()
    }

    fn legal_moves(&self, pos: &GamePosition) -> Vec<Move> {
        pos.legal_moves()
    }

    fn do_move(&self, pos: &mut GamePosition, mv: Move) -> Result<Snapshot, EngineError> {
        pos.play(mv)
    }

    fn undo_move(&self, pos: &mut GamePosition, _mv: Move, snapshot: Snapshot) {
        pos.unplay(snapshot);
    }

    fn halfmove_clock(&self, pos: &GamePosition) -> u32 {
        pos.halfmove_clock()
    }

    fn is_repetition(&self, pos: &GamePosition) -> bool {
        pos.is_threefold_repetition()
    }

    fn start_search(
        &mut self,
        pos: &GamePosition,
        limits: &SearchLimits,
        reply: SearchReply,
    ) -> Result<(), EngineError> {
        debug!(fen = %pos.fen(), ?limits, "starting search");
        self.pool.start(pos.chess().clone(), limits, reply)
    }

    fn stop_handle(&self) -> StopHandle {
        self.pool.stop_handle()
    }

    fn configure(&mut self, settings: &EngineSettings) {
        debug!(threads = settings.threads, hash_mb = settings.hash_mb, "configuring engine");
        self.pool.configure(settings);
    }

    fn clear(&mut self) {
        self.pool.clear();
    }

    fn release(&mut self) {
        self.pool.shutdown();
    }
}
