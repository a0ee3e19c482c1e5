//! One game session: current position, undo history and a synchronous
//! front over the engine's asynchronous search.

use std::time::Duration;

use kibitz_core::{
    Engine, EngineSettings, FIFTY_MOVE_PLIES, LegalityVerifier, Move, PendingSearch,
    STARTING_FEN, SearchLimits, SearchStatus, StopHandle, notation, pending_search,
};
use tracing::{debug, info, warn};

use crate::error::BridgeError;

/// Settings a session reads at the moment it needs them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionConfig {
    /// Chess960 castling notation and FEN parsing.
    pub chess960: bool,
    /// Limits used by [`SessionBridge::think`].
    pub limits: SearchLimits,
}

/// Lifecycle of a [`SessionBridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No position yet, or released.
    Uninitialized,
    /// A position is set and no search is outstanding.
    Ready,
    /// A search has started and its move was not collected yet.
    SearchInFlight,
}

/// A game session over an [`Engine`].
///
/// Every applied move keeps its undo snapshot, so `undo` can walk back to
/// the position given to [`initialize`](Self::initialize) or
/// [`set_position`](Self::set_position). While a search is in flight the
/// position is frozen: mutating calls fail with
/// [`BridgeError::SearchInFlight`].
pub struct SessionBridge<E: Engine> {
    engine: E,
    config: SessionConfig,
    position: Option<E::Position>,
    snapshots: Vec<E::Snapshot>,
    moves: Vec<Move>,
    pending: Option<PendingSearch>,
}

impl<E: Engine> SessionBridge<E> {
    /// Wrap `engine`. The session starts uninitialized.
    pub fn new(engine: E, config: SessionConfig) -> Self {
        Self {
            engine,
            config,
            position: None,
            snapshots: Vec::new(),
            moves: Vec::new(),
            pending: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.pending.is_some() {
            SessionState::SearchInFlight
        } else if self.position.is_some() {
            SessionState::Ready
        } else {
            SessionState::Uninitialized
        }
    }

    /// The engine behind this session.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Current settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the settings.
    ///
    /// A changed Chess960 flag affects notation immediately and FEN parsing
    /// from the next [`set_position`](Self::set_position).
    pub fn set_config(&mut self, config: SessionConfig) -> Result<(), BridgeError> {
        self.ensure_idle()?;
        self.config = config;
        Ok(())
    }

    /// Set the position to `fen`, or to the standard start if `None`.
    ///
    /// Works from any state except [`SessionState::SearchInFlight`].
    pub fn initialize(&mut self, fen: Option<&str>) -> Result<(), BridgeError> {
        self.ensure_idle()?;
        self.reset_to(fen.unwrap_or(STARTING_FEN))
    }

    /// Replace the position and drop the undo history.
    ///
    /// On a bad FEN the previous position and history are kept.
    pub fn set_position(&mut self, fen: &str) -> Result<(), BridgeError> {
        self.ensure_ready()?;
        self.reset_to(fen)
    }

    /// Reset to the standard start and clear engine state carried between games.
    pub fn new_game(&mut self) -> Result<(), BridgeError> {
        self.ensure_ready()?;
        self.engine.clear();
        self.reset_to(STARTING_FEN)
    }

    fn reset_to(&mut self, fen: &str) -> Result<(), BridgeError> {
        let position = self.engine.parse_position(fen, self.config.chess960)?;
        self.position = Some(position);
        self.snapshots.clear();
        self.moves.clear();
        info!(fen, chess960 = self.config.chess960, "position set");
        Ok(())
    }

    /// Find the legal move that `mv` denotes.
    ///
    /// Castling may be given in either form: king to rook, or king to its
    /// landing square.
    pub fn resolve(&self, mv: Move) -> Result<Move, BridgeError> {
        let position = self.position()?;
        let chess960 = self.config.chess960;
        let wanted = notation::normalize(mv, chess960);
        self.engine
            .legal_moves(position)
            .into_iter()
            .find(|&legal| notation::normalize(legal, chess960) == wanted)
            .ok_or_else(|| BridgeError::IllegalMove {
                uci_move: notation::encode(mv, chess960),
            })
    }

    /// Play `mv` and record it for undo.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), BridgeError> {
        self.ensure_ready()?;
        let mv = self.resolve(mv)?;
        let position = self.position.as_mut().ok_or(BridgeError::NotInitialized)?;
        let snapshot = self.engine.do_move(position, mv)?;
        self.snapshots.push(snapshot);
        self.moves.push(mv);
        debug!(
            mv = %notation::encode(mv, self.config.chess960),
            ply = self.moves.len(),
            "move applied"
        );
        Ok(())
    }

    /// Parse coordinate notation against the legal moves and play it.
    pub fn apply_uci(&mut self, text: &str) -> Result<Move, BridgeError> {
        self.ensure_ready()?;
        let legal = self.engine.legal_moves(self.position()?);
        let mv = notation::decode(text, &legal, self.config.chess960).ok_or_else(|| {
            BridgeError::IllegalMove {
                uci_move: text.trim().to_string(),
            }
        })?;
        self.apply_move(mv)?;
        Ok(mv)
    }

    /// Take back the last applied move and return it.
    pub fn undo(&mut self) -> Result<Move, BridgeError> {
        self.ensure_ready()?;
        let (Some(mv), Some(snapshot)) = (self.moves.pop(), self.snapshots.pop()) else {
            return Err(BridgeError::EmptyHistory);
        };
        let position = self.position.as_mut().ok_or(BridgeError::NotInitialized)?;
        self.engine.undo_move(position, mv, snapshot);
        debug!(mv = %mv, ply = self.moves.len(), "move undone");
        Ok(mv)
    }

    /// Start a search with the configured limits.
    pub fn begin_search(&mut self) -> Result<(), BridgeError> {
        let limits = self.config.limits.clone();
        self.begin_search_with(&limits)
    }

    /// Start a search with explicit limits.
    pub fn begin_search_with(&mut self, limits: &SearchLimits) -> Result<(), BridgeError> {
        self.ensure_ready()?;
        let position = self.position.as_ref().ok_or(BridgeError::NotInitialized)?;
        let (reply, pending) = pending_search();
        self.engine.start_search(position, limits, reply)?;
        self.pending = Some(pending);
        debug!(?limits, "search started");
        Ok(())
    }

    /// Block until the outstanding search delivers, and return its move.
    ///
    /// Castling comes back with the king's landing square unless Chess960
    /// is on. The session is ready again afterwards, whatever the outcome.
    pub fn finish_search(&mut self) -> Result<Move, BridgeError> {
        let pending = self.pending.take().ok_or(BridgeError::NoSearchInFlight)?;
        let raw = pending.wait()?;
        Ok(self.collected(raw))
    }

    /// Collect the outstanding search if it delivers within `timeout`.
    ///
    /// `Ok(None)` means the search is still running and stays in flight.
    pub fn poll_search(&mut self, timeout: Duration) -> Result<Option<Move>, BridgeError> {
        let pending = self.pending.take().ok_or(BridgeError::NoSearchInFlight)?;
        match pending.wait_timeout(timeout)? {
            SearchStatus::Delivered(raw) => Ok(Some(self.collected(raw))),
            SearchStatus::Running(pending) => {
                self.pending = Some(pending);
                Ok(None)
            }
        }
    }

    fn collected(&self, raw: Move) -> Move {
        let mv = notation::normalize(raw, self.config.chess960);
        debug!(mv = %notation::encode(mv, self.config.chess960), "search collected");
        mv
    }

    /// Search with the configured limits and wait for the move.
    ///
    /// Returns [`Move::NONE`] when the side to move has no legal move.
    pub fn think(&mut self) -> Result<Move, BridgeError> {
        self.begin_search()?;
        self.finish_search()
    }

    /// Search with explicit limits and wait for the move.
    pub fn think_with(&mut self, limits: &SearchLimits) -> Result<Move, BridgeError> {
        self.begin_search_with(limits)?;
        self.finish_search()
    }

    /// Handle that ends an outstanding search early. Safe to use from any thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.engine.stop_handle()
    }

    /// Threefold repetition, or at least [`FIFTY_MOVE_PLIES`] plies without
    /// a capture or pawn move.
    pub fn is_draw(&self) -> Result<bool, BridgeError> {
        let position = self.position()?;
        Ok(self.engine.is_repetition(position)
            || self.engine.halfmove_clock(position) >= FIFTY_MOVE_PLIES)
    }

    /// Current position as FEN.
    pub fn fen(&self) -> Result<String, BridgeError> {
        Ok(self.engine.to_fen(self.position()?))
    }

    /// Legal moves in engine form.
    pub fn legal_moves(&self) -> Result<Vec<Move>, BridgeError> {
        Ok(self.engine.legal_moves(self.position()?))
    }

    /// Plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> Result<u32, BridgeError> {
        Ok(self.engine.halfmove_clock(self.position()?))
    }

    /// Moves applied since the position was last set, oldest first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// A verifier over the current legal moves.
    pub fn legality_verifier(&self) -> Result<LegalityVerifier, BridgeError> {
        let position = self.position()?;
        Ok(LegalityVerifier::new(
            &self.engine.legal_moves(position),
            self.engine.halfmove_clock(position),
            self.config.chess960,
        ))
    }

    /// Pass thread and cache settings to the engine.
    pub fn configure_engine(&mut self, settings: &EngineSettings) -> Result<(), BridgeError> {
        self.ensure_idle()?;
        self.engine.configure(settings);
        Ok(())
    }

    /// Clear engine state without touching the position.
    pub fn clear_engine(&mut self) -> Result<(), BridgeError> {
        self.ensure_idle()?;
        self.engine.clear();
        Ok(())
    }

    /// Stop any search, free engine workers and drop the position.
    ///
    /// The session can be initialized again afterwards.
    pub fn release(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.engine.stop_handle().stop();
            if let Err(e) = pending.wait() {
                warn!(error = %e, "search abandoned during release");
            }
        }
        self.engine.release();
        self.position = None;
        self.snapshots.clear();
        self.moves.clear();
        info!("session released");
    }

    fn position(&self) -> Result<&E::Position, BridgeError> {
        self.position.as_ref().ok_or(BridgeError::NotInitialized)
    }

    fn ensure_idle(&self) -> Result<(), BridgeError> {
        if self.pending.is_some() {
            return Err(BridgeError::SearchInFlight);
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), BridgeError> {
        self.ensure_idle()?;
        self.position().map(|_| ())
    }
}

impl<E: Engine> Drop for SessionBridge<E> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.engine.stop_handle().stop();
            let _ = pending.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use kibitz_core::{EngineError, SearchError, SearchReply, Square};

    use super::*;

    /// Plays whatever it is told is legal and answers searches from a script.
    #[derive(Clone, Debug)]
    struct Board {
        fen: String,
        played: Vec<Move>,
        halfmoves: u32,
    }

    struct ScriptedEngine {
        legal: Vec<Move>,
        answer: Option<Move>,
        repetition: bool,
        stop: StopHandle,
        clears: Arc<AtomicUsize>,
        configured: Option<EngineSettings>,
    }

    impl ScriptedEngine {
        fn new(legal: Vec<Move>, answer: Option<Move>) -> Self {
            Self {
                legal,
                answer,
                repetition: false,
                stop: StopHandle::new(),
                clears: Arc::new(AtomicUsize::new(0)),
                configured: None,
            }
        }
    }

    impl Engine for ScriptedEngine {
        type Position = Board;
        type Snapshot = u32;

        fn parse_position(&self, fen: &str, _chess960: bool) -> Result<Board, EngineError> {
            let fields: Vec<&str> = fen.split_whitespace().collect();
            if fields.len() != 6 {
                return Err(EngineError::InvalidFen {
                    fen: fen.to_string(),
                    reason: "expected six fields".to_string(),
                });
            }
            Ok(Board {
                fen: fen.to_string(),
                played: Vec::new(),
                halfmoves: fields[4].parse().unwrap_or(0),
            })
        }

        fn to_fen(&self, pos: &Board) -> String {
            let moves: Vec<String> = pos.played.iter().map(Move::to_string).collect();
            format!("{} [{}]", pos.fen, moves.join(" "))
        }

        fn legal_moves(&self, _pos: &Board) -> Vec<Move> {
            self.legal.clone()
        }

        fn do_move(&self, pos: &mut Board, mv: Move) -> Result<u32, EngineError> {
            let previous = pos.halfmoves;
            pos.played.push(mv);
            pos.halfmoves += 1;
            Ok(previous)
        }

        fn undo_move(&self, pos: &mut Board, _mv: Move, snapshot: u32) {
            pos.played.pop();
            pos.halfmoves = snapshot;
        }

        fn halfmove_clock(&self, pos: &Board) -> u32 {
            pos.halfmoves
        }

        fn is_repetition(&self, _pos: &Board) -> bool {
            self.repetition
        }

        fn start_search(
            &mut self,
            _pos: &Board,
            _limits: &SearchLimits,
            reply: SearchReply,
        ) -> Result<(), EngineError> {
            let answer = self.answer;
            thread::spawn(move || {
                if let Some(mv) = answer {
                    reply.deliver(mv);
                }
            });
            Ok(())
        }

        fn stop_handle(&self) -> StopHandle {
            self.stop.clone()
        }

        fn configure(&mut self, settings: &EngineSettings) {
            self.configured = Some(*settings);
        }

        fn clear(&mut self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    const CASTLING_FEN: &str = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn e2e4() -> Move {
        Move::new(sq("e2"), sq("e4"))
    }

    fn raw_short_castle() -> Move {
        Move::new_castle(sq("e1"), sq("h1"))
    }

    fn bridge(answer: Option<Move>) -> SessionBridge<ScriptedEngine> {
        let engine = ScriptedEngine::new(vec![e2e4(), raw_short_castle()], answer);
        SessionBridge::new(engine, SessionConfig::default())
    }

    fn ready(answer: Option<Move>) -> SessionBridge<ScriptedEngine> {
        let mut b = bridge(answer);
        b.initialize(None).unwrap();
        b
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    #[test]
    fn uninitialized_rejects_operations() {
        let mut b = bridge(None);
        assert_eq!(b.state(), SessionState::Uninitialized);
        assert!(matches!(b.apply_move(e2e4()), Err(BridgeError::NotInitialized)));
        assert!(matches!(b.undo(), Err(BridgeError::NotInitialized)));
        assert!(matches!(b.think(), Err(BridgeError::NotInitialized)));
        assert!(matches!(b.is_draw(), Err(BridgeError::NotInitialized)));
        assert!(matches!(b.fen(), Err(BridgeError::NotInitialized)));
        assert!(matches!(
            b.set_position(STARTING_FEN),
            Err(BridgeError::NotInitialized)
        ));
    }

    #[test]
    fn initialize_defaults_to_start_position() {
        let b = ready(None);
        assert_eq!(b.state(), SessionState::Ready);
        assert_eq!(b.fen().unwrap(), format!("{STARTING_FEN} []"));
    }

    #[test]
    fn bad_fen_keeps_previous_position() {
        let mut b = ready(None);
        b.apply_move(e2e4()).unwrap();
        let before = b.fen().unwrap();

        let err = b.set_position("not a fen").unwrap_err();
        assert!(matches!(err, BridgeError::Engine(EngineError::InvalidFen { .. })));
        assert_eq!(b.fen().unwrap(), before);
        assert_eq!(b.moves().len(), 1);
    }

    #[test]
    fn new_game_resets_history_and_clears_engine() {
        let mut b = ready(None);
        let clears = Arc::clone(&b.engine().clears);
        b.set_position(CASTLING_FEN).unwrap();
        b.apply_move(e2e4()).unwrap();

        b.new_game().unwrap();
        assert_eq!(b.fen().unwrap(), format!("{STARTING_FEN} []"));
        assert!(b.moves().is_empty());
        assert!(matches!(b.undo(), Err(BridgeError::EmptyHistory)));
        assert_eq!(clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_returns_to_uninitialized() {
        let mut b = ready(None);
        b.apply_move(e2e4()).unwrap();
        b.release();
        assert_eq!(b.state(), SessionState::Uninitialized);
        assert!(b.moves().is_empty());
        b.initialize(Some(CASTLING_FEN)).unwrap();
        assert_eq!(b.state(), SessionState::Ready);
    }

    // ── Moves and undo ────────────────────────────────────────────────────────

    #[test]
    fn apply_then_undo_restores_fen() {
        let mut b = ready(None);
        let start = b.fen().unwrap();
        b.apply_move(e2e4()).unwrap();
        assert_ne!(b.fen().unwrap(), start);
        assert_eq!(b.undo().unwrap(), e2e4());
        assert_eq!(b.fen().unwrap(), start);
        assert!(matches!(b.undo(), Err(BridgeError::EmptyHistory)));
    }

    #[test]
    fn illegal_move_rejected_without_change() {
        let mut b = ready(None);
        let err = b.apply_move(Move::new(sq("e2"), sq("e5"))).unwrap_err();
        assert!(matches!(err, BridgeError::IllegalMove { ref uci_move } if uci_move == "e2e5"));
        assert!(b.moves().is_empty());
    }

    #[test]
    fn castling_accepted_in_both_forms() {
        let mut b = ready(None);
        b.apply_move(Move::new_castle(sq("e1"), sq("g1"))).unwrap();
        assert_eq!(b.moves(), &[raw_short_castle()]);
        b.undo().unwrap();
        b.apply_move(raw_short_castle()).unwrap();
        assert_eq!(b.moves(), &[raw_short_castle()]);
    }

    #[test]
    fn apply_uci_decodes_text() {
        let mut b = ready(None);
        assert_eq!(b.apply_uci(" e1g1 ").unwrap(), raw_short_castle());
        assert!(matches!(b.apply_uci("zz99"), Err(BridgeError::IllegalMove { .. })));
    }

    // ── Draws ─────────────────────────────────────────────────────────────────

    #[test]
    fn fifty_move_boundary() {
        let mut b = ready(None);
        b.set_position("4k3/8/8/8/8/8/8/4K3 w - - 99 80").unwrap();
        assert!(!b.is_draw().unwrap());
        b.apply_move(e2e4()).unwrap();
        assert_eq!(b.halfmove_clock().unwrap(), FIFTY_MOVE_PLIES);
        assert!(b.is_draw().unwrap());
    }

    #[test]
    fn repetition_is_a_draw() {
        let mut engine = ScriptedEngine::new(vec![e2e4()], None);
        engine.repetition = true;
        let mut b = SessionBridge::new(engine, SessionConfig::default());
        b.initialize(None).unwrap();
        assert!(b.is_draw().unwrap());
    }

    // ── Search ────────────────────────────────────────────────────────────────

    #[test]
    fn think_rewrites_raw_castling() {
        let mut b = ready(Some(raw_short_castle()));
        let mv = b.think().unwrap();
        assert_eq!(mv, Move::new_castle(sq("e1"), sq("g1")));
        assert_eq!(notation::encode(mv, false), "e1g1");
        assert_eq!(b.state(), SessionState::Ready);
    }

    #[test]
    fn chess960_keeps_rook_destination() {
        let mut b = bridge(Some(raw_short_castle()));
        b.set_config(SessionConfig {
            chess960: true,
            ..SessionConfig::default()
        })
        .unwrap();
        b.initialize(None).unwrap();
        let mv = b.think().unwrap();
        assert_eq!(notation::encode(mv, true), "e1h1");
    }

    #[test]
    fn frozen_while_searching() {
        let mut b = ready(Some(e2e4()));
        b.begin_search().unwrap();
        assert_eq!(b.state(), SessionState::SearchInFlight);
        assert!(matches!(b.begin_search(), Err(BridgeError::SearchInFlight)));
        assert!(matches!(b.apply_move(e2e4()), Err(BridgeError::SearchInFlight)));
        assert!(matches!(b.undo(), Err(BridgeError::SearchInFlight)));
        assert!(matches!(b.new_game(), Err(BridgeError::SearchInFlight)));
        assert!(matches!(
            b.configure_engine(&EngineSettings::default()),
            Err(BridgeError::SearchInFlight)
        ));
        assert!(b.fen().is_ok());

        assert_eq!(b.finish_search().unwrap(), e2e4());
        assert!(matches!(b.finish_search(), Err(BridgeError::NoSearchInFlight)));
        assert_eq!(b.state(), SessionState::Ready);
    }

    #[test]
    fn think_with_explicit_limits() {
        let mut b = ready(Some(e2e4()));
        let limits = SearchLimits {
            movetime: Some(Duration::from_millis(5)),
            ..SearchLimits::default()
        };
        assert_eq!(b.think_with(&limits).unwrap(), e2e4());
        assert_eq!(b.state(), SessionState::Ready);
    }

    #[test]
    fn poll_collects_normalized_move() {
        let mut b = ready(Some(raw_short_castle()));
        assert!(matches!(
            b.poll_search(Duration::ZERO),
            Err(BridgeError::NoSearchInFlight)
        ));
        b.begin_search().unwrap();
        let mv = loop {
            if let Some(mv) = b.poll_search(Duration::from_millis(10)).unwrap() {
                break mv;
            }
            assert_eq!(b.state(), SessionState::SearchInFlight);
        };
        assert_eq!(notation::encode(mv, false), "e1g1");
        assert_eq!(b.state(), SessionState::Ready);
    }

    #[test]
    fn abandoned_search_reported() {
        let mut b = ready(None);
        let err = b.think().unwrap_err();
        assert!(matches!(err, BridgeError::Search(SearchError::Abandoned)));
        assert_eq!(b.state(), SessionState::Ready);
    }

    #[test]
    fn no_move_sentinel_passes_through() {
        let mut b = ready(Some(Move::NONE));
        assert_eq!(b.think().unwrap(), Move::NONE);
    }

    #[test]
    fn configure_reaches_engine() {
        let mut b = ready(None);
        let settings = EngineSettings {
            threads: 4,
            hash_mb: 64,
        };
        b.configure_engine(&settings).unwrap();
        assert_eq!(b.engine().configured, Some(settings));
    }

    #[test]
    fn verifier_uses_landing_squares() {
        let b = ready(None);
        let verifier = b.legality_verifier().unwrap();
        assert!(verifier.matches_unordered(&[(sq("e1"), sq("g1")), (sq("e2"), sq("e4"))]));
        assert!(!verifier.matches_unordered(&[(sq("e1"), sq("h1")), (sq("e2"), sq("e4"))]));
    }
}
