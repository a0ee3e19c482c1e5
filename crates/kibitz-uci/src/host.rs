//! Narrow, value-typed surface for embedding a session in a host
//! application (a GUI or a scripting binding).
//!
//! Squares cross this boundary as indices 0..64 (a1 = 0, h8 = 63) and
//! moves as opaque [`MoveToken`]s.

use std::fmt;

use kibitz_core::{CastleSide, Engine, Move, PieceKind, PromotionPiece, Square, notation};
use tracing::warn;

use crate::defaults::{self, OptionEvents};
use crate::error::{BridgeError, UciError};
use crate::registry::OptionRegistry;
use crate::session::SessionBridge;

/// A move as a host sees it: an opaque 16-bit value.
///
/// Tokens come from [`HostSession::search`] or
/// [`HostSession::legal_moves`] and can be passed back to
/// [`HostSession::apply_token`] or [`HostSession::describe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveToken(u16);

impl MoveToken {
    /// The raw value.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Rebuild a token from a value obtained earlier.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Whether this token means "no move".
    pub const fn is_none(self) -> bool {
        self.0 == Move::NONE.raw()
    }

    fn to_move(self) -> Move {
        Move::from_raw(self.0)
    }
}

impl From<Move> for MoveToken {
    fn from(mv: Move) -> Self {
        Self(mv.raw())
    }
}

fn square(index: u8) -> Result<Square, BridgeError> {
    Square::from_index(index).ok_or(BridgeError::InvalidSquare(index))
}

/// A session together with its option table.
pub struct HostSession<E: Engine> {
    options: OptionRegistry,
    events: OptionEvents,
    bridge: SessionBridge<E>,
}

impl<E: Engine> HostSession<E> {
    /// Register the option table, configure `engine` from it and set the
    /// position to `custom_fen` or the standard start.
    pub fn initialize(
        engine: E,
        skill: f64,
        min_think_ms: f64,
        custom_fen: Option<&str>,
    ) -> Result<Self, UciError> {
        let mut options = OptionRegistry::new();
        let events = defaults::register_defaults(&mut options, skill, min_think_ms)?;
        let mut bridge = SessionBridge::new(engine, defaults::session_config(&options));
        bridge.configure_engine(&defaults::engine_settings(&options))?;
        bridge.initialize(custom_fen)?;
        Ok(Self {
            options,
            events,
            bridge,
        })
    }

    /// Write an option. Invalid writes are ignored, as over the protocol.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), BridgeError> {
        self.options.set(name, value);
        for event in self.events.drain() {
            if let defaults::OptionEvent::DebugLogFile(path) = &event {
                warn!(path = %path, "debug log file is only honored by the text protocol");
            }
            defaults::sync_bridge(&event, &self.options, &mut self.bridge)?;
        }
        Ok(())
    }

    /// The option table.
    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    /// The underlying session.
    pub fn bridge(&self) -> &SessionBridge<E> {
        &self.bridge
    }

    /// Replace the position.
    pub fn set_position(&mut self, fen: &str) -> Result<(), BridgeError> {
        self.bridge.set_position(fen)
    }

    /// Current position as FEN.
    pub fn fen(&self) -> Result<String, BridgeError> {
        self.bridge.fen()
    }

    /// Play the non-promotion move from `from` to `to`.
    ///
    /// Castling is accepted with the king's landing square, en passant with
    /// the capturing pawn's destination.
    pub fn apply_move_by_coordinates(&mut self, from: u8, to: u8) -> Result<(), BridgeError> {
        let (from, to) = (square(from)?, square(to)?);
        let chess960 = self.bridge.config().chess960;
        let mv = self.find(
            |mv| {
                !mv.is_promotion()
                    && mv.source() == from
                    && notation::display_dest(mv, chess960) == to
            },
            || format!("{from}{to}"),
        )?;
        self.bridge.apply_move(mv)
    }

    /// Castle to `side`.
    pub fn apply_castling(&mut self, side: CastleSide) -> Result<(), BridgeError> {
        let mv = self.find(
            |mv| mv.is_castle() && notation::castle_side(mv) == side,
            || format!("castle {side:?}"),
        )?;
        self.bridge.apply_move(mv)
    }

    /// Capture en passant with the pawn on `from`.
    pub fn apply_en_passant(&mut self, from: u8) -> Result<(), BridgeError> {
        let from = square(from)?;
        let mv = self.find(
            |mv| mv.is_en_passant() && mv.source() == from,
            || format!("en passant from {from}"),
        )?;
        self.bridge.apply_move(mv)
    }

    /// Promote the pawn moving from `from` to `to` into `piece`.
    pub fn apply_promotion(
        &mut self,
        from: u8,
        to: u8,
        piece: PieceKind,
    ) -> Result<(), BridgeError> {
        let (from, to) = (square(from)?, square(to)?);
        let promo = PromotionPiece::from_piece_kind(piece).ok_or_else(|| {
            BridgeError::IllegalMove {
                uci_move: format!("{from}{to}{}", piece.letter()),
            }
        })?;
        self.bridge.apply_move(Move::new_promotion(from, to, promo))
    }

    /// Play a move obtained as a token.
    pub fn apply_token(&mut self, token: MoveToken) -> Result<(), BridgeError> {
        self.bridge.apply_move(token.to_move())
    }

    /// Search and return the best move. No legal move gives a "none" token.
    pub fn search(&mut self) -> Result<MoveToken, BridgeError> {
        self.bridge.think().map(MoveToken::from)
    }

    /// Coordinate notation for `token`.
    pub fn describe(&self, token: MoveToken) -> String {
        notation::encode(token.to_move(), self.bridge.config().chess960)
    }

    /// Take back the last move.
    pub fn undo(&mut self) -> Result<MoveToken, BridgeError> {
        self.bridge.undo().map(MoveToken::from)
    }

    /// Start a new game from the standard position.
    pub fn new_game(&mut self) -> Result<(), BridgeError> {
        self.bridge.new_game()
    }

    /// Threefold repetition or the 50-move rule.
    pub fn is_draw(&self) -> Result<bool, BridgeError> {
        self.bridge.is_draw()
    }

    /// Plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> Result<u32, BridgeError> {
        self.bridge.halfmove_clock()
    }

    /// Legal moves as tokens, castling shown with the king's landing square.
    pub fn legal_moves(&self) -> Result<Vec<MoveToken>, BridgeError> {
        let chess960 = self.bridge.config().chess960;
        Ok(self
            .bridge
            .legal_moves()?
            .into_iter()
            .map(|mv| MoveToken::from(notation::normalize(mv, chess960)))
            .collect())
    }

    /// Whether the host's `(from[i], to[i])` list equals the legal moves in order.
    pub fn all_moves_match(&self, from: &[u8], to: &[u8]) -> Result<bool, BridgeError> {
        let Some(candidates) = candidates(from, to) else {
            return Ok(false);
        };
        Ok(self.bridge.legality_verifier()?.matches_ordered(&candidates))
    }

    /// Whether the host's list equals the legal moves in any order.
    pub fn all_moves_match_unordered(&self, from: &[u8], to: &[u8]) -> Result<bool, BridgeError> {
        let Some(candidates) = candidates(from, to) else {
            return Ok(false);
        };
        Ok(self.bridge.legality_verifier()?.matches_unordered(&candidates))
    }

    /// Stop any search and free the engine. Every later call fails until
    /// the session is built again.
    pub fn release(&mut self) {
        self.bridge.release();
    }

    fn find(
        &self,
        pred: impl Fn(Move) -> bool,
        describe: impl FnOnce() -> String,
    ) -> Result<Move, BridgeError> {
        self.bridge
            .legal_moves()?
            .into_iter()
            .find(|&mv| pred(mv))
            .ok_or_else(|| BridgeError::IllegalMove {
                uci_move: describe(),
            })
    }
}

fn candidates(from: &[u8], to: &[u8]) -> Option<Vec<(Square, Square)>> {
    if from.len() != to.len() {
        return None;
    }
    from.iter()
        .zip(to)
        .map(|(&f, &t)| Some((Square::from_index(f)?, Square::from_index(t)?)))
        .collect()
}

impl<E: Engine> fmt::Debug for HostSession<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSession")
            .field("options", &self.options.len())
            .field("state", &self.bridge.state())
            .finish_non_exhaustive()
    }
}
