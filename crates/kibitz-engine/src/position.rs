//! Game positions backed by `shakmaty`, with the key history needed for
//! repetition detection.

use kibitz_core::{EngineError, Move, PromotionPiece, Square};
use shakmaty::fen::Fen;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position, Role};

/// A position plus the Zobrist keys of every position since it was set up.
#[derive(Debug, Clone)]
pub struct GamePosition {
    chess: Chess,
    keys: Vec<u64>,
}

/// Everything needed to take one move back.
#[derive(Debug)]
pub struct Snapshot {
    previous: Chess,
}

impl GamePosition {
    /// Parse a six-field FEN.
    pub fn from_fen(fen: &str, chess960: bool) -> Result<Self, EngineError> {
        let invalid = |reason: String| EngineError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };

        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let mode = if chess960 {
            CastlingMode::Chess960
        } else {
            CastlingMode::Standard
        };
        let chess: Chess = parsed
            .into_position(mode)
            .map_err(|e| invalid(format!("{e}")))?;

        Ok(Self::from_chess(chess))
    }

    /// Start tracking history from `chess`.
    pub fn from_chess(chess: Chess) -> Self {
        let key = zobrist_key(&chess);
        Self {
            chess,
            keys: vec![key],
        }
    }

    /// The underlying `shakmaty` position.
    pub fn chess(&self) -> &Chess {
        &self.chess
    }

    /// FEN of the current position.
    pub fn fen(&self) -> String {
        Fen(self.chess.clone().into_setup(EnPassantMode::Legal)).to_string()
    }

    /// Legal moves in engine form.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.chess.legal_moves().iter().filter_map(to_core).collect()
    }

    /// Play `mv` if it is legal here.
    pub fn play(&mut self, mv: Move) -> Result<Snapshot, EngineError> {
        let legal = self.chess.legal_moves();
        let found = legal
            .iter()
            .find(|m| to_core(m) == Some(mv))
            .ok_or_else(|| EngineError::RejectedMove {
                uci_move: mv.to_string(),
                reason: "not legal in this position".to_string(),
            })?;

        let previous = self.chess.clone();
        self.chess.play_unchecked(found);
        self.keys.push(zobrist_key(&self.chess));
        Ok(Snapshot { previous })
    }

    /// Restore the position from before the last [`play`](Self::play).
    pub fn unplay(&mut self, snapshot: Snapshot) {
        self.chess = snapshot.previous;
        if self.keys.len() > 1 {
            self.keys.pop();
        }
    }

    /// Plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.chess.halfmoves()
    }

    /// `true` if the current position occurred twice before within the
    /// reversible stretch of the game.
    pub fn is_threefold_repetition(&self) -> bool {
        let Some((&current, earlier)) = self.keys.split_last() else {
            return false;
        };
        let window = self.halfmove_clock() as usize;

        let seen = earlier
            .iter()
            .rev()
            .take(window)
            .skip(1)
            .step_by(2)
            .filter(|&&key| key == current)
            .count();
        seen >= 2
    }
}

fn zobrist_key(chess: &Chess) -> u64 {
    chess.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}

fn square(sq: shakmaty::Square) -> Square {
    Square::from_index(sq as u8).unwrap_or(Square::A1)
}

fn promotion(role: Role) -> Option<PromotionPiece> {
    match role {
        Role::Knight => Some(PromotionPiece::Knight),
        Role::Bishop => Some(PromotionPiece::Bishop),
        Role::Rook => Some(PromotionPiece::Rook),
        Role::Queen => Some(PromotionPiece::Queen),
        Role::Pawn | Role::King => None,
    }
}

/// Convert a `shakmaty` move to engine form.
///
/// Castling keeps shakmaty's king-takes-rook squares. Drops have no
/// counterpart and convert to `None`.
pub(crate) fn to_core(m: &shakmaty::Move) -> Option<Move> {
    match *m {
        shakmaty::Move::Normal {
            from,
            to,
            promotion: None,
            ..
        } => Some(Move::new(square(from), square(to))),
        shakmaty::Move::Normal {
            from,
            to,
            promotion: Some(role),
            ..
        } => promotion(role).map(|p| Move::new_promotion(square(from), square(to), p)),
        shakmaty::Move::EnPassant { from, to } => {
            Some(Move::new_en_passant(square(from), square(to)))
        }
        shakmaty::Move::Castle { king, rook } => Some(Move::new_castle(square(king), square(rook))),
        shakmaty::Move::Put { .. } => None,
    }
}
