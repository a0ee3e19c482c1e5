//! Compare a host's idea of the legal moves with the engine's.
//!
//! Hosts that draw their own board keep a move list of `(from, to)` pairs.
//! These checks confirm that list agrees with what the engine generates,
//! with castling compared by the king's landing square.

use crate::chess_move::Move;
use crate::engine::FIFTY_MOVE_PLIES;
use crate::notation;
use crate::square::Square;

/// A host-supplied move: origin and destination squares.
pub type Candidate = (Square, Square);

/// Checks candidate move lists against the engine's legal moves for one position.
#[derive(Debug, Clone)]
pub struct LegalityVerifier {
    legal: Vec<Candidate>,
    halfmove_clock: u32,
}

impl LegalityVerifier {
    /// Build a verifier from the engine's legal moves and half-move clock.
    pub fn new(legal: &[Move], halfmove_clock: u32, chess960: bool) -> Self {
        let legal = legal
            .iter()
            .map(|&mv| (mv.source(), notation::display_dest(mv, chess960)))
            .collect();
        Self {
            legal,
            halfmove_clock,
        }
    }

    /// Once the 50-move rule is reached the position is over and any list passes.
    fn is_terminal(&self) -> bool {
        self.halfmove_clock >= FIFTY_MOVE_PLIES
    }

    /// `true` if `candidates` lists the legal moves in exactly the engine's order.
    pub fn matches_ordered(&self, candidates: &[Candidate]) -> bool {
        if self.is_terminal() {
            return true;
        }
        candidates.len() == self.legal.len()
            && candidates.iter().zip(&self.legal).all(|(c, l)| c == l)
    }

    /// `true` if `candidates` and the legal moves are equal as multisets.
    pub fn matches_unordered(&self, candidates: &[Candidate]) -> bool {
        if self.is_terminal() {
            return true;
        }
        if candidates.len() != self.legal.len() {
            return false;
        }

        let mut unmatched = self.legal.clone();
        candidates.iter().all(|candidate| {
            match unmatched.iter().position(|l| l == candidate) {
                Some(i) => {
                    unmatched.swap_remove(i);
                    true
                }
                None => false,
            }
        })
    }
}
