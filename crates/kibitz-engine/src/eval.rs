//! Static scoring used to rank root moves.

use shakmaty::{Chess, Color, Piece, Position, Role};

/// Score of a move that delivers checkmate.
pub const MATE_SCORE: i32 = 30_000;

/// Bonus for a move that gives check.
const CHECK_BONUS: i32 = 10;

const PIECE_VALUES: [(Role, i32); 5] = [
    (Role::Pawn, 100),
    (Role::Knight, 320),
    (Role::Bishop, 330),
    (Role::Rook, 500),
    (Role::Queen, 900),
];

/// Total material of `color` in centipawns.
pub fn material(chess: &Chess, color: Color) -> i32 {
    let board = chess.board();
    PIECE_VALUES
        .iter()
        .map(|&(role, value)| board.by_piece(Piece { color, role }).count() as i32 * value)
        .sum()
}

/// Score the position reached after the side to move in `parent` played,
/// from that side's point of view.
pub fn score_child(parent: &Chess, child: &Chess) -> i32 {
    if child.is_checkmate() {
        return MATE_SCORE;
    }
    if child.is_stalemate() || child.is_insufficient_material() {
        return 0;
    }

    let us = parent.turn();
    let balance = material(child, us) - material(child, !us);
    if child.is_check() {
        balance + CHECK_BONUS
    } else {
        balance
    }
}
