//! Coordinate notation (`e2e4`, `a7a8q`) for engine moves.
//!
//! Engines store castling as "king captures own rook". In standard chess
//! the outside world expects the king's landing square instead (`e1g1`),
//! while chess960 keeps the rook square verbatim (`e1h1`). Every
//! conversion in this module applies that rewrite the same way.

use crate::chess_move::Move;
use crate::square::{CastleSide, Square};

/// Which way a castling move goes, judged from its source and destination.
///
/// Works for both the raw (rook square) and the normalized (landing square)
/// form in standard chess.
pub fn castle_side(mv: Move) -> CastleSide {
    if mv.dest() > mv.source() {
        CastleSide::KingSide
    } else {
        CastleSide::QueenSide
    }
}

/// The square the king lands on: file g for king side, file c for queen
/// side, on the king's own rank.
pub fn king_landing(mv: Move) -> Square {
    match castle_side(mv) {
        CastleSide::KingSide => mv.source().with_file(6),
        CastleSide::QueenSide => mv.source().with_file(2),
    }
}

/// Destination square as shown to the outside world.
pub fn display_dest(mv: Move, chess960: bool) -> Square {
    if mv.is_castle() && !chess960 {
        king_landing(mv)
    } else {
        mv.dest()
    }
}

/// Rewrite a raw castling move to its king-landing form.
///
/// Non-castling moves, sentinels, and chess960 castling pass through
/// unchanged. Normalizing twice gives the same move.
pub fn normalize(mv: Move, chess960: bool) -> Move {
    if mv.is_castle() && !chess960 {
        Move::new_castle(mv.source(), king_landing(mv))
    } else {
        mv
    }
}

/// Encode a move in coordinate notation.
///
/// `Move::NONE` encodes as `(none)` and `Move::NULL` as `0000`.
pub fn encode(mv: Move, chess960: bool) -> String {
    if mv == Move::NONE {
        return "(none)".to_string();
    }
    if mv == Move::NULL {
        return "0000".to_string();
    }

    let mut text = format!("{}{}", mv.source(), display_dest(mv, chess960));
    if mv.is_promotion() {
        text.push(mv.promotion_piece().to_piece_kind().letter());
    }
    text
}

/// Find the legal move whose encoding equals `text`.
///
/// Decoding never parses squares on its own: a move that is not in `legal`
/// does not decode. A trailing promotion letter may be uppercase.
pub fn decode(text: &str, legal: &[Move], chess960: bool) -> Option<Move> {
    let text = text.trim();
    let normalized = if text.len() == 5 && text.is_ascii() {
        let (squares, promo) = text.split_at(4);
        format!("{squares}{}", promo.to_ascii_lowercase())
    } else {
        text.to_string()
    };

    legal
        .iter()
        .copied()
        .find(|&mv| encode(mv, chess960) == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess_move::PromotionPiece;

    fn sample_legal() -> Vec<Move> {
        vec![
            Move::new(Square::E2, Square::E4),
            Move::new_castle(Square::E1, Square::H1),
            Move::new_castle(Square::E1, Square::A1),
            Move::new_promotion(Square::B7, Square::B8, PromotionPiece::Queen),
            Move::new_promotion(Square::B7, Square::B8, PromotionPiece::Knight),
        ]
    }

    #[test]
    fn encode_normal() {
        assert_eq!(encode(Move::new(Square::G1, Square::F3), false), "g1f3");
    }

    #[test]
    fn encode_sentinels() {
        assert_eq!(encode(Move::NONE, false), "(none)");
        assert_eq!(encode(Move::NULL, false), "0000");
        assert_eq!(encode(Move::NULL, true), "0000");
    }

    #[test]
    fn encode_castling_standard_rewrites_destination() {
        assert_eq!(encode(Move::new_castle(Square::E1, Square::H1), false), "e1g1");
        assert_eq!(encode(Move::new_castle(Square::E1, Square::A1), false), "e1c1");
        assert_eq!(encode(Move::new_castle(Square::E8, Square::H8), false), "e8g8");
        assert_eq!(encode(Move::new_castle(Square::E8, Square::A8), false), "e8c8");
    }

    #[test]
    fn encode_castling_chess960_keeps_rook_square() {
        assert_eq!(encode(Move::new_castle(Square::E1, Square::H1), true), "e1h1");
        assert_eq!(encode(Move::new_castle(Square::B1, Square::A1), true), "b1a1");
    }

    #[test]
    fn encode_promotion_suffix() {
        let mv = Move::new_promotion(Square::A7, Square::A8, PromotionPiece::Rook);
        assert_eq!(encode(mv, false), "a7a8r");
    }

    #[test]
    fn decode_matches_only_legal_moves() {
        let legal = sample_legal();
        assert_eq!(decode("e2e4", &legal, false), Some(legal[0]));
        assert_eq!(decode("d2d4", &legal, false), None);
        assert_eq!(decode("", &legal, false), None);
    }

    #[test]
    fn decode_castling_by_landing_square() {
        let legal = sample_legal();
        assert_eq!(decode("e1g1", &legal, false), Some(legal[1]));
        assert_eq!(decode("e1c1", &legal, false), Some(legal[2]));
        assert_eq!(decode("e1h1", &legal, false), None);
        assert_eq!(decode("e1h1", &legal, true), Some(legal[1]));
    }

    #[test]
    fn decode_uppercase_promotion() {
        let legal = sample_legal();
        assert_eq!(decode("b7b8Q", &legal, false), Some(legal[3]));
        assert_eq!(decode("b7b8n", &legal, false), Some(legal[4]));
        assert_eq!(decode("b7b8", &legal, false), None);
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = Move::new_castle(Square::E1, Square::A1);
        let once = normalize(raw, false);
        assert_eq!(once.dest(), Square::C1);
        assert!(once.is_castle());
        assert_eq!(normalize(once, false), once);
        assert_eq!(encode(once, false), encode(raw, false));
    }

    #[test]
    fn normalize_leaves_chess960_and_plain_moves() {
        let raw = Move::new_castle(Square::E1, Square::H1);
        assert_eq!(normalize(raw, true), raw);
        let plain = Move::new(Square::E2, Square::E4);
        assert_eq!(normalize(plain, false), plain);
    }

    #[test]
    fn castle_side_detection() {
        assert_eq!(castle_side(Move::new_castle(Square::E8, Square::H8)), CastleSide::KingSide);
        assert_eq!(castle_side(Move::new_castle(Square::E8, Square::A8)), CastleSide::QueenSide);
        assert_eq!(castle_side(Move::new_castle(Square::E1, Square::G1)), CastleSide::KingSide);
    }
}
