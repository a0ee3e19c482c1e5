//! Engine-side move representation, bit-packed into a u16.

use std::fmt;

use crate::piece_kind::PieceKind;
use crate::square::Square;

const SRC_MASK: u16 = 0x003F;
const DST_MASK: u16 = 0x0FC0;
const PROMO_MASK: u16 = 0x3000;
const KIND_MASK: u16 = 0xC000;
const DST_SHIFT: u32 = 6;
const PROMO_SHIFT: u32 = 12;
const KIND_SHIFT: u32 = 14;

/// The category of a chess move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveKind {
    Normal = 0,
    Promotion = 1,
    EnPassant = 2,
    Castling = 3,
}

impl MoveKind {
    const fn bits(self) -> u16 {
        (self as u16) << KIND_SHIFT
    }
}

/// The piece a pawn promotes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PromotionPiece {
    Knight = 0,
    Bishop = 1,
    Rook = 2,
    Queen = 3,
}

impl PromotionPiece {
    /// All promotion pieces in index order.
    pub const ALL: [PromotionPiece; 4] = [
        PromotionPiece::Knight,
        PromotionPiece::Bishop,
        PromotionPiece::Rook,
        PromotionPiece::Queen,
    ];

    /// Convert to the corresponding [`PieceKind`].
    pub const fn to_piece_kind(self) -> PieceKind {
        match self {
            PromotionPiece::Knight => PieceKind::Knight,
            PromotionPiece::Bishop => PieceKind::Bishop,
            PromotionPiece::Rook => PieceKind::Rook,
            PromotionPiece::Queen => PieceKind::Queen,
        }
    }

    /// The promotion target for a piece kind, if a pawn may become one.
    pub const fn from_piece_kind(kind: PieceKind) -> Option<PromotionPiece> {
        match kind {
            PieceKind::Knight => Some(PromotionPiece::Knight),
            PieceKind::Bishop => Some(PromotionPiece::Bishop),
            PieceKind::Rook => Some(PromotionPiece::Rook),
            PieceKind::Queen => Some(PromotionPiece::Queen),
            PieceKind::Pawn | PieceKind::King => None,
        }
    }

    const fn bits(self) -> u16 {
        (self as u16) << PROMO_SHIFT
    }
}

/// A chess move encoded in 16 bits.
///
/// ```text
/// bits  0-5:  source square      (0-63)
/// bits  6-11: destination square (0-63)
/// bits 12-13: promotion piece    (Knight=0, Bishop=1, Rook=2, Queen=3)
/// bits 14-15: move kind          (Normal=0, Promotion=1, EnPassant=2, Castling=3)
/// ```
///
/// Castling is stored the way engines generate it: the king "captures" its
/// own rook, so the destination is the rook's square. The notation codec
/// rewrites it to the king's landing square when talking to the outside.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u16);

impl Move {
    /// "No move available" sentinel (a1a1). Never legal.
    pub const NONE: Move = Move(0);

    /// Null move sentinel (b1b1). Never legal, and distinct from [`Move::NONE`].
    pub const NULL: Move = Move(65);

    /// Create a normal (quiet or capture) move.
    pub const fn new(source: Square, dest: Square) -> Move {
        Move((source.index() as u16) | ((dest.index() as u16) << DST_SHIFT))
    }

    /// Create a promotion move.
    pub const fn new_promotion(source: Square, dest: Square, promo: PromotionPiece) -> Move {
        Move(
            (source.index() as u16)
                | ((dest.index() as u16) << DST_SHIFT)
                | promo.bits()
                | MoveKind::Promotion.bits(),
        )
    }

    /// Create an en passant capture.
    pub const fn new_en_passant(source: Square, dest: Square) -> Move {
        Move(
            (source.index() as u16)
                | ((dest.index() as u16) << DST_SHIFT)
                | MoveKind::EnPassant.bits(),
        )
    }

    /// Create a castling move from the king's square to `dest`.
    ///
    /// Engines pass the rook's square; normalized moves carry the king's
    /// landing square instead.
    pub const fn new_castle(king: Square, dest: Square) -> Move {
        Move(
            (king.index() as u16)
                | ((dest.index() as u16) << DST_SHIFT)
                | MoveKind::Castling.bits(),
        )
    }

    /// Rebuild a move from its packed value.
    pub const fn from_raw(raw: u16) -> Move {
        Move(raw)
    }

    /// The packed 16-bit value.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Extract the source square.
    pub const fn source(self) -> Square {
        Square::from_index_unchecked((self.0 & SRC_MASK) as u8)
    }

    /// Extract the destination square.
    pub const fn dest(self) -> Square {
        Square::from_index_unchecked(((self.0 & DST_MASK) >> DST_SHIFT) as u8)
    }

    /// Extract the move kind.
    pub const fn kind(self) -> MoveKind {
        match (self.0 & KIND_MASK) >> KIND_SHIFT {
            0 => MoveKind::Normal,
            1 => MoveKind::Promotion,
            2 => MoveKind::EnPassant,
            _ => MoveKind::Castling,
        }
    }

    /// Extract the promotion piece.
    ///
    /// Only meaningful when `kind() == MoveKind::Promotion`.
    pub const fn promotion_piece(self) -> PromotionPiece {
        match (self.0 & PROMO_MASK) >> PROMO_SHIFT {
            0 => PromotionPiece::Knight,
            1 => PromotionPiece::Bishop,
            2 => PromotionPiece::Rook,
            _ => PromotionPiece::Queen,
        }
    }

    /// Return `true` for either sentinel.
    pub const fn is_sentinel(self) -> bool {
        self.0 == Move::NONE.0 || self.0 == Move::NULL.0
    }

    /// Return `true` if this is a promotion move.
    pub const fn is_promotion(self) -> bool {
        matches!(self.kind(), MoveKind::Promotion)
    }

    /// Return `true` if this is an en passant capture.
    pub const fn is_en_passant(self) -> bool {
        matches!(self.kind(), MoveKind::EnPassant)
    }

    /// Return `true` if this is a castling move.
    pub const fn is_castle(self) -> bool {
        matches!(self.kind(), MoveKind::Castling)
    }
}

impl fmt::Display for Move {
    /// Plain coordinate form without any castling rewrite; use
    /// [`crate::notation::encode`] for protocol output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Move::NONE {
            write!(f, "(none)")
        } else if *self == Move::NULL {
            write!(f, "0000")
        } else if self.is_promotion() {
            write!(
                f,
                "{}{}{}",
                self.source(),
                self.dest(),
                self.promotion_piece().to_piece_kind().letter()
            )
        } else {
            write!(f, "{}{}", self.source(), self.dest())
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({} kind={:?})", self, self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::{Move, MoveKind, PromotionPiece};
    use crate::piece_kind::PieceKind;
    use crate::square::Square;

    #[test]
    fn size_of_move() {
        assert_eq!(std::mem::size_of::<Move>(), 2);
    }

    #[test]
    fn normal_move_fields() {
        let mv = Move::new(Square::E2, Square::E4);
        assert_eq!(mv.source(), Square::E2);
        assert_eq!(mv.dest(), Square::E4);
        assert_eq!(mv.kind(), MoveKind::Normal);
        assert!(!mv.is_promotion());
        assert!(!mv.is_castle());
        assert!(!mv.is_sentinel());
    }

    #[test]
    fn promotion_all_pieces() {
        for promo in PromotionPiece::ALL {
            let mv = Move::new_promotion(Square::E7, Square::E8, promo);
            assert_eq!(mv.kind(), MoveKind::Promotion);
            assert_eq!(mv.promotion_piece(), promo);
            assert_eq!(mv.dest(), Square::E8);
        }
    }

    #[test]
    fn castle_keeps_given_destination() {
        let raw = Move::new_castle(Square::E1, Square::H1);
        assert!(raw.is_castle());
        assert_eq!(raw.source(), Square::E1);
        assert_eq!(raw.dest(), Square::H1);
    }

    #[test]
    fn sentinels_are_distinct() {
        assert_ne!(Move::NONE, Move::NULL);
        assert!(Move::NONE.is_sentinel());
        assert!(Move::NULL.is_sentinel());
        assert_eq!(Move::NULL.source(), Square::B1);
        assert_eq!(Move::NULL.dest(), Square::B1);
    }

    #[test]
    fn raw_roundtrip_preserves_kind() {
        let mv = Move::new_en_passant(Square::E5, Square::D6);
        assert_eq!(Move::from_raw(mv.raw()), mv);
        assert!(Move::from_raw(mv.raw()).is_en_passant());
    }

    #[test]
    fn display_forms() {
        assert_eq!(Move::new(Square::G1, Square::F3).to_string(), "g1f3");
        assert_eq!(
            Move::new_promotion(Square::A7, Square::A8, PromotionPiece::Knight).to_string(),
            "a7a8n"
        );
        assert_eq!(Move::NONE.to_string(), "(none)");
        assert_eq!(Move::NULL.to_string(), "0000");
    }

    #[test]
    fn promotion_piece_kind_mapping() {
        for promo in PromotionPiece::ALL {
            assert_eq!(PromotionPiece::from_piece_kind(promo.to_piece_kind()), Some(promo));
        }
        assert_eq!(PromotionPiece::from_piece_kind(PieceKind::King), None);
        assert_eq!(PromotionPiece::from_piece_kind(PieceKind::Pawn), None);
    }
}
