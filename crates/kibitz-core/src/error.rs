//! Errors crossing the engine contract.

/// Failures reported by an [`Engine`](crate::Engine) implementation.
///
/// The bridge passes these through untouched; the text is the engine's own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The board encoding could not be turned into a position.
    #[error("invalid FEN \"{fen}\": {reason}")]
    InvalidFen {
        /// The rejected encoding.
        fen: String,
        /// The engine's explanation.
        reason: String,
    },

    /// The engine refused to play a move in the current position.
    #[error("move {uci_move} cannot be played: {reason}")]
    RejectedMove {
        /// The move in coordinate notation.
        uci_move: String,
        /// The engine's explanation.
        reason: String,
    },

    /// The search workers could not be started.
    #[error("search could not start: {0}")]
    SearchUnavailable(String),
}

/// Failures while waiting on a [`PendingSearch`](crate::PendingSearch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The engine dropped its reply handle without delivering a move.
    #[error("search ended without delivering a move")]
    Abandoned,
}
