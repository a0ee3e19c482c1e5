//! Error types for options, sessions and the text protocol.

use kibitz_core::{EngineError, SearchError};

/// Reasons an option write or registration is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptionError {
    /// No option with this name exists.
    #[error("no such option: {name}")]
    Unknown {
        /// The requested name.
        name: String,
    },

    /// An option with this name (ignoring case) is already registered.
    #[error("option already registered: {name}")]
    Duplicate {
        /// The rejected name.
        name: String,
    },

    /// Only buttons accept an empty value.
    #[error("empty value for option {name}")]
    EmptyValue {
        /// The option name.
        name: String,
    },

    /// A check option got something other than `true` or `false`.
    #[error("option {name} expects true or false, got \"{value}\"")]
    NotBoolean {
        /// The option name.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// A spin option got a value that is not a finite number.
    #[error("option {name} expects a number, got \"{value}\"")]
    NotANumber {
        /// The option name.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// A spin option got a number outside its bounds.
    #[error("option {name} value {value} is outside {min}..={max}")]
    OutOfRange {
        /// The option name.
        name: String,
        /// The rejected number.
        value: f64,
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },
}

/// Contract violations and delegated failures of a session.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The session has no position yet, or was released.
    #[error("session is not initialized")]
    NotInitialized,

    /// A search is outstanding; the position must not change until it is collected.
    #[error("a search is already in flight")]
    SearchInFlight,

    /// `finish_search` was called without a matching `begin_search`.
    #[error("no search is in flight")]
    NoSearchInFlight,

    /// `undo` was called with no moves to take back.
    #[error("no moves to undo")]
    EmptyHistory,

    /// The move is not legal in the current position.
    #[error("illegal move: {uci_move}")]
    IllegalMove {
        /// The move in coordinate notation.
        uci_move: String,
    },

    /// A host passed a square index outside 0..64.
    #[error("invalid square index: {0}")]
    InvalidSquare(u8),

    /// The engine reported a failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The search ended without a result.
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Errors that can occur during protocol handling.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The `position` command is missing `startpos` or `fen` keyword.
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    /// A `fen` position does not have six fields.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The FEN text that was given.
        fen: String,
    },

    /// The `setoption` command has no `name` part.
    #[error("malformed setoption command")]
    MalformedSetOption,

    /// A `go` parameter is missing its value.
    #[error("missing value for go parameter {param}")]
    MissingGoValue {
        /// The parameter name.
        param: String,
    },

    /// A `go` parameter has a value that does not parse.
    #[error("invalid value for go parameter {param}: {value}")]
    InvalidGoValue {
        /// The parameter name.
        param: String,
        /// The rejected value.
        value: String,
    },

    /// Registering the option table failed.
    #[error(transparent)]
    Option(#[from] OptionError),

    /// The session rejected the command.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// An I/O error occurred while reading input or writing output.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_display() {
        let err = OptionError::OutOfRange {
            name: "Hash".to_string(),
            value: 0.0,
            min: 1,
            max: 1024,
        };
        assert_eq!(err.to_string(), "option Hash value 0 is outside 1..=1024");
    }

    #[test]
    fn engine_error_text_passes_through() {
        let inner = EngineError::SearchUnavailable("no threads".to_string());
        let expected = inner.to_string();
        let err: BridgeError = inner.into();
        assert_eq!(err.to_string(), expected);
    }
}
