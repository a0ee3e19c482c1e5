//! UCI command parsing.

use std::time::Duration;

use crate::error::UciError;

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` uses defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves until next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth only.
    pub depth: Option<u8>,
    /// Search for exactly this duration.
    pub movetime: Option<Duration>,
    /// Search this many nodes only.
    pub nodes: Option<u64>,
    /// Search until `stop` (no time limit).
    pub infinite: bool,
    /// Search in pondering mode. Treated like `infinite`.
    pub ponder: bool,
}

/// Arguments of a `position` command, not yet checked against any board.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSpec {
    /// Six-field FEN, or `None` for the standard start.
    pub fen: Option<String>,
    /// Moves to play from there, in coordinate notation.
    pub moves: Vec<String>,
}

/// A parsed UCI command.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// `uci` -- identify the engine and list options.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `setoption name <name> [value <value>]`.
    SetOption {
        /// Option name; may contain spaces.
        name: String,
        /// Value text; empty for buttons.
        value: String,
    },
    /// `position` -- set up a board position with optional moves applied.
    Position(PositionSpec),
    /// `go` -- search with given parameters.
    Go(GoParams),
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// `undo` -- take back the last move played with `position ... moves`.
    Undo,
    /// `d` -- print the current position.
    Display,
    /// `isdraw` -- report whether the position is drawn.
    IsDraw,
    /// Unrecognized command (silently ignored per UCI spec).
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Command::Unknown(String::new()));
    }

    match tokens[0] {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "undo" => Ok(Command::Undo),
        "d" => Ok(Command::Display),
        "isdraw" => Ok(Command::IsDraw),
        "setoption" => parse_setoption(&tokens[1..]),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        _ => Ok(Command::Unknown(tokens[0].to_string())),
    }
}

/// Parse the `setoption` command arguments.
///
/// Names and values may span several tokens; they are rejoined with single
/// spaces.
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    let Some((&"name", rest)) = tokens.split_first() else {
        return Err(UciError::MalformedSetOption);
    };
    let (name, value) = match rest.iter().position(|&t| t == "value") {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, &[][..]),
    };
    if name.is_empty() {
        return Err(UciError::MalformedSetOption);
    }
    Ok(Command::SetOption {
        name: name.join(" "),
        value: value.join(" "),
    })
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-string> [moves e2e4 d7d5 ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.is_empty() {
        return Err(UciError::MalformedPosition);
    }

    let (fen, rest) = if tokens[0] == "startpos" {
        (None, &tokens[1..])
    } else if tokens[0] == "fen" {
        // FEN is 6 space-separated fields
        let fields = tokens[1..]
            .iter()
            .take_while(|&&t| t != "moves")
            .count();
        if fields != 6 {
            return Err(UciError::InvalidFen {
                fen: tokens[1..1 + fields].join(" "),
            });
        }
        (Some(tokens[1..7].join(" ")), &tokens[7..])
    } else {
        return Err(UciError::MalformedPosition);
    };

    let moves = match rest.split_first() {
        Some((&"moves", moves)) => moves.iter().map(|m| m.to_string()).collect(),
        _ => Vec::new(),
    };

    Ok(Command::Position(PositionSpec { fen, moves }))
}

/// Parse the `go` command arguments.
///
/// Supports: wtime, btime, winc, binc, movestogo, depth, movetime,
/// nodes, infinite, ponder. Unknown tokens are silently skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "wtime" => {
                params.wtime = Some(parse_millis(tokens.get(i + 1), "wtime")?);
                i += 2;
            }
            "btime" => {
                params.btime = Some(parse_millis(tokens.get(i + 1), "btime")?);
                i += 2;
            }
            "winc" => {
                params.winc = Some(parse_millis(tokens.get(i + 1), "winc")?);
                i += 2;
            }
            "binc" => {
                params.binc = Some(parse_millis(tokens.get(i + 1), "binc")?);
                i += 2;
            }
            "movestogo" => {
                params.movestogo = Some(parse_int(tokens.get(i + 1), "movestogo")?);
                i += 2;
            }
            "depth" => {
                params.depth = Some(parse_int(tokens.get(i + 1), "depth")?);
                i += 2;
            }
            "movetime" => {
                params.movetime = Some(parse_millis(tokens.get(i + 1), "movetime")?);
                i += 2;
            }
            "nodes" => {
                params.nodes = Some(parse_int(tokens.get(i + 1), "nodes")?);
                i += 2;
            }
            "infinite" => {
                params.infinite = true;
                i += 1;
            }
            "ponder" => {
                params.ponder = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    Ok(Command::Go(params))
}

/// Parse a millisecond value from a token.
fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    parse_int(token, param).map(Duration::from_millis)
}

/// Parse an integer value from a token.
fn parse_int<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("uci").unwrap(), Command::Uci);
        assert_eq!(parse_command("isready").unwrap(), Command::IsReady);
        assert_eq!(parse_command("ucinewgame").unwrap(), Command::UciNewGame);
        assert_eq!(parse_command("stop").unwrap(), Command::Stop);
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
        assert_eq!(parse_command("undo").unwrap(), Command::Undo);
        assert_eq!(parse_command("d").unwrap(), Command::Display);
        assert_eq!(parse_command("  isdraw  ").unwrap(), Command::IsDraw);
    }

    #[test]
    fn parse_position_startpos() {
        let cmd = parse_command("position startpos").unwrap();
        assert_eq!(
            cmd,
            Command::Position(PositionSpec {
                fen: None,
                moves: Vec::new()
            })
        );
    }

    #[test]
    fn parse_position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5").unwrap();
        match cmd {
            Command::Position(spec) => assert_eq!(spec.moves, ["e2e4", "e7e5"]),
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn parse_position_fen_with_moves() {
        let cmd = parse_command(
            "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1 moves c7c5",
        )
        .unwrap();
        match cmd {
            Command::Position(spec) => {
                assert_eq!(
                    spec.fen.as_deref(),
                    Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                );
                assert_eq!(spec.moves, ["c7c5"]);
            }
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn parse_position_short_fen() {
        let result = parse_command("position fen 8/8/8/8/8/8/8/8 w - - moves e2e4");
        assert!(matches!(result, Err(UciError::InvalidFen { .. })));
    }

    #[test]
    fn parse_position_missing_keyword() {
        assert!(matches!(
            parse_command("position"),
            Err(UciError::MalformedPosition)
        ));
        assert!(matches!(
            parse_command("position somewhere"),
            Err(UciError::MalformedPosition)
        ));
    }

    #[test]
    fn parse_setoption_multiword() {
        let cmd = parse_command("setoption name Analysis Contempt value Off").unwrap();
        assert_eq!(
            cmd,
            Command::SetOption {
                name: "Analysis Contempt".to_string(),
                value: "Off".to_string(),
            }
        );
    }

    #[test]
    fn parse_setoption_button() {
        let cmd = parse_command("setoption name Clear Hash").unwrap();
        assert_eq!(
            cmd,
            Command::SetOption {
                name: "Clear Hash".to_string(),
                value: String::new(),
            }
        );
    }

    #[test]
    fn parse_setoption_malformed() {
        assert!(matches!(
            parse_command("setoption Hash 32"),
            Err(UciError::MalformedSetOption)
        ));
        assert!(matches!(
            parse_command("setoption name value 3"),
            Err(UciError::MalformedSetOption)
        ));
    }

    #[test]
    fn parse_go_bare_defaults() {
        assert_eq!(parse_command("go").unwrap(), Command::Go(GoParams::default()));
    }

    #[test]
    fn parse_go_clock() {
        let cmd = parse_command("go wtime 300000 btime 300000 winc 2000 binc 2000 movestogo 20")
            .unwrap();
        match cmd {
            Command::Go(params) => {
                assert_eq!(params.wtime, Some(Duration::from_millis(300000)));
                assert_eq!(params.btime, Some(Duration::from_millis(300000)));
                assert_eq!(params.winc, Some(Duration::from_millis(2000)));
                assert_eq!(params.binc, Some(Duration::from_millis(2000)));
                assert_eq!(params.movestogo, Some(20));
            }
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_fixed_limits() {
        let cmd = parse_command("go depth 6 nodes 1000000 movetime 5000 infinite").unwrap();
        match cmd {
            Command::Go(params) => {
                assert_eq!(params.depth, Some(6));
                assert_eq!(params.nodes, Some(1_000_000));
                assert_eq!(params.movetime, Some(Duration::from_millis(5000)));
                assert!(params.infinite);
            }
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_bad_values() {
        assert!(matches!(
            parse_command("go wtime"),
            Err(UciError::MissingGoValue { .. })
        ));
        assert!(matches!(
            parse_command("go depth abc"),
            Err(UciError::InvalidGoValue { .. })
        ));
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert_eq!(
            parse_command("foobar").unwrap(),
            Command::Unknown("foobar".to_string())
        );
        assert_eq!(parse_command("").unwrap(), Command::Unknown(String::new()));
    }
}
