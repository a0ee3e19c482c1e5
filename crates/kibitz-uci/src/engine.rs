//! Line-oriented UCI front end over a [`SessionBridge`].

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;

use kibitz_core::{Engine, Move, notation};
use tracing::{debug, info, warn};

use crate::command::{Command, GoParams, PositionSpec, parse_command};
use crate::defaults::{self, OptionEvent, OptionEvents};
use crate::error::UciError;
use crate::registry::OptionRegistry;
use crate::session::{SessionBridge, SessionState};
use crate::time::limits_from_go;

/// "Skill Level" default for protocol sessions.
pub const DEFAULT_SKILL: f64 = 20.0;

/// "Minimum Thinking Time" default for protocol sessions, in milliseconds.
pub const DEFAULT_MIN_THINK_MS: f64 = 20.0;

/// How long the loop waits on a running search before reading input again.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Whether the loop should keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The UCI engine, holding the session and its option table.
///
/// `go` starts a search and returns at once. Commands keep being handled in
/// order while it runs, and `bestmove` is printed when the move arrives or
/// when `stop` or `quit` ends the search.
pub struct UciEngine<E: Engine> {
    options: OptionRegistry,
    events: OptionEvents,
    bridge: SessionBridge<E>,
    log: Option<File>,
}

impl<E: Engine> UciEngine<E> {
    /// Create an engine at the starting position with the standard options.
    pub fn new(engine: E) -> Result<Self, UciError> {
        let mut options = OptionRegistry::new();
        let events =
            defaults::register_defaults(&mut options, DEFAULT_SKILL, DEFAULT_MIN_THINK_MS)?;
        let mut bridge = SessionBridge::new(engine, defaults::session_config(&options));
        bridge.configure_engine(&defaults::engine_settings(&options))?;
        bridge.initialize(None)?;
        Ok(Self {
            options,
            events,
            bridge,
            log: None,
        })
    }

    /// The session, for inspection.
    pub fn bridge(&self) -> &SessionBridge<E> {
        &self.bridge
    }

    /// The option table.
    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    /// Run the UCI loop, reading from stdin until `quit` or input closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<String>();

        // Spawn stdin reader thread
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if tx.send(trimmed.to_string()).is_err() {
                    break;
                }
            }
        });

        let stdout = io::stdout();
        loop {
            let line = if self.poll_search(&mut stdout.lock(), POLL_INTERVAL)? {
                match rx.try_recv() {
                    Ok(line) => line,
                    Err(TryRecvError::Empty) => continue,
                    Err(TryRecvError::Disconnected) => break,
                }
            } else {
                match rx.recv() {
                    Ok(line) => line,
                    Err(_) => break,
                }
            };
            if self.handle_line(&line, &mut stdout.lock())? == Flow::Quit {
                break;
            }
        }

        // Input may close mid-search; the GUI still gets its move.
        if let Err(e) = self.halt_search(&mut stdout.lock()) {
            warn!(error = %e, "search not collected at shutdown");
        }
        self.bridge.release();
        info!("kibitz shutting down");
        Ok(())
    }

    /// Process one input line, writing any response to `out`.
    ///
    /// Parse and session errors are logged and reported as `info string`;
    /// only output failures end the loop.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow, UciError> {
        self.log_line(">>", line);
        debug!(cmd = %line, "received UCI command");

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "UCI parse error");
                self.emit(out, &format!("info string {e}"))?;
                return Ok(Flow::Continue);
            }
        };

        match self.dispatch(command, out) {
            Ok(flow) => Ok(flow),
            Err(UciError::Io { source }) => Err(UciError::Io { source }),
            Err(e) => {
                warn!(error = %e, "command failed");
                self.emit(out, &format!("info string {e}"))?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Print `bestmove` if the running search delivers within `timeout`.
    ///
    /// Returns whether a search is still running afterwards.
    pub fn poll_search<W: Write>(
        &mut self,
        out: &mut W,
        timeout: Duration,
    ) -> Result<bool, UciError> {
        if self.bridge.state() != SessionState::SearchInFlight {
            return Ok(false);
        }
        match self.bridge.poll_search(timeout) {
            Ok(Some(mv)) => self.emit_bestmove(out, mv)?,
            Ok(None) => return Ok(true),
            Err(e) => {
                warn!(error = %e, "search failed");
                self.emit(out, &format!("info string {e}"))?;
            }
        }
        Ok(false)
    }

    fn dispatch<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow, UciError> {
        match command {
            Command::Uci => self.handle_uci(out)?,
            Command::IsReady => self.emit(out, "readyok")?,
            Command::UciNewGame => self.bridge.new_game()?,
            Command::SetOption { name, value } => self.handle_setoption(&name, &value)?,
            Command::Position(spec) => self.handle_position(spec)?,
            Command::Go(params) => self.handle_go(&params)?,
            Command::Undo => {
                self.bridge.undo()?;
            }
            Command::Display => self.handle_display(out)?,
            Command::IsDraw => {
                let draw = self.bridge.is_draw()?;
                self.emit(out, &format!("info string draw {draw}"))?;
            }
            Command::Stop => self.halt_search(out)?,
            Command::Quit => {
                self.halt_search(out)?;
                return Ok(Flow::Quit);
            }
            Command::Unknown(cmd) => {
                if !cmd.is_empty() {
                    debug!(cmd = %cmd, "ignoring unknown command");
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn handle_uci<W: Write>(&mut self, out: &mut W) -> Result<(), UciError> {
        self.emit(out, "id name kibitz")?;
        self.emit(out, "id author the kibitz developers")?;
        for line in self.options.render() {
            self.emit(out, &line)?;
        }
        self.emit(out, "uciok")
    }

    fn handle_setoption(&mut self, name: &str, value: &str) -> Result<(), UciError> {
        self.options.set(name, value);
        for event in self.events.drain() {
            match event {
                OptionEvent::DebugLogFile(path) => self.open_log(&path),
                other => defaults::sync_bridge(&other, &self.options, &mut self.bridge)?,
            }
        }
        Ok(())
    }

    fn handle_position(&mut self, spec: PositionSpec) -> Result<(), UciError> {
        match &spec.fen {
            Some(fen) => self.bridge.set_position(fen)?,
            None => self.bridge.set_position(kibitz_core::STARTING_FEN)?,
        }
        for text in &spec.moves {
            self.bridge.apply_uci(text)?;
        }
        Ok(())
    }

    fn handle_go(&mut self, params: &GoParams) -> Result<(), UciError> {
        let white_to_move = self
            .bridge
            .fen()?
            .split_whitespace()
            .nth(1)
            .is_none_or(|side| side == "w");
        let limits = limits_from_go(
            params,
            &self.bridge.config().limits,
            white_to_move,
            defaults::move_overhead(&self.options),
        );

        self.bridge.begin_search_with(&limits)?;
        Ok(())
    }

    /// End the running search, if any, and print its move.
    fn halt_search<W: Write>(&mut self, out: &mut W) -> Result<(), UciError> {
        if self.bridge.state() != SessionState::SearchInFlight {
            return Ok(());
        }
        self.bridge.stop_handle().stop();
        let mv = self.bridge.finish_search()?;
        self.emit_bestmove(out, mv)
    }

    fn emit_bestmove<W: Write>(&mut self, out: &mut W, mv: Move) -> Result<(), UciError> {
        let text = notation::encode(mv, self.bridge.config().chess960);
        self.emit(out, &format!("bestmove {text}"))
    }

    fn handle_display<W: Write>(&mut self, out: &mut W) -> Result<(), UciError> {
        let chess960 = self.bridge.config().chess960;
        let fen = self.bridge.fen()?;
        let moves: Vec<String> = self
            .bridge
            .moves()
            .iter()
            .map(|&mv| notation::encode(notation::normalize(mv, chess960), chess960))
            .collect();
        self.emit(out, &format!("Fen: {fen}"))?;
        self.emit(out, &format!("Moves: {}", moves.join(" ")))
    }

    fn emit<W: Write>(&mut self, out: &mut W, text: &str) -> Result<(), UciError> {
        writeln!(out, "{text}")?;
        out.flush()?;
        self.log_line("<<", text);
        Ok(())
    }

    fn open_log(&mut self, path: &str) {
        self.log = None;
        if path.is_empty() || path == "<empty>" {
            return;
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                info!(path, "debug log opened");
                self.log = Some(file);
            }
            Err(e) => warn!(path, error = %e, "could not open debug log"),
        }
    }

    fn log_line(&mut self, direction: &str, text: &str) {
        if let Some(file) = self.log.as_mut()
            && writeln!(file, "{direction} {text}").is_err()
        {
            warn!("debug log write failed, closing it");
            self.log = None;
        }
    }
}
