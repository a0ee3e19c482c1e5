//! The standard option table and how its values reach a session.
//!
//! Callbacks never touch the session directly. They post an
//! [`OptionEvent`] that the owner of both the registry and the session
//! drains after each write and applies with [`sync_bridge`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use kibitz_core::{Engine, EngineSettings, SearchLimits};
use tracing::debug;

use crate::error::{BridgeError, OptionError};
use crate::option::{OptionSpec, UciOption};
use crate::registry::OptionRegistry;
use crate::session::{SessionBridge, SessionConfig};

/// Largest hash size accepted, in megabytes.
pub const MAX_HASH_MB: i64 = if cfg!(target_pointer_width = "64") {
    131_072
} else {
    2048
};

/// Something the session owner must do after an option changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionEvent {
    /// Threads or Hash changed.
    EngineSettings,
    /// The Clear Hash button was pressed.
    ClearHash,
    /// Chess960 mode or a search limit changed.
    SessionConfig,
    /// The debug log target changed. Empty means logging off.
    DebugLogFile(String),
}

/// Receiving side of the events posted by option callbacks.
#[derive(Debug)]
pub struct OptionEvents {
    rx: Receiver<OptionEvent>,
}

impl OptionEvents {
    /// Every event posted since the last call.
    pub fn drain(&self) -> Vec<OptionEvent> {
        self.rx.try_iter().collect()
    }
}

fn post(tx: &Sender<OptionEvent>, event: OptionEvent) -> impl Fn(&UciOption) + Send + 'static {
    let tx = tx.clone();
    move |_| {
        if tx.send(event.clone()).is_err() {
            debug!("option event dropped: receiver gone");
        }
    }
}

/// Register the standard options.
///
/// `skill` and `min_think_ms` set the defaults of "Skill Level" and
/// "Minimum Thinking Time"; hosts pick them per game.
pub fn register_defaults(
    registry: &mut OptionRegistry,
    skill: f64,
    min_think_ms: f64,
) -> Result<OptionEvents, OptionError> {
    let (tx, rx) = mpsc::channel();

    let log_tx = tx.clone();
    registry.register(
        "Debug Log File",
        OptionSpec::string("").on_change(move |o| {
            if log_tx.send(OptionEvent::DebugLogFile(o.current_value())).is_err() {
                debug!("option event dropped: receiver gone");
            }
        }),
    )?;
    registry.register("Contempt", OptionSpec::spin(24.0, -100, 100))?;
    registry.register(
        "Analysis Contempt",
        OptionSpec::combo("Both", ["Off", "White", "Black", "Both"]),
    )?;
    registry.register(
        "Threads",
        OptionSpec::spin(1.0, 1, 512).on_change(post(&tx, OptionEvent::EngineSettings)),
    )?;
    registry.register(
        "Hash",
        OptionSpec::spin(16.0, 1, MAX_HASH_MB).on_change(post(&tx, OptionEvent::EngineSettings)),
    )?;
    registry.register(
        "Clear Hash",
        OptionSpec::button().on_change(post(&tx, OptionEvent::ClearHash)),
    )?;
    registry.register("Ponder", OptionSpec::check(false))?;
    registry.register("MultiPV", OptionSpec::spin(1.0, 1, 500))?;
    registry.register(
        "Skill Level",
        OptionSpec::spin(skill, 0, 20).on_change(post(&tx, OptionEvent::SessionConfig)),
    )?;
    registry.register("Move Overhead", OptionSpec::spin(30.0, 0, 5000))?;
    registry.register(
        "Minimum Thinking Time",
        OptionSpec::spin(min_think_ms, 0, 5000).on_change(post(&tx, OptionEvent::SessionConfig)),
    )?;
    registry.register("Slow Mover", OptionSpec::spin(84.0, 10, 1000))?;
    registry.register("nodestime", OptionSpec::spin(0.0, 0, 10000))?;
    registry.register(
        "UCI_Chess960",
        OptionSpec::check(false).on_change(post(&tx, OptionEvent::SessionConfig)),
    )?;
    registry.register("UCI_AnalyseMode", OptionSpec::check(false))?;
    registry.register("SyzygyPath", OptionSpec::string("<empty>"))?;
    registry.register("SyzygyProbeDepth", OptionSpec::spin(1.0, 1, 100))?;
    registry.register("Syzygy50MoveRule", OptionSpec::check(true))?;
    registry.register("SyzygyProbeLimit", OptionSpec::spin(7.0, 0, 7))?;

    Ok(OptionEvents { rx })
}

/// Thread and cache settings from the registry.
pub fn engine_settings(registry: &OptionRegistry) -> EngineSettings {
    let defaults = EngineSettings::default();
    EngineSettings {
        threads: registry
            .i64("Threads")
            .map_or(defaults.threads, |n| n.max(1) as usize),
        hash_mb: registry
            .i64("Hash")
            .map_or(defaults.hash_mb, |n| n.max(1) as usize),
    }
}

/// Session settings from the registry.
pub fn session_config(registry: &OptionRegistry) -> SessionConfig {
    let limits = SearchLimits::default();
    SessionConfig {
        chess960: registry.bool("UCI_Chess960").unwrap_or(false),
        limits: SearchLimits {
            skill: registry
                .i64("Skill Level")
                .map_or(limits.skill, |n| n.clamp(0, 20) as u8),
            min_think: registry
                .i64("Minimum Thinking Time")
                .map_or(limits.min_think, |ms| Duration::from_millis(ms.max(0) as u64)),
            ..limits
        },
    }
}

/// Time reserved per move for communication lag.
pub fn move_overhead(registry: &OptionRegistry) -> Duration {
    let ms = registry.i64("Move Overhead").unwrap_or(30);
    Duration::from_millis(ms.max(0) as u64)
}

/// Apply one option event to `bridge`.
///
/// [`OptionEvent::DebugLogFile`] is left to the caller, which owns the output.
pub fn sync_bridge<E: Engine>(
    event: &OptionEvent,
    registry: &OptionRegistry,
    bridge: &mut SessionBridge<E>,
) -> Result<(), BridgeError> {
    match event {
        OptionEvent::EngineSettings => bridge.configure_engine(&engine_settings(registry)),
        OptionEvent::ClearHash => bridge.clear_engine(),
        OptionEvent::SessionConfig => bridge.set_config(session_config(registry)),
        OptionEvent::DebugLogFile(_) => Ok(()),
    }
}
