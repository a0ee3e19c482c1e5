//! Session layer for kibitz: option registry, session bridge, host surface
//! and the UCI text protocol.

pub mod command;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod host;
pub mod option;
pub mod registry;
pub mod session;
pub mod time;

pub use defaults::{OptionEvent, OptionEvents, register_defaults};
pub use engine::{Flow, UciEngine};
pub use error::{BridgeError, OptionError, UciError};
pub use host::{HostSession, MoveToken};
pub use option::{OptionKind, OptionSpec, UciOption};
pub use registry::OptionRegistry;
pub use session::{SessionBridge, SessionConfig, SessionState};
