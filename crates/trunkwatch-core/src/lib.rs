// Trunkwatch Core — detection engine for vehicle storage activity logs.
//
// Reads glove box / trunk logs posted by a game server's log bot, and raises
// alerts for rapid repeated actions and for hand-offs between two players
// through the same container.

pub mod atoms;
pub mod channels;
pub mod config;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::*;
pub use channels::{AlertSink, EventSource, StreamSource};
pub use config::MonitorConfig;
pub use engine::{Engine, EngineStats};
