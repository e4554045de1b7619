// Trunkwatch detection engine
// Leaves first: extract → window → transfer / spam → compose → orchestrator.

pub mod compose;
pub mod extract;
pub mod orchestrator;
pub mod spam;
pub mod transfer;
pub mod window;

pub use orchestrator::{Engine, EngineStats};
