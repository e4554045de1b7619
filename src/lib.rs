// Trunkwatch — live monitor
// Discord gateway in, engine in the middle, Discord REST out.

pub mod discord;
pub mod http;
pub mod monitor;
