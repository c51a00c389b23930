//! Replays a message list against an agent for every wallet and reports usage for each exchange.

pub mod cycle;
pub mod exchange;
pub mod progress;
pub mod render;
pub mod schedule;

pub use cycle::run_cycle;
pub use exchange::{AgentClient, ExchangeRecord};
pub use progress::{ProgressBoard, ProgressEntry};
pub use render::{Dashboard, Render};
pub use schedule::Runner;
