//! Running games concurrently
//!
//! - `instance`: one game ticking on its own thread
//! - `supervisor`: the registry that starts, stops, reports on and reaps games

mod instance;
mod supervisor;

pub use instance::{GameId, GameInstance, GameSnapshot, Status};
pub use supervisor::GameServer;
