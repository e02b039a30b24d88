pub mod command;
pub mod config;
pub mod mission;
pub mod pose;
pub mod world_state;

pub use command::*;
pub use config::*;
pub use mission::*;
pub use pose::*;
pub use world_state::*;
