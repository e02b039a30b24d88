//! # Malmo Agent Library
//!
//! Drives an agent through a Malmo mission: starts the mission with bounded
//! retry, keeps every command in lock-step with the platform's world state,
//! and saves the received frames in BGR and HSV form.
//!
//! The platform sits behind the [`Platform`] trait and time behind [`Clock`],
//! so the whole protocol runs against [`SimulatedPlatform`] or a
//! [`ScriptedPlatform`] without a game client.

pub mod error;
pub mod frames;
pub mod platform;
pub mod sync;
pub mod types;
pub mod utils;

// Re-export everything for convenience
pub use error::*;
pub use frames::*;
pub use platform::*;
pub use sync::*;
pub use types::*;
pub use utils::*;
