//! Poll-until-ready synchronisation against the platform's world state.

pub mod agent;
pub mod clock;
pub mod poll;
pub mod startup;

pub use agent::*;
pub use clock::*;
pub use poll::*;
pub use startup::*;
