//! The agent host seam.
//!
//! The world simulation runs elsewhere and delivers state asynchronously. The
//! agent only ever sees it through these four calls.

pub mod scripted;
pub mod simulated;

pub use scripted::*;
pub use simulated::*;

use crate::{MissionConfig, RecordSpec, StartError, WorldState};

pub trait Platform {
    /// Ask the platform to start a mission. Errors are transient.
    fn start_mission(
        &mut self,
        mission: &MissionConfig,
        record: &RecordSpec,
    ) -> Result<(), StartError>;

    /// Latest snapshot without consuming it.
    fn peek_world_state(&mut self) -> WorldState;

    /// Everything accumulated since the previous `get_world_state`, consumed.
    fn get_world_state(&mut self) -> WorldState;

    /// Fire-and-forget command such as `"move 0.1"`.
    fn send_command(&mut self, command: &str);
}

impl<P: Platform + ?Sized> Platform for &mut P {
    fn start_mission(
        &mut self,
        mission: &MissionConfig,
        record: &RecordSpec,
    ) -> Result<(), StartError> {
        (**self).start_mission(mission, record)
    }

    fn peek_world_state(&mut self) -> WorldState {
        (**self).peek_world_state()
    }

    fn get_world_state(&mut self) -> WorldState {
        (**self).get_world_state()
    }

    fn send_command(&mut self, command: &str) {
        (**self).send_command(command)
    }
}
