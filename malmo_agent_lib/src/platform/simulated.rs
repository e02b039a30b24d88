use super::Platform;
use crate::{
    AgentCommand, AgentPose, MissionConfig, Observation, PlatformError, RecordSpec, StartError,
    VideoFrame, WorldState,
};
use eyre::Result;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Tuning for the in-process mock simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Accessor calls after a successful start before the mission begins
    pub begin_after_polls: u32,
    /// Ticks that report `{}` before full stats appear
    pub empty_observation_ticks: u64,
    /// Emit a frame every N ticks, 0 disables video
    pub frame_every_ticks: u64,
    /// Mission ends after this many ticks
    pub mission_ticks: u64,
    /// Simulated seconds per tick
    pub tick_seconds: f64,
    /// Blocks per second at `move 1`
    pub walk_speed: f64,
    /// Frames kept between consuming reads
    pub max_buffered_frames: usize,
    /// The first N start requests fail
    pub failing_start_attempts: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            begin_after_polls: 5,
            empty_observation_ticks: 2,
            frame_every_ticks: 1,
            mission_ticks: 60,
            tick_seconds: 0.05,
            walk_speed: 4.317,
            max_buffered_frames: 4,
            failing_start_attempts: 0,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.tick_seconds > 0.0 && self.tick_seconds.is_finite()) {
            return Err(eyre::eyre!(
                "simulation.tick_seconds must be positive (got {})",
                self.tick_seconds
            ));
        }

        if self.max_buffered_frames == 0 {
            return Err(eyre::eyre!("simulation.max_buffered_frames must be at least 1"));
        }

        Ok(())
    }
}

/// Deterministic stand-in for the native agent host.
///
/// Time advances one tick per accessor call once the mission has begun, so
/// the agent's polling drives the simulation. Movement commands set
/// continuous velocities that are integrated every tick.
pub struct SimulatedPlatform {
    config: SimulationConfig,
    mission: Option<MissionConfig>,
    start_attempts: u32,
    polls_since_start: u32,
    begun: bool,
    running: bool,
    tick: u64,
    pose: AgentPose,
    pitch: f64,
    move_velocity: f64,
    strafe_velocity: f64,
    turn_velocity: f64,
    turn_speed_degs: f64,
    latest_observation: Option<Observation>,
    frames: VecDeque<VideoFrame>,
    errors: Vec<PlatformError>,
    observations_since_last_state: u64,
    frames_since_last_state: u64,
}

impl SimulatedPlatform {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            mission: None,
            start_attempts: 0,
            polls_since_start: 0,
            begun: false,
            running: false,
            tick: 0,
            pose: AgentPose::new(0.0, 0.0, 0.0, 0.0),
            pitch: 0.0,
            move_velocity: 0.0,
            strafe_velocity: 0.0,
            turn_velocity: 0.0,
            turn_speed_degs: 0.0,
            latest_observation: None,
            frames: VecDeque::new(),
            errors: Vec::new(),
            observations_since_last_state: 0,
            frames_since_last_state: 0,
        }
    }

    pub fn pose(&self) -> AgentPose {
        self.pose
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn start_attempts(&self) -> u32 {
        self.start_attempts
    }

    fn advance(&mut self) {
        if self.mission.is_none() {
            return;
        }

        if !self.begun {
            self.polls_since_start += 1;
            if self.polls_since_start >= self.config.begin_after_polls {
                self.begun = true;
                self.running = true;
                info!("Simulated mission has begun");
            }
            return;
        }

        if !self.running {
            return;
        }

        self.tick += 1;
        self.integrate(self.config.tick_seconds);
        self.emit_observation();

        let every = self.config.frame_every_ticks;
        if every > 0 && self.tick % every == 0 {
            self.emit_frame();
        }

        if self.tick >= self.config.mission_ticks {
            self.running = false;
            info!("Simulated mission ended after {} ticks", self.tick);
        }
    }

    fn integrate(&mut self, dt: f64) {
        self.pose.yaw =
            (self.pose.yaw + self.turn_velocity * self.turn_speed_degs * dt).rem_euclid(360.0);

        // Yaw 0 faces +z, right hand points to -x
        let yaw = self.pose.yaw.to_radians();
        let forward = Vector3::new(-yaw.sin(), 0.0, yaw.cos());
        let right = Vector3::new(-yaw.cos(), 0.0, -yaw.sin());
        let step = (forward * self.move_velocity + right * self.strafe_velocity)
            * self.config.walk_speed
            * dt;

        self.pose.x += step.x;
        self.pose.z += step.z;
    }

    fn emit_observation(&mut self) {
        let text = if self.tick <= self.config.empty_observation_ticks {
            "{}".to_string()
        } else {
            let name = self
                .mission
                .as_ref()
                .map(|m| m.agent.name.clone())
                .unwrap_or_default();
            json!({
                "XPos": self.pose.x,
                "YPos": self.pose.y,
                "ZPos": self.pose.z,
                "Yaw": self.pose.yaw,
                "Pitch": self.pitch,
                "Name": name,
                "Life": 20.0,
                "TimeAlive": self.tick,
            })
            .to_string()
        };

        self.latest_observation = Some(Observation::new(text));
        self.observations_since_last_state += 1;
    }

    fn emit_frame(&mut self) {
        let Some(video) = self
            .mission
            .as_ref()
            .and_then(|m| m.agent.handlers.video)
        else {
            return;
        };

        let pixels = render_scene(video.width, video.height, &self.pose);
        let frame = VideoFrame::rgb(video.width, video.height, pixels).with_pose(
            self.pose.x,
            self.pose.y,
            self.pose.z,
            self.pose.yaw,
            self.pitch,
        );

        self.frames.push_back(frame);
        while self.frames.len() > self.config.max_buffered_frames {
            self.frames.pop_front();
        }
        self.frames_since_last_state += 1;
    }

    fn snapshot(&self) -> WorldState {
        WorldState {
            has_mission_begun: self.begun,
            is_mission_running: self.running,
            observations: self.latest_observation.iter().cloned().collect(),
            video_frames: self.frames.iter().cloned().collect(),
            errors: self.errors.clone(),
            number_of_observations_since_last_state: self.observations_since_last_state,
            number_of_video_frames_since_last_state: self.frames_since_last_state,
        }
    }
}

/// Sky above the horizon, ground below; colours shift with pose so that
/// consecutive frames differ when the agent moves.
fn render_scene(width: u32, height: u32, pose: &AgentPose) -> Vec<u8> {
    let sky = [
        110u8,
        170u8,
        (200.0 + pose.yaw / 360.0 * 55.0).clamp(0.0, 255.0) as u8,
    ];
    let ground = [
        (60.0 + (pose.x * 10.0).rem_euclid(100.0)) as u8,
        150u8,
        (40.0 + (pose.z * 10.0).rem_euclid(100.0)) as u8,
    ];

    let horizon = height / 2;
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for row in 0..height {
        let colour = if row < horizon { sky } else { ground };
        for _ in 0..width {
            pixels.extend_from_slice(&colour);
        }
    }
    pixels
}

impl Platform for SimulatedPlatform {
    fn start_mission(
        &mut self,
        mission: &MissionConfig,
        _record: &RecordSpec,
    ) -> Result<(), StartError> {
        self.start_attempts += 1;
        if self.start_attempts <= self.config.failing_start_attempts {
            return Err(StartError(format!(
                "no client available to run the mission (attempt {})",
                self.start_attempts
            )));
        }

        let placement = mission.agent.placement;
        self.pose = AgentPose::new(placement.x, placement.y, placement.z, placement.yaw);
        self.pitch = placement.pitch;
        self.turn_speed_degs = mission
            .agent
            .handlers
            .continuous_movement_turn_speed_degs
            .map(f64::from)
            .unwrap_or(0.0);
        self.mission = Some(mission.clone());
        self.polls_since_start = 0;
        self.begun = false;
        self.running = false;
        self.tick = 0;

        info!("Simulated mission '{}' starting", mission.summary);
        Ok(())
    }

    fn peek_world_state(&mut self) -> WorldState {
        self.advance();
        self.snapshot()
    }

    fn get_world_state(&mut self) -> WorldState {
        self.advance();
        let state = self.snapshot();

        self.latest_observation = None;
        self.frames.clear();
        self.errors.clear();
        self.observations_since_last_state = 0;
        self.frames_since_last_state = 0;

        state
    }

    fn send_command(&mut self, command: &str) {
        let parsed = AgentCommand::parse(command);
        debug!("Simulation received command: {}", command);

        match parsed {
            AgentCommand::Move(v) => self.move_velocity = v.clamp(-1.0, 1.0),
            AgentCommand::Strafe(v) => self.strafe_velocity = v.clamp(-1.0, 1.0),
            AgentCommand::Turn(v) => self.turn_velocity = v.clamp(-1.0, 1.0),
            AgentCommand::Pitch(v) => {
                self.pitch = (self.pitch + v * self.turn_speed_degs * self.config.tick_seconds)
                    .clamp(-90.0, 90.0)
            }
            AgentCommand::Jump(_)
            | AgentCommand::Crouch(_)
            | AgentCommand::Attack(_)
            | AgentCommand::Use(_) => {}
            AgentCommand::Raw(text) => {
                self.errors
                    .push(PlatformError::new(format!("Unknown command: {}", text)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_mission() -> MissionConfig {
        let mut mission = MissionConfig::default();
        if let Some(video) = mission.agent.handlers.video.as_mut() {
            video.width = 8;
            video.height = 4;
        }
        mission
    }

    fn started(config: SimulationConfig) -> SimulatedPlatform {
        let mut sim = SimulatedPlatform::new(config);
        sim.start_mission(&small_mission(), &RecordSpec::none())
            .unwrap();
        sim
    }

    #[test]
    fn test_nothing_happens_before_start() {
        let mut sim = SimulatedPlatform::new(SimulationConfig::default());
        for _ in 0..10 {
            let state = sim.peek_world_state();
            assert!(!state.has_mission_begun);
            assert!(!state.is_mission_running);
        }
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn test_begins_after_configured_polls() {
        let mut sim = started(SimulationConfig {
            begin_after_polls: 3,
            ..Default::default()
        });

        assert!(!sim.get_world_state().has_mission_begun);
        assert!(!sim.get_world_state().has_mission_begun);
        let state = sim.get_world_state();
        assert!(state.has_mission_begun);
        assert!(state.is_mission_running);
    }

    #[test]
    fn test_failing_start_attempts() {
        let mut sim = SimulatedPlatform::new(SimulationConfig {
            failing_start_attempts: 2,
            ..Default::default()
        });
        let mission = small_mission();

        assert!(sim.start_mission(&mission, &RecordSpec::none()).is_err());
        assert!(sim.start_mission(&mission, &RecordSpec::none()).is_err());
        assert!(sim.start_mission(&mission, &RecordSpec::none()).is_ok());
        assert_eq!(sim.start_attempts(), 3);
    }

    #[test]
    fn test_empty_observations_then_full_stats() {
        let mut sim = started(SimulationConfig {
            begin_after_polls: 1,
            empty_observation_ticks: 2,
            ..Default::default()
        });
        sim.peek_world_state(); // begins

        let first = sim.peek_world_state();
        assert!(!first.has_meaningful_observation());
        let second = sim.peek_world_state();
        assert!(!second.has_meaningful_observation());
        let third = sim.peek_world_state();
        assert!(third.has_meaningful_observation());

        let pose = AgentPose::from_observation(third.latest_observation().unwrap()).unwrap();
        assert_eq!(pose, AgentPose::new(-1065.5, 346.5, -1.5, 0.0));
    }

    #[test]
    fn test_get_consumes_and_peek_does_not() {
        let mut sim = started(SimulationConfig {
            begin_after_polls: 1,
            max_buffered_frames: 10,
            ..Default::default()
        });
        sim.peek_world_state();

        sim.peek_world_state();
        let peeked = sim.peek_world_state();
        assert_eq!(peeked.video_frames.len(), 2);
        assert_eq!(peeked.number_of_video_frames_since_last_state, 2);

        let consumed = sim.get_world_state();
        assert_eq!(consumed.video_frames.len(), 3);
        assert!(consumed.video_frames.len() >= peeked.video_frames.len());

        let after = sim.peek_world_state();
        assert_eq!(after.video_frames.len(), 1);
        assert_eq!(after.number_of_video_frames_since_last_state, 1);
    }

    #[test]
    fn test_frame_buffer_is_bounded() {
        let mut sim = started(SimulationConfig {
            begin_after_polls: 1,
            max_buffered_frames: 2,
            ..Default::default()
        });
        for _ in 0..6 {
            sim.peek_world_state();
        }
        let state = sim.peek_world_state();
        assert_eq!(state.video_frames.len(), 2);
        assert_eq!(state.number_of_video_frames_since_last_state, 6);
        assert!(state.video_frames.iter().all(|f| f.validate().is_ok()));
    }

    #[test]
    fn test_move_advances_along_heading() {
        let mut sim = started(SimulationConfig {
            begin_after_polls: 1,
            tick_seconds: 1.0,
            walk_speed: 1.0,
            ..Default::default()
        });
        sim.peek_world_state();

        sim.send_command("move 1");
        sim.peek_world_state();
        let pose = sim.pose();
        assert!((pose.z - (-0.5)).abs() < 1e-9);
        assert!((pose.x - (-1065.5)).abs() < 1e-9);

        sim.send_command("move 0");
        sim.send_command("strafe 1");
        sim.peek_world_state();
        let pose = sim.pose();
        assert!((pose.x - (-1066.5)).abs() < 1e-9);
    }

    #[test]
    fn test_mission_ends_after_tick_budget() {
        let mut sim = started(SimulationConfig {
            begin_after_polls: 1,
            mission_ticks: 3,
            ..Default::default()
        });
        sim.peek_world_state();

        assert!(sim.peek_world_state().is_mission_running);
        assert!(sim.peek_world_state().is_mission_running);
        assert!(!sim.peek_world_state().is_mission_running);
        assert!(!sim.get_world_state().is_mission_running);
        assert_eq!(sim.tick(), 3);
    }

    #[test]
    fn test_unknown_command_reports_error() {
        let mut sim = started(SimulationConfig::default());
        sim.send_command("teleport 0 0 0");
        let state = sim.get_world_state();
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].text.contains("teleport"));
        assert!(sim.get_world_state().errors.is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(SimulationConfig::default().validate().is_ok());
        let bad = SimulationConfig {
            tick_seconds: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
