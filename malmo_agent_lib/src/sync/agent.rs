use super::{poll_until, start_mission_with_retry, wait_for_mission_begin, Accessor, Clock, PollPolicy};
use crate::frames::FrameRecorder;
use crate::platform::Platform;
use crate::{
    AgentConfig, AgentPose, MissionConfig, MissionError, RecordSpec, SyncError, SyncResult,
    WaitPhase, WorldState,
};
use chrono::Local;
use tracing::{debug, error, info, info_span};
use uuid::Uuid;

/// Outcome of one complete mission run.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionSummary {
    pub run_id: Uuid,
    pub start_attempts: u32,
    pub steps: u64,
    pub frames_written: u64,
    pub final_pose: Option<AgentPose>,
    pub platform_errors: usize,
}

/// Agent session: owns the platform handle and all per-run state.
///
/// The synchronisation protocol is strictly sequential. Every command goes
/// out only after the previous step's consuming read has completed.
pub struct Agent<P: Platform, C: Clock> {
    platform: P,
    clock: C,
    config: AgentConfig,
    run_id: Uuid,
    run_label: String,
    action_count: u64,
    repetition: u32,
    previous_pose: Option<AgentPose>,
    recorder: Option<FrameRecorder>,
    platform_errors: usize,
}

impl<P: Platform, C: Clock> Agent<P, C> {
    pub fn new(platform: P, clock: C, config: AgentConfig) -> Self {
        Self {
            platform,
            clock,
            config,
            run_id: Uuid::new_v4(),
            run_label: FrameRecorder::run_label(Local::now()),
            action_count: 0,
            repetition: 0,
            previous_pose: None,
            recorder: None,
            platform_errors: 0,
        }
    }

    /// Override the timestamp label used for the image directory.
    pub fn with_run_label(mut self, label: impl Into<String>) -> Self {
        self.run_label = label.into();
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    pub fn repetition(&self) -> u32 {
        self.repetition
    }

    pub fn previous_pose(&self) -> Option<AgentPose> {
        self.previous_pose
    }

    pub fn recorder(&self) -> Option<&FrameRecorder> {
        self.recorder.as_ref()
    }

    pub fn into_parts(self) -> (P, C) {
        (self.platform, self.clock)
    }

    /// Start, wait for the mission to begin, then run it to completion.
    pub fn execute(
        &mut self,
        mission: &MissionConfig,
        record: &RecordSpec,
    ) -> Result<MissionSummary, MissionError> {
        let span = info_span!("mission", run = %self.run_id);
        let _enter = span.enter();

        let attempts = start_mission_with_retry(
            &mut self.platform,
            &mut self.clock,
            mission,
            record,
            &self.config.retry,
        )?;
        wait_for_mission_begin(&mut self.platform, &mut self.clock, &self.config.sync)?;

        let mut summary = self.run_mission()?;
        summary.start_attempts = attempts;
        Ok(summary)
    }

    /// Initial sync, then act and sync until the mission stops running.
    pub fn run_mission(&mut self) -> SyncResult<MissionSummary> {
        let mut state = self.wait_for_initial_state()?;
        self.report_errors(&state);

        let mut steps = 0;
        while state.is_mission_running {
            self.act();
            state = self.wait_for_next_state()?;
            steps += 1;
            self.report_errors(&state);
        }

        info!("Mission ended after {} step(s)", steps);

        Ok(MissionSummary {
            run_id: self.run_id,
            start_attempts: 0,
            steps,
            frames_written: self.recorder.as_ref().map_or(0, |r| r.files_written()),
            final_pose: self.previous_pose,
            platform_errors: self.platform_errors,
        })
    }

    /// Before any command: wait for a real observation, then a fresh frame.
    pub fn wait_for_initial_state(&mut self) -> SyncResult<WorldState> {
        let policy = PollPolicy::readiness(&self.config.sync);

        let state = poll_until(
            &mut self.platform,
            &mut self.clock,
            &policy,
            WaitPhase::InitialObservation,
            Accessor::Peek,
            |s| !s.is_mission_running || s.has_meaningful_observation(),
        )?;

        let frames_seen = state.number_of_video_frames_since_last_state;
        let state = if state.is_mission_running {
            poll_until(
                &mut self.platform,
                &mut self.clock,
                &policy,
                WaitPhase::InitialFrame,
                Accessor::Peek,
                |s| {
                    !s.is_mission_running
                        || s.number_of_video_frames_since_last_state != frames_seen
                },
            )?
        } else {
            state
        };

        if !state.is_mission_running {
            info!("Mission ended before the first observation");
            return Ok(self.platform.get_world_state());
        }

        self.clock.sleep(self.config.sync.initial_settle());
        info!("Started observing");

        let state = self.platform.get_world_state();
        if !state.is_mission_running {
            return Ok(state);
        }

        let Some(frame) = state.latest_frame() else {
            return Err(SyncError::NoVideoFrames);
        };

        let pose = observed_pose(&state)?;
        info!("Initial position: {}", pose);
        self.previous_pose = Some(pose);

        if self.config.images.enabled {
            let mut recorder = FrameRecorder::create(&self.config.images.output_dir, &self.run_label)?;
            recorder.write_baseline(frame)?;
            self.repetition += 1;
            self.recorder = Some(recorder);
        }

        Ok(state)
    }

    /// After a command: wait for an observation, then a frame, then consume.
    pub fn wait_for_next_state(&mut self) -> SyncResult<WorldState> {
        let policy = PollPolicy::readiness(&self.config.sync);
        let settle = self.config.sync.step_settle();

        debug!("Waiting for observation...");
        let state = poll_until(
            &mut self.platform,
            &mut self.clock,
            &policy,
            WaitPhase::StepObservation,
            Accessor::Peek,
            |s| !s.is_mission_running || s.has_meaningful_observation(),
        )?;
        if !state.is_mission_running {
            info!("Mission ended while waiting for observation");
            return Ok(self.platform.get_world_state());
        }
        self.clock.sleep(settle);

        debug!("Waiting for render...");
        let state = poll_until(
            &mut self.platform,
            &mut self.clock,
            &policy,
            WaitPhase::StepFrame,
            Accessor::Peek,
            |s| !s.is_mission_running || !s.video_frames.is_empty(),
        )?;
        if !state.is_mission_running {
            info!("Mission ended while waiting for render");
            return Ok(self.platform.get_world_state());
        }
        self.clock.sleep(settle);

        let frames_before = state.video_frames.len();
        let state = self.platform.get_world_state();
        if !state.is_mission_running {
            return Ok(state);
        }

        let Some(frame) = state.latest_frame() else {
            return Err(SyncError::NoVideoFrames);
        };
        let frames_after = state.video_frames.len();
        if frames_after < frames_before {
            return Err(SyncError::FrameCountRegressed {
                before: frames_before,
                after: frames_after,
            });
        }

        let current = observed_pose(&state)?;
        let rendered = AgentPose::from_frame(frame);
        info!("New position from observation: {}", current);
        info!("New position from render: {}", rendered);

        let discrepancy = current.discrepancy(&rendered);
        debug!(
            "Observation vs render: max delta {:.4}, within tolerance: {}",
            discrepancy.max_component(),
            current.agrees_with(&rendered, self.config.pose_tolerance)
        );
        if let Some(previous) = self.previous_pose {
            debug!("Moved {:.3} blocks since last step", previous.distance_to(&current));
        }
        self.previous_pose = Some(current);

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.write_step(frame, self.config.images.write_hsv)?;
        }

        Ok(state)
    }

    /// Dispatch this cycle's commands. Fire-and-forget.
    pub fn act(&mut self) {
        let actions = &self.config.actions;
        for command in actions.policy.commands_for(self.action_count, actions.velocity) {
            self.platform.send_command(&command.to_string());
        }
        self.action_count += 1;
        debug!("action_count = {}", self.action_count);
    }

    fn report_errors(&mut self, state: &WorldState) {
        for e in &state.errors {
            error!("Error: {}", e.text);
        }
        self.platform_errors += state.errors.len();
    }
}

/// Pose from the latest observation, the authoritative source.
fn observed_pose(state: &WorldState) -> SyncResult<AgentPose> {
    let observation = state.latest_observation().ok_or(SyncError::NoObservation)?;
    Ok(AgentPose::from_observation(observation)?)
}
