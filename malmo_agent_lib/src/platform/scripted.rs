use super::Platform;
use crate::{MissionConfig, RecordSpec, StartError, WorldState};
use std::collections::VecDeque;

/// One call the agent made against a `ScriptedPlatform`, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Start,
    Peek,
    Get,
    Command(String),
}

/// Platform that replays pre-built snapshots.
///
/// Start results, peek snapshots and get snapshots are separate queues. When a
/// snapshot queue runs dry its last entry repeats; an empty start queue means
/// every start succeeds.
#[derive(Debug, Default)]
pub struct ScriptedPlatform {
    start_results: VecDeque<Result<(), StartError>>,
    peeks: VecDeque<WorldState>,
    gets: VecDeque<WorldState>,
    last_peek: Option<WorldState>,
    last_get: Option<WorldState>,
    calls: Vec<PlatformCall>,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_results<I>(mut self, results: I) -> Self
    where
        I: IntoIterator<Item = Result<(), StartError>>,
    {
        self.start_results.extend(results);
        self
    }

    pub fn with_peeks<I: IntoIterator<Item = WorldState>>(mut self, states: I) -> Self {
        self.peeks.extend(states);
        self
    }

    pub fn with_gets<I: IntoIterator<Item = WorldState>>(mut self, states: I) -> Self {
        self.gets.extend(states);
        self
    }

    pub fn calls(&self) -> &[PlatformCall] {
        &self.calls
    }

    pub fn start_attempts(&self) -> usize {
        self.count(|c| matches!(c, PlatformCall::Start))
    }

    pub fn peek_count(&self) -> usize {
        self.count(|c| matches!(c, PlatformCall::Peek))
    }

    pub fn get_count(&self) -> usize {
        self.count(|c| matches!(c, PlatformCall::Get))
    }

    pub fn sent_commands(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PlatformCall::Command(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&PlatformCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn next_from(queue: &mut VecDeque<WorldState>, last: &mut Option<WorldState>) -> WorldState {
        if let Some(state) = queue.pop_front() {
            *last = Some(state.clone());
            return state;
        }
        last.clone().unwrap_or_default()
    }
}

impl Platform for ScriptedPlatform {
    fn start_mission(
        &mut self,
        _mission: &MissionConfig,
        _record: &RecordSpec,
    ) -> Result<(), StartError> {
        self.calls.push(PlatformCall::Start);
        self.start_results.pop_front().unwrap_or(Ok(()))
    }

    fn peek_world_state(&mut self) -> WorldState {
        self.calls.push(PlatformCall::Peek);
        Self::next_from(&mut self.peeks, &mut self.last_peek)
    }

    fn get_world_state(&mut self) -> WorldState {
        self.calls.push(PlatformCall::Get);
        Self::next_from(&mut self.gets, &mut self.last_get)
    }

    fn send_command(&mut self, command: &str) {
        self.calls.push(PlatformCall::Command(command.to_string()));
    }
}
