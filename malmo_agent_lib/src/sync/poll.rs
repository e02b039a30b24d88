use super::Clock;
use crate::platform::Platform;
use crate::{SyncConfig, SyncError, SyncResult, WaitPhase, WorldState};
use std::time::Duration;
use tracing::debug;

/// Which accessor a poll loop reads through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// Non-consuming `peek_world_state`
    Peek,
    /// Consuming `get_world_state`
    Get,
}

impl Accessor {
    fn read<P: Platform + ?Sized>(self, platform: &mut P) -> WorldState {
        match self {
            Accessor::Peek => platform.peek_world_state(),
            Accessor::Get => platform.get_world_state(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn readiness(sync: &SyncConfig) -> Self {
        Self {
            interval: sync.poll_interval(),
            timeout: sync.readiness_timeout(),
        }
    }

    pub fn mission_begin(sync: &SyncConfig) -> Self {
        Self {
            interval: sync.poll_interval(),
            timeout: sync.mission_begin_timeout(),
        }
    }
}

/// Read world state until `ready` accepts a snapshot and return that snapshot.
///
/// Sleeps `policy.interval` between reads. When a timeout is set and has
/// elapsed after a rejected read, fails with `SyncError::Timeout`.
pub fn poll_until<P, C, F>(
    platform: &mut P,
    clock: &mut C,
    policy: &PollPolicy,
    phase: WaitPhase,
    accessor: Accessor,
    mut ready: F,
) -> SyncResult<WorldState>
where
    P: Platform + ?Sized,
    C: Clock + ?Sized,
    F: FnMut(&WorldState) -> bool,
{
    let started = clock.elapsed();
    let mut polls: u64 = 0;

    loop {
        let state = accessor.read(platform);
        polls += 1;

        if ready(&state) {
            debug!("{} ready after {} poll(s)", phase, polls);
            return Ok(state);
        }

        let waited = clock.elapsed().saturating_sub(started);
        if let Some(limit) = policy.timeout {
            if waited >= limit {
                return Err(SyncError::Timeout { phase, waited });
            }
        }

        clock.sleep(policy.interval);
    }
}
