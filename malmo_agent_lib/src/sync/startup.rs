use super::{poll_until, Accessor, Clock, PollPolicy};
use crate::platform::Platform;
use crate::{
    MissionConfig, RecordSpec, RetryConfig, StartupError, SyncConfig, SyncResult, WaitPhase,
    WorldState,
};
use tracing::{error, info, warn};

/// Start the mission, retrying transient failures with a constant delay.
///
/// Returns the number of attempts used. No delay follows the final attempt.
pub fn start_mission_with_retry<P, C>(
    platform: &mut P,
    clock: &mut C,
    mission: &MissionConfig,
    record: &RecordSpec,
    retry: &RetryConfig,
) -> Result<u32, StartupError>
where
    P: Platform + ?Sized,
    C: Clock + ?Sized,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match platform.start_mission(mission, record) {
            Ok(()) => {
                info!("Mission start accepted on attempt {}/{}", attempt, max_attempts);
                return Ok(attempt);
            }
            Err(e) if attempt >= max_attempts => {
                error!("Error starting mission: {}", e);
                return Err(StartupError::RetriesExhausted {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{} to start mission failed: {} (retrying in {:?})",
                    attempt,
                    max_attempts,
                    e,
                    retry.retry_delay()
                );
                clock.sleep(retry.retry_delay());
            }
        }
    }
}

/// Consume world state every poll interval until the mission has begun.
///
/// Platform errors seen while waiting are logged and otherwise ignored.
pub fn wait_for_mission_begin<P, C>(
    platform: &mut P,
    clock: &mut C,
    sync: &SyncConfig,
) -> SyncResult<WorldState>
where
    P: Platform + ?Sized,
    C: Clock + ?Sized,
{
    info!("Waiting for the mission to start");

    let state = poll_until(
        platform,
        clock,
        &PollPolicy::mission_begin(sync),
        WaitPhase::MissionBegin,
        Accessor::Get,
        |state| {
            for e in &state.errors {
                error!("Error: {}", e.text);
            }
            state.has_mission_begun
        },
    )?;

    info!("Mission running");
    Ok(state)
}
