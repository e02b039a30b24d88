use crate::{ActionPolicy, MissionConfig, SimulationConfig};
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Everything one driver run needs, as read from a single TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub mission: MissionConfig,
    pub agent: AgentConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub sync: SyncConfig,
    pub retry: RetryConfig,
    pub images: ImageConfig,
    pub actions: ActionConfig,
    /// Allowed disagreement between observation pose and render pose
    pub pose_tolerance: f64,
}

/// Poll and settle timings, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub poll_interval_ms: u64,
    /// Warm-up after the first observation and frame, lets the renderer stabilise
    pub initial_settle_ms: u64,
    /// Pause after each readiness phase of a step
    pub step_settle_ms: u64,
    /// Unbounded when unset
    pub mission_begin_timeout_ms: Option<u64>,
    /// Applies to each readiness poll loop; unbounded when unset
    pub readiness_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub enabled: bool,
    pub output_dir: PathBuf,
    pub write_hsv: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    pub policy: ActionPolicy,
    pub velocity: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            retry: RetryConfig::default(),
            images: ImageConfig::default(),
            actions: ActionConfig::default(),
            pose_tolerance: 0.01,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            initial_settle_ms: 15_000,
            step_settle_ms: 2_000,
            mission_begin_timeout_ms: None,
            readiness_timeout_ms: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 2_000,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: PathBuf::from("img"),
            write_hsv: true,
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            policy: ActionPolicy::Alternate,
            velocity: 0.1,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn step_settle(&self) -> Duration {
        Duration::from_millis(self.step_settle_ms)
    }

    pub fn mission_begin_timeout(&self) -> Option<Duration> {
        self.mission_begin_timeout_ms.map(Duration::from_millis)
    }

    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.readiness_timeout_ms.map(Duration::from_millis)
    }

    /// Zero out every settle delay, keeping polling and timeouts as they are.
    pub fn without_settle(mut self) -> Self {
        self.initial_settle_ms = 0;
        self.step_settle_ms = 0;
        self
    }
}

impl RetryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(eyre::eyre!("retry.max_attempts must be at least 1"));
        }

        if self.sync.poll_interval_ms == 0 {
            return Err(eyre::eyre!("sync.poll_interval_ms must be positive"));
        }

        if self.pose_tolerance.is_nan() || self.pose_tolerance < 0.0 {
            return Err(eyre::eyre!(
                "pose_tolerance must be a non-negative number (got {})",
                self.pose_tolerance
            ));
        }

        if !self.actions.velocity.is_finite() || self.actions.velocity.abs() > 1.0 {
            return Err(eyre::eyre!(
                "actions.velocity must be within [-1, 1] (got {})",
                self.actions.velocity
            ));
        }

        Ok(())
    }
}

impl RunConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.mission.validate()?;
        self.agent.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_timings() {
        let config = AgentConfig::default();
        assert_eq!(config.sync.initial_settle(), Duration::from_secs(15));
        assert_eq!(config.sync.step_settle(), Duration::from_secs(2));
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.sync.mission_begin_timeout(), None);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.actions.policy, ActionPolicy::Alternate);
        assert_eq!(config.actions.velocity, 0.1);
        assert_eq!(config.pose_tolerance, 0.01);
        assert!(config.images.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_run_config_partial_override() {
        let config: RunConfig = toml::from_str(
            r#"
            [agent.sync]
            step_settle_ms = 250
            readiness_timeout_ms = 5000

            [agent.actions]
            policy = "simultaneous"

            [agent.images]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.sync.step_settle(), Duration::from_millis(250));
        assert_eq!(config.agent.sync.initial_settle(), Duration::from_secs(15));
        assert_eq!(
            config.agent.sync.readiness_timeout(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(config.agent.actions.policy, ActionPolicy::Simultaneous);
        assert_eq!(config.agent.actions.velocity, 0.1);
        assert!(!config.agent.images.enabled);
        assert_eq!(config.mission.summary, "Simple Env");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let mut config = AgentConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_out_of_range_velocity() {
        let mut config = AgentConfig::default();
        config.actions.velocity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_without_settle() {
        let sync = SyncConfig::default().without_settle();
        assert_eq!(sync.initial_settle(), Duration::ZERO);
        assert_eq!(sync.step_settle(), Duration::ZERO);
        assert_eq!(sync.poll_interval(), Duration::from_millis(100));
    }
}
