use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Observation text the platform reports before the full-stats handler has
/// produced anything.
pub const EMPTY_OBSERVATION: &str = "{}";

/// A timestamped observation record. The text is either `{}` or a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl Observation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            text: text.into(),
        }
    }

    /// True when the record carries more than the empty-object placeholder.
    pub fn is_meaningful(&self) -> bool {
        let trimmed = self.text.trim();
        !trimmed.is_empty() && trimmed != EMPTY_OBSERVATION
    }
}

/// Error record reported by the platform. Purely diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformError {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl PlatformError {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            text: text.into(),
        }
    }
}

/// One rendered frame plus the camera pose at render time.
///
/// Pixels are tightly packed 8-bit RGB, row-major. The buffer is shared so that
/// cloning a snapshot does not copy image data.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub timestamp: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Arc<Vec<u8>>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
    pub pitch: f64,
}

impl VideoFrame {
    pub fn rgb(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            timestamp: Utc::now(),
            width,
            height,
            channels: 3,
            pixels: Arc::new(pixels),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn with_pose(mut self, x: f64, y: f64, z: f64, yaw: f64, pitch: f64) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// Calculate the expected data size for validation
    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// Validate frame data integrity
    pub fn validate(&self) -> Result<(), String> {
        let expected = self.expected_size();
        if self.pixels.len() != expected {
            return Err(format!(
                "Frame data size mismatch: got {} bytes, expected {} bytes",
                self.pixels.len(),
                expected
            ));
        }
        Ok(())
    }
}

/// Immutable snapshot of everything the platform accumulated since the last
/// consuming read.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    pub has_mission_begun: bool,
    pub is_mission_running: bool,
    pub observations: Vec<Observation>,
    pub video_frames: Vec<VideoFrame>,
    pub errors: Vec<PlatformError>,
    pub number_of_observations_since_last_state: u64,
    pub number_of_video_frames_since_last_state: u64,
}

impl WorldState {
    /// A snapshot of a mission that is running and has nothing buffered yet.
    pub fn running() -> Self {
        Self {
            has_mission_begun: true,
            is_mission_running: true,
            ..Default::default()
        }
    }

    /// A snapshot of a mission that has begun and already finished.
    pub fn ended() -> Self {
        Self {
            has_mission_begun: true,
            is_mission_running: false,
            ..Default::default()
        }
    }

    pub fn with_observation(mut self, text: impl Into<String>) -> Self {
        self.observations.push(Observation::new(text));
        self.number_of_observations_since_last_state += 1;
        self
    }

    pub fn with_frame(mut self, frame: VideoFrame) -> Self {
        self.video_frames.push(frame);
        self.number_of_video_frames_since_last_state += 1;
        self
    }

    pub fn with_error(mut self, text: impl Into<String>) -> Self {
        self.errors.push(PlatformError::new(text));
        self
    }

    /// True when at least one observation is more than `{}`.
    pub fn has_meaningful_observation(&self) -> bool {
        self.observations.iter().any(Observation::is_meaningful)
    }

    pub fn latest_observation(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn latest_frame(&self) -> Option<&VideoFrame> {
        self.video_frames.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_not_meaningful() {
        assert!(!Observation::new("{}").is_meaningful());
        assert!(!Observation::new("  {}  ").is_meaningful());
        assert!(!Observation::new("").is_meaningful());
        assert!(Observation::new(r#"{"XPos": 1.0}"#).is_meaningful());
    }

    #[test]
    fn test_no_observations_counts_as_not_ready() {
        let state = WorldState::running();
        assert!(!state.has_meaningful_observation());

        let state = state.with_observation("{}").with_observation("{}");
        assert!(!state.has_meaningful_observation());

        let state = state.with_observation(r#"{"XPos": 0.5}"#);
        assert!(state.has_meaningful_observation());
        assert_eq!(state.number_of_observations_since_last_state, 3);
    }

    #[test]
    fn test_frame_validation() {
        let frame = VideoFrame::rgb(2, 2, vec![0; 12]);
        assert!(frame.validate().is_ok());

        let short = VideoFrame::rgb(2, 2, vec![0; 11]);
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_snapshot_clone_shares_pixels() {
        let state = WorldState::running().with_frame(VideoFrame::rgb(1, 1, vec![1, 2, 3]));
        let copy = state.clone();
        assert!(Arc::ptr_eq(
            &state.video_frames[0].pixels,
            &copy.video_frames[0].pixels
        ));
        assert_eq!(copy.number_of_video_frames_since_last_state, 1);
    }
}
