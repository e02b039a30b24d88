use crate::{Observation, VideoFrame};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent position and heading as reported by the platform.
///
/// `yaw` is in degrees, Minecraft convention (0 faces +z, 90 faces -x).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    #[serde(rename = "XPos")]
    pub x: f64,
    #[serde(rename = "YPos")]
    pub y: f64,
    #[serde(rename = "ZPos")]
    pub z: f64,
    #[serde(rename = "Yaw")]
    pub yaw: f64,
}

impl AgentPose {
    pub fn new(x: f64, y: f64, z: f64, yaw: f64) -> Self {
        Self { x, y, z, yaw }
    }

    /// Parse the full-stats observation payload. Extra keys are ignored.
    pub fn from_observation(observation: &Observation) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&observation.text)
    }

    /// The camera pose the frame was rendered from.
    pub fn from_frame(frame: &VideoFrame) -> Self {
        Self {
            x: frame.x,
            y: frame.y,
            z: frame.z,
            yaw: frame.yaw,
        }
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Euclidean distance between the two positions, heading ignored.
    pub fn distance_to(&self, other: &AgentPose) -> f64 {
        (self.position() - other.position()).norm()
    }

    /// Per-component absolute difference. Yaw difference is wrapped into [0, 180].
    pub fn discrepancy(&self, other: &AgentPose) -> PoseDiscrepancy {
        let raw_yaw = (self.yaw - other.yaw).rem_euclid(360.0);
        PoseDiscrepancy {
            dx: (self.x - other.x).abs(),
            dy: (self.y - other.y).abs(),
            dz: (self.z - other.z).abs(),
            dyaw: raw_yaw.min(360.0 - raw_yaw),
        }
    }

    /// Cross-validation between two pose sources.
    pub fn agrees_with(&self, other: &AgentPose, tolerance: f64) -> bool {
        self.discrepancy(other).max_component() <= tolerance
    }
}

impl fmt::Display for AgentPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.3}, {:.3}, {:.3}) yaw {:.1}",
            self.x, self.y, self.z, self.yaw
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseDiscrepancy {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub dyaw: f64,
}

impl PoseDiscrepancy {
    pub fn max_component(&self) -> f64 {
        self.dx.max(self.dy).max(self.dz).max(self.dyaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_from_full_stats() {
        let obs = Observation::new(
            r#"{"XPos": 4.5, "YPos": 1.0, "ZPos": -2.25, "Yaw": 90.0, "Pitch": 0.0, "Name": "SelfMod", "Life": 20.0}"#,
        );
        let pose = AgentPose::from_observation(&obs).unwrap();
        assert_eq!(pose, AgentPose::new(4.5, 1.0, -2.25, 90.0));
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let obs = Observation::new(r#"{"XPos": 4.5, "YPos": 1.0, "Yaw": 90.0}"#);
        assert!(AgentPose::from_observation(&obs).is_err());
        assert!(AgentPose::from_observation(&Observation::new("{}")).is_err());
    }

    #[test]
    fn test_pose_from_frame() {
        let frame = VideoFrame::rgb(1, 1, vec![0, 0, 0]).with_pose(1.0, 2.0, 3.0, 45.0, 10.0);
        assert_eq!(AgentPose::from_frame(&frame), AgentPose::new(1.0, 2.0, 3.0, 45.0));
    }

    #[test]
    fn test_yaw_discrepancy_wraps() {
        let a = AgentPose::new(0.0, 0.0, 0.0, 359.5);
        let b = AgentPose::new(0.0, 0.0, 0.0, -0.5);
        let d = a.discrepancy(&b);
        assert!(d.dyaw.abs() < 1e-9);

        let c = AgentPose::new(0.0, 0.0, 0.0, 180.0);
        assert!((a.discrepancy(&c).dyaw - 179.5).abs() < 1e-9);
    }

    #[test]
    fn test_agreement_within_tolerance() {
        let obs = AgentPose::new(-1065.5, 227.0, -1.5, 0.0);
        let render = AgentPose::new(-1065.495, 227.0, -1.505, 0.004);
        assert!(obs.agrees_with(&render, 0.01));

        let drifted = AgentPose::new(-1065.3, 227.0, -1.5, 0.0);
        assert!(!obs.agrees_with(&drifted, 0.01));
    }

    #[test]
    fn test_distance_ignores_yaw() {
        let a = AgentPose::new(0.0, 0.0, 0.0, 0.0);
        let b = AgentPose::new(3.0, 0.0, 4.0, 90.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }
}
