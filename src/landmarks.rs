//! Detector output as it arrives on the wire, and its pixel-space view.

use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Landmarks per hand in the MediaPipe hand model.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

/// One tracked point, normalized to [0,1] of the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }
}

/// Pixel-space point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Every hand the detector reported for one video frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub hands: Vec<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
}

impl DetectionFrame {
    pub fn new(width: f32, height: f32, hands: Vec<Vec<Landmark>>) -> Self {
        Self {
            width,
            height,
            hands,
            timestamp_ms: None,
        }
    }

    pub fn empty(width: f32, height: f32) -> Self {
        Self::new(width, height, Vec::new())
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    /// Short hands pass; they are classified as closed further down.
    pub fn validate(&self) -> Result<(), FrameError> {
        let dim_ok = |v: f32| v.is_finite() && v > 0.0;
        if !dim_ok(self.width) || !dim_ok(self.height) {
            return Err(FrameError::BadDimensions {
                width: self.width,
                height: self.height,
            });
        }
        for (h, hand) in self.hands.iter().enumerate() {
            for (i, lm) in hand.iter().enumerate() {
                let z_ok = lm.z.map_or(true, f32::is_finite);
                if !lm.x.is_finite() || !lm.y.is_finite() || !z_ok {
                    return Err(FrameError::NonFiniteLandmark { hand: h, index: i });
                }
            }
        }
        Ok(())
    }

    /// De-normalize every hand into pixel space.
    pub fn pixel_hands(&self) -> impl Iterator<Item = Vec<Point>> + '_ {
        self.hands.iter().map(|hand| {
            hand.iter()
                .map(|lm| Point::new(lm.x * self.width, lm.y * self.height))
                .collect()
        })
    }
}
