//! Shape tests on a single hand in pixel space.

use crate::landmarks::{
    INDEX_MCP, INDEX_TIP, LANDMARK_COUNT, MIDDLE_MCP, MIDDLE_TIP, PINKY_MCP, PINKY_TIP, Point,
    RING_MCP, RING_TIP, WRIST,
};

pub const DEFAULT_EXTENSION_RATIO: f32 = 1.2;
pub const DEFAULT_MIN_EXTENDED_FINGERS: usize = 3;

/// (knuckle, tip) for index, middle, ring and pinky. The thumb is ignored.
const FINGERS: [(usize, usize); 4] = [
    (INDEX_MCP, INDEX_TIP),
    (MIDDLE_MCP, MIDDLE_TIP),
    (RING_MCP, RING_TIP),
    (PINKY_MCP, PINKY_TIP),
];

/// Parameters of the open-palm test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPalm {
    pub extension_ratio: f32,
    pub min_extended: usize,
}

impl Default for OpenPalm {
    fn default() -> Self {
        Self {
            extension_ratio: DEFAULT_EXTENSION_RATIO,
            min_extended: DEFAULT_MIN_EXTENDED_FINGERS,
        }
    }
}

fn is_complete(hand: &[Point]) -> bool {
    hand.len() >= LANDMARK_COUNT
}

/// A finger counts as extended when its tip sits vertically further from the
/// wrist than `extension_ratio` times its knuckle does.
pub fn extended_fingers(hand: &[Point], extension_ratio: f32) -> usize {
    if !is_complete(hand) {
        return 0;
    }
    let wrist = hand[WRIST];
    FINGERS
        .iter()
        .filter(|&&(mcp, tip)| {
            let tip_dy = (hand[tip].y - wrist.y).abs();
            let mcp_dy = (hand[mcp].y - wrist.y).abs();
            tip_dy > mcp_dy * extension_ratio
        })
        .count()
}

/// Fails closed on hands with fewer than 21 landmarks.
pub fn is_open(hand: &[Point], params: OpenPalm) -> bool {
    is_complete(hand) && extended_fingers(hand, params.extension_ratio) >= params.min_extended
}

/// Mean of wrist, index knuckle and pinky knuckle.
pub fn palm_center(hand: &[Point]) -> Option<Point> {
    if !is_complete(hand) {
        return None;
    }
    let (w, i, p) = (hand[WRIST], hand[INDEX_MCP], hand[PINKY_MCP]);
    Some(Point::new((w.x + i.x + p.x) / 3.0, (w.y + i.y + p.y) / 3.0))
}

/// Wrist to middle fingertip.
pub fn hand_size(hand: &[Point]) -> Option<f32> {
    if !is_complete(hand) {
        return None;
    }
    Some(hand[WRIST].distance(hand[MIDDLE_TIP]))
}
