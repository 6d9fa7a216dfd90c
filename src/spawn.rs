use log::debug;
use serde::Serialize;

/// Empty frames required before the next hand arrival may pick a new gift.
pub const DEFAULT_NO_HANDS_FRAMES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnGateState {
    pub previous_hand_count: usize,
    pub frames_without_hands: u32,
    pub can_spawn: bool,
}

impl Default for SpawnGateState {
    fn default() -> Self {
        Self {
            previous_hand_count: 0,
            frames_without_hands: 0,
            can_spawn: true,
        }
    }
}

/// Allows one spawn per "hands gone for a while, then more hands" episode.
#[derive(Debug)]
pub struct SpawnGate {
    no_hands_frames: u32,
    state: SpawnGateState,
}

impl Default for SpawnGate {
    fn default() -> Self {
        Self::new(DEFAULT_NO_HANDS_FRAMES)
    }
}

impl SpawnGate {
    pub fn new(no_hands_frames: u32) -> Self {
        Self {
            no_hands_frames,
            state: SpawnGateState::default(),
        }
    }

    pub fn state(&self) -> &SpawnGateState {
        &self.state
    }

    pub fn set_no_hands_frames(&mut self, n: u32) {
        self.no_hands_frames = n;
    }

    pub fn reset(&mut self) {
        self.state = SpawnGateState::default();
    }

    /// Feed the raw hand count (open or closed). Returns true when a new
    /// asset should be requested.
    pub fn observe(&mut self, hand_count: usize) -> bool {
        let s = &mut self.state;

        if hand_count == 0 {
            s.frames_without_hands = s.frames_without_hands.saturating_add(1);
            if s.frames_without_hands >= self.no_hands_frames && !s.can_spawn {
                s.can_spawn = true;
                debug!("spawn gate re-armed after {} empty frames", s.frames_without_hands);
            }
        } else {
            s.frames_without_hands = 0;
        }

        let spawn = hand_count > s.previous_hand_count && s.can_spawn;
        if spawn {
            s.can_spawn = false;
        }
        s.previous_hand_count = hand_count;
        spawn
    }
}
