//! One overlay session: the per-frame entry point that drives the selector,
//! the gesture machine and the spawn gate in order.

use log::trace;
use serde::Serialize;

use crate::config::Thresholds;
use crate::geometry::OpenPalm;
use crate::gestures::{GestureMachine, GestureState, Hysteresis, OverlayDirective};
use crate::landmarks::DetectionFrame;
use crate::selector::HandSelector;
use crate::spawn::{SpawnGate, SpawnGateState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub directive: OverlayDirective,
    /// A new gift should be picked.
    pub spawn: bool,
    pub hands: usize,
    pub open_hands: usize,
}

#[derive(Debug, Default)]
pub struct Session {
    selector: HandSelector,
    gesture: GestureMachine,
    spawn: SpawnGate,
    frames: u64,
    spawns: u64,
}

fn selector_for(th: &Thresholds) -> HandSelector {
    HandSelector {
        palm: OpenPalm {
            extension_ratio: th.extension_ratio,
            min_extended: th.min_extended_fingers,
        },
        reference_hand_size: th.reference_hand_size,
    }
}

impl Session {
    pub fn new(th: &Thresholds) -> Self {
        Self {
            selector: selector_for(th),
            gesture: GestureMachine::new(Hysteresis::from(th)),
            spawn: SpawnGate::new(th.no_hands_frames),
            frames: 0,
            spawns: 0,
        }
    }

    /// New thresholds take effect on the next frame; accumulated state stays.
    pub fn apply_thresholds(&mut self, th: &Thresholds) {
        self.selector = selector_for(th);
        self.gesture.set_thresholds(Hysteresis::from(th));
        self.spawn.set_no_hands_frames(th.no_hands_frames);
    }

    pub fn reset(&mut self) {
        self.gesture.reset();
        self.spawn.reset();
        self.frames = 0;
        self.spawns = 0;
    }

    pub fn process_frame(&mut self, frame: &DetectionFrame) -> FrameOutcome {
        let spawn = self.spawn.observe(frame.hand_count());
        let sel = self.selector.select(frame);
        let directive = self.gesture.advance(sel.best.as_ref());

        self.frames += 1;
        if spawn {
            self.spawns += 1;
        }
        trace!(
            "frame {}: hands={} open={} spawn={} {:?}",
            self.frames, sel.hands, sel.open_hands, spawn, directive
        );

        FrameOutcome {
            directive,
            spawn,
            hands: sel.hands,
            open_hands: sel.open_hands,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn spawns(&self) -> u64 {
        self.spawns
    }

    pub fn gesture_state(&self) -> &GestureState {
        self.gesture.state()
    }

    pub fn spawn_state(&self) -> &SpawnGateState {
        self.spawn.state()
    }
}
