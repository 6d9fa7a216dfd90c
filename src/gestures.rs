use log::debug;
use serde::Serialize;

use crate::config::Thresholds;
use crate::selector::Candidate;

pub const DEFAULT_OPEN_FRAMES: u32 = 3;
pub const DEFAULT_CLOSE_FRAMES: u32 = 5;
/// Weight kept from the previous value on each update; closer to 1 is smoother.
pub const DEFAULT_SMOOTHING: f32 = 0.7;

/// What the renderer should do this frame. Position and scale stay stale while
/// hidden, so consumers gate on `visible`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayDirective {
    pub visible: bool,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureState {
    pub visible: bool,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub open_run: u32,
    pub closed_run: u32,
    /// Set by the first confirmed placement, which snaps instead of blending.
    pub initialized: bool,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            visible: false,
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            open_run: 0,
            closed_run: 0,
            initialized: false,
        }
    }
}

impl GestureState {
    pub fn directive(&self) -> OverlayDirective {
        OverlayDirective {
            visible: self.visible,
            x: self.x,
            y: self.y,
            scale: self.scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hysteresis {
    pub open_frames: u32,
    pub close_frames: u32,
    pub smoothing: f32,
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self {
            open_frames: DEFAULT_OPEN_FRAMES,
            close_frames: DEFAULT_CLOSE_FRAMES,
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

impl From<&Thresholds> for Hysteresis {
    fn from(th: &Thresholds) -> Self {
        Self {
            open_frames: th.open_frames,
            close_frames: th.close_frames,
            smoothing: th.smoothing,
        }
    }
}

/// Hidden/shown with a debounce run on each edge, plus low-pass placement.
#[derive(Debug, Default)]
pub struct GestureMachine {
    th: Hysteresis,
    state: GestureState,
}

impl GestureMachine {
    pub fn new(th: Hysteresis) -> Self {
        Self {
            th,
            state: GestureState::default(),
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn set_thresholds(&mut self, th: Hysteresis) {
        self.th = th;
    }

    pub fn reset(&mut self) {
        self.state = GestureState::default();
    }

    pub fn advance(&mut self, target: Option<&Candidate>) -> OverlayDirective {
        let s = &mut self.state;
        let was_visible = s.visible;

        match target {
            Some(c) => {
                s.open_run = s.open_run.saturating_add(1);
                s.closed_run = 0;
                if s.open_run >= self.th.open_frames {
                    s.visible = true;
                    if s.initialized {
                        let a = self.th.smoothing;
                        s.x = s.x * a + c.center.x * (1.0 - a);
                        s.y = s.y * a + c.center.y * (1.0 - a);
                        s.scale = s.scale * a + c.scale * (1.0 - a);
                    } else {
                        s.x = c.center.x;
                        s.y = c.center.y;
                        s.scale = c.scale;
                        s.initialized = true;
                    }
                }
            }
            None => {
                s.closed_run = s.closed_run.saturating_add(1);
                s.open_run = 0;
                if s.closed_run >= self.th.close_frames {
                    s.visible = false;
                }
            }
        }

        if s.visible != was_visible {
            debug!(
                "overlay {} at ({:.1}, {:.1}) x{:.2}",
                if s.visible { "shown" } else { "hidden" },
                s.x,
                s.y,
                s.scale
            );
        }
        s.directive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Point;

    fn approx_eq_f32(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    fn at(x: f32, y: f32, scale: f32) -> Candidate {
        Candidate {
            center: Point::new(x, y),
            scale,
            size: scale * 150.0,
        }
    }

    fn feed(m: &mut GestureMachine, frames: &[Option<Candidate>]) -> Vec<bool> {
        frames.iter().map(|f| m.advance(f.as_ref()).visible).collect()
    }

    #[test]
    fn starts_hidden_at_origin() {
        let m = GestureMachine::default();
        assert_eq!(
            m.state().directive(),
            OverlayDirective { visible: false, x: 0.0, y: 0.0, scale: 1.0 }
        );
        assert!(!m.state().initialized);
    }

    #[test]
    fn two_open_frames_are_not_enough() {
        let mut m = GestureMachine::default();
        let c = Some(at(100.0, 100.0, 1.0));
        assert_eq!(feed(&mut m, &[c, c, None]), vec![false, false, false]);
        // the closed frame reset the open run
        assert_eq!(feed(&mut m, &[c, c]), vec![false, false]);
    }

    #[test]
    fn third_open_frame_shows() {
        let mut m = GestureMachine::default();
        let c = Some(at(100.0, 100.0, 1.0));
        assert_eq!(feed(&mut m, &[c, c, c]), vec![false, false, true]);
        assert_eq!(m.state().open_run, 3);
    }

    #[test]
    fn fifth_closed_frame_hides() {
        let mut m = GestureMachine::default();
        let c = Some(at(100.0, 100.0, 1.0));
        feed(&mut m, &[c, c, c]);
        assert_eq!(feed(&mut m, &[None; 4]), vec![true; 4]);
        assert!(!m.advance(None).visible);
        assert_eq!(m.state().closed_run, 5);
    }

    #[test]
    fn brief_dropout_does_not_flicker() {
        let mut m = GestureMachine::default();
        let c = Some(at(100.0, 100.0, 1.0));
        feed(&mut m, &[c, c, c]);
        let seen = feed(&mut m, &[None, None, c, None, None, None, None, c]);
        assert!(seen.iter().all(|&v| v));
    }

    #[test]
    fn hidden_directive_keeps_stale_placement() {
        let mut m = GestureMachine::default();
        let c = Some(at(100.0, 200.0, 1.5));
        feed(&mut m, &[c, c, c]);
        let d = feed(&mut m, &[None; 5]).pop();
        assert_eq!(d, Some(false));
        let d = m.advance(None);
        assert_eq!(d, OverlayDirective { visible: false, x: 100.0, y: 200.0, scale: 1.5 });
    }

    #[test]
    fn first_placement_snaps_then_blends() {
        let mut m = GestureMachine::default();
        let first = Some(at(100.0, 200.0, 1.0));
        feed(&mut m, &[first, first]);
        // unconfirmed frames leave placement untouched
        assert_eq!((m.state().x, m.state().y), (0.0, 0.0));

        let d = m.advance(first.as_ref());
        assert_eq!((d.x, d.y, d.scale), (100.0, 200.0, 1.0));

        let d = m.advance(Some(&at(200.0, 200.0, 2.0)));
        assert!(approx_eq_f32(d.x, 130.0, 1e-4));
        assert!(approx_eq_f32(d.y, 200.0, 1e-4));
        assert!(approx_eq_f32(d.scale, 1.3, 1e-5));
    }

    #[test]
    fn target_at_origin_is_not_a_first_update() {
        let mut m = GestureMachine::default();
        let origin = Some(at(0.0, 0.0, 1.0));
        feed(&mut m, &[origin, origin, origin]);
        assert!(m.state().initialized);
        let d = m.advance(Some(&at(100.0, 0.0, 1.0)));
        assert!(approx_eq_f32(d.x, 30.0, 1e-4));
    }

    #[test]
    fn reappearance_blends_from_last_position() {
        let mut m = GestureMachine::default();
        let a = Some(at(100.0, 100.0, 1.0));
        let b = Some(at(200.0, 100.0, 1.0));
        feed(&mut m, &[a, a, a]);
        feed(&mut m, &[None; 5]);
        let d = feed(&mut m, &[b, b, b]).pop();
        assert_eq!(d, Some(true));
        assert!(approx_eq_f32(m.state().x, 130.0, 1e-4));
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut m = GestureMachine::default();
        let c = Some(at(100.0, 100.0, 1.0));
        feed(&mut m, &[c, c, c]);
        m.reset();
        assert_eq!(m.state(), &GestureState::default());
    }

    #[test]
    fn custom_thresholds() {
        let mut m = GestureMachine::new(Hysteresis { open_frames: 1, close_frames: 1, smoothing: 0.0 });
        let d = m.advance(Some(&at(10.0, 10.0, 1.0)));
        assert!(d.visible);
        let d = m.advance(Some(&at(50.0, 60.0, 2.0)));
        assert_eq!((d.x, d.y, d.scale), (50.0, 60.0, 2.0));
        assert!(!m.advance(None).visible);
    }
}
