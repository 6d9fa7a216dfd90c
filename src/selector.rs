use log::trace;
use serde::Serialize;

use crate::geometry::{self, OpenPalm};
use crate::landmarks::{DetectionFrame, Point};

/// Hand size in pixels that maps to overlay scale 1.0.
pub const DEFAULT_REFERENCE_HAND_SIZE: f32 = 150.0;

/// The open hand chosen to carry the overlay this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub center: Point,
    pub scale: f32,
    pub size: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub best: Option<Candidate>,
    /// Everything the detector reported, open or closed.
    pub hands: usize,
    pub open_hands: usize,
}

impl Selection {
    pub fn any_open(&self) -> bool {
        self.best.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSelector {
    pub palm: OpenPalm,
    pub reference_hand_size: f32,
}

impl Default for HandSelector {
    fn default() -> Self {
        Self {
            palm: OpenPalm::default(),
            reference_hand_size: DEFAULT_REFERENCE_HAND_SIZE,
        }
    }
}

impl HandSelector {
    /// Largest open hand wins so the gift doesn't hop between hands;
    /// on equal size the first one reported is kept. A hand must have a
    /// positive size to be chosen at all.
    pub fn select(&self, frame: &DetectionFrame) -> Selection {
        let mut sel = Selection {
            hands: frame.hand_count(),
            ..Selection::default()
        };

        for hand in frame.pixel_hands() {
            if !geometry::is_open(&hand, self.palm) {
                continue;
            }
            let (Some(size), Some(center)) = (geometry::hand_size(&hand), geometry::palm_center(&hand))
            else {
                continue;
            };
            sel.open_hands += 1;
            if size > sel.best.map_or(0.0, |b| b.size) {
                sel.best = Some(Candidate {
                    center,
                    scale: size / self.reference_hand_size,
                    size,
                });
            }
        }

        trace!(
            "selector: hands={} open={} best={:?}",
            sel.hands, sel.open_hands, sel.best
        );
        sel
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::geometry::fixtures;
    use crate::landmarks::{Landmark, Point};

    /// Normalize a pixel-space hand against a `w` x `h` frame.
    pub fn normalized(hand: &[Point], w: f32, h: f32) -> Vec<Landmark> {
        hand.iter().map(|p| Landmark::new(p.x / w, p.y / h)).collect()
    }

    /// Open hand whose wrist-to-middle-tip distance is exactly `size` px.
    pub fn open_of_size(cx: f32, cy: f32, size: f32) -> Vec<Point> {
        // middle tip sits straight above the wrist at `reach`
        fixtures::hand_at(cx, cy, size * 0.4, size, [true; 4])
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                if i == crate::landmarks::MIDDLE_TIP {
                    Point::new(cx, p.y)
                } else {
                    p
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::geometry::fixtures::fist;
    use crate::landmarks::Landmark;

    const W: f32 = 1000.0;
    const H: f32 = 1000.0;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn frame(hands: &[Vec<Point>]) -> DetectionFrame {
        DetectionFrame::new(W, H, hands.iter().map(|h| normalized(h, W, H)).collect())
    }

    #[test]
    fn empty_frame_selects_nothing() {
        let sel = HandSelector::default().select(&DetectionFrame::empty(W, H));
        assert_eq!(sel, Selection::default());
        assert!(!sel.any_open());
    }

    #[test]
    fn picks_largest_open_hand() {
        let small = open_of_size(200.0, 600.0, 100.0);
        let large = open_of_size(700.0, 600.0, 150.0);
        let sel = HandSelector::default().select(&frame(&[small, large.clone()]));
        let best = sel.best.unwrap();
        assert!(approx_eq(best.size, 150.0));
        assert!(approx_eq(best.scale, 1.0));
        let expected = geometry::palm_center(&large).unwrap();
        assert!(approx_eq(best.center.x, expected.x));
        assert!(approx_eq(best.center.y, expected.y));
        assert_eq!(sel.hands, 2);
        assert_eq!(sel.open_hands, 2);
    }

    #[test]
    fn closed_hand_is_ignored_whatever_its_size() {
        let open = open_of_size(200.0, 600.0, 80.0);
        // about 200 px from wrist to middle tip, fingers curled
        let closed = crate::geometry::fixtures::hand_at(700.0, 900.0, 200.0, 120.0, [false; 4]);
        assert!(geometry::hand_size(&closed).unwrap() > 200.0);
        let sel = HandSelector::default().select(&frame(&[closed, open.clone()]));
        let best = sel.best.unwrap();
        assert!(approx_eq(best.size, 80.0));
        assert!(approx_eq(best.scale, 80.0 / 150.0));
        assert_eq!(sel.hands, 2);
        assert_eq!(sel.open_hands, 1);
    }

    #[test]
    fn only_closed_hands_gives_none_but_counts_them() {
        let sel = HandSelector::default().select(&frame(&[fist(100.0, 500.0), fist(600.0, 500.0)]));
        assert_eq!(sel.best, None);
        assert_eq!(sel.hands, 2);
        assert_eq!(sel.open_hands, 0);
    }

    #[test]
    fn equal_sizes_keep_first_hand() {
        let a = open_of_size(200.0, 600.0, 120.0);
        let b = open_of_size(700.0, 600.0, 120.0);
        let sel = HandSelector::default().select(&frame(&[a.clone(), b]));
        let c = geometry::palm_center(&a).unwrap();
        assert!(approx_eq(sel.best.unwrap().center.x, c.x));
    }

    #[test]
    fn zero_size_open_hand_is_never_chosen() {
        let mut flat = crate::geometry::fixtures::hand_at(300.0, 600.0, 50.0, 120.0, [true, false, true, true]);
        flat[crate::landmarks::MIDDLE_TIP] = flat[crate::landmarks::WRIST];
        assert!(geometry::is_open(&flat, OpenPalm::default()));
        assert_eq!(geometry::hand_size(&flat), Some(0.0));

        let sel = HandSelector::default().select(&frame(&[flat.clone()]));
        assert_eq!(sel.best, None);
        assert!(!sel.any_open());
        assert_eq!(sel.open_hands, 1);

        let real = open_of_size(700.0, 600.0, 90.0);
        let sel = HandSelector::default().select(&frame(&[flat, real]));
        assert!(approx_eq(sel.best.unwrap().size, 90.0));
    }

    #[test]
    fn short_hand_counts_but_never_selects() {
        let short = vec![Landmark::new(0.5, 0.5); 10];
        let f = DetectionFrame::new(W, H, vec![short]);
        let sel = HandSelector::default().select(&f);
        assert_eq!(sel.hands, 1);
        assert_eq!(sel.best, None);
    }

    #[test]
    fn reference_size_is_configurable() {
        let hand = open_of_size(500.0, 600.0, 150.0);
        let sel = HandSelector {
            reference_hand_size: 300.0,
            ..HandSelector::default()
        }
        .select(&frame(&[hand]));
        assert!(approx_eq(sel.best.unwrap().scale, 0.5));
    }

    #[test]
    fn denormalizes_with_frame_dimensions() {
        let hand = open_of_size(320.0, 400.0, 150.0);
        let f = DetectionFrame::new(640.0, 480.0, vec![normalized(&hand, 640.0, 480.0)]);
        let best = HandSelector::default().select(&f).best.unwrap();
        let c = geometry::palm_center(&hand).unwrap();
        assert!(approx_eq(best.center.x, c.x));
        assert!(approx_eq(best.center.y, c.y));
        assert!(approx_eq(best.size, 150.0));
    }
}
