use log::info;
use serde::Serialize;
use std::{path::PathBuf, time::Instant};

use crate::assets::{AssetLoader, OverlayAsset};
use crate::config::{Overlay, Profile};
use crate::error::FrameError;
use crate::landmarks::DetectionFrame;
use crate::render::{self, DrawOp};
use crate::session::{FrameOutcome, Session};

/// What a host gets back for each frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    #[serde(flatten)]
    pub outcome: FrameOutcome,
    pub asset: String,
    pub draw: Vec<DrawOp>,
}

/// Session plus the collaborators around it: gift loading and draw planning.
pub struct Pipeline {
    session: Session,
    loader: AssetLoader,
    asset: OverlayAsset,
    overlay: Overlay,
    started: Instant,
}

impl Pipeline {
    pub fn new(profile: &Profile, assets_dir: PathBuf) -> Self {
        let mut loader = AssetLoader::new(assets_dir, profile.assets.clone());
        loader.request();
        Self {
            session: Session::new(&profile.thresholds),
            loader,
            asset: OverlayAsset::Procedural,
            overlay: profile.overlay.clone(),
            started: Instant::now(),
        }
    }

    pub fn process(&mut self, frame: &DetectionFrame) -> Result<FrameReport, FrameError> {
        frame.validate()?;

        if let Some(asset) = self.loader.poll() {
            self.asset = asset;
        }

        let outcome = self.session.process_frame(frame);
        if outcome.spawn {
            info!("hands appeared ({}); picking a new gift", outcome.hands);
            self.loader.request();
        }

        let t_secs = frame
            .timestamp_ms
            .map(|ms| ms as f64 / 1000.0)
            .unwrap_or_else(|| self.started.elapsed().as_secs_f64());
        let draw = render::plan(&outcome.directive, &self.asset, &self.overlay, t_secs);

        Ok(FrameReport {
            outcome,
            asset: self.asset.label(),
            draw,
        })
    }

    pub fn apply_profile(&mut self, profile: &Profile, assets_dir: PathBuf) {
        self.session.apply_thresholds(&profile.thresholds);
        self.overlay = profile.overlay.clone();
        self.loader.reconfigure(assets_dir, profile.assets.clone());
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "frames": self.session.frames(),
            "spawns": self.session.spawns(),
            "asset": self.asset.label(),
            "pending_loads": self.loader.pending(),
            "gesture": self.session.gesture_state(),
            "spawn_gate": self.session.spawn_state(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::fixtures::{PNG, scratch_dir};
    use crate::landmarks::Landmark;
    use crate::selector::fixtures::{normalized, open_of_size};
    use std::{fs, thread, time::Duration};

    fn open_frame() -> DetectionFrame {
        let hand = open_of_size(640.0, 500.0, 150.0);
        let mut f = DetectionFrame::new(1280.0, 720.0, vec![normalized(&hand, 1280.0, 720.0)]);
        f.timestamp_ms = Some(0);
        f
    }

    #[test]
    fn draws_procedural_gift_without_images() {
        let dir = scratch_dir("pipeline-none");
        let mut p = Pipeline::new(&Profile::default(), dir.clone());
        let f = open_frame();

        let r = p.process(&f).unwrap();
        assert!(r.outcome.spawn);
        assert!(r.draw.is_empty());
        p.process(&f).unwrap();
        let r = p.process(&f).unwrap();
        assert!(r.outcome.directive.visible);
        assert_eq!(r.asset, "procedural");
        assert_eq!(r.draw.len(), 10);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn picks_up_loaded_image() {
        let dir = scratch_dir("pipeline-image");
        for v in &Profile::default().assets.variants {
            fs::write(dir.join(v), PNG).unwrap();
        }
        let mut p = Pipeline::new(&Profile::default(), dir.clone());
        let f = DetectionFrame::empty(1280.0, 720.0);
        let mut asset = String::new();
        for _ in 0..200 {
            asset = p.process(&f).unwrap().asset;
            if asset != "procedural" {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(asset.starts_with(&dir.display().to_string()), "{asset}");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_frame_leaves_session_untouched() {
        let dir = scratch_dir("pipeline-invalid");
        let mut p = Pipeline::new(&Profile::default(), dir.clone());
        let bad = DetectionFrame::new(1280.0, 720.0, vec![vec![Landmark::new(f32::NAN, 0.5)]]);
        assert!(p.process(&bad).is_err());
        assert_eq!(p.status()["frames"], 0);
        assert_eq!(p.status()["spawn_gate"]["previous_hand_count"], 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn report_serializes_flat() {
        let dir = scratch_dir("pipeline-json");
        let mut p = Pipeline::new(&Profile::default(), dir.clone());
        let v = serde_json::to_value(p.process(&open_frame()).unwrap()).unwrap();
        assert_eq!(v["spawn"], true);
        assert_eq!(v["hands"], 1);
        assert_eq!(v["directive"]["visible"], false);
        assert!(v["draw"].as_array().unwrap().is_empty());
        let _ = fs::remove_dir_all(&dir);
    }
}
