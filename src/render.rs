//! Turns an overlay directive into paint operations for the host canvas.

use serde::Serialize;
use std::f32::consts::TAU;
use std::path::PathBuf;

use crate::assets::OverlayAsset;
use crate::config::Overlay;
use crate::gestures::OverlayDirective;

const BOX_COLOR: &str = "#e74c3c";
const RIBBON_COLOR: &str = "#f1c40f";
const SPARKLE_COLOR: &str = "#fff";
const SPARKLE_RADIUS: f32 = 3.0;
const SPARKLE_ALPHA: f32 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawOp {
    Image {
        path: PathBuf,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
    Rect {
        color: &'static str,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
    Circle {
        color: &'static str,
        cx: f32,
        cy: f32,
        r: f32,
        alpha: f32,
    },
}

/// `t_secs` drives the sparkle rotation of the procedural gift.
pub fn plan(d: &OverlayDirective, asset: &OverlayAsset, style: &Overlay, t_secs: f64) -> Vec<DrawOp> {
    if !d.visible {
        return Vec::new();
    }
    let size = style.base_size * d.scale;
    let lift = size * style.lift;
    let (x, y) = (d.x, d.y);

    match asset {
        OverlayAsset::Image(path) => vec![DrawOp::Image {
            path: path.clone(),
            x: x - size / 2.0,
            y: y - size / 2.0 - lift,
            w: size,
            h: size,
        }],
        OverlayAsset::Procedural => procedural_gift(x, y, size, lift, style.sparkles, t_secs),
    }
}

fn procedural_gift(x: f32, y: f32, s: f32, lift: f32, sparkles: usize, t_secs: f64) -> Vec<DrawOp> {
    let top = y - s / 3.0 - lift;
    let mut ops = vec![
        DrawOp::Rect { color: BOX_COLOR, x: x - s / 2.0, y: top, w: s, h: s * 0.66 },
        DrawOp::Rect {
            color: RIBBON_COLOR,
            x: x - s / 2.0,
            y: y - s / 12.0 - lift,
            w: s,
            h: s / 6.0,
        },
        DrawOp::Rect { color: RIBBON_COLOR, x: x - s / 12.0, y: top, w: s / 6.0, h: s * 0.66 },
    ];
    for side in [-1.0, 1.0] {
        ops.push(DrawOp::Circle {
            color: RIBBON_COLOR,
            cx: x + side * s / 6.0,
            cy: top,
            r: s / 8.0,
            alpha: 1.0,
        });
    }

    // keep the phase small before narrowing to f32
    let phase = (t_secs % TAU as f64) as f32;
    for i in 0..sparkles {
        let angle = TAU * i as f32 / sparkles as f32 + phase;
        ops.push(DrawOp::Circle {
            color: SPARKLE_COLOR,
            cx: x + angle.cos() * s * 0.7,
            cy: y + angle.sin() * s * 0.5,
            r: SPARKLE_RADIUS,
            alpha: SPARKLE_ALPHA,
        });
    }
    ops
}
