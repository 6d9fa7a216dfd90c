use anyhow::{Context, Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{geometry, gestures, selector, spawn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub open_frames: u32,
    pub close_frames: u32,
    pub no_hands_frames: u32,
    pub extension_ratio: f32,
    pub min_extended_fingers: usize,
    pub reference_hand_size: f32,
    pub smoothing: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            open_frames: gestures::DEFAULT_OPEN_FRAMES,
            close_frames: gestures::DEFAULT_CLOSE_FRAMES,
            no_hands_frames: spawn::DEFAULT_NO_HANDS_FRAMES,
            extension_ratio: geometry::DEFAULT_EXTENSION_RATIO,
            min_extended_fingers: geometry::DEFAULT_MIN_EXTENDED_FINGERS,
            reference_hand_size: selector::DEFAULT_REFERENCE_HAND_SIZE,
            smoothing: gestures::DEFAULT_SMOOTHING,
        }
    }
}

/// How the gift is sized and placed relative to the palm.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Overlay {
    /// Edge length in pixels at scale 1.0.
    pub base_size: f32,
    /// Fraction of the drawn size the gift is lifted above the palm.
    pub lift: f32,
    pub sparkles: usize,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            base_size: 480.0,
            lift: 0.3,
            sparkles: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Assets {
    /// Relative paths are resolved against the config directory.
    pub dir: PathBuf,
    pub variants: Vec<String>,
    pub default: String,
    pub vector: String,
}

impl Default for Assets {
    fn default() -> Self {
        let mut variants: Vec<String> = ["gift1.png", "gift2.png", "gift3.png"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        variants.extend((1..=13).map(|i| format!("g{i}.png")));
        Self {
            dir: PathBuf::from("images"),
            variants,
            default: "gift2.png".to_string(),
            vector: "gift.svg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub overlay: Overlay,
    #[serde(default)]
    pub assets: Assets,
}

pub fn parse_profile(txt: &str) -> Result<Profile> {
    let profile: Profile = toml::from_str(txt)?;
    validate_profile(&profile)?;
    Ok(profile)
}

#[derive(Debug, Clone)]
pub struct DaemonConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

fn default_config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("giftctl"))
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl DaemonConfigState {
    pub fn load_or_install_default() -> Result<Self> {
        Self::load_or_install_in(default_config_dir()?)
    }

    pub fn load_or_install_in(cfgdir: PathBuf) -> Result<Self> {
        let profdir = cfgdir.join("profiles");
        fs::create_dir_all(&profdir)
            .with_context(|| format!("failed to create {}", profdir.display()))?;

        let def_path = profdir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = cfgdir.join("active");
        if !active_ptr.exists() {
            fs::write(&active_ptr, b"default")?;
        }

        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();
        let profile = load_profile(&profdir, &active_name)?;

        Ok(Self {
            active_name,
            profile,
            config_dir: cfgdir,
            profiles_dir: profdir,
            active_ptr,
        })
    }

    /// Keeps the previous profile when the file on disk is broken.
    pub fn reload(&mut self) -> Result<()> {
        self.profile = load_profile(&self.profiles_dir, &self.active_name)?;
        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.profile_path(name);
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        let profile = load_profile(&self.profiles_dir, name)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.profile = profile;
        Ok(())
    }

    /// Switch profile for this process only; the `active` pointer is left
    /// alone so a running daemon keeps its own choice.
    pub fn use_transient(&mut self, name: &str) -> Result<()> {
        self.profile = load_profile(&self.profiles_dir, name)?;
        self.active_name = name.to_string();
        Ok(())
    }

    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.toml"))
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }

    pub fn assets_dir(&self) -> PathBuf {
        let dir = &self.profile.assets.dir;
        if dir.is_absolute() {
            dir.clone()
        } else {
            self.config_dir.join(dir)
        }
    }

    pub fn doctor_report(&self, socket: &Path) -> serde_json::Value {
        let assets_dir = self.assets_dir();
        let assets = &self.profile.assets;
        let (found, missing): (Vec<&String>, Vec<&String>) = assets
            .variants
            .iter()
            .partition(|v| assets_dir.join(v).is_file());
        serde_json::json!({
            "user": whoami::username(),
            "config_dir": self.config_dir,
            "profiles_dir": self.profiles_dir,
            "active_profile": self.active_name,
            "socket": socket,
            "assets": {
                "dir": assets_dir,
                "dir_present": assets_dir.is_dir(),
                "variants_found": found,
                "variants_missing": missing,
                "default_present": assets_dir.join(&assets.default).is_file(),
                "vector_present": assets_dir.join(&assets.vector).is_file(),
            },
            "hints": {
                "assets": "copy gift images into the assets dir; the procedural gift is drawn when none load"
            }
        })
    }
}

fn load_profile(profdir: &Path, name: &str) -> Result<Profile> {
    let path = profdir.join(format!("{name}.toml"));
    let txt = fs::read_to_string(&path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    parse_profile(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))
}

fn validate_profile(p: &Profile) -> Result<()> {
    let th = &p.thresholds;
    if th.open_frames == 0 || th.close_frames == 0 || th.no_hands_frames == 0 {
        return Err(anyhow!("frame thresholds must be positive"));
    }
    if !(0.0..1.0).contains(&th.smoothing) {
        return Err(anyhow!("thresholds.smoothing must be in [0,1)"));
    }
    if !(th.extension_ratio.is_finite() && th.extension_ratio > 0.0) {
        return Err(anyhow!("thresholds.extension_ratio must be positive"));
    }
    if !(th.reference_hand_size.is_finite() && th.reference_hand_size > 0.0) {
        return Err(anyhow!("thresholds.reference_hand_size must be positive"));
    }
    if !(1..=4).contains(&th.min_extended_fingers) {
        return Err(anyhow!("thresholds.min_extended_fingers must be between 1 and 4"));
    }
    if !(p.overlay.base_size.is_finite() && p.overlay.base_size > 0.0) {
        return Err(anyhow!("overlay.base_size must be positive"));
    }
    if !p.overlay.lift.is_finite() {
        return Err(anyhow!("overlay.lift must be a finite number"));
    }

    let assets = &p.assets;
    if assets.variants.is_empty() {
        return Err(anyhow!("assets.variants must list at least one image"));
    }
    if let Some(v) = assets.variants.iter().find(|v| v.trim().is_empty()) {
        return Err(anyhow!("assets.variants contains an empty name: '{v}'"));
    }
    Ok(())
}
