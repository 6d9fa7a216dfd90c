//! Gift image selection and background loading.

use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use crate::config::Assets;
use crate::error::AssetError;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const SVG_SNIFF_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayAsset {
    Image(PathBuf),
    /// Nothing loaded; the renderer draws the box-and-ribbon gift.
    Procedural,
}

impl OverlayAsset {
    pub fn label(&self) -> String {
        match self {
            Self::Image(p) => p.display().to_string(),
            Self::Procedural => "procedural".to_string(),
        }
    }
}

pub fn choose_variant<'a, R: Rng + ?Sized>(variants: &'a [String], rng: &mut R) -> Option<&'a str> {
    variants.choose(rng).map(String::as_str)
}

/// Checks that `path` holds something the host can paint.
pub fn load_image(path: &Path) -> Result<PathBuf, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AssetError::Empty(path.to_path_buf()));
    }
    let head = &bytes[..bytes.len().min(SVG_SNIFF_LEN)];
    let is_png = bytes.starts_with(PNG_SIGNATURE);
    let is_svg = String::from_utf8_lossy(head).contains("<svg");
    if !is_png && !is_svg {
        return Err(AssetError::UnknownFormat(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}

/// primary -> configured default -> vector. `None` when all three fail.
pub fn resolve(dir: &Path, primary: &str, assets: &Assets) -> Option<PathBuf> {
    let chain = [primary, assets.default.as_str(), assets.vector.as_str()];
    for name in chain {
        match load_image(&dir.join(name)) {
            Ok(path) => return Some(path),
            Err(e) => warn!("gift image unavailable: {e}"),
        }
    }
    None
}

/// Resolves gift images on a worker thread; results are picked up with
/// [`AssetLoader::poll`] so frame processing never waits on disk.
pub struct AssetLoader {
    dir: PathBuf,
    assets: Assets,
    tx: Sender<(u64, Option<PathBuf>)>,
    rx: Receiver<(u64, Option<PathBuf>)>,
    pending: usize,
    /// Sequence number of the last request handed to a worker.
    issued: u64,
    /// Newest request whose result has been seen; older ones are stale.
    settled: u64,
}

impl AssetLoader {
    pub fn new(dir: PathBuf, assets: Assets) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            dir,
            assets,
            tx,
            rx,
            pending: 0,
            issued: 0,
            settled: 0,
        }
    }

    pub fn reconfigure(&mut self, dir: PathBuf, assets: Assets) {
        self.dir = dir;
        self.assets = assets;
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn request(&mut self) {
        let Some(primary) = choose_variant(&self.assets.variants, &mut rand::thread_rng())
            .map(str::to_string)
        else {
            return;
        };
        let dir = self.dir.clone();
        let assets = self.assets.clone();
        let tx = self.tx.clone();
        self.pending += 1;
        self.issued += 1;
        let seq = self.issued;
        thread::spawn(move || {
            let _ = tx.send((seq, resolve(&dir, &primary, &assets)));
        });
    }

    /// Result of the most recent request, once it has finished. Results of
    /// earlier requests that finish late are dropped. A load where every
    /// fallback failed yields nothing, so the caller keeps its current asset.
    pub fn poll(&mut self) -> Option<OverlayAsset> {
        let mut latest = None;
        while let Ok((seq, res)) = self.rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            if seq <= self.settled {
                debug!("dropping stale gift load #{seq} (newest #{})", self.settled);
                continue;
            }
            self.settled = seq;
            match res {
                Some(path) => {
                    info!("gift image loaded: {}", path.display());
                    latest = Some(OverlayAsset::Image(path));
                }
                None => {
                    warn!("no gift image could be loaded; drawing procedural gift");
                    latest = None;
                }
            }
        }
        latest
    }
}
