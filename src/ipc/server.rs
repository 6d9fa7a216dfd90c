use anyhow::{Result, anyhow};
use log::{error, info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::{Value, json};
use std::{
    io::{self, BufRead, BufReader, Write},
    os::unix::net::{UnixListener, UnixStream},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    thread,
    time::Duration,
};

use super::dispatch::{Request, dispatch};
use super::pipeline::Pipeline;
use super::runtime::socket_path;
use crate::config::DaemonConfigState;

/// How long a stopping daemon waits for the shutdown reply to reach its client.
const SHUTDOWN_REPLY_GRACE: Duration = Duration::from_secs(1);

pub fn run_daemon() -> Result<()> {
    // socket
    let sock = socket_path()?;
    if sock.exists() {
        let _ = std::fs::remove_file(&sock);
    }
    let listener = UnixListener::bind(&sock)?;
    info!("daemon: listening on {}", sock.display());

    // state
    let cfg = DaemonConfigState::load_or_install_default()?;
    let mut state = DaemonState::new(cfg, sock.clone());
    info!("daemon: active profile '{}'", state.cfg.active_name);

    // signals
    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&term))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&term))?;

    let watcher = match ProfileWatcher::start(&state.cfg.profiles_dir) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("profile hot reload disabled: {e}");
            None
        }
    };

    let (tx_req, rx_req) = mpsc::channel::<IpcMsg>();
    let (tx_done, rx_done) = mpsc::channel::<()>();

    // accept loop
    listener.set_nonblocking(true)?;
    while state.enabled && !term.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, _)) => {
                let tx = tx_req.clone();
                let done = tx_done.clone();
                thread::spawn(move || {
                    if let Err(e) = handle_client(stream, tx, done) {
                        error!("ipc client error: {e}");
                    }
                });
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => warn!("accept failed: {e}"),
        }

        while let Ok(msg) = rx_req.try_recv() {
            let resp = dispatch(msg.req, &mut state);
            let _ = msg.reply.send(resp);
        }

        if let Some(w) = &watcher {
            let active = state.cfg.profile_path(&state.cfg.active_name);
            if w.touched(&active) {
                match state.reload() {
                    Ok(()) => info!("profile '{}' changed on disk; reloaded", state.cfg.active_name),
                    Err(e) => error!("reload failed, keeping last good profile: {e}"),
                }
            }
        }

        thread::sleep(Duration::from_millis(2));
    }

    // stopped by request: let the client thread write its reply first
    if !state.enabled && rx_done.recv_timeout(SHUTDOWN_REPLY_GRACE).is_err() {
        warn!("daemon: shutdown reply not confirmed as written");
    }

    let _ = std::fs::remove_file(&sock);
    info!("daemon: stopped");
    Ok(())
}

/// Connections may stream many requests; each one is answered in order.
/// After answering `shutdown` the connection is closed and `done` fires.
fn handle_client(stream: UnixStream, tx_req: Sender<IpcMsg>, done: Sender<()>) -> Result<()> {
    stream.set_nonblocking(false)?;
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut stopping = false;
        let resp = match serde_json::from_str::<Request>(&line) {
            Ok(req) => {
                stopping = matches!(req, Request::Shutdown);
                let (reply, rx) = mpsc::channel();
                tx_req
                    .send(IpcMsg { req, reply })
                    .map_err(|_| anyhow!("daemon main loop is gone"))?;
                rx.recv()?
            }
            Err(e) => json!({"ok": false, "error": format!("bad request: {e}")}),
        };
        let written = writeln!(writer, "{resp}").and_then(|()| writer.flush());
        if stopping {
            let _ = done.send(());
            written?;
            return Ok(());
        }
        written?;
    }
    Ok(())
}

pub struct DaemonState {
    pub enabled: bool,
    pub cfg: DaemonConfigState,
    pub pipeline: Pipeline,
    pub socket: PathBuf,
}

impl DaemonState {
    pub fn new(cfg: DaemonConfigState, socket: PathBuf) -> Self {
        let pipeline = Pipeline::new(&cfg.profile, cfg.assets_dir());
        Self {
            enabled: true,
            cfg,
            pipeline,
            socket,
        }
    }

    pub fn reload(&mut self) -> Result<()> {
        self.cfg.reload()?;
        self.pipeline
            .apply_profile(&self.cfg.profile, self.cfg.assets_dir());
        Ok(())
    }

    pub fn use_profile(&mut self, name: &str) -> Result<()> {
        self.cfg.set_active(name)?;
        self.pipeline
            .apply_profile(&self.cfg.profile, self.cfg.assets_dir());
        info!("switched active profile to {}", self.cfg.active_name);
        Ok(())
    }
}

struct IpcMsg {
    req: Request,
    reply: Sender<Value>,
}

struct ProfileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<PathBuf>,
}

impl ProfileWatcher {
    fn start(dir: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    for p in event.paths {
                        let _ = tx.send(p);
                    }
                }
            }
            Err(e) => error!("profile watcher error: {e}"),
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Drains pending events so a burst of writes triggers one reload.
    fn touched(&self, target: &Path) -> bool {
        let mut hit = false;
        while let Ok(p) = self.rx.try_recv() {
            hit |= p.file_name() == target.file_name();
        }
        hit
    }
}
