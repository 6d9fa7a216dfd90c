use anyhow::{Result, anyhow};
use directories::UserDirs;
use std::{env, fs, path::PathBuf};

pub fn runtime_dir() -> Result<PathBuf> {
    let home = UserDirs::new()
        .ok_or_else(|| anyhow!("cannot determine home directory"))?
        .home_dir()
        .to_path_buf();
    let dir = home.join(".local").join("run");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// `GIFTCTL_SOCKET` overrides the default `~/.local/run/giftctl.sock`.
pub fn socket_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os("GIFTCTL_SOCKET") {
        return Ok(PathBuf::from(p));
    }
    Ok(runtime_dir()?.join("giftctl.sock"))
}
