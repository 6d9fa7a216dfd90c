pub mod dispatch;
pub mod pipeline;
pub mod runtime;
pub mod server;

use anyhow::{Result, anyhow};
use serde_json::Value;
use std::{
    io::{BufRead, BufReader, Write},
    os::unix::net::UnixStream,
};

pub use server::run_daemon;

/// A connection to the daemon that can carry many requests.
pub struct Client {
    writer: UnixStream,
    reader: BufReader<UnixStream>,
}

impl Client {
    pub fn connect() -> Result<Self> {
        let sock = runtime::socket_path()?;
        if !sock.exists() {
            return Err(anyhow!(
                "giftctl daemon is not running (socket missing at {})",
                sock.display()
            ));
        }
        let writer = UnixStream::connect(&sock)?;
        let reader = BufReader::new(writer.try_clone()?);
        Ok(Self { writer, reader })
    }

    pub fn request(&mut self, req: &Value) -> Result<Value> {
        let line = serde_json::to_string(req)? + "\n";
        self.writer.write_all(line.as_bytes())?;
        let mut resp = String::new();
        if self.reader.read_line(&mut resp)? == 0 {
            return Err(anyhow!("daemon closed the connection"));
        }
        Ok(serde_json::from_str(&resp)?)
    }
}

pub fn client_request(req: Value) -> Result<Value> {
    Client::connect()?.request(&req)
}
