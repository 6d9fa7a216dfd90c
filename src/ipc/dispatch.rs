use log::{error, info};
use serde::Deserialize;
use serde_json::{Value, json};

use super::server::DaemonState;
use crate::landmarks::DetectionFrame;

/// One line of the socket protocol.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Frame { frame: DetectionFrame },
    Status,
    Reset,
    Reload,
    Use { profile: String },
    List,
    Doctor,
    Shutdown,
}

fn ok(data: Value) -> Value {
    json!({"ok": true, "data": data})
}

fn fail(msg: impl std::fmt::Display) -> Value {
    json!({"ok": false, "error": msg.to_string()})
}

/// Runs on the daemon's main loop, the only place session state is touched.
pub fn dispatch(req: Request, st: &mut DaemonState) -> Value {
    match req {
        Request::Frame { frame } => {
            if !st.enabled {
                return fail("daemon is shutting down");
            }
            match st.pipeline.process(&frame) {
                Ok(report) => match serde_json::to_value(&report) {
                    Ok(v) => ok(v),
                    Err(e) => fail(e),
                },
                Err(e) => fail(format!("rejected frame: {e}")),
            }
        }
        Request::Status => ok(json!({
            "enabled": st.enabled,
            "active_profile": st.cfg.active_name,
            "socket": st.socket,
            "session": st.pipeline.status(),
        })),
        Request::Reset => {
            st.pipeline.reset();
            info!("session reset");
            ok(json!("session reset"))
        }
        Request::Reload => match st.reload() {
            Ok(()) => ok(json!({"active_profile": st.cfg.active_name})),
            Err(e) => {
                error!("reload failed: {e}");
                fail(e)
            }
        },
        Request::Use { profile } => match st.use_profile(&profile) {
            Ok(()) => ok(json!({"active_profile": st.cfg.active_name})),
            Err(e) => {
                error!("use profile failed: {e}");
                fail(e)
            }
        },
        Request::List => ok(json!({
            "profiles": st.cfg.list_profiles(),
            "active": st.cfg.active_name,
        })),
        Request::Doctor => ok(st.cfg.doctor_report(&st.socket)),
        Request::Shutdown => {
            st.enabled = false;
            ok(json!("shutting down"))
        }
    }
}
