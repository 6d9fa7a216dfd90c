use anyhow::{Context, Result, anyhow};
use log::warn;
use pico_args::Arguments;
use std::{
    env,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    process::Command,
};

use crate::config::DaemonConfigState;
use crate::ipc::{self, Client, pipeline::Pipeline};
use crate::landmarks::DetectionFrame;

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // Hidden daemon mode (spawned by `start`)
    if pargs.contains("--daemon") {
        return ipc::run_daemon();
    }

    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let profile: Option<String> = pargs.opt_value_from_str("--profile")?;
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("start") => {
            let exe = env::current_exe()?;
            let child = Command::new(exe).arg("--daemon").spawn()?;
            println!("giftctl: started daemon (pid={})", child.id());
            Ok(())
        }

        Some("stop") => simple("shutdown"),
        Some("status") => simple("status"),
        Some("reload") => simple("reload"),
        Some("list") => simple("list"),
        Some("doctor") => simple("doctor"),
        Some("reset") => simple("reset"),

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: giftctl use <profile_name>"))?;
            let r = ipc::client_request(serde_json::json!({"op":"use","profile":name}))?;
            print_response(&r);
            Ok(())
        }

        Some("feed") => {
            let src: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: giftctl feed <frames.jsonl|->"))?;
            feed(&src)
        }

        Some("replay") => {
            let src: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: giftctl replay <frames.jsonl|-> [--profile name]"))?;
            replay(&src, profile.as_deref())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn simple(op: &str) -> Result<()> {
    let r = ipc::client_request(serde_json::json!({ "op": op }))?;
    print_response(&r);
    Ok(())
}

fn open_lines(src: &str) -> Result<Box<dyn BufRead>> {
    if src == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let f = File::open(src).with_context(|| format!("failed to open {src}"))?;
    Ok(Box::new(BufReader::new(f)))
}

/// Streams recorded frames to the running daemon over one connection.
fn feed(src: &str) -> Result<()> {
    let mut client = Client::connect()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (n, line) in open_lines(src)?.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!("line {}: not JSON: {e}", n + 1);
                continue;
            }
        };
        let r = client.request(&serde_json::json!({"op": "frame", "frame": frame}))?;
        writeln!(out, "{r}")?;
    }
    Ok(())
}

/// Runs frames through a local pipeline; no daemon needed.
fn replay(src: &str, profile: Option<&str>) -> Result<()> {
    let mut cfg = DaemonConfigState::load_or_install_default()?;
    if let Some(name) = profile {
        cfg.use_transient(name)?;
    }
    let mut pipeline = Pipeline::new(&cfg.profile, cfg.assets_dir());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (n, line) in open_lines(src)?.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let resp = match serde_json::from_str::<DetectionFrame>(&line) {
            Ok(frame) => match pipeline.process(&frame) {
                Ok(report) => serde_json::json!({"ok": true, "data": report}),
                Err(e) => serde_json::json!({"ok": false, "error": format!("line {}: {e}", n + 1)}),
            },
            Err(e) => serde_json::json!({"ok": false, "error": format!("line {}: {e}", n + 1)}),
        };
        writeln!(out, "{resp}")?;
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"giftctl — puts a gift on your open hand

USAGE:
  giftctl help [command]          Show general or command-specific help
  giftctl start                   Start the daemon
  giftctl stop                    Stop the daemon
  giftctl status                  Show daemon and session state
  giftctl reload                  Reload active profile
  giftctl use <name>              Switch active profile
  giftctl list                    List profiles
  giftctl doctor                  Check config and gift images
  giftctl reset                   Forget gesture and spawn state
  giftctl feed <file|->           Stream JSONL detection frames to the daemon
  giftctl replay <file|->         Process JSONL detection frames locally
                 [--profile name]

TIPS:
  - Profiles: ~/.config/giftctl/profiles
  - Active profile pointer: ~/.config/giftctl/active
  - Gift images: ~/.config/giftctl/images (see `giftctl doctor`)
  - Socket: ~/.local/run/giftctl.sock (override with GIFTCTL_SOCKET)
  - Log filter: GIFTCTL_LOG=debug
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "start" => println!("usage: giftctl start\nStarts the background daemon."),
        "stop" => println!("usage: giftctl stop\nStops the running daemon."),
        "status" => println!(
            "usage: giftctl status\nShows active profile, socket, frame and spawn counters, current gift."
        ),
        "reload" => println!(
            "usage: giftctl reload\nReloads the current profile; keeps last good on error."
        ),
        "use" => {
            println!("usage: giftctl use <name>\nSwitches active profile to <name> and reloads.")
        }
        "list" => println!("usage: giftctl list\nLists available profiles."),
        "doctor" => println!(
            "usage: giftctl doctor\nReports config locations and which gift images are present."
        ),
        "reset" => println!(
            "usage: giftctl reset\nStarts a fresh session: gift hidden, spawn gate armed."
        ),
        "feed" => println!(
            "usage: giftctl feed <frames.jsonl|->\nSends one detection frame per line and prints each reply."
        ),
        "replay" => println!(
            "usage: giftctl replay <frames.jsonl|-> [--profile name]\nRuns frames through a local session and prints one report per line."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
