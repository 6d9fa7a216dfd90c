mod assets;
mod cli;
mod config;
mod error;
mod geometry;
mod gestures;
mod ipc;
mod landmarks;
mod logging;
mod render;
mod selector;
mod session;
mod spawn;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
