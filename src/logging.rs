use env_logger::{Builder, Env};

/// Filter comes from `GIFTCTL_LOG`, e.g. `GIFTCTL_LOG=giftctl=trace`.
pub fn init() {
    let env = Env::default()
        .filter_or("GIFTCTL_LOG", "info")
        .write_style("GIFTCTL_LOG_STYLE");
    Builder::from_env(env).format_timestamp_millis().init();
}
