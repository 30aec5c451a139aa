use chrono::Local;
use eyre::Result;
use fern::Dispatch;
use log::LevelFilter;

/// Crates whose debug output drowns the scout's own
const NOISY_TARGETS: [&str; 4] = ["hyper", "reqwest", "alloy_rpc_client", "alloy_transport_http"];

/// The level named by `RUST_LOG`, `info` when unset or unparsable
fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|level| level.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Sets up console logging.
///
/// Lines carry a local timestamp and the level. HTTP and RPC transport
/// crates are capped at `warn`.
///
/// # Errors
/// * If a global logger is already installed
pub fn setup_logger() -> Result<()> {
    let level = level_from(std::env::var("RUST_LOG").ok().as_deref());
    NOISY_TARGETS
        .iter()
        .fold(Dispatch::new().level(level), |dispatch, target| {
            dispatch.level_for(*target, level.min(LevelFilter::Warn))
        })
        .chain(std::io::stdout())
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ));
        })
        .apply()?;
    Ok(())
}
