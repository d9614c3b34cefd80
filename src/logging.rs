// logging.rs
use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the global `env_logger` backend once.
///
/// `filter` uses the `env_logger` syntax (e.g. "info" or "r3d3=debug,wgpu=warn").
/// Without one, `RUST_LOG` is consulted, then `info` is used. Later calls are ignored.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        // Tests may race on init; a second logger is not an error for us.
        let _ = builder.try_init();

        log::debug!("logging initialized");
    });
}
