//! Tracing subscriber setup for binaries and tests embedding the engine

use crate::Settings;
use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the level is `debug` when
/// `settings.debug` is set and `info` when it is not. Calling this more than
/// once is harmless: only the first subscriber is installed.
pub fn init_logging(settings: &Settings) {
    let default_level = if settings.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sciptrail={default_level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        let settings = Settings::default();
        init_logging(&settings);
        init_logging(&settings);
        tracing::info!("logging initialised twice without panicking");
    }
}
