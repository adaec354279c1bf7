//! Tracing subscriber setup for the binary.

use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

/// Default level for a `-v` count; `RUST_LOG` directives take precedence.
pub fn default_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs a stderr subscriber. Later calls are no-ops.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbosity).into())
        .from_env_lossy();
    let _ = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_level(0), Level::INFO);
        assert_eq!(default_level(1), Level::DEBUG);
        assert_eq!(default_level(5), Level::TRACE);
    }

    #[test]
    fn init_twice_is_harmless() {
        init(0);
        init(2);
    }
}
