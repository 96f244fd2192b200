//! Logging configuration
//!
//! Initializes tracing for the application. Log output goes to stderr so
//! that command output on stdout stays machine readable.

/// Initializes logging with the specified level
///
/// `RUST_LOG` takes precedence over `level` when set. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging("debug");
        init_logging("info");
    }
}
