// ABOUTME: Structured logging setup on top of tracing-subscriber
// ABOUTME: Verbosity flags map to an EnvFilter, output goes to stderr

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV_VAR: &str = "CLASSNOTES_LOG";

fn default_directive(verbose: bool, log_level: Option<&str>) -> String {
    let level = match (verbose, log_level) {
        (_, Some(level)) => level,
        (true, None) => "debug",
        (false, None) => "info",
    };

    if level.contains('=') {
        level.to_string()
    } else {
        format!("classnotes={}", level)
    }
}

/// Initialize logging from CLI flags; `RUST_LOG` or `CLASSNOTES_LOG` win.
pub fn init_tracing(verbose: bool, log_level: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV_VAR))
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}
