//! Diagnostic logging to stderr
//!
//! stdout carries the rendered manifest, so every log line goes to stderr.

use tracing::metadata::Level;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is not set
pub fn default_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins when it parses; otherwise `--verbose` selects `debug`.
pub fn setup_logging(verbose: bool) {
    let default_filter = EnvFilter::new(default_level(verbose).to_string().to_ascii_lowercase());

    let env_filter = match std::env::var("RUST_LOG") {
        Ok(directive) => match EnvFilter::try_new(&directive) {
            Ok(filter) => filter,
            Err(err) => {
                eprintln!("invalid log filter: {err}");
                eprintln!("falling back to default logging");
                default_filter
            }
        },
        Err(_) => default_filter,
    };

    let use_color = std::io::IsTerminal::is_terminal(&std::io::stderr());

    // A second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(use_color)
        .without_time()
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(true), Level::DEBUG);
        assert_eq!(default_level(false), Level::WARN);
    }
}
