use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "jarvis=info";

/// Sends `tracing` output to a file; stderr would tear the alternate screen.
/// Level comes from `JARVIS_LOG` (e.g. `JARVIS_LOG=jarvis=debug`).
pub fn init(log_path: &Path) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let filter =
        EnvFilter::try_from_env("JARVIS_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second init (tests, re-entry) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();
    Ok(())
}

/// Shortens identity tokens before they reach a log line.
pub fn redact(value: &str) -> String {
    let visible: String = value.chars().take(3).collect();
    if value.chars().count() <= 3 {
        "***".to_string()
    } else {
        format!("{visible}***")
    }
}

#[cfg(test)]
mod tests {
    use super::redact;

    #[test]
    fn redact_keeps_only_a_short_prefix() {
        assert_eq!(redact("abc123"), "abc***");
        assert_eq!(redact("ab"), "***");
        assert_eq!(redact(""), "***");
    }
}
