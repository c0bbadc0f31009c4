use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `DSATYPE_LOG=dsatype=debug`
pub const LOG_ENV: &str = "DSATYPE_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Send tracing output to `log_path`; the terminal belongs to the UI.
///
/// The returned guard flushes the writer on drop and must outlive the app. `None`
/// means logging is unavailable (directory not writable, or a subscriber is
/// already installed).
pub fn init(log_path: &Path) -> Option<WorkerGuard> {
    let dir = log_path.parent()?;
    let file_name = log_path.file_name()?;
    std::fs::create_dir_all(dir).ok()?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_only_installs_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("dsatype.log");

        let first = init(&path);
        let second = init(&path);

        assert!(path.parent().unwrap().exists());
        // another test may have installed a subscriber first; at most one wins
        assert!(!(first.is_some() && second.is_some()));
    }
}
