use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/savevault.log";

/// Console logging on stderr, plus a plain-text log file unless
/// `LOG_FILE_PATH` is set to an empty string.
///
/// Keep the returned guard alive for the whole run so the file writer flushes.
pub fn init_logger() -> Option<WorkerGuard> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let location = log_file_location(env::var("LOG_FILE_PATH").ok().as_deref());
    let (file_layer, guard) = match &location {
        Some((dir, file_name)) => {
            let file_appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_thread_names(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .without_time()
                .with_target(false),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    match &location {
        Some((dir, file_name)) => debug!("Logging to {}", dir.join(file_name).display()),
        None => debug!("File logging disabled"),
    }

    guard
}

/// Directory and file name of the log file. Unset means the default file;
/// an empty value turns file logging off.
fn log_file_location(setting: Option<&str>) -> Option<(PathBuf, PathBuf)> {
    let raw = setting.unwrap_or(DEFAULT_LOG_FILE).trim();
    if raw.is_empty() {
        return None;
    }
    let path = Path::new(raw);
    let file_name = PathBuf::from(path.file_name()?);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_file() {
        assert_eq!(
            log_file_location(None),
            Some((PathBuf::from("./logs"), PathBuf::from("savevault.log")))
        );
    }

    #[test]
    fn test_empty_setting_disables_file_logging() {
        assert_eq!(log_file_location(Some("")), None);
        assert_eq!(log_file_location(Some("   ")), None);
    }

    #[test]
    fn test_bare_file_name_goes_to_working_dir() {
        assert_eq!(
            log_file_location(Some("scan.log")),
            Some((PathBuf::from("."), PathBuf::from("scan.log")))
        );
    }
}
