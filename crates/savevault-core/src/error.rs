use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] toml::de::Error),

    #[error("Invalid ignore pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("{0}")]
    Other(String),
}

/// Marker returned when the caller asked the discovery to stop.
///
/// Kept apart from [`Error`] so a handler that logs and skips failed items
/// can never swallow a cancellation by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("discovery cancelled")
    }
}

impl std::error::Error for Cancelled {}
