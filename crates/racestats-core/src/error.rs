use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the racestats loader and front end.
///
/// The aggregation engine itself never returns an error; these variants belong
/// to the layers that discover and parse files around it.
#[derive(Error, Debug)]
pub enum RaceStatsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The expected data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No `.champ` file exists for the requested championship id.
    #[error("No such championship: {0}")]
    ChampionshipNotFound(String),

    /// No session file exists for the requested session id.
    #[error("No such session: {0}")]
    SessionNotFound(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the racestats crates.
pub type Result<T> = std::result::Result<T, RaceStatsError>;
