use clap::Parser;
use std::path::{Path, PathBuf};

use crate::error::{RaceStatsError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Championship standings and all-time driver statistics from recorded race sessions
#[derive(Parser, Debug, Clone)]
#[command(
    name = "racestats",
    about = "Championship standings and all-time driver statistics from recorded race sessions",
    version
)]
pub struct Settings {
    /// Data directory containing `quick_race/` and `championship/`
    #[arg(long, env = "RACESTATS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// What to show
    #[arg(
        long,
        default_value = "drivers",
        value_parser = ["drivers", "championships", "standings", "sessions", "session"]
    )]
    pub view: String,

    /// Championship id (the `.champ` file stem) for the standings view
    #[arg(long)]
    pub championship: Option<String>,

    /// Session id (path relative to the data directory) for the session view
    #[arg(long)]
    pub session: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Maximum number of rows to print
    #[arg(long)]
    pub limit: Option<usize>,

    /// Logging level
    #[arg(
        long,
        default_value = "WARNING",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::from_args(std::env::args_os())
    }

    /// Parse an explicit argument list and apply the `--debug` override.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Check that the flags a view depends on are present.
    pub fn validate(&self) -> Result<()> {
        match self.view.as_str() {
            "standings" if self.championship.is_none() => Err(RaceStatsError::Config(
                "--championship is required for the standings view".to_string(),
            )),
            "session" if self.session.is_none() => Err(RaceStatsError::Config(
                "--session is required for the session view".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }

    /// Resolve the data directory.
    ///
    /// Order: `--data-dir` / `RACESTATS_DATA_DIR`, then `./app/data` when it
    /// exists, then `~/.racestats/data`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        self.resolve_data_dir_in(&cwd, &home)
    }

    /// Same as [`Settings::resolve_data_dir`] with explicit roots, for tests.
    pub fn resolve_data_dir_in(&self, cwd: &Path, home: &Path) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        let local = cwd.join("app").join("data");
        if local.is_dir() {
            return local;
        }
        home.join(".racestats").join("data")
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
