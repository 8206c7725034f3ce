//! Core types and the aggregation engine for racestats.
//!
//! Turns parsed session records and championship definitions into ranked
//! championship standings and all-time driver statistics. Everything here is
//! synchronous and free of I/O apart from [`settings`].

pub mod all_time;
pub mod calculations;
pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod standings;

pub use all_time::{compute_all_time_stats, AllTimeStats};
pub use error::{RaceStatsError, Result};
pub use models::{Championship, ChampionshipDefinition, SessionRecord, SessionType};
pub use standings::{championship_progress, compute_standings, ChampionshipProgress, Standing};
