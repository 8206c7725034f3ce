//! Corpus analysis pipeline.
//!
//! Loads every quick race and championship under a data root, runs the
//! aggregation engine, and returns a [`CorpusReport`] ready for rendering.

use std::path::Path;

use chrono::Utc;
use racestats_core::all_time::{compute_all_time_stats, AllTimeStats};
use racestats_core::calculations::fastest_lap_driver;
use racestats_core::error::{RaceStatsError, Result};
use racestats_core::models::{Championship, SessionRecord, SessionType};
use racestats_core::standings::{
    championship_progress, compute_standings, ChampionshipProgress, Standing,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::reader::{load_championships, load_quick_race_sessions, sort_sessions_by_date};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    pub data_dir: String,
    pub quick_race_sessions: usize,
    pub championship_sessions: usize,
    pub championships: usize,
    pub drivers: usize,
    /// Sum of crash counts over every driver appearance.
    pub total_crashes: u64,
    /// Wall-clock seconds spent reading and parsing files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent in the aggregation engine.
    pub compute_time_seconds: f64,
}

/// One championship with its computed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionshipSummary {
    pub id: String,
    pub name: String,
    pub session_count: usize,
    /// Name of the current standings leader, if anyone has been classified.
    pub leader: Option<String>,
    pub progress: ChampionshipProgress,
    pub standings: Vec<Standing>,
}

/// A one-line view of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub championship: Option<String>,
    pub date: String,
    pub track: String,
    pub session_type: SessionType,
    pub driver_count: usize,
    pub winner: Option<String>,
    pub fastest_lap: Option<String>,
}

/// The complete output of [`analyze_corpus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusReport {
    /// All-time driver table, ranked.
    pub drivers: Vec<AllTimeStats>,
    /// Championships in definition-file order.
    pub championships: Vec<ChampionshipSummary>,
    /// Every session, newest first.
    pub sessions: Vec<SessionSummary>,
    pub metadata: CorpusMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over `root`.
///
/// 1. Load quick races and championships.
/// 2. Compute all-time statistics across every session.
/// 3. Compute standings and progress per championship.
/// 4. Return a [`CorpusReport`].
pub fn analyze_corpus(root: &Path) -> Result<CorpusReport> {
    if !root.is_dir() {
        return Err(RaceStatsError::DataPathNotFound(root.to_path_buf()));
    }

    // ── Step 1: Load ──────────────────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let quick_races = load_quick_race_sessions(root);
    let championships = load_championships(root);
    let load_time = load_start.elapsed().as_secs_f64();

    let all_sessions = collect_sessions(&quick_races, &championships);

    // ── Step 2 & 3: Aggregate ─────────────────────────────────────────────────
    let compute_start = std::time::Instant::now();
    let drivers = compute_all_time_stats(&all_sessions, &championships);
    let summaries: Vec<ChampionshipSummary> =
        championships.iter().map(summarize_championship).collect();
    let compute_time = compute_start.elapsed().as_secs_f64();

    let total_crashes: u64 = all_sessions
        .iter()
        .flat_map(|s| s.drivers.iter())
        .map(|(_, stats)| u64::from(stats.crash_count()))
        .sum();

    let mut ordered = all_sessions;
    sort_sessions_by_date(&mut ordered, false);
    let sessions: Vec<SessionSummary> = ordered.iter().map(summarize_session).collect();

    // ── Step 4: Build report ──────────────────────────────────────────────────
    let metadata = CorpusMetadata {
        generated_at: Utc::now().to_rfc3339(),
        data_dir: root.display().to_string(),
        quick_race_sessions: quick_races.len(),
        championship_sessions: championships.iter().map(|c| c.sessions.len()).sum(),
        championships: championships.len(),
        drivers: drivers.len(),
        total_crashes,
        load_time_seconds: load_time,
        compute_time_seconds: compute_time,
    };

    info!(
        "Analysed {} sessions, {} championships, {} drivers",
        sessions.len(),
        metadata.championships,
        metadata.drivers
    );

    Ok(CorpusReport {
        drivers,
        championships: summaries,
        sessions,
        metadata,
    })
}

/// Standings, progress and leader for one championship.
pub fn summarize_championship(championship: &Championship) -> ChampionshipSummary {
    let standings = compute_standings(championship);
    ChampionshipSummary {
        id: championship.id.clone(),
        name: championship.name().to_string(),
        session_count: championship.sessions.len(),
        leader: standings.first().map(|s| s.name.clone()),
        progress: championship_progress(championship),
        standings,
    }
}

pub fn summarize_session(session: &SessionRecord) -> SessionSummary {
    let winner = session
        .drivers
        .by_position()
        .first()
        .filter(|(_, stats)| stats.position() == 1)
        .map(|(name, _)| name.to_string());

    SessionSummary {
        id: session.id.clone(),
        championship: session.championship.clone(),
        date: session.info.date.clone(),
        track: session.track_id().to_string(),
        session_type: session.session_type(),
        driver_count: session.drivers.len(),
        winner,
        fastest_lap: fastest_lap_driver(&session.drivers).map(str::to_string),
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Quick races followed by each championship's sessions.
fn collect_sessions(
    quick_races: &[SessionRecord],
    championships: &[Championship],
) -> Vec<SessionRecord> {
    quick_races
        .iter()
        .chain(championships.iter().flat_map(|c| c.sessions.iter()))
        .cloned()
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
