//! All-time driver statistics across every recorded session.
//!
//! Two passes: per-session accumulation over the whole corpus, then a
//! championship-win back-fill from each championship's final standings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::{by_name, descending, fastest_lap_driver, is_podium};
use crate::models::{Championship, DriverSessionStats, SessionRecord, SessionType, UNKNOWN_NATION};
use crate::standings::compute_standings;

// ── AllTimeStats ──────────────────────────────────────────────────────────────

/// Career record of one driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllTimeStats {
    pub name: String,
    pub nation: String,
    pub first_places: u32,
    pub second_places: u32,
    pub third_places: u32,
    pub poles: u32,
    /// Non-podium finishes short of the configured race distance.
    pub abandons: u32,
    pub fastest_laps: u32,
    pub total_crashes: u32,
    pub championships_won: u32,
    pub total_races: u32,
    pub podiums: u32,
}

impl AllTimeStats {
    fn new(name: &str, nation: String) -> Self {
        Self {
            name: name.to_string(),
            nation,
            first_places: 0,
            second_places: 0,
            third_places: 0,
            poles: 0,
            abandons: 0,
            fastest_laps: 0,
            total_crashes: 0,
            championships_won: 0,
            total_races: 0,
            podiums: 0,
        }
    }

    /// Fold one session appearance into the record.
    fn add_appearance(&mut self, stats: &DriverSessionStats, race_laps: Option<f64>) {
        let position = stats.position();
        match position {
            1 => self.first_places += 1,
            2 => self.second_places += 1,
            3 => self.third_places += 1,
            _ => {}
        }
        if is_podium(position) {
            self.podiums += 1;
        }
        if let Some(laps) = race_laps {
            if stats.laps_completed() < laps && !is_podium(position) {
                self.abandons += 1;
            }
        }
        self.total_crashes = self.total_crashes.saturating_add(stats.crash_count());
        self.total_races += 1;
    }

    /// Career ranking: first, second, third places and podiums (descending),
    /// then name ascending.
    pub fn ranking_cmp(&self, other: &Self) -> std::cmp::Ordering {
        descending(&self.first_places, &other.first_places)
            .then_with(|| descending(&self.second_places, &other.second_places))
            .then_with(|| descending(&self.third_places, &other.third_places))
            .then_with(|| descending(&self.podiums, &other.podiums))
            .then_with(|| by_name(&self.name, &other.name))
    }
}

// ── compute_all_time_stats ────────────────────────────────────────────────────

/// Rank every driver seen in `sessions`.
///
/// `sessions` should be the whole corpus: quick races plus every
/// championship's sessions. `championships` supply entrant nations and the
/// championship titles credited in the second pass.
pub fn compute_all_time_stats(
    sessions: &[SessionRecord],
    championships: &[Championship],
) -> Vec<AllTimeStats> {
    let nations = nation_lookup(championships);

    let mut rows: Vec<AllTimeStats> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    // ── Pass 1: per-session accumulation ──────────────────────────────────────
    for session in sessions {
        let kind = session.session_type();
        let race_laps = session.info.race_laps_configured();

        for (name, stats) in session.drivers.iter() {
            let idx = *index.entry(name.to_string()).or_insert_with(|| {
                let nation = nations.get(name).copied().unwrap_or(UNKNOWN_NATION);
                rows.push(AllTimeStats::new(name, nation.to_string()));
                rows.len() - 1
            });
            rows[idx].add_appearance(stats, race_laps);
        }

        if let Some(name) = fastest_lap_driver(&session.drivers) {
            let idx = index[name];
            if kind == SessionType::Qualifying {
                rows[idx].poles += 1;
            }
            if kind.counts_fastest_lap() {
                rows[idx].fastest_laps += 1;
            }
        }
    }

    // ── Pass 2: championship titles ───────────────────────────────────────────
    for championship in championships {
        if championship.sessions.is_empty() {
            continue;
        }
        let standings = compute_standings(championship);
        let Some(winner) = standings.first() else {
            continue;
        };
        match index.get(&winner.name) {
            Some(&idx) => rows[idx].championships_won += 1,
            None => debug!(
                "Champion {} of {} has no session record; title not credited",
                winner.name,
                championship.name()
            ),
        }
    }

    rows.sort_by(AllTimeStats::ranking_cmp);

    debug!(
        "All-time stats: {} drivers from {} sessions and {} championships",
        rows.len(),
        sessions.len(),
        championships.len()
    );

    rows
}

/// Entrant name → nation across all championships; first occurrence wins.
fn nation_lookup(championships: &[Championship]) -> HashMap<&str, &str> {
    let mut nations = HashMap::new();
    for entrant in championships.iter().flat_map(|c| &c.definition.entrants) {
        if entrant.nation.is_empty() {
            continue;
        }
        nations
            .entry(entrant.name.as_str())
            .or_insert(entrant.nation.as_str());
    }
    nations
}

// ── Tests ─────────────────────────────────────────────────────────────────────
