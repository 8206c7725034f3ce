//! Championship standings.
//!
//! Folds the sessions of one championship into a per-driver [`Standing`] and
//! ranks the result. Pure: no I/O, no state between calls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::{
    by_name, descending, descending_score, fastest_lap_driver, is_podium, table_points,
};
use crate::models::{
    Championship, DriverSessionStats, Entrant, SessionRecord, SessionType, UNKNOWN_CAR,
    UNKNOWN_NATION,
};

// ── Standing ──────────────────────────────────────────────────────────────────

/// A driver's accumulated championship record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub name: String,
    /// Points from the championship's points table.
    pub points: u32,
    /// Sum of the raw session `total_score` values; the primary ranking key.
    pub custom_points: f64,
    pub wins: u32,
    pub podiums: u32,
    pub poles: u32,
    pub fastest_laps: u32,
    pub races_completed: u32,
    pub car: String,
    pub nation: String,
}

impl Standing {
    fn new(name: &str, car: String, nation: String) -> Self {
        Self {
            name: name.to_string(),
            points: 0,
            custom_points: 0.0,
            wins: 0,
            podiums: 0,
            poles: 0,
            fastest_laps: 0,
            races_completed: 0,
            car,
            nation,
        }
    }

    /// Accumulate one race result.
    fn add_race_result(&mut self, stats: &DriverSessionStats, points_table: &[u32]) {
        let position = stats.position();
        self.points = self.points.saturating_add(table_points(points_table, position));
        self.custom_points += stats.total_score();
        if position == 1 {
            self.wins += 1;
        }
        if is_podium(position) {
            self.podiums += 1;
        }
        self.races_completed += 1;
    }

    /// Championship ranking: custom points, wins, podiums (all descending),
    /// then name ascending.
    pub fn ranking_cmp(&self, other: &Self) -> std::cmp::Ordering {
        descending_score(self.custom_points, other.custom_points)
            .then_with(|| descending(&self.wins, &other.wins))
            .then_with(|| descending(&self.podiums, &other.podiums))
            .then_with(|| by_name(&self.name, &other.name))
    }
}

// ── StandingsTable ────────────────────────────────────────────────────────────

/// Insertion-ordered accumulator keyed by driver name.
struct StandingsTable {
    rows: Vec<Standing>,
    index: HashMap<String, usize>,
}

impl StandingsTable {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Standing> {
        let idx = *self.index.get(name)?;
        self.rows.get_mut(idx)
    }

    fn get_or_insert_with(
        &mut self,
        name: &str,
        make: impl FnOnce() -> Standing,
    ) -> &mut Standing {
        let idx = match self.index.get(name) {
            Some(idx) => *idx,
            None => {
                self.rows.push(make());
                self.index.insert(name.to_string(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        &mut self.rows[idx]
    }
}

// ── compute_standings ─────────────────────────────────────────────────────────

/// Rank every driver who appears in any session of `championship`.
///
/// * Qualifying sessions award a pole to the fastest lap.
/// * Race sessions award a fastest lap, table points, custom points, wins,
///   podiums and a completed race to every driver listed.
/// * Practice and untyped sessions only introduce drivers.
///
/// Only sessions explicitly typed `race` score. Recorder files that carry no
/// session type therefore add nothing here, even though
/// [`championship_progress`] counts the same sessions as completed rounds.
///
/// Configured entrants who never appear are not listed.
pub fn compute_standings(championship: &Championship) -> Vec<Standing> {
    let definition = &championship.definition;
    let points_table = definition.points_table();

    let entrants: HashMap<&str, &Entrant> = definition
        .entrants
        .iter()
        .map(|e| (e.name.as_str(), e))
        .collect();

    let mut table = StandingsTable::new();

    // Materialise every driver first so metadata reflects the latest session.
    for session in &championship.sessions {
        for (name, stats) in session.drivers.iter() {
            let entrant = entrants.get(name).copied();
            let standing = table.get_or_insert_with(name, || {
                Standing::new(name, entrant_car(entrant), entrant_nation(entrant))
            });
            if let Some(car) = stats.car_name() {
                standing.car = car.to_string();
            }
        }
    }

    for session in &championship.sessions {
        match session.session_type() {
            SessionType::Qualifying => award_pole(&mut table, session),
            SessionType::Race => {
                if let Some(name) = fastest_lap_driver(&session.drivers) {
                    if let Some(standing) = table.get_mut(name) {
                        standing.fastest_laps += 1;
                    }
                }
                for (name, stats) in session.drivers.iter() {
                    if let Some(standing) = table.get_mut(name) {
                        standing.add_race_result(stats, points_table);
                    }
                }
            }
            SessionType::Practice | SessionType::Unknown => {}
        }
    }

    let mut standings = table.rows;
    standings.sort_by(Standing::ranking_cmp);

    debug!(
        "Standings for {}: {} drivers from {} sessions",
        championship.name(),
        standings.len(),
        championship.sessions.len()
    );

    standings
}

fn award_pole(table: &mut StandingsTable, session: &SessionRecord) {
    if let Some(name) = fastest_lap_driver(&session.drivers) {
        if let Some(standing) = table.get_mut(name) {
            standing.poles += 1;
        }
    }
}

fn entrant_car(entrant: Option<&Entrant>) -> String {
    entrant
        .map(|e| e.car.as_str())
        .filter(|car| !car.is_empty())
        .unwrap_or(UNKNOWN_CAR)
        .to_string()
}

fn entrant_nation(entrant: Option<&Entrant>) -> String {
    entrant
        .map(|e| e.nation.as_str())
        .filter(|nation| !nation.is_empty())
        .unwrap_or(UNKNOWN_NATION)
        .to_string()
}

// ── Championship progress ─────────────────────────────────────────────────────

/// Status of one scheduled round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundProgress {
    /// 1-based round number.
    pub round: usize,
    pub track: String,
    pub laps: Option<u32>,
    /// Id of the session that ran this round, if any.
    pub session_id: Option<String>,
}

impl RoundProgress {
    pub fn is_completed(&self) -> bool {
        self.session_id.is_some()
    }
}

/// How far through its calendar a championship is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionshipProgress {
    pub rounds: Vec<RoundProgress>,
    pub completed_rounds: usize,
    pub total_rounds: usize,
}

/// Match each configured round to the earliest unused race (or untyped)
/// session held at the same track.
pub fn championship_progress(championship: &Championship) -> ChampionshipProgress {
    let mut used = vec![false; championship.sessions.len()];

    let rounds: Vec<RoundProgress> = championship
        .definition
        .rounds
        .iter()
        .enumerate()
        .map(|(i, round)| {
            let matched = championship
                .sessions
                .iter()
                .enumerate()
                .find(|(j, session)| {
                    !used[*j]
                        && session.session_type().counts_fastest_lap()
                        && track_matches(&round.track, session)
                })
                .map(|(j, session)| (j, session.id.clone()));

            let session_id = matched.map(|(j, id)| {
                used[j] = true;
                id
            });

            RoundProgress {
                round: i + 1,
                track: round.track.clone(),
                laps: round.laps.filter(|l| *l > 0.0).map(|l| l as u32),
                session_id,
            }
        })
        .collect();

    let completed_rounds = rounds.iter().filter(|r| r.is_completed()).count();
    let total_rounds = rounds.len();

    ChampionshipProgress {
        rounds,
        completed_rounds,
        total_rounds,
    }
}

/// Round tracks may be written as `track` or `track/layout`.
fn track_matches(round_track: &str, session: &SessionRecord) -> bool {
    let track = session.track_id();
    if track.is_empty() || round_track.is_empty() {
        return false;
    }
    if round_track == track {
        return true;
    }
    match round_track.split_once('/') {
        Some((base, layout)) => {
            base == track
                && session
                    .info
                    .track_config
                    .as_deref()
                    .map_or(true, |config| config == layout)
        }
        None => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChampionshipDefinition, ChampionshipRound, ChampionshipRules, DriverResults, SessionInfo,
    };

    fn result(
        position: Option<f64>,
        best_lap: Option<f64>,
        score: Option<f64>,
    ) -> DriverSessionStats {
        DriverSessionStats {
            position,
            best_lap,
            total_score: score,
            laps_completed: Some(10.0),
            ..Default::default()
        }
    }

    fn session(
        id: &str,
        kind: SessionType,
        track: &str,
        drivers: Vec<(&str, DriverSessionStats)>,
    ) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            championship: Some("Cup".to_string()),
            info: SessionInfo {
                track: track.to_string(),
                session_type: kind,
                ..Default::default()
            },
            drivers: drivers.into_iter().collect::<DriverResults>(),
        }
    }

    fn championship(points: Vec<u32>, sessions: Vec<SessionRecord>) -> Championship {
        Championship::new(
            "cup-1",
            ChampionshipDefinition {
                name: "Cup".to_string(),
                rules: Some(ChampionshipRules {
                    points,
                    ..Default::default()
                }),
                entrants: vec![Entrant {
                    name: "Alice".to_string(),
                    nation: "ITA".to_string(),
                    car: "ks_audi_tt_cup".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            sessions,
        )
    }

    fn find<'a>(standings: &'a [Standing], name: &str) -> &'a Standing {
        standings.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_two_race_swap_scenario() {
        let champ = championship(
            vec![25, 18, 15],
            vec![
                session(
                    "r1",
                    SessionType::Race,
                    "monza",
                    vec![
                        ("Alice", result(Some(1.0), Some(90.0), Some(100.0))),
                        ("Bob", result(Some(2.0), Some(91.0), Some(100.0))),
                    ],
                ),
                session(
                    "r2",
                    SessionType::Race,
                    "imola",
                    vec![
                        ("Alice", result(Some(2.0), Some(92.0), Some(100.0))),
                        ("Bob", result(Some(1.0), Some(91.5), Some(100.0))),
                    ],
                ),
            ],
        );

        let standings = compute_standings(&champ);
        assert_eq!(standings.len(), 2);
        for s in &standings {
            assert_eq!(s.points, 43);
            assert_eq!(s.wins, 1);
            assert_eq!(s.podiums, 2);
            assert_eq!(s.races_completed, 2);
            assert_eq!(s.custom_points, 200.0);
        }
        // Everything ties: name decides.
        assert_eq!(standings[0].name, "Alice");
        assert_eq!(standings[1].name, "Bob");
    }

    #[test]
    fn test_custom_points_rank_before_wins() {
        let champ = championship(
            vec![25, 18, 15],
            vec![session(
                "r1",
                SessionType::Race,
                "monza",
                vec![
                    ("Alice", result(Some(1.0), None, Some(100.0))),
                    ("Bob", result(Some(2.0), None, Some(150.0))),
                ],
            )],
        );
        let standings = compute_standings(&champ);
        assert_eq!(standings[0].name, "Bob");
        assert_eq!(standings[0].points, 18);
        assert_eq!(standings[1].points, 25);
    }

    #[test]
    fn test_qualifying_awards_pole_only() {
        let champ = championship(
            vec![25, 18, 15],
            vec![session(
                "q1",
                SessionType::Qualifying,
                "monza",
                vec![
                    ("Alice", result(Some(1.0), Some(89.9), Some(500.0))),
                    ("Bob", result(Some(2.0), Some(90.1), Some(400.0))),
                ],
            )],
        );
        let standings = compute_standings(&champ);
        let alice = find(&standings, "Alice");
        assert_eq!(alice.poles, 1);
        assert_eq!(alice.points, 0);
        assert_eq!(alice.custom_points, 0.0);
        assert_eq!(alice.wins, 0);
        assert_eq!(alice.podiums, 0);
        assert_eq!(alice.races_completed, 0);
        assert_eq!(find(&standings, "Bob").poles, 0);
    }

    #[test]
    fn test_race_awards_fastest_lap() {
        let champ = championship(
            vec![25],
            vec![session(
                "r1",
                SessionType::Race,
                "monza",
                vec![
                    ("Alice", result(Some(1.0), Some(91.0), None)),
                    ("Bob", result(Some(2.0), Some(90.0), None)),
                ],
            )],
        );
        let standings = compute_standings(&champ);
        assert_eq!(find(&standings, "Bob").fastest_laps, 1);
        assert_eq!(find(&standings, "Alice").fastest_laps, 0);
        assert_eq!(find(&standings, "Alice").poles, 0);
    }

    #[test]
    fn test_no_valid_laps_no_pole_or_fastest_lap() {
        let champ = championship(
            vec![25],
            vec![
                session(
                    "q1",
                    SessionType::Qualifying,
                    "monza",
                    vec![
                        ("Alice", result(Some(1.0), Some(0.0), None)),
                        ("Bob", result(Some(2.0), None, None)),
                    ],
                ),
                session(
                    "r1",
                    SessionType::Race,
                    "monza",
                    vec![
                        ("Alice", result(Some(1.0), Some(-1.0), None)),
                    ],
                ),
            ],
        );
        let standings = compute_standings(&champ);
        assert!(standings.iter().all(|s| s.poles == 0 && s.fastest_laps == 0));
    }

    #[test]
    fn test_practice_and_untyped_sessions_only_register_drivers() {
        let champ = championship(
            vec![25],
            vec![
                session(
                    "p1",
                    SessionType::Practice,
                    "monza",
                    vec![
                        ("Carl", result(Some(1.0), Some(80.0), Some(999.0))),
                    ],
                ),
                session(
                    "u1",
                    SessionType::Unknown,
                    "monza",
                    vec![
                        ("Dana", result(Some(1.0), Some(80.0), Some(999.0))),
                    ],
                ),
            ],
        );
        let standings = compute_standings(&champ);
        assert_eq!(standings.len(), 2);
        for s in &standings {
            assert_eq!(s.points, 0);
            assert_eq!(s.custom_points, 0.0);
            assert_eq!(s.races_completed, 0);
            assert_eq!(s.fastest_laps, 0);
        }
    }

    #[test]
    fn test_invalid_position_counts_race_but_scores_nothing() {
        let champ = championship(
            vec![25, 18, 15],
            vec![session(
                "r1",
                SessionType::Race,
                "monza",
                vec![
                    ("Alice", result(None, None, Some(10.0))),
                    ("Bob", result(Some(0.0), None, None)),
                    ("Carl", result(Some(7.0), None, None)),
                ],
            )],
        );
        let standings = compute_standings(&champ);
        for s in &standings {
            assert_eq!(s.points, 0);
            assert_eq!(s.wins, 0);
            assert_eq!(s.podiums, 0);
            assert_eq!(s.races_completed, 1);
        }
        assert_eq!(find(&standings, "Alice").custom_points, 10.0);
    }

    #[test]
    fn test_metadata_seeding() {
        let mut with_car = result(Some(1.0), None, None);
        with_car.car_name = Some("ks_bmw_m3_e30".to_string());
        let champ = championship(
            vec![25],
            vec![
                session(
                    "r1",
                    SessionType::Race,
                    "monza",
                    vec![
                        ("Alice", result(Some(1.0), None, None)),
                        ("Stranger", result(Some(2.0), None, None)),
                    ],
                ),
                session("r2", SessionType::Race, "imola", vec![("Stranger", with_car)]),
            ],
        );
        let standings = compute_standings(&champ);

        let alice = find(&standings, "Alice");
        assert_eq!(alice.car, "ks_audi_tt_cup");
        assert_eq!(alice.nation, "ITA");

        let stranger = find(&standings, "Stranger");
        assert_eq!(stranger.car, "ks_bmw_m3_e30");
        assert_eq!(stranger.nation, UNKNOWN_NATION);
    }

    #[test]
    fn test_session_car_overrides_entrant_and_latest_wins() {
        let mut early = result(Some(1.0), None, None);
        early.car_name = Some("car_a".to_string());
        let mut late = result(Some(1.0), None, None);
        late.car_name = Some("car_b".to_string());
        let champ = championship(
            vec![25],
            vec![
                session("r1", SessionType::Race, "monza", vec![("Alice", early)]),
                session("r2", SessionType::Race, "monza", vec![("Alice", late)]),
                session(
                    "r3",
                    SessionType::Race,
                    "monza",
                    vec![("Alice", result(Some(1.0), None, None))],
                ),
            ],
        );
        let standings = compute_standings(&champ);
        assert_eq!(standings[0].car, "car_b");
    }

    #[test]
    fn test_unknown_car_without_any_metadata() {
        let champ = championship(
            vec![25],
            vec![session(
                "r1",
                SessionType::Race,
                "monza",
                vec![("Nobody", result(Some(1.0), None, None))],
            )],
        );
        assert_eq!(compute_standings(&champ)[0].car, UNKNOWN_CAR);
    }

    #[test]
    fn test_entrants_not_pre_seeded() {
        let champ = championship(vec![25], vec![]);
        assert!(compute_standings(&champ).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let champ = championship(
            vec![10, 5],
            vec![session(
                "r1",
                SessionType::Race,
                "monza",
                vec![
                    ("Alice", result(Some(2.0), Some(90.0), Some(3.0))),
                    ("Bob", result(Some(1.0), Some(91.0), Some(3.0))),
                ],
            )],
        );
        assert_eq!(compute_standings(&champ), compute_standings(&champ));
    }

    #[test]
    fn test_huge_points_table_saturates() {
        let champ = championship(
            vec![3_000_000_000],
            vec![
                session(
                    "r1",
                    SessionType::Race,
                    "monza",
                    vec![("Alice", result(Some(1.0), None, None))],
                ),
                session(
                    "r2",
                    SessionType::Race,
                    "imola",
                    vec![("Alice", result(Some(1.0), None, None))],
                ),
            ],
        );
        let standings = compute_standings(&champ);
        assert_eq!(standings[0].points, u32::MAX);
        assert_eq!(standings[0].wins, 2);
    }

    // ── championship_progress ─────────────────────────────────────────────────

    fn with_rounds(mut champ: Championship, tracks: &[&str]) -> Championship {
        champ.definition.rounds = tracks
            .iter()
            .map(|t| ChampionshipRound {
                track: t.to_string(),
                laps: Some(10.0),
                ..Default::default()
            })
            .collect();
        champ
    }

    #[test]
    fn test_progress_matches_rounds_in_order() {
        let champ = with_rounds(
            championship(
                vec![25],
                vec![
                    session("q1", SessionType::Qualifying, "monza", vec![]),
                    session("r1", SessionType::Race, "monza", vec![]),
                    session("r2", SessionType::Race, "monza", vec![]),
                ],
            ),
            &["monza", "imola", "monza"],
        );
        let progress = championship_progress(&champ);
        assert_eq!(progress.total_rounds, 3);
        assert_eq!(progress.completed_rounds, 2);
        assert_eq!(progress.rounds[0].session_id.as_deref(), Some("r1"));
        assert_eq!(progress.rounds[1].session_id, None);
        assert_eq!(progress.rounds[2].session_id.as_deref(), Some("r2"));
        assert_eq!(progress.rounds[0].laps, Some(10));
        assert_eq!(progress.rounds[2].round, 3);
    }

    #[test]
    fn test_progress_layout_suffix() {
        let mut race = session("r1", SessionType::Race, "ks_vallelunga", vec![]);
        race.info.track_config = Some("club_circuit".to_string());
        let champ = with_rounds(
            championship(vec![25], vec![race]),
            &["ks_vallelunga/extended_circuit", "ks_vallelunga/club_circuit"],
        );
        let progress = championship_progress(&champ);
        assert!(!progress.rounds[0].is_completed());
        assert!(progress.rounds[1].is_completed());
    }
}
