use proptest::prelude::*;
use racestats_core::models::{
    ChampionshipDefinition, ChampionshipRules, DriverResults, DriverSessionStats, SessionInfo,
};
use racestats_core::{
    compute_all_time_stats, compute_standings, Championship, SessionRecord, SessionType,
};

fn driver_stats() -> impl Strategy<Value = DriverSessionStats> {
    (
        proptest::option::of(0u32..8),
        proptest::option::of(-5.0f64..120.0),
        proptest::option::of(0u32..2_000),
        proptest::option::of(0u32..12),
    )
        .prop_map(|(position, best_lap, score, laps)| DriverSessionStats {
            position: position.map(f64::from),
            best_lap,
            total_score: score.map(f64::from),
            laps_completed: laps.map(f64::from),
            ..Default::default()
        })
}

fn driver_name() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(vec!["Ana", "Ben", "Cleo", "dave", "Eve", "Finn"])
}

fn session_type() -> impl Strategy<Value = SessionType> {
    prop_oneof![
        Just(SessionType::Practice),
        Just(SessionType::Qualifying),
        Just(SessionType::Race),
        Just(SessionType::Unknown),
    ]
}

fn session() -> impl Strategy<Value = SessionRecord> {
    (
        session_type(),
        proptest::option::of(1u32..12),
        proptest::collection::vec(
            (driver_name(), driver_stats()),
            0..6,
        ),
    )
        .prop_map(|(kind, race_laps, drivers)| SessionRecord {
            id: String::new(),
            championship: Some("Prop Cup".to_string()),
            info: SessionInfo {
                track: "ks_vallelunga".to_string(),
                session_type: kind,
                race_laps: race_laps.map(f64::from),
                ..Default::default()
            },
            drivers: drivers.into_iter().collect::<DriverResults>(),
        })
}

fn championship() -> impl Strategy<Value = Championship> {
    (
        proptest::collection::vec(0u32..30, 0..6),
        proptest::collection::vec(session(), 0..6),
    )
        .prop_map(|(points, sessions)| {
            Championship::new(
                "prop",
                ChampionshipDefinition {
                    name: "Prop Cup".to_string(),
                    rules: Some(ChampionshipRules {
                        points,
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                sessions,
            )
        })
}

proptest! {
    #[test]
    fn standings_are_sorted(champ in championship()) {
        let standings = compute_standings(&champ);
        for pair in standings.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ordered = a.custom_points > b.custom_points
                || (a.custom_points == b.custom_points && a.wins > b.wins)
                || (a.custom_points == b.custom_points && a.wins == b.wins && a.podiums > b.podiums)
                || (a.custom_points == b.custom_points
                    && a.wins == b.wins
                    && a.podiums == b.podiums
                    && a.name <= b.name);
            prop_assert!(ordered, "{:?} before {:?}", a, b);
        }
    }

    #[test]
    fn standings_are_idempotent(champ in championship()) {
        prop_assert_eq!(compute_standings(&champ), compute_standings(&champ));
    }

    #[test]
    fn one_standing_per_distinct_driver(champ in championship()) {
        let mut names: Vec<&str> = champ
            .sessions
            .iter()
            .flat_map(|s| s.drivers.iter().map(|(n, _)| n))
            .collect();
        names.sort();
        names.dedup();
        prop_assert_eq!(compute_standings(&champ).len(), names.len());
    }

    #[test]
    fn drivers_without_races_score_nothing(champ in championship()) {
        let standings = compute_standings(&champ);
        for standing in &standings {
            let raced = champ.sessions.iter().any(|s| {
                s.session_type() == SessionType::Race && s.drivers.get(&standing.name).is_some()
            });
            if !raced {
                prop_assert_eq!(standing.points, 0);
                prop_assert_eq!(standing.custom_points, 0.0);
                prop_assert_eq!(standing.wins, 0);
                prop_assert_eq!(standing.podiums, 0);
                prop_assert_eq!(standing.races_completed, 0);
            }
        }
    }

    #[test]
    fn all_time_is_sorted_and_consistent(
        champs in proptest::collection::vec(championship(), 0..4)
    ) {
        let sessions: Vec<SessionRecord> =
            champs.iter().flat_map(|c| c.sessions.iter().cloned()).collect();
        let stats = compute_all_time_stats(&sessions, &champs);

        for pair in stats.windows(2) {
            let key = |s: &racestats_core::AllTimeStats| {
                (s.first_places, s.second_places, s.third_places, s.podiums)
            };
            let (a, b) = (key(&pair[0]), key(&pair[1]));
            prop_assert!(a > b || (a == b && pair[0].name <= pair[1].name));
        }

        let appearances: u32 = sessions.iter().map(|s| s.drivers.len() as u32).sum();
        prop_assert_eq!(stats.iter().map(|s| s.total_races).sum::<u32>(), appearances);

        for s in &stats {
            prop_assert_eq!(s.podiums, s.first_places + s.second_places + s.third_places);
            prop_assert!(s.abandons <= s.total_races);
        }

        let titles: u32 = stats.iter().map(|s| s.championships_won).sum();
        let contested = champs
            .iter()
            .filter(|c| c.sessions.iter().any(|s| !s.drivers.is_empty()))
            .count() as u32;
        prop_assert_eq!(titles, contested);
    }
}
