//! Terminal tables for the text views, built on `comfy_table`.

use comfy_table::{presets::UTF8_FULL_CONDENSED, CellAlignment, Table};
use racestats_core::all_time::AllTimeStats;
use racestats_core::data_processors::UNPLACED_POSITION;
use racestats_core::formatting::{
    format_car_name, format_lap_time, format_number, format_points, format_track_name,
};
use racestats_core::models::SessionRecord;
use racestats_data::analysis::{ChampionshipSummary, SessionSummary};

use CellAlignment::{Left, Right};

// ── Table construction ─────────────────────────────────────────────────────────

/// A table with the shared preset, `headers` as its header row and one
/// alignment per column.
fn new_table(headers: &[(&str, CellAlignment)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(headers.iter().map(|(h, _)| *h).collect::<Vec<_>>());
    for (i, (_, alignment)) in headers.iter().enumerate() {
        if let Some(column) = table.column_mut(i) {
            column.set_cell_alignment(*alignment);
        }
    }
    table
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

// ── Views ──────────────────────────────────────────────────────────────────────

/// All-time driver table, optionally truncated.
pub fn drivers_table(drivers: &[AllTimeStats], limit: Option<usize>) -> String {
    let mut table = new_table(&[
        ("#", Right),
        ("Driver", Left),
        ("Nat", Left),
        ("1st", Right),
        ("2nd", Right),
        ("3rd", Right),
        ("Pod", Right),
        ("Poles", Right),
        ("FL", Right),
        ("Titles", Right),
        ("Races", Right),
        ("Aband", Right),
        ("Crashes", Right),
    ]);
    for (i, d) in take(drivers, limit).iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            d.name.clone(),
            d.nation.clone(),
            d.first_places.to_string(),
            d.second_places.to_string(),
            d.third_places.to_string(),
            d.podiums.to_string(),
            d.poles.to_string(),
            d.fastest_laps.to_string(),
            d.championships_won.to_string(),
            format_number(f64::from(d.total_races), 0),
            d.abandons.to_string(),
            format_number(f64::from(d.total_crashes), 0),
        ]);
    }
    table.to_string()
}

pub fn championships_table(championships: &[ChampionshipSummary], limit: Option<usize>) -> String {
    let mut table = new_table(&[
        ("Id", Left),
        ("Name", Left),
        ("Rounds", Right),
        ("Sessions", Right),
        ("Leader", Left),
    ]);
    for c in take(championships, limit) {
        table.add_row(vec![
            c.id.clone(),
            c.name.clone(),
            format!("{}/{}", c.progress.completed_rounds, c.progress.total_rounds),
            c.session_count.to_string(),
            or_dash(c.leader.clone()),
        ]);
    }
    table.to_string()
}

/// Standings of one championship followed by its round calendar.
pub fn standings_table(championship: &ChampionshipSummary, limit: Option<usize>) -> String {
    let mut table = new_table(&[
        ("Pos", Right),
        ("Driver", Left),
        ("Nat", Left),
        ("Car", Left),
        ("Pts", Right),
        ("Score", Right),
        ("Wins", Right),
        ("Pod", Right),
        ("Poles", Right),
        ("FL", Right),
        ("Races", Right),
    ]);
    for (i, s) in take(&championship.standings, limit).iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            s.name.clone(),
            s.nation.clone(),
            format_car_name(Some(&s.car)),
            s.points.to_string(),
            format_points(s.custom_points),
            s.wins.to_string(),
            s.podiums.to_string(),
            s.poles.to_string(),
            s.fastest_laps.to_string(),
            s.races_completed.to_string(),
        ]);
    }

    let mut rounds = new_table(&[
        ("Round", Right),
        ("Track", Left),
        ("Laps", Right),
        ("Session", Left),
    ]);
    for r in &championship.progress.rounds {
        rounds.add_row(vec![
            r.round.to_string(),
            format_track_name(Some(&r.track)),
            or_dash(r.laps.map(|l| l.to_string())),
            r.session_id.clone().unwrap_or_else(|| "pending".to_string()),
        ]);
    }

    format!(
        "{} ({} of {} rounds)\n\n{}\n\n{}",
        championship.name,
        championship.progress.completed_rounds,
        championship.progress.total_rounds,
        table,
        rounds
    )
}

pub fn sessions_table(sessions: &[SessionSummary], limit: Option<usize>) -> String {
    let mut table = new_table(&[
        ("Date", Left),
        ("Type", Left),
        ("Track", Left),
        ("Championship", Left),
        ("Drivers", Right),
        ("Winner", Left),
        ("Id", Left),
    ]);
    for s in take(sessions, limit) {
        table.add_row(vec![
            s.date.clone(),
            s.session_type.to_string(),
            format_track_name(Some(&s.track)),
            s.championship.clone().unwrap_or_else(|| "quick race".to_string()),
            s.driver_count.to_string(),
            or_dash(s.winner.clone()),
            s.id.clone(),
        ]);
    }
    table.to_string()
}

/// Results of one session ordered by finishing position, under a header with
/// the session's date, track, type and race details.
pub fn session_detail(session: &SessionRecord, limit: Option<usize>) -> String {
    let mut table = new_table(&[
        ("Pos", Right),
        ("Driver", Left),
        ("Car", Left),
        ("Best Lap", Right),
        ("Avg Lap", Right),
        ("Total Time", Right),
        ("Laps", Right),
        ("Score", Right),
        ("Crashes", Right),
    ]);
    let rows = session.drivers.by_position();
    for (name, stats) in take(&rows, limit) {
        let position = stats.position();
        table.add_row(vec![
            if position == UNPLACED_POSITION {
                "-".to_string()
            } else {
                position.to_string()
            },
            name.to_string(),
            format_car_name(stats.car_name()),
            format_lap_time(stats.best_lap_seconds()),
            format_lap_time(stats.average_lap),
            or_dash(
                stats
                    .total_time_seconds
                    .filter(|t| *t > 0.0)
                    .map(|t| format_lap_time(Some(t))),
            ),
            format_number(stats.laps_completed(), 0),
            format_points(stats.total_score()),
            stats.crash_count().to_string(),
        ]);
    }

    let track_name = format_track_name(Some(session.track_id()));
    let track = match session.info.track_config.as_deref().filter(|c| !c.is_empty()) {
        Some(config) => format!("{} ({})", track_name, config),
        None => track_name,
    };
    let header = format!(
        "{} | {} | {} | {}",
        session.info.date,
        track,
        session.session_type(),
        session.championship.as_deref().unwrap_or("quick race")
    );

    let details = race_details(session);
    if details.is_empty() {
        format!("{}\n\n{}", header, table)
    } else {
        format!("{}\n{}\n\n{}", header, details.join(" | "), table)
    }
}

/// Race length, track length and field size, when recorded.
fn race_details(session: &SessionRecord) -> Vec<String> {
    let info = &session.info;
    let mut details = Vec::new();
    if let Some(laps) = info.race_laps_configured() {
        let unit = if laps == 1.0 { "lap" } else { "laps" };
        details.push(format!("Race length: {} {}", format_number(laps, 0), unit));
    }
    if let Some(meters) = info.track_length_meters.filter(|m| *m > 0.0) {
        details.push(format!("Track length: {} km", format_number(meters / 1000.0, 2)));
    }
    if let Some(cars) = info.total_cars.filter(|c| *c > 0.0) {
        details.push(format!("Cars: {}", format_number(cars, 0)));
    }
    details
}

fn take<T>(items: &[T], limit: Option<usize>) -> &[T] {
    match limit {
        Some(n) if n < items.len() => &items[..n],
        _ => items,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
