mod bootstrap;
mod render;

use std::path::Path;

use anyhow::Result;
use racestats_core::error::RaceStatsError;
use racestats_core::settings::Settings;
use racestats_data::analysis::{analyze_corpus, summarize_championship};
use racestats_data::reader::{load_championship, load_session};
use serde::Serialize;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;
    settings.validate()?;

    tracing::info!("racestats v{} starting", env!("CARGO_PKG_VERSION"));

    let data_dir = settings.resolve_data_dir();
    tracing::info!("View: {}, data directory: {}", settings.view, data_dir.display());

    let output = run(&settings, &data_dir)?;
    println!("{}", output);

    Ok(())
}

/// Produce the text for the selected view.
fn run(settings: &Settings, data_dir: &Path) -> Result<String> {
    if !data_dir.is_dir() {
        return Err(RaceStatsError::DataPathNotFound(data_dir.to_path_buf()).into());
    }

    let limit = settings.limit;

    let output = match settings.view.as_str() {
        "drivers" => {
            let report = analyze_corpus(data_dir)?;
            if settings.is_json() {
                to_json(&limited(&report.drivers, limit))?
            } else {
                render::drivers_table(&report.drivers, limit)
            }
        }

        "championships" => {
            let report = analyze_corpus(data_dir)?;
            if settings.is_json() {
                to_json(&limited(&report.championships, limit))?
            } else {
                render::championships_table(&report.championships, limit)
            }
        }

        "sessions" => {
            let report = analyze_corpus(data_dir)?;
            if settings.is_json() {
                to_json(&limited(&report.sessions, limit))?
            } else {
                render::sessions_table(&report.sessions, limit)
            }
        }

        "standings" => {
            let id = settings.championship.as_deref().unwrap_or_default();
            let championship = load_championship(data_dir, id)?;
            let mut summary = summarize_championship(&championship);
            if settings.is_json() {
                summary.standings = limited(&summary.standings, limit);
                to_json(&summary)?
            } else {
                render::standings_table(&summary, limit)
            }
        }

        "session" => {
            let id = settings.session.as_deref().unwrap_or_default();
            let session = load_session(data_dir, id)?;
            if settings.is_json() {
                to_json(&serde_json::json!({
                    "id": session.id,
                    "championship": session.championship,
                    "session": session,
                }))?
            } else {
                render::session_detail(&session, limit)
            }
        }

        unknown => anyhow::bail!("Unknown view: {}", unknown),
    };

    Ok(output)
}

fn limited<T: Clone>(items: &[T], limit: Option<usize>) -> Vec<T> {
    items.iter().take(limit.unwrap_or(usize::MAX)).cloned().collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_json(dir: &Path, name: &str, value: serde_json::Value) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }

    fn corpus() -> TempDir {
        let root = TempDir::new().unwrap();
        write_json(
            &root.path().join("quick_race"),
            "q1.json",
            json!({
                "session_info": {"date": "2025-03-01 18:00:00", "track": "ks_monza",
                                 "session_type": "race"},
                "driver_statistics": {
                    "Alice": {"position": 1, "best_lap": 101.0},
                    "Bob": {"position": 2, "best_lap": 100.0},
                    "Cara": {"position": 3, "best_lap": 102.0},
                }
            }),
        );
        let champ = root.path().join("championship");
        write_json(
            &champ,
            "cup.champ",
            json!({"name": "Cup", "rules": {"points": [3, 2, 1]},
                   "opponents": [{"name": "Bob", "nation": "GBR"}],
                   "rounds": [{"track": "ks_monza", "laps": 3}]}),
        );
        write_json(
            &champ.join("cup"),
            "r1.json",
            json!({
                "session_info": {"date": "2025-01-01 10:00:00", "track": "ks_monza",
                                 "session_type": "race"},
                "driver_statistics": {"Bob": {"position": 1}, "Alice": {"position": 2}}
            }),
        );
        root
    }

    fn settings(args: &[&str]) -> Settings {
        let mut argv = vec!["racestats"];
        argv.extend_from_slice(args);
        Settings::from_args(argv)
    }

    #[test]
    fn test_run_missing_data_dir() {
        let err = run(&settings(&[]), Path::new("/tmp/racestats-missing-xyz")).unwrap_err();
        assert!(err.to_string().starts_with("Data path not found"));
    }

    #[test]
    fn test_run_drivers_table() {
        let root = corpus();
        let out = run(&settings(&[]), root.path()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let row = |name: &str| lines.iter().position(|l| l.contains(name)).unwrap();
        assert!(row("Driver") < row("Alice"));
        assert!(row("Alice") < row("Bob"));
        assert!(lines[row("Bob")].contains("GBR"));
    }

    #[test]
    fn test_run_drivers_json_with_limit() {
        let root = corpus();
        let out = run(&settings(&["--format", "json", "--limit", "2"]), root.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Alice");
        assert_eq!(rows[1]["championshipsWon"], 1);
    }

    #[test]
    fn test_run_championships_view() {
        let root = corpus();
        let out = run(&settings(&["--view", "championships"]), root.path()).unwrap();
        assert!(out.contains("Cup"));
        assert!(out.contains("1/1"));
    }

    #[test]
    fn test_run_standings_json() {
        let root = corpus();
        let out = run(
            &settings(&["--view", "standings", "--championship", "cup", "--format", "json"]),
            root.path(),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["name"], "Cup");
        assert_eq!(value["standings"][0]["name"], "Bob");
        assert_eq!(value["standings"][0]["points"], 3);
    }

    #[test]
    fn test_run_standings_unknown_championship() {
        let root = corpus();
        let err = run(
            &settings(&["--view", "standings", "--championship", "nope"]),
            root.path(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_run_sessions_and_session_views() {
        let root = corpus();
        let out = run(&settings(&["--view", "sessions"]), root.path()).unwrap();
        assert!(out.contains("quick_race/q1.json"));
        assert!(out.contains("championship/cup/r1.json"));

        let out = run(
            &settings(&["--view", "session", "--session", "quick_race/q1.json"]),
            root.path(),
        )
        .unwrap();
        assert!(out.contains("Monza"));
        assert!(out.contains("1:40.000"));
    }
}
