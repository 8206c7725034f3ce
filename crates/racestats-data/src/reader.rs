//! Session and championship file discovery and loading.
//!
//! Expected layout under the data root:
//!
//! ```text
//! quick_race/<file>.json            freestanding sessions
//! championship/<id>.champ           championship definitions
//! championship/<id>/<file>.json     sessions belonging to championship <id>
//! ```
//!
//! Directory scans are lenient: unreadable or malformed files are logged and
//! skipped. Lookups of a single championship or session report
//! [`RaceStatsError::ChampionshipNotFound`] / [`RaceStatsError::SessionNotFound`].

use std::cmp::Reverse;
use std::path::{Component, Path, PathBuf};

use racestats_core::error::{RaceStatsError, Result};
use racestats_core::models::{Championship, ChampionshipDefinition, SessionRecord};
use tracing::{debug, warn};

pub const QUICK_RACE_DIR: &str = "quick_race";
pub const CHAMPIONSHIP_DIR: &str = "championship";
pub const CHAMPIONSHIP_EXT: &str = "champ";
pub const SESSION_EXT: &str = "json";

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.json` session files recursively under `dir`, sorted by path.
pub fn find_session_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        debug!("Session directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), SESSION_EXT))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Find all `.champ` definition files directly under `dir`, sorted by path.
pub fn find_championship_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        debug!("Championship directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && has_extension(entry.path(), CHAMPIONSHIP_EXT)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Parse one session file. `id` becomes the record's identifier.
pub fn read_session_file(path: &Path, id: impl Into<String>) -> Result<SessionRecord> {
    let contents = read_text(path)?;
    let mut session: SessionRecord = serde_json::from_str(strip_bom(&contents))?;
    session.id = id.into();
    Ok(session)
}

/// Parse one `.champ` definition file. A leading UTF-8 BOM is tolerated.
pub fn read_championship_file(path: &Path) -> Result<ChampionshipDefinition> {
    let contents = read_text(path)?;
    let definition = serde_json::from_str(strip_bom(&contents))?;
    Ok(definition)
}

/// Load every quick-race session, newest first.
pub fn load_quick_race_sessions(root: &Path) -> Vec<SessionRecord> {
    let dir = root.join(QUICK_RACE_DIR);
    let files = find_session_files(&dir);

    let mut sessions: Vec<SessionRecord> = files
        .iter()
        .filter_map(|path| {
            let id = session_id(root, path);
            match read_session_file(path, id) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!("Skipping session {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect();

    sort_sessions_by_date(&mut sessions, false);

    debug!(
        "Loaded {} quick-race sessions from {} files",
        sessions.len(),
        files.len()
    );
    sessions
}

/// Load every championship with its sessions (oldest first).
///
/// Championships are ordered by definition file name.
pub fn load_championships(root: &Path) -> Vec<Championship> {
    let dir = root.join(CHAMPIONSHIP_DIR);

    let championships: Vec<Championship> = find_championship_files(&dir)
        .iter()
        .filter_map(|path| {
            let id = path.file_stem()?.to_string_lossy().to_string();
            match read_championship_file(path) {
                Ok(definition) => Some(assemble_championship(root, id, definition)),
                Err(e) => {
                    warn!("Skipping championship {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect();

    debug!("Loaded {} championships", championships.len());
    championships
}

/// Load a single championship by id.
pub fn load_championship(root: &Path, id: &str) -> Result<Championship> {
    if !is_safe_id(id) {
        return Err(RaceStatsError::ChampionshipNotFound(id.to_string()));
    }
    let path = root
        .join(CHAMPIONSHIP_DIR)
        .join(format!("{}.{}", id, CHAMPIONSHIP_EXT));
    if !path.is_file() {
        return Err(RaceStatsError::ChampionshipNotFound(id.to_string()));
    }
    let definition = read_championship_file(&path)?;
    Ok(assemble_championship(root, id.to_string(), definition))
}

/// Load a single session by its id (path relative to `root`).
///
/// Sessions under `championship/<id>/` are tagged with that championship's
/// name, or with the folder id when the definition cannot be read.
pub fn load_session(root: &Path, id: &str) -> Result<SessionRecord> {
    if !is_safe_id(id) {
        return Err(RaceStatsError::SessionNotFound(id.to_string()));
    }
    let path = root.join(id);
    if !path.is_file() {
        return Err(RaceStatsError::SessionNotFound(id.to_string()));
    }

    let mut session = read_session_file(&path, id)?;

    let parts: Vec<&str> = id.split('/').collect();
    if parts.len() > 2 && parts[0] == CHAMPIONSHIP_DIR {
        let folder = parts[1];
        let champ_path = root
            .join(CHAMPIONSHIP_DIR)
            .join(format!("{}.{}", folder, CHAMPIONSHIP_EXT));
        let name = read_championship_file(&champ_path)
            .ok()
            .map(|d| d.name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| folder.to_string());
        session.championship = Some(name);
    }

    Ok(session)
}

/// Sort sessions by parsed date; unparseable dates count as oldest.
///
/// The sort is stable, so sessions with equal or missing dates keep their
/// file order.
pub fn sort_sessions_by_date(sessions: &mut [SessionRecord], ascending: bool) {
    if ascending {
        sessions.sort_by_cached_key(|s| s.info.parsed_date());
    } else {
        sessions.sort_by_cached_key(|s| Reverse(s.info.parsed_date()));
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn assemble_championship(
    root: &Path,
    id: String,
    definition: ChampionshipDefinition,
) -> Championship {
    let folder = root.join(CHAMPIONSHIP_DIR).join(&id);
    let files = find_session_files(&folder);

    let mut sessions: Vec<SessionRecord> = files
        .iter()
        .filter_map(|path| match read_session_file(path, session_id(root, path)) {
            Ok(mut session) => {
                session.championship = Some(definition.name.clone());
                Some(session)
            }
            Err(e) => {
                warn!("Skipping session {}: {}", path.display(), e);
                None
            }
        })
        .collect();

    sort_sessions_by_date(&mut sessions, true);

    debug!(
        "Championship {} ({}): {} sessions",
        definition.name,
        id,
        sessions.len()
    );

    Championship::new(id, definition, sessions)
}

/// Identifier of a file: its path relative to `root`, `/`-separated.
fn session_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reject ids that could escape the data root.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && Path::new(id)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn strip_bom(contents: &str) -> &str {
    contents.strip_prefix('\u{feff}').unwrap_or(contents)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().map(|e| e == ext).unwrap_or(false)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| RaceStatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
