use std::fmt;

use chrono::NaiveDateTime;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data_processors::{lenient, DataConverter, DateProcessor};

/// Car label used when neither the session nor the entrant list names one.
pub const UNKNOWN_CAR: &str = "unknown";

/// Nation code used when a driver has no entrant metadata.
pub const UNKNOWN_NATION: &str = "UN";

// ── SessionType ───────────────────────────────────────────────────────────────

/// Kind of event a session file records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Practice,
    Qualifying,
    Race,
    /// Missing or unrecognised; quick races recorded without a type land here.
    #[default]
    Unknown,
}

impl SessionType {
    /// Case-insensitive parse; unrecognised input is [`SessionType::Unknown`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "practice" => SessionType::Practice,
            "qualifying" | "qualify" | "qualification" => SessionType::Qualifying,
            "race" => SessionType::Race,
            _ => SessionType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Practice => "practice",
            SessionType::Qualifying => "qualifying",
            SessionType::Race => "race",
            SessionType::Unknown => "unknown",
        }
    }

    /// Whether fastest laps set in this session count as race fastest laps.
    ///
    /// True for races and for untyped sessions.
    pub fn counts_fastest_lap(&self) -> bool {
        !matches!(self, SessionType::Practice | SessionType::Qualifying)
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SessionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient::text(deserializer)?;
        Ok(raw.as_deref().map(SessionType::parse).unwrap_or_default())
    }
}

// ── SessionInfo ───────────────────────────────────────────────────────────────

/// The `session_info` header of a session file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Raw date string as written by the recorder.
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub date: String,
    /// Track identifier, e.g. `"ks_vallelunga"`.
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub track: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub track_config: Option<String>,
    /// Configured race length in laps.
    #[serde(default, deserialize_with = "lenient::number")]
    pub race_laps: Option<f64>,
    #[serde(default)]
    pub session_type: SessionType,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_cars: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub track_length_meters: Option<f64>,
}

impl SessionInfo {
    /// Parsed session date, if recognisable.
    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        DateProcessor::parse(&self.date)
    }

    /// Configured race length, only when strictly positive.
    pub fn race_laps_configured(&self) -> Option<f64> {
        self.race_laps.filter(|laps| *laps > 0.0)
    }
}

// ── DriverSessionStats ────────────────────────────────────────────────────────

/// Crash summary nested under a driver's statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrashSummary {
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_crashes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub worst_crash_g: Option<f64>,
}

/// One driver's result within one session.
///
/// Every field is optional on the wire; the accessor methods apply the
/// defaults the aggregation engine relies on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverSessionStats {
    #[serde(default, deserialize_with = "lenient::number")]
    pub position: Option<f64>,
    /// Best lap in seconds; `0` means no valid lap.
    #[serde(default, deserialize_with = "lenient::number")]
    pub best_lap: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub laps_completed: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub car_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub crashes: Option<CrashSummary>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub average_lap: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_time_seconds: Option<f64>,
}

impl DriverSessionStats {
    /// Finishing position, or [`UNPLACED_POSITION`](crate::data_processors::UNPLACED_POSITION).
    pub fn position(&self) -> u32 {
        DataConverter::to_position(self.position)
    }

    /// Best lap in seconds when it is a usable (strictly positive) time.
    pub fn best_lap_seconds(&self) -> Option<f64> {
        self.best_lap.filter(|t| t.is_finite() && *t > 0.0)
    }

    pub fn laps_completed(&self) -> f64 {
        DataConverter::number_or(self.laps_completed, 0.0)
    }

    pub fn total_score(&self) -> f64 {
        DataConverter::number_or(self.total_score, 0.0)
    }

    pub fn crash_count(&self) -> u32 {
        DataConverter::to_count(self.crashes.as_ref().and_then(|c| c.total_crashes))
    }

    pub fn car_name(&self) -> Option<&str> {
        self.car_name.as_deref().filter(|s| !s.trim().is_empty())
    }
}

// ── DriverResults ─────────────────────────────────────────────────────────────

/// Per-driver results of a session in the order they were serialized.
///
/// Order matters: it is the tie-break when two drivers share the fastest lap.
/// A name repeated in the source keeps its first slot and its last value.
/// Parsing through `serde_json::Value` keeps the order as well, since the
/// workspace enables serde_json's `preserve_order`.
#[derive(Debug, Clone, Default)]
pub struct DriverResults {
    entries: Vec<(String, DriverSessionStats)>,
}

impl DriverResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a driver's result, keeping the original slot.
    pub fn insert(&mut self, name: impl Into<String>, stats: DriverSessionStats) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = stats,
            None => self.entries.push((name, stats)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DriverSessionStats> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, stats)| stats)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DriverSessionStats)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Results ordered by finishing position; ties keep serialized order.
    pub fn by_position(&self) -> Vec<(&str, &DriverSessionStats)> {
        let mut rows: Vec<_> = self.iter().collect();
        rows.sort_by_key(|(_, stats)| stats.position());
        rows
    }
}

impl<N: Into<String>> FromIterator<(N, DriverSessionStats)> for DriverResults {
    fn from_iter<I: IntoIterator<Item = (N, DriverSessionStats)>>(iter: I) -> Self {
        let mut results = DriverResults::new();
        for (name, stats) in iter {
            results.insert(name, stats);
        }
        results
    }
}

impl Serialize for DriverResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, stats) in &self.entries {
            map.serialize_entry(name, stats)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DriverResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = DriverResults;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of driver name to driver statistics")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut results = DriverResults::new();
                while let Some((name, raw)) = access.next_entry::<String, serde_json::Value>()? {
                    // A malformed entry still counts as an appearance.
                    let stats = serde_json::from_value(raw).unwrap_or_default();
                    results.insert(name, stats);
                }
                Ok(results)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(DriverResults::new())
            }
        }

        deserializer.deserialize_any(OrderedVisitor)
    }
}

// ── SessionRecord ─────────────────────────────────────────────────────────────

/// One completed practice, qualifying or race session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Path of the source file relative to the data root.
    #[serde(skip)]
    pub id: String,
    /// Name of the owning championship, `None` for quick races.
    #[serde(skip)]
    pub championship: Option<String>,
    #[serde(rename = "session_info", default)]
    pub info: SessionInfo,
    #[serde(rename = "driver_statistics", default)]
    pub drivers: DriverResults,
}

impl SessionRecord {
    pub fn session_type(&self) -> SessionType {
        self.info.session_type
    }

    pub fn track_id(&self) -> &str {
        &self.info.track
    }

    pub fn is_quick_race(&self) -> bool {
        self.championship.is_none()
    }
}

// ── Championship ──────────────────────────────────────────────────────────────

/// Scoring and format rules of a championship.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChampionshipRules {
    /// Practice length in minutes.
    #[serde(default, deserialize_with = "lenient::number")]
    pub practice: Option<f64>,
    /// Qualifying length in minutes.
    #[serde(default, deserialize_with = "lenient::number")]
    pub qualifying: Option<f64>,
    /// Points for 1st, 2nd, ... place.
    #[serde(default, deserialize_with = "lenient::counts")]
    pub points: Vec<u32>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub penalties: bool,
    #[serde(default, deserialize_with = "lenient::number")]
    pub jumpstart: Option<f64>,
}

/// A configured championship entrant (an "opponent" in the `.champ` file).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entrant {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub nation: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub car: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub skin: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub ballast: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub restrictor: Option<f64>,
}

/// One scheduled round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChampionshipRound {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub track: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub laps: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub weather: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub surface: Option<f64>,
}

/// Contents of a `.champ` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChampionshipDefinition {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::object")]
    pub rules: Option<ChampionshipRules>,
    #[serde(rename = "opponents", default, deserialize_with = "lenient::objects")]
    pub entrants: Vec<Entrant>,
    #[serde(default, deserialize_with = "lenient::objects")]
    pub rounds: Vec<ChampionshipRound>,
    #[serde(rename = "maxCars", default, deserialize_with = "lenient::number")]
    pub max_cars: Option<f64>,
}

impl ChampionshipDefinition {
    pub fn points_table(&self) -> &[u32] {
        self.rules
            .as_ref()
            .map(|r| r.points.as_slice())
            .unwrap_or(&[])
    }

    pub fn entrant(&self, name: &str) -> Option<&Entrant> {
        self.entrants.iter().find(|e| e.name == name)
    }
}

/// A championship definition together with the sessions recorded for it.
#[derive(Debug, Clone, Default)]
pub struct Championship {
    /// Identifier (the `.champ` file stem, usually a UUID).
    pub id: String,
    pub definition: ChampionshipDefinition,
    /// Sessions in ascending date order.
    pub sessions: Vec<SessionRecord>,
}

impl Championship {
    pub fn new(
        id: impl Into<String>,
        definition: ChampionshipDefinition,
        sessions: Vec<SessionRecord>,
    ) -> Self {
        Self {
            id: id.into(),
            definition,
            sessions,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}
