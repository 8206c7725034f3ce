use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::warn;

/// Rank assigned to a driver whose position is absent or unusable.
pub const UNPLACED_POSITION: u32 = 999;

// ── DateProcessor ─────────────────────────────────────────────────────────────

/// Parses the `session_info.date` strings written by the race recorder.
pub struct DateProcessor;

impl DateProcessor {
    /// Attempt to parse a session date into a naive (wall-clock) timestamp.
    ///
    /// Handles, in order:
    /// * `"%Y-%m-%d %H:%M:%S"` as written by the recorder
    /// * RFC 3339 / ISO 8601 with offset or `Z` (converted to UTC)
    /// * ISO 8601 without offset, with or without fractional seconds
    /// * date-only `"%Y-%m-%d"` (midnight)
    ///
    /// Returns `None` for empty or unrecognised strings.
    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
        ];
        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }

        warn!("DateProcessor: could not parse session date \"{}\"", s);
        None
    }
}

// ── DataConverter ─────────────────────────────────────────────────────────────

/// Lenient conversions from loosely-typed JSON values.
///
/// Every helper is total: invalid input maps to `None` or to the supplied
/// default, never to an error.
pub struct DataConverter;

impl DataConverter {
    /// Coerce a JSON value to a finite `f64`.
    ///
    /// Numbers are taken as-is, strings are trimmed and parsed. `null`,
    /// booleans, arrays, objects, unparseable strings and non-finite results
    /// all yield `None`.
    pub fn to_f64(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }

    /// Coerce to a number, falling back to `default` when absent or invalid.
    pub fn number_or(value: Option<f64>, default: f64) -> f64 {
        match value {
            Some(n) if n.is_finite() => n,
            _ => default,
        }
    }

    /// Coerce to a non-negative whole count (fractions truncated), default 0.
    pub fn to_count(value: Option<f64>) -> u32 {
        match value {
            Some(n) if n.is_finite() && n > 0.0 => n.trunc().min(u32::MAX as f64) as u32,
            _ => 0,
        }
    }

    /// Normalise a finishing position.
    ///
    /// Whole numbers `>= 1` are kept; anything else (absent, zero, negative,
    /// fractional) becomes [`UNPLACED_POSITION`].
    pub fn to_position(value: Option<f64>) -> u32 {
        match value {
            Some(n) if n.is_finite() && n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => {
                n as u32
            }
            _ => UNPLACED_POSITION,
        }
    }

    /// Coerce a JSON value to a non-empty string. Numbers are stringified.
    pub fn to_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ── Lenient serde adapters ────────────────────────────────────────────────────

/// `deserialize_with` adapters that route every field through
/// [`DataConverter`] so a malformed value degrades to "absent" instead of
/// failing the whole document.
pub mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::DataConverter;

    /// Optional number: numbers and numeric strings, anything else `None`.
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(DataConverter::to_f64))
    }

    /// Optional non-empty string.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(DataConverter::to_text))
    }

    /// String with an empty default.
    pub fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(text(deserializer)?.unwrap_or_default())
    }

    /// Boolean; anything other than a JSON bool is `false`.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(matches!(value, Some(Value::Bool(true))))
    }

    /// List of whole non-negative numbers; invalid elements become 0, a
    /// non-array becomes an empty list.
    pub fn counts<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| DataConverter::to_count(DataConverter::to_f64(v)))
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Nested object that is dropped (as `None`) when it does not match `T`.
    pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| serde_json::from_value(v).ok()))
    }

    /// List of objects; elements that do not match `T` are skipped.
    pub fn objects<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
