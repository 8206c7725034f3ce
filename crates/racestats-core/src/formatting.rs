use std::sync::OnceLock;

use regex::Regex;

/// Placeholder shown for a missing or zero lap time.
pub const NO_LAP_TIME: &str = "--:--.---";

/// Turn a track identifier into a display name.
///
/// The Kunos `ks_` prefix is dropped and each `_`-separated word is
/// capitalised. A missing id renders as `"Unknown Track"`.
///
/// # Examples
///
/// ```
/// use racestats_core::formatting::format_track_name;
///
/// assert_eq!(format_track_name(Some("ks_vallelunga")), "Vallelunga");
/// assert_eq!(format_track_name(Some("ks_nordschleife_endurance")), "Nordschleife Endurance");
/// assert_eq!(format_track_name(None), "Unknown Track");
/// ```
pub fn format_track_name(track_id: Option<&str>) -> String {
    match track_id.filter(|t| !t.is_empty()) {
        Some(id) => title_case(&id.replacen("ks_", "", 1)),
        None => "Unknown Track".to_string(),
    }
}

/// Turn a car identifier into a display name.
///
/// Known mod/vendor prefixes (`ks_`, `gd_`, `rz_`, `exmods_av_`) are removed
/// from the start, then words are capitalised. A missing id renders as `"N/A"`.
///
/// # Examples
///
/// ```
/// use racestats_core::formatting::format_car_name;
///
/// assert_eq!(format_car_name(Some("ks_bmw_m3_e30")), "Bmw M3 E30");
/// assert_eq!(format_car_name(Some("exmods_av_mx5")), "Mx5");
/// assert_eq!(format_car_name(None), "N/A");
/// ```
pub fn format_car_name(car_id: Option<&str>) -> String {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix = PREFIX
        .get_or_init(|| Regex::new(r"^(ks_|gd_|rz_|exmods_av_)").expect("regex is valid"));

    match car_id.filter(|c| !c.is_empty()) {
        Some(id) => title_case(&prefix.replace(id, "")),
        None => "N/A".to_string(),
    }
}

/// Format a lap time in seconds as `m:ss.mmm`.
///
/// `None`, zero, negative and non-finite inputs render as [`NO_LAP_TIME`].
///
/// # Examples
///
/// ```
/// use racestats_core::formatting::format_lap_time;
///
/// assert_eq!(format_lap_time(Some(91.234)), "1:31.234");
/// assert_eq!(format_lap_time(Some(59.5)), "0:59.500");
/// assert_eq!(format_lap_time(Some(0.0)), "--:--.---");
/// ```
pub fn format_lap_time(seconds: Option<f64>) -> String {
    let Some(secs) = seconds.filter(|s| s.is_finite() && *s > 0.0) else {
        return NO_LAP_TIME.to_string();
    };
    let total_millis = (secs * 1000.0).round() as u64;
    let minutes = total_millis / 60_000;
    let rem_millis = total_millis % 60_000;
    format!("{}:{:02}.{:03}", minutes, rem_millis / 1000, rem_millis % 1000)
}

/// Format a number with thousands separators and a fixed number of decimals.
///
/// # Examples
///
/// ```
/// use racestats_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let factor = 10_f64.powi(decimals as i32);
    // Work in integer units of the last decimal to avoid float drift.
    let scaled = (value.abs() * factor).round() as u64;
    let unit = factor as u64;

    let grouped = group_thousands(&(scaled / unit).to_string());
    let body = if decimals == 0 {
        grouped
    } else {
        format!(
            "{}.{:0width$}",
            grouped,
            scaled % unit,
            width = decimals as usize
        )
    };

    if negative && scaled != 0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Format championship custom points: whole numbers with separators.
pub fn format_points(points: f64) -> String {
    format_number(points, 0)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Capitalise the first letter of every `_`-separated word and join with spaces.
fn title_case(id: &str) -> String {
    id.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
