/// Date normalization helpers.
///
/// Every timestamp that crosses the parse/serialize boundary is an ISO-8601
/// string in the `YYYY-MM-DDTHH:MM:SS.mmmZ` shape; commitment headers and
/// Last-update lines use the shorter `YYYY-MM-DD HH:MM` minute stamp (UTC).
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Parse a timestamp from any of the accepted input shapes into UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

/// Normalize an optional date-ish string to canonical ISO-8601.
/// Empty or unparseable input falls back to `fallback` (which is returned
/// verbatim, not re-normalized).
pub fn normalize_date(value: Option<&str>, fallback: Option<&str>) -> Option<String> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return fallback.map(str::to_string);
    };

    match parse_datetime(raw) {
        Some(parsed) => Some(to_iso(parsed)),
        None => fallback.map(str::to_string),
    }
}

/// Current time as canonical ISO-8601.
pub fn iso_now() -> String {
    to_iso(Utc::now())
}

/// Current time as a `YYYY-MM-DD HH:MM` minute stamp (UTC).
pub fn minute_stamp_now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Current date as `YYYY-MM-DD` (UTC), used in the TODO template header.
pub fn date_token_now() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Format an ISO timestamp as a commitment header minute stamp.
/// Unparseable input falls back to the current time.
pub fn format_header_timestamp(iso: &str) -> String {
    parse_datetime(iso)
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Resolve a commitment header minute stamp back to ISO-8601, falling back
/// to `fallback` when absent or unparseable.
pub fn header_timestamp_to_iso(timestamp: Option<&str>, fallback: &str) -> String {
    timestamp
        .and_then(parse_datetime)
        .map(to_iso)
        .unwrap_or_else(|| fallback.to_string())
}

fn to_iso(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
