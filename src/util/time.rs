//! Time and date parsing utilities.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// Format used for `last_updated` in the overlay file (UTC, no offset).
pub const OVERLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse an ISO-8601 timestamp as Linear returns it into UTC.
///
/// Supports:
/// - RFC3339: `2025-02-20T10:30:00.000Z`, `2025-02-20T10:30:00+01:00`
/// - Naive timestamps (assumed UTC): `2025-02-15T14:30:00`
/// - Plain dates (midnight UTC): `2025-02-15`
///
/// Returns `None` for empty or unparseable input.
#[must_use]
pub fn parse_iso_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Current time truncated to whole seconds, as stored in the overlay.
#[must_use]
pub fn overlay_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Render a timestamp the way the overlay file stores it.
#[must_use]
pub fn format_overlay_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(OVERLAY_TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter for `Option<DateTime<Utc>>` in the overlay's timestamp format.
///
/// Unparseable values read as `None` so one bad entry never rejects the file.
pub mod overlay_timestamp {
    use super::{format_overlay_timestamp, parse_iso_datetime};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&format_overlay_timestamp(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_iso_datetime))
    }
}
