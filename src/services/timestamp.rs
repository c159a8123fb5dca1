//! Timestamp normalization.
//!
//! Timestamps reach this service in three shapes: epoch seconds from chain
//! clients, naive UTC strings from the donation store, and already-built
//! `DateTime<Utc>` values. Every timestamp field funnels through [`normalize`],
//! including serde deserialization of [`NormalizedTimestamp`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest magnitude accepted for an epoch value, in milliseconds
/// (±100,000,000 days around the epoch).
const MAX_EPOCH_MILLIS: f64 = 8_640_000_000_000_000.0;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const ZONED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// A timestamp as it arrived from upstream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Unix epoch seconds (chain convention).
    Seconds(f64),
    Text(String),
    #[serde(skip_deserializing)]
    Native(DateTime<Utc>),
}

impl From<i64> for RawTimestamp {
    fn from(secs: i64) -> Self {
        RawTimestamp::Seconds(secs as f64)
    }
}

impl From<&str> for RawTimestamp {
    fn from(text: &str) -> Self {
        RawTimestamp::Text(text.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(text: String) -> Self {
        RawTimestamp::Text(text)
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        RawTimestamp::Native(dt)
    }
}

/// Canonical instant, or a sentinel when the input could not produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NormalizedTimestamp {
    Instant(DateTime<Utc>),
    /// The input was present but is not a valid calendar time.
    Invalid,
    /// No input at all.
    #[default]
    Unknown,
}

impl NormalizedTimestamp {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            NormalizedTimestamp::Instant(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, NormalizedTimestamp::Instant(_))
    }

    /// Render for display in a fixed offset. Sentinels render as plain labels
    /// so views never have to special-case them.
    pub fn format_in(&self, offset: FixedOffset, fmt: &str) -> String {
        match self {
            NormalizedTimestamp::Instant(dt) => dt.with_timezone(&offset).format(fmt).to_string(),
            NormalizedTimestamp::Invalid => "Invalid date".to_string(),
            NormalizedTimestamp::Unknown => "Unknown".to_string(),
        }
    }
}

impl From<DateTime<Utc>> for NormalizedTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        NormalizedTimestamp::Instant(dt)
    }
}

impl Serialize for NormalizedTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NormalizedTimestamp::Instant(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            NormalizedTimestamp::Invalid => serializer.serialize_str("invalid"),
            NormalizedTimestamp::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for NormalizedTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
        Ok(normalize(raw.as_ref()))
    }
}

/// Convert any upstream timestamp shape into a canonical UTC instant.
///
/// * numbers, and strings of exactly ten digits, are epoch **seconds**;
/// * strings without `Z` or an explicit offset are read as UTC;
/// * native values pass through.
///
/// Never fails: unusable input yields [`NormalizedTimestamp::Invalid`] and a
/// missing value yields [`NormalizedTimestamp::Unknown`].
pub fn normalize(input: Option<&RawTimestamp>) -> NormalizedTimestamp {
    match input {
        None => NormalizedTimestamp::Unknown,
        Some(RawTimestamp::Seconds(secs)) => from_epoch_seconds(*secs),
        Some(RawTimestamp::Text(text)) => normalize_text(text),
        Some(RawTimestamp::Native(dt)) => NormalizedTimestamp::Instant(*dt),
    }
}

fn from_epoch_seconds(secs: f64) -> NormalizedTimestamp {
    let millis = secs * 1000.0;
    if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
        return NormalizedTimestamp::Invalid;
    }

    Utc.timestamp_millis_opt(millis.round() as i64)
        .single()
        .map(NormalizedTimestamp::Instant)
        .unwrap_or(NormalizedTimestamp::Invalid)
}

fn normalize_text(text: &str) -> NormalizedTimestamp {
    let trimmed = text.trim();

    if is_epoch_seconds(trimmed) {
        return match trimmed.parse::<i64>() {
            Ok(secs) => from_epoch_seconds(secs as f64),
            Err(_) => NormalizedTimestamp::Invalid,
        };
    }

    let zoned = if has_zone_designator(trimmed) {
        trimmed.to_string()
    } else {
        format!("{}Z", trimmed)
    };

    parse_zoned(&zoned)
        .map(NormalizedTimestamp::Instant)
        .unwrap_or(NormalizedTimestamp::Invalid)
}

fn is_epoch_seconds(text: &str) -> bool {
    text.len() == 10 && text.bytes().all(|b| b.is_ascii_digit())
}

/// `Z` suffix, or a `+`/`-` offset somewhere after the `YYYY-MM-DD` prefix.
fn has_zone_designator(text: &str) -> bool {
    if text.ends_with('Z') || text.ends_with('z') {
        return true;
    }
    text.get(10..)
        .map(|time| time.contains('+') || time.contains('-'))
        .unwrap_or(false)
}

fn parse_zoned(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        return parse_naive_utc(naive);
    }

    ZONED_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive_utc(text: &str) -> Option<DateTime<Utc>> {
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(Utc.from_utc_datetime(&naive));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> NormalizedTimestamp {
        normalize(Some(&RawTimestamp::from(s)))
    }

    fn at_millis(ms: i64) -> NormalizedTimestamp {
        NormalizedTimestamp::Instant(Utc.timestamp_millis_opt(ms).unwrap())
    }

    #[test]
    fn ten_digit_strings_are_epoch_seconds() {
        for s in ["1700000000", "0000000001", "9999999999", "1234567890"] {
            let secs: i64 = s.parse().unwrap();
            assert_eq!(text(s), normalize(Some(&RawTimestamp::from(secs))));
            assert_eq!(text(s), at_millis(secs * 1000));
        }
    }

    #[test]
    fn numeric_input_is_scaled_to_millis() {
        let ts = normalize(Some(&RawTimestamp::Seconds(1_700_000_000.5)));
        assert_eq!(ts, at_millis(1_700_000_000_500));
    }

    #[test]
    fn naive_strings_are_read_as_utc() {
        for t in [
            "2024-03-01T12:30:00",
            "2024-03-01T12:30:00.250",
            "2024-03-01 12:30:00",
            "2024-03-01T12:30",
            "2024-03-01",
        ] {
            let naive = text(t);
            assert!(naive.is_instant(), "{t} should parse");
            assert_eq!(naive, text(&format!("{t}Z")), "{t}");
        }

        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(text("2024-03-01 12:30:00").instant(), Some(expected));
    }

    #[test]
    fn explicit_offsets_are_respected() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(text("2024-03-01T12:30:00+02:00").instant(), Some(expected));
        assert_eq!(text("2024-03-01 12:30:00+0200").instant(), Some(expected));

        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 17, 30, 0).unwrap();
        assert_eq!(text("2024-03-01T12:30:00-05:00").instant(), Some(expected));
    }

    #[test]
    fn sentinels() {
        assert_eq!(normalize(None), NormalizedTimestamp::Unknown);
        assert_eq!(text("not-a-date"), NormalizedTimestamp::Invalid);
        assert_eq!(text(""), NormalizedTimestamp::Invalid);
        assert_eq!(text("2024-13-45T00:00:00"), NormalizedTimestamp::Invalid);
        assert_eq!(
            normalize(Some(&RawTimestamp::Seconds(f64::NAN))),
            NormalizedTimestamp::Invalid
        );
        assert_eq!(
            normalize(Some(&RawTimestamp::Seconds(1e300))),
            NormalizedTimestamp::Invalid
        );
    }

    #[test]
    fn native_values_pass_through() {
        let now = Utc::now();
        assert_eq!(
            normalize(Some(&RawTimestamp::from(now))),
            NormalizedTimestamp::Instant(now)
        );
    }

    #[test]
    fn deserializes_every_shape() {
        let from_number: NormalizedTimestamp = serde_json::from_str("1700000000").unwrap();
        let from_digits: NormalizedTimestamp = serde_json::from_str("\"1700000000\"").unwrap();
        let from_iso: NormalizedTimestamp =
            serde_json::from_str("\"2023-11-14T22:13:20\"").unwrap();
        let from_null: NormalizedTimestamp = serde_json::from_str("null").unwrap();
        let from_garbage: NormalizedTimestamp = serde_json::from_str("\"soon\"").unwrap();

        assert_eq!(from_number, at_millis(1_700_000_000_000));
        assert_eq!(from_digits, from_number);
        assert_eq!(from_iso, from_number);
        assert_eq!(from_null, NormalizedTimestamp::Unknown);
        assert_eq!(from_garbage, NormalizedTimestamp::Invalid);
    }

    #[test]
    fn serializes_instants_as_utc_rfc3339() {
        let json = serde_json::to_value(at_millis(1_700_000_000_000)).unwrap();
        assert_eq!(json, "2023-11-14T22:13:20.000Z");
        assert_eq!(serde_json::to_value(NormalizedTimestamp::Unknown).unwrap(), serde_json::Value::Null);
        assert_eq!(serde_json::to_value(NormalizedTimestamp::Invalid).unwrap(), "invalid");
    }

    #[test]
    fn formats_in_requested_offset() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        assert_eq!(
            at_millis(1_700_000_000_000).format_in(offset, "%Y-%m-%d %H:%M"),
            "2023-11-15 05:13"
        );
        assert_eq!(NormalizedTimestamp::Invalid.format_in(offset, "%F"), "Invalid date");
        assert_eq!(NormalizedTimestamp::Unknown.format_in(offset, "%F"), "Unknown");
    }
}
