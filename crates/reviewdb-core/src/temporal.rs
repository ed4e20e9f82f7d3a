//! Date and date-time normalization.
//!
//! Relational sources hand back a mix of date-only columns (`publication_date`,
//! seeded review dates) and full timestamps. Documents carry a single instant
//! type, `DateTime<Utc>`. Date-only values are anchored at midnight UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A temporal value as read from a relational source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    /// Calendar date without a time of day.
    Date(NaiveDate),
    /// Date and time of day, interpreted as UTC.
    DateTime(NaiveDateTime),
}

impl Temporal {
    /// Parse the textual forms SQLite stores.
    ///
    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS[.f]]` with a space or `T`
    /// separator, and RFC 3339 with an offset.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(Temporal::Date(date));
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Some(Temporal::DateTime(dt));
            }
        }
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| Temporal::DateTime(dt.with_timezone(&Utc).naive_utc()))
    }

    /// Normalize to the canonical instant type.
    pub fn to_instant(self) -> DateTime<Utc> {
        normalize(self)
    }
}

impl From<NaiveDate> for Temporal {
    fn from(date: NaiveDate) -> Self {
        Temporal::Date(date)
    }
}

impl From<NaiveDateTime> for Temporal {
    fn from(dt: NaiveDateTime) -> Self {
        Temporal::DateTime(dt)
    }
}

/// Normalize a date or date-time into a UTC instant.
///
/// Date-only input is anchored at `00:00:00` of that day.
pub fn normalize(value: impl Into<Temporal>) -> DateTime<Utc> {
    match value.into() {
        Temporal::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
        Temporal::DateTime(dt) => dt.and_utc(),
    }
}

/// Text form written to SQLite timestamp columns.
pub fn to_sql_text(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Text form written to SQLite date-only columns.
pub fn date_to_sql_text(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_date_anchors_at_midnight() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let instant = normalize(date);
        assert_eq!(instant.to_rfc3339(), "2023-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_datetime_keeps_time_of_day() {
        let dt = NaiveDate::from_ymd_opt(2023, 5, 17)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap();
        let instant = normalize(dt);
        assert_eq!(instant.hour(), 14);
        assert_eq!(instant.minute(), 30);
        assert_eq!(instant.second(), 5);
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            Temporal::parse("2024-02-29"),
            Some(Temporal::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );

        let spaced = Temporal::parse("2024-02-29 08:15:00").unwrap();
        let iso = Temporal::parse("2024-02-29T08:15:00").unwrap();
        assert_eq!(spaced, iso);

        let fractional = Temporal::parse("2024-02-29 08:15:00.250").unwrap();
        assert_eq!(fractional.to_instant().timestamp_subsec_millis(), 250);

        let offset = Temporal::parse("2024-02-29T10:15:00+02:00").unwrap();
        assert_eq!(offset.to_instant(), spaced.to_instant());
    }

    #[test]
    fn test_parse_minute_precision() {
        let spaced = Temporal::parse("2024-02-29 08:15").unwrap();
        assert_eq!(spaced.to_instant().to_rfc3339(), "2024-02-29T08:15:00+00:00");
        assert_eq!(Temporal::parse("2024-02-29T08:15"), Some(spaced));
        assert_eq!(Temporal::parse("2024-02-29 08"), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Temporal::parse("yesterday"), None);
        assert_eq!(Temporal::parse("2024-13-01"), None);
        assert_eq!(Temporal::parse(""), None);
    }

    #[test]
    fn test_sql_text_roundtrip() {
        let instant = Temporal::parse("2024-03-01 12:00:00.123456")
            .unwrap()
            .to_instant();
        let text = to_sql_text(&instant);
        assert_eq!(text, "2024-03-01 12:00:00.123456");
        assert_eq!(Temporal::parse(&text).unwrap().to_instant(), instant);

        let date = NaiveDate::from_ymd_opt(2021, 7, 4).unwrap();
        assert_eq!(
            Temporal::parse(&date_to_sql_text(&date)),
            Some(Temporal::Date(date))
        );
    }

    #[test]
    fn test_date_and_midnight_datetime_agree() {
        let date = Temporal::parse("2023-01-02").unwrap();
        let midnight = Temporal::parse("2023-01-02 00:00:00").unwrap();
        assert_eq!(date.to_instant(), midnight.to_instant());
        assert_eq!(date.to_instant().day(), 2);
    }
}
