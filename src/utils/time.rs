use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;

use super::error::AppError;

pub fn to_rfc3339(value: BsonDateTime) -> String {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis())
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

pub fn opt_to_rfc3339(value: Option<BsonDateTime>) -> Option<String> {
    value.map(to_rfc3339)
}

/// Accepts RFC 3339 timestamps plus the two shapes browser date inputs send
/// (`2025-03-01T18:30` and `2025-03-01`), the latter two read as UTC.
pub fn parse_datetime(raw: &str, field: &str) -> Result<BsonDateTime, AppError> {
    let raw = raw.trim();

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").map(|naive| naive.and_utc())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|naive| naive.and_utc())
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|date| date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
        })
        .map_err(|_| AppError::InvalidRequest(format!("Invalid {}: {}", field, raw)))?;

    Ok(BsonDateTime::from_millis(parsed.timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_datetime("2025-03-01T18:30:00+05:30", "date").unwrap();
        assert_eq!(to_rfc3339(dt), "2025-03-01T13:00:00+00:00");
    }

    #[test]
    fn parses_browser_datetime_local() {
        let dt = parse_datetime("2025-03-01T18:30", "date").unwrap();
        assert_eq!(to_rfc3339(dt), "2025-03-01T18:30:00+00:00");
    }

    #[test]
    fn parses_plain_date_as_midnight_utc() {
        let dt = parse_datetime("2025-03-01", "date").unwrap();
        assert_eq!(to_rfc3339(dt), "2025-03-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_datetime("next friday", "date").unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(msg) if msg.contains("date")));
    }
}
