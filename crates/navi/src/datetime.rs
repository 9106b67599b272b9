//! Due-date interpretation in the user's IANA time zone

use jiff::{
    Span, Timestamp,
    civil::{Date, DateTime, Time},
    tz::TimeZone,
};

#[derive(Debug, thiserror::Error)]
pub enum DateTimeError {
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("Invalid due date: {0}")]
    InvalidDate(String),
}

pub fn resolve_time_zone(name: &str) -> Result<TimeZone, DateTimeError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DateTimeError::UnknownTimeZone("(empty)".to_string()));
    }
    TimeZone::get(name).map_err(|_| DateTimeError::UnknownTimeZone(name.to_string()))
}

/// Interpret an ISO-8601 string as wall-clock time in `tz`.
///
/// Absent or blank input means "now". A trailing offset, `Z` or bracketed
/// annotation is discarded: the model speaks in the user's local time.
pub fn parse_due_date(text: Option<&str>, tz: &TimeZone) -> Result<Timestamp, DateTimeError> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(Timestamp::now());
    };

    let wall_clock = wall_clock_part(text);
    let civil = wall_clock
        .parse::<DateTime>()
        .or_else(|_| {
            wall_clock
                .parse::<Date>()
                .map(|date| date.to_datetime(Time::midnight()))
        })
        .map_err(|_| DateTimeError::InvalidDate(text.to_string()))?;

    civil
        .to_zoned(tz.clone())
        .map(|zoned| zoned.timestamp())
        .map_err(|e| DateTimeError::InvalidDate(format!("{text}: {e}")))
}

/// `2024-05-01T18:00:00-04:00`
pub fn format_iso(ts: Timestamp, tz: &TimeZone) -> String {
    ts.to_zoned(tz.clone())
        .strftime("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// `Wednesday, May 1, 2024, 6:00 PM EDT`
pub fn format_human(ts: Timestamp, tz: &TimeZone) -> String {
    ts.to_zoned(tz.clone())
        .strftime("%A, %B %-d, %Y, %-I:%M %p %Z")
        .to_string()
}

/// `May 6, 2024`
pub fn format_date(ts: Timestamp, tz: &TimeZone) -> String {
    ts.to_zoned(tz.clone()).strftime("%B %-d, %Y").to_string()
}

/// Current date and time with seconds, as shown to the model.
pub fn current_date_time(tz: &TimeZone) -> String {
    describe_instant(Timestamp::now(), tz)
}

pub fn describe_instant(ts: Timestamp, tz: &TimeZone) -> String {
    ts.to_zoned(tz.clone())
        .strftime("%A, %B %-d, %Y, %-I:%M:%S %p %Z")
        .to_string()
}

pub fn today(tz: &TimeZone) -> Date {
    Timestamp::now().to_zoned(tz.clone()).date()
}

/// Half-open instant range `[start, end)` covering `date` in `tz`.
pub fn day_bounds(date: Date, tz: &TimeZone) -> Option<(Timestamp, Timestamp)> {
    let start = date.to_zoned(tz.clone()).ok()?.timestamp();
    let end = date.tomorrow().ok()?.to_zoned(tz.clone()).ok()?.timestamp();
    Some((start, end))
}

/// Half-open range covering the Sunday-start week that contains `date`.
pub fn week_bounds(date: Date, tz: &TimeZone) -> Option<(Timestamp, Timestamp)> {
    let offset = i64::from(date.weekday().to_sunday_zero_offset());
    let sunday = date.checked_sub(Span::new().days(offset)).ok()?;
    let next_sunday = sunday.checked_add(Span::new().days(7)).ok()?;
    let start = sunday.to_zoned(tz.clone()).ok()?.timestamp();
    let end = next_sunday.to_zoned(tz.clone()).ok()?.timestamp();
    Some((start, end))
}

fn wall_clock_part(text: &str) -> &str {
    let text = text.split('[').next().unwrap_or(text);
    let Some(separator) = text.find(['T', 't', ' ']) else {
        return text;
    };
    let time = &text[separator + 1..];
    match time.find(['Z', 'z', '+', '-']) {
        Some(offset) => &text[..separator + 1 + offset],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_york() -> TimeZone {
        resolve_time_zone("America/New_York").unwrap()
    }

    #[test]
    fn unknown_zone_is_rejected() {
        assert!(matches!(
            resolve_time_zone("Mars/Olympus_Mons"),
            Err(DateTimeError::UnknownTimeZone(_))
        ));
        assert!(resolve_time_zone("  ").is_err());
    }

    #[test]
    fn wall_clock_is_interpreted_in_the_user_zone() {
        let tz = new_york();
        let ts = parse_due_date(Some("2024-05-01T18:00:00"), &tz).unwrap();
        assert_eq!(ts.to_string(), "2024-05-01T22:00:00Z");
    }

    #[test]
    fn offsets_from_the_model_are_discarded() {
        let tz = new_york();
        for text in [
            "2024-05-01T18:00:00Z",
            "2024-05-01T18:00:00.000Z",
            "2024-05-01T18:00:00+02:00",
            "2024-05-01T18:00:00-07:00[America/Denver]",
        ] {
            let ts = parse_due_date(Some(text), &tz).unwrap();
            assert_eq!(ts.to_string(), "2024-05-01T22:00:00Z", "{text}");
        }
    }

    #[test]
    fn date_only_means_local_midnight() {
        let tz = new_york();
        let ts = parse_due_date(Some("2024-12-25"), &tz).unwrap();
        assert_eq!(ts.to_string(), "2024-12-25T05:00:00Z");
    }

    #[test]
    fn absent_date_defaults_to_now() {
        let before = Timestamp::now();
        let ts = parse_due_date(None, &new_york()).unwrap();
        assert!(ts >= before);
        assert!(parse_due_date(Some(""), &new_york()).unwrap() >= before);
    }

    #[test]
    fn garbage_dates_are_invalid() {
        assert!(matches!(
            parse_due_date(Some("next tuesday"), &new_york()),
            Err(DateTimeError::InvalidDate(_))
        ));
    }

    #[test]
    fn formatting_renders_in_zone() {
        let tz = new_york();
        let ts: Timestamp = "2024-05-01T22:00:00Z".parse().unwrap();
        assert_eq!(format_iso(ts, &tz), "2024-05-01T18:00:00-04:00");
        assert_eq!(format_human(ts, &tz), "Wednesday, May 1, 2024, 6:00 PM EDT");
        assert_eq!(format_date(ts, &tz), "May 1, 2024");
    }

    #[test]
    fn day_and_week_bounds_follow_the_zone() {
        let tz = new_york();
        let date = Date::new(2024, 5, 1).unwrap();

        let (start, end) = day_bounds(date, &tz).unwrap();
        assert_eq!(start.to_string(), "2024-05-01T04:00:00Z");
        assert_eq!(end.to_string(), "2024-05-02T04:00:00Z");

        let (start, end) = week_bounds(date, &tz).unwrap();
        assert_eq!(start.to_string(), "2024-04-28T04:00:00Z");
        assert_eq!(end.to_string(), "2024-05-05T04:00:00Z");
    }
}
