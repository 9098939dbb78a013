//! Accepts the various ways callers express a start or end time.

use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};

/// A start or end time as supplied by the caller.
///
/// Build one with `.into()` from a string (RFC 3339, `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`), a `NaiveDate`, a `NaiveDateTime` or
/// any `DateTime`. Values without an offset are wall-clock times, read in
/// whichever zone they are resolved in; a bare date means midnight. Values
/// with an offset are fixed instants.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use chrono_tz::America::Chicago;
/// use wisconet::TimeBound;
///
/// let from_text: TimeBound = "2025-01-01".into();
/// let from_datetime: TimeBound = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().into();
/// assert_eq!(from_text.resolve(), from_datetime.resolve());
///
/// let chicago_midnight = Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap();
/// assert_eq!(from_text.resolve_in(&Chicago), Some(chicago_midnight));
/// assert_eq!(from_datetime.resolve_in(&Chicago), from_datetime.resolve());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeBound {
    Text(String),
    /// Wall-clock time with no zone attached.
    Local(NaiveDateTime),
    Instant(DateTime<Utc>),
}

impl TimeBound {
    /// Resolves to an instant, reading wall-clock values as UTC. `None` if the
    /// text can't be parsed.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        self.resolve_in(&Utc)
    }

    /// Resolves to an instant, reading wall-clock values in `tz`.
    ///
    /// A time repeated by a DST change takes its first occurrence. A time
    /// skipped by one is read with the offset in force just before the gap.
    pub fn resolve_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        match self.parsed()? {
            TimeBound::Instant(dt) => Some(dt),
            TimeBound::Local(naive) => local_to_utc(tz, &naive),
            TimeBound::Text(_) => None,
        }
    }

    /// True for wall-clock values, whose instant depends on the zone.
    pub fn is_wall_clock(&self) -> bool {
        matches!(self.parsed(), Some(TimeBound::Local(_)))
    }

    // Text parsed into one of the other two variants.
    fn parsed(&self) -> Option<TimeBound> {
        match self {
            TimeBound::Text(text) => parse_text(text.trim()),
            other => Some(other.clone()),
        }
    }
}

fn local_to_utc<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        LocalResult::None => {
            let before = naive.checked_sub_signed(Duration::hours(1))?;
            tz.from_local_datetime(&before)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc) + Duration::hours(1))
        }
    }
}

fn parse_text(text: &str) -> Option<TimeBound> {
    if let Ok(dt) = text.parse::<DateTime<Utc>>() {
        return Some(TimeBound::Instant(dt));
    }
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(text) {
        return Some(TimeBound::Instant(dt.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(TimeBound::Local(naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(TimeBound::Local)
}

impl std::fmt::Display for TimeBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeBound::Text(text) => f.write_str(text),
            TimeBound::Local(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S")),
            TimeBound::Instant(dt) => f.write_str(&dt.to_rfc3339()),
        }
    }
}

impl From<&str> for TimeBound {
    fn from(value: &str) -> Self {
        TimeBound::Text(value.to_string())
    }
}

impl From<String> for TimeBound {
    fn from(value: String) -> Self {
        TimeBound::Text(value)
    }
}

impl From<&String> for TimeBound {
    fn from(value: &String) -> Self {
        TimeBound::Text(value.clone())
    }
}

impl From<NaiveDate> for TimeBound {
    fn from(value: NaiveDate) -> Self {
        match value.and_hms_opt(0, 0, 0) {
            Some(naive) => TimeBound::Local(naive),
            None => TimeBound::Text(value.to_string()),
        }
    }
}

impl From<NaiveDateTime> for TimeBound {
    fn from(value: NaiveDateTime) -> Self {
        TimeBound::Local(value)
    }
}

impl From<DateTime<Utc>> for TimeBound {
    fn from(value: DateTime<Utc>) -> Self {
        TimeBound::Instant(value)
    }
}

impl From<DateTime<FixedOffset>> for TimeBound {
    fn from(value: DateTime<FixedOffset>) -> Self {
        TimeBound::Instant(value.with_timezone(&Utc))
    }
}

impl From<DateTime<Local>> for TimeBound {
    fn from(value: DateTime<Local>) -> Self {
        TimeBound::Instant(value.with_timezone(&Utc))
    }
}

impl From<DateTime<chrono_tz::Tz>> for TimeBound {
    fn from(value: DateTime<chrono_tz::Tz>) -> Self {
        TimeBound::Instant(value.with_timezone(&Utc))
    }
}
