// ABOUTME: Relative SMPP time format used for validity_period (YYMMDDhhmmsstnnR)
// ABOUTME: Converts std Durations into the 16 character relative form and back

use std::fmt;
use std::time::Duration;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
// The relative format has no calendar, SMSCs count months as 30 days
// and years as 365 days.
const DAYS_PER_MONTH: u64 = 30;
const DAYS_PER_YEAR: u64 = 365;

/// A relative SMPP time, e.g. `000000001000000R` for ten minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelativeTime {
    pub years: u8,
    pub months: u8,
    pub days: u8,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl RelativeTime {
    /// Length of the encoded form without the terminating NUL
    pub const LEN: usize = 16;

    /// Splits a duration into the relative components. Sub-second precision
    /// is dropped and anything beyond 99 years is clamped.
    pub fn from_duration(duration: Duration) -> Self {
        let mut secs = duration.as_secs();

        let mut days = secs / SECS_PER_DAY;
        secs %= SECS_PER_DAY;
        let hours = secs / SECS_PER_HOUR;
        secs %= SECS_PER_HOUR;
        let minutes = secs / SECS_PER_MINUTE;
        let seconds = secs % SECS_PER_MINUTE;

        let years = days / DAYS_PER_YEAR;
        days %= DAYS_PER_YEAR;
        let months = days / DAYS_PER_MONTH;
        days %= DAYS_PER_MONTH;

        if years > 99 {
            return Self {
                years: 99,
                months: 11,
                days: 29,
                hours: 23,
                minutes: 59,
                seconds: 59,
            };
        }

        Self {
            years: years as u8,
            months: months as u8,
            days: days as u8,
            hours: hours as u8,
            minutes: minutes as u8,
            seconds: seconds as u8,
        }
    }

    pub fn to_duration(&self) -> Duration {
        let days = self.years as u64 * DAYS_PER_YEAR
            + self.months as u64 * DAYS_PER_MONTH
            + self.days as u64;
        Duration::from_secs(
            days * SECS_PER_DAY
                + self.hours as u64 * SECS_PER_HOUR
                + self.minutes as u64 * SECS_PER_MINUTE
                + self.seconds as u64,
        )
    }

    /// Parses the 16 character relative form. Absolute times (ending in `+`
    /// or `-`) are not relative and yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let bytes = value.as_bytes();
        if bytes.len() != Self::LEN || bytes[15] != b'R' {
            return None;
        }
        if !bytes[..15].iter().all(u8::is_ascii_digit) {
            return None;
        }
        let pair = |i: usize| (bytes[i] - b'0') * 10 + (bytes[i + 1] - b'0');
        Some(Self {
            years: pair(0),
            months: pair(2),
            days: pair(4),
            hours: pair(6),
            minutes: pair(8),
            seconds: pair(10),
        })
    }
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // tenths of a second and the quarter-hour offset are always zero
        write!(
            f,
            "{:02}{:02}{:02}{:02}{:02}{:02}000R",
            self.years, self.months, self.days, self.hours, self.minutes, self.seconds
        )
    }
}

impl From<Duration> for RelativeTime {
    fn from(duration: Duration) -> Self {
        RelativeTime::from_duration(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_minutes() {
        let rel = RelativeTime::from_duration(Duration::from_secs(600));
        assert_eq!(rel.to_string(), "000000001000000R");
    }

    #[test]
    fn mixed_components() {
        // 1 year, 2 months, 3 days, 4h 5m 6s
        let secs = (365 + 60 + 3) * SECS_PER_DAY + 4 * 3600 + 5 * 60 + 6;
        let rel = RelativeTime::from_duration(Duration::from_secs(secs));
        assert_eq!(rel.to_string(), "010203040506000R");
        assert_eq!(rel.to_duration(), Duration::from_secs(secs));
    }

    #[test]
    fn clamps_beyond_ninety_nine_years() {
        let rel = RelativeTime::from_duration(Duration::from_secs(200 * 365 * SECS_PER_DAY));
        assert_eq!(rel.years, 99);
        assert_eq!(rel.to_string().len(), RelativeTime::LEN);
    }

    #[test]
    fn parse_relative_only() {
        let rel = RelativeTime::parse("000001000000000R").unwrap();
        assert_eq!(rel.to_duration(), Duration::from_secs(SECS_PER_DAY));
        assert!(RelativeTime::parse("250101120000004+").is_none());
        assert!(RelativeTime::parse("").is_none());
    }
}
