use crate::types::Date;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Debug, Display},
    str::FromStr,
};
use time::{
    Date as TimeDate, Month, OffsetDateTime, PrimitiveDateTime, Time,
    format_description::well_known::Rfc3339,
};

/// Widest fractional-second precision a datetime column may declare.
pub const MAX_FRACTIONAL_DIGITS: u8 = 9;

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

///
/// DateTime
/// (UTC instant, nanoseconds since 1970-01-01T00:00:00Z)
///
/// The `i64` carrier bounds the range to roughly 1677-09-21 through
/// 2262-04-11; checked constructors reject instants outside it.
///

#[derive(Clone, Copy, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct DateTime(i64);

impl DateTime {
    pub const EPOCH: Self = Self(0);

    /// Construct from nanoseconds since the Unix epoch.
    #[must_use]
    pub const fn from_unix_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Construct from whole seconds since the Unix epoch.
    #[must_use]
    pub const fn from_unix_seconds(secs: i64) -> Option<Self> {
        match secs.checked_mul(NANOS_PER_SECOND) {
            Some(nanos) => Some(Self(nanos)),
            None => None,
        }
    }

    /// Construct from civil UTC components, rejecting invalid or
    /// out-of-range instants.
    #[must_use]
    pub fn new_checked(y: i32, m: u8, d: u8, h: u8, min: u8, s: u8, nano: u32) -> Option<Self> {
        let month = Month::try_from(m).ok()?;
        let date = TimeDate::from_calendar_date(y, month, d).ok()?;
        let time = Time::from_hms_nano(h, min, s, nano).ok()?;
        let nanos = PrimitiveDateTime::new(date, time)
            .assume_utc()
            .unix_timestamp_nanos();

        i64::try_from(nanos).ok().map(Self)
    }

    #[must_use]
    pub const fn unix_nanos(self) -> i64 {
        self.0
    }

    /// Whole seconds since the epoch, floored for pre-epoch instants.
    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0.div_euclid(NANOS_PER_SECOND)
    }

    /// Nanoseconds into the current second (always `0..1_000_000_000`).
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn subsec_nanos(self) -> u32 {
        self.0.rem_euclid(NANOS_PER_SECOND) as u32
    }

    /// The civil UTC date this instant falls on.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub const fn date(self) -> Date {
        Date::from_epoch_days(self.0.div_euclid(NANOS_PER_DAY) as i32)
    }

    /// Drop every fractional digit beyond `digits`, truncating toward
    /// earlier time. Truncation never rounds: `09:32:19.2719` at two
    /// digits becomes `09:32:19.27`. Saturates at the range floor.
    #[must_use]
    pub const fn truncate(self, digits: u8) -> Self {
        match self.truncate_checked(digits) {
            Some(floored) => floored,
            None => Self(i64::MIN),
        }
    }

    /// Like `truncate`, but `None` when the floored instant would leave
    /// the representable range. Only the carrier's partial opening
    /// second floors out of range.
    #[must_use]
    pub const fn truncate_checked(self, digits: u8) -> Option<Self> {
        let digits = if digits > MAX_FRACTIONAL_DIGITS {
            MAX_FRACTIONAL_DIGITS
        } else {
            digits
        };
        let step = 10_i64.pow((MAX_FRACTIONAL_DIGITS - digits) as u32);

        // Floor to the step boundary, toward earlier time for pre-epoch
        // instants as well.
        match self.0.checked_sub(self.0.rem_euclid(step)) {
            Some(nanos) => Some(Self(nanos)),
            None => None,
        }
    }

    /// Canonical `YYYY-MM-DD HH:MM:SS` text carrying exactly `digits`
    /// fractional digits (zero-padded, truncated). Zero digits emits no
    /// fraction and no dot.
    #[must_use]
    pub fn format_with_precision(self, digits: u8) -> String {
        let digits = usize::from(digits.min(MAX_FRACTIONAL_DIGITS));
        let base = self.format_seconds();
        if digits == 0 {
            return base;
        }

        let frac = format!("{:09}", self.subsec_nanos());
        format!("{base}.{}", &frac[..digits])
    }

    /// Parse canonical `YYYY-MM-DD HH:MM:SS[.f]` text or an RFC 3339
    /// string (`T` separator with `Z` or a numeric offset).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if let Ok(odt) = OffsetDateTime::parse(s, &Rfc3339) {
            return i64::try_from(odt.unix_timestamp_nanos()).ok().map(Self);
        }

        // Naive form, with either separator and an optional fraction.
        let (date_part, time_part) = match s.split_once([' ', 'T', 't']) {
            Some(parts) => parts,
            None => return None,
        };
        let date = Date::parse(date_part)?;

        let (hms, frac) = match time_part.split_once('.') {
            Some((hms, frac)) => (hms, Some(frac)),
            None => (time_part, None),
        };

        let mut fields = hms.split(':');
        let h: u8 = fields.next()?.parse().ok()?;
        let min: u8 = fields.next()?.parse().ok()?;
        let sec: u8 = fields.next()?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }

        let nano = match frac {
            None => 0,
            Some(f) => parse_fraction(f)?,
        };
        Time::from_hms_nano(h, min, sec, nano).ok()?;

        let day = i128::from(date.epoch_days()) * i128::from(NANOS_PER_DAY);
        let in_day = i64::from(h) * NANOS_PER_HOUR
            + i64::from(min) * NANOS_PER_MINUTE
            + i64::from(sec) * NANOS_PER_SECOND
            + i64::from(nano);

        // Widen before summing: midnight of the first representable
        // civil day is itself below the i64 carrier.
        i64::try_from(day + i128::from(in_day)).ok().map(Self)
    }

    fn format_seconds(self) -> String {
        let dt = self.to_offset();
        let month: u8 = dt.month().into();
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            dt.year(),
            month,
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        )
    }

    fn to_offset(self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

/// A fraction is 1 to 9 ASCII digits, right-padded to nanoseconds.
fn parse_fraction(f: &str) -> Option<u32> {
    if f.is_empty() || f.len() > usize::from(MAX_FRACTIONAL_DIGITS) {
        return None;
    }
    if !f.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut padded = String::from(f);
    while padded.len() < usize::from(MAX_FRACTIONAL_DIGITS) {
        padded.push('0');
    }

    padded.parse().ok()
}

impl Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DateTime({self})")
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.subsec_nanos();
        if nanos == 0 {
            return write!(f, "{}", self.format_seconds());
        }

        let frac = format!("{nanos:09}");
        write!(
            f,
            "{}.{}",
            self.format_seconds(),
            frac.trim_end_matches('0')
        )
    }
}

impl FromStr for DateTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid datetime: {s}"))
    }
}

impl Serialize for DateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {s}")))
    }
}

///
/// TESTS
///
