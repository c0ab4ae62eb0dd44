use std::fmt::{Display, Formatter};
use std::str::FromStr;

use time::macros::time;
use time::{Date, PrimitiveDateTime};

use crate::domain::timestamp::DATETIME_FORMAT;
use crate::ValidationError;

/// Time zone the vendor expects request end timestamps in.
pub const DEFAULT_ZONE: &str = "America/New_York";

/// Granularity class of a download cycle.
///
/// Intraday cycles request bid, ask, and trade series; interday cycles
/// request trades only and treat bid/ask as vacuously complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleScope {
    Intraday,
    Interday,
}

/// Lookback duration unit in the vendor's single-letter encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookbackUnit {
    Seconds,
    Days,
    Weeks,
    Months,
    Years,
}

impl LookbackUnit {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Seconds => "S",
            Self::Days => "D",
            Self::Weeks => "W",
            Self::Months => "M",
            Self::Years => "Y",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(Self::Seconds),
            "d" | "day" | "days" => Some(Self::Days),
            "w" | "wk" | "wks" | "week" | "weeks" => Some(Self::Weeks),
            "m" | "mo" | "month" | "months" => Some(Self::Months),
            "y" | "yr" | "yrs" | "year" | "years" => Some(Self::Years),
            _ => None,
        }
    }
}

/// How far back from the end timestamp a request reaches.
///
/// Encodes as `"<count> <S|D|W|M|Y>"` on the wire, e.g. `"5 D"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lookback {
    count: u32,
    unit: LookbackUnit,
}

impl Lookback {
    pub fn new(count: u32, unit: LookbackUnit) -> Result<Self, ValidationError> {
        if count == 0 {
            return Err(ValidationError::ZeroLookback);
        }
        Ok(Self { count, unit })
    }

    pub const fn count(self) -> u32 {
        self.count
    }

    pub const fn unit(self) -> LookbackUnit {
        self.unit
    }

    /// Vendor wire token.
    pub fn encode(self) -> String {
        format!("{} {}", self.count, self.unit.code())
    }
}

impl Display for Lookback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Lookback {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (count, unit_token) =
            split_count_unit(value).ok_or_else(|| ValidationError::InvalidLookback {
                value: value.to_owned(),
            })?;
        let unit = LookbackUnit::from_token(&unit_token.to_ascii_lowercase()).ok_or_else(|| {
            ValidationError::InvalidLookbackUnit {
                value: unit_token.to_owned(),
            }
        })?;
        Self::new(count, unit)
    }
}

/// Bar granularity unit in the vendor's plural spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarUnit {
    Secs,
    Mins,
    Hours,
    Day,
    Week,
    Year,
}

impl BarUnit {
    pub const fn base_token(self) -> &'static str {
        match self {
            Self::Secs => "secs",
            Self::Mins => "mins",
            Self::Hours => "hours",
            Self::Day => "day",
            Self::Week => "week",
            Self::Year => "year",
        }
    }

    /// Spelling used when the count is 1; the vendor drops the trailing `s`.
    const fn singular_token(self) -> &'static str {
        match self {
            Self::Secs => "sec",
            Self::Mins => "min",
            Self::Hours => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Year => "year",
        }
    }

    pub const fn is_intraday(self) -> bool {
        matches!(self, Self::Secs | Self::Mins | Self::Hours)
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "sec" | "secs" | "second" | "seconds" => Some(Self::Secs),
            "min" | "mins" | "minute" | "minutes" => Some(Self::Mins),
            "hour" | "hours" | "hr" | "hrs" => Some(Self::Hours),
            "day" | "days" => Some(Self::Day),
            "week" | "weeks" | "wk" | "wks" => Some(Self::Week),
            "year" | "years" | "yr" | "yrs" => Some(Self::Year),
            _ => None,
        }
    }
}

/// Bar size accepted by the vendor.
///
/// Seconds and minutes admit counts 1/5/10/15/30; hours, day, week, and
/// year admit only 1. Encodes as e.g. `"5 mins"`, `"1 hour"`, `"1 day"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BarInterval {
    count: u32,
    unit: BarUnit,
}

impl BarInterval {
    const INTRADAY_COUNTS: [u32; 5] = [1, 5, 10, 15, 30];

    pub fn new(count: u32, unit: BarUnit) -> Result<Self, ValidationError> {
        match unit {
            BarUnit::Secs | BarUnit::Mins => {
                if !Self::INTRADAY_COUNTS.contains(&count) {
                    return Err(ValidationError::InvalidIntradayCount { count });
                }
            }
            BarUnit::Hours | BarUnit::Day | BarUnit::Week | BarUnit::Year => {
                if count != 1 {
                    return Err(ValidationError::InvalidSingularCount {
                        count,
                        unit: unit.base_token(),
                    });
                }
            }
        }
        Ok(Self { count, unit })
    }

    pub const fn count(self) -> u32 {
        self.count
    }

    pub const fn unit(self) -> BarUnit {
        self.unit
    }

    pub const fn is_intraday(self) -> bool {
        self.unit.is_intraday()
    }

    pub const fn scope(self) -> CycleScope {
        if self.unit.is_intraday() {
            CycleScope::Intraday
        } else {
            CycleScope::Interday
        }
    }

    /// Vendor wire token, singular when the count is 1.
    pub fn encode(self) -> String {
        let unit = if self.count == 1 {
            self.unit.singular_token()
        } else {
            self.unit.base_token()
        };
        format!("{} {}", self.count, unit)
    }

    /// Wire token with whitespace removed, used in output file names.
    pub fn compact_token(self) -> String {
        self.encode().replace(' ', "")
    }
}

impl Display for BarInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for BarInterval {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (count, unit_token) =
            split_count_unit(value).ok_or_else(|| ValidationError::InvalidBarSize {
                value: value.to_owned(),
            })?;
        let unit = BarUnit::from_token(&unit_token.to_ascii_lowercase()).ok_or_else(|| {
            ValidationError::InvalidBarSizeUnit {
                value: unit_token.to_owned(),
            }
        })?;
        Self::new(count, unit)
    }
}

/// Request end timestamp with the zone name the vendor expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTime {
    datetime: PrimitiveDateTime,
    zone: String,
}

impl EndTime {
    pub fn new(datetime: PrimitiveDateTime, zone: impl Into<String>) -> Self {
        Self {
            datetime,
            zone: zone.into(),
        }
    }

    /// 16:00:00 New York on the given date, the vendor's session close.
    pub fn close_of_day(date: Date) -> Self {
        Self::new(PrimitiveDateTime::new(date, time!(16:00:00)), DEFAULT_ZONE)
    }

    /// Vendor wire form: `YYYYMMDD HH:mm:ss <zone>`.
    pub fn encode(&self) -> String {
        let stamp = self
            .datetime
            .format(DATETIME_FORMAT)
            .expect("end timestamp must be formattable");
        format!("{} {}", stamp, self.zone)
    }
}

/// Complete time parameters of one historical data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestWindow {
    pub end: Option<EndTime>,
    pub lookback: Lookback,
    pub interval: BarInterval,
}

impl RequestWindow {
    pub fn new(end: Option<EndTime>, lookback: Lookback, interval: BarInterval) -> Self {
        Self {
            end,
            lookback,
            interval,
        }
    }

    pub const fn scope(&self) -> CycleScope {
        self.interval.scope()
    }

    /// End timestamp wire token; empty means "now" to the vendor.
    pub fn encode_end(&self) -> String {
        self.end
            .as_ref()
            .map(EndTime::encode)
            .unwrap_or_default()
    }
}

fn split_count_unit(input: &str) -> Option<(u32, &str)> {
    let trimmed = input.trim();
    let digits_end = trimmed.find(|ch: char| !ch.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let (digits, rest) = trimmed.split_at(digits_end);
    let count = digits.parse().ok()?;
    let unit = rest.trim();
    if unit.is_empty() {
        return None;
    }
    Some((count, unit))
}
