use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

use crate::domain::window::CycleScope;
use crate::ValidationError;

pub(crate) const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]");
pub(crate) const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day] [hour]:[minute]:[second]");

/// Bar timestamp as the vendor keys it: a bare date for interday bars, a
/// zone-free wall-clock datetime for intraday bars.
///
/// Intraday timestamps arrive from the gateway with a trailing zone name
/// (`20240105 09:30:00 US/Eastern`); the zone is stripped on parse and the
/// wall-clock reading is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarTimestamp {
    Date(Date),
    DateTime(PrimitiveDateTime),
}

impl BarTimestamp {
    /// Parse the vendor's timestamp string for the given cycle scope.
    pub fn parse_gateway(raw: &str, scope: CycleScope) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let invalid = || ValidationError::InvalidTimestamp {
            value: raw.to_owned(),
        };

        match scope {
            CycleScope::Interday => Date::parse(trimmed, DATE_FORMAT)
                .map(Self::Date)
                .map_err(|_| invalid()),
            CycleScope::Intraday => {
                let head = trimmed.get(..17).ok_or_else(invalid)?;
                PrimitiveDateTime::parse(head, DATETIME_FORMAT)
                    .map(Self::DateTime)
                    .map_err(|_| invalid())
            }
        }
    }

    /// Calendar date of the bar, used for output file naming.
    pub fn date(&self) -> Date {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(datetime) => datetime.date(),
        }
    }

    fn sort_key(&self) -> PrimitiveDateTime {
        match self {
            Self::Date(date) => date.midnight(),
            Self::DateTime(datetime) => *datetime,
        }
    }
}

impl Display for BarTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = match self {
            Self::Date(date) => date.format(DATE_FORMAT),
            Self::DateTime(datetime) => datetime.format(DATETIME_FORMAT),
        }
        .expect("bar timestamp must be formattable");
        f.write_str(&rendered)
    }
}

impl PartialOrd for BarTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BarTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interday_date() {
        let ts = BarTimestamp::parse_gateway("20240105", CycleScope::Interday).expect("must parse");
        assert_eq!(ts.to_string(), "20240105");
    }

    #[test]
    fn strips_zone_from_intraday_timestamp() {
        let ts = BarTimestamp::parse_gateway("20240105 09:30:00 US/Eastern", CycleScope::Intraday)
            .expect("must parse");
        assert_eq!(ts.to_string(), "20240105 09:30:00");
    }

    #[test]
    fn parses_intraday_timestamp_without_zone() {
        let ts = BarTimestamp::parse_gateway("20240105 09:30:00", CycleScope::Intraday)
            .expect("must parse");
        assert_eq!(ts.date().to_string(), "2024-01-05");
    }

    #[test]
    fn rejects_short_intraday_timestamp() {
        let err = BarTimestamp::parse_gateway("20240105", CycleScope::Intraday)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidTimestamp { .. }));
    }

    #[test]
    fn orders_by_wall_clock() {
        let earlier = BarTimestamp::parse_gateway("20240105 09:30:00", CycleScope::Intraday)
            .expect("must parse");
        let later = BarTimestamp::parse_gateway("20240105 09:35:00", CycleScope::Intraday)
            .expect("must parse");
        assert!(earlier < later);
    }
}
