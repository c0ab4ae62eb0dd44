use std::fmt::{Display, Formatter};

use crate::domain::timestamp::BarTimestamp;
use crate::ValidationError;

/// Price series requested from the gateway for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Bid,
    Ask,
    Trade,
}

impl SeriesKind {
    /// Vendor token sent with the request.
    pub const fn as_request_token(self) -> &'static str {
        match self {
            Self::Bid => "BID",
            Self::Ask => "ASK",
            Self::Trade => "TRADES",
        }
    }
}

impl Display for SeriesKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_request_token())
    }
}

/// Single observation of a bid or ask series.
///
/// The gateway delivers full OHLC bars for quote series too; only the open
/// is meaningful as the quoted price, so that is all we keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteBar {
    pub ts: BarTimestamp,
    pub price: f64,
}

impl QuoteBar {
    pub fn new(ts: BarTimestamp, price: f64) -> Result<Self, ValidationError> {
        validate_price("price", price)?;
        Ok(Self { ts, price })
    }
}

/// Single traded-price bar with volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeBar {
    pub ts: BarTimestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Vendor reports -1 when volume is unavailable for the granularity.
    pub volume: i64,
}

impl TradeBar {
    pub fn new(
        ts: BarTimestamp,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Result<Self, ValidationError> {
        validate_price("open", open)?;
        validate_price("high", high)?;
        validate_price("low", low)?;
        validate_price("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Trade-side values of a joined record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeValues {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl From<TradeBar> for TradeValues {
    fn from(bar: TradeBar) -> Self {
        Self {
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// Quote-side values of a joined record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteValues {
    pub bid: f64,
    pub ask: f64,
}

/// One reconciled output row.
///
/// Interday records carry no quote side; an intraday record's trade side is
/// absent when no trade printed at that timestamp. Immutable once produced
/// by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRecord {
    pub ts: BarTimestamp,
    pub quote: Option<QuoteValues>,
    pub trade: Option<TradeValues>,
}

impl JoinedRecord {
    pub fn intraday(ts: BarTimestamp, bid: f64, ask: f64, trade: Option<TradeValues>) -> Self {
        Self {
            ts,
            quote: Some(QuoteValues { bid, ask }),
            trade,
        }
    }

    pub fn interday(ts: BarTimestamp, trade: TradeValues) -> Self {
        Self {
            ts,
            quote: None,
            trade: Some(trade),
        }
    }
}

fn validate_price(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
