//! # Domain Models
//!
//! Strongly-typed domain models for historical bar downloads.
//!
//! All models validate their invariants at construction time:
//!
//! ```rust,ignore
//! use barvault_core::{BarInterval, TradeBar, ValidationError};
//! use std::str::FromStr;
//!
//! // Valid bar size token
//! let interval = BarInterval::from_str("5 mins")?;
//!
//! // Invalid count for a minute bar - returns ValidationError
//! let invalid = BarInterval::from_str("7 mins");
//! assert!(matches!(invalid, Err(ValidationError::InvalidIntradayCount { .. })));
//! ```
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker symbol |
//! | [`InstrumentSpec`] | Contract parameters sent with each request |
//! | [`Lookback`] / [`BarInterval`] | Vendor request window tokens |
//! | [`RequestWindow`] | End time + lookback + bar size of one request |
//! | [`BarTimestamp`] | Interday date or zone-stripped intraday datetime |
//! | [`QuoteBar`] / [`TradeBar`] | Per-series observations |
//! | [`JoinedRecord`] | One reconciled output row |

mod bars;
mod instrument;
mod symbol;
mod timestamp;
mod window;

pub use bars::{JoinedRecord, QuoteBar, QuoteValues, SeriesKind, TradeBar, TradeValues};
pub use instrument::{validate_currency_code, InstrumentSpec};
pub use symbol::Symbol;
pub use timestamp::BarTimestamp;
pub use window::{
    BarInterval, BarUnit, CycleScope, EndTime, Lookback, LookbackUnit, RequestWindow, DEFAULT_ZONE,
};
