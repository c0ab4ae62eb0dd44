use thiserror::Error;

use crate::gateway::CorrelationId;

/// Validation and contract errors exposed by `barvault-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid lookback '{value}', expected '<count> <S|D|W|M|Y>' or a spelled-out unit")]
    InvalidLookback { value: String },
    #[error("unrecognized lookback unit '{value}'")]
    InvalidLookbackUnit { value: String },
    #[error("lookback count must be at least 1")]
    ZeroLookback,

    #[error("invalid bar size '{value}', expected '<count> <secs|mins|hours|day|week|year>'")]
    InvalidBarSize { value: String },
    #[error("unrecognized bar size unit '{value}'")]
    InvalidBarSizeUnit { value: String },
    #[error("bar size count {count} is not accepted for seconds/minutes, expected one of 1, 5, 10, 15, 30")]
    InvalidIntradayCount { count: u32 },
    #[error("bar size count {count} is not accepted for {unit}, only 1 is valid")]
    InvalidSingularCount { count: u32, unit: &'static str },

    #[error("invalid bar timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("currency must be a 3-letter ISO code: '{value}'")]
    InvalidCurrency { value: String },
    #[error("instrument field '{field}' cannot be empty")]
    EmptyInstrumentField { field: &'static str },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("bar high must be >= low")]
    InvalidBarRange,
}

/// Correlation-id bookkeeping faults between the request issuer and the
/// gateway. These indicate a programming or protocol defect and are never
/// silently swallowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("correlation id {0} is not outstanding in the active cycle")]
    UnknownCorrelation(CorrelationId),
    #[error("received completion for correlation id {0} with no active cycle")]
    NoActiveCycle(CorrelationId),
}
