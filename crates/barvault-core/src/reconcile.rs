//! Three-way series reconciliation.
//!
//! Bid, ask, and trade series arrive independently paced and may disagree
//! in cardinality: a thinly-traded instrument prints quote bars at
//! timestamps where no trade executed. The join treats the bid series as
//! authoritative for alignment and repairs a strictly-shorter trade series
//! by inserting absent-trade placeholders, never dropping a quote
//! observation. Every other cardinality mismatch is unrecoverable and is
//! reported, not truncated.

use thiserror::Error;

use crate::{JoinedRecord, QuoteBar, TradeBar, TradeValues};

/// Cardinality mismatches the join cannot repair.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("bid and ask series lengths differ: {bids} bids vs {asks} asks")]
    QuoteLengthMismatch { bids: usize, asks: usize },
    #[error("trade series is longer than the quote series: {trades} trades vs {quotes} quotes")]
    TradeOverflow { trades: usize, quotes: usize },
    #[error("trade bar at {timestamp} matches no quote timestamp")]
    UnmatchedTrade { timestamp: String },
}

/// Join the three intraday series into one record per quote timestamp.
///
/// Equal-cardinality series zip positionally (they are delivered in
/// lockstep chronological order, so the positional zip is a timestamp
/// join). A strictly-shorter trade series is repaired by walking the bid
/// timestamps and inserting an absent trade wherever the next trade bar
/// does not match.
pub fn join_intraday(
    bids: Vec<QuoteBar>,
    asks: Vec<QuoteBar>,
    trades: Vec<TradeBar>,
) -> Result<Vec<JoinedRecord>, ReconcileError> {
    if bids.len() != asks.len() {
        return Err(ReconcileError::QuoteLengthMismatch {
            bids: bids.len(),
            asks: asks.len(),
        });
    }
    if trades.len() > bids.len() {
        return Err(ReconcileError::TradeOverflow {
            trades: trades.len(),
            quotes: bids.len(),
        });
    }

    let repair = trades.len() < bids.len();
    let mut trades = trades.into_iter().peekable();
    let mut records = Vec::with_capacity(bids.len());

    for (bid, ask) in bids.into_iter().zip(asks) {
        let trade = if repair {
            match trades.peek() {
                Some(next) if next.ts == bid.ts => trades.next().map(TradeValues::from),
                _ => None,
            }
        } else {
            trades.next().map(TradeValues::from)
        };
        records.push(JoinedRecord::intraday(bid.ts, bid.price, ask.price, trade));
    }

    if let Some(leftover) = trades.next() {
        return Err(ReconcileError::UnmatchedTrade {
            timestamp: leftover.ts.to_string(),
        });
    }

    Ok(records)
}

/// Interday cycles carry trades only; each bar becomes a record with no
/// quote side.
pub fn join_interday(trades: Vec<TradeBar>) -> Vec<JoinedRecord> {
    trades
        .into_iter()
        .map(|bar| JoinedRecord::interday(bar.ts, TradeValues::from(bar)))
        .collect()
}
