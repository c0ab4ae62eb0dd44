//! # Barvault Core
//!
//! Request correlation, time-series reconciliation, and export engine for
//! historical market bar downloads.
//!
//! ## Overview
//!
//! A batch downloads one or more tickers over a single gateway connection.
//! Each ticker cycle issues up to three concurrently-outstanding requests
//! (trade always; bid and ask at intraday granularities), consumes the
//! gateway's unordered event stream tagged by correlation id, classifies
//! vendor notifications into recovery actions, joins the independently
//! delivered series into one record per timestamp, and writes a delimited
//! text file per ticker.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Validated domain models (symbols, windows, bars, records) |
//! | [`gateway`] | Gateway client contract, event channel, replay adapter |
//! | [`series`] | Append-only per-series bar buffer |
//! | [`completion`] | Outstanding-request tracking per cycle |
//! | [`classify`] | Vendor notification classification policy |
//! | [`reconcile`] | Three-way bid/ask/trade join |
//! | [`orchestrator`] | Batch driver and per-ticker state machine |
//! | [`export`] | Delimited-text output files |
//! | [`error`] | Validation and protocol error types |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::str::FromStr;
//! use barvault_core::{
//!     BarInterval, BatchConfig, Downloader, Lookback, RequestWindow, Symbol,
//! };
//! use barvault_core::gateway::replay::{ReplayGateway, Scenario};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let window = RequestWindow::new(
//!         None,
//!         Lookback::from_str("5 D")?,
//!         BarInterval::from_str("1 day")?,
//!     );
//!     let config = BatchConfig::new(window, "./data");
//!     let gateway = ReplayGateway::new(Scenario::default());
//!
//!     let mut downloader = Downloader::new(gateway, config);
//!     let summary = downloader.run_batch(&[Symbol::parse("AAPL")?]).await?;
//!     println!("{} file(s) written", summary.written_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Benign vendor notices and transient farm outages are absorbed inside
//! the orchestrator's wait loop. Everything else terminates at least the
//! current ticker's cycle and is reported with the ticker identity, the
//! phase in progress, and the cause; correlation-id mismatches surface as
//! [`ProtocolError`] and are never silently swallowed.

pub mod classify;
pub mod completion;
pub mod domain;
pub mod error;
pub mod export;
pub mod gateway;
pub mod orchestrator;
pub mod reconcile;
pub mod series;

// Re-export commonly used types at crate root for convenience

pub use classify::{NotificationPolicy, Verdict};
pub use completion::CompletionTracker;
pub use domain::{
    validate_currency_code, BarInterval, BarTimestamp, BarUnit, CycleScope, EndTime,
    InstrumentSpec, JoinedRecord, Lookback, LookbackUnit, QuoteBar, QuoteValues, RequestWindow,
    SeriesKind, Symbol, TradeBar, TradeValues, DEFAULT_ZONE,
};
pub use error::{ProtocolError, ValidationError};
pub use gateway::{
    CorrelationId, CorrelationMap, EventStream, GatewayClient, GatewayError, GatewayEvent,
};
pub use orchestrator::{
    BatchConfig, BatchError, BatchSummary, CycleError, CycleFailure, CyclePhase, Downloader,
    ReconcilePolicy, SkipReason, TickerOutcome, TickerReport,
};
pub use reconcile::{join_interday, join_intraday, ReconcileError};
pub use series::SeriesBuffer;
