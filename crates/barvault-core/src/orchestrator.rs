//! Download orchestration.
//!
//! One batch owns one gateway connection and runs one ticker cycle at a
//! time. Within a cycle up to three requests are outstanding at the
//! gateway, but every resulting event is consumed by the single sequential
//! loop below, so the per-cycle structures need no locking. The only
//! suspension points are the event wait and the transient-retry pause;
//! there is no overall deadline on a cycle.
//!
//! Per-ticker states: `Idle → Requesting → AwaitingCompletion →
//! Reconciling → Writing → Done`, with `Skipped` exiting early on a
//! no-data verdict and any fatal error aborting per batch policy.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::classify::{NotificationPolicy, Verdict};
use crate::completion::CompletionTracker;
use crate::export;
use crate::gateway::{
    CorrelationId, CorrelationMap, EventStream, GatewayClient, GatewayError, GatewayEvent,
};
use crate::reconcile::{self, ReconcileError};
use crate::series::SeriesBuffer;
use crate::{
    BarTimestamp, CycleScope, InstrumentSpec, ProtocolError, QuoteBar, RequestWindow, SeriesKind,
    Symbol, TradeBar, ValidationError,
};

/// Phase a ticker cycle was in when an outcome was produced; carried on
/// every failure so reports name what was in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Requesting,
    AwaitingCompletion,
    Reconciling,
    Writing,
}

impl CyclePhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requesting => "requesting",
            Self::AwaitingCompletion => "awaiting completion",
            Self::Reconciling => "reconciling",
            Self::Writing => "writing",
        }
    }
}

impl Display for CyclePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with the rest of the batch when reconciliation fails for one
/// ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Abandon the ticker, keep the batch going (default).
    AbortTicker,
    /// Treat the mismatch as batch-fatal.
    AbortBatch,
}

/// Parameters shared by every ticker in a batch.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub window: RequestWindow,
    pub output_dir: PathBuf,
    pub header: bool,
    /// Pacing pause between consecutive ticker cycles.
    pub inter_ticker_delay: Duration,
    pub security_type: String,
    pub currency: String,
    pub venue: String,
    pub reconcile_policy: ReconcilePolicy,
}

impl BatchConfig {
    pub const DEFAULT_INTER_TICKER_DELAY: Duration = Duration::from_secs(10);

    pub fn new(window: RequestWindow, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            window,
            output_dir: output_dir.into(),
            header: true,
            inter_ticker_delay: Self::DEFAULT_INTER_TICKER_DELAY,
            security_type: InstrumentSpec::DEFAULT_SECURITY_TYPE.to_owned(),
            currency: InstrumentSpec::DEFAULT_CURRENCY.to_owned(),
            venue: InstrumentSpec::DEFAULT_VENUE.to_owned(),
            reconcile_policy: ReconcilePolicy::AbortTicker,
        }
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_inter_ticker_delay(mut self, delay: Duration) -> Self {
        self.inter_ticker_delay = delay;
        self
    }

    pub fn with_instrument_route(
        mut self,
        security_type: impl Into<String>,
        currency: impl Into<String>,
        venue: impl Into<String>,
    ) -> Self {
        self.security_type = security_type.into();
        self.currency = currency.into();
        self.venue = venue.into();
        self
    }

    pub fn with_reconcile_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.reconcile_policy = policy;
        self
    }
}

/// Why a ticker produced no output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The vendor reported no data for the requested window.
    NoData,
    /// The cycle completed but every series came back empty.
    EmptySeries,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NoData => "no data for instrument",
            Self::EmptySeries => "completed with empty series",
        })
    }
}

/// Terminal state of one ticker cycle.
#[derive(Debug)]
pub enum TickerOutcome {
    Written { path: PathBuf, rows: usize },
    Skipped { reason: SkipReason },
    Failed { phase: CyclePhase, error: CycleError },
}

/// Errors terminating a single ticker cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("gateway rejected the request (code {code}): {message}")]
    RequestFailed { code: i32, message: String },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// A cycle error tagged with the phase that was in progress.
#[derive(Debug, Error)]
#[error("while {phase}: {error}")]
pub struct CycleFailure {
    pub phase: CyclePhase,
    pub error: CycleError,
}

impl CycleFailure {
    fn new(phase: CyclePhase, error: CycleError) -> Self {
        Self { phase, error }
    }
}

/// Batch-fatal errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to connect to gateway: {0}")]
    Connect(#[source] GatewayError),
    #[error("batch aborted at ticker {symbol} {failure}")]
    Ticker {
        symbol: Symbol,
        #[source]
        failure: CycleFailure,
    },
}

/// Per-ticker result of a completed batch.
#[derive(Debug)]
pub struct TickerReport {
    pub symbol: Symbol,
    pub outcome: TickerOutcome,
}

/// Results of a batch that ran to the end of its ticker list.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<TickerReport>,
}

impl BatchSummary {
    pub fn written_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| matches!(report.outcome, TickerOutcome::Written { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| matches!(report.outcome, TickerOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| matches!(report.outcome, TickerOutcome::Failed { .. }))
            .count()
    }
}

/// Per-batch orchestrator owning its gateway handle, series buffers, and
/// completion tracking. Nothing persists across tickers except the batch
/// configuration; every cycle starts from fresh state.
#[derive(Debug)]
pub struct Downloader<G> {
    gateway: G,
    config: BatchConfig,
    policy: NotificationPolicy,
}

impl<G: GatewayClient> Downloader<G> {
    pub fn new(gateway: G, config: BatchConfig) -> Self {
        Self {
            gateway,
            config,
            policy: NotificationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: NotificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Download every ticker in order over one gateway connection.
    ///
    /// Skips and per-ticker failures (per the reconcile policy) keep the
    /// batch going; fatal verdicts, protocol violations, and transport
    /// loss abort it with the ticker and phase that were in progress.
    pub async fn run_batch(&mut self, symbols: &[Symbol]) -> Result<BatchSummary, BatchError> {
        let mut events = self.gateway.connect().await.map_err(BatchError::Connect)?;
        let mut reports = Vec::with_capacity(symbols.len());

        for (index, symbol) in symbols.iter().enumerate() {
            info!(%symbol, "starting download cycle");
            let outcome = match self.run_cycle(&mut events, symbol).await {
                Ok(outcome) => outcome,
                Err(failure) => {
                    if self.aborts_batch(&failure) {
                        error!(%symbol, phase = %failure.phase, error = %failure.error, "aborting batch");
                        self.gateway.disconnect().await;
                        return Err(BatchError::Ticker {
                            symbol: symbol.clone(),
                            failure,
                        });
                    }
                    warn!(%symbol, phase = %failure.phase, error = %failure.error, "ticker failed, continuing batch");
                    TickerOutcome::Failed {
                        phase: failure.phase,
                        error: failure.error,
                    }
                }
            };

            match &outcome {
                TickerOutcome::Written { path, rows } => {
                    info!(%symbol, rows, path = %path.display(), "wrote output file");
                }
                TickerOutcome::Skipped { reason } => info!(%symbol, %reason, "skipped ticker"),
                TickerOutcome::Failed { .. } => {}
            }
            reports.push(TickerReport {
                symbol: symbol.clone(),
                outcome,
            });

            if index + 1 < symbols.len() && !self.config.inter_ticker_delay.is_zero() {
                tokio::time::sleep(self.config.inter_ticker_delay).await;
            }
        }

        self.gateway.disconnect().await;
        Ok(BatchSummary { reports })
    }

    /// Drive one ticker from request submission to file emission.
    async fn run_cycle(
        &mut self,
        events: &mut EventStream,
        symbol: &Symbol,
    ) -> Result<TickerOutcome, CycleFailure> {
        let scope = self.config.window.scope();

        let phase = CyclePhase::Requesting;
        let instrument = InstrumentSpec::new(
            symbol.clone(),
            &self.config.security_type,
            &self.config.currency,
            &self.config.venue,
        )
        .map_err(|error| CycleFailure::new(phase, error.into()))?;

        // Trade is always requested; bid/ask only exist at intraday
        // granularities and are vacuously complete otherwise.
        let kinds: &[SeriesKind] = match scope {
            CycleScope::Intraday => &[SeriesKind::Trade, SeriesKind::Bid, SeriesKind::Ask],
            CycleScope::Interday => &[SeriesKind::Trade],
        };

        let mut correlations = CorrelationMap::new();
        for (index, kind) in kinds.iter().enumerate() {
            correlations.register(CorrelationId::new(index as u32 + 1), *kind);
        }
        let mut tracker = CompletionTracker::new();
        tracker.begin(correlations.ids());

        let mut bids: SeriesBuffer<QuoteBar> = SeriesBuffer::new();
        let mut asks: SeriesBuffer<QuoteBar> = SeriesBuffer::new();
        let mut trades: SeriesBuffer<TradeBar> = SeriesBuffer::new();

        for (correlation, kind) in correlations.entries() {
            self.gateway
                .submit_request(correlation, kind, &instrument, &self.config.window)
                .await
                .map_err(|error| CycleFailure::new(phase, error.into()))?;
            debug!(%symbol, %correlation, %kind, "submitted request");
        }

        let phase = CyclePhase::AwaitingCompletion;
        loop {
            let Some(event) = events.recv().await else {
                return Err(CycleFailure::new(phase, GatewayError::ConnectionLost.into()));
            };

            match event {
                GatewayEvent::Bar {
                    correlation,
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    volume,
                } => {
                    let kind = correlations.kind_of(correlation).ok_or_else(|| {
                        CycleFailure::new(phase, ProtocolError::UnknownCorrelation(correlation).into())
                    })?;
                    let ts = BarTimestamp::parse_gateway(&timestamp, scope)
                        .map_err(|error| CycleFailure::new(phase, error.into()))?;
                    match kind {
                        SeriesKind::Bid => bids.append(
                            QuoteBar::new(ts, open)
                                .map_err(|error| CycleFailure::new(phase, error.into()))?,
                        ),
                        SeriesKind::Ask => asks.append(
                            QuoteBar::new(ts, open)
                                .map_err(|error| CycleFailure::new(phase, error.into()))?,
                        ),
                        SeriesKind::Trade => trades.append(
                            TradeBar::new(ts, open, high, low, close, volume)
                                .map_err(|error| CycleFailure::new(phase, error.into()))?,
                        ),
                    }
                }
                GatewayEvent::RequestComplete { correlation } => {
                    tracker
                        .mark_done(correlation)
                        .map_err(|error| CycleFailure::new(phase, error.into()))?;
                    debug!(
                        %symbol,
                        %correlation,
                        outstanding = tracker.outstanding_count(),
                        "request complete"
                    );
                    if tracker.is_cycle_complete() {
                        break;
                    }
                }
                GatewayEvent::Notification {
                    correlation: _,
                    code,
                    message,
                } => match self.policy.classify(code, scope) {
                    Verdict::Ignorable => {
                        debug!(%symbol, code, %message, "ignorable gateway notice");
                    }
                    Verdict::TransientRetry(delay) => {
                        warn!(
                            %symbol,
                            code,
                            %message,
                            delay_secs = delay.as_secs(),
                            "transient gateway outage, waiting"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Verdict::NoDataSkip => {
                        info!(%symbol, code, %message, "no data for instrument, skipping ticker");
                        return Ok(TickerOutcome::Skipped {
                            reason: SkipReason::NoData,
                        });
                    }
                    Verdict::Fatal => {
                        return Err(CycleFailure::new(
                            phase,
                            CycleError::RequestFailed { code, message },
                        ));
                    }
                },
            }
        }

        let phase = CyclePhase::Reconciling;
        let records = match scope {
            CycleScope::Intraday => reconcile::join_intraday(
                bids.drain_all(),
                asks.drain_all(),
                trades.drain_all(),
            )
            .map_err(|error| CycleFailure::new(phase, error.into()))?,
            CycleScope::Interday => reconcile::join_interday(trades.drain_all()),
        };

        if records.is_empty() {
            return Ok(TickerOutcome::Skipped {
                reason: SkipReason::EmptySeries,
            });
        }

        let phase = CyclePhase::Writing;
        let (path, rows) = export::export_to_file(
            &self.config.output_dir,
            symbol,
            self.config.window.interval,
            scope,
            &records,
            self.config.header,
        )
        .map_err(|error| CycleFailure::new(phase, error.into()))?;

        Ok(TickerOutcome::Written { path, rows })
    }

    fn aborts_batch(&self, failure: &CycleFailure) -> bool {
        match &failure.error {
            CycleError::RequestFailed { .. }
            | CycleError::Protocol(_)
            | CycleError::Gateway(_)
            | CycleError::Io(_) => true,
            CycleError::Reconcile(_) => self.config.reconcile_policy == ReconcilePolicy::AbortBatch,
            CycleError::Validation(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::replay::{ReplayGateway, Scenario};
    use crate::{BarInterval, Lookback};
    use std::str::FromStr;

    fn config(dir: &std::path::Path) -> BatchConfig {
        let window = RequestWindow::new(
            None,
            Lookback::from_str("5 D").expect("lookback"),
            BarInterval::from_str("1 day").expect("interval"),
        );
        BatchConfig::new(window, dir).with_inter_ticker_delay(Duration::ZERO)
    }

    #[test]
    fn batch_config_defaults_match_gateway_conventions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config(dir.path());
        assert!(config.header);
        assert_eq!(config.security_type, "STK");
        assert_eq!(config.reconcile_policy, ReconcilePolicy::AbortTicker);
    }

    #[test]
    fn reconcile_failures_respect_batch_policy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let failure = CycleFailure::new(
            CyclePhase::Reconciling,
            ReconcileError::QuoteLengthMismatch { bids: 2, asks: 1 }.into(),
        );

        let downloader = Downloader::new(ReplayGateway::new(Scenario::default()), config(dir.path()));
        assert!(!downloader.aborts_batch(&failure));

        let strict = Downloader::new(
            ReplayGateway::new(Scenario::default()),
            config(dir.path()).with_reconcile_policy(ReconcilePolicy::AbortBatch),
        );
        assert!(strict.aborts_batch(&failure));
    }

    #[test]
    fn fatal_and_protocol_errors_abort_the_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let downloader = Downloader::new(ReplayGateway::new(Scenario::default()), config(dir.path()));

        let fatal = CycleFailure::new(
            CyclePhase::AwaitingCompletion,
            CycleError::RequestFailed {
                code: 507,
                message: "bad message".to_owned(),
            },
        );
        assert!(downloader.aborts_batch(&fatal));

        let protocol = CycleFailure::new(
            CyclePhase::AwaitingCompletion,
            ProtocolError::UnknownCorrelation(CorrelationId::new(9)).into(),
        );
        assert!(downloader.aborts_batch(&protocol));
    }
}
