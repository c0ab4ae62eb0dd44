//! Gateway client contract and inbound event channel.
//!
//! The transport (wire framing, message decoding, sockets, reader-thread
//! pumping) lives behind [`GatewayClient`]; this crate only drives the
//! trait and consumes the [`GatewayEvent`] channel a connection yields.
//! [`ReplayGateway`](crate::gateway::replay::ReplayGateway) is the bundled
//! in-process implementation; production transports implement the same
//! trait out of tree.

pub mod replay;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::{InstrumentSpec, RequestWindow, SeriesKind};

/// Request tag scoped to one ticker cycle.
///
/// Small positive integer chosen by the request issuer; the gateway echoes
/// it on every event belonging to that request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(u32);

impl CorrelationId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inbound event delivered by a gateway connection.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// One historical bar for an outstanding request. The timestamp is the
    /// vendor's string form; parsing happens at ingestion.
    Bar {
        correlation: CorrelationId,
        timestamp: String,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    },
    /// All bars for the tagged request have been delivered.
    RequestComplete { correlation: CorrelationId },
    /// Vendor notification or error. `correlation` is absent for
    /// connection-scoped notices.
    Notification {
        correlation: Option<CorrelationId>,
        code: i32,
        message: String,
    },
}

/// Transport-level failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("failed to connect to gateway: {detail}")]
    ConnectFailed { detail: String },
    #[error("gateway is not connected")]
    NotConnected,
    #[error("failed to submit request {correlation}: {detail}")]
    SubmitFailed {
        correlation: CorrelationId,
        detail: String,
    },
    #[error("gateway connection lost")]
    ConnectionLost,
}

/// Channel of inbound gateway events. A closed stream means the connection
/// is gone.
pub type EventStream = mpsc::UnboundedReceiver<GatewayEvent>;

/// Driver seam over the market-data gateway transport.
///
/// Implementations own the socket/session; callers submit requests tagged
/// with a [`CorrelationId`] and consume the [`EventStream`] returned by
/// [`connect`](GatewayClient::connect). Methods return boxed futures so the
/// trait stays object-safe.
pub trait GatewayClient: Send {
    /// Open the connection and hand back the inbound event channel.
    fn connect<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, GatewayError>> + Send + 'a>>;

    /// Tear down the connection. Idempotent.
    fn disconnect<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Submit one historical data request for the given series kind.
    fn submit_request<'a>(
        &'a mut self,
        correlation: CorrelationId,
        kind: SeriesKind,
        instrument: &'a InstrumentSpec,
        window: &'a RequestWindow,
    ) -> Pin<Box<dyn Future<Output = Result<(), GatewayError>> + Send + 'a>>;

    /// Cancel an in-flight request.
    fn cancel_request<'a>(
        &'a mut self,
        correlation: CorrelationId,
    ) -> Pin<Box<dyn Future<Output = Result<(), GatewayError>> + Send + 'a>>;
}

/// Explicit correlation-id-to-series-kind mapping for one cycle.
///
/// Event routing goes through this map rather than a numeric id
/// convention, so a change in request count cannot silently misroute a
/// series.
#[derive(Debug, Clone, Default)]
pub struct CorrelationMap {
    entries: Vec<(CorrelationId, SeriesKind)>,
}

impl CorrelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, correlation: CorrelationId, kind: SeriesKind) {
        self.entries.push((correlation, kind));
    }

    pub fn kind_of(&self, correlation: CorrelationId) -> Option<SeriesKind> {
        self.entries
            .iter()
            .find(|(id, _)| *id == correlation)
            .map(|(_, kind)| *kind)
    }

    pub fn ids(&self) -> impl Iterator<Item = CorrelationId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn entries(&self) -> impl Iterator<Item = (CorrelationId, SeriesKind)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
