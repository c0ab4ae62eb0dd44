//! Deterministic in-process gateway.
//!
//! Serves scripted bid/ask/trade series and notifications for a fixed set
//! of symbols, in the delivery order the live gateway uses: notices first,
//! then bars in chronological order, then the request completion. Symbols
//! absent from the scenario raise the vendor's no-data notification.
//!
//! Scenarios are authored as JSON:
//!
//! ```json
//! {
//!   "instruments": {
//!     "AAPL": {
//!       "trades": [
//!         { "timestamp": "20240105", "open": 181.5, "high": 182.3,
//!           "low": 180.2, "close": 181.9, "volume": 58220000 }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::gateway::{CorrelationId, EventStream, GatewayClient, GatewayError, GatewayEvent};
use crate::{InstrumentSpec, RequestWindow, SeriesKind};

/// Vendor code raised for symbols the scenario does not know.
const NO_DATA_CODE: i32 = 162;

/// Scripted universe served by a [`ReplayGateway`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub instruments: BTreeMap<String, InstrumentScript>,
}

impl Scenario {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn with_instrument(mut self, symbol: impl Into<String>, script: InstrumentScript) -> Self {
        self.instruments.insert(symbol.into(), script);
        self
    }
}

/// Scripted deliveries for one symbol.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct InstrumentScript {
    /// Notifications emitted once per cycle, before any bars.
    #[serde(default)]
    pub notices: Vec<ScriptedNotice>,
    #[serde(default)]
    pub bids: Vec<ScriptedBar>,
    #[serde(default)]
    pub asks: Vec<ScriptedBar>,
    #[serde(default)]
    pub trades: Vec<ScriptedBar>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptedNotice {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl ScriptedNotice {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// One scripted bar. Quote series only need `timestamp` and `open`; the
/// remaining fields default to the open so a script stays terse.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptedBar {
    pub timestamp: String,
    pub open: f64,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: i64,
}

impl ScriptedBar {
    pub fn quote(timestamp: impl Into<String>, price: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            open: price,
            high: None,
            low: None,
            close: None,
            volume: 0,
        }
    }

    pub fn trade(
        timestamp: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            open,
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume,
        }
    }

    fn to_event(&self, correlation: CorrelationId) -> GatewayEvent {
        GatewayEvent::Bar {
            correlation,
            timestamp: self.timestamp.clone(),
            open: self.open,
            high: self.high.unwrap_or(self.open),
            low: self.low.unwrap_or(self.open),
            close: self.close.unwrap_or(self.open),
            volume: self.volume,
        }
    }
}

/// Gateway adapter that replays a [`Scenario`] without a transport.
///
/// Used by the CLI's `--replay` source and by integration tests; a live
/// transport implements [`GatewayClient`] the same way.
#[derive(Debug)]
pub struct ReplayGateway {
    scenario: Scenario,
    sender: Option<mpsc::UnboundedSender<GatewayEvent>>,
}

impl ReplayGateway {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            sender: None,
        }
    }

    fn send(&self, event: GatewayEvent) -> Result<(), GatewayError> {
        let sender = self.sender.as_ref().ok_or(GatewayError::NotConnected)?;
        sender.send(event).map_err(|_| GatewayError::ConnectionLost)
    }
}

impl GatewayClient for ReplayGateway {
    fn connect<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, GatewayError>> + Send + 'a>> {
        Box::pin(async move {
            let (sender, receiver) = mpsc::unbounded_channel();
            self.sender = Some(sender);
            Ok(receiver)
        })
    }

    fn disconnect<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.sender = None;
        })
    }

    fn submit_request<'a>(
        &'a mut self,
        correlation: CorrelationId,
        kind: SeriesKind,
        instrument: &'a InstrumentSpec,
        _window: &'a RequestWindow,
    ) -> Pin<Box<dyn Future<Output = Result<(), GatewayError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(script) = self.scenario.instruments.get(instrument.symbol.as_str()) else {
                return self.send(GatewayEvent::Notification {
                    correlation: Some(correlation),
                    code: NO_DATA_CODE,
                    message: format!("no historical data for {}", instrument.symbol),
                });
            };

            // Scripted notices ride on the trade request so one cycle sees
            // them exactly once.
            if kind == SeriesKind::Trade {
                for notice in &script.notices {
                    self.send(GatewayEvent::Notification {
                        correlation: Some(correlation),
                        code: notice.code,
                        message: notice.message.clone(),
                    })?;
                }
            }

            let bars = match kind {
                SeriesKind::Bid => &script.bids,
                SeriesKind::Ask => &script.asks,
                SeriesKind::Trade => &script.trades,
            };
            for bar in bars {
                self.send(bar.to_event(correlation))?;
            }

            self.send(GatewayEvent::RequestComplete { correlation })
        })
    }

    fn cancel_request<'a>(
        &'a mut self,
        _correlation: CorrelationId,
    ) -> Pin<Box<dyn Future<Output = Result<(), GatewayError>> + Send + 'a>> {
        Box::pin(async move { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BarInterval, Lookback, Symbol};
    use std::str::FromStr;

    fn window() -> RequestWindow {
        RequestWindow::new(
            None,
            Lookback::from_str("5 D").expect("lookback"),
            BarInterval::from_str("1 day").expect("interval"),
        )
    }

    #[tokio::test]
    async fn replays_bars_then_completion() {
        let scenario = Scenario::default().with_instrument(
            "AAPL",
            InstrumentScript {
                trades: vec![ScriptedBar::trade("20240105", 181.5, 182.3, 180.2, 181.9, 100)],
                ..InstrumentScript::default()
            },
        );
        let mut gateway = ReplayGateway::new(scenario);
        let mut events = gateway.connect().await.expect("connect");

        let instrument = InstrumentSpec::equity(Symbol::parse("AAPL").expect("symbol"));
        gateway
            .submit_request(CorrelationId::new(1), SeriesKind::Trade, &instrument, &window())
            .await
            .expect("submit");

        let first = events.recv().await.expect("bar event");
        assert!(matches!(first, GatewayEvent::Bar { .. }));
        let second = events.recv().await.expect("completion event");
        assert_eq!(
            second,
            GatewayEvent::RequestComplete {
                correlation: CorrelationId::new(1)
            }
        );
    }

    #[tokio::test]
    async fn unknown_symbol_raises_no_data_notification() {
        let mut gateway = ReplayGateway::new(Scenario::default());
        let mut events = gateway.connect().await.expect("connect");

        let instrument = InstrumentSpec::equity(Symbol::parse("ZZZZ").expect("symbol"));
        gateway
            .submit_request(CorrelationId::new(1), SeriesKind::Trade, &instrument, &window())
            .await
            .expect("submit");

        let event = events.recv().await.expect("notification event");
        assert!(matches!(
            event,
            GatewayEvent::Notification { code: 162, .. }
        ));
    }

    #[tokio::test]
    async fn scenario_parses_from_json() {
        let raw = r#"{
            "instruments": {
                "AAPL": {
                    "trades": [
                        { "timestamp": "20240105", "open": 181.5, "volume": 100 }
                    ]
                }
            }
        }"#;
        let scenario = Scenario::from_json(raw).expect("scenario json");
        let script = scenario.instruments.get("AAPL").expect("script");
        assert_eq!(script.trades.len(), 1);
        assert_eq!(script.trades[0].timestamp, "20240105");
    }

    #[test]
    fn disconnected_gateway_rejects_submission() {
        let gateway = ReplayGateway::new(Scenario::default());
        let err = gateway
            .send(GatewayEvent::RequestComplete {
                correlation: CorrelationId::new(1),
            })
            .expect_err("must fail");
        assert_eq!(err, GatewayError::NotConnected);
    }
}
