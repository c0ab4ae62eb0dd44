//! Behavior-driven tests for anomaly handling and batch abort semantics.

use barvault_tests::{
    batch_config, interday_window, intraday_window, symbol, BatchError, Downloader,
    InstrumentScript, ReplayGateway, Scenario, ScriptedBar, ScriptedNotice, TickerOutcome,
};
use barvault_core::{CycleError, CyclePhase, ReconcilePolicy};

fn trades() -> Vec<ScriptedBar> {
    vec![
        ScriptedBar::trade("20240102", 185.0, 186.5, 183.8, 185.6, 52000000),
        ScriptedBar::trade("20240103", 185.6, 187.0, 185.0, 186.2, 48100000),
    ]
}

#[tokio::test]
async fn when_an_unknown_code_arrives_the_batch_aborts_naming_the_ticker() {
    // Given: a two-ticker batch whose first session raises a code outside
    // every configured partition
    let scenario = Scenario::default()
        .with_instrument(
            "AAPL",
            InstrumentScript {
                notices: vec![ScriptedNotice::new(507, "Bad message length")],
                trades: trades(),
                ..InstrumentScript::default()
            },
        )
        .with_instrument(
            "MSFT",
            InstrumentScript {
                trades: trades(),
                ..InstrumentScript::default()
            },
        );
    let dir = tempfile::tempdir().expect("output dir");

    // When: the batch runs
    let mut downloader = Downloader::new(
        ReplayGateway::new(scenario),
        batch_config(interday_window(), dir.path()),
    );
    let error = downloader
        .run_batch(&[symbol("AAPL"), symbol("MSFT")])
        .await
        .expect_err("batch must abort");

    // Then: the error names the in-progress ticker and phase, and the
    // second ticker never ran
    let BatchError::Ticker {
        symbol: failed,
        failure,
    } = error
    else {
        panic!("expected a ticker-level batch error");
    };
    assert_eq!(failed.as_str(), "AAPL");
    assert_eq!(failure.phase, CyclePhase::AwaitingCompletion);
    assert!(matches!(
        failure.error,
        CycleError::RequestFailed { code: 507, .. }
    ));
    assert_eq!(dir.path().read_dir().expect("dir listing").count(), 0);
}

#[tokio::test]
async fn when_no_data_arrives_on_the_intraday_path_the_batch_aborts() {
    // Given: an intraday batch for a symbol the gateway has no data for;
    // sibling requests are in flight, so the no-data code must escalate
    let dir = tempfile::tempdir().expect("output dir");

    // When: the batch runs
    let mut downloader = Downloader::new(
        ReplayGateway::new(Scenario::default()),
        batch_config(intraday_window(), dir.path()),
    );
    let error = downloader
        .run_batch(&[symbol("ZZZZ")])
        .await
        .expect_err("batch must abort");

    // Then: the identical code that skips interday tickers is fatal here
    assert!(matches!(
        error,
        BatchError::Ticker {
            failure, ..
        } if matches!(failure.error, CycleError::RequestFailed { code: 162, .. })
    ));
}

#[tokio::test]
async fn when_quote_series_disagree_the_ticker_fails_and_the_batch_continues() {
    // Given: an intraday session delivering two bids but only one ask,
    // followed by a healthy second ticker
    let scenario = Scenario::default()
        .with_instrument(
            "AAPL",
            InstrumentScript {
                bids: vec![
                    ScriptedBar::quote("20240105 09:30:00", 16.20),
                    ScriptedBar::quote("20240105 09:35:00", 16.22),
                ],
                asks: vec![ScriptedBar::quote("20240105 09:30:00", 16.21)],
                trades: vec![],
                ..InstrumentScript::default()
            },
        )
        .with_instrument(
            "MSFT",
            InstrumentScript {
                bids: vec![ScriptedBar::quote("20240105 09:30:00", 410.0)],
                asks: vec![ScriptedBar::quote("20240105 09:30:00", 410.1)],
                trades: vec![ScriptedBar::trade(
                    "20240105 09:30:00",
                    410.05,
                    410.10,
                    410.00,
                    410.08,
                    1200,
                )],
                ..InstrumentScript::default()
            },
        );
    let dir = tempfile::tempdir().expect("output dir");

    // When: the batch runs under the default reconcile policy
    let mut downloader = Downloader::new(
        ReplayGateway::new(scenario),
        batch_config(intraday_window(), dir.path()),
    );
    let summary = downloader
        .run_batch(&[symbol("AAPL"), symbol("MSFT")])
        .await
        .expect("batch must complete");

    // Then: the mismatch is reported for the first ticker, never silently
    // truncated, and the second ticker still writes its file
    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.written_count(), 1);
    assert!(matches!(
        &summary.reports[0].outcome,
        TickerOutcome::Failed {
            phase: CyclePhase::Reconciling,
            error: CycleError::Reconcile(_),
        }
    ));
    assert!(dir.path().join("MSFT 5mins 20240105-20240105.csv").exists());
}

#[tokio::test]
async fn when_the_policy_is_strict_a_reconcile_failure_aborts_the_batch() {
    // Given: the same quote mismatch under an abort-batch reconcile policy
    let scenario = Scenario::default().with_instrument(
        "AAPL",
        InstrumentScript {
            bids: vec![
                ScriptedBar::quote("20240105 09:30:00", 16.20),
                ScriptedBar::quote("20240105 09:35:00", 16.22),
            ],
            asks: vec![ScriptedBar::quote("20240105 09:30:00", 16.21)],
            ..InstrumentScript::default()
        },
    );
    let dir = tempfile::tempdir().expect("output dir");

    // When: the batch runs
    let mut downloader = Downloader::new(
        ReplayGateway::new(scenario),
        batch_config(intraday_window(), dir.path())
            .with_reconcile_policy(ReconcilePolicy::AbortBatch),
    );
    let error = downloader
        .run_batch(&[symbol("AAPL")])
        .await
        .expect_err("batch must abort");

    // Then: the abort carries the reconciling phase
    assert!(matches!(
        error,
        BatchError::Ticker { failure, .. } if failure.phase == CyclePhase::Reconciling
    ));
}
