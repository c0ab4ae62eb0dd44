use std::fs;
use std::str::FromStr;
use std::time::Duration;

use barvault_core::gateway::replay::{ReplayGateway, Scenario};
use barvault_core::{
    BarInterval, BatchConfig, BatchSummary, Downloader, EndTime, Lookback, NotificationPolicy,
    RequestWindow, Symbol, TickerOutcome,
};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use crate::cli::DownloadArgs;
use crate::error::CliError;

const END_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub async fn run(args: &DownloadArgs) -> Result<(), CliError> {
    let symbols = collect_symbols(args)?;
    if symbols.is_empty() {
        return Err(CliError::Command(String::from(
            "no tickers given; pass symbols or --tickers <file>",
        )));
    }

    let end = args.end_date.as_deref().map(parse_end_date).transpose()?;
    let window = RequestWindow::new(
        end,
        Lookback::from_str(&args.lookback)?,
        BarInterval::from_str(&args.bar_size)?,
    );

    let policy = match &args.policy {
        Some(path) => NotificationPolicy::from_json(&fs::read_to_string(path)?)?,
        None => NotificationPolicy::default(),
    };
    let scenario = Scenario::from_json(&fs::read_to_string(&args.replay)?)?;

    let config = BatchConfig::new(window, &args.out)
        .with_header(!args.no_header)
        .with_inter_ticker_delay(Duration::from_secs(args.delay_secs))
        .with_instrument_route(&args.sec_type, &args.currency, &args.venue);

    let mut downloader = Downloader::new(ReplayGateway::new(scenario), config).with_policy(policy);
    let summary = downloader.run_batch(&symbols).await?;
    render_summary(&summary);
    Ok(())
}

fn parse_end_date(raw: &str) -> Result<EndTime, CliError> {
    let date = Date::parse(raw.trim(), END_DATE_FORMAT).map_err(|_| {
        CliError::Command(format!("invalid --end-date '{raw}', expected YYYY-MM-DD"))
    })?;
    Ok(EndTime::close_of_day(date))
}

/// Tickers from the list file first, then positional symbols, preserving
/// the order requests will be issued in.
fn collect_symbols(args: &DownloadArgs) -> Result<Vec<Symbol>, CliError> {
    let mut symbols = Vec::new();

    if let Some(path) = &args.tickers {
        for line in fs::read_to_string(path)?.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            symbols.push(Symbol::parse(trimmed)?);
        }
    }
    for raw in &args.symbols {
        symbols.push(Symbol::parse(raw)?);
    }

    Ok(symbols)
}

fn render_summary(summary: &BatchSummary) {
    for report in &summary.reports {
        match &report.outcome {
            TickerOutcome::Written { path, rows } => {
                println!("{}: {} row(s) -> {}", report.symbol, rows, path.display());
            }
            TickerOutcome::Skipped { reason } => {
                println!("{}: skipped ({reason})", report.symbol);
            }
            TickerOutcome::Failed { phase, error } => {
                println!("{}: failed while {phase}: {error}", report.symbol);
            }
        }
    }
    println!(
        "{} written, {} skipped, {} failed",
        summary.written_count(),
        summary.skipped_count(),
        summary.failed_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn args_with(tickers: Option<PathBuf>, symbols: Vec<String>) -> DownloadArgs {
        DownloadArgs {
            symbols,
            tickers,
            out: PathBuf::from("."),
            end_date: None,
            lookback: String::from("5 D"),
            bar_size: String::from("1 day"),
            replay: PathBuf::from("session.json"),
            policy: None,
            delay_secs: 0,
            no_header: false,
            sec_type: String::from("STK"),
            currency: String::from("USD"),
            venue: String::from("SMART"),
        }
    }

    #[test]
    fn collects_file_tickers_before_positional_symbols() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "aapl\n\n  msft  ").expect("write tickers");

        let args = args_with(
            Some(file.path().to_path_buf()),
            vec![String::from("ibm")],
        );
        let symbols = collect_symbols(&args).expect("symbols");

        let rendered = symbols.iter().map(Symbol::as_str).collect::<Vec<_>>();
        assert_eq!(rendered, ["AAPL", "MSFT", "IBM"]);
    }

    #[test]
    fn rejects_malformed_ticker_line() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "TOOLONGSYM").expect("write tickers");

        let args = args_with(Some(file.path().to_path_buf()), Vec::new());
        assert!(matches!(
            collect_symbols(&args),
            Err(CliError::Validation(_))
        ));
    }

    #[test]
    fn parses_end_date_to_session_close() {
        let end = parse_end_date("2024-01-31").expect("end date");
        assert_eq!(end.encode(), "20240131 16:00:00 America/New_York");
    }

    #[test]
    fn rejects_malformed_end_date() {
        assert!(matches!(
            parse_end_date("31/01/2024"),
            Err(CliError::Command(_))
        ));
    }
}
