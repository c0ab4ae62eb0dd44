//! CLI argument definitions for Barvault.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `download` | Download historical bars for a batch of tickers |
//! | `append` | Merge freshly downloaded files into an existing store |
//!
//! # Examples
//!
//! ```bash
//! # Daily bars for two tickers over a replayed gateway session
//! barvault download AAPL MSFT --lookback "5 D" --bar-size "1 day" \
//!     --out ./data --replay session.json
//!
//! # Intraday bars for a ticker list, ending at a fixed date
//! barvault download --tickers watchlist.txt --end-date 2024-01-31 \
//!     --lookback "1 W" --bar-size "5 mins" --out ./data --replay session.json
//!
//! # Fold a fresh download into the long-running store
//! barvault append --from ./data --to ./store
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Historical market bar downloader.
///
/// Fetches bid/ask/trade bar series per ticker from a market-data
/// gateway, reconciles them into one row per timestamp, and writes a
/// delimited text file per ticker.
#[derive(Debug, Parser)]
#[command(
    name = "barvault",
    author,
    version,
    about = "Historical market bar downloader"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download historical bars for a batch of tickers.
    Download(DownloadArgs),
    /// Merge freshly downloaded files into an existing data store.
    Append(AppendArgs),
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Ticker symbols, in addition to any --tickers file entries.
    pub symbols: Vec<String>,

    /// File with one ticker per line; blank lines are skipped.
    #[arg(long)]
    pub tickers: Option<PathBuf>,

    /// Directory output files are written into.
    #[arg(long)]
    pub out: PathBuf,

    /// Request end date (YYYY-MM-DD), taken at 16:00 New York; omitted
    /// means "now".
    #[arg(long)]
    pub end_date: Option<String>,

    /// Lookback window, e.g. "5 D" or "5 days".
    #[arg(long)]
    pub lookback: String,

    /// Bar size, e.g. "5 mins" or "1 day".
    #[arg(long)]
    pub bar_size: String,

    /// Replay scenario file served as the gateway session. Live
    /// transports plug in through the same gateway-client seam.
    #[arg(long)]
    pub replay: PathBuf,

    /// Notification policy overrides (JSON).
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Pause between consecutive ticker cycles, in seconds.
    #[arg(long, default_value_t = 10)]
    pub delay_secs: u64,

    /// Omit the header row from output files.
    #[arg(long, default_value_t = false)]
    pub no_header: bool,

    /// Instrument security type.
    #[arg(long, default_value = "STK")]
    pub sec_type: String,

    /// Instrument currency.
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Instrument routing venue.
    #[arg(long, default_value = "SMART")]
    pub venue: String,
}

#[derive(Debug, Args)]
pub struct AppendArgs {
    /// Folder holding the freshly downloaded files.
    #[arg(long)]
    pub from: PathBuf,

    /// Store folder whose files are appended to and renamed.
    #[arg(long)]
    pub to: PathBuf,
}
