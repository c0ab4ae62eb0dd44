//! Delimited-text output for reconciled records.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::{BarInterval, CycleScope, JoinedRecord, Symbol};

/// Field delimiter used in output rows and headers.
pub const FIELD_DELIMITER: &str = ", ";

const INTRADAY_HEADER: &str = "datetime, bid, ask, open, high, low, close, volume";
const INTERDAY_HEADER: &str = "datetime, open, high, low, close, volume";

const FILE_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year][month][day]");

/// Output file name for one completed ticker:
/// `<SYMBOL> <barSizeNoWhitespace> <firstDate>-<lastDate>.csv`.
pub fn output_filename(
    symbol: &Symbol,
    interval: BarInterval,
    first: &JoinedRecord,
    last: &JoinedRecord,
) -> String {
    let first_date = first
        .ts
        .date()
        .format(FILE_DATE_FORMAT)
        .expect("record date must be formattable");
    let last_date = last
        .ts
        .date()
        .format(FILE_DATE_FORMAT)
        .expect("record date must be formattable");
    format!(
        "{} {} {}-{}.csv",
        symbol,
        interval.compact_token(),
        first_date,
        last_date
    )
}

/// Serialize records as `", "`-delimited rows.
///
/// Absent trade fields render as empty cells so downstream numeric
/// ingestion reads them as missing values.
pub fn write_records<W: Write>(
    mut writer: W,
    scope: CycleScope,
    records: &[JoinedRecord],
    header: bool,
) -> io::Result<()> {
    if header {
        let line = match scope {
            CycleScope::Intraday => INTRADAY_HEADER,
            CycleScope::Interday => INTERDAY_HEADER,
        };
        writeln!(writer, "{line}")?;
    }

    for record in records {
        writeln!(writer, "{}", format_row(scope, record))?;
    }

    writer.flush()
}

/// Write one ticker's records to `<dir>/<filename>`, returning the path
/// and row count.
pub fn export_to_file(
    dir: &Path,
    symbol: &Symbol,
    interval: BarInterval,
    scope: CycleScope,
    records: &[JoinedRecord],
    header: bool,
) -> io::Result<(PathBuf, usize)> {
    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot export an empty record set",
            ))
        }
    };

    let path = dir.join(output_filename(symbol, interval, first, last));
    let file = File::create(&path)?;
    write_records(BufWriter::new(file), scope, records, header)?;
    Ok((path, records.len()))
}

fn format_row(scope: CycleScope, record: &JoinedRecord) -> String {
    let mut fields = vec![record.ts.to_string()];

    if scope == CycleScope::Intraday {
        match &record.quote {
            Some(quote) => {
                fields.push(quote.bid.to_string());
                fields.push(quote.ask.to_string());
            }
            None => {
                fields.push(String::new());
                fields.push(String::new());
            }
        }
    }

    match &record.trade {
        Some(trade) => {
            fields.push(trade.open.to_string());
            fields.push(trade.high.to_string());
            fields.push(trade.low.to_string());
            fields.push(trade.close.to_string());
            fields.push(trade.volume.to_string());
        }
        None => fields.extend(std::iter::repeat_n(String::new(), 5)),
    }

    fields.join(FIELD_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BarTimestamp, TradeValues};
    use std::str::FromStr;

    fn interday_record(raw: &str, close: f64) -> JoinedRecord {
        JoinedRecord::interday(
            BarTimestamp::parse_gateway(raw, CycleScope::Interday).expect("ts"),
            TradeValues {
                open: 10.0,
                high: 11.0,
                low: 9.5,
                close,
                volume: 1000,
            },
        )
    }

    fn intraday_record(raw: &str, trade: Option<TradeValues>) -> JoinedRecord {
        JoinedRecord::intraday(
            BarTimestamp::parse_gateway(raw, CycleScope::Intraday).expect("ts"),
            10.0,
            10.1,
            trade,
        )
    }

    #[test]
    fn filename_matches_vendor_pattern() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let interval = BarInterval::from_str("5 mins").expect("interval");
        let first = intraday_record("20240102 09:30:00", None);
        let last = intraday_record("20240131 15:55:00", None);

        assert_eq!(
            output_filename(&symbol, interval, &first, &last),
            "AAPL 5mins 20240102-20240131.csv"
        );
    }

    #[test]
    fn interday_rows_have_six_fields_and_header() {
        let records = vec![interday_record("20240105", 10.5)];
        let mut sink = Vec::<u8>::new();

        write_records(&mut sink, CycleScope::Interday, &records, true).expect("write");

        let rendered = String::from_utf8(sink).expect("utf8");
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some("datetime, open, high, low, close, volume")
        );
        assert_eq!(lines.next(), Some("20240105, 10, 11, 9.5, 10.5, 1000"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn absent_trade_renders_empty_cells() {
        let records = vec![intraday_record("20240105 09:30:00", None)];
        let mut sink = Vec::<u8>::new();

        write_records(&mut sink, CycleScope::Intraday, &records, false).expect("write");

        let rendered = String::from_utf8(sink).expect("utf8");
        assert_eq!(rendered, "20240105 09:30:00, 10, 10.1, , , , , \n");
    }

    #[test]
    fn export_to_file_writes_named_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let interval = BarInterval::from_str("1 day").expect("interval");
        let records = vec![interday_record("20240102", 10.5), interday_record("20240103", 10.7)];

        let (path, rows) = export_to_file(
            dir.path(),
            &symbol,
            interval,
            CycleScope::Interday,
            &records,
            true,
        )
        .expect("export");

        assert_eq!(rows, 2);
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("AAPL 1day 20240102-20240103.csv")
        );
        let contents = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn empty_record_set_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let interval = BarInterval::from_str("1 day").expect("interval");

        let err = export_to_file(
            dir.path(),
            &symbol,
            interval,
            CycleScope::Interday,
            &[],
            true,
        )
        .expect_err("must fail");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
