//! Fold freshly downloaded files into a long-running data store.
//!
//! Download output is named `<SYMBOL> <barsize> <first>-<last>.csv`. For
//! each file in the origin folder, the store file sharing the
//! `<SYMBOL> <barsize>` prefix gets the new rows appended and is renamed
//! so its date range extends to the origin file's last date.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::warn;

use crate::cli::AppendArgs;
use crate::error::CliError;

#[derive(Debug, PartialEq, Eq)]
struct StoreFileName {
    /// `<SYMBOL> <barsize>`, the stable identity of a store file.
    prefix: String,
    first_date: String,
    last_date: String,
}

impl StoreFileName {
    fn parse(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".csv")?;
        let (prefix, dates) = stem.rsplit_once(' ')?;
        let (first, last) = dates.split_once('-')?;

        let is_date = |part: &str| part.len() == 8 && part.chars().all(|ch| ch.is_ascii_digit());
        if !is_date(first) || !is_date(last) || !prefix.contains(' ') {
            return None;
        }

        Some(Self {
            prefix: prefix.to_owned(),
            first_date: first.to_owned(),
            last_date: last.to_owned(),
        })
    }

    fn render(&self) -> String {
        format!("{} {}-{}.csv", self.prefix, self.first_date, self.last_date)
    }
}

pub fn run(args: &AppendArgs) -> Result<(), CliError> {
    let mut merged = 0usize;

    for origin_name in list_file_names(&args.from)? {
        let Some(origin) = StoreFileName::parse(&origin_name) else {
            warn!(file = %origin_name, "skipping file without a store name pattern");
            continue;
        };

        // Re-list each round: a merge renames its store file.
        let store_names = list_file_names(&args.to)?;

        let Some((target_name, target)) = store_names.iter().find_map(|candidate| {
            let parsed = StoreFileName::parse(candidate)?;
            (parsed.prefix == origin.prefix).then_some((candidate, parsed))
        }) else {
            warn!(file = %origin_name, prefix = %origin.prefix, "no store file matches, skipping");
            continue;
        };

        let rows = fs::read(args.from.join(&origin_name))?;
        let target_path = args.to.join(target_name);
        let mut store_file = OpenOptions::new().append(true).open(&target_path)?;
        store_file.write_all(&rows)?;
        store_file.flush()?;

        let extended = StoreFileName {
            prefix: target.prefix,
            first_date: target.first_date,
            last_date: origin.last_date,
        };
        fs::rename(&target_path, args.to.join(extended.render()))?;
        merged += 1;
    }

    println!("{merged} file(s) appended into {}", args.to.display());
    Ok(())
}

fn list_file_names(dir: &Path) -> Result<Vec<String>, CliError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_file_name() {
        let parsed = StoreFileName::parse("AAPL 5mins 20240102-20240131.csv").expect("must parse");
        assert_eq!(parsed.prefix, "AAPL 5mins");
        assert_eq!(parsed.first_date, "20240102");
        assert_eq!(parsed.last_date, "20240131");
    }

    #[test]
    fn rejects_foreign_file_names() {
        assert_eq!(StoreFileName::parse(".DS_Store"), None);
        assert_eq!(StoreFileName::parse("notes.csv"), None);
        assert_eq!(StoreFileName::parse("AAPL 5mins 2024-01.csv"), None);
    }

    #[test]
    fn appends_rows_and_extends_date_range() {
        let from = tempfile::tempdir().expect("from dir");
        let to = tempfile::tempdir().expect("to dir");

        fs::write(
            to.path().join("AAPL 1day 20240102-20240131.csv"),
            "20240102, 10, 11, 9, 10.5, 100\n",
        )
        .expect("seed store");
        fs::write(
            from.path().join("AAPL 1day 20240201-20240229.csv"),
            "20240201, 11, 12, 10, 11.5, 200\n",
        )
        .expect("seed origin");

        let args = AppendArgs {
            from: from.path().to_path_buf(),
            to: to.path().to_path_buf(),
        };
        run(&args).expect("append");

        let renamed = to.path().join("AAPL 1day 20240102-20240229.csv");
        let contents = fs::read_to_string(&renamed).expect("renamed store file");
        assert_eq!(contents.lines().count(), 2);
        assert!(!to.path().join("AAPL 1day 20240102-20240131.csv").exists());
    }

    #[test]
    fn leaves_unmatched_origin_files_alone() {
        let from = tempfile::tempdir().expect("from dir");
        let to = tempfile::tempdir().expect("to dir");

        fs::write(
            from.path().join("MSFT 1day 20240201-20240229.csv"),
            "20240201, 11, 12, 10, 11.5, 200\n",
        )
        .expect("seed origin");

        let args = AppendArgs {
            from: from.path().to_path_buf(),
            to: to.path().to_path_buf(),
        };
        run(&args).expect("append");

        assert!(list_file_names(to.path()).expect("store listing").is_empty());
    }
}
