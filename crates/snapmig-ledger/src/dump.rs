//! Flat text dump of a ledger state: one `address;balance` line per entry,
//! in ascending address order.

use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::entry::{Ledger, LedgerEntry};
use crate::error::{LedgerError, LedgerResult};

/// Write `entries` as a global dump. Returns the number of lines written.
pub fn write_global_dump<W: Write>(mut sink: W, entries: &[LedgerEntry]) -> LedgerResult<u64> {
    let mut sorted: Vec<&LedgerEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.address.cmp(&b.address));
    for entry in &sorted {
        writeln!(sink, "{};{}", entry.address, entry.balance)?;
    }
    sink.flush()?;
    Ok(sorted.len() as u64)
}

/// Write the dump to `path` through a sibling `.partial` file that is
/// renamed into place once synced. On error no file is left at `path`.
pub fn write_global_dump_file(path: &Path, entries: &[LedgerEntry]) -> LedgerResult<u64> {
    let partial = partial_path(path);
    let result = File::create(&partial).map_err(LedgerError::from).and_then(|file| {
        let mut sink = BufWriter::new(file);
        let lines = write_global_dump(&mut sink, entries)?;
        let file = sink.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(lines)
    });

    match result {
        Ok(lines) => {
            fs::rename(&partial, path)?;
            Ok(lines)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&partial) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %cleanup, "failed to remove partial dump");
                }
            }
            Err(e)
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Parse a global dump back into a ledger at `index`.
pub fn read_global_dump<R: BufRead>(source: R, index: u32) -> LedgerResult<Ledger> {
    let mut balances = Vec::new();
    for (number, line) in source.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (address, balance) = line.split_once(';').ok_or_else(|| LedgerError::LedgerCorrupt {
            address: line.clone(),
            reason: format!("line {} is not of the form address;balance", number + 1),
        })?;
        let balance = balance.trim().parse::<u64>().map_err(|e| LedgerError::LedgerCorrupt {
            address: address.to_string(),
            reason: format!("line {}: invalid balance: {e}", number + 1),
        })?;
        balances.push((address.to_string(), balance));
    }
    Ledger::from_balances(index, balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapmig_types::LegacyAddress;

    fn entry(c: char, balance: u64) -> LedgerEntry {
        LedgerEntry {
            address: LegacyAddress::parse(&c.to_string().repeat(81)).unwrap(),
            balance,
        }
    }

    #[test]
    fn dump_is_sorted_lines() {
        let mut out = Vec::new();
        let lines = write_global_dump(&mut out, &[entry('B', 2), entry('A', 1)]).unwrap();
        assert_eq!(lines, 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("{};1\n{};2\n", "A".repeat(81), "B".repeat(81)));
    }

    #[test]
    fn dump_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global_snapshot.csv");
        let entries = vec![entry('C', 30), entry('A', 10)];
        write_global_dump_file(&path, &entries).unwrap();

        let file = std::io::BufReader::new(File::open(&path).unwrap());
        let ledger = read_global_dump(file, 5).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.entries()[0], entry('A', 10));
        assert!(!dir.path().join("global_snapshot.csv.partial").exists());
    }

    #[test]
    fn dump_file_replaces_previous_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global_snapshot.csv");
        std::fs::write(&path, "stale\n").unwrap();
        assert_eq!(write_global_dump_file(&path, &[entry('D', 4)]).unwrap(), 1);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{};4\n", "D".repeat(81)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn dump_into_missing_directory_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("global_snapshot.csv");
        assert!(matches!(write_global_dump_file(&path, &[entry('A', 1)]), Err(LedgerError::Io(_))));
        assert!(!path.exists());
    }

    #[test]
    fn malformed_line_is_corrupt() {
        let err = read_global_dump("no-separator\n".as_bytes(), 0).unwrap_err();
        assert!(matches!(err, LedgerError::LedgerCorrupt { .. }));
        let err = read_global_dump(format!("{};x\n", "A".repeat(81)).as_bytes(), 0).unwrap_err();
        assert!(matches!(err, LedgerError::LedgerCorrupt { .. }));
    }
}
