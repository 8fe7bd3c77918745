// src/roster.rs

use std::path::Path;
use std::thread;
use std::time::Duration;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use tracing::{error, info, warn};

use crate::error::{NotifierError, Result};

// Fixed availability policy: poll every 5s, give up after 10s total.
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const WAIT_CEILING: Duration = Duration::from_secs(10);

/// Roster data for the current run: named columns, one row per soldier.
/// Rebuilt from the spreadsheet on every run, never persisted.
#[derive(Clone, Debug, Default)]
pub struct RosterTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RosterTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

/// Wait for the roster file to appear, then load the requested sheet and
/// validate its headers.
pub fn load_roster(path: &Path, sheet: &str) -> Result<RosterTable> {
    wait_for_file(path)?;

    let mut workbook: Xlsx<_> = match open_workbook(path) {
        Ok(workbook) => workbook,
        Err(e) => {
            error!("unable to read roster workbook at {}: {e}", path.display());
            return Err(e.into());
        }
    };

    let sheet_names = workbook.sheet_names();
    info!("available sheets in {}: {:?}", path.display(), sheet_names);

    let selected = select_sheet(sheet, &sheet_names)?;
    let range = match workbook.worksheet_range(&selected) {
        Ok(range) => range,
        Err(e) => {
            error!(
                "unable to read sheet '{selected}' from {}: {e}",
                path.display()
            );
            return Err(e.into());
        }
    };

    let table = table_from_range(&range)?;
    info!("loaded roster from {} (sheet: {selected})", path.display());
    Ok(table)
}

/// Bounded wait for slow external file sync. The loader owns this policy;
/// callers hand over the path without checking existence themselves.
pub fn wait_for_file(path: &Path) -> Result<()> {
    wait_with_policy(path, POLL_INTERVAL, WAIT_CEILING)
}

fn wait_with_policy(path: &Path, interval: Duration, ceiling: Duration) -> Result<()> {
    let mut waited = Duration::ZERO;
    let mut attempts = 0u32;

    while !path.exists() {
        if waited >= ceiling {
            error!(
                "roster file could not be found at {} after waiting",
                path.display()
            );
            return Err(NotifierError::FileUnavailable(path.to_path_buf()));
        }
        attempts += 1;
        warn!("roster file not found yet, waiting for sync (attempt {attempts})");
        thread::sleep(interval);
        waited += interval;
    }
    Ok(())
}

/// Pick the requested sheet, or fall back to the first one with a warning.
fn select_sheet(requested: &str, available: &[String]) -> Result<String> {
    if available.iter().any(|name| name == requested) {
        return Ok(requested.to_string());
    }
    let first = available
        .first()
        .ok_or_else(|| NotifierError::SheetFormat("workbook contains no worksheets".to_string()))?;
    warn!("requested sheet '{requested}' not found, defaulting to first sheet '{first}'");
    Ok(first.clone())
}

/// Build a `RosterTable` from a sheet range, rejecting sheets whose header
/// row is mostly unnamed (broken headers surface as anonymous columns).
fn table_from_range(range: &Range<Data>) -> Result<RosterTable> {
    let mut row_iter = range.rows();

    let header_cells = match row_iter.next() {
        Some(cells) => cells,
        None => {
            error!("roster sheet is empty, no header row to read");
            return Err(NotifierError::SheetFormat(
                "roster sheet is empty".to_string(),
            ));
        }
    };

    let unnamed = header_cells
        .iter()
        .filter(|cell| header_name(cell).is_none())
        .count();
    if unnamed * 2 >= header_cells.len() {
        error!(
            "bad roster format: {unnamed} of {} columns are unnamed",
            header_cells.len()
        );
        return Err(NotifierError::SheetFormat(
            "headers missing or wrong, please fix the roster file".to_string(),
        ));
    }

    let headers = header_cells
        .iter()
        .enumerate()
        .map(|(i, cell)| header_name(cell).unwrap_or_else(|| format!("Unnamed: {i}")))
        .collect();
    let rows = row_iter
        .map(|cells| cells.iter().map(cell_text).collect())
        .collect();

    Ok(RosterTable { headers, rows })
}

fn header_name(cell: &Data) -> Option<String> {
    let text = cell.to_string();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join(name)
    }

    fn range_from(rows: &[&[&str]]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    range.set_value((r as u32, c as u32), Data::String(value.to_string()));
                }
            }
        }
        range
    }

    #[test]
    fn wait_returns_immediately_for_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.xlsx");
        std::fs::write(&path, b"stub").unwrap();

        wait_with_policy(&path, Duration::from_millis(1), Duration::from_millis(2)).unwrap();
    }

    #[test]
    fn wait_gives_up_after_the_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.xlsx");

        let err = wait_with_policy(&path, Duration::from_millis(1), Duration::from_millis(2))
            .unwrap_err();
        assert!(matches!(err, NotifierError::FileUnavailable(_)));
    }

    #[test]
    fn requested_sheet_wins_when_present() {
        let names = vec!["Roster".to_string(), "MRC4".to_string()];
        assert_eq!(select_sheet("MRC4", &names).unwrap(), "MRC4");
    }

    #[test]
    fn missing_sheet_falls_back_to_first() {
        let names = vec!["Roster".to_string(), "Archive".to_string()];
        assert_eq!(select_sheet("MRC4", &names).unwrap(), "Roster");
    }

    #[test]
    fn sheetless_workbook_is_a_format_error() {
        assert!(matches!(
            select_sheet("MRC4", &[]).unwrap_err(),
            NotifierError::SheetFormat(_)
        ));
    }

    #[test]
    fn intact_headers_produce_a_table() {
        let range = range_from(&[
            &["Status", "Soldier Name", "Unit"],
            &["MRC4", "Alice", "HHC"],
            &["READY", "Bob", "HHC"],
        ]);
        let table = table_from_range(&range).unwrap();

        assert_eq!(table.headers, vec!["Status", "Soldier Name", "Unit"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column("Soldier Name"), Some(1));
        assert_eq!(table.column("Nope"), None);
    }

    #[test]
    fn mostly_unnamed_headers_are_rejected() {
        // 6 of 8 columns unnamed.
        let range = range_from(&[
            &["Status", "Soldier Name", "", "", "", "", "", ""],
            &["MRC4", "Alice", "x", "x", "x", "x", "x", "x"],
        ]);
        assert!(matches!(
            table_from_range(&range).unwrap_err(),
            NotifierError::SheetFormat(_)
        ));
    }

    #[test]
    fn exactly_half_unnamed_is_still_rejected() {
        let range = range_from(&[
            &["Status", "Soldier Name", "", ""],
            &["MRC4", "Alice", "x", "x"],
        ]);
        assert!(matches!(
            table_from_range(&range).unwrap_err(),
            NotifierError::SheetFormat(_)
        ));
    }

    #[test]
    fn just_under_half_unnamed_is_accepted() {
        let range = range_from(&[
            &["Status", "Soldier Name", "Unit", "Flu Shot", ""],
            &["MRC4", "Alice", "HHC", "yes", "x"],
        ]);
        let table = table_from_range(&range).unwrap();
        assert_eq!(table.headers[4], "Unnamed: 4");
    }

    #[test]
    fn numeric_headers_count_as_named() {
        let mut range = Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("Status".to_string()));
        range.set_value((0, 1), Data::Float(2026.0));
        range.set_value((1, 0), Data::String("MRC4".to_string()));
        range.set_value((1, 1), Data::String("x".to_string()));

        let table = table_from_range(&range).unwrap();
        assert_eq!(table.headers, vec!["Status", "2026"]);
    }

    #[test]
    fn empty_sheet_is_a_format_error() {
        let range: Range<Data> = Range::empty();
        assert!(matches!(
            table_from_range(&range).unwrap_err(),
            NotifierError::SheetFormat(_)
        ));
    }

    #[test]
    fn fixture_roster_loads_with_requested_sheet() {
        let table = load_roster(&fixture("roster.xlsx"), "MRC4").unwrap();

        assert_eq!(table.headers, vec!["Status", "Soldier Name", "Unit"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][1], "Alice");
    }

    #[test]
    fn fixture_roster_falls_back_when_sheet_is_missing() {
        let table = load_roster(&fixture("roster.xlsx"), "No Such Sheet").unwrap();
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn fixture_with_broken_headers_raises_format_error() {
        let err = load_roster(&fixture("bad_roster.xlsx"), "Sheet1").unwrap_err();
        assert!(matches!(err, NotifierError::SheetFormat(_)));
    }
}
