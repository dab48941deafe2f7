//! Extraction of the peak table from an instrument result file.
//!
//! A result file is mostly free text. The peak table sits between a start marker line
//! (`>==CT==`) and an end marker line (`Totals`); the first non-blank line inside is a
//! tab-delimited header and every following non-blank line is a tab-delimited peak row.
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::cell::CellValue;
use super::diagnostic::{Condition, Diagnostics};
use super::error::TableError;

const MISSING: &CellValue = &CellValue::Missing;

/// Names of the columns the engine reads. Everything else in the table is carried along
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub component: String,
    pub channel: String,
    pub retention: String,
    pub quantity: String,
    pub area: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            component: String::from("Component"),
            channel: String::from("Chan#"),
            retention: String::from("Retention"),
            quantity: String::from("ESTD"),
            area: String::from("Area"),
        }
    }
}

/// Where the table is in the file and what its key columns are called
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    pub start_marker: String,
    pub end_marker: String,
    pub columns: ColumnNames,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            start_marker: String::from(">==CT=="),
            end_marker: String::from("Totals"),
            columns: ColumnNames::default(),
        }
    }
}

/// The peaks of one run, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTable {
    columns: Vec<String>,
    index: FxHashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl RunTable {
    /// Create a table with a header and no rows. When a name repeats, lookups by name
    /// resolve to its first occurrence.
    pub fn new(columns: Vec<String>) -> Self {
        let mut index = FxHashMap::default();
        for (idx, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(idx);
        }
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Add a row. Rows must have exactly as many cells as the header has columns.
    pub fn push_row(&mut self, cells: Vec<CellValue>) -> Result<(), TableError> {
        if cells.len() != self.columns.len() {
            return Err(TableError::ColumnCount {
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A table without rows is the empty-table sentinel; such runs are skipped
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn record(&self, position: usize) -> Option<PeakRecord<'_>> {
        if position < self.rows.len() {
            Some(PeakRecord {
                table: self,
                position,
            })
        } else {
            None
        }
    }

    pub fn records(&self) -> impl Iterator<Item = PeakRecord<'_>> {
        (0..self.rows.len()).map(move |position| PeakRecord {
            table: self,
            position,
        })
    }
}

/// A view of one peak row.
#[derive(Debug, Clone, Copy)]
pub struct PeakRecord<'a> {
    table: &'a RunTable,
    position: usize,
}

impl<'a> PeakRecord<'a> {
    /// Zero-based position of the row within its table
    pub fn position(&self) -> usize {
        self.position
    }

    /// The cell under the named column; `Missing` if the table has no such column
    pub fn get(&self, column: &str) -> &'a CellValue {
        match self.table.column_index(column) {
            Some(idx) => &self.table.rows[self.position][idx],
            None => MISSING,
        }
    }

    /// The full row as (column, value) pairs in header order
    pub fn to_pairs(&self) -> Vec<(String, CellValue)> {
        self.table
            .columns
            .iter()
            .cloned()
            .zip(self.table.rows[self.position].iter().cloned())
            .collect()
    }
}

impl PartialEq for PeakRecord<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.table, other.table) && self.position == other.position
    }
}

/// Find the table body: the lines strictly between the last start marker and the first end
/// marker that follows it. Returns the index of the first body line and the body.
fn locate_body<'a, 'b>(
    lines: &'b [&'a str],
    layout: &TableLayout,
) -> Result<(usize, &'b [&'a str]), TableError> {
    let mut start: Option<usize> = None;
    let mut end: Option<usize> = None;
    for (idx, line) in lines.iter().enumerate() {
        if line.contains(&layout.start_marker) {
            start = Some(idx);
        }
        if line.contains(&layout.end_marker) && start.is_some() {
            end = Some(idx);
            break;
        }
    }
    match (start, end) {
        (Some(s), Some(e)) if s == e => Ok((s + 1, &[])),
        (Some(s), Some(e)) => Ok((s + 1, &lines[s + 1..e])),
        _ => Err(TableError::SectionNotFound {
            start: layout.start_marker.clone(),
            end: layout.end_marker.clone(),
        }),
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split('\t').map(|f| f.trim().to_string()).collect()
}

/// Parse the text of a result file into a RunTable.
///
/// Never fails: a missing section or a header without rows yields an empty table and rows
/// whose column count differs from the header are dropped, each with a diagnostic.
pub fn parse_table(text: &str, layout: &TableLayout, diag: &mut Diagnostics) -> RunTable {
    let lines: Vec<&str> = text.lines().collect();
    let (first_line, body) = match locate_body(&lines, layout) {
        Ok(located) => located,
        Err(e) => {
            log::debug!("[{}] {e}", diag.run());
            diag.report(
                None,
                Condition::TableSectionNotFound {
                    start: layout.start_marker.clone(),
                    end: layout.end_marker.clone(),
                },
            );
            return RunTable::default();
        }
    };

    let mut non_blank = body
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    let mut table = match non_blank.next() {
        Some((_, header)) => RunTable::new(split_fields(header)),
        None => RunTable::default(),
    };
    for (offset, line) in non_blank {
        let cells: Vec<CellValue> = line.split('\t').map(CellValue::parse).collect();
        if let Err(TableError::ColumnCount { expected, found }) = table.push_row(cells) {
            diag.report(
                None,
                Condition::MalformedRow {
                    line: first_line + offset + 1,
                    expected,
                    found,
                },
            );
        }
    }

    if table.is_empty() {
        diag.report(None, Condition::NoDataRows);
        return RunTable::default();
    }
    check_key_columns(&table, &layout.columns, diag);
    table
}

/// Report key columns that are absent or hold non-numeric cells. Such rows are kept (their
/// other columns may still be of interest) but will never match a gas.
fn check_key_columns(table: &RunTable, columns: &ColumnNames, diag: &mut Diagnostics) {
    for name in [&columns.channel, &columns.retention] {
        if table.column_index(name).is_none() {
            diag.report(
                None,
                Condition::NumericCoercionFailure {
                    column: name.clone(),
                    value: String::from("<column missing>"),
                },
            );
            continue;
        }
        for record in table.records() {
            if let CellValue::Text(text) = record.get(name) {
                diag.report(
                    None,
                    Condition::NumericCoercionFailure {
                        column: name.clone(),
                        value: text.clone(),
                    },
                );
            }
        }
    }
}

/// Read a result file from disk and parse it. An unreadable file yields an empty table.
pub fn read_table(path: &Path, layout: &TableLayout, diag: &mut Diagnostics) -> RunTable {
    match std::fs::read(path) {
        // Instrument software does not promise UTF-8
        Ok(bytes) => parse_table(&String::from_utf8_lossy(&bytes), layout, diag),
        Err(e) => {
            let err = TableError::FileUnreadable(path.to_path_buf(), e);
            diag.report(
                None,
                Condition::FileUnreadable {
                    reason: err.to_string(),
                },
            );
            RunTable::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Sample Name: 1NP91 cathode\n\
        Method: CO2R.mth\n\
        >==CT==\n\
        \n\
        Component\tChan#\tRetention\tArea\tESTD\tNorm.ESTD%\n\
        Hydrogen\t1\t24.0\t1500.2\t5.2\t10.1\n\
        \n\
        Carbon Monoxide\t1\t70.0\t220.0\t0.5\t1.1\n\
        Totals\t\t\t1720.2\t5.7\t11.2\n\
        Report end\n";

    #[test]
    fn test_parse_sample() {
        let mut diag = Diagnostics::new("sample");
        let table = parse_table(SAMPLE, &TableLayout::default(), &mut diag);
        assert!(diag.is_empty());
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns()[1], "Chan#");
        let first = table.record(0).unwrap();
        assert_eq!(
            first.get("Component"),
            &CellValue::Text(String::from("Hydrogen"))
        );
        assert_eq!(first.get("ESTD").as_f64(), Some(5.2));
        assert_eq!(table.record(1).unwrap().get("Retention").as_f64(), Some(70.0));
        assert_eq!(first.get("NotAColumn"), &CellValue::Missing);
        assert_eq!(first.to_pairs().len(), 6);
    }

    #[test]
    fn test_last_start_marker_wins() {
        let text = ">==CT==\nStale\tHeader\n>==CT==\nChan#\tRetention\n3\t21.5\nTotals\n";
        let mut diag = Diagnostics::new("repeat");
        let table = parse_table(text, &TableLayout::default(), &mut diag);
        assert_eq!(table.columns(), &["Chan#", "Retention"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_markers() {
        let mut diag = Diagnostics::new("no_end");
        let table = parse_table(">==CT==\nChan#\tRetention\n1\t2\n", &TableLayout::default(), &mut diag);
        assert!(table.is_empty());
        assert!(diag.any(|c| matches!(c, Condition::TableSectionNotFound { .. })));

        let mut diag = Diagnostics::new("no_start");
        let table = parse_table("Chan#\tRetention\n1\t2\nTotals\n", &TableLayout::default(), &mut diag);
        assert!(table.is_empty());
        assert!(diag.any(|c| matches!(c, Condition::TableSectionNotFound { .. })));
    }

    #[test]
    fn test_header_without_rows_is_empty() {
        let mut diag = Diagnostics::new("header_only");
        let table = parse_table(">==CT==\nChan#\tRetention\n\nTotals\n", &TableLayout::default(), &mut diag);
        assert!(table.is_empty());
        assert_eq!(diag.entries()[0].condition, Condition::NoDataRows);
    }

    #[test]
    fn test_malformed_row_dropped() {
        let text = "head\n>==CT==\nChan#\tRetention\tESTD\n1\t24.0\t5.2\n2\t32.0\n3\t21.0\t0.5\nTotals\n";
        let mut diag = Diagnostics::new("ragged");
        let table = parse_table(text, &TableLayout::default(), &mut diag);
        assert_eq!(table.len(), 2);
        assert_eq!(table.record(1).unwrap().get("Chan#").as_channel(), Some(3));
        assert_eq!(
            diag.entries()[0].condition,
            Condition::MalformedRow {
                line: 5,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_non_numeric_key_cells_reported() {
        let text = ">==CT==\nChan#\tRetention\nx\t24.0\n1\t--\nTotals\n";
        let mut diag = Diagnostics::new("coerce");
        let table = parse_table(text, &TableLayout::default(), &mut diag);
        assert_eq!(table.len(), 2);
        assert_eq!(diag.entries().len(), 2);
        assert!(diag.any(|c| *c
            == Condition::NumericCoercionFailure {
                column: String::from("Retention"),
                value: String::from("--")
            }));
    }

    #[test]
    fn test_duplicate_column_resolves_to_first() {
        let mut table = RunTable::new(vec![
            String::from("Chan#"),
            String::from("Area"),
            String::from("Area"),
        ]);
        table
            .push_row(vec![
                CellValue::Number(1.0),
                CellValue::Number(10.0),
                CellValue::Number(20.0),
            ])
            .unwrap();
        assert_eq!(table.column_index("Area"), Some(1));
        assert_eq!(table.record(0).unwrap().get("Area").as_f64(), Some(10.0));
        assert!(table.push_row(vec![CellValue::Missing]).is_err());
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut diag = Diagnostics::new("gone");
        let table = read_table(&dir.path().join("SAMPRSLT.TXT"), &TableLayout::default(), &mut diag);
        assert!(table.is_empty());
        assert!(diag.any(|c| matches!(c, Condition::FileUnreadable { .. })));
    }
}
