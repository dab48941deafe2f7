//! Recoverable, per-run conditions.
//!
//! Nothing the engine encounters while reading or interpreting a run aborts the batch.
//! Instead every condition is recorded as a [`Diagnostic`] carrying the run name, the gas
//! involved (if any) and what went wrong, so that an operator can review the runs that were
//! downgraded to `Error` or left with absent values.
use serde::Serialize;
use std::fmt;

/// The taxonomy of recoverable conditions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    FileUnreadable { reason: String },
    TableSectionNotFound { start: String, end: String },
    NoDataRows,
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    NumericCoercionFailure { column: String, value: String },
    NoMatch { channel: u32, min: f64, max: f64 },
    AmbiguousMatch { count: usize, rows: Vec<usize> },
    ClassificationConflict { reason: String },
}

impl Condition {
    /// Missing peaks are routine (a gas simply was not in the sample), everything else
    /// deserves an operator's attention.
    fn level(&self) -> log::Level {
        match self {
            Self::NoMatch { .. } => log::Level::Info,
            _ => log::Level::Warn,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileUnreadable { reason } => write!(f, "result file unreadable: {reason}"),
            Self::TableSectionNotFound { start, end } => {
                write!(f, "table section not found (start '{start}', end '{end}')")
            }
            Self::NoDataRows => write!(f, "table section contains no data rows"),
            Self::MalformedRow {
                line,
                expected,
                found,
            } => write!(
                f,
                "malformed row at line {line}: expected {expected} columns, found {found}; row dropped"
            ),
            Self::NumericCoercionFailure { column, value } => {
                write!(f, "column '{column}' value '{value}' is not numeric")
            }
            Self::NoMatch { channel, min, max } => {
                write!(f, "no match (Chan#={channel}, range=({min}, {max}))")
            }
            Self::AmbiguousMatch { count, rows } => {
                write!(f, "{count} matches (table rows {rows:?})")
            }
            Self::ClassificationConflict { reason } => {
                write!(f, "classification conflict: {reason}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub run: String,
    pub gas: Option<String>,
    pub condition: Condition,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.gas {
            Some(gas) => write!(f, "[{}] [{}] {}", self.run, gas, self.condition),
            None => write!(f, "[{}] {}", self.run, self.condition),
        }
    }
}

/// Diagnostic sink for a single run.
///
/// Every reported condition is logged immediately and kept so the aggregator can hand it to
/// the report.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    run: String,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(run: &str) -> Self {
        Self {
            run: run.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn run(&self) -> &str {
        &self.run
    }

    pub fn report(&mut self, gas: Option<&str>, condition: Condition) {
        let diagnostic = Diagnostic {
            run: self.run.clone(),
            gas: gas.map(str::to_string),
            condition,
        };
        log::log!(diagnostic.condition.level(), "{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if any recorded condition satisfies the predicate
    pub fn any(&self, predicate: impl Fn(&Condition) -> bool) -> bool {
        self.entries.iter().any(|d| predicate(&d.condition))
    }
}
