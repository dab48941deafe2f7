use serde::{Deserialize, Serialize};

use super::cell::CellValue;
use super::diagnostic::{Condition, Diagnostics};
use super::gas::GasSpec;
use super::table::{ColumnNames, PeakRecord, RunTable};

/// What to do when more than one peak falls inside a gas's channel and window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Report the match as ambiguous. Classification of the run becomes `Error` and the
    /// analysis value is left absent.
    #[default]
    Strict,
    /// Take the first candidate in table order. The ambiguity is still reported.
    FirstMatch,
}

/// Outcome of looking up one gas in one table
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult<'a> {
    NoMatch,
    Unique(PeakRecord<'a>),
    Ambiguous(Vec<PeakRecord<'a>>),
}

impl<'a> MatchResult<'a> {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }

    /// The matched record, if the match was unique
    pub fn record(&self) -> Option<PeakRecord<'a>> {
        match self {
            Self::Unique(record) => Some(*record),
            _ => None,
        }
    }
}

/// Looks up gas peaks by channel and retention window.
#[derive(Debug, Clone, Default)]
pub struct PeakMatcher {
    columns: ColumnNames,
    policy: AmbiguityPolicy,
}

impl PeakMatcher {
    pub fn new(columns: ColumnNames, policy: AmbiguityPolicy) -> Self {
        Self { columns, policy }
    }

    pub fn policy(&self) -> AmbiguityPolicy {
        self.policy
    }

    /// Every record on the gas's channel with a retention time inside the window, in table
    /// order. Rows with a non-numeric channel or retention never qualify.
    pub fn candidates<'t>(&self, table: &'t RunTable, gas: &GasSpec) -> Vec<PeakRecord<'t>> {
        table
            .records()
            .filter(|record| {
                let channel = record.get(&self.columns.channel).as_channel();
                let retention = record.get(&self.columns.retention).as_f64();
                match (channel, retention) {
                    (Some(ch), Some(rt)) => ch == gas.channel && gas.range.contains(rt),
                    _ => false,
                }
            })
            .collect()
    }

    /// Find the peak belonging to `gas`.
    pub fn find<'t>(
        &self,
        table: &'t RunTable,
        gas: &GasSpec,
        diag: &mut Diagnostics,
    ) -> MatchResult<'t> {
        let mut candidates = self.candidates(table, gas);
        match candidates.len() {
            0 => {
                diag.report(
                    Some(&gas.name),
                    Condition::NoMatch {
                        channel: gas.channel,
                        min: gas.range.min,
                        max: gas.range.max,
                    },
                );
                MatchResult::NoMatch
            }
            1 => {
                let record = candidates.remove(0);
                log::debug!(
                    "[{}] [{}] matched table row {}",
                    diag.run(),
                    gas.name,
                    record.position()
                );
                MatchResult::Unique(record)
            }
            count => {
                diag.report(
                    Some(&gas.name),
                    Condition::AmbiguousMatch {
                        count,
                        rows: candidates.iter().map(|r| r.position()).collect(),
                    },
                );
                match self.policy {
                    AmbiguityPolicy::Strict => MatchResult::Ambiguous(candidates),
                    AmbiguityPolicy::FirstMatch => MatchResult::Unique(candidates.remove(0)),
                }
            }
        }
    }

    /// The normalized quantity (ESTD) of a record
    pub fn quantity<'t>(&self, record: &PeakRecord<'t>) -> &'t CellValue {
        record.get(&self.columns.quantity)
    }

    /// The signal area of a record
    pub fn area<'t>(&self, record: &PeakRecord<'t>) -> &'t CellValue {
        record.get(&self.columns.area)
    }

    pub fn quantity_column(&self) -> &str {
        &self.columns.quantity
    }

    pub fn area_column(&self) -> &str {
        &self.columns.area
    }
}
