//! Pass/fail verdicts for measurement runs based on the most recent QC run.
//!
//! This is an order-dependent fold over the already sorted run records: a QC run replaces the
//! carried QC value (even with "no value"), and every checked run is judged against whatever
//! is carried at that point.
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::analysis::AnalysisKey;
use super::classifier::GroupLabel;
use super::gas::{GasSpec, Range};
use super::run::RunRecord;

/// Which runs to check and against what
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcCheck {
    /// Label of the runs that carry the reference value
    pub qc_label: GroupLabel,
    /// Label of the runs that receive a verdict
    pub checked_label: GroupLabel,
    /// The analysis gas whose QC value is checked; matched by name and channel
    pub gas: String,
    pub channel: u32,
    pub band: Range,
}

impl Default for QcCheck {
    fn default() -> Self {
        Self {
            qc_label: GroupLabel::Qc,
            checked_label: GroupLabel::Cathode,
            gas: String::from("Carbon Dioxide"),
            channel: 3,
            band: Range::new(0.4, 1.0),
        }
    }
}

impl QcCheck {
    fn qc_key(&self) -> AnalysisKey {
        AnalysisKey {
            group: self.qc_label,
            gas: self.gas.clone(),
            channel: self.channel,
        }
    }

    /// Check that the gas is one of the analysis gases
    pub fn refers_to(&self, gases: &[GasSpec]) -> bool {
        gases
            .iter()
            .any(|g| g.name == self.gas && g.channel == self.channel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Pass { qc_value: f64 },
    Fail { qc_value: Option<f64> },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass { .. } => write!(f, "PASS"),
            Self::Fail {
                qc_value: Some(value),
            } => write!(f, "FAIL (QC={value})"),
            Self::Fail { qc_value: None } => write!(f, "FAIL (QC=None)"),
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The verdict for one checked run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub run: String,
    pub verdict: Verdict,
}

/// Judge every checked run against the latest preceding QC run.
///
/// `records` must already be in report order.
pub fn assess(records: &[RunRecord], check: &QcCheck) -> Vec<Assessment> {
    let key = check.qc_key();
    records
        .iter()
        .scan(None::<f64>, |last_qc, record| {
            if record.group == check.qc_label {
                *last_qc = record.results.get(&key).and_then(|v| v.quantity());
                Some(None)
            } else if record.group == check.checked_label {
                let verdict = match *last_qc {
                    Some(value) if check.band.contains(value) => Verdict::Pass { qc_value: value },
                    other => Verdict::Fail { qc_value: other },
                };
                Some(Some(Assessment {
                    run: record.name.clone(),
                    verdict,
                }))
            } else {
                Some(None)
            }
        })
        .flatten()
        .collect()
}
