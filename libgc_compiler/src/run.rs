use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::sync::OnceLock;
use time::macros::format_description;
use time::PrimitiveDateTime;

use super::analysis::AnalysisResults;
use super::classifier::GroupLabel;

/// How the final collection of runs is ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Plain string order of the run name
    Name,
    /// The timestamp embedded in the run name; runs without one go last
    #[default]
    Timestamp,
}

/// A timestamp token (`YYYYMMDDTHHMMSS`) found in a run name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTimestamp {
    when: PrimitiveDateTime,
    token: String,
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{8}T\d{6})").expect("timestamp pattern is valid"))
}

impl RunTimestamp {
    /// Find the first timestamp token in a run name. A token that looks right but is not a
    /// real date (e.g. month 13) is treated as absent.
    pub fn from_run_name(name: &str) -> Option<Self> {
        let token = timestamp_pattern().captures(name)?.get(1)?.as_str();
        let format = format_description!("[year][month][day]T[hour][minute][second]");
        match PrimitiveDateTime::parse(token, &format) {
            Ok(when) => Some(Self {
                when,
                token: token.to_string(),
            }),
            Err(e) => {
                log::warn!("[{name}] ignoring timestamp token {token}: {e}");
                None
            }
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn when(&self) -> PrimitiveDateTime {
        self.when
    }
}

impl Serialize for RunTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token)
    }
}

/// The result of compiling one run. Created once by the aggregator and never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub name: String,
    pub group: GroupLabel,
    pub timestamp: Option<RunTimestamp>,
    pub results: AnalysisResults,
}

impl RunRecord {
    pub fn new(name: &str, group: GroupLabel, results: AnalysisResults) -> Self {
        Self {
            name: name.to_string(),
            group,
            timestamp: RunTimestamp::from_run_name(name),
            results,
        }
    }
}

fn by_timestamp(a: &RunRecord, b: &RunRecord) -> Ordering {
    match (&a.timestamp, &b.timestamp) {
        (Some(ta), Some(tb)) => ta.when.cmp(&tb.when).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}

/// Order records for reporting
pub fn sort_records(records: &mut [RunRecord], key: SortKey) {
    match key {
        SortKey::Name => records.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::Timestamp => records.sort_by(by_timestamp),
    }
}
