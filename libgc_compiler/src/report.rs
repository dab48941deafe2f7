use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::analysis::AnalysisValue;
use super::error::ReportError;
use super::process::Report;
use super::run::RunRecord;

const NAME_COLUMN: &str = "FolderName";
const GROUP_COLUMN: &str = "Group ID";
const TIMESTAMP_COLUMN: &str = "Timestamp";
const VERDICT_COLUMN: &str = "Pass/Fail";

const ALL_SUFFIX: &str = "_all.tsv";
const CHECKED_SUFFIX: &str = "_checked.tsv";
const YAML_SUFFIX: &str = ".yml";

fn suffixed(stem: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = stem.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Writes a compiled Report to disk.
///
/// Three files share a path stem:
/// - `<stem>.yml`: the full report, including verdicts and diagnostics
/// - `<stem>_all.tsv`: one row per run, one column per analysis key
/// - `<stem>_checked.tsv`: the checked runs only, with their pass/fail verdict
#[derive(Debug, Clone)]
pub struct ReportWriter {
    stem: PathBuf,
}

impl ReportWriter {
    pub fn new(stem: &Path) -> Self {
        Self {
            stem: stem.to_path_buf(),
        }
    }

    pub fn yaml_path(&self) -> PathBuf {
        suffixed(&self.stem, YAML_SUFFIX)
    }

    pub fn all_path(&self) -> PathBuf {
        suffixed(&self.stem, ALL_SUFFIX)
    }

    pub fn checked_path(&self) -> PathBuf {
        suffixed(&self.stem, CHECKED_SUFFIX)
    }

    pub fn write(&self, report: &Report) -> Result<(), ReportError> {
        if let Some(parent) = self.stem.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.write_yaml(report)?;
        self.write_all(report)?;
        self.write_checked(report)?;
        log::info!("Report written to {}", self.yaml_path().to_string_lossy());
        Ok(())
    }

    fn write_yaml(&self, report: &Report) -> Result<(), ReportError> {
        let yaml_str = serde_yaml::to_string(report)?;
        let mut file = File::create(self.yaml_path())?;
        file.write_all(yaml_str.as_bytes())?;
        Ok(())
    }

    fn header(report: &Report) -> Vec<String> {
        [NAME_COLUMN, GROUP_COLUMN, TIMESTAMP_COLUMN]
            .iter()
            .map(|s| s.to_string())
            .chain(report.columns.iter().map(|key| key.to_string()))
            .collect()
    }

    /// The cells of a record under the report's columns. Keys the record does not have are
    /// left blank, as are absent values.
    fn row(report: &Report, record: &RunRecord) -> Vec<String> {
        let mut row = vec![
            record.name.clone(),
            record.group.to_string(),
            record
                .timestamp
                .as_ref()
                .map(|ts| ts.token().to_string())
                .unwrap_or_default(),
        ];
        row.extend(report.columns.iter().map(|key| {
            record
                .results
                .get(key)
                .unwrap_or(&AnalysisValue::Absent)
                .to_string()
        }));
        row
    }

    fn write_all(&self, report: &Report) -> Result<(), ReportError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(self.all_path())?;
        writer.write_record(Self::header(report))?;
        for record in report.records.iter() {
            writer.write_record(Self::row(report, record))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_checked(&self, report: &Report) -> Result<(), ReportError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(self.checked_path())?;
        let mut header = Self::header(report);
        header.push(VERDICT_COLUMN.to_string());
        writer.write_record(header)?;
        for record in report.records.iter() {
            let Some(assessment) = report.assessment_for(&record.name) else {
                continue;
            };
            let mut row = Self::row(report, record);
            row.push(assessment.verdict.to_string());
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
