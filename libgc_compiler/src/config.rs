use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::classifier::{ClassificationPolicy, ThreeIdentifierPolicy};
use super::analysis::ReportLayout;
use super::error::ConfigError;
use super::gas::GasSpec;
use super::matcher::{AmbiguityPolicy, PeakMatcher};
use super::qc_check::QcCheck;
use super::reader::DirectoryReader;
use super::run::SortKey;
use super::table::TableLayout;

const DEFAULT_RESULT_FILE: &str = "SAMPRSLT.TXT";
const DEFAULT_REPORT_STEM: &str = "Grouped_Analysis";

/// Structure representing the application configuration. Contains pathing, gas and
/// classification information.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub master_path: PathBuf,
    pub result_file_name: String,
    pub output_path: Option<PathBuf>,
    pub table: TableLayout,
    pub analysis_gases: Vec<GasSpec>,
    pub classification: ClassificationPolicy,
    pub ambiguity: AmbiguityPolicy,
    pub sort_key: SortKey,
    pub layout: ReportLayout,
    pub qc_check: Option<QcCheck>,
}

impl Default for Config {
    /// Generate a new Config object for the two-identifier setup. The master path is empty
    /// and must be filled in.
    fn default() -> Self {
        Self {
            master_path: PathBuf::from("None"),
            result_file_name: String::from(DEFAULT_RESULT_FILE),
            output_path: None,
            table: TableLayout::default(),
            analysis_gases: vec![
                GasSpec::new("Carbon Monoxide", 1, 60.0, 90.0),
                GasSpec::new("Hydrogen", 1, 21.0, 26.0),
                GasSpec::new("Carbon Monoxide", 2, 60.0, 90.0),
                GasSpec::new("Carbon Dioxide", 3, 20.0, 26.0),
            ],
            classification: ClassificationPolicy::default(),
            ambiguity: AmbiguityPolicy::Strict,
            sort_key: SortKey::Timestamp,
            layout: ReportLayout::Wide,
            qc_check: Some(QcCheck::default()),
        }
    }
}

impl Config {
    /// The three-identifier setup: anode/cathode/QC by nitrogen, CO2 and CO, runs ordered
    /// by name, one set of columns per run
    pub fn three_identifier() -> Self {
        Self {
            analysis_gases: vec![
                GasSpec::new("Hydrogen", 1, 21.0, 26.0),
                GasSpec::new("Carbon Monoxide", 1, 60.0, 90.0),
                GasSpec::new("Oxygen", 1, 30.0, 33.0),
            ],
            classification: ClassificationPolicy::ThreeIdentifier(
                ThreeIdentifierPolicy::default(),
            ),
            sort_key: SortKey::Name,
            layout: ReportLayout::Narrow,
            qc_check: None,
            ..Self::default()
        }
    }

    /// Read the configuration in a YAML file
    /// Returns a Config if successful and valid
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        let config = serde_yaml::from_str::<Self>(&yaml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every window and band is the right way round
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis_gases.is_empty() {
            return Err(ConfigError::NoAnalysisGases);
        }
        for gas in self
            .analysis_gases
            .iter()
            .chain(self.classification.identifier_gases())
        {
            gas.validate()?;
        }
        self.classification.qc_band().validate("QC band")?;
        if let Some(check) = &self.qc_check {
            check.band.validate("QC check band")?;
            if !check.refers_to(&self.analysis_gases) {
                log::warn!(
                    "QC check gas {} (Chan#{}) is not an analysis gas; every checked run will fail",
                    check.gas,
                    check.channel
                );
            }
        }
        Ok(())
    }

    /// Get the path stem of the report files
    pub fn get_report_stem(&self) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => self.master_path.join(DEFAULT_REPORT_STEM),
        }
    }

    pub fn make_matcher(&self) -> PeakMatcher {
        PeakMatcher::new(self.table.columns.clone(), self.ambiguity)
    }

    pub fn make_reader(&self) -> DirectoryReader {
        DirectoryReader::new(&self.master_path, &self.result_file_name, &self.table)
    }
}
