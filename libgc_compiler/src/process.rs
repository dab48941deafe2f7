use serde::Serialize;
use std::sync::mpsc::Sender;

use super::analysis::{AnalysisExtractor, AnalysisKey};
use super::classifier::{Classify, GroupLabel};
use super::config::Config;
use super::diagnostic::{Diagnostic, Diagnostics};
use super::error::ProcessorError;
use super::matcher::PeakMatcher;
use super::qc_check::{assess, Assessment};
use super::reader::RunReader;
use super::report::ReportWriter;
use super::run::{sort_records, RunRecord};
use super::worker_status::WorkerStatus;

/// Everything compiled from a batch, in report order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Analysis columns present in at least one record, in column order
    #[serde(skip)]
    pub columns: Vec<AnalysisKey>,
    pub records: Vec<RunRecord>,
    /// Verdicts for the checked runs; empty when no QC check is configured
    pub assessments: Vec<Assessment>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn assessment_for(&self, run: &str) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.run == run)
    }
}

/// Compile a single run.
///
/// Returns None when the run has no usable table. A run that cannot be classified still
/// produces a record, labelled `Error` and without results.
pub fn compile_run<R: RunReader>(
    reader: &R,
    run: &str,
    config: &Config,
    matcher: &PeakMatcher,
    diag: &mut Diagnostics,
) -> Option<RunRecord> {
    let table = reader.read_run(run, diag);
    if table.is_empty() {
        log::info!("Run {run} has no peak table, skipping...");
        return None;
    }

    let group = config.classification.classify(&table, matcher, diag);
    log::info!("[{run}] Group ID = {group}");

    let extractor = AnalysisExtractor::new(
        &config.analysis_gases,
        config.layout,
        config.classification.labels(),
    );
    let results = extractor.extract(&table, group, matcher, diag);
    Some(RunRecord::new(run, group, results))
}

/// Compile every run in `runs`, sort the records and derive the QC verdicts.
///
/// Sends a WorkerStatus after each run.
pub fn compile_runs<R: RunReader>(
    reader: &R,
    runs: &[String],
    config: &Config,
    tx: &Sender<WorkerStatus>,
) -> Result<Report, ProcessorError> {
    let matcher = config.make_matcher();
    let mut records = Vec::with_capacity(runs.len());
    let mut diagnostics = Vec::new();

    for (idx, run) in runs.iter().enumerate() {
        log::info!("Processing run {run} ({}/{})...", idx + 1, runs.len());
        let mut diag = Diagnostics::new(run);
        if let Some(record) = compile_run(reader, run, config, &matcher, &mut diag) {
            records.push(record);
        }
        diagnostics.extend(diag.into_entries());
        tx.send(WorkerStatus::new((idx + 1) as f32 / runs.len() as f32, run))?;
    }

    sort_records(&mut records, config.sort_key);

    let assessments = match &config.qc_check {
        Some(check) => assess(&records, check),
        None => Vec::new(),
    };

    let extractor = AnalysisExtractor::new(
        &config.analysis_gases,
        config.layout,
        config.classification.labels(),
    );
    let columns = extractor
        .all_keys()
        .into_iter()
        .filter(|key| records.iter().any(|r| r.results.get(key).is_some()))
        .collect();

    let n_errors = records
        .iter()
        .filter(|r| r.group == GroupLabel::Error)
        .count();
    log::info!(
        "Compiled {} runs ({} skipped, {} labelled Error, {} diagnostics)",
        records.len(),
        runs.len() - records.len(),
        n_errors,
        diagnostics.len()
    );

    Ok(Report {
        columns,
        records,
        assessments,
        diagnostics,
    })
}

/// The main loop of gc_compiler.
///
/// Finds the runs under the master directory, compiles them and writes the report files.
/// Progress is sent over `tx`.
pub fn process(config: Config, tx: Sender<WorkerStatus>) -> Result<Report, ProcessorError> {
    config.validate()?;
    let reader = config.make_reader();
    let runs = reader.discover_runs()?;
    log::info!(
        "Found {} runs in {}",
        runs.len(),
        config.master_path.to_string_lossy()
    );

    let report = compile_runs(&reader, &runs, &config, &tx)?;

    let writer = ReportWriter::new(&config.get_report_stem());
    writer.write(&report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisValue;
    use crate::classifier::{ClassificationPolicy, ThreeIdentifierPolicy};
    use crate::diagnostic::Condition;
    use crate::gas::GasSpec;
    use crate::reader::MemoryReader;
    use crate::run::SortKey;
    use std::sync::mpsc;

    fn result_file(rows: &str) -> String {
        format!(
            "Sample info\n>==CT==\nComponent\tChan#\tRetention\tArea\tESTD\n{rows}Totals\t\t\t\t\n"
        )
    }

    fn two_identifier_reader(config: &Config) -> MemoryReader {
        let mut reader = MemoryReader::new(&config.table);
        // Cathode: CO2 well above the QC band
        reader.insert(
            "A_20250904T090000",
            &result_file("H2\t1\t24.0\t10\t5.2\nCO\t1\t70.0\t10\t0.5\nCO2\t3\t22.0\t10\t12.0\n"),
        );
        // QC, in band
        reader.insert(
            "B_20250904T080000",
            &result_file("CO2\t3\t22.0\t10\t0.5\n"),
        );
        // Nitrogen purge
        reader.insert("C_20250904T100000", &result_file("N2\t3\t17.0\t10\t70.0\n"));
        // QC, out of band for the check but still QC by classification
        reader.insert(
            "D_20250904T110000",
            &result_file("CO2\t3\t22.0\t10\t0.95\n"),
        );
        // Cathode after the second QC
        reader.insert(
            "E_20250904T120000",
            &result_file("CO2\t3\t22.0\t10\t9.0\n"),
        );
        // Ambiguous CO2
        reader.insert(
            "F_20250904T130000",
            &result_file("CO2\t3\t22.0\t10\t9.0\nCO2\t3\t23.0\t10\t9.0\n"),
        );
        // No table at all
        reader.insert("G_20250904T140000", "nothing here\n");
        reader
    }

    #[test]
    fn test_compile_two_identifier_batch() {
        let mut config = Config::default();
        if let Some(check) = config.qc_check.as_mut() {
            check.band = crate::gas::Range::new(0.4, 0.6);
        }
        let reader = two_identifier_reader(&config);
        let runs = reader.runs();
        let (tx, rx) = mpsc::channel();
        let report = compile_runs(&reader, &runs, &config, &tx).unwrap();

        let names: Vec<&str> = report.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "B_20250904T080000",
                "A_20250904T090000",
                "C_20250904T100000",
                "D_20250904T110000",
                "E_20250904T120000",
                "F_20250904T130000",
            ]
        );
        let groups: Vec<GroupLabel> = report.records.iter().map(|r| r.group).collect();
        assert_eq!(
            groups,
            vec![
                GroupLabel::Qc,
                GroupLabel::Cathode,
                GroupLabel::InertPurge,
                GroupLabel::Qc,
                GroupLabel::Cathode,
                GroupLabel::Error,
            ]
        );

        // Error runs carry no results
        assert!(report.records[5].results.is_empty());

        let cathode = &report.records[1];
        let h2 = GasSpec::new("Hydrogen", 1, 21.0, 26.0);
        assert_eq!(
            cathode.results.get(&AnalysisKey::new(GroupLabel::Cathode, &h2)),
            Some(&AnalysisValue::Quantity(5.2))
        );
        assert_eq!(
            cathode.results.get(&AnalysisKey::new(GroupLabel::Qc, &h2)),
            Some(&AnalysisValue::NotApplicable)
        );

        // 4 groups x 4 gases
        assert_eq!(report.columns.len(), 16);

        let a = report.assessment_for("A_20250904T090000").unwrap();
        assert_eq!(a.verdict.to_string(), "PASS");
        let e = report.assessment_for("E_20250904T120000").unwrap();
        assert_eq!(e.verdict.to_string(), "FAIL (QC=0.95)");
        assert_eq!(report.assessments.len(), 2);

        assert!(report.diagnostics.iter().any(|d| d.run == "F_20250904T130000"
            && matches!(d.condition, Condition::AmbiguousMatch { .. })));
        assert!(report.diagnostics.iter().any(|d| d.run == "G_20250904T140000"
            && matches!(d.condition, Condition::TableSectionNotFound { .. })));

        let statuses: Vec<WorkerStatus> = rx.try_iter().collect();
        assert_eq!(statuses.len(), 7);
        assert_eq!(statuses[6].progress, 1.0);
    }

    #[test]
    fn test_compile_three_identifier_batch() {
        let config = Config::three_identifier();
        let mut reader = MemoryReader::new(&config.table);
        reader.insert(
            "run_02",
            &result_file("N2\t2\t32.0\t900\t80\nCO2\t3\t22.0\t50\t3.0\nH2\t1\t24.0\t1\t5.2\n"),
        );
        reader.insert(
            "run_01",
            &result_file("N2\t2\t32.0\t40\t80\nCO2\t3\t22.0\t50\t0.5\nCO\t1\t70.0\t40\t0.5\n"),
        );
        reader.insert(
            "run_03",
            &result_file("N2\t2\t32.0\t50\t80\nN2\t2\t32.0\t50\t80\nCO2\t3\t22.0\t1\t1\n"),
        );
        let runs = vec![
            String::from("run_03"),
            String::from("run_02"),
            String::from("run_01"),
        ];
        let (tx, _rx) = mpsc::channel();
        let report = compile_runs(&reader, &runs, &config, &tx).unwrap();

        let labelled: Vec<(&str, GroupLabel)> = report
            .records
            .iter()
            .map(|r| (r.name.as_str(), r.group))
            .collect();
        assert_eq!(
            labelled,
            vec![
                ("run_01", GroupLabel::Qc),
                ("run_02", GroupLabel::Anode),
                ("run_03", GroupLabel::Error),
            ]
        );
        // Narrow layout: only the run's own group
        assert_eq!(report.records[1].results.len(), 3);
        assert!(report.records[1]
            .results
            .iter()
            .all(|(key, _)| key.group == GroupLabel::Anode));
        assert!(report.assessments.is_empty());
        // Only QC and Anode columns occur
        assert_eq!(report.columns.len(), 6);
        assert_eq!(report.columns[0].to_string(), "Anode_Hydrogen_Chan1");
    }

    #[test]
    fn test_first_match_policy_keeps_ambiguous_run() {
        let mut config = Config {
            classification: ClassificationPolicy::ThreeIdentifier(
                ThreeIdentifierPolicy::default(),
            ),
            sort_key: SortKey::Name,
            ..Config::default()
        };
        config.ambiguity = crate::matcher::AmbiguityPolicy::FirstMatch;
        let mut reader = MemoryReader::new(&config.table);
        reader.insert(
            "run",
            &result_file("N2\t2\t32.0\t900\t80\nN2\t2\t32.5\t1\t80\nCO2\t3\t22.0\t50\t3.0\n"),
        );
        let (tx, _rx) = mpsc::channel();
        let report = compile_runs(&reader, &[String::from("run")], &config, &tx).unwrap();
        assert_eq!(report.records[0].group, GroupLabel::Anode);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| matches!(d.condition, Condition::AmbiguousMatch { count: 2, .. })));
    }

    #[test]
    fn test_process_directory() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("X_20250904T090000");
        std::fs::create_dir(&run_dir).unwrap();
        std::fs::write(
            run_dir.join("SAMPRSLT.TXT"),
            result_file("CO2\t3\t22.0\t10\t0.5\n"),
        )
        .unwrap();

        let config = Config {
            master_path: dir.path().to_path_buf(),
            ..Config::default()
        };
        let (tx, _rx) = mpsc::channel();
        let report = process(config, tx).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].group, GroupLabel::Qc);
        assert!(dir.path().join("Grouped_Analysis.yml").exists());
        assert!(dir.path().join("Grouped_Analysis_all.tsv").exists());
        assert!(dir.path().join("Grouped_Analysis_checked.tsv").exists());
    }
}
