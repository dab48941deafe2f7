#[cfg(test)]
use fxhash::FxHashMap;
use std::path::{Path, PathBuf};

#[cfg(test)]
use super::diagnostic::Condition;
use super::diagnostic::Diagnostics;
use super::error::ProcessorError;
#[cfg(test)]
use super::table::parse_table;
use super::table::{read_table, RunTable, TableLayout};

/// Source of run tables, keyed by run name.
///
/// Reading never fails hard: an unreadable or unparseable run yields an empty table and the
/// reason goes to the run's diagnostics.
pub trait RunReader {
    fn read_run(&self, run: &str, diag: &mut Diagnostics) -> RunTable;
}

/// Reads runs laid out as one sub-directory per run under a master directory, each holding a
/// fixed-name result file.
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    master_path: PathBuf,
    result_file_name: String,
    layout: TableLayout,
}

impl DirectoryReader {
    pub fn new(master_path: &Path, result_file_name: &str, layout: &TableLayout) -> Self {
        Self {
            master_path: master_path.to_path_buf(),
            result_file_name: result_file_name.to_string(),
            layout: layout.clone(),
        }
    }

    pub fn result_file(&self, run: &str) -> PathBuf {
        self.master_path.join(run).join(&self.result_file_name)
    }

    /// List the runs: sub-directories of the master directory that contain a result file.
    /// Directory order is not meaningful; callers sort.
    pub fn discover_runs(&self) -> Result<Vec<String>, ProcessorError> {
        let entries = self
            .master_path
            .read_dir()
            .map_err(|e| ProcessorError::BadMasterPath(self.master_path.clone(), e))?;
        let mut runs = Vec::new();
        for item in entries {
            let item_path = item?.path();
            if !item_path.is_dir() {
                continue;
            }
            let Some(name) = item_path.file_name().map(|n| n.to_string_lossy().to_string())
            else {
                continue;
            };
            if item_path.join(&self.result_file_name).exists() {
                runs.push(name);
            } else {
                log::info!("Run {name} has no {}, skipping...", self.result_file_name);
            }
        }
        Ok(runs)
    }
}

impl RunReader for DirectoryReader {
    fn read_run(&self, run: &str, diag: &mut Diagnostics) -> RunTable {
        read_table(&self.result_file(run), &self.layout, diag)
    }
}

/// Result file contents held in memory, for exercising the pipeline without a directory tree
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: FxHashMap<String, String>,
    layout: TableLayout,
}

#[cfg(test)]
impl MemoryReader {
    pub fn new(layout: &TableLayout) -> Self {
        Self {
            files: FxHashMap::default(),
            layout: layout.clone(),
        }
    }

    pub fn insert(&mut self, run: &str, contents: &str) {
        self.files.insert(run.to_string(), contents.to_string());
    }

    /// Run names in no particular order
    pub fn runs(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }
}

#[cfg(test)]
impl RunReader for MemoryReader {
    fn read_run(&self, run: &str, diag: &mut Diagnostics) -> RunTable {
        match self.files.get(run) {
            Some(contents) => parse_table(contents, &self.layout, diag),
            None => {
                diag.report(
                    None,
                    Condition::FileUnreadable {
                        reason: format!("no contents held for run {run}"),
                    },
                );
                RunTable::default()
            }
        }
    }
}
