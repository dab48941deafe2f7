//! # gc_compiler
//!
//! gc_compiler compiles the results of a batch of gas chromatography (GC) runs into a single
//! grouped report, written in Rust. Each run is a directory holding the instrument's text
//! result file. The peak table in that file is located, parsed, searched for the configured
//! gases, and the run is classified (cathode, anode, QC, ...) from which identifier peaks it
//! contains. Measurement runs can then be checked against the most recent QC run.
//!
//! ## Installation
//!
//! The only method of install is from source. If you have not used Rust before, see the
//! [Rust docs](https://www.rust-lang.org/tools/install) for installing the tool chain.
//!
//! To build and install the CLI use `cargo install --path ./gc_compiler_cli` from the top
//! level gc_compiler repository. The binary is installed to your cargo install location
//! (typically `~/.cargo/bin/`).
//!
//! ## Usage
//!
//! Make a template configuration with
//!
//! ```text
//! gc_compiler_cli -p config.yml new
//! gc_compiler_cli -p config.yml new --three
//! ```
//!
//! edit it, and run `gc_compiler_cli -p config.yml`.
//!
//! ## Configuration
//!
//! A configuration is YAML. The two-identifier template looks like (abridged):
//!
//! ```yml
//! master_path: /data/gc/batch_01
//! result_file_name: SAMPRSLT.TXT
//! output_path: null
//! table:
//!   start_marker: '>==CT=='
//!   end_marker: Totals
//!   columns:
//!     component: Component
//!     channel: Chan#
//!     retention: Retention
//!     quantity: ESTD
//!     area: Area
//! analysis_gases:
//! - name: Carbon Dioxide
//!   channel: 3
//!   range:
//!     min: 20.0
//!     max: 26.0
//! classification:
//!   policy: two_identifier
//!   co2: ...
//!   n2: ...
//!   qc_band: ...
//! ambiguity: strict
//! sort_key: timestamp
//! layout: wide
//! qc_check:
//!   qc_label: QC
//!   checked_label: Cathode
//!   gas: Carbon Dioxide
//!   channel: 3
//!   band:
//!     min: 0.4
//!     max: 1.0
//! ```
//!
//! - `ambiguity`: `strict` labels a run `Error` when an identifier gas matches more than one
//! row; `first_match` takes the first row in table order. Either way the ambiguity is
//! reported.
//! - `sort_key`: `timestamp` orders runs by the `YYYYMMDDTHHMMSS` token in their name (runs
//! without one go last, by name); `name` orders them by name.
//! - `layout`: `wide` gives every run a column for every group, with `N/A` in the columns of
//! other groups; `narrow` only has the run's own group.
//! - `output_path`: the path stem of the report files. Defaults to
//! `<master_path>/Grouped_Analysis`.
//!
//! ## Output
//!
//! - `<stem>.yml`: every run record, QC verdict and diagnostic
//! - `<stem>_all.tsv`: one row per run, with the folder name, group and timestamp followed
//! by a `<Group>_<Gas_Name>_Chan<n>` column per analysis value
//! - `<stem>_checked.tsv`: the checked runs only, with a trailing `Pass/Fail` column
//!
//! Diagnostics (missing files, malformed rows, unmatched or ambiguous peaks, classification
//! conflicts) never stop a batch. They are logged as they happen and collected in the report.
pub mod analysis;
pub mod cell;
pub mod classifier;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod gas;
pub mod matcher;
pub mod process;
pub mod qc_check;
pub mod reader;
pub mod report;
pub mod run;
pub mod table;
pub mod worker_status;
