use clap::{Arg, ArgAction, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use libgc_compiler::config::Config;
use libgc_compiler::error::ConfigError;
use libgc_compiler::process::process;
use libgc_compiler::worker_status::WorkerStatus;

fn make_template_config(path: &Path, three_identifier: bool) -> Result<(), ConfigError> {
    let config = if three_identifier {
        Config::three_identifier()
    } else {
        Config::default()
    };
    let yaml_str = serde_yaml::to_string(&config)?;
    let mut file = File::create(path)?;
    file.write_all(yaml_str.as_bytes())?;
    Ok(())
}

fn main() {
    // Create a cli
    let matches = Command::new("gc_compiler_cli")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("new")
                .about("Make a template configuration yaml file")
                .arg(
                    Arg::new("three")
                        .long("three")
                        .action(ArgAction::SetTrue)
                        .help("Use the three-identifier (anode/cathode/QC) setup"),
                ),
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the configuration file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            log::error!("A configuration path is required (-p/--path)");
            return;
        }
    };

    if let Some(("new", sub)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        match make_template_config(&config_path, sub.get_flag("three")) {
            Ok(()) => log::info!("Done."),
            Err(e) => log::error!("Could not write template config: {e}"),
        }
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Master Path: {}", config.master_path.to_string_lossy());
    log::info!("Result File: {}", config.result_file_name);
    log::info!(
        "Report Stem: {}",
        config.get_report_stem().to_string_lossy()
    );
    log::info!("Analysis Gases: {}", config.analysis_gases.len());
    log::info!("Ambiguity Policy: {:?}", config.ambiguity);
    log::info!("Sort Key: {:?}", config.sort_key);

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}") {
        pb.set_style(style);
    }
    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    // Spawn the task!
    let handle = std::thread::spawn(move || process(config, tx));

    // The channel closes once the worker drops its sender
    for status in rx.iter() {
        pb.set_position((status.progress * 100.0) as u64);
        pb.set_message(status.run_name);
    }

    match handle.join() {
        Ok(result) => match result {
            Ok(report) => {
                let n_failed = report
                    .assessments
                    .iter()
                    .filter(|a| !a.verdict.is_pass())
                    .count();
                log::info!(
                    "Successfully compiled {} runs ({} checked, {} failed QC, {} diagnostics)",
                    report.records.len(),
                    report.assessments.len(),
                    n_failed,
                    report.diagnostics.len()
                );
            }
            Err(e) => log::error!("Compiling failed with error: {e}"),
        },
        Err(_) => log::error!("Failed to join compiling task!"),
    }

    pb.finish();

    log::info!("Done.");
}
