//! Command implementation for the tabmatch CLI

use crate::cli::{Cli, OutputFormat};
use crate::config::Settings;
use crate::error::{Result, TabmatchError};
use crate::matcher::TreeMatcher;
use crate::output::{exit_code, ReportEmitter, Summary, EXIT_CANCELLED, EXIT_FATAL};
use std::fs::File;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Merge the optional settings file with command-line flags.
///
/// Flags only ever relax strictness or switch features on; they cannot
/// turn a relaxation from the settings file back off.
pub fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    let compare = &mut settings.compare;
    if cli.ignore_column_order {
        compare.strict_column_order = false;
    }
    if cli.ignore_row_order {
        compare.strict_row_order = false;
    }
    if let Some(epsilon) = cli.epsilon {
        compare.float_epsilon = epsilon;
    }
    if cli.check_nullability {
        compare.check_nullability = true;
    }
    if cli.full_diff {
        compare.full_diff = true;
    }
    compare.ignore_columns.extend(cli.ignore_columns.iter().cloned());
    if !cli.key_columns.is_empty() {
        compare.key_columns = cli.key_columns.clone();
    }

    let matching = &mut settings.matching;
    if let Some(workers) = cli.workers {
        matching.workers = workers;
    }
    if !cli.extensions.is_empty() {
        matching.extensions = cli.extensions.clone();
    }
    if cli.case_insensitive {
        matching.case_insensitive = true;
    }
    if cli.report_right_only {
        matching.report_right_only = true;
    }

    settings.validate()?;
    Ok(settings)
}

/// Run one comparison and write its report; returns the process exit status
pub fn execute_command(cli: Cli, cancel: Arc<AtomicBool>) -> Result<i32> {
    let format = OutputFormat::parse(&cli.format).map_err(TabmatchError::invalid_input)?;
    let settings = build_settings(&cli)?;
    log::debug!("Settings: {:?}", settings);

    let matcher = TreeMatcher::new(&cli.left, &cli.right, settings)?.with_cancel_flag(cancel);
    let run = matcher.run_with_progress(!cli.no_progress)?;

    let emitter = ReportEmitter {
        format,
        brief: cli.brief,
        summary: cli.summary,
    };
    match &cli.output {
        Some(path) => {
            let mut file = File::create(path)?;
            emitter.emit(&run, &mut file)?;
            log::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            emitter.emit(&run, &mut handle)?;
        }
    }

    let summary = Summary::from_outcomes(&run.outcomes);
    log::info!("{} of {} files matched", summary.matched, summary.total);

    if run.cancelled {
        return Err(TabmatchError::Cancelled);
    }
    Ok(exit_code(&run))
}

/// Process exit status for the result of [`execute_command`]
pub fn exit_status(result: &Result<i32>) -> i32 {
    match result {
        Ok(code) => *code,
        Err(TabmatchError::Cancelled) => EXIT_CANCELLED,
        Err(_) => EXIT_FATAL,
    }
}
