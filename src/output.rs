//! Report rendering and exit status

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::matcher::{FileOutcome, MatchRun, Outcome};
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// Exit status when every file matched
pub const EXIT_MATCH: i32 = 0;
/// Exit status when at least one file did not match
pub const EXIT_MISMATCH: i32 = 1;
/// Exit status for configuration and enumeration failures
pub const EXIT_FATAL: i32 = 2;
/// Exit status for an interrupted run
pub const EXIT_CANCELLED: i32 = 130;

/// Status word shown after the path on a report line
pub fn status_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Match => "Match",
        Outcome::Mismatch { .. } | Outcome::LoadError { .. } => "Not match",
        Outcome::FileNotFound => "File not found",
        Outcome::RightOnly => "Only in right",
    }
}

/// Reason suffix for outcomes that carry one
pub fn outcome_detail(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Mismatch { reason } => Some(reason.to_string()),
        Outcome::LoadError { side, detail } => Some(format!("{} file unreadable: {}", side, detail)),
        _ => None,
    }
}

/// Exit status for a finished run
pub fn exit_code(run: &MatchRun) -> i32 {
    if run.cancelled {
        EXIT_CANCELLED
    } else if run.all_match() {
        EXIT_MATCH
    } else {
        EXIT_MISMATCH
    }
}

/// Per-status file counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub matched: usize,
    pub not_matched: usize,
    pub not_found: usize,
    pub unreadable: usize,
    pub right_only: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let mut summary = Summary {
            total: outcomes.len(),
            ..Default::default()
        };
        for file in outcomes {
            match file.outcome {
                Outcome::Match => summary.matched += 1,
                Outcome::Mismatch { .. } => summary.not_matched += 1,
                Outcome::FileNotFound => summary.not_found += 1,
                Outcome::LoadError { .. } => summary.unreadable += 1,
                Outcome::RightOnly => summary.right_only += 1,
            }
        }
        summary
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "Total files compared: {}", self.total)?;
        writeln!(f, "Matched files: {}", self.matched)?;
        writeln!(f, "Not matched files: {}", self.not_matched)?;
        writeln!(f, "Files not found: {}", self.not_found)?;
        writeln!(f, "Unreadable files: {}", self.unreadable)?;
        write!(f, "Files only in right: {}", self.right_only)
    }
}

/// Plain text report, one line per file
pub struct TextFormatter;

impl TextFormatter {
    /// `<path>: <status>` with an optional `(detail)` suffix
    pub fn format_line(file: &FileOutcome, brief: bool) -> String {
        let status = status_label(&file.outcome);
        match outcome_detail(&file.outcome) {
            Some(detail) if !brief => format!("{}: {} ({})", file.path, status, detail),
            _ => format!("{}: {}", file.path, status),
        }
    }

    pub fn format(run: &MatchRun, brief: bool, summary: bool) -> String {
        let mut out = String::new();
        for file in &run.outcomes {
            out.push_str(&Self::format_line(file, brief));
            out.push('\n');
        }
        if summary {
            out.push_str(&Summary::from_outcomes(&run.outcomes).to_string());
            out.push('\n');
        }
        out
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    path: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    outcome: &'a Outcome,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: Vec<JsonLine<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
    cancelled: bool,
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format(run: &MatchRun, brief: bool, summary: bool) -> Result<String> {
        let report = JsonReport {
            files: run
                .outcomes
                .iter()
                .map(|file| JsonLine {
                    path: file.path.as_str(),
                    status: status_label(&file.outcome),
                    detail: if brief { None } else { outcome_detail(&file.outcome) },
                    outcome: &file.outcome,
                })
                .collect(),
            summary: summary.then(|| Summary::from_outcomes(&run.outcomes)),
            cancelled: run.cancelled,
        };
        let mut json = serde_json::to_string_pretty(&report)?;
        json.push('\n');
        Ok(json)
    }
}

/// Renders a finished run in the selected format
#[derive(Debug, Clone)]
pub struct ReportEmitter {
    pub format: OutputFormat,
    pub brief: bool,
    pub summary: bool,
}

impl ReportEmitter {
    pub fn render(&self, run: &MatchRun) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(TextFormatter::format(run, self.brief, self.summary)),
            OutputFormat::Json => JsonFormatter::format(run, self.brief, self.summary),
        }
    }

    pub fn emit(&self, run: &MatchRun, writer: &mut dyn Write) -> Result<()> {
        writer.write_all(self.render(run)?.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
