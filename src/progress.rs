//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Progress reporter for a comparison run
#[derive(Debug)]
pub struct ProgressReporter {
    pub enumerate_pb: Option<ProgressBar>,
    pub files_pb: Option<ProgressBar>,
    show_progress: bool,
}

impl ProgressReporter {
    /// Create progress reporter for a run; bars draw on stderr only
    pub fn new_for_run() -> Self {
        let enumerate_pb = create_spinner("Enumerating files...");

        Self {
            enumerate_pb: Some(enumerate_pb),
            files_pb: None,
            show_progress: true,
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            enumerate_pb: None,
            files_pb: None,
            show_progress: false,
        }
    }

    /// Finish enumeration and start the per-file bar
    pub fn finish_enumeration(&mut self, total_files: u64) {
        if let Some(pb) = self.enumerate_pb.take() {
            pb.finish_and_clear();
        }
        if self.show_progress && self.files_pb.is_none() {
            self.files_pb = Some(create_progress_bar(total_files, "Comparing files"));
        }
    }

    /// Record one finished file. Safe to call from worker threads.
    pub fn file_done(&self) {
        if let Some(pb) = &self.files_pb {
            pb.inc(1);
        }
    }

    /// Finish the per-file bar
    pub fn finish_files(&mut self, message: &str) {
        if let Some(pb) = self.files_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        // Ensure all progress bars are cleaned up silently
        if let Some(pb) = self.enumerate_pb.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = self.files_pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .expect("Invalid progress template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a progress bar with known total
fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} ({per_sec}) {eta} {msg}")
            .expect("Invalid progress template")
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}
