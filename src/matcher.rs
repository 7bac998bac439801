//! Pairing files across two directory trees and classifying each pair
//!
//! The left tree drives the run: every data file under the left root gets
//! exactly one outcome, ordered by relative path. Files that exist only
//! under the right root are ignored unless `report_right_only` is set.

use crate::compare::{compare, Comparison, MismatchReason};
use crate::config::{CompareConfig, MatchConfig, Settings};
use crate::error::{Result, TabmatchError};
use crate::loader::{file_extension, LoaderRegistry};
use crate::progress::ProgressReporter;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

/// Which of the two trees a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// A file's path relative to its comparison root.
///
/// The `/`-separated text is what reports show. Names that are not valid
/// UTF-8 appear there with replacement characters, while pairing and
/// file access use the native components, so such files still resolve
/// and never collide with each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct RelativePath {
    text: String,
    native: PathBuf,
}

impl RelativePath {
    /// Normalize a path given as a string; `\` is treated as a separator
    pub fn new(path: &str) -> Self {
        Self::from_path(Path::new(&path.replace('\\', "/")))
    }

    /// Normalize a path already relative to a root
    pub fn from_path(path: &Path) -> Self {
        let native: PathBuf = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        let text = native
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self { text, native }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the display text is exactly the on-disk name
    pub fn is_lossless(&self) -> bool {
        self.native.to_str().is_some()
    }

    /// Absolute location of this path under `root`
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.native)
    }

    /// Case-folded join key
    fn folded(&self) -> String {
        self.text.to_lowercase()
    }
}

impl From<String> for RelativePath {
    fn from(path: String) -> Self {
        Self::new(&path)
    }
}

impl From<RelativePath> for String {
    fn from(path: RelativePath) -> Self {
        path.text
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Classification of one relative path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Match,
    Mismatch { reason: MismatchReason },
    /// No counterpart under the right root
    FileNotFound,
    LoadError { side: Side, detail: String },
    /// Only under the right root; produced when `report_right_only` is set
    RightOnly,
}

impl Outcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Match)
    }
}

/// Outcome for a single relative path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: RelativePath,
    pub outcome: Outcome,
}

/// Ordered outcomes of a run
#[derive(Debug, Clone, Default)]
pub struct MatchRun {
    pub outcomes: Vec<FileOutcome>,
    /// Set when the run was cancelled; cancelled files have no outcome
    pub cancelled: bool,
}

impl MatchRun {
    pub fn all_match(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(|o| o.outcome.is_match())
    }
}

/// Looks up the right-side counterpart of a left relative path
struct RightResolver {
    root: PathBuf,
    /// Case-folded relative path to actual path, built only when matching ignores case
    folded: Option<HashMap<String, PathBuf>>,
}

impl RightResolver {
    fn resolve(&self, path: &RelativePath) -> Option<PathBuf> {
        match &self.folded {
            Some(index) => index.get(&path.folded()).cloned(),
            None => {
                let candidate = path.under(&self.root);
                candidate.is_file().then_some(candidate)
            }
        }
    }
}

/// Drives enumeration, loading and comparison for two roots
pub struct TreeMatcher {
    left: PathBuf,
    right: PathBuf,
    matching: MatchConfig,
    compare: CompareConfig,
    loaders: LoaderRegistry,
    cancel: Arc<AtomicBool>,
}

impl TreeMatcher {
    /// Validate the settings and both roots before any work starts
    pub fn new(left: impl Into<PathBuf>, right: impl Into<PathBuf>, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let left = left.into();
        let right = right.into();

        for root in [&left, &right] {
            if !root.exists() {
                return Err(TabmatchError::RootNotFound { path: root.clone() });
            }
            if !root.is_dir() {
                return Err(TabmatchError::invalid_input(format!(
                    "Root is not a directory: {}",
                    root.display()
                )));
            }
        }

        Ok(Self {
            left,
            right,
            matching: settings.matching,
            compare: settings.compare,
            loaders: LoaderRegistry::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    /// Share a cancellation flag; once set, files not yet started are skipped
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Extensions included in the run
    pub fn extensions(&self) -> Vec<String> {
        let configured = self.matching.normalized_extensions();
        if configured.is_empty() {
            self.loaders.extensions()
        } else {
            configured
        }
    }

    /// Data files under the left root, sorted by relative path
    pub fn enumerate(&self) -> Result<Vec<RelativePath>> {
        let paths = enumerate_tree(&self.left, &self.extensions())?;
        if self.matching.case_insensitive {
            check_case_collisions(&paths, Side::Left)?;
        }
        Ok(paths)
    }

    fn right_resolver(&self) -> Result<RightResolver> {
        let folded = if self.matching.case_insensitive {
            let paths = enumerate_tree(&self.right, &self.extensions())?;
            check_case_collisions(&paths, Side::Right)?;
            Some(
                paths
                    .into_iter()
                    .map(|p| (p.folded(), p.under(&self.right)))
                    .collect(),
            )
        } else {
            None
        };

        Ok(RightResolver {
            root: self.right.clone(),
            folded,
        })
    }

    /// Lazily compare files one at a time, in relative path order.
    ///
    /// Right-only files are never produced here; use [`TreeMatcher::run`]
    /// for that.
    pub fn outcomes(&self) -> Result<impl Iterator<Item = FileOutcome> + '_> {
        let paths = self.enumerate()?;
        let resolver = self.right_resolver()?;

        Ok(paths
            .into_iter()
            .take_while(move |_| !self.is_cancelled())
            .map(move |path| {
                let outcome = self.compare_file(&path, &resolver);
                FileOutcome { path, outcome }
            }))
    }

    /// Compare every file in parallel and return outcomes in relative path order
    pub fn run(&self) -> Result<MatchRun> {
        self.run_with_progress(false)
    }

    pub fn run_with_progress(&self, show_progress: bool) -> Result<MatchRun> {
        let mut progress = if show_progress {
            ProgressReporter::new_for_run()
        } else {
            ProgressReporter::new_minimal()
        };

        let paths = self.enumerate()?;
        let resolver = self.right_resolver()?;
        progress.finish_enumeration(paths.len() as u64);

        let workers = self.matching.effective_workers();
        log::info!(
            "Comparing {} files from {} against {} with {} workers",
            paths.len(),
            self.left.display(),
            self.right.display(),
            workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to start worker pool: {}", e))?;

        // One slot per enumerated path; indexed collect keeps path order
        let slots: Vec<Option<FileOutcome>> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    if self.is_cancelled() {
                        return None;
                    }
                    let outcome = self.compare_file(path, &resolver);
                    progress.file_done();
                    Some(FileOutcome {
                        path: path.clone(),
                        outcome,
                    })
                })
                .collect()
        });
        progress.finish_files("Done");

        let cancelled = slots.iter().any(Option::is_none);
        let mut outcomes: Vec<FileOutcome> = slots.into_iter().flatten().collect();

        if self.matching.report_right_only && !cancelled {
            outcomes.extend(self.right_only(&paths)?);
            outcomes.sort_by(|a, b| a.path.cmp(&b.path));
        }

        if cancelled {
            log::warn!(
                "Run cancelled after {} of {} files",
                outcomes.len(),
                paths.len()
            );
        }

        Ok(MatchRun {
            outcomes,
            cancelled,
        })
    }

    /// Files under the right root with no left counterpart
    fn right_only(&self, left_paths: &[RelativePath]) -> Result<Vec<FileOutcome>> {
        let right_paths = enumerate_tree(&self.right, &self.extensions())?;
        let unpaired: Vec<RelativePath> = if self.matching.case_insensitive {
            let left_keys: HashSet<String> = left_paths.iter().map(RelativePath::folded).collect();
            right_paths
                .into_iter()
                .filter(|p| !left_keys.contains(&p.folded()))
                .collect()
        } else {
            let left_keys: HashSet<&RelativePath> = left_paths.iter().collect();
            right_paths
                .into_iter()
                .filter(|p| !left_keys.contains(p))
                .collect()
        };

        Ok(unpaired
            .into_iter()
            .map(|path| FileOutcome {
                path,
                outcome: Outcome::RightOnly,
            })
            .collect())
    }

    /// Load both sides of one pair and compare them
    fn compare_file(&self, path: &RelativePath, resolver: &RightResolver) -> Outcome {
        let Some(right_path) = resolver.resolve(path) else {
            log::debug!("{}: no counterpart under {}", path, self.right.display());
            return Outcome::FileNotFound;
        };
        let left_path = path.under(&self.left);

        let (left, right) = rayon::join(
            || self.loaders.load(&left_path),
            || self.loaders.load(&right_path),
        );

        let (left, right) = match (left, right) {
            (Ok(left), Ok(right)) => (left, right),
            (Err(e), _) => return load_error(path, Side::Left, e.detail),
            (_, Err(e)) => return load_error(path, Side::Right, e.detail),
        };

        let outcome = match compare(&left, &right, &self.compare) {
            Comparison::Match => Outcome::Match,
            Comparison::Mismatch(reason) => Outcome::Mismatch { reason },
        };
        log::debug!("{}: {:?}", path, outcome);
        outcome
    }
}

fn load_error(path: &RelativePath, side: Side, detail: String) -> Outcome {
    log::warn!("{}: failed to load {} file: {}", path, side, detail);
    Outcome::LoadError { side, detail }
}

/// Regular files under `root` with one of `extensions`, sorted.
///
/// Any walk error (permissions, I/O, symlink loop) aborts enumeration.
fn enumerate_tree(root: &Path, extensions: &[String]) -> Result<Vec<RelativePath>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let wanted = file_extension(entry.path())
            .map(|e| extensions.contains(&e))
            .unwrap_or(false);
        if !wanted {
            continue;
        }

        let relative = entry.path().strip_prefix(root).map_err(|_| {
            TabmatchError::invalid_input(format!(
                "{} is not under {}",
                entry.path().display(),
                root.display()
            ))
        })?;
        let path = RelativePath::from_path(relative);
        if !path.is_lossless() {
            log::warn!("{}: file name is not valid UTF-8; reported with replacement characters", path);
        }
        paths.push(path);
    }

    paths.sort();
    Ok(paths)
}

/// Relative paths must stay unique once case is ignored
fn check_case_collisions(paths: &[RelativePath], side: Side) -> Result<()> {
    let mut seen: HashMap<String, &RelativePath> = HashMap::new();
    for path in paths {
        if let Some(previous) = seen.insert(path.folded(), path) {
            return Err(TabmatchError::invalid_input(format!(
                "Paths under the {} root collide when case is ignored: {} and {}",
                side, previous, path
            )));
        }
    }
    Ok(())
}
