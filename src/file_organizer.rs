//! File organization: moving files of a directory into category folders.
//!
//! The organizer makes a single pass over the immediate entries of its target
//! directory. Each regular file whose extension is known to the
//! [`CategoryIndex`] is renamed into `<target>/<category>/`. A failed move is
//! logged and recorded, the pass then goes on with the next file; only failing
//! to list the directory aborts the run.

use crate::config::{CONFIG_FILE_NAME, Config};
use crate::file_category::{CategoryIndex, is_valid_category};
use indicatif::ProgressBar;
use std::collections::{BTreeSet, HashMap};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while organizing a directory.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The target directory could not be listed. Aborts the run.
    #[error("could not read directory {}: {source}", .path.display())]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Something already exists where the file would be moved to.
    #[error("file already exists at destination: {}", .destination.display())]
    DestinationConflict { destination: PathBuf },

    /// The category folder could not be created.
    #[error("could not create directory {}: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The rename itself failed (permissions, cross-device, source vanished).
    #[error(
        "could not move {} to {}: {source}",
        .source_path.display(),
        .destination.display()
    )]
    Move {
        source_path: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },
}

impl OrganizeError {
    /// Whether this error stops the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DirectoryRead { .. })
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Fixed facts about one organization run.
#[derive(Debug, Clone)]
pub struct RunContext {
    target_dir: PathBuf,
    self_name: Option<String>,
    config_names: BTreeSet<String>,
}

impl RunContext {
    /// Creates a context for `target_dir`.
    ///
    /// The running executable's file name is detected here, and `config.yml`
    /// is protected from being moved.
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            self_name: current_exe_name(),
            config_names: BTreeSet::from([CONFIG_FILE_NAME.to_string()]),
        }
    }

    /// Overrides the detected executable name.
    pub fn with_self_name(mut self, name: Option<String>) -> Self {
        self.self_name = name;
        self
    }

    /// Protects one more configuration file name.
    pub fn with_config_name(mut self, name: impl Into<String>) -> Self {
        self.config_names.insert(name.into());
        self
    }

    /// The directory whose immediate entries are organized.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Returns true if a file with this name must never be moved.
    pub fn is_protected(&self, file_name: &str) -> bool {
        self.self_name.as_deref() == Some(file_name) || self.config_names.contains(file_name)
    }
}

fn current_exe_name() -> Option<String> {
    let exe = std::env::current_exe().ok()?;
    exe.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// A file that was moved into its category folder.
///
/// `name` is the display form of the file name; it is lossy for names that
/// are not valid UTF-8, `destination` is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedFile {
    pub name: String,
    pub category: String,
    pub destination: PathBuf,
}

/// A file that matched a category but could not be moved.
#[derive(Debug)]
pub struct FailedMove {
    pub name: String,
    pub category: String,
    pub error: OrganizeError,
}

/// A move that a run would perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub name: String,
    pub category: String,
    pub destination: PathBuf,
    /// Something already exists at `destination`; the real run would skip this file.
    pub conflict: bool,
}

/// Outcome of one organization run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub moved: Vec<MovedFile>,
    /// Files left in place because their extension has no category.
    pub unmapped: Vec<String>,
    /// Files left in place because they are protected.
    pub protected: Vec<String>,
    pub failures: Vec<FailedMove>,
}

impl RunReport {
    /// Number of files moved into a category folder.
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    /// Returns true if at least one matched file could not be moved.
    ///
    /// # Example
    ///
    /// ```
    /// use janitor::file_organizer::RunReport;
    ///
    /// let report = RunReport::default();
    /// assert!(!report.has_failures());
    /// assert_eq!(report.moved_count(), 0);
    /// ```
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of moved files per category.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for moved in &self.moved {
            *counts.entry(moved.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// How the scan classified one regular file.
enum Entry {
    Candidate {
        file_name: OsString,
        name: String,
        category: String,
    },
    Unmapped(String),
    Protected(String),
}

/// Moves the files of one directory into category subdirectories.
#[derive(Debug, Clone)]
pub struct Organizer {
    index: CategoryIndex,
    context: RunContext,
}

impl Organizer {
    /// Creates an organizer, building the extension index from `config`.
    pub fn new(config: &Config, context: RunContext) -> Self {
        Self {
            index: CategoryIndex::from_mapping(&config.folders),
            context,
        }
    }

    /// The extension lookup built from the configuration.
    pub fn index(&self) -> &CategoryIndex {
        &self.index
    }

    /// The target directory and protected names of this run.
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Organizes the target directory.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::DirectoryRead` if the directory cannot be listed.
    /// Per-file failures are not errors of the run; they are logged and listed in
    /// [`RunReport::failures`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use janitor::config::Config;
    /// use janitor::file_organizer::{Organizer, RunContext};
    ///
    /// let organizer = Organizer::new(&Config::default(), RunContext::new("/home/me/Downloads"));
    /// match organizer.run() {
    ///     Ok(report) => println!("Moved {} files", report.moved_count()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn run(&self) -> OrganizeResult<RunReport> {
        self.run_with_progress(&ProgressBar::hidden())
    }

    /// Same as [`Organizer::run`], advancing `progress` once per matched file.
    pub fn run_with_progress(&self, progress: &ProgressBar) -> OrganizeResult<RunReport> {
        let entries = self.scan()?;
        let mut report = RunReport::default();

        let candidates = entries
            .iter()
            .filter(|entry| matches!(entry, Entry::Candidate { .. }))
            .count();
        progress.set_length(candidates as u64);

        for entry in entries {
            match entry {
                Entry::Unmapped(name) => report.unmapped.push(name),
                Entry::Protected(name) => report.protected.push(name),
                Entry::Candidate {
                    file_name,
                    name,
                    category,
                } => {
                    progress.set_message(name.clone());
                    match progress.suspend(|| self.move_file(&file_name, &category)) {
                        Ok(destination) => report.moved.push(MovedFile {
                            name,
                            category,
                            destination,
                        }),
                        Err(error) => {
                            progress.suspend(|| warn!("Failed to move {}: {}", name, error));
                            report.failures.push(FailedMove {
                                name,
                                category,
                                error,
                            });
                        }
                    }
                    progress.inc(1);
                }
            }
        }

        Ok(report)
    }

    /// Lists the moves a run would make, without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::DirectoryRead` if the directory cannot be listed.
    pub fn plan(&self) -> OrganizeResult<Vec<PlannedMove>> {
        let planned = self
            .scan()?
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Candidate {
                    file_name,
                    name,
                    category,
                } => {
                    let destination = self.context.target_dir.join(&category).join(&file_name);
                    let conflict = fs::symlink_metadata(&destination).is_ok();
                    Some(PlannedMove {
                        name,
                        category,
                        destination,
                        conflict,
                    })
                }
                _ => None,
            })
            .collect();
        Ok(planned)
    }

    /// Moves `file_name` from the target directory into its `category` folder.
    ///
    /// The category folder is created if needed. Nothing is overwritten: if the
    /// destination already exists the file stays where it is.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Name of a file directly inside the target directory
    /// * `category` - Category folder name; must be a single plain path component
    ///
    /// # Errors
    ///
    /// A `category` that is absolute, contains a separator or is `..` is refused
    /// with `OrganizeError::DirectoryCreate`, so nothing ever leaves the target.
    ///
    /// Returns the destination path.
    pub fn move_file(
        &self,
        file_name: impl AsRef<OsStr>,
        category: &str,
    ) -> OrganizeResult<PathBuf> {
        let file_name = file_name.as_ref();
        let base_path = &self.context.target_dir;

        if !is_valid_category(category) {
            return Err(OrganizeError::DirectoryCreate {
                path: PathBuf::from(category),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "category must be a single folder name inside the target directory",
                ),
            });
        }
        let category_path = base_path.join(category);

        fs::create_dir_all(&category_path).map_err(|source| OrganizeError::DirectoryCreate {
            path: category_path.clone(),
            source,
        })?;

        let source_path = base_path.join(file_name);
        let destination = category_path.join(file_name);

        // symlink_metadata so that a dangling link also counts as taken
        if fs::symlink_metadata(&destination).is_ok() {
            return Err(OrganizeError::DestinationConflict { destination });
        }

        fs::rename(&source_path, &destination).map_err(|source| OrganizeError::Move {
            source_path: source_path.clone(),
            destination: destination.clone(),
            source,
        })?;

        info!("Moved '{}' to '{}/'", Path::new(file_name).display(), category);
        Ok(destination)
    }

    /// Reads the target directory and classifies its regular files, sorted by name.
    fn scan(&self) -> OrganizeResult<Vec<Entry>> {
        let base_path = &self.context.target_dir;
        let read_dir = fs::read_dir(base_path).map_err(|source| OrganizeError::DirectoryRead {
            path: base_path.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", base_path.display(), e);
                    continue;
                }
            };

            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                debug!("Skipping non-file entry {:?}", entry.file_name());
                continue;
            }

            names.push(entry.file_name());
        }
        names.sort();

        let entries = names
            .into_iter()
            .map(|file_name| {
                // Lossy form for lookup and display; the rename uses the exact name.
                let name = file_name.to_string_lossy().into_owned();
                if self.context.is_protected(&name) {
                    debug!("Skipping protected file {}", name);
                    return Entry::Protected(name);
                }
                match self.index.category_for(&name) {
                    Some(category) => Entry::Candidate {
                        category: category.to_string(),
                        file_name,
                        name,
                    },
                    None => {
                        debug!("No category for {}", name);
                        Entry::Unmapped(name)
                    }
                }
            })
            .collect();

        Ok(entries)
    }
}
