//! Core data model for backup jobs.
//!
//! This module defines the main data structures for representing a backup run:
//! - Operation: the closed catalog of supported robocopy invocations
//! - JobInvocation: a validated, fully composed command line
//! - JobResult: the outcome of one external-tool run

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::args;
use crate::error::EngineError;

/// Exit codes at or above this value are failures under the robocopy
/// convention; everything below is success, possibly with informational
/// sub-codes (files copied, extras detected, etc.).
pub const EXIT_FAILURE_THRESHOLD: i32 = 8;

/// Classify a raw exit code under the below-threshold-8 rule.
pub fn classify_exit_code(code: i32) -> bool {
    code < EXIT_FAILURE_THRESHOLD
}

/// A backup operation selected by the caller.
///
/// Each variant owns the parameters it needs and contributes an immutable
/// list of flags beyond the fixed baseline set. Variants map one-to-one to
/// user-facing actions; conflicting flag combinations are never produced
/// from this catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Top-level files only, no recursion.
    Simple,
    /// Recurse into subdirectories, skipping empty ones (`/S`).
    SubdirsSkipEmpty,
    /// Recurse into subdirectories, empty ones included (`/E`).
    Subdirs,
    /// Incremental copy that never deletes and never overwrites with an
    /// older source file (`/E /XO`).
    IncrementalNoDelete,
    /// Only files modified within the last `days` days (`/E /MAXAGE:n`).
    RecentSince { days: u32 },
    /// Full recursive copy excluding files that are unchanged between
    /// source and destination (`/E /XC`).
    ExcludeUnchanged,
    /// Replicate the directory skeleton with zero-length files (`/E /CREATE`).
    StructureOnly,
    /// Recursive copy excluding older source files and destination extras
    /// (`/E /XO /XX`).
    ExcludeOlderAndExtra,
    /// Mirror: destination entries absent from the source are DELETED.
    Mirror,
    /// Mirror that leaves destination extras in place (`/MIR /XX`).
    MirrorExcludeExtra,
    /// Mirror with tool-side logging to the given file (`/MIR /LOG:path`).
    MirrorLogged { log_file: PathBuf },
    /// Mirror with caller-chosen retry count and inter-retry wait.
    MirrorRetryWait { retries: u32, wait_secs: u32 },
    /// Mirror with a caller-chosen worker thread count.
    MirrorThreads { threads: u32 },
    /// Delete destination entries that no longer exist in the source.
    Purge,
    /// Dry run: list differences without copying (`/L /V`).
    Compare,
}

impl Operation {
    /// Flags this operation contributes beyond the baseline set, in order.
    ///
    /// Parameterized flags are rendered as single `prefix:value` tokens so
    /// the external tool sees them as one argument.
    pub fn extra_args(&self) -> Vec<String> {
        match self {
            Operation::Simple => vec![],
            Operation::SubdirsSkipEmpty => vec![args::flags::COPY_SUBDIRS_NONEMPTY.into()],
            Operation::Subdirs => vec![args::flags::COPY_SUBDIRS.into()],
            Operation::IncrementalNoDelete => vec![
                args::flags::COPY_SUBDIRS.into(),
                args::flags::EXCLUDE_OLDER.into(),
            ],
            Operation::RecentSince { days } => vec![
                args::flags::COPY_SUBDIRS.into(),
                format!("{}{}", args::flags::MAXAGE, days),
            ],
            Operation::ExcludeUnchanged => vec![
                args::flags::COPY_SUBDIRS.into(),
                args::flags::EXCLUDE_SAME.into(),
            ],
            Operation::StructureOnly => vec![
                args::flags::COPY_SUBDIRS.into(),
                args::flags::CREATE_STRUCTURE_ONLY.into(),
            ],
            Operation::ExcludeOlderAndExtra => vec![
                args::flags::COPY_SUBDIRS.into(),
                args::flags::EXCLUDE_OLDER.into(),
                args::flags::EXCLUDE_EXTRA.into(),
            ],
            Operation::Mirror => vec![args::flags::MIRROR.into()],
            Operation::MirrorExcludeExtra => vec![
                args::flags::MIRROR.into(),
                args::flags::EXCLUDE_EXTRA.into(),
            ],
            Operation::MirrorLogged { log_file } => vec![
                args::flags::MIRROR.into(),
                format!("{}{}", args::flags::LOG, log_file.display()),
            ],
            Operation::MirrorRetryWait { retries, wait_secs } => vec![
                args::flags::MIRROR.into(),
                format!("{}{}", args::flags::RETRIES, retries),
                format!("{}{}", args::flags::WAIT, wait_secs),
            ],
            Operation::MirrorThreads { threads } => vec![
                args::flags::MIRROR.into(),
                format!("{}{}", args::flags::MULTITHREAD, threads),
            ],
            Operation::Purge => vec![args::flags::PURGE.into()],
            Operation::Compare => vec![
                args::flags::LIST_ONLY.into(),
                args::flags::VERBOSE.into(),
            ],
        }
    }

    /// True if this operation can irreversibly delete destination entries
    /// and therefore requires explicit confirmation before dispatch.
    pub fn is_destructive(&self) -> bool {
        self.extra_args()
            .iter()
            .any(|f| f == args::flags::MIRROR || f == args::flags::PURGE)
    }

    /// Derive the default tool-side log file for a logged mirror:
    /// `<dir>/backup_<timestamp>.txt`.
    pub fn default_log_file(dir: &Path) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        dir.join(format!("backup_{stamp}.txt"))
    }
}

/// A fully composed, validated invocation of the external tool.
///
/// Constructed once per run and never mutated afterwards; the runner
/// consumes the argv exactly as composed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInvocation {
    /// Unique identifier for this run
    pub id: Uuid,

    /// Root source directory
    pub source: PathBuf,

    /// Root destination directory (created by the external tool, not by us)
    pub destination: PathBuf,

    /// The complete argument vector, tool name first
    pub argv: Vec<String>,
}

impl JobInvocation {
    /// Validate the paths and compose the command line for `operation`.
    ///
    /// The source must be non-empty and an existing directory. The
    /// destination must be non-empty but is NOT created here; the external
    /// tool creates it on demand.
    pub fn new(
        source: &Path,
        destination: &Path,
        operation: &Operation,
    ) -> Result<Self, EngineError> {
        if source.as_os_str().is_empty() || destination.as_os_str().is_empty() {
            return Err(EngineError::EmptyPath);
        }
        match std::fs::metadata(source) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(EngineError::NotADirectory {
                    path: source.to_path_buf(),
                })
            }
            Err(_) => {
                return Err(EngineError::SourceNotFound {
                    path: source.to_path_buf(),
                })
            }
        }

        Ok(JobInvocation {
            id: Uuid::new_v4(),
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            argv: args::compose(source, destination, &operation.extra_args()),
        })
    }

    /// The command line as it will be echoed to the sink.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// The outcome of one external-tool run.
///
/// Created when the child process terminates; immutable thereafter. The raw
/// exit code is preserved alongside the classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Raw exit code as reported by the external tool (-1 if killed by a
    /// signal before reporting one)
    pub exit_code: i32,

    /// Classification under the below-threshold-8 rule
    pub success: bool,

    /// Captured output lines, in arrival order
    pub lines: Vec<String>,
}

impl JobResult {
    pub fn new(exit_code: i32, lines: Vec<String>) -> Self {
        JobResult {
            exit_code,
            success: classify_exit_code(exit_code),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundary_sits_at_eight() {
        assert!(classify_exit_code(0));
        assert!(classify_exit_code(3));
        assert!(classify_exit_code(7));
        assert!(!classify_exit_code(8));
        assert!(!classify_exit_code(16));
    }

    #[test]
    fn parameterized_flags_render_without_spaces() {
        let op = Operation::RecentSince { days: 7 };
        assert!(op.extra_args().contains(&"/MAXAGE:7".to_string()));

        let op = Operation::MirrorRetryWait {
            retries: 5,
            wait_secs: 10,
        };
        let extras = op.extra_args();
        assert_eq!(extras, vec!["/MIR", "/R:5", "/W:10"]);

        let op = Operation::MirrorThreads { threads: 4 };
        assert_eq!(op.extra_args(), vec!["/MIR", "/MT:4"]);
    }

    #[test]
    fn mirror_and_purge_operations_are_destructive() {
        assert!(Operation::Mirror.is_destructive());
        assert!(Operation::MirrorExcludeExtra.is_destructive());
        assert!(Operation::MirrorLogged {
            log_file: PathBuf::from("/tmp/log.txt")
        }
        .is_destructive());
        assert!(Operation::Purge.is_destructive());

        assert!(!Operation::Simple.is_destructive());
        assert!(!Operation::IncrementalNoDelete.is_destructive());
        assert!(!Operation::Compare.is_destructive());
    }

    #[test]
    fn invocation_rejects_empty_paths() {
        let err = JobInvocation::new(Path::new(""), Path::new("/tmp/dst"), &Operation::Simple);
        assert!(matches!(err, Err(EngineError::EmptyPath)));

        let err = JobInvocation::new(Path::new("/tmp"), Path::new(""), &Operation::Simple);
        assert!(matches!(err, Err(EngineError::EmptyPath)));
    }

    #[test]
    fn invocation_rejects_missing_source() {
        let temp = tempfile::tempdir().expect("temp dir");
        let missing = temp.path().join("nope");
        let err = JobInvocation::new(&missing, temp.path(), &Operation::Subdirs);
        assert!(matches!(err, Err(EngineError::SourceNotFound { .. })));
    }

    #[test]
    fn invocation_rejects_file_as_source() {
        let temp = tempfile::tempdir().expect("temp dir");
        let file = temp.path().join("file.txt");
        std::fs::write(&file, b"x").expect("write file");
        let err = JobInvocation::new(&file, temp.path(), &Operation::Subdirs);
        assert!(matches!(err, Err(EngineError::NotADirectory { .. })));
    }

    #[test]
    fn invocation_does_not_create_destination() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dst = temp.path().join("dst");
        let inv = JobInvocation::new(temp.path(), &dst, &Operation::Simple)
            .expect("invocation should validate");
        assert!(!dst.exists());
        assert_eq!(inv.destination, dst);
    }

    #[test]
    fn default_log_file_lands_in_given_dir() {
        let path = Operation::default_log_file(Path::new("/var/log/valkyria"));
        assert!(path.starts_with("/var/log/valkyria"));
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        assert!(name.starts_with("backup_"));
        assert!(name.ends_with(".txt"));
    }
}
