//! Error types for the backup engine.
//!
//! The single `EngineError` enum covers both validation failures (detected
//! before any process is spawned) and archive/encrypt pipeline failures.
//! Runner-level problems are not represented here: the runner reports launch
//! and runtime failures through the output sink and never escalates them as
//! faults, per the error handling design.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while validating a job or running the
/// archive-and-encrypt pipeline.
///
/// Pipeline variants are deliberately distinct from anything the runner
/// reports so a post-processing failure is never conflated with a copy
/// failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Source or destination path is an empty string
    #[error("source and destination paths must not be empty")]
    EmptyPath,

    /// Source directory does not exist
    #[error("source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Source exists but is not a directory
    #[error("source is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Failed to create the output directory for an encrypted bundle
    #[error("failed to create output directory {path}: {source}")]
    OutputDirCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed while walking or reading the directory being archived
    #[error("failed to archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The zip writer rejected an entry or failed to finalize
    #[error("failed to write archive {path}: {source}")]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Failed to read a key file
    #[error("failed to read key file {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to persist a freshly generated key
    #[error("failed to write key file {path}: {source}")]
    KeyWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Key file exists but does not hold a valid key
    #[error("key file {path} holds {len} bytes, expected {expected}")]
    InvalidKeyLength {
        path: PathBuf,
        len: usize,
        expected: usize,
    },

    /// The cipher rejected the plaintext; no output file was written
    #[error("encryption failed for {path}")]
    Encrypt { path: PathBuf },

    /// Authentication failed: wrong key or tampered ciphertext
    #[error("decryption failed for {path}: wrong key or corrupted bundle")]
    Decrypt { path: PathBuf },

    /// Ciphertext file is too short to carry a nonce
    #[error("encrypted bundle {path} is truncated")]
    TruncatedBundle { path: PathBuf },

    /// Generic I/O failure in the pipeline, with the path involved
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
