//! # Valkyria Engine - Backup Job Execution Library
//!
//! A headless execution engine for robocopy-based backup jobs in Rust.
//! Designed as the foundation for multiple UIs (CLI, GUI, automation).
//!
//! ## Overview
//!
//! The engine turns a selected backup operation into a concrete external
//! tool invocation, runs it without blocking the caller, streams and
//! classifies its output, and optionally archives and encrypts the result.
//! It features:
//! - A closed catalog of operations, each owning its flag list
//! - A pure, deterministic argument composer over a fixed baseline set
//! - Confirmation gating for destructive (mirror/purge) operations
//! - An async process runner streaming live output to a caller sink
//! - Exit-code classification under the robocopy `<8` success convention
//! - A zip + AES-256-GCM pipeline with a generate-once key lifecycle
//!
//! ## Basic Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use engine::{submit, AlwaysConfirm, MemorySink, Operation};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = Arc::new(MemorySink::new());
//! let handle = submit(
//!     Path::new("/data/proj"),
//!     Path::new("/backup/proj"),
//!     &Operation::IncrementalNoDelete,
//!     sink.clone(),
//!     &AlwaysConfirm,
//! )?;
//!
//! if let Some(handle) = handle {
//!     if let Some(result) = handle.await? {
//!         println!("exit code {} success={}", result.exit_code, result.success);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (Operation, JobInvocation, JobResult)
//! - **error**: Error types and handling
//! - **args**: Flag catalog and argument composition
//! - **sink**: Output sink contract consumed by UIs
//! - **guard**: Destructive-operation confirmation gate
//! - **runner**: Async child-process execution and streaming
//! - **vault**: Archive-and-encrypt pipeline with key lifecycle
//! - **job**: Orchestration (guard, compose, dispatch)

pub mod args;
pub mod error;
pub mod guard;
pub mod job;
pub mod model;
pub mod runner;
pub mod sink;
pub mod vault;

// Re-export main types and functions
pub use args::{compose, BASE_ARGS, TOOL};
pub use error::EngineError;
pub use guard::{AlwaysConfirm, ConfirmDestructive};
pub use job::submit;
pub use model::{
    classify_exit_code, JobInvocation, JobResult, Operation, EXIT_FAILURE_THRESHOLD,
};
pub use runner::dispatch;
pub use sink::{LineTag, MemorySink, OutputSink};
pub use vault::{decrypt_file, encrypt_dir_to_file, EncryptedBundle, KEY_LEN};
