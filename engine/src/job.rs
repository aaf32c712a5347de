//! Job orchestration module.
//!
//! Ties the pieces together in the order the engine contract requires:
//! destructive-operation guard, then path validation and argument
//! composition, then asynchronous dispatch. Each submission is independent
//! and stateless once started; nothing here serializes concurrent jobs.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::guard::{self, ConfirmDestructive};
use crate::model::{JobInvocation, JobResult, Operation};
use crate::runner;
use crate::sink::OutputSink;

/// Submit a backup job.
///
/// Destructive operations are gated first: a declined confirmation returns
/// `Ok(None)` with no process spawned and nothing written to the sink — a
/// no-op, not an error. Otherwise the invocation is validated and composed,
/// and the returned handle resolves once the external tool exits (`None`
/// from the handle means the tool could not be launched; the sink carries
/// the details).
pub fn submit(
    source: &Path,
    destination: &Path,
    operation: &Operation,
    sink: Arc<dyn OutputSink>,
    confirm: &dyn ConfirmDestructive,
) -> Result<Option<JoinHandle<Option<JobResult>>>, EngineError> {
    if !guard::clearance(operation, source, destination, confirm) {
        return Ok(None);
    }

    let invocation = JobInvocation::new(source, destination, operation)?;
    Ok(Some(runner::dispatch(invocation, sink)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::AlwaysConfirm;
    use crate::sink::MemorySink;

    struct AlwaysDecline;

    impl ConfirmDestructive for AlwaysDecline {
        fn confirm(&self, _source: &Path, _destination: &Path) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn declined_mirror_spawns_nothing_and_writes_nothing() {
        let temp = tempfile::tempdir().expect("temp dir");
        let sink = Arc::new(MemorySink::new());

        let handle = submit(
            temp.path(),
            &temp.path().join("dst"),
            &Operation::Mirror,
            sink.clone(),
            &AlwaysDecline,
        )
        .expect("a decline is not an error");

        assert!(handle.is_none());
        assert!(sink.is_empty(), "no cmd echo, no output, no status line");
    }

    #[tokio::test]
    async fn validation_failure_precedes_any_side_effect() {
        let temp = tempfile::tempdir().expect("temp dir");
        let sink = Arc::new(MemorySink::new());

        let err = submit(
            &temp.path().join("missing"),
            &temp.path().join("dst"),
            &Operation::Subdirs,
            sink.clone(),
            &AlwaysConfirm,
        );

        assert!(matches!(err, Err(EngineError::SourceNotFound { .. })));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn unlaunchable_tool_reports_through_the_sink() {
        // robocopy is absent on the test host, so the dispatch itself must
        // surface the launch failure instead of erroring out of submit.
        let temp = tempfile::tempdir().expect("temp dir");
        let dst = temp.path().join("dst");
        let sink = Arc::new(MemorySink::new());

        let handle = submit(
            temp.path(),
            &dst,
            &Operation::Subdirs,
            sink.clone(),
            &AlwaysConfirm,
        )
        .expect("submission is valid")
        .expect("non-destructive op needs no confirmation");

        let result = handle.await.expect("task join");
        if result.is_none() {
            let entries = sink.entries();
            assert!(entries
                .iter()
                .any(|(text, _)| text.contains("failed to launch")));
        }
    }
}
