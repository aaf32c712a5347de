//! Asynchronous process runner.
//!
//! Executes a fully composed argument vector as a child process and streams
//! its combined stdout/stderr to the caller's sink, line by line, as it
//! arrives. Dispatch returns immediately; a background task owns the child
//! handle for its lifetime and is responsible for draining both pipes so
//! the child never blocks on a full buffer.
//!
//! The runner performs no retries, no timeouts, and no cancellation. Retry
//! behavior is expressed as tool arguments (`/R:n /W:n`); a hung child
//! blocks only its own task. Concurrent dispatches are not serialized, and
//! their sink appends interleave chunk by chunk.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

use crate::model::{JobInvocation, JobResult, EXIT_FAILURE_THRESHOLD};
use crate::sink::{LineTag, OutputSink};

/// Dispatch a job. Returns as soon as the background task is scheduled; the
/// handle resolves to `Some(JobResult)` once the child exits, or `None` if
/// the process could not be launched at all.
///
/// Launch failures are reported through the sink as a tagged error line and
/// never propagate as a fault.
pub fn dispatch(
    invocation: JobInvocation,
    sink: Arc<dyn OutputSink>,
) -> JoinHandle<Option<JobResult>> {
    tokio::spawn(async move { execute(invocation, sink).await })
}

async fn execute(invocation: JobInvocation, sink: Arc<dyn OutputSink>) -> Option<JobResult> {
    // Echo the exact command line before anything runs, for auditability.
    sink.append(
        &format!("\n$ {}\n", invocation.command_line()),
        Some(LineTag::Cmd),
    );

    let mut child = match Command::new(&invocation.argv[0])
        .args(&invocation.argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(error) => {
            sink.append(
                &format!("\nERROR: failed to launch {}: {}\n", invocation.argv[0], error),
                Some(LineTag::Err),
            );
            return None;
        }
    };

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader(stdout, sink.clone(), line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader(stderr, sink.clone(), line_tx.clone()));
    }
    drop(line_tx);

    let status = match child.wait().await {
        Ok(status) => status,
        Err(error) => {
            sink.append(
                &format!("\nERROR: failed to wait on child: {error}\n"),
                Some(LineTag::Err),
            );
            return None;
        }
    };

    // Both pipes must be fully drained before the transcript is assembled.
    for reader in readers {
        let _ = reader.await;
    }
    let mut lines = Vec::new();
    while let Ok(line) = line_rx.try_recv() {
        lines.push(line);
    }

    // Killed by signal: no code to preserve, classify as failure.
    let code = status.code().unwrap_or(-1);
    let result = JobResult::new(code, lines);
    let (verdict, tag) = if result.success {
        (format!("\n[RC={code}] OK (<{EXIT_FAILURE_THRESHOLD})\n"), LineTag::Ok)
    } else {
        (
            format!("\n[RC={code}] FAILED (>={EXIT_FAILURE_THRESHOLD})\n"),
            LineTag::Err,
        )
    };
    sink.append(&verdict, Some(tag));

    Some(result)
}

fn spawn_line_reader<R>(
    stream: R,
    sink: Arc<dyn OutputSink>,
    line_tx: UnboundedSender<String>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            sink.append(&format!("{line}\n"), None);
            let _ = line_tx.send(line);
        }
    })
}
