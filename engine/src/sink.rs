//! Output sink contract.
//!
//! This module defines the OutputSink trait, which decouples the engine from
//! any specific UI technology (CLI, GUI, log capture, etc.). The runner
//! pushes three kinds of text through it: the echoed command line, raw tool
//! output, and the final status line.
//!
//! Multiple in-flight jobs may append concurrently; each append carries one
//! complete chunk of text so interleaving never splits a line.

/// Semantic tag attached to selected sink lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    /// The command line about to be executed
    Cmd,
    /// Final status line of a successful run
    Ok,
    /// Final status line of a failed run, or an engine-reported error
    Err,
}

/// Trait for receiving streamed job output.
///
/// Implementations must be safe to call from any task: appends from
/// concurrent jobs arrive unserialized and in arrival order per job.
pub trait OutputSink: Send + Sync {
    /// Append one chunk of text. `tag` is `None` for raw tool output.
    fn append(&self, text: &str, tag: Option<LineTag>);
}

/// Sink that accumulates everything in memory. Used by tests and by callers
/// that want the transcript after the fact.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: std::sync::Mutex<Vec<(String, Option<LineTag>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, Option<LineTag>)> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }
}

impl OutputSink for MemorySink {
    fn append(&self, text: &str, tag: Option<LineTag>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((text.to_string(), tag));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn memory_sink_preserves_order_and_tags() {
        let sink = MemorySink::new();
        sink.append("$ cmd\n", Some(LineTag::Cmd));
        sink.append("line\n", None);
        sink.append("[RC=0] OK (<8)\n", Some(LineTag::Ok));

        let entries = sink.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].1, Some(LineTag::Cmd));
        assert_eq!(entries[1].1, None);
        assert_eq!(entries[2].1, Some(LineTag::Ok));
    }

    #[test]
    fn appends_from_many_threads_never_tear() {
        let sink = Arc::new(MemorySink::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let sink = sink.clone();
            handles.push(std::thread::spawn(move || {
                for j in 0..50 {
                    sink.append(&format!("job{i}-line{j}\n"), None);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("writer thread");
        }
        let entries = sink.entries();
        assert_eq!(entries.len(), 8 * 50);
        // Every chunk arrived whole.
        for (text, _) in entries {
            assert!(text.starts_with("job"));
            assert!(text.ends_with('\n'));
        }
    }
}
