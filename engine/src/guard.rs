//! Destructive-operation guard.
//!
//! Mirror and purge operations delete destination entries irreversibly, so
//! they are gated behind an explicit confirmation supplied by the caller.
//! The guard inspects nothing on disk; it only asks.

use std::path::Path;

use crate::model::Operation;

/// Caller-supplied confirmation for destructive operations.
///
/// The UI shows the source and destination and returns the user's decision.
pub trait ConfirmDestructive {
    fn confirm(&self, source: &Path, destination: &Path) -> bool;
}

/// Confirmation that always approves. For non-interactive callers that have
/// obtained consent elsewhere (e.g. a `--yes` flag).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmDestructive for AlwaysConfirm {
    fn confirm(&self, _source: &Path, _destination: &Path) -> bool {
        true
    }
}

/// Ask for confirmation if `operation` is destructive; pass through
/// otherwise. A `false` return means the run must be aborted with no
/// process spawned and no output produced. Declines are a no-op by design,
/// not an error.
pub fn clearance(
    operation: &Operation,
    source: &Path,
    destination: &Path,
    confirm: &dyn ConfirmDestructive,
) -> bool {
    if operation.is_destructive() {
        confirm.confirm(source, destination)
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Decline {
        asked: AtomicUsize,
    }

    impl ConfirmDestructive for Decline {
        fn confirm(&self, _source: &Path, _destination: &Path) -> bool {
            self.asked.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    #[test]
    fn non_destructive_operations_skip_the_prompt() {
        let decline = Decline {
            asked: AtomicUsize::new(0),
        };
        assert!(clearance(
            &Operation::IncrementalNoDelete,
            Path::new("/src"),
            Path::new("/dst"),
            &decline,
        ));
        assert_eq!(decline.asked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn declined_mirror_is_aborted() {
        let decline = Decline {
            asked: AtomicUsize::new(0),
        };
        assert!(!clearance(
            &Operation::Mirror,
            Path::new("/src"),
            Path::new("/dst"),
            &decline,
        ));
        assert_eq!(decline.asked.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn always_confirm_approves_purge() {
        assert!(clearance(
            &Operation::Purge,
            Path::new("/src"),
            Path::new("/dst"),
            &AlwaysConfirm,
        ));
    }
}
