//! Argument composition for the external mirroring tool.
//!
//! The composer is pure: it maps a source, a destination, and a list of
//! operation-specific flags to a single ordered argument vector. Flag
//! semantics are never validated here; conflict resolution belongs to the
//! tool itself.

use std::path::Path;

/// External tool name, resolved through PATH at spawn time.
pub const TOOL: &str = "robocopy";

/// The robocopy flag catalog.
///
/// Operations pick from this namespace; ad-hoc callers may compose any of
/// these directly through [`compose`].
pub mod flags {
    // Copy scope
    pub const COPY_SUBDIRS: &str = "/E";
    pub const COPY_SUBDIRS_NONEMPTY: &str = "/S";
    pub const MIRROR: &str = "/MIR";
    pub const CREATE_STRUCTURE_ONLY: &str = "/CREATE";
    pub const COPY_FLAGS: &str = "/COPY:DATSO";
    pub const DCOPY_TIME: &str = "/DCOPY:T";

    // Safe synchronization
    pub const PURGE: &str = "/PURGE";
    pub const EXCLUDE_EXTRA: &str = "/XX";
    pub const EXCLUDE_SAME: &str = "/XC";
    pub const EXCLUDE_NEWER: &str = "/XN";
    pub const EXCLUDE_OLDER: &str = "/XO";

    // Filters (value appended after the prefix, no space)
    pub const EXCLUDE_FILES: &str = "/XF";
    pub const EXCLUDE_DIRS: &str = "/XD";
    pub const MAXAGE: &str = "/MAXAGE:";
    pub const MINAGE: &str = "/MINAGE:";
    pub const MAXSIZE: &str = "/MAX:";
    pub const MINSIZE: &str = "/MIN:";

    // Performance
    pub const MULTITHREAD: &str = "/MT:";
    pub const RETRIES: &str = "/R:";
    pub const WAIT: &str = "/W:";
    pub const FILE_TIME_TOLERANCE: &str = "/FFT";

    // Output and logging
    pub const NO_PROGRESS: &str = "/NP";
    pub const NO_FILE_LIST: &str = "/NFL";
    pub const NO_DIR_LIST: &str = "/NDL";
    pub const TEE: &str = "/TEE";
    pub const LOG: &str = "/LOG:";
    pub const LOG_APPEND: &str = "/LOG+:";

    // Dry run
    pub const LIST_ONLY: &str = "/L";
    pub const VERBOSE: &str = "/V";

    // Links
    pub const EXCLUDE_JUNCTIONS: &str = "/XJ";
    pub const COPY_LINK_TARGETS: &str = "/SL";
}

/// The fixed baseline applied to every invocation regardless of operation:
/// data/attribute/timestamp/security/owner copy, folder timestamps, 3
/// retries with a 5 second wait, 16 worker threads, FAT time tolerance,
/// junction exclusion, no per-file progress, console output duplicated into
/// any tool-side log.
pub const BASE_ARGS: &[&str] = &[
    flags::COPY_FLAGS,
    flags::DCOPY_TIME,
    "/R:3",
    "/W:5",
    "/MT:16",
    flags::FILE_TIME_TOLERANCE,
    flags::EXCLUDE_JUNCTIONS,
    flags::NO_PROGRESS,
    flags::TEE,
];

/// Build the full argument vector: tool name, source, destination, the
/// baseline set in fixed order, then `extra` in the order given.
pub fn compose(source: &Path, destination: &Path, extra: &[String]) -> Vec<String> {
    let mut argv = Vec::with_capacity(3 + BASE_ARGS.len() + extra.len());
    argv.push(TOOL.to_string());
    argv.push(source.display().to_string());
    argv.push(destination.display().to_string());
    argv.extend(BASE_ARGS.iter().map(|f| f.to_string()));
    argv.extend(extra.iter().cloned());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operation;

    #[test]
    fn baseline_precedes_extras_in_fixed_order() {
        let extras = vec!["/E".to_string(), "/XO".to_string()];
        let argv = compose(Path::new("/data/src"), Path::new("/data/dst"), &extras);

        assert_eq!(argv[0], TOOL);
        assert_eq!(argv[1], "/data/src");
        assert_eq!(argv[2], "/data/dst");
        assert_eq!(&argv[3..3 + BASE_ARGS.len()], BASE_ARGS);
        assert_eq!(&argv[3 + BASE_ARGS.len()..], &["/E", "/XO"]);
    }

    #[test]
    fn compose_is_deterministic() {
        let extras = vec!["/MIR".to_string(), "/XX".to_string()];
        let a = compose(Path::new("/a"), Path::new("/b"), &extras);
        let b = compose(Path::new("/a"), Path::new("/b"), &extras);
        assert_eq!(a, b);
    }

    #[test]
    fn conflicting_flags_are_composed_verbatim() {
        // Conflict resolution is the tool's job, not ours.
        let extras = vec!["/MIR".to_string(), "/XC".to_string()];
        let argv = compose(Path::new("/a"), Path::new("/b"), &extras);
        assert!(argv.contains(&"/MIR".to_string()));
        assert!(argv.contains(&"/XC".to_string()));
    }

    #[test]
    fn incremental_since_seven_days_scenario() {
        let op = Operation::RecentSince { days: 7 };
        let argv = compose(
            Path::new("/data/proj"),
            Path::new("/backup/proj"),
            &op.extra_args(),
        );
        for base in BASE_ARGS {
            assert!(argv.contains(&base.to_string()), "missing baseline {base}");
        }
        assert!(argv.contains(&"/E".to_string()));
        assert!(argv.contains(&"/MAXAGE:7".to_string()));
    }
}
