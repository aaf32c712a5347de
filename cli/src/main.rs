//! Valkyria - Command-line interface for the backup job engine.
//!
//! Collects the inputs the engine expects (source, destination, operation,
//! optional integers), implements the output sink on stdout, asks for
//! confirmation before destructive operations, and optionally runs the
//! archive-and-encrypt pipeline on the destination after a successful copy.

use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine::{
    encrypt_dir_to_file, submit, ConfirmDestructive, LineTag, Operation, OutputSink,
};

/// Valkyria - robocopy backup jobs with live output and optional encryption
#[derive(Parser, Debug)]
#[command(name = "valkyria")]
#[command(version = "0.1.0")]
#[command(about = "Run backup jobs through robocopy with live output")]
struct Args {
    /// Source directory
    #[arg(long, value_name = "PATH")]
    src: PathBuf,

    /// Destination directory
    #[arg(long, value_name = "PATH")]
    dst: PathBuf,

    /// Operation: simple, subdirs, subdirs-skip-empty, incremental, recent,
    /// exclude-unchanged, structure, exclude-older-extra, mirror,
    /// mirror-exclude-extra, mirror-log, mirror-retry-wait, mirror-threads,
    /// purge, or compare
    #[arg(long, value_name = "NAME", default_value = "subdirs")]
    op: String,

    /// Day cutoff for the recent operation
    #[arg(long, value_name = "DAYS", value_parser = clap::value_parser!(u32).range(1..=3650))]
    days: Option<u32>,

    /// Retry count for mirror-retry-wait
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=1000))]
    retries: Option<u32>,

    /// Seconds between retries for mirror-retry-wait
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u32).range(1..=3600))]
    wait: Option<u32>,

    /// Worker thread count for mirror-threads
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=128))]
    threads: Option<u32>,

    /// Directory for the tool-side log of mirror-log (created if absent)
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Archive and encrypt the destination after a successful copy
    #[arg(long)]
    encrypt: bool,

    /// Existing key file to encrypt with (a new key is generated otherwise)
    #[arg(long, value_name = "PATH", requires = "encrypt")]
    key: Option<PathBuf>,

    /// Skip the destructive-operation confirmation prompt
    #[arg(long)]
    yes: bool,
}

/// Map the CLI selector and its parameters onto an engine operation.
fn build_operation(args: &Args) -> Result<Operation, String> {
    match args.op.as_str() {
        "simple" => Ok(Operation::Simple),
        "subdirs" => Ok(Operation::Subdirs),
        "subdirs-skip-empty" => Ok(Operation::SubdirsSkipEmpty),
        "incremental" => Ok(Operation::IncrementalNoDelete),
        "recent" => {
            let days = args.days.ok_or("--days is required for op 'recent'")?;
            Ok(Operation::RecentSince { days })
        }
        "exclude-unchanged" => Ok(Operation::ExcludeUnchanged),
        "structure" => Ok(Operation::StructureOnly),
        "exclude-older-extra" => Ok(Operation::ExcludeOlderAndExtra),
        "mirror" => Ok(Operation::Mirror),
        "mirror-exclude-extra" => Ok(Operation::MirrorExcludeExtra),
        "mirror-log" => {
            let dir = args
                .log_dir
                .as_deref()
                .ok_or("--log-dir is required for op 'mirror-log'")?;
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("cannot create log directory {}: {e}", dir.display()))?;
            Ok(Operation::MirrorLogged {
                log_file: Operation::default_log_file(dir),
            })
        }
        "mirror-retry-wait" => {
            let retries = args
                .retries
                .ok_or("--retries is required for op 'mirror-retry-wait'")?;
            let wait_secs = args
                .wait
                .ok_or("--wait is required for op 'mirror-retry-wait'")?;
            Ok(Operation::MirrorRetryWait { retries, wait_secs })
        }
        "mirror-threads" => {
            let threads = args
                .threads
                .ok_or("--threads is required for op 'mirror-threads'")?;
            Ok(Operation::MirrorThreads { threads })
        }
        "purge" => Ok(Operation::Purge),
        "compare" => Ok(Operation::Compare),
        other => Err(format!("unknown operation '{other}'")),
    }
}

/// Sink that writes one prefixed line per append to stdout. The single
/// locked write keeps chunks whole when jobs run concurrently.
struct StdoutSink;

impl OutputSink for StdoutSink {
    fn append(&self, text: &str, tag: Option<LineTag>) {
        let prefix = match tag {
            Some(LineTag::Cmd) => "[cmd] ",
            Some(LineTag::Ok) => "[ok] ",
            Some(LineTag::Err) => "[err] ",
            None => "",
        };
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{prefix}{}", text.trim_matches('\n'));
        let _ = out.flush();
    }
}

/// Interactive y/N prompt for mirror and purge operations.
struct PromptConfirm {
    assume_yes: bool,
}

impl ConfirmDestructive for PromptConfirm {
    fn confirm(&self, source: &Path, destination: &Path) -> bool {
        if self.assume_yes {
            return true;
        }
        eprintln!("You are about to run a DESTRUCTIVE operation:");
        eprintln!("  SOURCE:      {}", source.display());
        eprintln!("  DESTINATION: {}", destination.display());
        eprintln!("Destination entries missing from the source will be DELETED.");
        eprint!("Continue? [y/N] ");
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let operation = match build_operation(&args) {
        Ok(op) => op,
        Err(message) => {
            eprintln!("Error: {message}");
            std::process::exit(2);
        }
    };

    let sink = Arc::new(StdoutSink);
    let confirm = PromptConfirm { assume_yes: args.yes };

    let handle = match submit(&args.src, &args.dst, &operation, sink, &confirm) {
        Ok(handle) => handle,
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(2);
        }
    };
    let Some(handle) = handle else {
        eprintln!("Aborted: confirmation declined.");
        return;
    };

    let result = match handle.await {
        Ok(result) => result,
        Err(error) => {
            eprintln!("Error: job task failed: {error}");
            std::process::exit(1);
        }
    };
    // Launch failures were already reported through the sink.
    let Some(result) = result else {
        std::process::exit(1);
    };

    if result.success && args.encrypt {
        match encrypt_dir_to_file(&args.dst, &args.dst, args.key.as_deref()) {
            Ok(bundle) => {
                println!("[ok] Encrypted bundle: {}", bundle.encrypted_path.display());
                if let Some(key_path) = bundle.key_path {
                    println!(
                        "[ok] Key saved to: {} - store it somewhere safe.",
                        key_path.display()
                    );
                }
            }
            Err(error) => {
                eprintln!("[err] Encryption failed: {error}");
                std::process::exit(1);
            }
        }
    }

    if !result.success {
        std::process::exit(1);
    }
}
