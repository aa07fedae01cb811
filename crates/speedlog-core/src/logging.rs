//! Logging init: file under the XDG state dir, stderr for systemd or on request,
//! and a graceful fallback to stderr when the file can't be opened.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,speedlog=debug,speedlog_core=debug";

/// Set by systemd when stderr is connected to the journal.
const JOURNAL_ENV: &str = "JOURNAL_STREAM";

/// Where log output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    File(PathBuf),
    /// `journal`: lines go to journald, which stamps them itself, so ours carry no timestamp.
    Stderr { journal: bool },
}

/// Per-event writer: the shared log file, or stderr when the handle can't be cloned.
enum LogSink {
    File(fs::File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct SharedLogFile(fs::File);

impl<'a> MakeWriter<'a> for SharedLogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Path of the log file: `~/.local/state/speedlog/speedlog.log`.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("speedlog")?;
    Ok(xdg_dirs.get_state_home().join("speedlog.log"))
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir: {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file: {}", path.display()))
}

/// Stderr is used when asked for, or when systemd already captures it into the journal.
fn stderr_requested(
    force_stderr: bool,
    journal_stream: Option<std::ffi::OsString>,
) -> Option<bool> {
    let journal = journal_stream.is_some_and(|v| !v.is_empty());
    (force_stderr || journal).then_some(journal)
}

/// Install the global subscriber once, at process start.
///
/// Logs go to `~/.local/state/speedlog/speedlog.log` unless `force_stderr` is set or the
/// process runs under systemd with its stderr on the journal. An unwritable state dir
/// falls back to stderr with a warning instead of failing.
pub fn init(force_stderr: bool) -> LogDestination {
    if let Some(journal) = stderr_requested(force_stderr, std::env::var_os(JOURNAL_ENV)) {
        install_stderr(journal);
        return LogDestination::Stderr { journal };
    }
    match log_path().and_then(|path| open_log_file(&path).map(|file| (path, file))) {
        Ok((path, file)) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(BoxMakeWriter::new(SharedLogFile(file)))
                .with_ansi(false)
                .try_init();
            tracing::info!("speedlog logging initialized at {}", path.display());
            LogDestination::File(path)
        }
        Err(e) => {
            install_stderr(false);
            tracing::warn!("file logging unavailable, using stderr: {:#}", e);
            LogDestination::Stderr { journal: false }
        }
    }
}

fn install_stderr(journal: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false);
    let _ = if journal {
        builder.without_time().try_init()
    } else {
        builder.try_init()
    };
}
