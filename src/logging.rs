use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "textedit.log";

/// Directory the log file lives in.
pub fn log_dir() -> PathBuf {
    let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("textedit");
    path
}

/// Installs a file logger filtered by `TEXTEDIT_LOG` (default `info`).
///
/// The terminal belongs to the editor, so nothing is ever logged to
/// stdout or stderr. Returns `None` when logging could not be set up; the
/// guard must be held until exit so buffered lines get written.
pub fn init() -> Option<WorkerGuard> {
    let dir = log_dir();
    if std::fs::create_dir_all(&dir).is_err() {
        return None;
    }

    let filter = EnvFilter::try_from_env("TEXTEDIT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|()| guard)
}

/// Logs panics before handing over to the default hook.
pub fn install_panic_hook() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(target: "runtime.panic", %info, "panic");
        default_panic(info);
    }));
}
