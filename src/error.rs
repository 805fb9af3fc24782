use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong in the editor.
///
/// Terminal and load failures are fatal and travel up to `main`. Save
/// failures never show up here: they end up in the message bar instead.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("terminal I/O failed ({op}): {source}")]
    TerminalIo {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("cannot open {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot write config {}: {reason}", path.display())]
    ConfigWrite { path: PathBuf, reason: String },
}

impl EditorError {
    pub fn terminal(op: &'static str, source: io::Error) -> Self {
        EditorError::TerminalIo { op, source }
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
