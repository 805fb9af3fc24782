//! A small terminal text editor.
//!
//! The editor works on raw bytes. It reads keys from a raw-mode terminal,
//! keeps the file as a list of [`row::Row`]s and redraws the whole screen
//! after every key with a single write.

pub mod abuf;
pub mod config;
pub mod editor;
pub mod error;
pub mod key;
pub mod logging;
pub mod row;
pub mod screen;
pub mod terminal;

pub use config::Config;
pub use editor::{Editor, KeyOutcome};
pub use error::{EditorError, Result};
pub use key::{Direction, Key};
