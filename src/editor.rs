use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{EditorError, Result};
use crate::key::{self, ctrl, Direction, Key, BACKSPACE};
use crate::row::Row;
use crate::terminal::ByteSource;

/// Longest status message kept, in bytes.
const STATUS_MSG_MAX: usize = 80;

/// What the main loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// All editor state. One value, owned by the main loop.
pub struct Editor {
    pub(crate) cx: usize,
    pub(crate) cy: usize,
    pub(crate) rx: usize,
    pub(crate) rowoff: usize,
    pub(crate) coloff: usize,
    pub(crate) screen_rows: usize,
    pub(crate) screen_cols: usize,
    pub(crate) rows: Vec<Row>,
    pub(crate) dirty: usize,
    pub(crate) filename: Option<PathBuf>,
    pub(crate) status_msg: String,
    pub(crate) status_msg_time: Option<Instant>,
    quit_times: u32,
    pub(crate) config: Config,
}

impl Editor {
    /// Creates an empty editor for a terminal of `rows` x `cols`. Two rows
    /// are kept back for the status and message bars.
    pub fn new(rows: usize, cols: usize, config: Config) -> Self {
        Editor {
            cx: 0,
            cy: 0,
            rx: 0,
            rowoff: 0,
            coloff: 0,
            screen_rows: rows.saturating_sub(2).max(1),
            screen_cols: cols.max(1),
            rows: Vec::new(),
            dirty: 0,
            filename: None,
            status_msg: String::new(),
            status_msg_time: None,
            quit_times: config.quit_times,
            config,
        }
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cx, self.cy)
    }

    pub fn render_cursor_x(&self) -> usize {
        self.rx
    }

    pub fn offsets(&self) -> (usize, usize) {
        (self.rowoff, self.coloff)
    }

    pub fn screen_size(&self) -> (usize, usize) {
        (self.screen_rows, self.screen_cols)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn dirty(&self) -> usize {
        self.dirty
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, path: impl Into<PathBuf>) {
        self.filename = Some(path.into());
    }

    pub fn status_message(&self) -> &str {
        &self.status_msg
    }

    pub fn quit_times_left(&self) -> u32 {
        self.quit_times
    }

    pub fn set_status_message(&mut self, msg: impl Into<String>) {
        let mut msg = msg.into();
        if msg.len() > STATUS_MSG_MAX {
            let mut end = STATUS_MSG_MAX;
            while !msg.is_char_boundary(end) {
                end -= 1;
            }
            msg.truncate(end);
        }
        self.status_msg = msg;
        self.status_msg_time = Some(Instant::now());
    }

    /// Whether the status message is still inside its display window.
    pub(crate) fn status_visible(&self, now: Instant) -> bool {
        let timeout = Duration::from_secs(self.config.message_timeout_seconds);
        match self.status_msg_time {
            Some(set_at) => {
                !self.status_msg.is_empty() && now.saturating_duration_since(set_at) < timeout
            }
            None => false,
        }
    }

    // Row edits

    pub fn append_row(&mut self, chars: &[u8]) {
        self.rows.push(Row::new(chars, self.config.tab_stop));
        self.dirty += 1;
    }

    fn insert_char(&mut self, c: u8) {
        let tab_stop = self.config.tab_stop;
        // Typing past the last row grows the file; the new row and its first
        // byte count as one change.
        if self.cy == self.rows.len() {
            self.rows.push(Row::new(Vec::new(), tab_stop));
        }
        self.rows[self.cy].insert_char(self.cx, c, tab_stop);
        self.dirty += 1;
        self.cx += 1;
    }

    /// Deletes the byte left of the cursor, within the current row only.
    fn delete_char(&mut self) {
        if self.cy == self.rows.len() || self.cx == 0 {
            return;
        }
        let tab_stop = self.config.tab_stop;
        if self.rows[self.cy].delete_char(self.cx - 1, tab_stop) {
            self.dirty += 1;
            self.cx -= 1;
        }
    }

    // File I/O

    /// Replaces the buffer with the contents of `path`.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let file_err = |source: io::Error| EditorError::FileIo {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = BufReader::new(File::open(path).map_err(file_err)?);
        self.filename = Some(path.to_path_buf());
        self.rows.clear();
        self.cx = 0;
        self.cy = 0;

        let mut line = Vec::new();
        let mut bytes = 0;
        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line).map_err(file_err)?;
            if n == 0 {
                break;
            }
            bytes += n;
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            self.append_row(&line);
        }
        self.dirty = 0;

        tracing::info!(target: "io", file = %path.display(), bytes, rows = self.rows.len(), "file_opened");
        Ok(())
    }

    /// Every row followed by a newline.
    pub fn rows_to_bytes(&self) -> Vec<u8> {
        let len = self.rows.iter().map(|row| row.len() + 1).sum();
        let mut buf = Vec::with_capacity(len);
        for row in &self.rows {
            buf.extend_from_slice(row.chars());
            buf.push(b'\n');
        }
        buf
    }

    /// Writes the buffer to its file. Failures only show up in the message
    /// bar; `dirty` is kept so the save can be retried.
    pub fn save(&mut self) {
        let Some(path) = self.filename.clone() else {
            return;
        };

        let payload = self.rows_to_bytes();
        match write_atomically(&path, &payload) {
            Ok(()) => {
                self.dirty = 0;
                self.set_status_message(format!("{} bytes written to disk", payload.len()));
                tracing::info!(target: "io", file = %path.display(), bytes = payload.len(), "file_saved");
            }
            Err(e) => {
                self.set_status_message(format!("Can't save ! I/O error : {}", e));
                tracing::warn!(target: "io", file = %path.display(), error = %e, "file_save_failed");
            }
        }
    }

    // Viewport

    /// Moves the viewport so the cursor is on screen.
    pub fn scroll(&mut self) {
        self.rx = match self.rows.get(self.cy) {
            Some(row) => row.cx_to_rx(self.cx, self.config.tab_stop),
            None => 0,
        };

        // Pull the viewport just far enough to contain (rx, cy).
        if self.cy < self.rowoff {
            self.rowoff = self.cy;
        }
        if self.cy >= self.rowoff + self.screen_rows {
            self.rowoff = self.cy - self.screen_rows + 1;
        }
        // Same horizontally, in render columns so tabs count at full width.
        if self.rx < self.coloff {
            self.coloff = self.rx;
        }
        if self.rx >= self.coloff + self.screen_cols {
            self.coloff = self.rx - self.screen_cols + 1;
        }
    }

    // Input

    fn move_cursor(&mut self, direction: Direction) {
        let row_len = self.rows.get(self.cy).map(Row::len);

        match direction {
            Direction::Left => {
                if self.cx > 0 {
                    self.cx -= 1;
                } else if self.cy > 0 {
                    self.cy -= 1;
                    self.cx = self.rows[self.cy].len();
                }
            }
            Direction::Right => {
                if let Some(len) = row_len {
                    if self.cx < len {
                        self.cx += 1;
                    } else if self.cx == len {
                        self.cy += 1;
                        self.cx = 0;
                    }
                }
            }
            Direction::Up => {
                if self.cy > 0 {
                    self.cy -= 1;
                }
            }
            Direction::Down => {
                if self.cy < self.rows.len() {
                    self.cy += 1;
                }
            }
        }

        self.snap_cursor();
    }

    /// Pulls `cx` back inside the current row (to 0 past the last row).
    fn snap_cursor(&mut self) {
        let row_len = self.rows.get(self.cy).map_or(0, Row::len);
        if self.cx > row_len {
            self.cx = row_len;
        }
    }

    /// Applies one key to the editor state.
    pub fn process_key(&mut self, key: Key) -> KeyOutcome {
        tracing::trace!(target: "input", ?key, "key");

        match key {
            Key::Byte(b) if b == ctrl(b'q') => {
                // Counts presses still needed; a clean buffer quits on the first.
                self.quit_times = self.quit_times.saturating_sub(1);
                if self.dirty > 0 && self.quit_times > 0 {
                    self.set_status_message(format!(
                        "WARNING!! File has unsaved changes. Press Ctrl-Q {} more times to quit.",
                        self.quit_times
                    ));
                    tracing::debug!(target: "input", left = self.quit_times, "quit_blocked_dirty");
                    return KeyOutcome::Continue;
                }
                return KeyOutcome::Quit;
            }
            // Enter is not an edit; rows are only split by loading a file.
            Key::Byte(b'\r') => {}
            Key::Byte(b) if b == ctrl(b's') => self.save(),
            Key::Home => self.cx = 0,
            Key::End => {
                if let Some(row) = self.rows.get(self.cy) {
                    self.cx = row.len();
                }
            }
            Key::Byte(BACKSPACE) => self.delete_char(),
            Key::Byte(b) if b == ctrl(b'h') => self.delete_char(),
            Key::Del => {
                self.move_cursor(Direction::Right);
                self.delete_char();
            }
            // Page keys jump to the viewport edge; scroll() does the rest.
            Key::PageUp => {
                self.cy = self.rowoff;
                self.snap_cursor();
            }
            Key::PageDown => {
                self.cy = (self.rowoff + self.screen_rows - 1).min(self.rows.len());
                self.snap_cursor();
            }
            Key::Arrow(direction) => self.move_cursor(direction),
            // Ctrl-L: the next frame redraws everything anyway.
            Key::Byte(b) if b == ctrl(b'l') => {}
            Key::Esc => {}
            Key::Byte(b) => self.insert_char(b),
        }

        // Any other key cancels a pending quit.
        self.quit_times = self.config.quit_times;
        KeyOutcome::Continue
    }

    // Main loop

    /// Draws, waits for a key, handles it; until the user quits.
    pub fn run<S, W>(&mut self, input: &mut S, out: &mut W) -> Result<()>
    where
        S: ByteSource + ?Sized,
        W: Write,
    {
        loop {
            self.refresh_screen(out, Instant::now())?;
            let pressed = key::read_key(input)?;
            if self.process_key(pressed) == KeyOutcome::Quit {
                queue!(out, Clear(ClearType::All), MoveTo(0, 0))
                    .and_then(|()| out.flush())
                    .map_err(|e| EditorError::terminal("write", e))?;
                tracing::info!(target: "runtime", dirty = self.dirty, "quit");
                return Ok(());
            }
        }
    }
}

/// Replaces `path` with `payload` through a sibling temp file, so a failed
/// write never leaves the target half-written.
fn write_atomically(path: &Path, payload: &[u8]) -> io::Result<()> {
    // Follow symlinks so the file they point at is what gets replaced,
    // not the link itself. A target that doesn't exist yet stays as given.
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e),
    };

    // Renaming only needs a writable directory, so check the file itself.
    let existing = match fs::metadata(&target) {
        Ok(meta) => {
            if meta.permissions().readonly() {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "file is read-only",
                ));
            }
            OpenOptions::new().write(true).open(&target)?;
            Some(meta.permissions())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(payload)?;
    tmp.as_file().sync_all()?;
    // Existing files keep their mode; new ones get what a plain create would.
    if let Some(perms) = existing.or_else(new_file_permissions) {
        tmp.as_file().set_permissions(perms)?;
    }
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

/// 0644 filtered through the process umask, like `open(O_CREAT, 0644)`.
#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    // SAFETY: umask has no memory effects; it is read by setting and
    // immediately putting back the previous value.
    let mask = unsafe {
        let mask = libc::umask(0o022);
        libc::umask(mask);
        mask
    };
    Some(fs::Permissions::from_mode(0o644 & !u32::from(mask)))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}
