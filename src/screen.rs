//! Frame composition.
//!
//! A frame is the text area, then the inverted status bar, then the message
//! bar, built in an [`AppendBuffer`] and written out in one go.

use std::io::{self, Write};
use std::time::Instant;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Attribute, SetAttribute},
    terminal::{Clear, ClearType},
};

use crate::abuf::AppendBuffer;
use crate::editor::Editor;
use crate::error::{EditorError, Result};

const FILENAME_MAX: usize = 20;

pub fn welcome_message() -> String {
    format!("Text Editor -- version {}", env!("CARGO_PKG_VERSION"))
}

impl Editor {
    /// Scrolls, composes a frame for `now` and writes it to `out`.
    pub fn refresh_screen<W: Write>(&mut self, out: &mut W, now: Instant) -> Result<()> {
        self.scroll();

        let mut ab = AppendBuffer::new();
        self.compose_frame(&mut ab, now)
            .and_then(|()| ab.flush_to(out))
            .map_err(|e| EditorError::terminal("write", e))
    }

    fn compose_frame(&self, ab: &mut AppendBuffer, now: Instant) -> io::Result<()> {
        // Hidden while drawing so the cursor doesn't flicker across the frame.
        queue!(ab, Hide, MoveTo(0, 0))?;

        self.draw_rows(ab)?;
        self.draw_status_bar(ab)?;
        self.draw_message_bar(ab, now)?;

        // scroll() keeps the cursor inside the viewport, so these can't underflow.
        let screen_y = self.cy - self.rowoff;
        let screen_x = self.rx - self.coloff;
        queue!(ab, MoveTo(screen_x as u16, screen_y as u16), Show)?;
        Ok(())
    }

    fn draw_rows(&self, ab: &mut AppendBuffer) -> io::Result<()> {
        for y in 0..self.screen_rows {
            let file_row = y + self.rowoff;
            match self.rows.get(file_row) {
                Some(row) => {
                    // Horizontal slice of the rendered line; empty past its end.
                    let render = row.render();
                    let start = self.coloff.min(render.len());
                    let end = (self.coloff + self.screen_cols).min(render.len());
                    ab.append(&render[start..end]);
                }
                // Banner only on an empty buffer, a third of the way down.
                None if self.rows.is_empty() && y == self.screen_rows / 3 => {
                    self.draw_welcome(ab);
                }
                None => ab.append(b"~"),
            }

            // Erase leftovers from the previous frame instead of clearing the screen.
            queue!(ab, Clear(ClearType::UntilNewLine))?;
            ab.append(b"\r\n");
        }
        Ok(())
    }

    fn draw_welcome(&self, ab: &mut AppendBuffer) {
        let welcome = welcome_message();
        let welcome = &welcome.as_bytes()[..welcome.len().min(self.screen_cols)];

        let mut padding = (self.screen_cols - welcome.len()) / 2;
        if padding > 0 {
            ab.append(b"~");
            padding -= 1;
        }
        ab.append(" ".repeat(padding).as_bytes());
        ab.append(welcome);
    }

    fn draw_status_bar(&self, ab: &mut AppendBuffer) -> io::Result<()> {
        queue!(ab, SetAttribute(Attribute::Reverse))?;

        let name: String = match &self.filename {
            Some(path) => path.to_string_lossy().chars().take(FILENAME_MAX).collect(),
            None => "[No Name]".to_string(),
        };
        let modified = if self.dirty > 0 { "(modified)" } else { "" };
        let status = format!("{} - {} lines {}", name, self.rows.len(), modified);
        let rstatus = format!("{}/{}", self.cy + 1, self.rows.len());

        // Left part is cut at the screen edge. Pad with spaces until the
        // right part fits exactly against the edge; if it never does, the
        // bar is just left part and padding.
        let status = status.as_bytes();
        let mut len = status.len().min(self.screen_cols);
        ab.append(&status[..len]);
        while len < self.screen_cols {
            if self.screen_cols - len == rstatus.len() {
                ab.append(rstatus.as_bytes());
                break;
            }
            ab.append(b" ");
            len += 1;
        }

        queue!(ab, SetAttribute(Attribute::Reset))?;
        // Leaves the last line for the message bar.
        ab.append(b"\r\n");
        Ok(())
    }

    fn draw_message_bar(&self, ab: &mut AppendBuffer, now: Instant) -> io::Result<()> {
        queue!(ab, Clear(ClearType::UntilNewLine))?;
        if self.status_visible(now) {
            let msg = self.status_msg.as_bytes();
            ab.append(&msg[..msg.len().min(self.screen_cols)]);
        }
        Ok(())
    }
}
