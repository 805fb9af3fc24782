//! Raw-mode terminal plumbing: attribute guard, byte input, window size.

use std::io::{self, Read, Write};
use std::mem::MaybeUninit;

use crossterm::cursor::{MoveDown, MoveRight};
use crossterm::queue;

use crate::error::{EditorError, Result};

/// Source of single input bytes.
///
/// `Ok(None)` means the read timed out without data. Callers that need a
/// byte keep asking; callers decoding a sequence treat it as "no more".
pub trait ByteSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Stdin under raw mode: every read waits at most one VTIME tick.
#[derive(Debug, Default)]
pub struct StdinSource;

impl StdinSource {
    pub fn new() -> Self {
        StdinSource
    }
}

impl ByteSource for StdinSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Keeps the terminal in raw mode for as long as it is alive.
///
/// The attributes captured on entry are put back by [`RawMode::restore`]
/// or, failing that, on drop (which also covers unwinding panics).
pub struct RawMode {
    original: Option<libc::termios>,
}

impl RawMode {
    pub fn enable() -> Result<Self> {
        let fd = libc::STDIN_FILENO;
        let mut original = MaybeUninit::<libc::termios>::uninit();

        // SAFETY: tcgetattr fully initializes the struct when it returns 0.
        let original = unsafe {
            if libc::tcgetattr(fd, original.as_mut_ptr()) == -1 {
                return Err(EditorError::terminal("tcgetattr", io::Error::last_os_error()));
            }
            original.assume_init()
        };

        let raw = make_raw(original);
        set_attributes(&raw).map_err(|e| EditorError::terminal("tcsetattr", e))?;
        tracing::debug!(target: "terminal", "raw_mode_enabled");

        Ok(RawMode {
            original: Some(original),
        })
    }

    /// Puts the original attributes back and reports failure.
    pub fn restore(mut self) -> Result<()> {
        match self.original.take() {
            Some(original) => {
                set_attributes(&original).map_err(|e| EditorError::terminal("tcsetattr", e))?;
                tracing::debug!(target: "terminal", "raw_mode_disabled");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(e) = set_attributes(&original) {
                tracing::error!(target: "terminal", error = %e, "raw_mode_restore_failed");
            }
        }
    }
}

/// Raw-mode attributes derived from `original`: no echo, no canonical
/// input, no signals or flow control, no output processing, 8-bit chars,
/// and reads that return after 100 ms with or without a byte.
fn make_raw(original: libc::termios) -> libc::termios {
    let mut raw = original;
    raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
    raw.c_oflag &= !libc::OPOST;
    raw.c_cflag |= libc::CS8;
    raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
    raw.c_cc[libc::VMIN] = 0;
    raw.c_cc[libc::VTIME] = 1;
    raw
}

fn set_attributes(attrs: &libc::termios) -> io::Result<()> {
    // SAFETY: `attrs` points to a valid termios for the duration of the call.
    if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, attrs) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Returns `(rows, cols)` of the terminal.
///
/// Asks the platform first. When that fails, pushes the cursor to the
/// bottom-right corner and reads back where it landed.
pub fn window_size<W, S>(out: &mut W, input: &mut S) -> Result<(usize, usize)>
where
    W: Write,
    S: ByteSource + ?Sized,
{
    match crossterm::terminal::size() {
        Ok((cols, rows)) if cols > 0 && rows > 0 => Ok((rows as usize, cols as usize)),
        other => {
            tracing::debug!(target: "terminal", result = ?other, "size_query_fallback");
            size_from_cursor_report(out, input)
        }
    }
}

/// Measures the screen through a cursor position report.
pub fn size_from_cursor_report<W, S>(out: &mut W, input: &mut S) -> Result<(usize, usize)>
where
    W: Write,
    S: ByteSource + ?Sized,
{
    let io_err = |e: io::Error| EditorError::terminal("cursor position report", e);

    queue!(out, MoveRight(999), MoveDown(999)).map_err(io_err)?;
    out.write_all(b"\x1b[6n").map_err(io_err)?;
    out.flush().map_err(io_err)?;

    let mut reply = Vec::with_capacity(32);
    while reply.len() < 32 {
        match input.read_byte().map_err(io_err)? {
            Some(b'R') | None => break,
            Some(b) => reply.push(b),
        }
    }

    parse_cursor_report(&reply).ok_or_else(|| {
        io_err(io::Error::new(
            io::ErrorKind::InvalidData,
            "malformed cursor position report",
        ))
    })
}

/// Parses `ESC [ rows ; cols` (the trailing `R` already stripped).
pub fn parse_cursor_report(reply: &[u8]) -> Option<(usize, usize)> {
    let body = reply.strip_prefix(b"\x1b[")?;
    let body = std::str::from_utf8(body).ok()?;
    let (rows, cols) = body.split_once(';')?;
    let rows = rows.parse::<usize>().ok()?;
    let cols = cols.parse::<usize>().ok()?;
    Some((rows, cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Script(VecDeque<u8>);

    impl ByteSource for Script {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            Ok(self.0.pop_front())
        }
    }

    #[test]
    fn make_raw_clears_cooked_flags() {
        // SAFETY: termios is plain data; all-zero is a valid value.
        let mut cooked: libc::termios = unsafe { std::mem::zeroed() };
        cooked.c_iflag = !0;
        cooked.c_oflag = !0;
        cooked.c_lflag = !0;
        cooked.c_cc[libc::VMIN] = 1;
        cooked.c_cc[libc::VTIME] = 0;

        let raw = make_raw(cooked);

        for flag in [libc::BRKINT, libc::ICRNL, libc::INPCK, libc::ISTRIP, libc::IXON] {
            assert_eq!(raw.c_iflag & flag, 0, "iflag {flag:#o}");
        }
        assert_eq!(raw.c_oflag & libc::OPOST, 0);
        for flag in [libc::ECHO, libc::ICANON, libc::IEXTEN, libc::ISIG] {
            assert_eq!(raw.c_lflag & flag, 0, "lflag {flag:#o}");
        }
        assert_eq!(raw.c_cflag & libc::CS8, libc::CS8);
        assert_eq!(raw.c_cc[libc::VMIN], 0);
        assert_eq!(raw.c_cc[libc::VTIME], 1);
    }

    #[test]
    fn make_raw_leaves_unrelated_bits_alone() {
        // SAFETY: termios is plain data; all-zero is a valid value.
        let mut cooked: libc::termios = unsafe { std::mem::zeroed() };
        cooked.c_iflag = libc::IXANY | libc::ICRNL;
        cooked.c_lflag = libc::ECHOE | libc::ECHO;

        let raw = make_raw(cooked);

        assert_eq!(raw.c_iflag, libc::IXANY);
        assert_eq!(raw.c_lflag, libc::ECHOE);
    }

    #[test]
    fn parses_cursor_report() {
        assert_eq!(parse_cursor_report(b"\x1b[24;80"), Some((24, 80)));
        assert_eq!(parse_cursor_report(b"\x1b[24"), None);
        assert_eq!(parse_cursor_report(b"[24;80"), None);
        assert_eq!(parse_cursor_report(b"\x1b[x;80"), None);
    }

    #[test]
    fn cursor_report_fallback_reads_until_r() {
        let mut input = Script(b"\x1b[40;120Rzz".iter().copied().collect());
        let mut out = Vec::new();

        let size = size_from_cursor_report(&mut out, &mut input).unwrap();

        assert_eq!(size, (40, 120));
        assert_eq!(out, b"\x1b[999C\x1b[999B\x1b[6n");
        assert_eq!(input.0, VecDeque::from(b"zz".to_vec()));
    }

    #[test]
    fn silent_terminal_is_a_terminal_error() {
        let mut input = Script(VecDeque::new());
        let mut out = Vec::new();
        let err = size_from_cursor_report(&mut out, &mut input).unwrap_err();
        assert!(matches!(err, EditorError::TerminalIo { .. }));
    }
}
