//! Keypress decoding.
//!
//! Plain bytes pass through untouched; escape sequences for the cursor and
//! navigation keys are folded into dedicated variants so the dispatcher can
//! match exhaustively.

use std::io;

use crate::error::{EditorError, Result};
use crate::terminal::ByteSource;

pub const ESC: u8 = 0x1b;
pub const BACKSPACE: u8 = 127;

/// The byte a terminal sends for Ctrl plus `k`.
pub const fn ctrl(k: u8) -> u8 {
    k & 0x1f
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Byte(u8),
    Arrow(Direction),
    Home,
    End,
    Del,
    PageUp,
    PageDown,
    /// A lone escape, or a sequence we don't understand.
    Esc,
}

/// Blocks until one key is available and decodes it.
pub fn read_key<S: ByteSource + ?Sized>(input: &mut S) -> Result<Key> {
    let read_err = |e: io::Error| EditorError::terminal("read", e);

    let first = loop {
        if let Some(b) = input.read_byte().map_err(read_err)? {
            break b;
        }
    };

    if first != ESC {
        return Ok(Key::Byte(first));
    }

    let Some(seq0) = input.read_byte().map_err(read_err)? else {
        return Ok(Key::Esc);
    };
    let Some(seq1) = input.read_byte().map_err(read_err)? else {
        return Ok(Key::Esc);
    };

    let key = match (seq0, seq1) {
        (b'[', digit @ b'0'..=b'9') => match input.read_byte().map_err(read_err)? {
            Some(b'~') => tilde_key(digit),
            _ => Key::Esc,
        },
        (b'[', b'A') => Key::Arrow(Direction::Up),
        (b'[', b'B') => Key::Arrow(Direction::Down),
        (b'[', b'C') => Key::Arrow(Direction::Right),
        (b'[', b'D') => Key::Arrow(Direction::Left),
        (b'[' | b'O', b'H') => Key::Home,
        (b'[' | b'O', b'F') => Key::End,
        _ => Key::Esc,
    };

    if key == Key::Esc {
        tracing::trace!(target: "input", seq0, seq1, "unknown_escape_sequence");
    }
    Ok(key)
}

fn tilde_key(digit: u8) -> Key {
    match digit {
        b'1' | b'7' => Key::Home,
        b'3' => Key::Del,
        b'4' | b'8' => Key::End,
        b'5' => Key::PageUp,
        b'6' => Key::PageDown,
        _ => Key::Esc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// `None` entries stand for a read that timed out.
    struct Script(VecDeque<Option<u8>>);

    impl Script {
        fn bytes(bytes: &[u8]) -> Self {
            Script(bytes.iter().map(|&b| Some(b)).collect())
        }
    }

    impl ByteSource for Script {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            self.0
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }
    }

    fn decode(bytes: &[u8]) -> Key {
        read_key(&mut Script::bytes(bytes)).unwrap()
    }

    #[test]
    fn plain_bytes_pass_through() {
        assert_eq!(decode(b"a"), Key::Byte(b'a'));
        assert_eq!(decode(&[BACKSPACE]), Key::Byte(127));
        assert_eq!(decode(&[ctrl(b'q')]), Key::Byte(17));
    }

    #[test]
    fn arrows() {
        assert_eq!(decode(b"\x1b[A"), Key::Arrow(Direction::Up));
        assert_eq!(decode(b"\x1b[B"), Key::Arrow(Direction::Down));
        assert_eq!(decode(b"\x1b[C"), Key::Arrow(Direction::Right));
        assert_eq!(decode(b"\x1b[D"), Key::Arrow(Direction::Left));
    }

    #[test]
    fn home_and_end_variants() {
        for seq in [&b"\x1b[H"[..], b"\x1bOH", b"\x1b[1~", b"\x1b[7~"] {
            assert_eq!(decode(seq), Key::Home, "{seq:?}");
        }
        for seq in [&b"\x1b[F"[..], b"\x1bOF", b"\x1b[4~", b"\x1b[8~"] {
            assert_eq!(decode(seq), Key::End, "{seq:?}");
        }
    }

    #[test]
    fn tilde_keys() {
        assert_eq!(decode(b"\x1b[3~"), Key::Del);
        assert_eq!(decode(b"\x1b[5~"), Key::PageUp);
        assert_eq!(decode(b"\x1b[6~"), Key::PageDown);
    }

    #[test]
    fn unknown_sequences_are_bare_escape() {
        assert_eq!(decode(b"\x1b[Z"), Key::Esc);
        assert_eq!(decode(b"\x1b[2~"), Key::Esc);
        assert_eq!(decode(b"\x1b[5x"), Key::Esc);
        assert_eq!(decode(b"\x1bxy"), Key::Esc);
    }

    #[test]
    fn short_read_after_escape_is_bare_escape() {
        let mut lone = Script(VecDeque::from([Some(ESC), None]));
        assert_eq!(read_key(&mut lone).unwrap(), Key::Esc);

        let mut half = Script(VecDeque::from([Some(ESC), Some(b'['), None, Some(b'A')]));
        assert_eq!(read_key(&mut half).unwrap(), Key::Esc);
        // The stray byte is left for the next key.
        assert_eq!(read_key(&mut half).unwrap(), Key::Byte(b'A'));
    }

    #[test]
    fn timeouts_before_a_key_are_skipped() {
        let mut input = Script(VecDeque::from([None, None, Some(b'x')]));
        assert_eq!(read_key(&mut input).unwrap(), Key::Byte(b'x'));
    }

    #[test]
    fn read_failure_is_a_terminal_error() {
        let err = read_key(&mut Script(VecDeque::new())).unwrap_err();
        assert!(matches!(err, EditorError::TerminalIo { op: "read", .. }));
    }
}
