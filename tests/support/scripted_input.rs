use std::collections::VecDeque;
use std::io;

use textedit::terminal::ByteSource;

/// Replays a fixed byte script. `None` entries play back as read timeouts;
/// once the script runs dry every read fails, which ends a running loop.
pub struct ScriptedInput {
    script: VecDeque<Option<u8>>,
}

impl ScriptedInput {
    pub fn new(bytes: &[u8]) -> Self {
        ScriptedInput {
            script: bytes.iter().map(|&b| Some(b)).collect(),
        }
    }

    pub fn timeout(mut self) -> Self {
        self.script.push_back(None);
        self
    }

    pub fn then(mut self, bytes: &[u8]) -> Self {
        self.script.extend(bytes.iter().map(|&b| Some(b)));
        self
    }

    pub fn is_drained(&self) -> bool {
        self.script.is_empty()
    }
}

impl ByteSource for ScriptedInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.script
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}
