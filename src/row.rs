//! A single line of the buffer.
//!
//! Every row keeps its source bytes (`chars`) next to the bytes that are
//! actually drawn (`render`). Tabs are the only transform between the two:
//! each one becomes enough spaces to reach the next tab stop.

/// Tab stop used when no config overrides it.
pub const TAB_STOP: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    chars: Vec<u8>,
    render: Vec<u8>,
}

impl Row {
    pub fn new(chars: impl Into<Vec<u8>>, tab_stop: usize) -> Self {
        let mut row = Row {
            chars: chars.into(),
            render: Vec::new(),
        };
        row.update_render(tab_stop);
        row
    }

    pub fn chars(&self) -> &[u8] {
        &self.chars
    }

    pub fn render(&self) -> &[u8] {
        &self.render
    }

    /// Length of the source bytes.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn render_len(&self) -> usize {
        self.render.len()
    }

    /// Rebuilds `render` from `chars`.
    pub fn update_render(&mut self, tab_stop: usize) {
        self.render = expand_tabs(&self.chars, tab_stop);
    }

    /// Inserts `c` at `at`, clamped to the end of the row.
    pub fn insert_char(&mut self, at: usize, c: u8, tab_stop: usize) {
        let at = at.min(self.chars.len());
        self.chars.insert(at, c);
        self.update_render(tab_stop);
    }

    /// Removes the byte at `at`. Returns `false` without touching the row
    /// when `at` is past the last byte.
    pub fn delete_char(&mut self, at: usize, tab_stop: usize) -> bool {
        if at >= self.chars.len() {
            return false;
        }
        self.chars.remove(at);
        self.update_render(tab_stop);
        true
    }

    /// Maps a logical column to the rendered column it is drawn at.
    pub fn cx_to_rx(&self, cx: usize, tab_stop: usize) -> usize {
        let tab_stop = tab_stop.max(1);
        self.chars
            .iter()
            .take(cx)
            .fold(0, |rx, &b| {
                if b == b'\t' {
                    rx + (tab_stop - 1) - (rx % tab_stop) + 1
                } else {
                    rx + 1
                }
            })
    }
}

/// Expands every tab in `chars` to spaces up to the next multiple of
/// `tab_stop`. All other bytes are copied verbatim.
pub fn expand_tabs(chars: &[u8], tab_stop: usize) -> Vec<u8> {
    let tab_stop = tab_stop.max(1);
    let tabs = chars.iter().filter(|&&b| b == b'\t').count();
    let mut render = Vec::with_capacity(chars.len() + tabs * (tab_stop - 1));

    for &b in chars {
        if b == b'\t' {
            render.push(b' ');
            while render.len() % tab_stop != 0 {
                render.push(b' ');
            }
        } else {
            render.push(b);
        }
    }
    render
}
