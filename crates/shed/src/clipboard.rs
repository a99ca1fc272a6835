use vimotion::{line_end_at, line_start_at, word_forward};

use crate::editor::Editor;

/// Bridge to a machine-wide clipboard. Yanks write through; paste falls back
/// to it when the internal register is empty.
pub trait ClipboardPort {
    fn read_text(&mut self) -> Option<String>;
    fn write_text(&mut self, text: &str);
}

// arboard can fail in headless or unusual terminals; treat the system
// clipboard as best effort and degrade to register-only operation.
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let inner = arboard::Clipboard::new()
            .map_err(|e| log::warn!("System clipboard unavailable: {}", e))
            .ok();
        Self { inner }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardPort for SystemClipboard {
    fn read_text(&mut self) -> Option<String> {
        self.inner.as_mut()?.get_text().ok()
    }

    fn write_text(&mut self, text: &str) {
        if let Some(clipboard) = self.inner.as_mut() {
            if let Err(e) = clipboard.set_text(text.to_string()) {
                log::warn!("Failed to write system clipboard: {}", e);
            }
        }
    }
}

pub struct ClipboardManager {
    register: String,
    line_wise: bool,
    port: Box<dyn ClipboardPort>,
}

impl ClipboardManager {
    pub fn new(port: Box<dyn ClipboardPort>) -> Self {
        Self {
            register: String::new(),
            line_wise: false,
            port,
        }
    }

    pub fn register(&self) -> &str {
        &self.register
    }

    pub fn is_line_wise(&self) -> bool {
        self.line_wise
    }

    fn store(&mut self, content: String, line_wise: bool) {
        self.port.write_text(&content);
        self.register = content;
        self.line_wise = line_wise;
    }

    // The caret line including its terminating newline; the last line of an
    // unterminated buffer gets one appended so line-wise paste stays line-wise.
    fn caret_line(editor: &Editor) -> (usize, usize, String) {
        let text = editor.text();
        let start = line_start_at(&text, editor.caret());
        let end = line_end_at(&text, editor.caret());
        let mut line = editor.slice(start, end);
        line.push('\n');
        (start, end, line)
    }

    pub fn yank_line(&mut self, editor: &Editor) -> String {
        let (_, _, line) = Self::caret_line(editor);
        self.store(line.clone(), true);
        line
    }

    pub fn yank_selection(&mut self, text: String) -> String {
        self.store(text.clone(), false);
        text
    }

    pub fn delete_line(&mut self, editor: &mut Editor) -> String {
        let (start, mut end, line) = Self::caret_line(editor);
        if end < editor.len_chars() {
            end += 1; // take the newline with the line
        }
        self.store(line.clone(), true);
        editor.replace_range("", start, end);
        editor.set_caret(start.min(editor.len_chars()));
        line
    }

    /// `x`: remove the char under the caret without touching the register.
    pub fn delete_char(&mut self, editor: &mut Editor) {
        editor.delete_forward();
    }

    pub fn delete_word(&mut self, editor: &mut Editor) {
        let text = editor.text();
        let caret = editor.caret();
        let end = word_forward(&text, caret);
        if end > caret {
            let deleted = editor.slice(caret, end);
            self.store(deleted, false);
            editor.replace_range("", caret, end);
            editor.set_caret(caret);
        }
    }

    pub fn delete_to_end_of_line(&mut self, editor: &mut Editor) {
        let text = editor.text();
        let caret = editor.caret();
        let end = line_end_at(&text, caret);
        if end > caret {
            let deleted = editor.slice(caret, end);
            self.store(deleted, false);
            editor.replace_range("", caret, end);
            editor.set_caret(caret);
        }
    }

    /// Paste the register. `before` inserts at the caret (line-wise: at the
    /// caret's line start); otherwise one past the caret (line-wise: after
    /// the caret's line). An empty register falls back to the system
    /// clipboard as char-wise text; if that also fails the paste is a no-op.
    pub fn paste(&mut self, editor: &mut Editor, before: bool) {
        let (content, line_wise) = if self.register.is_empty() {
            match self.port.read_text() {
                Some(text) if !text.is_empty() => (text, false),
                _ => return,
            }
        } else {
            (self.register.clone(), self.line_wise)
        };

        let len = editor.len_chars();
        let caret = editor.caret();
        if line_wise {
            let text = editor.text();
            let start = line_start_at(&text, caret);
            let end = line_end_at(&text, caret);
            let mut content = content;
            if !content.ends_with('\n') {
                content.push('\n');
            }
            let pos = if before {
                start
            } else if end < len {
                end + 1
            } else {
                end
            };
            editor.insert(&content, pos);
            editor.set_caret(pos);
        } else {
            let pos = if before { caret } else { (caret + 1).min(len) };
            editor.insert(&content, pos);
            editor.set_caret(pos);
        }
    }
}
