use ropey::Rope;

// Rope-backed text buffer with a caret tracked as a char offset. All offset
// arguments are clamped to the valid range; out-of-range input degrades to a
// no-op rather than a panic.
pub struct Editor {
    rope: Rope,
    caret: usize,
    modified: bool,
    visual_anchor: Option<usize>,
    tab_size: usize,
    use_spaces: bool,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            caret: 0,
            modified: false,
            visual_anchor: None,
            tab_size: 4,
            use_spaces: true,
        }
    }

    pub fn set_text(&mut self, content: &str) {
        self.rope = Rope::from_str(content);
        self.caret = 0;
        self.modified = false;
        self.visual_anchor = None;
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Lines in the buffer, counting the empty tail after a trailing newline.
    /// An empty buffer has zero lines.
    pub fn line_count(&self) -> usize {
        if self.rope.len_chars() == 0 {
            0
        } else {
            self.rope.len_lines()
        }
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn set_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.rope.len_chars());
    }

    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    pub fn line_start_offset(&self, line: usize) -> usize {
        let line = line.min(self.rope.len_lines().saturating_sub(1));
        self.rope.line_to_char(line)
    }

    /// Offset of the line's terminating newline, or the buffer length on the
    /// last line.
    pub fn line_end_offset(&self, line: usize) -> usize {
        let line = line.min(self.rope.len_lines().saturating_sub(1));
        if line + 1 < self.rope.len_lines() {
            self.rope.line_to_char(line + 1) - 1
        } else {
            self.rope.len_chars()
        }
    }

    /// Caret position as 0-based (line, column).
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let line = self.line_of_offset(self.caret);
        (line, self.caret - self.rope.line_to_char(line))
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        let len = self.rope.len_chars();
        let start = start.min(len);
        let end = end.min(len);
        if start >= end {
            return String::new();
        }
        self.rope.slice(start..end).to_string()
    }

    pub fn insert(&mut self, text: &str, offset: usize) {
        let offset = offset.min(self.rope.len_chars());
        self.rope.insert(offset, text);
        self.modified = true;
    }

    pub fn replace_range(&mut self, text: &str, start: usize, end: usize) {
        let len = self.rope.len_chars();
        debug_assert!(start <= end, "replace_range start {} > end {}", start, end);
        let start = start.min(len);
        let end = end.min(len).max(start);
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.modified = true;
        self.caret = self.caret.min(self.rope.len_chars());
    }

    pub fn set_tab_config(&mut self, tab_size: usize, use_spaces: bool) {
        self.tab_size = tab_size;
        self.use_spaces = use_spaces;
    }

    pub fn insert_char(&mut self, c: char) {
        self.rope.insert_char(self.caret, c);
        self.caret += 1;
        self.modified = true;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn insert_tab(&mut self) {
        if self.use_spaces {
            for _ in 0..self.tab_size {
                self.insert_char(' ');
            }
        } else {
            self.insert_char('\t');
        }
    }

    pub fn backspace(&mut self) {
        if self.caret > 0 {
            self.rope.remove(self.caret - 1..self.caret);
            self.caret -= 1;
            self.modified = true;
        }
    }

    pub fn delete_forward(&mut self) {
        if self.caret < self.rope.len_chars() {
            self.rope.remove(self.caret..self.caret + 1);
            self.modified = true;
        }
    }

    /// Overwrite the char under the caret and advance; at end of buffer this
    /// degrades to insertion.
    pub fn replace_char(&mut self, c: char) {
        if self.caret < self.rope.len_chars() {
            self.rope.remove(self.caret..self.caret + 1);
        }
        self.rope.insert_char(self.caret, c);
        self.caret += 1;
        self.modified = true;
    }

    pub fn set_visual_anchor(&mut self) {
        self.visual_anchor = Some(self.caret);
    }

    pub fn clear_visual_anchor(&mut self) {
        self.visual_anchor = None;
    }

    /// Selection as a half-open `[start, end)` char range, ordered regardless
    /// of which side the caret is on.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let anchor = self.visual_anchor?;
        let (a, b) = (anchor.min(self.caret), anchor.max(self.caret));
        Some((a, b))
    }

    pub fn selected_text(&self) -> String {
        match self.selection_range() {
            Some((start, end)) => self.slice(start, end),
            None => String::new(),
        }
    }

    pub fn line(&self, line: usize) -> String {
        if line >= self.rope.len_lines() {
            return String::new();
        }
        self.rope.line(line).to_string()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
