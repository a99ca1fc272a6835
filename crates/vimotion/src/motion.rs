// Pure cursor motions over a text snapshot. Every function takes a char
// offset and returns a char offset clamped to [0, text.chars().count()];
// none of them can fail on out-of-range input.

/// Start offset of the line containing `offset`.
pub fn line_start_at(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut pos = offset.min(chars.len());
    while pos > 0 && chars[pos - 1] != '\n' {
        pos -= 1;
    }
    pos
}

/// End offset of the line containing `offset`: the position of its
/// terminating newline, or the text length on the last line.
pub fn line_end_at(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut pos = offset.min(len);
    while pos < len && chars[pos] != '\n' {
        pos += 1;
    }
    pos
}

pub fn left(text: &str, offset: usize) -> usize {
    offset.min(text.chars().count()).saturating_sub(1)
}

pub fn right(text: &str, offset: usize) -> usize {
    let len = text.chars().count();
    (offset + 1).min(len)
}

pub fn up(text: &str, offset: usize) -> usize {
    let len = text.chars().count();
    let offset = offset.min(len);
    let start = line_start_at(text, offset);
    if start == 0 {
        return offset;
    }
    let column = offset - start;
    // The newline before this line belongs to the previous line.
    let prev_end = start - 1;
    let prev_start = line_start_at(text, prev_end);
    column_clamped(prev_start, prev_end, column)
}

pub fn down(text: &str, offset: usize) -> usize {
    let len = text.chars().count();
    let offset = offset.min(len);
    let end = line_end_at(text, offset);
    if end >= len {
        return offset;
    }
    let column = offset - line_start_at(text, offset);
    let next_start = end + 1;
    let next_end = line_end_at(text, next_start);
    column_clamped(next_start, next_end, column)
}

// Target of a vertical motion: keep the column, but never land past the
// target line's last character (an empty line collapses to its start).
fn column_clamped(start: usize, end: usize, column: usize) -> usize {
    let last = if end > start { end - 1 } else { start };
    (start + column).min(last)
}

/// `w`: skip the current run of non-whitespace, then the whitespace after it.
pub fn word_forward(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut pos = offset.min(len);
    while pos < len && !chars[pos].is_whitespace() {
        pos += 1;
    }
    while pos < len && chars[pos].is_whitespace() {
        pos += 1;
    }
    pos
}

/// `b`: back one, skip whitespace backward, then back over the word to its start.
pub fn word_backward(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut pos = offset.min(chars.len());
    if pos == 0 {
        return 0;
    }
    pos -= 1;
    while pos > 0 && chars[pos].is_whitespace() {
        pos -= 1;
    }
    while pos > 0 && !chars[pos - 1].is_whitespace() {
        pos -= 1;
    }
    pos
}

/// `e`: advance one, skip whitespace, then advance to the last character of
/// the next word.
pub fn word_end(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut pos = offset.min(len);
    if pos < len {
        pos += 1;
    }
    while pos < len && chars[pos].is_whitespace() {
        pos += 1;
    }
    while pos + 1 < len && !chars[pos + 1].is_whitespace() {
        pos += 1;
    }
    pos.min(len)
}

pub fn line_start(text: &str, offset: usize) -> usize {
    line_start_at(text, offset)
}

pub fn line_end(text: &str, offset: usize) -> usize {
    let start = line_start_at(text, offset);
    line_end_at(text, offset).saturating_sub(1).max(start)
}

pub fn buffer_start(_text: &str, _offset: usize) -> usize {
    0
}

pub fn buffer_end(text: &str, _offset: usize) -> usize {
    text.chars().count()
}
