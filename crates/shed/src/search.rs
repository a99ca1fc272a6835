use vimotion::{line_end_at, line_start_at};

use crate::editor::Editor;

// Patterns are matched as literal text, never as regular expressions; only
// the :s command *syntax* is regex-parsed. Match offsets are recorded against
// the buffer snapshot at scan time and kept valid across replacements by
// shifting, not rescanning, so replacement text can never re-match.
pub struct SearchEngine {
    pattern: String,
    matches: Vec<usize>,
    current: Option<usize>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self {
            pattern: String::new(),
            matches: Vec::new(),
            current: None,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn search(&mut self, editor: &mut Editor, pattern: &str, case_sensitive: bool) -> String {
        if pattern.is_empty() {
            return "Error: Empty search pattern".to_string();
        }

        self.pattern = pattern.to_string();
        self.matches.clear();
        self.current = None;

        let text = editor.text();
        if text.is_empty() {
            return "Error: Empty buffer".to_string();
        }

        self.matches = find_matches(&text, pattern, case_sensitive);
        if self.matches.is_empty() {
            return format!("Pattern not found: {}", pattern);
        }

        self.current = Some(0);
        editor.set_caret(self.matches[0]);
        format!("Match 1 of {}", self.matches.len())
    }

    pub fn next_match(&mut self, editor: &mut Editor) -> String {
        let Some(current) = self.current else {
            return "No search pattern".to_string();
        };
        let next = (current + 1) % self.matches.len();
        self.current = Some(next);
        editor.set_caret(self.matches[next]);
        format!("Match {} of {}", next + 1, self.matches.len())
    }

    pub fn prev_match(&mut self, editor: &mut Editor) -> String {
        let Some(current) = self.current else {
            return "No search pattern".to_string();
        };
        let prev = if current == 0 {
            self.matches.len() - 1
        } else {
            current - 1
        };
        self.current = Some(prev);
        editor.set_caret(self.matches[prev]);
        format!("Match {} of {}", prev + 1, self.matches.len())
    }

    /// Replace only the current match, then shift every later recorded offset
    /// by the length delta so the remaining list stays valid without a rescan.
    pub fn replace_current(&mut self, editor: &mut Editor, replacement: &str) -> String {
        let Some(current) = self.current else {
            return "No match to replace".to_string();
        };

        let pattern_len = self.pattern.chars().count();
        let replacement_len = replacement.chars().count();
        let pos = self.matches[current];
        editor.replace_range(replacement, pos, pos + pattern_len);

        let delta = replacement_len as isize - pattern_len as isize;
        for offset in self.matches.iter_mut().skip(current + 1) {
            debug_assert!(*offset as isize + delta >= 0);
            *offset = (*offset as isize + delta) as usize;
        }
        self.matches.remove(current);

        if self.matches.is_empty() {
            self.current = None;
            return "Last match replaced".to_string();
        }

        let next = if current >= self.matches.len() { 0 } else { current };
        self.current = Some(next);
        editor.set_caret(self.matches[next]);
        format!("Replaced. Match {} of {}", next + 1, self.matches.len())
    }

    /// Replace every recorded match, walking the list in descending offset
    /// order so earlier offsets stay valid. Clears all match state.
    pub fn replace_all(&mut self, editor: &mut Editor, replacement: &str) -> String {
        if self.matches.is_empty() {
            return "No matches to replace".to_string();
        }

        let pattern_len = self.pattern.chars().count();
        let count = self.matches.len();
        for &pos in self.matches.iter().rev() {
            editor.replace_range(replacement, pos, pos + pattern_len);
        }

        self.matches.clear();
        self.current = None;
        format!(
            "Replaced {} occurrence{}",
            count,
            if count > 1 { "s" } else { "" }
        )
    }

    /// `:s` / `:%s`: scoped to the caret line unless `whole_buffer`; replaces
    /// the first match in scope unless `all`. Runs on a fresh scan and leaves
    /// the interactive search state untouched.
    pub fn substitute(
        &self,
        editor: &mut Editor,
        pattern: &str,
        replacement: &str,
        whole_buffer: bool,
        all: bool,
    ) -> String {
        if pattern.is_empty() {
            return "Error: Empty search pattern".to_string();
        }

        let text = editor.text();
        let pattern_len = pattern.chars().count();
        let mut found = find_matches(&text, pattern, true);
        if !whole_buffer {
            let start = line_start_at(&text, editor.caret());
            let end = line_end_at(&text, editor.caret());
            found.retain(|&pos| pos >= start && pos + pattern_len <= end);
        }

        if found.is_empty() {
            return format!("Pattern not found: {}", pattern);
        }

        let count = if all { found.len() } else { 1 };
        for &pos in found[..count].iter().rev() {
            editor.replace_range(replacement, pos, pos + pattern_len);
        }

        format!(
            "Replaced {} occurrence{}",
            count,
            if count > 1 { "s" } else { "" }
        )
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

// All non-overlapping literal occurrences, as ascending char offsets.
fn find_matches(text: &str, pattern: &str, case_sensitive: bool) -> Vec<usize> {
    let haystack: Vec<char> = text.chars().collect();
    let needle: Vec<char> = pattern.chars().collect();
    let mut positions = Vec::new();
    if needle.is_empty() || haystack.len() < needle.len() {
        return positions;
    }

    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        let hit = haystack[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(a, b)| chars_match(*a, *b, case_sensitive));
        if hit {
            positions.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    positions
}

fn chars_match(a: char, b: char, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.to_lowercase().eq(b.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(content: &str) -> Editor {
        let mut editor = Editor::new();
        editor.set_text(content);
        editor
    }

    #[test]
    fn test_search_reports_first_match() {
        let mut editor = editor_with("foo bar foo baz");
        let mut search = SearchEngine::new();
        assert_eq!(search.search(&mut editor, "foo", true), "Match 1 of 2");
        assert_eq!(search.matches(), &[0, 8]);
        assert_eq!(editor.caret(), 0);
    }

    #[test]
    fn test_empty_pattern_and_empty_buffer_fail() {
        let mut search = SearchEngine::new();
        let mut editor = editor_with("text");
        assert_eq!(
            search.search(&mut editor, "", true),
            "Error: Empty search pattern"
        );
        assert!(search.matches().is_empty());

        let mut empty = editor_with("");
        assert_eq!(search.search(&mut empty, "x", true), "Error: Empty buffer");
        assert!(search.matches().is_empty());
    }

    #[test]
    fn test_pattern_not_found() {
        let mut editor = editor_with("abc");
        let mut search = SearchEngine::new();
        assert_eq!(search.search(&mut editor, "zz", true), "Pattern not found: zz");
        assert_eq!(search.next_match(&mut editor), "No search pattern");
    }

    #[test]
    fn test_pattern_is_literal_not_regex() {
        let mut editor = editor_with("a.c abc");
        let mut search = SearchEngine::new();
        assert_eq!(search.search(&mut editor, "a.c", true), "Match 1 of 1");
        assert_eq!(search.matches(), &[0]);
    }

    #[test]
    fn test_case_insensitive_search() {
        let mut editor = editor_with("Foo foo FOO");
        let mut search = SearchEngine::new();
        assert_eq!(search.search(&mut editor, "foo", false), "Match 1 of 3");
        assert_eq!(search.search(&mut editor, "foo", true), "Match 1 of 1");
    }

    #[test]
    fn test_next_match_is_cyclic() {
        let mut editor = editor_with("x x x");
        let mut search = SearchEngine::new();
        search.search(&mut editor, "x", true);
        let start = search.current_index();
        for _ in 0..search.match_count() {
            search.next_match(&mut editor);
        }
        assert_eq!(search.current_index(), start);
    }

    #[test]
    fn test_prev_match_wraps_backward() {
        let mut editor = editor_with("x x x");
        let mut search = SearchEngine::new();
        search.search(&mut editor, "x", true);
        assert_eq!(search.prev_match(&mut editor), "Match 3 of 3");
        assert_eq!(editor.caret(), 4);
    }

    #[test]
    fn test_replace_current_shifts_later_offsets() {
        let mut editor = editor_with("foo bar foo");
        let mut search = SearchEngine::new();
        search.search(&mut editor, "foo", true);
        let message = search.replace_current(&mut editor, "quux");
        assert_eq!(editor.text(), "quux bar foo");
        assert_eq!(message, "Replaced. Match 1 of 1");
        // Remaining offset shifted by len("quux") - len("foo") = 1.
        assert_eq!(search.matches(), &[9]);
        assert_eq!(search.replace_current(&mut editor, "quux"), "Last match replaced");
        assert_eq!(editor.text(), "quux bar quux");
    }

    #[test]
    fn test_replace_all_ignores_reintroduced_pattern() {
        // Replacement contains the pattern; precomputed offsets must not
        // re-match it.
        let mut editor = editor_with("ab ab");
        let mut search = SearchEngine::new();
        search.search(&mut editor, "ab", true);
        let message = search.replace_all(&mut editor, "abab");
        assert_eq!(message, "Replaced 2 occurrences");
        assert_eq!(editor.text(), "abab abab");
        assert_eq!(search.match_count(), 0);
        assert_eq!(search.current_index(), None);
    }

    #[test]
    fn test_replace_all_singular_message() {
        let mut editor = editor_with("one");
        let mut search = SearchEngine::new();
        search.search(&mut editor, "one", true);
        assert_eq!(search.replace_all(&mut editor, "two"), "Replaced 1 occurrence");
    }

    #[test]
    fn test_non_overlapping_matches() {
        let mut editor = editor_with("aaaa");
        let mut search = SearchEngine::new();
        assert_eq!(search.search(&mut editor, "aa", true), "Match 1 of 2");
        assert_eq!(search.matches(), &[0, 2]);
    }

    #[test]
    fn test_substitute_whole_buffer() {
        let mut editor = editor_with("foo bar foo baz");
        let search = SearchEngine::new();
        let message = search.substitute(&mut editor, "foo", "qux", true, true);
        assert_eq!(editor.text(), "qux bar qux baz");
        assert_eq!(message, "Replaced 2 occurrences");
    }

    #[test]
    fn test_substitute_current_line_only() {
        let mut editor = editor_with("foo\nfoo\nfoo");
        editor.set_caret(4); // second line
        let search = SearchEngine::new();
        let message = search.substitute(&mut editor, "foo", "bar", false, true);
        assert_eq!(editor.text(), "foo\nbar\nfoo");
        assert_eq!(message, "Replaced 1 occurrence");
    }

    #[test]
    fn test_substitute_first_match_only_without_g() {
        let mut editor = editor_with("foo foo foo");
        let search = SearchEngine::new();
        let message = search.substitute(&mut editor, "foo", "bar", true, false);
        assert_eq!(editor.text(), "bar foo foo");
        assert_eq!(message, "Replaced 1 occurrence");
    }

    #[test]
    fn test_substitute_not_found() {
        let mut editor = editor_with("abc");
        let search = SearchEngine::new();
        assert_eq!(
            search.substitute(&mut editor, "zz", "yy", true, true),
            "Pattern not found: zz"
        );
        assert_eq!(editor.text(), "abc");
    }
}
