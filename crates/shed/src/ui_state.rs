use crate::status::StatusManager;

const MAX_HISTORY: usize = 100;

/// A modal text block (help, buffer list, recent files) shown over the
/// editing area until dismissed.
pub struct Modal {
    pub title: String,
    pub body: String,
}

// Presentation-side session state: the command-line accumulator and its
// history, modal requests, and the line-number gutter toggle.
pub struct UIState {
    pub command_buffer: String,
    pub should_quit: bool,
    pub line_numbers: bool,
    pub status: StatusManager,
    modal: Option<Modal>,
    command_history: Vec<String>,
    history_index: Option<usize>,
}

impl UIState {
    pub fn new() -> Self {
        Self {
            command_buffer: String::new(),
            should_quit: false,
            line_numbers: false,
            status: StatusManager::new(),
            modal: None,
            command_history: Vec::new(),
            history_index: None,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn show_modal(&mut self, title: String, body: String) {
        self.modal = Some(Modal { title, body });
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn add_to_history(&mut self, command: String) {
        if !command.is_empty() && self.command_history.last() != Some(&command) {
            self.command_history.push(command);
            if self.command_history.len() > MAX_HISTORY {
                self.command_history.remove(0);
            }
        }
        self.history_index = None;
    }

    pub fn history_up(&mut self) {
        if self.command_history.is_empty() {
            return;
        }
        let new_index = match self.history_index {
            None => self.command_history.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(new_index);
        self.command_buffer = self.command_history[new_index].clone();
    }

    pub fn history_down(&mut self) {
        match self.history_index {
            None => {}
            Some(i) if i + 1 >= self.command_history.len() => {
                self.history_index = None;
                self.command_buffer.clear();
            }
            Some(i) => {
                self.history_index = Some(i + 1);
                self.command_buffer = self.command_history[i + 1].clone();
            }
        }
    }
}

impl Default for UIState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_navigation() {
        let mut state = UIState::new();
        state.add_to_history(":w".to_string());
        state.add_to_history(":q".to_string());
        state.add_to_history(":wq".to_string());

        state.history_up();
        assert_eq!(state.command_buffer, ":wq");
        state.history_up();
        assert_eq!(state.command_buffer, ":q");
        state.history_up();
        assert_eq!(state.command_buffer, ":w");
        state.history_up();
        assert_eq!(state.command_buffer, ":w"); // pinned at the oldest entry

        state.history_down();
        assert_eq!(state.command_buffer, ":q");
        state.history_down();
        assert_eq!(state.command_buffer, ":wq");
        state.history_down();
        assert_eq!(state.command_buffer, ""); // walked past the newest entry
    }

    #[test]
    fn test_history_dedupes_consecutive() {
        let mut state = UIState::new();
        state.add_to_history(":w".to_string());
        state.add_to_history(":w".to_string());
        assert_eq!(state.command_history.len(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut state = UIState::new();
        for i in 0..150 {
            state.add_to_history(format!(":{}", i));
        }
        assert_eq!(state.command_history.len(), MAX_HISTORY);
    }

    #[test]
    fn test_modal_lifecycle() {
        let mut state = UIState::new();
        assert!(state.modal().is_none());
        state.show_modal("Help".to_string(), "body".to_string());
        assert_eq!(state.modal().unwrap().title, "Help");
        state.close_modal();
        assert!(state.modal().is_none());
    }
}
