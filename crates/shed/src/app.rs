use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::buffer_list::BufferList;
use crate::clipboard::{ClipboardManager, ClipboardPort, SystemClipboard};
use crate::command::{help_text, CommandProcessor};
use crate::config::Config;
use crate::editor::Editor;
use crate::file_manager::FileManager;
use crate::search::SearchEngine;
use crate::ui_state::UIState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
    Visual,
    Replace,
    Command,
}

impl Mode {
    pub fn display_name(self) -> &'static str {
        match self {
            Mode::Normal => "normal mode",
            Mode::Insert => "insert mode",
            Mode::Visual => "visual mode",
            Mode::Replace => "replace mode",
            Mode::Command => "command mode",
        }
    }

    pub fn is_editable(self) -> bool {
        matches!(self, Mode::Insert | Mode::Replace)
    }
}

// The last repeatable compound edit, replayed by `.` at the current caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompoundEdit {
    DeleteLine,
    DeleteWord,
    ChangeLine,
    ChangeWord,
    DeleteToEol,
    ChangeToEol,
}

pub struct App {
    pub editor: Editor,
    pub config: Config,
    pub ui_state: UIState,
    pub file_manager: FileManager,
    pub command_processor: CommandProcessor,
    pub buffers: BufferList,
    pub clipboard: ClipboardManager,
    pub search: SearchEngine,
    mode: Mode,
    pending_key: Option<char>,
    last_command: Option<CompoundEdit>,
}

impl App {
    pub async fn new() -> Result<Self> {
        let config = Config::load().await?;
        Ok(Self::with_config(
            config,
            Box::new(SystemClipboard::new()),
        ))
    }

    pub fn with_config(config: Config, clipboard_port: Box<dyn ClipboardPort>) -> Self {
        let mut editor = Editor::new();
        editor.set_tab_config(config.editor.tab_size, config.editor.use_spaces);
        let mut ui_state = UIState::new();
        ui_state.line_numbers = config.editor.line_numbers;

        Self {
            editor,
            config,
            ui_state,
            file_manager: FileManager::new(),
            command_processor: CommandProcessor::new(),
            buffers: BufferList::new(),
            clipboard: ClipboardManager::new(clipboard_port),
            search: SearchEngine::new(),
            mode: Mode::Normal,
            pending_key: None,
            last_command: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn should_quit(&self) -> bool {
        self.ui_state.should_quit()
    }

    pub fn quit(&mut self) {
        self.ui_state.quit();
    }

    pub fn update_status(&mut self) {
        self.ui_state.status.update();
    }

    /// The status projection recomputed after every key event: mode, file,
    /// modified marker, 1-based position, and line count.
    pub fn status_line(&self) -> String {
        let (line, col) = self.editor.cursor_line_col();
        let modified = if self.editor.is_modified() { " [+]" } else { "" };
        format!(
            "{} | {}{} | {}:{} | {}L",
            self.mode.display_name(),
            self.file_manager.display_name(),
            modified,
            line + 1,
            col + 1,
            self.editor.line_count()
        )
    }

    /// Seed the session with a file given on the command line. The pristine
    /// unnamed starting buffer is reused rather than kept around.
    pub async fn open_initial_file(&mut self, path: std::path::PathBuf) {
        match self.file_manager.open_file(path.clone()).await {
            Ok(content) => {
                if self.buffers.len() == 1
                    && self.buffers.current().path.is_none()
                    && self.buffers.current().content.is_empty()
                {
                    let buffer = self.buffers.current_mut();
                    buffer.path = Some(path.clone());
                    buffer.content = content.clone();
                } else {
                    self.buffers.open(&path, content.clone());
                }
                self.editor.set_text(&content);
                self.ui_state
                    .status
                    .set_info(format!("Opened: {}", path.display()));
            }
            Err(e) => self.ui_state.status.set_error(e.to_string()),
        }
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.ui_state.modal().is_some() {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                self.ui_state.close_modal();
            }
            return Ok(());
        }

        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Insert => self.handle_insert_key(key),
            Mode::Visual => self.handle_visual_key(key),
            Mode::Replace => self.handle_replace_key(key),
            Mode::Command => self.handle_command_key(key).await?,
        }
        Ok(())
    }

    fn apply_motion(&mut self, motion: fn(&str, usize) -> usize) {
        let text = self.editor.text();
        let caret = self.editor.caret();
        self.editor.set_caret(motion(&text, caret));
    }

    // Shared by Normal and Visual mode: in Visual the selection simply grows
    // with the caret.
    fn handle_motion_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('h') | KeyCode::Left => self.apply_motion(vimotion::left),
            KeyCode::Char('l') | KeyCode::Right => self.apply_motion(vimotion::right),
            KeyCode::Char('j') | KeyCode::Down => self.apply_motion(vimotion::down),
            KeyCode::Char('k') | KeyCode::Up => self.apply_motion(vimotion::up),
            KeyCode::Char('w') => self.apply_motion(vimotion::word_forward),
            KeyCode::Char('b') => self.apply_motion(vimotion::word_backward),
            KeyCode::Char('e') => self.apply_motion(vimotion::word_end),
            KeyCode::Char('0') | KeyCode::Home => self.apply_motion(vimotion::line_start),
            KeyCode::Char('$') | KeyCode::End => self.apply_motion(vimotion::line_end),
            KeyCode::Char('G') => self.apply_motion(vimotion::buffer_end),
            _ => return false,
        }
        true
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        // A pending prefix consumes the next key no matter what it is; an
        // unrecognized second key just drops the prefix.
        if let Some(prefix) = self.pending_key.take() {
            if let KeyCode::Char(c) = key.code {
                self.handle_prefixed_key(prefix, c);
            }
            return;
        }

        if self.handle_motion_key(key.code) {
            return;
        }

        match key.code {
            KeyCode::Char(c @ ('g' | 'y' | 'd' | 'c')) => self.pending_key = Some(c),

            KeyCode::Char('x') => self.clipboard.delete_char(&mut self.editor),
            KeyCode::Char('D') => {
                self.clipboard.delete_to_end_of_line(&mut self.editor);
                self.last_command = Some(CompoundEdit::DeleteToEol);
            }
            KeyCode::Char('C') => {
                self.clipboard.delete_to_end_of_line(&mut self.editor);
                self.last_command = Some(CompoundEdit::ChangeToEol);
                self.mode = Mode::Insert;
            }

            KeyCode::Char('p') => self.clipboard.paste(&mut self.editor, true),
            KeyCode::Char('P') => self.clipboard.paste(&mut self.editor, false),

            KeyCode::Char('i') => self.mode = Mode::Insert,
            KeyCode::Char('a') => {
                self.apply_motion(vimotion::right);
                self.mode = Mode::Insert;
            }
            KeyCode::Char('o') => {
                let text = self.editor.text();
                self.editor
                    .set_caret(vimotion::line_end_at(&text, self.editor.caret()));
                self.editor.insert_newline();
                self.mode = Mode::Insert;
            }
            KeyCode::Char('O') => {
                let text = self.editor.text();
                let start = vimotion::line_start_at(&text, self.editor.caret());
                self.editor.set_caret(start);
                self.editor.insert_newline();
                self.editor.set_caret(start);
                self.mode = Mode::Insert;
            }

            KeyCode::Char('v') => {
                self.editor.set_visual_anchor();
                self.mode = Mode::Visual;
            }
            KeyCode::Char('R') => self.mode = Mode::Replace,

            KeyCode::Char(':') => {
                self.mode = Mode::Command;
                self.ui_state.command_buffer = String::from(":");
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Command;
                self.ui_state.command_buffer = String::from("/");
            }

            KeyCode::Char('n') => {
                let message = self.search.next_match(&mut self.editor);
                self.ui_state.status.set_info(message);
            }
            KeyCode::Char('N') => {
                let message = self.search.prev_match(&mut self.editor);
                self.ui_state.status.set_info(message);
            }

            KeyCode::Char('.') => self.repeat_last_command(),
            KeyCode::Char('?') => {
                self.ui_state
                    .show_modal(String::from("Help"), help_text(None));
            }

            _ => {}
        }
    }

    fn handle_prefixed_key(&mut self, prefix: char, key: char) {
        match (prefix, key) {
            ('g', 'g') => self.apply_motion(vimotion::buffer_start),
            ('y', 'y') => {
                self.clipboard.yank_line(&self.editor);
                self.ui_state.status.set_success(String::from("Line yanked"));
            }
            ('d', 'd') => {
                self.clipboard.delete_line(&mut self.editor);
                self.last_command = Some(CompoundEdit::DeleteLine);
                self.ui_state
                    .status
                    .set_success(String::from("Line deleted"));
            }
            ('d', 'w') => {
                self.clipboard.delete_word(&mut self.editor);
                self.last_command = Some(CompoundEdit::DeleteWord);
            }
            ('c', 'c') => {
                self.clipboard.delete_line(&mut self.editor);
                self.last_command = Some(CompoundEdit::ChangeLine);
                self.mode = Mode::Insert;
            }
            ('c', 'w') => {
                self.clipboard.delete_word(&mut self.editor);
                self.last_command = Some(CompoundEdit::ChangeWord);
                self.mode = Mode::Insert;
            }
            _ => {}
        }
    }

    fn repeat_last_command(&mut self) {
        let Some(edit) = self.last_command else {
            return;
        };
        match edit {
            CompoundEdit::DeleteLine => {
                self.clipboard.delete_line(&mut self.editor);
            }
            CompoundEdit::DeleteWord => self.clipboard.delete_word(&mut self.editor),
            CompoundEdit::ChangeLine => {
                self.clipboard.delete_line(&mut self.editor);
                self.mode = Mode::Insert;
            }
            CompoundEdit::ChangeWord => {
                self.clipboard.delete_word(&mut self.editor);
                self.mode = Mode::Insert;
            }
            CompoundEdit::DeleteToEol => self.clipboard.delete_to_end_of_line(&mut self.editor),
            CompoundEdit::ChangeToEol => {
                self.clipboard.delete_to_end_of_line(&mut self.editor);
                self.mode = Mode::Insert;
            }
        }
    }

    fn handle_insert_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Char(c) => self.editor.insert_char(c),
            KeyCode::Enter => self.editor.insert_newline(),
            KeyCode::Tab => self.editor.insert_tab(),
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Delete => self.editor.delete_forward(),
            KeyCode::Left => self.apply_motion(vimotion::left),
            KeyCode::Right => self.apply_motion(vimotion::right),
            KeyCode::Up => self.apply_motion(vimotion::up),
            KeyCode::Down => self.apply_motion(vimotion::down),
            _ => {}
        }
    }

    fn handle_visual_key(&mut self, key: KeyEvent) {
        if self.handle_motion_key(key.code) {
            return;
        }
        match key.code {
            KeyCode::Esc => {
                self.editor.clear_visual_anchor();
                self.mode = Mode::Normal;
            }
            KeyCode::Char('y') => {
                let text = self.editor.selected_text();
                self.clipboard.yank_selection(text);
                self.editor.clear_visual_anchor();
                self.mode = Mode::Normal;
                self.ui_state
                    .status
                    .set_success(String::from("Selection yanked"));
            }
            KeyCode::Char('d') | KeyCode::Char('x') => self.delete_selection(false),
            KeyCode::Char('c') => self.delete_selection(true),
            _ => {}
        }
    }

    // Copy the selection into the register, remove it, and leave Visual mode.
    fn delete_selection(&mut self, change: bool) {
        if let Some((start, end)) = self.editor.selection_range() {
            let text = self.editor.slice(start, end);
            self.clipboard.yank_selection(text);
            self.editor.replace_range("", start, end);
            self.editor.set_caret(start);
        }
        self.editor.clear_visual_anchor();
        self.mode = if change { Mode::Insert } else { Mode::Normal };
    }

    fn handle_replace_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Char(c) => self.editor.replace_char(c),
            KeyCode::Backspace | KeyCode::Left => self.apply_motion(vimotion::left),
            KeyCode::Right => self.apply_motion(vimotion::right),
            KeyCode::Up => self.apply_motion(vimotion::up),
            KeyCode::Down => self.apply_motion(vimotion::down),
            _ => {}
        }
    }

    async fn handle_command_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter => {
                let command = self.ui_state.command_buffer.clone();
                self.ui_state.add_to_history(command.clone());
                let result = self
                    .command_processor
                    .execute(
                        &command,
                        &mut self.editor,
                        &mut self.file_manager,
                        &mut self.buffers,
                        &mut self.search,
                        &mut self.ui_state,
                    )
                    .await;
                match result {
                    Ok(message) if message.is_empty() => {}
                    Ok(message) => {
                        if message.contains("written") {
                            self.ui_state.status.set_success(message);
                        } else if message.starts_with("Error")
                            || message.starts_with("No write")
                            || message.starts_with("Command not recognised")
                            || message.starts_with("Invalid")
                        {
                            self.ui_state.status.set_warning(message);
                        } else {
                            self.ui_state.status.set_info(message);
                        }
                    }
                    Err(e) => self.ui_state.status.set_error(e.to_string()),
                }
                self.mode = Mode::Normal;
                self.ui_state.command_buffer.clear();
            }
            KeyCode::Esc => {
                self.ui_state.command_buffer.clear();
                self.mode = Mode::Normal;
                self.ui_state.status.set_info(String::from("Cancelled"));
            }
            KeyCode::Backspace => {
                self.ui_state.command_buffer.pop();
                // Erasing the ':' or '/' prefix cancels the command line.
                if self.ui_state.command_buffer.is_empty() {
                    self.mode = Mode::Normal;
                }
            }
            KeyCode::Up => self.ui_state.history_up(),
            KeyCode::Down => self.ui_state.history_down(),
            KeyCode::Char(c) => self.ui_state.command_buffer.push(c),
            _ => {}
        }
        Ok(())
    }
}
