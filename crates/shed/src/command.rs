use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::PathBuf;

use crate::buffer_list::{BufferList, DeleteOutcome};
use crate::editor::Editor;
use crate::file_manager::FileManager;
use crate::search::SearchEngine;
use crate::ui_state::UIState;

lazy_static! {
    // Only the command syntax is a regex; the extracted pattern is applied
    // literally by the search engine.
    static ref SUBSTITUTE: Regex =
        Regex::new(r"^(%)?s/(.+?)/(.*)/(g)?$").expect("Invalid SUBSTITUTE regex pattern");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Write { path: Option<PathBuf> },
    Quit { force: bool },
    WriteQuit,
    Edit { path: PathBuf },
    BufferNext,
    BufferPrev,
    ListBuffers,
    BufferDelete { force: bool },
    Set { option: String },
    Help { topic: Option<String> },
    WordCount,
    Recent,
    GotoLine(usize),
    Substitute {
        pattern: String,
        replacement: String,
        whole_buffer: bool,
        all: bool,
    },
    Search { pattern: String },
    Nothing,
    Invalid(String),
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let mut cmd = input.trim();
        if let Some(stripped) = cmd.strip_prefix(':') {
            cmd = stripped.trim();
        }

        if let Some(pattern) = cmd.strip_prefix('/') {
            if pattern.is_empty() {
                return Command::Invalid("Error: Empty search pattern".to_string());
            }
            return Command::Search {
                pattern: pattern.to_string(),
            };
        }

        if cmd.is_empty() {
            return Command::Nothing;
        }

        if let Some(captures) = SUBSTITUTE.captures(cmd) {
            return Command::Substitute {
                pattern: captures[2].to_string(),
                replacement: captures[3].to_string(),
                whole_buffer: captures.get(1).is_some(),
                all: captures.get(4).is_some(),
            };
        }

        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let mut name = parts[0];
        let force = name.ends_with('!');
        if force {
            name = &name[..name.len() - 1];
        }

        match name {
            "w" | "write" => Command::Write {
                path: parts.get(1).copied().map(PathBuf::from),
            },
            "q" | "quit" => Command::Quit { force },
            "wq" | "x" => Command::WriteQuit,
            "e" | "edit" => match parts.get(1).copied() {
                Some(path) => Command::Edit {
                    path: PathBuf::from(path),
                },
                None => Command::Invalid("Error: :e requires filename argument".to_string()),
            },
            "bn" | "bnext" => Command::BufferNext,
            "bp" | "bprev" => Command::BufferPrev,
            "ls" | "buffers" => Command::ListBuffers,
            "bd" | "bdelete" => Command::BufferDelete { force },
            "set" => match parts.get(1) {
                Some(option) => Command::Set {
                    option: (*option).to_string(),
                },
                None => Command::Invalid("Error: :set requires argument".to_string()),
            },
            "help" => Command::Help {
                topic: parts.get(1).map(|t| (*t).to_string()),
            },
            "wc" | "wordcount" => Command::WordCount,
            "recent" => Command::Recent,
            "s" => {
                Command::Invalid("Error: Invalid substitute syntax. Use :s/old/new or :%s/old/new/g".to_string())
            }
            _ => match name.parse::<usize>() {
                Ok(line) => Command::GotoLine(line),
                Err(_) => Command::Unknown(name.to_string()),
            },
        }
    }
}

pub struct CommandProcessor;

impl CommandProcessor {
    pub fn new() -> Self {
        Self
    }

    // Every handler resolves to a human-readable status string. Err is
    // reserved for host I/O failures; the session renders those as error
    // messages, so nothing here can take the editor down.
    pub async fn execute(
        &self,
        input: &str,
        editor: &mut Editor,
        file_manager: &mut FileManager,
        buffers: &mut BufferList,
        search: &mut SearchEngine,
        ui: &mut UIState,
    ) -> Result<String> {
        match Command::parse(input) {
            Command::Write { path } => {
                let message = match path {
                    Some(path) => {
                        let message = file_manager.save_file_as(path.clone(), editor).await?;
                        buffers.current_mut().path = Some(path);
                        message
                    }
                    None => file_manager.save_file(editor).await?,
                };
                stash_current(editor, buffers);
                Ok(message)
            }
            Command::Quit { force } => {
                if !force && editor.is_modified() {
                    Ok("No write since last change (use :q! to override)".to_string())
                } else {
                    ui.quit();
                    Ok("Quitting".to_string())
                }
            }
            Command::WriteQuit => {
                let message = file_manager.save_file(editor).await?;
                stash_current(editor, buffers);
                ui.quit();
                Ok(format!("{} - Quitting", message))
            }
            Command::Edit { path } => {
                let content = file_manager.open_file(path.clone()).await?;
                stash_current(editor, buffers);
                buffers.open(&path, content);
                load_current(editor, buffers, file_manager);
                Ok(format!("Opened: {}", path.display()))
            }
            Command::BufferNext => {
                stash_current(editor, buffers);
                buffers.next();
                load_current(editor, buffers, file_manager);
                Ok(buffer_switch_message(buffers))
            }
            Command::BufferPrev => {
                stash_current(editor, buffers);
                buffers.prev();
                load_current(editor, buffers, file_manager);
                Ok(buffer_switch_message(buffers))
            }
            Command::ListBuffers => {
                stash_current(editor, buffers);
                ui.show_modal("Buffers".to_string(), buffers.listing());
                Ok(format!("{} buffers", buffers.len()))
            }
            Command::BufferDelete { force } => {
                stash_current(editor, buffers);
                match buffers.delete_current(force) {
                    DeleteOutcome::Refused => {
                        Ok("No write since last change (use :bd! to override)".to_string())
                    }
                    DeleteOutcome::CloseSession => {
                        ui.quit();
                        Ok("Quitting".to_string())
                    }
                    DeleteOutcome::Removed => {
                        load_current(editor, buffers, file_manager);
                        Ok("Buffer deleted".to_string())
                    }
                }
            }
            Command::Set { option } => match option.as_str() {
                "nu" | "number" => {
                    ui.line_numbers = true;
                    Ok("Line numbers enabled".to_string())
                }
                "nonu" | "nonumber" => {
                    ui.line_numbers = false;
                    Ok("Line numbers disabled".to_string())
                }
                _ => Ok(format!("Unknown option: {}", option)),
            },
            Command::Help { topic } => {
                ui.show_modal("Help".to_string(), help_text(topic.as_deref()));
                Ok("Showing help".to_string())
            }
            Command::WordCount => {
                let text = editor.text();
                let lines = if text.is_empty() {
                    0
                } else {
                    text.split('\n').count()
                };
                let words = text.split_whitespace().count();
                let chars = text.chars().count();
                Ok(format!(
                    "{} lines, {} words, {} characters",
                    lines, words, chars
                ))
            }
            Command::Recent => {
                let recent = file_manager.recent_files();
                if recent.is_empty() {
                    Ok("No recent files".to_string())
                } else {
                    let listing = recent
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join("\n");
                    ui.show_modal("Recent files".to_string(), listing);
                    Ok(format!("{} recent files", recent.len()))
                }
            }
            Command::GotoLine(line) => {
                if line == 0 || line > editor.line_count() {
                    Ok(format!("Invalid line number: {}", line))
                } else {
                    editor.set_caret(editor.line_start_offset(line - 1));
                    Ok(String::new())
                }
            }
            Command::Substitute {
                pattern,
                replacement,
                whole_buffer,
                all,
            } => Ok(search.substitute(editor, &pattern, &replacement, whole_buffer, all)),
            Command::Search { pattern } => Ok(search.search(editor, &pattern, true)),
            Command::Nothing => Ok(String::new()),
            Command::Invalid(message) => Ok(message),
            Command::Unknown(name) => Ok(format!("Command not recognised: {}", name)),
        }
    }
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}

// Snapshot the live editor into the current buffer record before anything
// switches away from it.
fn stash_current(editor: &Editor, buffers: &mut BufferList) {
    let buffer = buffers.current_mut();
    buffer.content = editor.text();
    buffer.modified = editor.is_modified();
}

fn load_current(editor: &mut Editor, buffers: &BufferList, file_manager: &mut FileManager) {
    let buffer = buffers.current();
    editor.set_text(&buffer.content);
    editor.set_modified(buffer.modified);
    editor.set_caret(0);
    file_manager.set_current_path(buffer.path.clone());
}

fn buffer_switch_message(buffers: &BufferList) -> String {
    format!(
        "Buffer {} of {}: {}",
        buffers.current_index() + 1,
        buffers.len(),
        buffers.current().display_name()
    )
}

pub(crate) fn help_text(topic: Option<&str>) -> String {
    match topic {
        Some("motions") => "\
Motions (normal mode):
  h j k l      left, down, up, right
  w b e        word forward / backward / end
  0 $          line start / line end
  gg G         buffer start / buffer end
  <number>     :N jumps to line N"
            .to_string(),
        Some("commands") => "\
Ex commands:
  :w [file]    write buffer
  :q  :q!      quit / force quit
  :wq :x       write and quit
  :e file      edit file
  :bn :bp      next / previous buffer
  :ls          list buffers
  :bd  :bd!    delete buffer / force
  :set nu      line numbers on (nonu: off)
  :wc          word count
  :recent      recently opened files
  :N           go to line N
  :s/a/b/      substitute on current line
  :%s/a/b/g    substitute in whole buffer
  /pattern     search (n/N cycle matches)"
            .to_string(),
        _ => "\
Shed: Vim-style key bindings

Modes:
  i a o O      enter insert mode
  v            visual mode    R  replace mode
  : /          command / search line
  Esc          back to normal mode

Editing (normal mode):
  x            delete char    dd delete line
  dw           delete word    D  delete to line end
  cc cw C      change line / word / to line end
  yy           yank line      p P paste
  .            repeat last edit

Type :help motions or :help commands for more."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(Command::parse(":w"), Command::Write { path: None });
        assert_eq!(
            Command::parse(":w notes.txt"),
            Command::Write {
                path: Some(PathBuf::from("notes.txt"))
            }
        );
        assert_eq!(Command::parse(":q"), Command::Quit { force: false });
        assert_eq!(Command::parse(":q!"), Command::Quit { force: true });
        assert_eq!(Command::parse(":quit!"), Command::Quit { force: true });
        assert_eq!(Command::parse(":wq"), Command::WriteQuit);
        assert_eq!(Command::parse(":x"), Command::WriteQuit);
        assert_eq!(Command::parse(":bn"), Command::BufferNext);
        assert_eq!(Command::parse(":bprev"), Command::BufferPrev);
        assert_eq!(Command::parse(":ls"), Command::ListBuffers);
        assert_eq!(
            Command::parse(":bd!"),
            Command::BufferDelete { force: true }
        );
        assert_eq!(Command::parse(":wc"), Command::WordCount);
        assert_eq!(Command::parse(":recent"), Command::Recent);
        assert_eq!(Command::parse(":42"), Command::GotoLine(42));
        assert_eq!(Command::parse(""), Command::Nothing);
    }

    #[test]
    fn test_parse_edit_requires_argument() {
        assert_eq!(
            Command::parse(":e"),
            Command::Invalid("Error: :e requires filename argument".to_string())
        );
        assert_eq!(
            Command::parse(":e main.rs"),
            Command::Edit {
                path: PathBuf::from("main.rs")
            }
        );
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            Command::parse(":set nu"),
            Command::Set {
                option: "nu".to_string()
            }
        );
        assert_eq!(
            Command::parse(":set"),
            Command::Invalid("Error: :set requires argument".to_string())
        );
    }

    #[test]
    fn test_parse_substitute() {
        assert_eq!(
            Command::parse(":%s/foo/qux/g"),
            Command::Substitute {
                pattern: "foo".to_string(),
                replacement: "qux".to_string(),
                whole_buffer: true,
                all: true,
            }
        );
        assert_eq!(
            Command::parse(":s/a b/c d/"),
            Command::Substitute {
                pattern: "a b".to_string(),
                replacement: "c d".to_string(),
                whole_buffer: false,
                all: false,
            }
        );
        assert!(matches!(Command::parse(":s"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_search_shorthand() {
        assert_eq!(
            Command::parse("/needle"),
            Command::Search {
                pattern: "needle".to_string()
            }
        );
        assert!(matches!(Command::parse("/"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            Command::parse(":frobnicate"),
            Command::Unknown("frobnicate".to_string())
        );
    }

    #[tokio::test]
    async fn test_quit_guard_on_modified_buffer() {
        let cp = CommandProcessor::new();
        let mut editor = Editor::new();
        let mut fm = FileManager::new();
        let mut buffers = BufferList::new();
        let mut search = SearchEngine::new();
        let mut ui = UIState::new();

        editor.insert_char('a');
        let message = cp
            .execute(":q", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert!(message.contains("No write since last change"));
        assert!(!ui.should_quit());

        let message = cp
            .execute(":q!", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(message, "Quitting");
        assert!(ui.should_quit());
    }

    #[tokio::test]
    async fn test_substitute_scenario() {
        let cp = CommandProcessor::new();
        let mut editor = Editor::new();
        editor.set_text("foo bar foo baz");
        let mut fm = FileManager::new();
        let mut buffers = BufferList::new();
        let mut search = SearchEngine::new();
        let mut ui = UIState::new();

        let message = cp
            .execute(
                ":%s/foo/qux/g",
                &mut editor,
                &mut fm,
                &mut buffers,
                &mut search,
                &mut ui,
            )
            .await
            .unwrap();
        assert_eq!(editor.text(), "qux bar qux baz");
        assert_eq!(message, "Replaced 2 occurrences");
    }

    #[tokio::test]
    async fn test_goto_line_out_of_range() {
        let cp = CommandProcessor::new();
        let mut editor = Editor::new();
        editor.set_text("1\n2\n3\n4\n5\n6\n7\n8\n9\n10");
        editor.set_caret(4);
        let mut fm = FileManager::new();
        let mut buffers = BufferList::new();
        let mut search = SearchEngine::new();
        let mut ui = UIState::new();

        let message = cp
            .execute(":15", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(message, "Invalid line number: 15");
        assert_eq!(editor.caret(), 4); // unchanged

        cp.execute(":3", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(editor.caret(), 4); // start of line 3 happens to be offset 4
        cp.execute(":1", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(editor.caret(), 0);
    }

    #[tokio::test]
    async fn test_set_toggles_line_numbers() {
        let cp = CommandProcessor::new();
        let mut editor = Editor::new();
        let mut fm = FileManager::new();
        let mut buffers = BufferList::new();
        let mut search = SearchEngine::new();
        let mut ui = UIState::new();

        let message = cp
            .execute(":set nu", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(message, "Line numbers enabled");
        assert!(ui.line_numbers);

        let message = cp
            .execute(":set nonu", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(message, "Line numbers disabled");
        assert!(!ui.line_numbers);

        let message = cp
            .execute(":set wibble", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(message, "Unknown option: wibble");
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_an_error() {
        let cp = CommandProcessor::new();
        let mut editor = Editor::new();
        let mut fm = FileManager::new();
        let mut buffers = BufferList::new();
        let mut search = SearchEngine::new();
        let mut ui = UIState::new();

        let result = cp
            .execute(":frob", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await;
        assert_eq!(result.unwrap(), "Command not recognised: frob");
    }

    #[tokio::test]
    async fn test_wordcount() {
        let cp = CommandProcessor::new();
        let mut editor = Editor::new();
        editor.set_text("one two\nthree");
        let mut fm = FileManager::new();
        let mut buffers = BufferList::new();
        let mut search = SearchEngine::new();
        let mut ui = UIState::new();

        let message = cp
            .execute(":wc", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(message, "2 lines, 3 words, 13 characters");

        editor.set_text("");
        let message = cp
            .execute(":wc", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(message, "0 lines, 0 words, 0 characters");
    }

    #[tokio::test]
    async fn test_buffer_switch_persists_content() {
        let cp = CommandProcessor::new();
        let mut editor = Editor::new();
        let mut fm = FileManager::new();
        let mut buffers = BufferList::new();
        let mut search = SearchEngine::new();
        let mut ui = UIState::new();

        // Type into the unnamed buffer, then open a second one.
        editor.insert_char('A');
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "from disk").unwrap();
        let cmd = format!(":e {}", temp.path().display());
        cp.execute(&cmd, &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(editor.text(), "from disk");
        assert_eq!(editor.caret(), 0);
        assert_eq!(buffers.len(), 2);

        // Cycle back: the typed character survived the switch.
        cp.execute(":bn", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(editor.text(), "A");
        assert!(editor.is_modified());
    }

    #[tokio::test]
    async fn test_bd_guard_and_close_signal() {
        let cp = CommandProcessor::new();
        let mut editor = Editor::new();
        let mut fm = FileManager::new();
        let mut buffers = BufferList::new();
        let mut search = SearchEngine::new();
        let mut ui = UIState::new();

        editor.insert_char('x');
        let message = cp
            .execute(":bd", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert!(message.contains("use :bd! to override"));
        assert!(!ui.should_quit());

        // Forcing away the only buffer closes the session.
        let message = cp
            .execute(":bd!", &mut editor, &mut fm, &mut buffers, &mut search, &mut ui)
            .await
            .unwrap();
        assert_eq!(message, "Quitting");
        assert!(ui.should_quit());
    }
}
