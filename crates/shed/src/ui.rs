use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Mode};
use crate::status::MessageType;

const GUTTER_WIDTH: u16 = 5;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Editor area
            Constraint::Length(2), // Status bar
        ])
        .split(f.size());

    draw_title_bar(f, app, chunks[0]);
    if app.ui_state.modal().is_some() {
        draw_modal(f, app, chunks[1]);
    } else {
        draw_editor(f, app, chunks[1]);
    }
    draw_status_bar(f, app, chunks[2]);
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let name = match app.file_manager.current_path() {
        Some(path) => format!("  Shed -- {}", path.display()),
        None => String::from("  Shed -- [New File]"),
    };
    let modified = if app.editor.is_modified() {
        " [Modified]"
    } else {
        ""
    };
    let title_bar = Paragraph::new(format!("{}{}", name, modified))
        .style(Style::default().bg(Color::Blue).fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(title_bar, area);
}

fn draw_editor(f: &mut Frame, app: &mut App, area: Rect) {
    let (text_area, gutter_area) = if app.ui_state.line_numbers {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(GUTTER_WIDTH), Constraint::Min(0)])
            .split(area);
        (chunks[1], Some(chunks[0]))
    } else {
        (area, None)
    };

    let height = text_area.height as usize;
    let (cursor_line, cursor_col) = app.editor.cursor_line_col();
    let first_line = if height > 0 && cursor_line >= height {
        cursor_line + 1 - height
    } else {
        0
    };
    let last_line = (first_line + height).min(app.editor.line_count().max(1));

    if let Some(gutter) = gutter_area {
        let numbers: Vec<Line> = (first_line..last_line)
            .map(|i| Line::from(format!("{:>4} ", i + 1)))
            .collect();
        let widget = Paragraph::new(numbers)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(widget, gutter);
    }

    let lines: Vec<Line> = (first_line..last_line)
        .map(|i| styled_line(app, i))
        .collect();
    let content = Paragraph::new(lines).style(Style::default().fg(Color::White));
    f.render_widget(content, text_area);

    if app.mode() != Mode::Command {
        let row = cursor_line.saturating_sub(first_line);
        let prefix: String = app
            .editor
            .line(cursor_line)
            .chars()
            .take(cursor_col)
            .collect();
        let x = text_area.x + prefix.as_str().width() as u16;
        let y = text_area.y + row as u16;
        if x < text_area.x + text_area.width && y < text_area.y + text_area.height {
            f.set_cursor(x, y);
        }
    }
}

// One rendered buffer line with visual-selection and search-match styling.
fn styled_line(app: &App, line_idx: usize) -> Line<'static> {
    let raw = app.editor.line(line_idx);
    let text: String = raw.trim_end_matches('\n').to_string();
    let start = app.editor.line_start_offset(line_idx);

    let selection = if app.mode() == Mode::Visual {
        app.editor.selection_range()
    } else {
        None
    };
    let matches = app.search.matches();
    let pattern_len = app.search.pattern().chars().count();
    let current = app.search.current_index();

    let mut spans: Vec<Span> = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();
    for (i, c) in text.chars().enumerate() {
        let style = char_style(start + i, selection, matches, pattern_len, current);
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push(c);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    Line::from(spans)
}

fn char_style(
    offset: usize,
    selection: Option<(usize, usize)>,
    matches: &[usize],
    pattern_len: usize,
    current: Option<usize>,
) -> Style {
    if let Some((start, end)) = selection {
        if offset >= start && offset < end {
            return Style::default().add_modifier(Modifier::REVERSED);
        }
    }
    if pattern_len > 0 {
        for (i, &pos) in matches.iter().enumerate() {
            if offset >= pos && offset < pos + pattern_len {
                // Current match stands out from the rest.
                return if current == Some(i) {
                    Style::default().bg(Color::Rgb(255, 165, 0)).fg(Color::Black)
                } else {
                    Style::default().bg(Color::Yellow).fg(Color::Black)
                };
            }
        }
    }
    Style::default()
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let mode_bg = parse_hex_color(app.config.mode_color(app.mode())).unwrap_or(Color::DarkGray);
    let status_line = Paragraph::new(format!(" {}", app.status_line()))
        .style(Style::default().bg(mode_bg).fg(Color::White));
    f.render_widget(status_line, chunks[0]);

    if app.mode() == Mode::Command {
        let input = Paragraph::new(app.ui_state.command_buffer.clone())
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(input, chunks[1]);
        let x = chunks[1].x + app.ui_state.command_buffer.as_str().width() as u16;
        f.set_cursor(x, chunks[1].y);
    } else if let Some(message) = app.ui_state.status.current() {
        let color = match message.message_type {
            MessageType::Info => Color::White,
            MessageType::Success => Color::Green,
            MessageType::Warning => Color::Yellow,
            MessageType::Error => Color::Red,
        };
        let status = Paragraph::new(message.content.clone()).style(Style::default().fg(color));
        f.render_widget(status, chunks[1]);
    }
}

fn draw_modal(f: &mut Frame, app: &App, area: Rect) {
    let Some(modal) = app.ui_state.modal() else {
        return;
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", modal.title))
        .border_style(Style::default().fg(Color::Blue));
    let body = Paragraph::new(modal.body.clone())
        .style(Style::default().fg(Color::White))
        .block(block)
        .alignment(Alignment::Left);
    f.render_widget(body, area);
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}
