//! UI rendering for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::app::{App, ConnectionStatus, MessageAuthor};

/// Main render function.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(5),    // Chat log
            Constraint::Length(3), // Input line
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_messages(frame, app, chunks[1]);
    render_input(frame, app, chunks[2]);
}

/// Render the status bar.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status_color = match app.status {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Error(_) => Color::Red,
        ConnectionStatus::Disconnected => Color::DarkGray,
        ConnectionStatus::Connecting => Color::Yellow,
    };

    let status_text = match &app.status {
        ConnectionStatus::Error(e) => format!("Error: {}", e),
        other => other.display().to_string(),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", status_text),
            Style::default()
                .fg(status_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(app.relay_addr.clone(), Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::styled(
            format!("{}↑ {}↓", app.messages_sent, app.messages_received),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" blindrelay ")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(header, area);
}

/// Render the chat log.
fn render_messages(frame: &mut Frame, app: &App, area: Rect) {
    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.messages {
        let (prefix, style) = match &msg.author {
            MessageAuthor::You => (
                format!("[{}] you: ", msg.time),
                Style::default().fg(Color::Green),
            ),
            MessageAuthor::Peer(id) => (
                format!("[{}] peer {}: ", msg.time, id),
                Style::default().fg(Color::Blue),
            ),
            MessageAuthor::System => (
                format!("[{}] ", msg.time),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ),
            MessageAuthor::Warning => (
                format!("[{}] ! ", msg.time),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        };

        let prefix_len = prefix.chars().count();
        let content_width = inner_width.saturating_sub(prefix_len).max(1);

        for (i, part) in wrap_text(&msg.content, content_width).into_iter().enumerate() {
            let lead = if i == 0 {
                Span::styled(prefix.clone(), style)
            } else {
                Span::raw(" ".repeat(prefix_len))
            };
            lines.push(Line::from(vec![lead, Span::raw(part)]));
        }
    }

    // Window the lines with the scroll offset, bottom-anchored
    let total = lines.len();
    let start = total
        .saturating_sub(inner_height)
        .saturating_sub(app.scroll_offset);
    let end = start.saturating_add(inner_height).min(total);

    let items: Vec<ListItem> = lines[start..end]
        .iter()
        .map(|line| ListItem::new(line.clone()))
        .collect();

    let title = if app.scroll_offset > 0 {
        format!(" Messages [↑{}] ", app.scroll_offset)
    } else {
        " Messages ".to_string()
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

/// Render the input line.
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let inner_width = area.width.saturating_sub(2) as usize;

    let placeholder = if app.is_connected() {
        "Type a message... (Ctrl+C to quit)"
    } else {
        "Not connected"
    };

    // Window the input so the cursor stays visible
    let chars: Vec<char> = app.input.chars().collect();
    let window_start = if app.cursor_position >= inner_width && inner_width > 0 {
        app.cursor_position - (inner_width - 1)
    } else {
        0
    };
    let window_end = (window_start + inner_width).min(chars.len());
    let visible: String = chars[window_start.min(chars.len())..window_end].iter().collect();
    let visible_cursor = app.cursor_position - window_start;

    let (display, style) = if app.input.is_empty() {
        (placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (visible, Style::default().fg(Color::White))
    };

    let remaining = app.remaining_chars();
    let counter_style = if remaining == 0 {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if remaining <= 20 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let counter = format!(" {}/{} ", app.input.chars().count(), app.max_message_len);

    let border_style = if !app.is_connected() {
        Style::default().fg(Color::DarkGray)
    } else if remaining == 0 {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    let input = Paragraph::new(display).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Input ")
            .title_bottom(Line::from(Span::styled(counter, counter_style)).right_aligned())
            .border_style(border_style),
    );

    frame.render_widget(input, area);

    if app.is_connected() {
        let cursor_x = area.x + 1 + visible_cursor as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(2)), cursor_y));
    }
}

/// Hard-wrap text into chunks of at most `width` characters.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 || text.is_empty() {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
