use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, TextField};
use crate::chat::{ChatMessage, Sender};
use crate::session::{short_peer_id, ConnectionState};

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Length(1), // My ID
            Constraint::Min(0),    // Chat
            Constraint::Length(3), // TTL field
            Constraint::Length(3), // Input area
        ])
        .split(size);

    draw_status_bar(f, app, chunks[0]);
    draw_id_line(f, app, chunks[1]);
    draw_chat_area(f, app, chunks[2]);
    draw_ttl_field(f, app, chunks[3]);
    draw_input_area(f, app, chunks[4]);

    if app.input_mode == InputMode::Connect {
        draw_connect_popup(f, app, size);
    }
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (status, color) = match app.session.state() {
        ConnectionState::Connected { peer_id } => {
            (format!("🔒 Connected to {}...", short_peer_id(peer_id)), Color::Green)
        }
        ConnectionState::Disconnected => ("🔓 Not Connected".to_string(), Color::Red),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(color))
        .title(" burnchat ");

    let paragraph = Paragraph::new(Span::styled(
        status,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .block(block)
    .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}

fn draw_id_line(f: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" My ID: ", Style::default().fg(Color::Gray)),
        Span::styled(app.session.local_id(), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_chat_area(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Chat ({}) ", app.visible.len()))
        .style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let now = app.now();
    let mut lines = Vec::new();
    for message in &app.visible {
        lines.extend(message_lines(message, now));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No messages yet. Press 'i' to type, 'c' to connect, or /help for commands.",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    let messages_widget = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Scroll is counted in wrapped rows. Pin to the newest row unless the user has scrolled back.
    let rows = messages_widget.line_count(inner.width);
    let max_scroll = rows.saturating_sub(inner.height as usize);
    app.set_scroll_limit(max_scroll);
    let top = max_scroll.saturating_sub(app.scroll_offset);
    let top = u16::try_from(top).unwrap_or(u16::MAX);

    f.render_widget(messages_widget.scroll((top, 0)), inner);
}

fn message_lines(message: &ChatMessage, now: DateTime<Utc>) -> Vec<Line<'static>> {
    let color = match &message.sender {
        Sender::System => Color::Yellow,
        Sender::You => Color::Blue,
        Sender::Peer(_) => Color::Green,
    };
    let alignment = if message.sender.is_you() {
        Alignment::Right
    } else {
        Alignment::Left
    };

    let body_style = if message.sender.is_system() {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC)
    } else {
        Style::default().fg(Color::White)
    };

    let mut time_info = message.created_at_label.clone();
    if let Some(remaining) = message.remaining_secs(now) {
        time_info.push_str(&format!(" 🔥{}s", remaining));
    }

    vec![
        Line::from(vec![
            Span::styled(
                message.sender.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(time_info, Style::default().fg(Color::DarkGray)),
        ])
        .alignment(alignment),
        Line::from(Span::styled(message.body.clone(), body_style))
            .alignment(alignment),
        Line::default(),
    ]
}

fn draw_ttl_field(f: &mut Frame, app: &App, area: Rect) {
    let active = app.input_mode == InputMode::Ttl;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" ⏱ Auto-delete seconds (optional) ")
        .style(field_style(active));

    let (text, column) = field_window(&app.ttl, area);
    f.render_widget(Paragraph::new(text).block(block), area);

    if active {
        place_cursor(f, area, column);
    }
}

fn draw_input_area(f: &mut Frame, app: &App, area: Rect) {
    let active = app.input_mode == InputMode::Message;
    let mode_indicator = match app.input_mode {
        InputMode::Normal => "[NORMAL] i=type t=TTL c=connect w=wipe y=copy ID q=quit",
        InputMode::Message => "[INPUT] ENTER=send TAB=TTL ESC=normal",
        InputMode::Ttl => "[TTL] seconds, ENTER/TAB=back to message ESC=normal",
        InputMode::Connect => "[CONNECT]",
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .title(mode_indicator)
        .style(field_style(active));

    let (text, column) = field_window(&app.message, area);
    let input_text = if text.is_empty() && !active {
        Span::styled("Type a message...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(text)
    };

    f.render_widget(Paragraph::new(input_text).block(input_block), area);

    if active {
        place_cursor(f, area, column);
    }
}

fn draw_connect_popup(f: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect(60, 12, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Connect to Peer ")
        .style(Style::default().fg(Color::Magenta));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Share ID text
            Constraint::Length(3), // Peer ID input
            Constraint::Min(0),    // Hints
        ])
        .split(inner);

    let share = vec![
        Line::from("Share your ID with your peer:"),
        Line::from(Span::styled(
            app.session.local_id(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from("Enter peer's ID:"),
    ];
    f.render_widget(Paragraph::new(share), rows[0]);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));
    let (text, column) = field_window(&app.peer_input, rows[1]);
    f.render_widget(Paragraph::new(text).block(input_block), rows[1]);
    place_cursor(f, rows[1], column);

    f.render_widget(
        Paragraph::new(Span::styled(
            "ENTER=connect  ESC=cancel",
            Style::default().fg(Color::Gray),
        ))
        .alignment(Alignment::Center),
        rows[2],
    );
}

fn field_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    }
}

/// The part of `field` that fits inside the bordered `area` with the cursor in
/// view, and the cursor's column within that part.
fn field_window(field: &TextField, area: Rect) -> (String, usize) {
    let width = usize::from(area.width.saturating_sub(2));
    let start = field.cursor().saturating_sub(width.saturating_sub(1));
    let text = field.value().chars().skip(start).take(width).collect();
    (text, field.cursor() - start)
}

fn place_cursor(f: &mut Frame, area: Rect, column: usize) {
    let max_x = area.x + area.width.saturating_sub(2);
    let column = u16::try_from(column).unwrap_or(u16::MAX);
    let x = (area.x + 1).saturating_add(column).min(max_x);
    f.set_cursor(x, area.y + 1);
}

/// Rectangle of `percent_x` width and `height` rows centered in `area`.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
