use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::App;
use crate::models::{Author, ChatMessage, ConnectionState, InputMode, Panel, TaskItem};
use crate::sync::SyncView;
use unicode_width::UnicodeWidthStr;

pub mod calendar;
pub mod color_parser;
pub mod components;
pub mod popups;
pub mod theme;

use calendar::{CalendarProps, render_calendar};
use components::{truncate_to_width, wrap_message};
use popups::{render_connect_popup, render_help_popup};
use theme::ThemeTokens;

const RAIL_WIDTH: u16 = 18;
const DIGEST_WIDTH: u16 = 36;

pub fn ui(f: &mut Frame, app: &mut App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());
    let (main_area, status_area) = (chunks[0], chunks[1]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(RAIL_WIDTH),
            Constraint::Min(20),
            Constraint::Length(DIGEST_WIDTH),
        ])
        .split(main_area);

    render_rail(f, columns[0], app, &tokens);
    match app.panel {
        Panel::Chat => render_chat(f, columns[1], app, &tokens),
        Panel::Tasks => render_tasks(f, columns[1], app, &tokens),
        Panel::Calendar => {
            let view = app.sync.view();
            let grid = app.month.grid(app.today);
            let props = CalendarProps {
                grid: &grid,
                events: view.agenda,
                selected: app.month.selected_date(),
                connected: view.connected,
                loading: view.loading,
            };
            render_calendar(f, columns[1], &props, &tokens);
        }
    }
    render_digest(f, columns[2], &app.sync.view(), &tokens);
    render_status_bar(f, status_area, app, &tokens);

    if app.show_connect_popup {
        render_connect_popup(f, app);
    }
    if app.show_help_popup {
        render_help_popup(f, app);
    }
}

fn render_rail(f: &mut Frame, area: Rect, app: &App, tokens: &ThemeTokens) {
    let block = Block::default()
        .title(" Jarvis ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_default));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    for (idx, panel) in Panel::all().iter().enumerate() {
        let label = format!(" {} {}", idx + 1, panel.label());
        let style = if *panel == app.panel {
            Style::default()
                .fg(tokens.accent)
                .bg(tokens.selection_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(label, style)));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn render_chat(f: &mut Frame, area: Rect, app: &mut App, tokens: &ThemeTokens) {
    let composer_height = if app.input_mode == InputMode::Composing { 5 } else { 3 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(composer_height)])
        .split(area);

    let block = Block::default()
        .title(format!(" {} ", Panel::Chat.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Navigate {
            tokens.border_active
        } else {
            tokens.border_default
        }));
    let inner = block.inner(chunks[0]);
    f.render_widget(block, chunks[0]);

    let mut lines = message_lines(&app.messages, inner.width as usize, tokens);
    if app.is_waiting_for_reply() {
        lines.push(Line::from(Span::styled(
            "Jarvis is typing…",
            Style::default().fg(tokens.muted),
        )));
    }
    let total = lines.len() as u16;
    let max_top = total.saturating_sub(inner.height);
    app.chat_scroll = app.chat_scroll.min(max_top);
    let top = max_top - app.chat_scroll;
    f.render_widget(Paragraph::new(Text::from(lines)).scroll((top, 0)), inner);

    let composer_border = if app.input_mode == InputMode::Composing {
        tokens.border_active
    } else {
        tokens.border_default
    };
    app.composer.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(composer_border)),
    );
    f.render_widget(&app.composer, chunks[1]);
}

pub fn message_lines(
    messages: &[ChatMessage],
    width: usize,
    tokens: &ThemeTokens,
) -> Vec<Line<'static>> {
    let body_width = width.saturating_sub(2).max(1);
    let mut lines = Vec::new();
    for (idx, message) in messages.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }
        let (name, color) = match message.author {
            Author::User => ("You", tokens.user_message),
            Author::Jarvis => ("Jarvis", tokens.jarvis_message),
        };
        lines.push(Line::from(vec![
            Span::styled(
                name,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", message.timestamp),
                Style::default().fg(tokens.muted),
            ),
        ]));
        for row in wrap_message(&message.content, body_width) {
            lines.push(Line::from(format!("  {row}")));
        }
    }
    lines
}

fn render_tasks(f: &mut Frame, area: Rect, app: &mut App, tokens: &ThemeTokens) {
    let block = Block::default()
        .title(format!(" {} ", Panel::Tasks.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_active));

    let view = app.sync.view();
    if !view.connected || view.tasks.is_empty() {
        let text = if view.loading {
            "Syncing with Google…"
        } else if !view.connected {
            "Connect your Google account to sync and view your tasks here. Press c to connect."
        } else {
            "You have no tasks."
        };
        let hint = Paragraph::new(text)
            .style(Style::default().fg(tokens.muted))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(hint, area);
        return;
    }

    let width = block.inner(area).width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = view
        .tasks
        .iter()
        .map(|task| {
            ListItem::new(vec![
                Line::from(truncate_to_width(&task.title, width)),
                Line::from(Span::styled(
                    format!("  {} · Due: {}", task.list_title, due_label(task)),
                    Style::default().fg(tokens.muted),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(tokens.selection_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("› ");
    f.render_stateful_widget(list, area, &mut app.tasks_state);
}

/// Provider due strings are RFC 3339 timestamps whose date part is the due
/// day; anything else is shown as is.
fn due_label(task: &TaskItem) -> String {
    match task.due.as_deref() {
        Some(due) => due.split('T').next().unwrap_or(due).to_string(),
        None => "No due date".to_string(),
    }
}

fn render_digest(f: &mut Frame, area: Rect, view: &SyncView<'_>, tokens: &ThemeTokens) {
    let block = Block::default()
        .title(" Today's Overview ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_default));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(digest_lines(view, inner.width as usize, tokens)).wrap(Wrap { trim: false }),
        inner,
    );
}

pub fn digest_lines(view: &SyncView<'_>, width: usize, tokens: &ThemeTokens) -> Vec<Line<'static>> {
    let header = Style::default()
        .fg(tokens.accent)
        .add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(tokens.muted);

    let mut lines = vec![Line::from(Span::styled("REMINDERS", header))];
    if !view.connected {
        lines.push(Line::from(Span::styled(
            "Connect your Google account to sync and view your reminders here.",
            muted,
        )));
    } else if view.tasks.is_empty() {
        lines.push(Line::from(Span::styled("You have no reminders for today.", muted)));
    } else {
        for task in view.tasks {
            lines.push(Line::from(format!(
                "• {}",
                truncate_to_width(&task.title, width.saturating_sub(2))
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("SCHEDULE FOR TODAY", header)));
    if !view.connected {
        lines.push(Line::from(Span::styled(
            "Connect your Google account to sync and view your calendar here.",
            muted,
        )));
    } else if view.today_agenda.is_empty() {
        lines.push(Line::from(Span::styled(
            "You have no events scheduled for today.",
            muted,
        )));
    } else {
        let time_width = view
            .today_agenda
            .iter()
            .map(|item| item.time.width())
            .max()
            .unwrap_or(0);
        for item in view.today_agenda {
            let label_width = width.saturating_sub(time_width + 1);
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<time_width$} ", item.time),
                    Style::default().fg(tokens.event_marker),
                ),
                Span::raw(truncate_to_width(&item.event, label_width)),
            ]));
        }
    }
    lines
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, tokens: &ThemeTokens) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let mode_label = match app.input_mode {
        InputMode::Navigate => "NAVIGATE",
        InputMode::Composing => "COMPOSE",
    };
    let state = app.sync.connection_state();
    let state_color = match state {
        ConnectionState::Connected => tokens.event_marker,
        ConnectionState::Loading => tokens.today,
        ConnectionState::Disconnected => tokens.muted,
    };
    let mut left_spans = vec![
        Span::styled(
            format!(" {mode_label} "),
            Style::default()
                .fg(tokens.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(state.label(), Style::default().fg(state_color)),
    ];
    if app.is_waiting_for_sign_in() {
        left_spans.push(Span::styled(
            "  waiting for Google sign-in",
            Style::default().fg(tokens.muted),
        ));
    }

    let toast = app.toast_message.as_deref().filter(|t| !t.is_empty());
    let right_width = toast
        .map(|t| UnicodeWidthStr::width(t) as u16)
        .unwrap_or(0)
        .min(area.width.saturating_sub(10));

    let status_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right_width)])
        .split(area);
    f.render_widget(Paragraph::new(Line::from(left_spans)), status_chunks[0]);

    if let Some(message) = toast
        && right_width > 0
    {
        let right = Paragraph::new(Span::styled(
            message.to_string(),
            Style::default()
                .fg(tokens.toast)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Right);
        f.render_widget(right, status_chunks[1]);
    }
}
