use crate::app::App;
use crate::ui::components::centered_rect;
use crate::ui::theme::ThemeTokens;
use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub fn render_connect_popup(f: &mut Frame, app: &App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    let block = Block::default()
        .title(" Google Sync ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_active));
    let area = centered_rect(70, 40, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let text_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(100)])
        .margin(2)
        .split(area);

    let accent = Style::default()
        .fg(tokens.accent)
        .add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(tokens.muted);

    let mut lines = vec![
        Line::from(Span::styled("Connect your Google account", accent)),
        Line::from(""),
    ];

    if let Some(display) = app.callback_display.as_ref() {
        let remaining_seconds = display
            .expires_at
            .signed_duration_since(Local::now())
            .num_seconds()
            .max(0);
        let remaining_text = if remaining_seconds > 0 {
            format!(
                "Expires in {:02}m {:02}s",
                remaining_seconds / 60,
                remaining_seconds % 60
            )
        } else {
            "Sign-in expired. Press c to try again.".to_string()
        };

        lines.push(Line::from("Sign in with Google in your browser:"));
        lines.push(Line::from(Span::styled(display.login_url.as_str(), accent)));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Jarvis is waiting for the redirect on {}", display.local_url),
            muted,
        )));
        lines.push(Line::from(Span::styled(remaining_text, muted)));
    } else {
        lines.push(Line::from(Span::styled("Starting Google sign-in…", muted)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[Enter] Open browser    [Esc] Close",
        muted,
    )));

    let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
    f.render_widget(paragraph, text_area[0]);
}

pub fn render_help_popup(f: &mut Frame, app: &App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_default));
    let area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let inner_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .margin(2)
        .split(area);

    let sections = help_sections(app);
    let column_count = if inner_area[0].width >= 90 { 2 } else { 1 };
    let per_column = sections.len().div_ceil(column_count);
    let column_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Ratio(1, column_count as u32);
            column_count
        ])
        .split(inner_area[0]);

    for (area, chunk) in column_areas.iter().zip(sections.chunks(per_column.max(1))) {
        render_help_column(f, *area, chunk, &tokens);
    }

    f.render_widget(
        Paragraph::new("Esc / ?: close").style(Style::default().fg(tokens.muted)),
        inner_area[1],
    );
}

struct HelpSection {
    title: &'static str,
    entries: Vec<(&'static str, String)>,
}

fn help_sections(app: &App) -> Vec<HelpSection> {
    let kb = &app.config.keybindings;
    vec![
        HelpSection {
            title: "Global",
            entries: vec![
                ("Next / previous panel", fmt_pair(&kb.global.next_panel, &kb.global.prev_panel)),
                ("Chat", fmt_keys(&kb.global.chat)),
                ("Tasks", fmt_keys(&kb.global.tasks)),
                ("Calendar", fmt_keys(&kb.global.calendar)),
                ("Connect Google", fmt_keys(&kb.global.connect)),
                ("Refresh Google data", fmt_keys(&kb.global.refresh)),
                ("Help", fmt_keys(&kb.global.help)),
                ("Quit", fmt_keys(&kb.global.quit)),
            ],
        },
        HelpSection {
            title: "Chat",
            entries: vec![
                ("Write a message", fmt_keys(&kb.chat.compose)),
                ("Send", fmt_keys(&kb.chat.send)),
                ("New line", fmt_keys(&kb.chat.newline)),
                ("Stop writing", fmt_keys(&kb.chat.cancel)),
                ("Scroll up / down", fmt_pair(&kb.chat.scroll_up, &kb.chat.scroll_down)),
            ],
        },
        HelpSection {
            title: "Tasks",
            entries: vec![("Move up / down", fmt_pair(&kb.tasks.up, &kb.tasks.down))],
        },
        HelpSection {
            title: "Calendar",
            entries: vec![
                ("Previous / next day", fmt_pair(&kb.calendar.left, &kb.calendar.right)),
                ("Previous / next week", fmt_pair(&kb.calendar.up, &kb.calendar.down)),
                (
                    "Previous / next month",
                    fmt_pair(&kb.calendar.prev_month, &kb.calendar.next_month),
                ),
                ("Today", fmt_keys(&kb.calendar.today)),
            ],
        },
    ]
}

fn render_help_column(f: &mut Frame, area: Rect, sections: &[HelpSection], tokens: &ThemeTokens) {
    let header_style = Style::default()
        .fg(tokens.accent)
        .add_modifier(Modifier::BOLD);
    let key_style = Style::default().fg(tokens.accent);

    let key_width = sections
        .iter()
        .flat_map(|s| s.entries.iter())
        .map(|(_, keys)| keys.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for (idx, section) in sections.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(section.title, header_style)));
        for (label, keys) in &section.entries {
            let padding = key_width.saturating_sub(keys.chars().count());
            lines.push(Line::from(vec![
                Span::styled(keys.clone(), key_style),
                Span::raw(" ".repeat(padding + 2)),
                Span::raw(*label),
            ]));
        }
    }

    f.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn fmt_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        return "-".to_string();
    }
    keys.join(" / ")
}

fn fmt_pair(first: &[String], second: &[String]) -> String {
    format!("{} | {}", fmt_keys(first), fmt_keys(second))
}
