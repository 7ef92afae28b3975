use crate::calendar::{GridCell, MonthGrid, WEEKDAY_LABELS, agenda_for, event_count_label, events_by_date};
use crate::models::AgendaItem;
use crate::ui::components::truncate_to_width;
use crate::ui::theme::ThemeTokens;
use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::collections::HashMap;

const CONNECT_HINT: &str = "Connect your Google account to see your calendar. Press c to connect.";

pub struct CalendarProps<'a> {
    pub grid: &'a MonthGrid,
    pub events: &'a [AgendaItem],
    pub selected: NaiveDate,
    pub connected: bool,
    pub loading: bool,
}

pub fn render_calendar(f: &mut Frame, area: Rect, props: &CalendarProps<'_>, tokens: &ThemeTokens) {
    let block = Block::default()
        .title(" Calendar ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_active));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let grid_height = 2 + props.grid.weeks.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(grid_height),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    let title = Paragraph::new(Line::from(Span::styled(
        props.grid.month_label.clone(),
        Style::default()
            .fg(tokens.accent)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let counts = events_by_date(props.events);
    let cell_width = (chunks[1].width / 7).max(4) as usize;
    f.render_widget(
        Paragraph::new(grid_lines(props.grid, &counts, props.selected, cell_width, tokens)),
        chunks[1],
    );

    f.render_widget(
        Paragraph::new(agenda_lines(props, chunks[3].width as usize, tokens)),
        chunks[3],
    );
}

pub fn grid_lines(
    grid: &MonthGrid,
    counts: &HashMap<NaiveDate, usize>,
    selected: NaiveDate,
    cell_width: usize,
    tokens: &ThemeTokens,
) -> Vec<Line<'static>> {
    let muted = Style::default().fg(tokens.muted);
    let mut lines = vec![
        Line::from(
            WEEKDAY_LABELS
                .iter()
                .map(|label| Span::styled(format!("{label:^cell_width$}"), muted))
                .collect::<Vec<_>>(),
        ),
        Line::from(""),
    ];

    for week in &grid.weeks {
        let spans = week
            .iter()
            .map(|cell| match cell {
                GridCell::Blank => Span::raw(" ".repeat(cell_width)),
                GridCell::Day(day) => {
                    let has_events = counts.get(&day.date).copied().unwrap_or(0) > 0;
                    let marker = if has_events { "•" } else { " " };
                    let text = format!("{:>2}{marker}", day.day);
                    let mut style = Style::default();
                    if has_events {
                        style = style.fg(tokens.event_marker);
                    }
                    if day.is_today {
                        style = style.fg(tokens.today).add_modifier(Modifier::BOLD);
                    }
                    if day.date == selected {
                        style = style.bg(tokens.selection_bg).add_modifier(Modifier::BOLD);
                    }
                    Span::styled(format!("{text:^cell_width$}"), style)
                }
            })
            .collect::<Vec<_>>();
        lines.push(Line::from(spans));
    }
    lines
}

/// Drawer under the grid listing the selected day's events.
pub fn agenda_lines(props: &CalendarProps<'_>, width: usize, tokens: &ThemeTokens) -> Vec<Line<'static>> {
    let muted = Style::default().fg(tokens.muted);
    if !props.connected {
        let text = if props.loading { "Syncing with Google…" } else { CONNECT_HINT };
        return vec![Line::from(Span::styled(text, muted))];
    }

    let items = agenda_for(props.events, props.selected);
    let mut header = vec![Span::styled(
        props.selected.format("%A, %B %-d").to_string(),
        Style::default()
            .fg(tokens.accent)
            .add_modifier(Modifier::BOLD),
    )];
    if !items.is_empty() {
        header.push(Span::styled(format!("  {}", event_count_label(items.len())), muted));
    }
    let mut lines = vec![Line::from(header)];

    if items.is_empty() {
        lines.push(Line::from(Span::styled("No events", muted)));
        return lines;
    }

    let time_width = items.iter().map(|item| item.time.chars().count()).max().unwrap_or(0);
    for item in items {
        let label_width = width.saturating_sub(time_width + 2);
        lines.push(Line::from(vec![
            Span::styled(format!("{:<time_width$}  ", item.time), muted),
            Span::raw(truncate_to_width(&item.event, label_width)),
        ]));
    }
    lines
}
