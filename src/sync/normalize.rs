//! Raw provider records to the client's agenda/task shapes.

use crate::integrations::backend::{RemoteEvent, RemoteTask};
use crate::models::{
    ALL_DAY, AgendaItem, DEFAULT_TASK_LIST, TaskItem, UNTITLED_EVENT, UNTITLED_TASK,
    parse_date_key,
};
use chrono::{DateTime, NaiveDate, TimeZone};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormattedEvents {
    pub all_events: Vec<AgendaItem>,
    pub today_events: Vec<AgendaItem>,
}

/// Timed starts are converted into `tz` before taking the calendar day;
/// all-day starts are already calendar days and are used verbatim, so a
/// negative UTC offset never pulls them back a day. Events without a usable
/// start land on `today`.
pub fn format_events<Tz: TimeZone>(
    items: &[RemoteEvent],
    tz: &Tz,
    today: NaiveDate,
    clock_format: &str,
) -> FormattedEvents
where
    Tz::Offset: std::fmt::Display,
{
    let all_events: Vec<AgendaItem> = items
        .iter()
        .map(|item| format_event(item, tz, today, clock_format))
        .collect();
    let today_events = all_events
        .iter()
        .filter(|item| item.date == today)
        .cloned()
        .collect();
    FormattedEvents {
        all_events,
        today_events,
    }
}

fn format_event<Tz: TimeZone>(
    item: &RemoteEvent,
    tz: &Tz,
    today: NaiveDate,
    clock_format: &str,
) -> AgendaItem
where
    Tz::Offset: std::fmt::Display,
{
    let start = item.start.as_ref();
    let timed = start
        .and_then(|s| s.date_time.as_deref())
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| dt.with_timezone(tz));

    let (date, time) = match timed {
        Some(local) => (
            local.date_naive(),
            local.format(clock_format).to_string(),
        ),
        None => {
            let date = start
                .and_then(|s| s.date.as_deref())
                .and_then(parse_date_key)
                .unwrap_or(today);
            (date, ALL_DAY.to_string())
        }
    };

    AgendaItem {
        time,
        event: non_blank(item.summary.as_deref()).unwrap_or(UNTITLED_EVENT).to_string(),
        date,
    }
}

pub fn format_tasks(items: &[RemoteTask]) -> Vec<TaskItem> {
    items
        .iter()
        .map(|item| TaskItem {
            title: non_blank(item.title.as_deref()).unwrap_or(UNTITLED_TASK).to_string(),
            due: non_blank(item.due.as_deref()).map(str::to_string),
            list_title: non_blank(item.list_title.as_deref())
                .unwrap_or(DEFAULT_TASK_LIST)
                .to_string(),
        })
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
