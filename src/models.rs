use chrono::NaiveDate;
use serde::Serialize;

pub const ALL_DAY: &str = "All Day";
pub const UNTITLED_EVENT: &str = "Untitled Event";
pub const UNTITLED_TASK: &str = "Untitled Task";
pub const DEFAULT_TASK_LIST: &str = "My Tasks";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputMode {
    Navigate,
    Composing,
}

/// Middle panel currently shown (the left rail selects between these).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Panel {
    Chat,
    Tasks,
    Calendar,
}

impl Panel {
    pub fn all() -> [Panel; 3] {
        [Panel::Chat, Panel::Tasks, Panel::Calendar]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Panel::Chat => "Jarvis Chat",
            Panel::Tasks => "Tasks",
            Panel::Calendar => "Calendar",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Panel::Chat => "Chat",
            Panel::Tasks => "Tasks",
            Panel::Calendar => "Calendar",
        }
    }

    pub fn next(&self) -> Panel {
        match self {
            Panel::Chat => Panel::Tasks,
            Panel::Tasks => Panel::Calendar,
            Panel::Calendar => Panel::Chat,
        }
    }

    pub fn prev(&self) -> Panel {
        match self {
            Panel::Chat => Panel::Calendar,
            Panel::Tasks => Panel::Chat,
            Panel::Calendar => Panel::Tasks,
        }
    }
}

/// One normalized calendar occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgendaItem {
    /// Local clock string, or [`ALL_DAY`].
    pub time: String,
    pub event: String,
    /// Local calendar day the event starts on.
    pub date: NaiveDate,
}

/// Read-only snapshot of a provider task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskItem {
    pub title: String,
    pub due: Option<String>,
    pub list_title: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConnectionState {
    Disconnected,
    Loading,
    Connected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Not connected",
            ConnectionState::Loading => "Syncing…",
            ConnectionState::Connected => "Google connected",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Jarvis,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: i64,
    pub author: Author,
    pub content: String,
    pub timestamp: String,
}

/// Parses a `YYYY-MM-DD` calendar day key.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_keys_parse_as_calendar_days() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(parse_date_key("2025-03-07"), Some(date));
        assert_eq!(parse_date_key(" 2025-03-07 "), Some(date));
        assert_eq!(parse_date_key("not-a-date"), None);
    }

    #[test]
    fn panel_cycle_wraps_around() {
        for panel in Panel::all() {
            assert_eq!(panel.next().prev(), panel);
        }
        assert_eq!(Panel::Calendar.next(), Panel::Chat);
    }

    #[test]
    fn author_serializes_lowercase() {
        let json = serde_json::to_string(&Author::Jarvis).unwrap();
        assert_eq!(json, "\"jarvis\"");
    }
}
