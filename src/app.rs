use crate::calendar::MonthView;
use crate::config::Config;
use crate::integrations::backend::{Backend, FetchError, HttpBackend};
use crate::integrations::chat::{self, ChatReply};
use crate::models::{Author, ChatMessage, InputMode, Panel};
use crate::sync::SyncManager;
use crate::sync::callback::{CallbackDisplay, CallbackPoll};
use crate::sync::token::FileTokenStore;
use chrono::{DateTime, Duration, Local, NaiveDate};
use ratatui::widgets::ListState;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use tui_textarea::TextArea;

pub const PLACEHOLDER_COMPOSE: &str = "Ask Jarvis… (Enter to send, Shift+Enter for a new line, Esc to go back)";
const PLACEHOLDER_NAVIGATE: &str = "Press i to talk to Jarvis (? for help)…";
const TOAST_SECONDS: i64 = 3;

pub struct App<'a> {
    pub config: Config,
    pub panel: Panel,
    pub input_mode: InputMode,
    pub sync: SyncManager,
    pub month: MonthView,
    /// Local date the UI was last rendered for; a change triggers a refresh.
    pub today: NaiveDate,
    pub tasks_state: ListState,

    pub chat_backend: Arc<HttpBackend>,
    pub messages: Vec<ChatMessage>,
    pub composer: TextArea<'a>,
    pub chat_receiver: Option<Receiver<ChatReply>>,
    /// Rows scrolled up from the newest message.
    pub chat_scroll: u16,

    pub callback_receiver: Option<Receiver<CallbackPoll>>,
    pub callback_display: Option<CallbackDisplay>,
    pub show_connect_popup: bool,
    pub show_help_popup: bool,

    pub toast_message: Option<String>,
    pub toast_expiry: Option<DateTime<Local>>,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(config: Config) -> Result<App<'a>, FetchError> {
        let http = Arc::new(HttpBackend::new(
            &config.backend.resolved_base_url(),
            config.backend.request_timeout_seconds,
        )?);
        let backend: Arc<dyn Backend> = http.clone();
        let store = FileTokenStore::new(config.data.session_path());
        let sync = SyncManager::new(backend, Box::new(store), config.calendar.clock_format());
        Ok(Self::with_sync(config, sync, http))
    }

    pub fn with_sync(config: Config, sync: SyncManager, chat_backend: Arc<HttpBackend>) -> App<'a> {
        let today = Local::now().date_naive();
        let mut composer = TextArea::default();
        composer.set_placeholder_text(PLACEHOLDER_NAVIGATE);

        App {
            config,
            panel: Panel::Chat,
            input_mode: InputMode::Navigate,
            sync,
            month: MonthView::new(today),
            today,
            tasks_state: ListState::default(),
            chat_backend,
            messages: vec![chat::greeting()],
            composer,
            chat_receiver: None,
            chat_scroll: 0,
            callback_receiver: None,
            callback_display: None,
            show_connect_popup: false,
            show_help_popup: false,
            toast_message: None,
            toast_expiry: None,
            should_quit: false,
        }
    }

    pub fn toast(&mut self, message: impl Into<String>) {
        self.toast_message = Some(message.into());
        self.toast_expiry = Some(Local::now() + Duration::seconds(TOAST_SECONDS));
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn select_panel(&mut self, panel: Panel) {
        self.panel = panel;
        if panel == Panel::Tasks {
            self.clamp_task_selection();
        }
    }

    pub fn is_waiting_for_reply(&self) -> bool {
        self.chat_receiver.is_some()
    }

    pub fn is_waiting_for_sign_in(&self) -> bool {
        self.callback_receiver.is_some()
    }

    pub fn tasks_up(&mut self) {
        if self.sync.tasks().is_empty() {
            return;
        }
        let i = self.tasks_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.tasks_state.select(Some(i));
    }

    pub fn tasks_down(&mut self) {
        let len = self.sync.tasks().len();
        if len == 0 {
            return;
        }
        let i = self.tasks_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.tasks_state.select(Some(i));
    }

    /// Keeps the selection inside the current task list after a sync.
    pub fn clamp_task_selection(&mut self) {
        let len = self.sync.tasks().len();
        match self.tasks_state.selected() {
            _ if len == 0 => self.tasks_state.select(None),
            Some(i) if i >= len => self.tasks_state.select(Some(len - 1)),
            None => self.tasks_state.select(Some(0)),
            Some(_) => {}
        }
    }

    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn transition_to(&mut self, mode: InputMode) {
        match mode {
            InputMode::Navigate => {
                self.composer.set_placeholder_text(PLACEHOLDER_NAVIGATE);
            }
            InputMode::Composing => {
                self.panel = Panel::Chat;
                self.composer.set_placeholder_text(PLACEHOLDER_COMPOSE);
            }
        }
        self.input_mode = mode;
    }

    pub fn composer_text(&self) -> String {
        self.composer.lines().join("\n")
    }

    pub fn clear_composer(&mut self) {
        self.composer = TextArea::default();
        let placeholder = match self.input_mode {
            InputMode::Navigate => PLACEHOLDER_NAVIGATE,
            InputMode::Composing => PLACEHOLDER_COMPOSE,
        };
        self.composer.set_placeholder_text(placeholder);
    }

    pub fn push_message(&mut self, author: Author, content: impl Into<String>) {
        let id = self.next_message_id();
        self.messages.push(ChatMessage {
            id,
            author,
            content: content.into(),
            timestamp: chat::chat_timestamp(),
        });
        self.chat_scroll = 0;
    }

    fn next_message_id(&self) -> i64 {
        let now = Local::now().timestamp_millis();
        let last = self.messages.last().map_or(0, |m| m.id);
        now.max(last + 1)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::integrations::backend::{RemoteEvent, RemoteTask};
    use crate::sync::token::{AuthToken, MemoryTokenStore};

    /// Backend that always answers with a fixed task list and no events.
    pub(crate) struct CannedBackend {
        pub tasks: Vec<RemoteTask>,
    }

    impl Backend for CannedBackend {
        fn fetch_events(&self, _token: Option<&AuthToken>) -> Result<Vec<RemoteEvent>, FetchError> {
            Ok(Vec::new())
        }

        fn fetch_tasks(&self, _token: Option<&AuthToken>) -> Result<Vec<RemoteTask>, FetchError> {
            Ok(self.tasks.clone())
        }
    }

    pub(crate) fn make_test_app(task_count: usize) -> App<'static> {
        let tasks = (0..task_count)
            .map(|i| RemoteTask {
                title: Some(format!("Task {i}")),
                due: None,
                list_title: None,
            })
            .collect();
        let backend: Arc<dyn Backend> = Arc::new(CannedBackend { tasks });
        let sync = SyncManager::new(backend, Box::new(MemoryTokenStore::default()), "%H:%M");
        // Nothing listens on the discard port; chat requests fail fast.
        let chat_backend = Arc::new(HttpBackend::new("http://127.0.0.1:9", 1).expect("client"));
        let mut app = App::with_sync(Config::default(), sync, chat_backend);
        app.sync.initialize();
        app.sync.settle();
        app
    }

    #[test]
    fn app_starts_on_chat_with_greeting() {
        let app = make_test_app(0);
        assert_eq!(app.panel, Panel::Chat);
        assert!(matches!(app.input_mode, InputMode::Navigate));
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].content, chat::GREETING);
    }

    #[test]
    fn task_selection_is_clamped() {
        let mut app = make_test_app(3);
        app.select_panel(Panel::Tasks);
        assert_eq!(app.tasks_state.selected(), Some(0));

        app.tasks_up();
        assert_eq!(app.tasks_state.selected(), Some(0));
        for _ in 0..5 {
            app.tasks_down();
        }
        assert_eq!(app.tasks_state.selected(), Some(2));
    }

    #[test]
    fn empty_task_list_has_no_selection() {
        let mut app = make_test_app(0);
        app.tasks_state.select(Some(4));
        app.clamp_task_selection();
        assert_eq!(app.tasks_state.selected(), None);
        app.tasks_down();
        assert_eq!(app.tasks_state.selected(), None);
    }

    #[test]
    fn message_ids_increase() {
        let mut app = make_test_app(0);
        app.push_message(Author::User, "one");
        app.push_message(Author::User, "two");
        let ids: Vec<i64> = app.messages.iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn composing_switches_to_chat() {
        let mut app = make_test_app(0);
        app.select_panel(Panel::Calendar);
        app.transition_to(InputMode::Composing);
        assert_eq!(app.panel, Panel::Chat);
        app.composer.insert_str("hello");
        assert_eq!(app.composer_text(), "hello");
        app.clear_composer();
        assert_eq!(app.composer_text(), "");
    }
}
