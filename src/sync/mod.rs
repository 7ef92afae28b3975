//! Connection & data sync manager: single source of truth for whether the
//! Google provider is connected, plus the normalized agenda and task lists
//! every panel reads from.

pub mod callback;
pub mod normalize;
pub mod token;

use crate::integrations::backend::{Backend, FetchError};
use crate::models::{AgendaItem, ConnectionState, TaskItem};
use callback::{OAuthCallback, has_callback_params, parse_callback, strip_callback_params};
use chrono::{Local, NaiveDate};
use normalize::{format_events, format_tasks};
use reqwest::Url;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use token::{AuthToken, StoreError, TokenEvent, TokenStore};
use tracing::{debug, info, warn};

/// Result of one dual fetch, committed as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    Connected {
        agenda: Vec<AgendaItem>,
        today_agenda: Vec<AgendaItem>,
        tasks: Vec<TaskItem>,
    },
    /// Carries the token the request was sent with.
    Unauthorized { sent: Option<AuthToken> },
    Failed(String),
}

/// Issues `/events` and `/tasks` at the same time and waits for both before
/// deciding. A 401 on either side wins over any other failure.
pub fn fetch_snapshot(
    backend: &dyn Backend,
    token: Option<&AuthToken>,
    today: NaiveDate,
    clock_format: &str,
) -> SyncOutcome {
    let (events, tasks) = thread::scope(|scope| {
        let events = scope.spawn(|| backend.fetch_events(token));
        let tasks = backend.fetch_tasks(token);
        let events = events
            .join()
            .unwrap_or_else(|_| Err(FetchError::Transport("events worker panicked".to_string())));
        (events, tasks)
    });

    match (events, tasks) {
        (Ok(events), Ok(tasks)) => {
            let formatted = format_events(&events, &Local, today, clock_format);
            SyncOutcome::Connected {
                agenda: formatted.all_events,
                today_agenda: formatted.today_events,
                tasks: format_tasks(&tasks),
            }
        }
        (Err(e), _) | (_, Err(e)) if e.is_unauthorized() => SyncOutcome::Unauthorized {
            sent: token.cloned(),
        },
        (Err(e), _) | (_, Err(e)) => SyncOutcome::Failed(e.to_string()),
    }
}

/// Borrowed read-only view handed to panels.
#[derive(Clone, Copy, Debug)]
pub struct SyncView<'a> {
    pub agenda: &'a [AgendaItem],
    pub today_agenda: &'a [AgendaItem],
    pub tasks: &'a [TaskItem],
    pub connected: bool,
    pub loading: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandledCallback {
    pub callback: OAuthCallback,
    pub cleaned_url: Url,
}

/// What a `poll` pass changed, for the UI to react to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollReport {
    pub settled: Vec<SyncOutcome>,
    pub token_changed: bool,
}

pub struct SyncManager {
    backend: Arc<dyn Backend>,
    store: Box<dyn TokenStore>,
    token_events: Receiver<TokenEvent>,
    token: Option<AuthToken>,
    clock_format: String,
    state: ConnectionState,
    agenda: Vec<AgendaItem>,
    today_agenda: Vec<AgendaItem>,
    tasks: Vec<TaskItem>,
    results_tx: Sender<SyncOutcome>,
    results_rx: Receiver<SyncOutcome>,
    in_flight: usize,
    today_override: Option<NaiveDate>,
}

impl SyncManager {
    pub fn new(
        backend: Arc<dyn Backend>,
        mut store: Box<dyn TokenStore>,
        clock_format: impl Into<String>,
    ) -> Self {
        let token_events = store.subscribe();
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            backend,
            store,
            token_events,
            token: None,
            clock_format: clock_format.into(),
            state: ConnectionState::Loading,
            agenda: Vec::new(),
            today_agenda: Vec::new(),
            tasks: Vec::new(),
            results_tx,
            results_rx,
            in_flight: 0,
            today_override: None,
        }
    }

    pub fn initialize(&mut self) {
        self.token = self.store.load();
        info!(has_token = self.token.is_some(), "sync manager starting");
        self.refresh();
    }

    /// Starts a background dual fetch. Overlapping calls are allowed; each
    /// result is committed in arrival order, so the last one observed wins.
    pub fn refresh(&mut self) {
        let backend = Arc::clone(&self.backend);
        let token = self.token.clone();
        let today = self.today();
        let clock_format = self.clock_format.clone();
        let tx = self.results_tx.clone();
        self.in_flight += 1;
        debug!(in_flight = self.in_flight, "refresh started");

        thread::spawn(move || {
            let outcome = fetch_snapshot(backend.as_ref(), token.as_ref(), today, &clock_format);
            let _ = tx.send(outcome);
        });
    }

    /// Consumes the handshake parameters in `url`. On success the token is
    /// persisted; the store's change event then drives the refresh. A failed
    /// handshake leaves connection state untouched.
    pub fn handle_oauth_callback(
        &mut self,
        url: &Url,
    ) -> Result<Option<HandledCallback>, StoreError> {
        if !has_callback_params(url) {
            return Ok(None);
        }
        let callback = parse_callback(url);
        match &callback {
            OAuthCallback::Success(token) => {
                info!(token = ?token, "oauth handshake completed");
                self.store.save(token)?;
            }
            OAuthCallback::Failed(reason) => {
                warn!(%reason, "oauth handshake failed");
            }
            OAuthCallback::Absent => {
                debug!("incomplete oauth parameters ignored");
            }
        }
        Ok(Some(HandledCallback {
            callback,
            cleaned_url: strip_callback_params(url),
        }))
    }

    /// Applies token-change events and finished fetches. Call once per UI
    /// tick.
    pub fn poll(&mut self) -> PollReport {
        let mut report = PollReport::default();

        while let Ok(event) = self.token_events.try_recv() {
            report.token_changed = true;
            match event {
                TokenEvent::Saved(token) => {
                    self.token = Some(token);
                    self.refresh();
                }
                TokenEvent::Cleared => self.token = None,
            }
        }

        loop {
            match self.results_rx.try_recv() {
                Ok(outcome) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.commit(outcome.clone());
                    report.settled.push(outcome);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        report
    }

    fn commit(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Connected {
                agenda,
                today_agenda,
                tasks,
            } => {
                info!(
                    events = agenda.len(),
                    today = today_agenda.len(),
                    tasks = tasks.len(),
                    "google data refreshed"
                );
                self.agenda = agenda;
                self.today_agenda = today_agenda;
                self.tasks = tasks;
                self.state = ConnectionState::Connected;
            }
            SyncOutcome::Unauthorized { sent } if sent != self.token => {
                // The session changed while this request was in flight.
                debug!(sent = ?sent, "ignoring 401 for a replaced session");
            }
            SyncOutcome::Unauthorized { .. } => {
                info!("backend reports not authenticated; clearing session");
                self.disconnect();
                self.token = None;
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "failed to clear stored session");
                }
            }
            SyncOutcome::Failed(reason) => {
                warn!(%reason, "google data fetch failed");
                self.disconnect();
            }
        }
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.agenda.clear();
        self.today_agenda.clear();
        self.tasks.clear();
    }

    fn today(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn view(&self) -> SyncView<'_> {
        SyncView {
            agenda: &self.agenda,
            today_agenda: &self.today_agenda,
            tasks: &self.tasks,
            connected: self.connected(),
            loading: self.loading(),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        if self.in_flight > 0 {
            ConnectionState::Loading
        } else {
            self.state
        }
    }

    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn loading(&self) -> bool {
        self.in_flight > 0 || self.state == ConnectionState::Loading
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn tasks(&self) -> &[TaskItem] {
        &self.tasks
    }
}

#[cfg(test)]
impl SyncManager {
    /// Pins "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    /// Blocks until every started refresh has been committed.
    pub fn settle(&mut self) -> PollReport {
        let mut report = self.poll();
        while self.in_flight > 0 {
            let Ok(outcome) = self.results_rx.recv() else {
                break;
            };
            self.in_flight -= 1;
            self.commit(outcome.clone());
            report.settled.push(outcome);
            let more = self.poll();
            report.token_changed |= more.token_changed;
            report.settled.extend(more.settled);
        }
        report
    }
}
