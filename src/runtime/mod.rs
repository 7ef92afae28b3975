use crate::{
    app::App,
    integrations::chat::FALLBACK_REPLY,
    models::Author,
    sync::callback::{CallbackPoll, OAuthCallback},
};
use chrono::Local;
use std::sync::mpsc::TryRecvError;
use tracing::{debug, info, warn};

pub fn tick(app: &mut App) {
    handle_day_rollover(app);
    handle_sign_in(app);
    handle_sync(app);
    handle_chat_reply(app);

    if let Some(expiry) = app.toast_expiry
        && Local::now() >= expiry
    {
        app.toast_expiry = None;
        app.toast_message = None;
    }
}

fn handle_sync(app: &mut App) {
    let had_token = app.sync.has_token();
    let report = app.sync.poll();
    if report.settled.is_empty() && !report.token_changed {
        return;
    }
    app.clamp_task_selection();

    if had_token && !app.sync.has_token() {
        app.toast("Google session expired. Press c to reconnect.");
    }
}

fn handle_sign_in(app: &mut App) {
    let result = {
        let Some(receiver) = app.callback_receiver.as_ref() else {
            return;
        };
        receiver.try_recv()
    };

    match result {
        Ok(CallbackPoll::Received(url)) => {
            finish_sign_in(app);
            match app.sync.handle_oauth_callback(&url) {
                Ok(Some(handled)) => {
                    debug!(url = %handled.cleaned_url, "sign-in parameters consumed");
                    match handled.callback {
                        OAuthCallback::Success(_) => {
                            app.toast("Google account connected. Syncing now...");
                        }
                        OAuthCallback::Failed(reason) => {
                            app.toast(format!("Google sign-in failed: {reason}"));
                        }
                        OAuthCallback::Absent => {
                            app.toast("Google sign-in failed: incomplete response");
                        }
                    }
                }
                Ok(None) => {
                    warn!(path = url.path(), "sign-in redirect carried no parameters");
                    app.toast("Google sign-in failed: incomplete response");
                }
                Err(e) => {
                    warn!(error = %e, "failed to store google session");
                    app.toast(format!("Could not save Google session: {e}"));
                }
            }
        }
        Ok(CallbackPoll::Error(message)) => {
            finish_sign_in(app);
            app.toast(format!("Google sign-in failed: {message}"));
        }
        Err(TryRecvError::Empty) => {}
        Err(TryRecvError::Disconnected) => {
            finish_sign_in(app);
            app.toast("Google sign-in stopped.");
        }
    }
}

fn finish_sign_in(app: &mut App) {
    app.callback_receiver = None;
    app.callback_display = None;
    app.show_connect_popup = false;
}

fn handle_chat_reply(app: &mut App) {
    let result = {
        let Some(receiver) = app.chat_receiver.as_ref() else {
            return;
        };
        receiver.try_recv()
    };

    match result {
        Ok(reply) => {
            app.chat_receiver = None;
            app.push_message(Author::Jarvis, reply.reply);
            if let Some(error) = reply.error {
                app.toast(format!("Jarvis backend error: {error}"));
            }
        }
        Err(TryRecvError::Empty) => {}
        Err(TryRecvError::Disconnected) => {
            app.chat_receiver = None;
            app.push_message(Author::Jarvis, FALLBACK_REPLY);
        }
    }
}

fn handle_day_rollover(app: &mut App) {
    let today = Local::now().date_naive();
    if today == app.today {
        return;
    }

    info!(%today, "local date changed; refreshing");
    let was_on_today = app.month.selected_date() == app.today;
    app.today = today;
    if was_on_today {
        app.month.go_to_date(today);
    }
    app.sync.refresh();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::make_test_app;
    use crate::integrations::chat::ChatReply;
    use chrono::{Duration, NaiveDate};
    use reqwest::Url;
    use std::sync::mpsc;

    #[test]
    fn chat_reply_is_appended() {
        let mut app = make_test_app(0);
        let (tx, rx) = mpsc::channel();
        app.chat_receiver = Some(rx);
        tx.send(ChatReply {
            reply: "Two meetings.".to_string(),
            error: None,
        })
        .unwrap();

        tick(&mut app);
        assert!(app.chat_receiver.is_none());
        let last = app.messages.last().unwrap();
        assert_eq!(last.author, Author::Jarvis);
        assert_eq!(last.content, "Two meetings.");
        assert!(app.toast_message.is_none());
    }

    #[test]
    fn chat_error_is_shown_in_status_bar() {
        let mut app = make_test_app(0);
        let (tx, rx) = mpsc::channel();
        app.chat_receiver = Some(rx);
        tx.send(ChatReply {
            reply: FALLBACK_REPLY.to_string(),
            error: Some("connection refused".to_string()),
        })
        .unwrap();

        tick(&mut app);
        assert_eq!(app.messages.last().unwrap().content, FALLBACK_REPLY);
        assert_eq!(
            app.toast_message.as_deref(),
            Some("Jarvis backend error: connection refused")
        );
    }

    #[test]
    fn successful_sign_in_connects() {
        let mut app = make_test_app(0);
        let (tx, rx) = mpsc::channel();
        app.callback_receiver = Some(rx);
        app.show_connect_popup = true;
        let url = Url::parse("http://127.0.0.1:5173/?user_id=abc123&auth=success").unwrap();
        tx.send(CallbackPoll::Received(url)).unwrap();

        tick(&mut app);
        assert!(!app.show_connect_popup);
        assert!(!app.is_waiting_for_sign_in());
        assert!(app.sync.has_token());
        app.sync.settle();
        assert!(app.sync.connected());
    }

    #[test]
    fn failed_sign_in_shows_reason() {
        let mut app = make_test_app(0);
        let (tx, rx) = mpsc::channel();
        app.callback_receiver = Some(rx);
        let url = Url::parse("http://127.0.0.1:5173/?error=access_denied").unwrap();
        tx.send(CallbackPoll::Received(url)).unwrap();

        tick(&mut app);
        assert_eq!(
            app.toast_message.as_deref(),
            Some("Google sign-in failed: access_denied")
        );
        assert!(!app.sync.has_token());
    }

    #[test]
    fn expired_toast_is_cleared() {
        let mut app = make_test_app(0);
        app.toast("hello");
        app.toast_expiry = Some(Local::now() - Duration::seconds(1));
        tick(&mut app);
        assert!(app.toast_message.is_none());
    }

    #[test]
    fn day_rollover_moves_selection_and_refreshes() {
        let mut app = make_test_app(0);
        let yesterday = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        app.today = yesterday;
        app.month.go_to_date(yesterday);

        tick(&mut app);
        assert_eq!(app.today, Local::now().date_naive());
        assert_eq!(app.month.selected_date(), app.today);
        app.sync.settle();
        assert!(app.sync.connected());
    }
}
