use crate::{
    app::App,
    integrations::chat,
    models::{Author, InputMode, Panel},
    sync::callback::{CallbackListener, spawn_callback_wait},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Starts the loopback listener for the OAuth redirect and sends the user to
/// the backend's Google login page.
pub fn connect_google(app: &mut App) {
    if app.is_waiting_for_sign_in() {
        app.show_connect_popup = true;
        app.toast("Google sign-in already in progress.");
        return;
    }

    let login_url = app.config.backend.login_url();
    let listener = match CallbackListener::bind(
        app.config.auth.callback_port,
        &login_url,
        app.config.auth.callback_timeout_seconds,
    ) {
        Ok(listener) => listener,
        Err(e) => {
            warn!(error = %e, "could not start sign-in listener");
            app.toast(format!("Google sign-in unavailable: {e}"));
            return;
        }
    };

    info!(callback = %listener.display.local_url, "waiting for google sign-in");
    app.callback_display = Some(listener.display.clone());
    app.callback_receiver = Some(spawn_callback_wait(listener));
    app.show_connect_popup = true;

    if app.config.auth.open_browser {
        open_login_page(app);
    }
}

pub fn open_login_page(app: &mut App) {
    let Some(display) = app.callback_display.as_ref() else {
        return;
    };
    if let Err(e) = open::that(&display.login_url) {
        warn!(error = %e, "failed to open browser");
        app.toast("Could not open a browser. Visit the login URL manually.");
    }
}

pub fn refresh(app: &mut App) {
    app.sync.refresh();
    app.toast("Syncing with Google...");
}

pub fn send_chat(app: &mut App) {
    let text = app.composer_text();
    if text.trim().is_empty() {
        return;
    }
    if app.is_waiting_for_reply() {
        app.toast("Jarvis is still answering.");
        return;
    }

    let history = app.messages.clone();
    app.push_message(Author::User, text.clone());
    app.clear_composer();
    app.chat_receiver = Some(chat::spawn_chat(
        Arc::clone(&app.chat_backend),
        text,
        history,
    ));
}

pub fn cancel_composer(app: &mut App) {
    app.transition_to(InputMode::Navigate);
}

pub fn next_panel(app: &mut App) {
    app.select_panel(app.panel.next());
}

pub fn prev_panel(app: &mut App) {
    app.select_panel(app.panel.prev());
}

pub fn show_calendar_today(app: &mut App) {
    app.month.go_to_today();
    app.select_panel(Panel::Calendar);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::make_test_app;
    use std::net::TcpListener;

    #[test]
    fn blank_messages_are_ignored() {
        let mut app = make_test_app(0);
        app.composer.insert_str("   \n  ");
        send_chat(&mut app);
        assert_eq!(app.messages.len(), 1);
        assert!(!app.is_waiting_for_reply());
    }

    #[test]
    fn sending_appends_user_message_and_waits() {
        let mut app = make_test_app(0);
        app.composer.insert_str("What's on today?");
        send_chat(&mut app);

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].author, Author::User);
        assert_eq!(app.messages[1].content, "What's on today?");
        assert_eq!(app.composer_text(), "");
        assert!(app.is_waiting_for_reply());

        // A second send while waiting keeps the draft and only toasts.
        app.composer.insert_str("again");
        send_chat(&mut app);
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.composer_text(), "again");
        assert!(app.toast_message.is_some());
    }

    #[test]
    fn connect_reports_busy_port() {
        let busy = TcpListener::bind("127.0.0.1:0").expect("bind");
        let mut app = make_test_app(0);
        app.config.auth.callback_port = busy.local_addr().expect("addr").port();
        app.config.auth.open_browser = false;

        connect_google(&mut app);

        assert!(!app.is_waiting_for_sign_in());
        assert!(!app.show_connect_popup);
        assert!(
            app.toast_message
                .as_deref()
                .is_some_and(|m| m.starts_with("Google sign-in unavailable"))
        );
    }

    #[test]
    fn connect_shows_popup_while_listening() {
        let mut app = make_test_app(0);
        app.config.auth.callback_port = 0;
        app.config.auth.open_browser = false;

        connect_google(&mut app);
        assert!(app.is_waiting_for_sign_in());
        assert!(app.show_connect_popup);
        let display = app.callback_display.as_ref().expect("display");
        assert!(display.login_url.ends_with("/auth/google/login"));

        app.show_connect_popup = false;
        connect_google(&mut app);
        assert!(app.show_connect_popup);
    }

    #[test]
    fn panels_cycle() {
        let mut app = make_test_app(0);
        next_panel(&mut app);
        assert_eq!(app.panel, Panel::Tasks);
        prev_panel(&mut app);
        prev_panel(&mut app);
        assert_eq!(app.panel, Panel::Calendar);
    }
}
