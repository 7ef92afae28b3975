use crate::{actions, app::App, config::key_match};
use crossterm::event::{KeyCode, KeyEvent};

pub fn handle_popup_events(app: &mut App, key: KeyEvent) -> bool {
    if app.show_connect_popup {
        handle_connect_popup(app, key);
        return true;
    }
    if app.show_help_popup {
        if key.code == KeyCode::Esc || key_match(&key, &app.config.keybindings.global.help) {
            app.show_help_popup = false;
        }
        return true;
    }
    false
}

/// Closing the popup keeps the listener running until the redirect arrives
/// or it expires.
fn handle_connect_popup(app: &mut App, key: KeyEvent) {
    if key_match(&key, &app.config.keybindings.popup.confirm) {
        actions::open_login_page(app);
        return;
    }

    if key_match(&key, &app.config.keybindings.popup.cancel) || key.code == KeyCode::Esc {
        app.show_connect_popup = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::make_test_app;
    use crossterm::event::KeyModifiers;

    #[test]
    fn popups_swallow_keys_until_closed() {
        let mut app = make_test_app(0);
        app.show_help_popup = true;
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(handle_popup_events(&mut app, q));
        assert!(app.show_help_popup);
        assert!(!app.should_quit);

        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert!(handle_popup_events(&mut app, esc));
        assert!(!app.show_help_popup);
        assert!(!handle_popup_events(&mut app, q));
    }

    #[test]
    fn connect_popup_closes_on_cancel() {
        let mut app = make_test_app(0);
        app.show_connect_popup = true;
        let n = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE);
        assert!(handle_popup_events(&mut app, n));
        assert!(!app.show_connect_popup);
    }
}
