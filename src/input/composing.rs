use crate::{actions, app::App, config::key_match};
use crossterm::event::KeyEvent;

pub fn handle_composing_mode(app: &mut App, key: KeyEvent) {
    if key_match(&key, &app.config.keybindings.chat.send) {
        actions::send_chat(app);
        return;
    }

    if key_match(&key, &app.config.keybindings.chat.newline) {
        app.composer.insert_newline();
        return;
    }

    if key_match(&key, &app.config.keybindings.chat.cancel) {
        actions::cancel_composer(app);
        return;
    }

    app.composer.input(key);
}
