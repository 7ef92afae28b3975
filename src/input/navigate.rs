use crate::{
    actions,
    app::App,
    config::key_match,
    models::{InputMode, Panel},
};
use crossterm::event::KeyEvent;

pub fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let global = &app.config.keybindings.global;
    if key_match(&key, &global.help) {
        app.show_help_popup = true;
    } else if key_match(&key, &global.quit) {
        app.quit();
    } else if key_match(&key, &global.next_panel) {
        actions::next_panel(app);
    } else if key_match(&key, &global.prev_panel) {
        actions::prev_panel(app);
    } else if key_match(&key, &global.chat) {
        app.select_panel(Panel::Chat);
    } else if key_match(&key, &global.tasks) {
        app.select_panel(Panel::Tasks);
    } else if key_match(&key, &global.calendar) {
        app.select_panel(Panel::Calendar);
    } else if key_match(&key, &global.connect) {
        actions::connect_google(app);
    } else if key_match(&key, &global.refresh) {
        actions::refresh(app);
    } else {
        match app.panel {
            Panel::Chat => handle_chat_keys(app, key),
            Panel::Tasks => handle_tasks_keys(app, key),
            Panel::Calendar => handle_calendar_keys(app, key),
        }
    }
}

fn handle_chat_keys(app: &mut App, key: KeyEvent) {
    let chat = &app.config.keybindings.chat;
    if key_match(&key, &chat.compose) {
        app.transition_to(InputMode::Composing);
    } else if key_match(&key, &chat.scroll_up) {
        app.chat_scroll_up();
    } else if key_match(&key, &chat.scroll_down) {
        app.chat_scroll_down();
    }
}

fn handle_tasks_keys(app: &mut App, key: KeyEvent) {
    if key_match(&key, &app.config.keybindings.tasks.up) {
        app.tasks_up();
    } else if key_match(&key, &app.config.keybindings.tasks.down) {
        app.tasks_down();
    }
}

fn handle_calendar_keys(app: &mut App, key: KeyEvent) {
    let calendar = &app.config.keybindings.calendar;
    if key_match(&key, &calendar.left) {
        app.month.move_selection(-1);
    } else if key_match(&key, &calendar.right) {
        app.month.move_selection(1);
    } else if key_match(&key, &calendar.up) {
        app.month.move_selection(-7);
    } else if key_match(&key, &calendar.down) {
        app.month.move_selection(7);
    } else if key_match(&key, &calendar.prev_month) {
        app.month.go_to_previous_month();
    } else if key_match(&key, &calendar.next_month) {
        app.month.go_to_next_month();
    } else if key_match(&key, &calendar.today) {
        actions::show_calendar_today(app);
    }
}
