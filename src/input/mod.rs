pub(crate) mod composing;
pub(crate) mod navigate;
pub(crate) mod popups;

use crate::{app::App, models::InputMode, models::Panel};
use crossterm::event::{self, Event, KeyEventKind};

pub fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Mouse(mouse_event) => match (mouse_event.kind, app.panel) {
            (event::MouseEventKind::ScrollUp, Panel::Chat) => app.chat_scroll_up(),
            (event::MouseEventKind::ScrollDown, Panel::Chat) => app.chat_scroll_down(),
            (event::MouseEventKind::ScrollUp, Panel::Tasks) => app.tasks_up(),
            (event::MouseEventKind::ScrollDown, Panel::Tasks) => app.tasks_down(),
            _ => {}
        },
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            if popups::handle_popup_events(app, key) {
                return;
            }
            match app.input_mode {
                InputMode::Navigate => navigate::handle_normal_mode(app, key),
                InputMode::Composing => composing::handle_composing_mode(app, key),
            }
        }
        _ => {}
    }
}
