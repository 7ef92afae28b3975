use crate::config::Theme;
use crate::ui::color_parser::parse_color;
use ratatui::style::Color;

/// Resolved colors for one frame.
#[derive(Debug, Clone)]
pub struct ThemeTokens {
    pub border_default: Color,
    pub border_active: Color,
    pub accent: Color,
    pub muted: Color,
    pub today: Color,
    pub selection_bg: Color,
    pub event_marker: Color,
    pub user_message: Color,
    pub jarvis_message: Color,
    pub toast: Color,
}

impl ThemeTokens {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            border_default: parse_color(&theme.border_default),
            border_active: parse_color(&theme.border_active),
            accent: parse_color(&theme.accent),
            muted: parse_color(&theme.muted),
            today: parse_color(&theme.today),
            selection_bg: parse_color(&theme.selection),
            event_marker: parse_color(&theme.event_marker),
            user_message: parse_color(&theme.user_message),
            jarvis_message: parse_color(&theme.jarvis_message),
            toast: parse_color(&theme.toast),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ThemeTokens;
    use crate::config::Theme;
    use ratatui::style::Color;

    #[test]
    fn default_theme_resolves_every_token() {
        let tokens = ThemeTokens::from_theme(&Theme::default());
        assert_eq!(tokens.border_active, Color::Blue);
        assert_eq!(tokens.today, Color::Yellow);
        assert_eq!(tokens.selection_bg, Color::Rgb(40, 70, 140));
    }

    #[test]
    fn overrides_are_parsed() {
        let theme = Theme {
            accent: "#ff8800".to_string(),
            event_marker: "Magenta".to_string(),
            ..Default::default()
        };
        let tokens = ThemeTokens::from_theme(&theme);
        assert_eq!(tokens.accent, Color::Rgb(255, 136, 0));
        assert_eq!(tokens.event_marker, Color::Magenta);
    }
}
