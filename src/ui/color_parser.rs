use ratatui::style::Color;

/// Named ratatui colors, `r,g,b` triples or `#rrggbb`. Anything else is
/// `Color::Reset` so a typo in the config never hides text.
pub fn parse_color(value: &str) -> Color {
    let value = value.trim().to_lowercase();
    named_color(&value)
        .or_else(|| parse_hex(&value))
        .or_else(|| parse_rgb(&value))
        .unwrap_or(Color::Reset)
}

fn named_color(value: &str) -> Option<Color> {
    let color = match value {
        "reset" => Color::Reset,
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        "white" => Color::White,
        _ => return None,
    };
    Some(color)
}

fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn parse_rgb(value: &str) -> Option<Color> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if let [r, g, b] = parts.as_slice()
        && let (Ok(r), Ok(g), Ok(b)) = (r.parse(), g.parse(), b.parse())
    {
        return Some(Color::Rgb(r, g, b));
    }
    None
}
