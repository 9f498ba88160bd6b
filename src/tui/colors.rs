//! Color constants for the terminal user interface.

use ratatui::style::{Color, Modifier, Style};

use crate::fields::Tier;

/// Border color of the focused form field.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Background of the confirmation dialog.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Status bar background.
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
pub const AMBER: Color = Color::Rgb(255, 170, 0);

/// Row style for a task in the given urgency tier.
pub fn tier_style(tier: Tier) -> Style {
    match tier {
        Tier::Overdue => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        Tier::Danger => Style::default().fg(Color::Red),
        Tier::Warning => Style::default().fg(AMBER),
        Tier::Delayed => Style::default().fg(Color::Cyan),
        Tier::Ok => Style::default().fg(Color::Green),
        Tier::Closed => Style::default().fg(Color::DarkGray),
    }
}
