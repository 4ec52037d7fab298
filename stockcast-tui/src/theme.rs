//! Parrot/neon theme tokens for the Stockcast TUI.
//!
//! # Color Palette
//! - **Accent**: Electric cyan (focus, forecast line)
//! - **Positive**: Neon green (close price, success)
//! - **Negative**: Hot pink (errors)
//! - **Warning**: Neon orange (loading, warnings)
//! - **Neutral**: Cool purple (open price, seasonal components)
//! - **Muted**: Steel blue (axes, hints, uncertainty band)

use ratatui::style::{Color, Modifier, Style};

pub const BACKGROUND: Color = Color::Rgb(18, 18, 20);
pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_SECONDARY: Color = Color::Rgb(170, 170, 170);

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn text() -> Style {
    Style::default().fg(TEXT_PRIMARY)
}

pub fn secondary() -> Style {
    Style::default().fg(TEXT_SECONDARY)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Color for a change in price: gains green, losses pink.
pub fn change_color(delta: f64) -> Color {
    if delta >= 0.0 {
        POSITIVE
    } else {
        NEGATIVE
    }
}

/// Highlight for the selected item in a row of choices.
pub fn selected() -> Style {
    Style::default()
        .fg(BACKGROUND)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_color_sign() {
        assert_eq!(change_color(1.5), POSITIVE);
        assert_eq!(change_color(0.0), POSITIVE);
        assert_eq!(change_color(-0.1), NEGATIVE);
    }

    #[test]
    fn active_panel_is_highlighted() {
        assert_eq!(panel_border(true), accent());
        assert_eq!(panel_border(false), muted());
        assert!(panel_title(true).add_modifier.contains(Modifier::BOLD));
    }
}
