//! Built-in themes

use super::Theme;
use ratatui::style::Color;

/// Default dark theme
pub fn quire_dark() -> Theme {
    Theme {
        name: "dark".to_string(),

        primary: Color::Rgb(0x8A, 0x67, 0xFF),

        bg_base: Color::Rgb(0x2D, 0x2D, 0x2D),
        bg_subtle: Color::Rgb(0x4A, 0x4A, 0x4A),
        bg_overlay: Color::Rgb(0x1A, 0x1A, 0x1A),

        fg_base: Color::Rgb(0xD0, 0xD0, 0xD0),
        fg_muted: Color::Rgb(0xA0, 0xA0, 0xA0),
        fg_subtle: Color::Rgb(0x80, 0x80, 0x80),
        fg_selected: Color::Rgb(0xF5, 0xF5, 0xF5),

        border: Color::Rgb(0x4A, 0x4A, 0x4A),
        border_focus: Color::Rgb(0x8A, 0x67, 0xFF),

        error: Color::Rgb(0xF4, 0x43, 0x36),
        warning: Color::Rgb(0xFF, 0xA5, 0x00),
        info: Color::Rgb(0x29, 0xB6, 0xF6),
    }
}

/// Light theme for bright terminals
pub fn quire_light() -> Theme {
    Theme {
        name: "light".to_string(),

        primary: Color::Rgb(0x67, 0x3A, 0xB7),

        bg_base: Color::Rgb(0xFD, 0xFD, 0xFD),
        bg_subtle: Color::Rgb(0xEC, 0xEF, 0xF1),
        bg_overlay: Color::Rgb(0xCF, 0xD8, 0xDC),

        fg_base: Color::Rgb(0x21, 0x21, 0x21),
        fg_muted: Color::Rgb(0x61, 0x61, 0x61),
        fg_subtle: Color::Rgb(0x9E, 0x9E, 0x9E),
        fg_selected: Color::Rgb(0xFF, 0xFF, 0xFF),

        border: Color::Rgb(0xBD, 0xBD, 0xBD),
        border_focus: Color::Rgb(0x67, 0x3A, 0xB7),

        error: Color::Rgb(0xC6, 0x28, 0x28),
        warning: Color::Rgb(0xEF, 0x6C, 0x00),
        info: Color::Rgb(0x02, 0x77, 0xBD),
    }
}
