//! Theming for the dialog surface
//!
//! A [`Theme`] holds the semantic colors; [`Styles`] are the ready-made
//! styles the dialog view draws with, built from those colors on demand.

use ratatui::style::{Color, Modifier, Style};

use crate::tui::components::dialogs::DialogVariant;

pub mod presets;

/// Complete visual style configuration
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // Brand colors
    pub primary: Color,

    // Backgrounds
    pub bg_base: Color,
    pub bg_subtle: Color,
    pub bg_overlay: Color,

    // Foregrounds
    pub fg_base: Color,
    pub fg_muted: Color,
    pub fg_subtle: Color,
    pub fg_selected: Color,

    // Borders
    pub border: Color,
    pub border_focus: Color,

    // Status
    pub error: Color,
    pub warning: Color,
    pub info: Color,
}

/// Pre-built styles used by the dialog view
#[derive(Debug, Clone)]
pub struct Styles {
    pub base: Style,
    pub muted: Style,
    pub subtle: Style,
    pub error: Style,

    /// Dimmed backdrop drawn behind an open dialog
    pub backdrop: Style,

    pub dialog_content: Style,
    pub dialog_label: Style,

    pub input: Style,
    pub input_focused: Style,
    pub input_placeholder: Style,

    pub button: Style,
    pub button_focused: Style,
    pub button_disabled: Style,
}

impl Theme {
    /// Look up a built-in theme by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(presets::quire_dark()),
            "light" => Some(presets::quire_light()),
            _ => None,
        }
    }

    /// Names accepted by [`Theme::by_name`]
    pub fn available() -> &'static [&'static str] {
        &["dark", "light"]
    }

    /// Accent color for a dialog variant (border, title, confirm button)
    pub fn variant_color(&self, variant: DialogVariant) -> Color {
        match variant {
            DialogVariant::Danger => self.error,
            DialogVariant::Warning => self.warning,
            DialogVariant::Info => self.info,
        }
    }

    pub fn styles(&self) -> Styles {
        let base = Style::default().fg(self.fg_base);

        Styles {
            base,
            muted: base.fg(self.fg_muted),
            subtle: base.fg(self.fg_subtle),
            error: base.fg(self.error),

            backdrop: Style::default()
                .bg(self.bg_overlay)
                .add_modifier(Modifier::DIM),

            dialog_content: base.bg(self.bg_base),
            dialog_label: base.fg(self.fg_muted).add_modifier(Modifier::BOLD),

            input: base.bg(self.bg_subtle),
            input_focused: base.bg(self.bg_subtle).add_modifier(Modifier::UNDERLINED),
            input_placeholder: base.fg(self.fg_subtle).bg(self.bg_subtle),

            button: base.fg(self.fg_base).bg(self.bg_subtle),
            button_focused: base
                .fg(self.fg_selected)
                .bg(self.primary)
                .add_modifier(Modifier::BOLD),
            button_disabled: base.fg(self.fg_subtle).add_modifier(Modifier::DIM),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        presets::quire_dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        for name in Theme::available() {
            assert_eq!(Theme::by_name(name).unwrap().name, *name);
        }
        assert!(Theme::by_name("solarized").is_none());
    }

    #[test]
    fn test_danger_uses_error_color() {
        let theme = Theme::default();
        assert_eq!(theme.variant_color(DialogVariant::Danger), theme.error);
        assert_eq!(theme.variant_color(DialogVariant::Info), theme.info);
    }
}
