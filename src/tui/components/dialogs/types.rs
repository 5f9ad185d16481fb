//! Core dialog types
//!
//! This module defines the configuration, identity and layout types shared by
//! every part of the dialog engine, along with its error taxonomy.

use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::validation::ValidationError;

/// Busy label shown on the confirm control while an action is in flight
pub const DEFAULT_BUSY_LABEL: &str = "Processing…";

/// Narrowest dialog that still shows the close control
const MIN_CLOSE_WIDTH: u16 = 8;

/// Field values keyed by field identifier
pub type FormValues = BTreeMap<String, String>;

/// Stable identifier for a kind of dialog (e.g. "delete_story")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DialogId(pub String);

impl DialogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DialogId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DialogId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DialogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier minted for every open/close cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual and semantic severity of a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogVariant {
    /// Destructive action (delete, discard)
    Danger,
    /// Risky but recoverable action
    Warning,
    /// Informational or creation dialog
    #[default]
    Info,
}

impl std::str::FromStr for DialogVariant {
    type Err = DialogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "danger" => Ok(Self::Danger),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            other => Err(DialogError::InvalidConfig(format!("unknown variant '{}'", other))),
        }
    }
}

/// Interactive controls a dialog can expose
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlId {
    /// Header close (×) control
    Close,
    /// Text field, by field identifier
    Field(String),
    /// Cancel action button
    Cancel,
    /// Confirm / submit action button
    Confirm,
}

impl ControlId {
    pub fn field(id: impl Into<String>) -> Self {
        Self::Field(id.into())
    }

    /// Whether activating this control dismisses the dialog
    pub fn dismisses(&self) -> bool {
        matches!(self, Self::Close | Self::Cancel)
    }
}

/// Dialog positioning options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogPosition {
    /// Center the dialog in the available area
    #[default]
    Center,
    /// Position at specific coordinates (col, row)
    Fixed(u16, u16),
    /// Position at top of screen
    Top,
}

/// Dialog size options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogSize {
    /// Fixed size in characters (width, height)
    Fixed(u16, u16),
    /// Percentage of available area (width_pct, height_pct)
    Percentage(u16, u16),
    /// Fit content with optional minimum size
    FitContent { min_width: u16, min_height: u16 },
}

impl Default for DialogSize {
    fn default() -> Self {
        Self::FitContent {
            min_width: 44,
            min_height: 7,
        }
    }
}

/// Dialog configuration supplied by the host when opening a session
#[derive(Debug, Clone)]
pub struct DialogConfig {
    /// Dialog identifier
    pub id: DialogId,
    /// Title shown in the dialog chrome
    pub title: String,
    /// Body message (may be empty for pure forms)
    pub message: String,
    /// Severity variant
    pub variant: DialogVariant,
    /// Label of the confirm control
    pub confirm_label: String,
    /// Label of the cancel control
    pub cancel_label: String,
    /// Label of the confirm control while processing
    pub busy_label: String,
    /// Whether Escape cancels the dialog
    pub closable: bool,
    /// Whether clicking outside the dialog cancels it
    pub dismiss_on_backdrop: bool,
    /// Whether the header close (×) control is shown
    pub show_close_button: bool,
    /// Position configuration
    pub position: DialogPosition,
    /// Size configuration
    pub size: DialogSize,
}

impl DialogConfig {
    pub fn new(id: impl Into<DialogId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            message: String::new(),
            variant: DialogVariant::default(),
            confirm_label: "Confirm".to_string(),
            cancel_label: "Cancel".to_string(),
            busy_label: DEFAULT_BUSY_LABEL.to_string(),
            closable: true,
            dismiss_on_backdrop: true,
            show_close_button: true,
            position: DialogPosition::default(),
            size: DialogSize::default(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_variant(mut self, variant: DialogVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_labels(mut self, confirm: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.cancel_label = cancel.into();
        self
    }

    pub fn with_busy_label(mut self, busy: impl Into<String>) -> Self {
        self.busy_label = busy.into();
        self
    }

    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = closable;
        self
    }

    pub fn dismiss_on_backdrop(mut self, dismiss: bool) -> Self {
        self.dismiss_on_backdrop = dismiss;
        self
    }

    pub fn with_close_button(mut self, show: bool) -> Self {
        self.show_close_button = show;
        self
    }

    pub fn with_position(mut self, position: DialogPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: DialogSize) -> Self {
        self.size = size;
        self
    }

    /// Reject configurations that cannot be rendered meaningfully
    pub fn validate(&self) -> DialogResult<()> {
        if self.title.trim().is_empty() {
            return Err(DialogError::InvalidConfig("dialog title is empty".to_string()));
        }
        if self.confirm_label.trim().is_empty() || self.cancel_label.trim().is_empty() {
            return Err(DialogError::InvalidConfig(format!(
                "dialog '{}' has a blank action label",
                self.id
            )));
        }
        Ok(())
    }
}

/// Result type for dialog operations
pub type DialogResult<T> = std::result::Result<T, DialogError>;

/// Dialog engine error types
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("No dialog session is open")]
    NotOpen,

    #[error("Dialog '{0}' cannot open while another session is open")]
    AlreadyOpen(DialogId),

    #[error("Invalid dialog configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    ConfirmAction(String),
}

/// Helper struct for dialog layout calculations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogLayout {
    /// Full available area (the backdrop)
    pub available_area: Rect,
    /// Dialog area (including border)
    pub dialog_area: Rect,
    /// Content area (excluding border)
    pub content_area: Rect,
}

impl DialogLayout {
    pub fn calculate(
        config: &DialogConfig,
        available_area: Rect,
        content_size: (u16, u16),
    ) -> Self {
        let (width, height) = Self::calculate_size(config, available_area, content_size);
        let (x, y) = Self::calculate_position(config, available_area, width, height);

        let dialog_area = Rect {
            x,
            y,
            width,
            height,
        };

        let content_area = Rect {
            x: dialog_area.x + 1,
            y: dialog_area.y + 1,
            width: dialog_area.width.saturating_sub(2),
            height: dialog_area.height.saturating_sub(2),
        };

        Self {
            available_area,
            dialog_area,
            content_area,
        }
    }

    /// Where the close control sits on the top border, if the dialog is wide
    /// enough to show it beside the title corner
    pub fn close_area(&self) -> Option<Rect> {
        let area = &self.dialog_area;
        if area.width < MIN_CLOSE_WIDTH || area.height == 0 {
            return None;
        }
        Some(Rect::new(area.right() - 4, area.y, 3, 1))
    }

    /// Check if a point falls on the dialog itself rather than the backdrop
    pub fn contains_point(&self, x: u16, y: u16) -> bool {
        let area = &self.dialog_area;
        x >= area.x &&
        x < area.x + area.width &&
        y >= area.y &&
        y < area.y + area.height
    }

    fn calculate_size(
        config: &DialogConfig,
        available_area: Rect,
        content_size: (u16, u16),
    ) -> (u16, u16) {
        let (width, height) = match config.size {
            DialogSize::Fixed(w, h) => (w, h),
            DialogSize::Percentage(w_pct, h_pct) => {
                let width = (available_area.width as f32 * w_pct as f32 / 100.0) as u16;
                let height = (available_area.height as f32 * h_pct as f32 / 100.0) as u16;
                (width, height)
            }
            DialogSize::FitContent { min_width, min_height } => {
                let (content_w, content_h) = content_size;
                // Border on both sides
                (content_w.max(min_width) + 2, content_h.max(min_height) + 2)
            }
        };

        (width.min(available_area.width), height.min(available_area.height))
    }

    fn calculate_position(
        config: &DialogConfig,
        available_area: Rect,
        width: u16,
        height: u16,
    ) -> (u16, u16) {
        match config.position {
            DialogPosition::Center => {
                let x = available_area.x + (available_area.width.saturating_sub(width)) / 2;
                let y = available_area.y + (available_area.height.saturating_sub(height)) / 2;
                (x, y)
            }
            DialogPosition::Fixed(x, y) => (
                available_area.x + x.min(available_area.width.saturating_sub(width)),
                available_area.y + y.min(available_area.height.saturating_sub(height)),
            ),
            DialogPosition::Top => {
                let x = available_area.x + (available_area.width.saturating_sub(width)) / 2;
                (x, available_area.y)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_centers_dialog() {
        let config = DialogConfig::new("confirm", "Delete?").with_size(DialogSize::Fixed(40, 10));
        let layout = DialogLayout::calculate(&config, Rect::new(0, 0, 100, 30), (0, 0));

        assert_eq!(layout.dialog_area, Rect::new(30, 10, 40, 10));
        assert_eq!(layout.content_area, Rect::new(31, 11, 38, 8));
    }

    #[test]
    fn test_close_area_needs_room() {
        let config = DialogConfig::new("confirm", "Delete?").with_size(DialogSize::Fixed(40, 10));
        let layout = DialogLayout::calculate(&config, Rect::new(0, 0, 100, 30), (0, 0));
        assert_eq!(layout.close_area(), Some(Rect::new(66, 10, 3, 1)));

        let narrow = DialogLayout::calculate(&config, Rect::new(0, 0, 7, 30), (0, 0));
        assert_eq!(narrow.close_area(), None);
    }

    #[test]
    fn test_layout_clamps_to_available_area() {
        let config = DialogConfig::new("confirm", "Delete?");
        let layout = DialogLayout::calculate(&config, Rect::new(0, 0, 20, 5), (80, 12));

        assert_eq!(layout.dialog_area.width, 20);
        assert_eq!(layout.dialog_area.height, 5);
    }

    #[test]
    fn test_contains_point_excludes_backdrop() {
        let config = DialogConfig::new("confirm", "Delete?").with_size(DialogSize::Fixed(10, 4));
        let layout = DialogLayout::calculate(&config, Rect::new(0, 0, 30, 10), (0, 0));

        assert!(layout.contains_point(10, 3));
        assert!(!layout.contains_point(0, 0));
        assert!(!layout.contains_point(20, 3));
    }

    #[test]
    fn test_config_validation() {
        assert!(DialogConfig::new("a", "Title").validate().is_ok());
        assert!(DialogConfig::new("a", "  ").validate().is_err());
        assert!(DialogConfig::new("a", "Title").with_labels("", "Cancel").validate().is_err());
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("Danger".parse::<DialogVariant>().unwrap(), DialogVariant::Danger);
        assert_eq!("info".parse::<DialogVariant>().unwrap(), DialogVariant::Info);
        assert!("loud".parse::<DialogVariant>().is_err());
    }
}
