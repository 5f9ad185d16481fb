//! Rendering of the open dialog session
//!
//! The view is a pure function of controller state. It draws the dimmed
//! backdrop, the dialog chrome, the message, form fields with their inline
//! errors, the general error slot and the action buttons, then hands the
//! resulting geometry back to the controller for mouse hit-testing.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::{
    lock::ControlState,
    overlay::{DialogBody, DialogController},
    types::{ControlId, DialogLayout},
    validation::{FieldRule, FieldSpec},
};
use crate::tui::{
    themes::{Styles, Theme},
    Frame,
};

/// Widest the content area grows before text wraps
const MAX_CONTENT_WIDTH: u16 = 60;
const BUTTON_GAP: u16 = 2;

/// Natural (width, height) of the content of the open dialog
pub fn content_size(controller: &DialogController) -> (u16, u16) {
    let Some(config) = controller.config() else {
        return (0, 0);
    };
    let fields = form_fields(controller);

    let confirm_width = text_width(&config.confirm_label).max(text_width(&config.busy_label));
    let buttons = button_width_for(text_width(&config.cancel_label)) + BUTTON_GAP + button_width_for(confirm_width);
    let message = config.message.lines().map(text_width).max().unwrap_or(0);
    let title = text_width(&config.title) + 6;
    let field = fields
        .iter()
        .map(|f| {
            let value = controller.value(&f.id).map(text_width).unwrap_or(0);
            text_width(&f.label).max(text_width(&f.placeholder) + 2).max(value + 2)
        })
        .max()
        .unwrap_or(0);

    let width = buttons.max(message).max(title).max(field).min(MAX_CONTENT_WIDTH);
    let message_lines = wrapped_lines(&config.message, width);
    let spacer = if message_lines > 0 { 1 } else { 0 };
    let height = message_lines + spacer + fields.len() as u16 * 3 + 2;

    (width, height)
}

/// Draw the open dialog, if any, over `area`
pub fn render(frame: &mut Frame, area: Rect, controller: &mut DialogController, theme: &Theme) {
    let Some(config) = controller.config().cloned() else {
        return;
    };
    let styles = theme.styles();
    let accent = theme.variant_color(config.variant);
    let layout = DialogLayout::calculate(&config, area, content_size(controller));

    // Dim the host UI in place, then punch out the dialog
    frame.buffer_mut().set_style(area, styles.backdrop);
    frame.render_widget(Clear, layout.dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(Span::styled(
            format!(" {} ", config.title),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .style(styles.dialog_content);
    frame.render_widget(block, layout.dialog_area);

    let disabled = controller.is_processing();
    let focused = controller.focused().cloned();
    let mut hits = Vec::new();

    if let Some(close) = layout.close_area().filter(|_| config.show_close_button) {
        let style = if disabled {
            styles.button_disabled
        } else if focused.as_ref() == Some(&ControlId::Close) {
            styles.button_focused
        } else {
            Style::default().fg(accent)
        };
        frame.render_widget(Paragraph::new("[×]").style(style), close);
        hits.push((ControlId::Close, close));
    }

    let content = layout.content_area;
    let fields = form_fields(controller);
    let primary = match controller.body() {
        DialogBody::Form(schema) => Some(schema.primary().to_string()),
        DialogBody::Message => None,
    };
    let message_lines = wrapped_lines(&config.message, content.width);

    let mut constraints = Vec::new();
    if message_lines > 0 {
        constraints.push(Constraint::Length(message_lines));
        constraints.push(Constraint::Length(1));
    }
    for _ in &fields {
        constraints.extend([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)]);
    }
    constraints.push(Constraint::Length(1)); // general error
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1)); // actions

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(content);
    let mut row = 0;

    if message_lines > 0 {
        let message = Paragraph::new(config.message.as_str())
            .style(styles.dialog_content)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, chunks[row]);
        row += 2;
    }

    for field in &fields {
        let control = ControlId::field(&field.id);
        let is_focused = focused.as_ref() == Some(&control);
        let input = chunks[row + 1];

        let is_primary = primary.as_deref() == Some(field.id.as_str());
        frame.render_widget(Paragraph::new(field_label(field, is_primary, &styles)), chunks[row]);
        render_input(frame, input, controller.value(&field.id).unwrap_or(""), field, is_focused, disabled, &styles);

        if let Some(error) = controller.session().field_error(&field.id) {
            frame.render_widget(
                Paragraph::new(Span::styled(error.to_string(), styles.error)),
                chunks[row + 2],
            );
        }

        hits.push((control, input));
        row += 3;
    }

    if let Some(error) = controller.session().general_error() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("✗ {}", error),
                styles.error.add_modifier(Modifier::BOLD),
            )),
            chunks[row],
        );
    }

    let actions = chunks[chunks.len() - 1];
    let state = controller
        .control_state()
        .unwrap_or_else(|| ControlState::resolve(&config, disabled));
    hits.extend(render_buttons(frame, actions, &state, focused.as_ref(), accent, &styles));

    controller.set_layout(layout, hits);
}

fn form_fields(controller: &DialogController) -> Vec<FieldSpec> {
    match controller.body() {
        DialogBody::Form(schema) => schema.fields().to_vec(),
        DialogBody::Message => Vec::new(),
    }
}

fn field_label<'a>(field: &'a FieldSpec, primary: bool, styles: &Styles) -> Line<'a> {
    let required = primary
        || field
            .rules
            .iter()
            .any(|rule| matches!(rule, FieldRule::Required { .. }));

    let mut spans = vec![Span::styled(field.label.as_str(), styles.dialog_label)];
    if required {
        spans.push(Span::styled(" *", styles.error));
    }
    Line::from(spans)
}

fn render_input(
    frame: &mut Frame,
    area: Rect,
    value: &str,
    field: &FieldSpec,
    focused: bool,
    disabled: bool,
    styles: &Styles,
) {
    let style = if disabled {
        styles.button_disabled
    } else if focused {
        styles.input_focused
    } else {
        styles.input
    };

    let room = area.width.saturating_sub(1);
    let text = if value.is_empty() {
        Span::styled(field.placeholder.as_str(), styles.input_placeholder)
    } else {
        Span::styled(visible_tail(value, room), style)
    };
    frame.render_widget(Paragraph::new(Line::from(text)).style(style), area);

    if focused && !disabled {
        let cursor = text_width(visible_tail(value, room)).min(room);
        frame.set_cursor(area.x + cursor, area.y);
    }
}

/// Cancel and confirm, right-aligned; returns their hit areas
fn render_buttons(
    frame: &mut Frame,
    area: Rect,
    state: &ControlState,
    focused: Option<&ControlId>,
    accent: ratatui::style::Color,
    styles: &Styles,
) -> Vec<(ControlId, Rect)> {
    let cancel_width = button_width_for(text_width(&state.cancel_label));
    let confirm_width = button_width_for(text_width(&state.confirm_label));
    let total = cancel_width + BUTTON_GAP + confirm_width;
    let start = area.x + area.width.saturating_sub(total);

    let cancel = Rect::new(start, area.y, cancel_width, 1).intersection(area);
    let confirm = Rect::new(start + cancel_width + BUTTON_GAP, area.y, confirm_width, 1).intersection(area);

    let style_for = |control: &ControlId, idle: Style| {
        if state.disabled {
            styles.button_disabled
        } else if focused == Some(control) {
            styles.button_focused
        } else {
            idle
        }
    };

    let cancel_style = style_for(&ControlId::Cancel, styles.button);
    let confirm_style = style_for(
        &ControlId::Confirm,
        styles.button.fg(accent).add_modifier(Modifier::BOLD),
    );

    frame.render_widget(
        Paragraph::new(format!("[ {} ]", state.cancel_label)).style(cancel_style),
        cancel,
    );
    frame.render_widget(
        Paragraph::new(format!("[ {} ]", state.confirm_label)).style(confirm_style),
        confirm,
    );

    vec![(ControlId::Cancel, cancel), (ControlId::Confirm, confirm)]
}

fn text_width(text: &str) -> u16 {
    UnicodeWidthStr::width(text).min(u16::MAX as usize) as u16
}

fn button_width_for(label_width: u16) -> u16 {
    label_width + 4
}

fn wrapped_lines(text: &str, width: u16) -> u16 {
    if text.trim().is_empty() || width == 0 {
        return 0;
    }
    text.lines()
        .map(|line| text_width(line).max(1).div_ceil(width))
        .sum()
}

/// Longest suffix of `value` that fits in `width` columns
fn visible_tail(value: &str, width: u16) -> &str {
    let mut used = 0u16;
    let mut start = value.len();
    for (index, grapheme) in value.grapheme_indices(true).rev() {
        let w = text_width(grapheme);
        if used + w > width {
            break;
        }
        used += w;
        start = index;
    }
    &value[start..]
}
