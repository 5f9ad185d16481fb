//! Overlay controller
//!
//! The controller owns the [`DialogSession`] and every resource an open
//! session holds: the ambient scroll lock, the keyboard subscription, the
//! focus trap and the processing lock. Transitions are decided by
//! [`reduce`]; the controller only performs the effects it is handed.
//!
//! Host callbacks are not invoked here. Operations that require one return a
//! [`DialogOutcome`] telling the caller what to deliver: `Cancelled` means the
//! host's cancel callback must fire, `Dispatched` means the submission must be
//! handed to the host and the result fed back through [`DialogController::settle`].
//! [`DialogDriver`](super::host::DialogDriver) does both.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use unicode_segmentation::UnicodeSegmentation;

use super::{
    focus::{FocusTrap, Focusable},
    lock::{ControlState, LockToken, ProcessingLock},
    navigation::{KeyRouter, KeySubscription, ListenerRegistry, RouterCommand},
    session::{reduce, DialogSession, Effect, SessionEvent, SessionPhase},
    types::{ControlId, DialogConfig, DialogError, DialogId, DialogLayout, DialogResult, FormValues, SessionId},
    validation::{FormSchema, ValidationResult},
};

/// Surface whose scrolling is suppressed while a dialog is open
pub trait ScrollSurface: Send + Sync {
    fn set_scroll_suppressed(&self, suppressed: bool);
}

/// Default scroll surface: a flag the host consults before scrolling
#[derive(Debug, Default)]
pub struct AmbientScroll {
    suppressed: AtomicBool,
    engagements: AtomicUsize,
}

impl AmbientScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    /// How many times scrolling has been suppressed so far
    pub fn engagements(&self) -> usize {
        self.engagements.load(Ordering::SeqCst)
    }
}

impl ScrollSurface for AmbientScroll {
    fn set_scroll_suppressed(&self, suppressed: bool) {
        if suppressed {
            self.engagements.fetch_add(1, Ordering::SeqCst);
        }
        self.suppressed.store(suppressed, Ordering::SeqCst);
    }
}

/// Scroll suppression held by an open session; restored on drop
pub struct ScrollLock {
    surface: Arc<dyn ScrollSurface>,
}

impl ScrollLock {
    pub fn engage(surface: Arc<dyn ScrollSurface>) -> Self {
        surface.set_scroll_suppressed(true);
        Self { surface }
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.surface.set_scroll_suppressed(false);
    }
}

/// What the dialog contains besides its message
#[derive(Debug, Clone, Default)]
pub enum DialogBody {
    /// Message and actions only
    #[default]
    Message,
    /// A creation form
    Form(FormSchema),
}

/// Values handed to the host when a confirm is dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub session: SessionId,
    pub dialog: DialogId,
    /// Trimmed field values; empty for confirmation dialogs
    pub values: FormValues,
}

impl Submission {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }
}

/// Result of feeding input or a request into the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    /// Nothing happened
    Ignored,
    /// Input consumed without a lifecycle change (focus moved, text edited)
    Handled,
    /// Session ended by user dismissal; the host's cancel callback is due
    Cancelled,
    /// Submit blocked by validation; no callback is due
    Rejected(ValidationResult),
    /// Processing began; the host's confirm callback is due
    Dispatched(Submission),
}

/// How a settled confirm was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Action succeeded and the session closed
    Closed,
    /// Action failed; general error shown and the lock released
    Failed,
    /// Settlement did not match the current in-flight confirm
    Stale,
}

enum HostRequest {
    Confirm(Submission),
    Cancel,
}

/// Lifecycle owner of a single modal dialog surface
pub struct DialogController {
    session: DialogSession,
    config: Option<DialogConfig>,
    body: DialogBody,
    values: FormValues,
    focus: FocusTrap,
    router: KeyRouter,
    listeners: ListenerRegistry,
    subscription: Option<KeySubscription>,
    scroll: Arc<dyn ScrollSurface>,
    scroll_lock: Option<ScrollLock>,
    lock: ProcessingLock,
    in_flight: Option<LockToken>,
    processing_override: bool,
    layout: Option<DialogLayout>,
    hit_areas: Vec<(ControlId, Rect)>,
    last_validation: Option<ValidationResult>,
    outbox: Vec<HostRequest>,
}

impl DialogController {
    /// Create a controller bound to the surface it locks while open
    pub fn new(scroll: Arc<dyn ScrollSurface>) -> Self {
        Self {
            session: DialogSession::default(),
            config: None,
            body: DialogBody::Message,
            values: FormValues::new(),
            focus: FocusTrap::new(),
            router: KeyRouter::new(),
            listeners: ListenerRegistry::new(),
            subscription: None,
            scroll,
            scroll_lock: None,
            lock: ProcessingLock::new(),
            in_flight: None,
            processing_override: false,
            layout: None,
            hit_areas: Vec::new(),
            last_validation: None,
            outbox: Vec::new(),
        }
    }

    pub fn with_router(mut self, router: KeyRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_listeners(mut self, listeners: ListenerRegistry) -> Self {
        self.listeners = listeners;
        self
    }

    /// Open a confirmation dialog
    pub fn open(&mut self, config: DialogConfig) -> DialogResult<SessionId> {
        self.open_with(config, DialogBody::Message)
    }

    /// Open a creation form
    pub fn open_form(&mut self, config: DialogConfig, schema: FormSchema) -> DialogResult<SessionId> {
        self.open_with(config, DialogBody::Form(schema))
    }

    fn open_with(&mut self, config: DialogConfig, body: DialogBody) -> DialogResult<SessionId> {
        if self.session.is_open() {
            return Err(DialogError::AlreadyOpen(config.id));
        }
        config.validate()?;

        let id = SessionId::new();
        let variant = config.variant;
        info!(dialog = %config.id, session = %id, "Opening dialog");

        // Content is mounted before the transition so focus placement sees it
        self.values = match &body {
            DialogBody::Form(schema) => schema
                .fields()
                .iter()
                .map(|field| (field.id.clone(), String::new()))
                .collect(),
            DialogBody::Message => FormValues::new(),
        };
        self.config = Some(config);
        self.body = body;

        self.dispatch(SessionEvent::Open { id, variant });
        if self.processing_override {
            self.dispatch(SessionEvent::ExternalProcessing(true));
        }

        Ok(id)
    }

    /// Host-forced close; no callbacks fire
    pub fn close(&mut self) -> bool {
        if !self.session.is_open() {
            return false;
        }
        if let Some(config) = &self.config {
            info!(dialog = %config.id, "Dialog closed by host");
        }
        self.dispatch(SessionEvent::ForceClose)
    }

    /// Ask to dismiss the dialog
    pub fn request_cancel(&mut self) -> DialogOutcome {
        if !self.session.is_open() {
            return DialogOutcome::Ignored;
        }
        let dialog = self.config.as_ref().map(|c| c.id.clone());

        if !self.dispatch(SessionEvent::Cancel) {
            debug!("Cancel dropped while processing");
            return DialogOutcome::Ignored;
        }

        if let Some(dialog) = dialog {
            info!(dialog = %dialog, "Dialog cancelled");
        }

        match self.take_request() {
            Some(HostRequest::Cancel) => DialogOutcome::Cancelled,
            _ => DialogOutcome::Ignored,
        }
    }

    /// Ask to submit: validate, then engage the lock and dispatch
    pub fn request_confirm(&mut self) -> DialogOutcome {
        if !self.session.is_open() || self.session.is_processing() {
            return DialogOutcome::Ignored;
        }

        self.last_validation = None;
        if !self.dispatch(SessionEvent::SubmitAttempted) {
            return DialogOutcome::Ignored;
        }

        if let Some(HostRequest::Confirm(submission)) = self.take_request() {
            info!(dialog = %submission.dialog, session = %submission.session, "Dispatching confirm");
            return DialogOutcome::Dispatched(submission);
        }

        match self.last_validation.take() {
            Some(result) if !result.is_valid() => {
                debug!(errors = result.errors().len(), "Submit rejected by validation");
                DialogOutcome::Rejected(result)
            }
            _ => DialogOutcome::Ignored,
        }
    }

    /// Apply the host's outcome for a dispatched confirm
    pub fn settle(&mut self, session: SessionId, result: Result<(), String>) -> SettleOutcome {
        if self.session.id() != Some(session) || self.session.phase() != SessionPhase::Processing {
            warn!(session = %session, "Ignoring stale confirm settlement");
            return SettleOutcome::Stale;
        }

        // End the lock before the transition, whatever the outcome
        self.in_flight = None;

        match result {
            Ok(()) => {
                info!(session = %session, "Confirm succeeded");
                self.dispatch(SessionEvent::ConfirmSucceeded);
                SettleOutcome::Closed
            }
            Err(message) => {
                warn!(session = %session, error = %message, "Confirm failed");
                self.dispatch(SessionEvent::ConfirmFailed(message));
                SettleOutcome::Failed
            }
        }
    }

    /// Update a form field; clears that field's error
    pub fn edit_field(&mut self, field: &str, value: impl Into<String>) -> bool {
        if !self.session.is_open() || self.session.is_processing() {
            return false;
        }
        let Some(slot) = self.values.get_mut(field) else {
            return false;
        };
        *slot = value.into();
        self.dispatch(SessionEvent::FieldEdited(field.to_string()));
        true
    }

    /// Host-provided processing flag; disables controls while set
    pub fn set_processing_override(&mut self, processing: bool) {
        self.processing_override = processing;
        self.dispatch(SessionEvent::ExternalProcessing(processing));
    }

    /// Route a key event
    pub fn handle_key(&mut self, key: KeyEvent) -> DialogOutcome {
        if !self.session.is_open() || key.kind == KeyEventKind::Release {
            return DialogOutcome::Ignored;
        }
        let processing = self.session.is_processing();

        if let Some(command) = self.router.route(self.subscription.as_ref(), key, processing) {
            return match command {
                RouterCommand::Cancel => {
                    if self.config.as_ref().map_or(false, |c| c.closable) {
                        self.request_cancel()
                    } else {
                        DialogOutcome::Ignored
                    }
                }
                RouterCommand::FocusNext => self.cycle_focus(true),
                RouterCommand::FocusPrevious => self.cycle_focus(false),
                RouterCommand::Activate => self.activate_focused(),
            };
        }

        if processing || self.subscription.is_none() {
            return DialogOutcome::Ignored;
        }

        let focused = self.focus.focused().cloned();
        match (key.code, focused) {
            (KeyCode::Char(' '), Some(control)) if !matches!(control, ControlId::Field(_)) => {
                self.activate_focused()
            }
            (KeyCode::Char(c), Some(ControlId::Field(field)))
                if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let mut value = self.values.get(&field).cloned().unwrap_or_default();
                value.push(c);
                self.edit_outcome(&field, value)
            }
            (KeyCode::Backspace, Some(ControlId::Field(field))) => {
                let value = self.values.get(&field).cloned().unwrap_or_default();
                let trimmed = match value.grapheme_indices(true).last() {
                    Some((index, _)) => value[..index].to_string(),
                    None => return DialogOutcome::Handled,
                };
                self.edit_outcome(&field, trimmed)
            }
            _ => DialogOutcome::Ignored,
        }
    }

    /// Route a mouse event; clicks on the backdrop cancel
    pub fn handle_mouse(&mut self, event: MouseEvent) -> DialogOutcome {
        if !self.session.is_open() || event.kind != MouseEventKind::Down(MouseButton::Left) {
            return DialogOutcome::Ignored;
        }
        if self.session.is_processing() {
            debug!("Click dropped while processing");
            return DialogOutcome::Ignored;
        }
        let Some(layout) = &self.layout else {
            return DialogOutcome::Ignored;
        };

        if !layout.contains_point(event.column, event.row) {
            let dismiss = self.config.as_ref().map_or(false, |c| c.dismiss_on_backdrop);
            return if dismiss {
                self.request_cancel()
            } else {
                DialogOutcome::Ignored
            };
        }

        let hit = self
            .hit_areas
            .iter()
            .find(|(_, area)| {
                event.column >= area.x
                    && event.column < area.x + area.width
                    && event.row >= area.y
                    && event.row < area.y + area.height
            })
            .map(|(id, _)| id.clone());

        match hit {
            Some(control) if self.focus.focus(&control) => match control {
                ControlId::Field(_) => DialogOutcome::Handled,
                _ => self.activate_focused(),
            },
            _ => DialogOutcome::Handled,
        }
    }

    fn cycle_focus(&mut self, forward: bool) -> DialogOutcome {
        if self.focus.cycle(forward) {
            DialogOutcome::Handled
        } else {
            DialogOutcome::Ignored
        }
    }

    fn activate_focused(&mut self) -> DialogOutcome {
        match self.focus.focused() {
            Some(control) if control.dismisses() => self.request_cancel(),
            Some(_) => self.request_confirm(),
            None => DialogOutcome::Ignored,
        }
    }

    fn edit_outcome(&mut self, field: &str, value: String) -> DialogOutcome {
        if self.edit_field(field, value) {
            DialogOutcome::Handled
        } else {
            DialogOutcome::Ignored
        }
    }

    /// Record where the dialog was drawn, for backdrop and control hit-testing
    ///
    /// The focus ring follows the drawn layout, so a control the view had no
    /// room for drops out of tab order until it fits again.
    pub fn set_layout(&mut self, layout: DialogLayout, hit_areas: Vec<(ControlId, Rect)>) {
        if !self.session.is_open() {
            return;
        }
        self.layout = Some(layout);
        self.hit_areas = hit_areas;

        // Every control is disabled while processing; keep the ring as it was
        if !self.session.is_processing() {
            let controls = self.controls();
            self.focus.refresh(&controls);
        }
    }

    /// Interactive surface in document order
    pub fn controls(&self) -> Vec<Focusable> {
        let Some(config) = &self.config else {
            return Vec::new();
        };
        let disabled = self.session.is_processing();
        let mut controls = Vec::new();

        if config.show_close_button {
            let shown = self
                .layout
                .as_ref()
                .map_or(true, |layout| layout.close_area().is_some());
            controls.push(
                Focusable::new(ControlId::Close)
                    .disabled(disabled)
                    .navigable(shown),
            );
        }
        if let DialogBody::Form(schema) = &self.body {
            for field in schema.fields() {
                controls.push(Focusable::new(ControlId::field(&field.id)).disabled(disabled));
            }
        }
        controls.push(Focusable::new(ControlId::Cancel).disabled(disabled));
        controls.push(Focusable::new(ControlId::Confirm).disabled(disabled));
        controls
    }

    fn submission(&self) -> Option<Submission> {
        let session = self.session.id()?;
        let dialog = self.config.as_ref()?.id.clone();
        let values = self
            .values
            .iter()
            .map(|(field, value)| (field.clone(), value.trim().to_string()))
            .collect();

        Some(Submission {
            session,
            dialog,
            values,
        })
    }

    fn take_request(&mut self) -> Option<HostRequest> {
        let request = self.outbox.pop();
        self.outbox.clear();
        request
    }

    /// Apply one event; returns whether anything changed
    fn dispatch(&mut self, event: SessionEvent) -> bool {
        let was_open = self.session.is_open();
        let transition = reduce(&self.session, event);

        if transition.is_noop() && transition.session == self.session {
            return false;
        }

        self.session = transition.session;
        for effect in transition.effects {
            self.perform(effect);
        }

        if was_open && !self.session.is_open() {
            self.unmount();
        }
        true
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::SuppressScroll => {
                if self.scroll_lock.is_none() {
                    self.scroll_lock = Some(ScrollLock::engage(Arc::clone(&self.scroll)));
                }
            }
            Effect::RestoreScroll => {
                self.scroll_lock = None;
            }
            Effect::BindKeys => {
                if self.subscription.is_none() {
                    self.subscription = Some(self.listeners.subscribe());
                }
            }
            Effect::UnbindKeys => {
                self.subscription = None;
            }
            Effect::PlaceFocus => {
                let controls = self.controls();
                self.focus.engage(&controls);
            }
            Effect::FocusField(field) => {
                self.focus.focus(&ControlId::Field(field));
            }
            Effect::ReleaseFocus => {
                self.focus.release();
            }
            Effect::RunValidation => {
                let result = match &self.body {
                    DialogBody::Form(schema) => schema.validate(&self.values),
                    DialogBody::Message => ValidationResult::default(),
                };
                self.last_validation = Some(result.clone());

                if result.is_valid() {
                    self.dispatch(SessionEvent::ValidationPassed);
                } else {
                    self.dispatch(SessionEvent::ValidationFailed(result.into_field_errors()));
                }
            }
            Effect::InvokeConfirm => {
                self.in_flight = self.lock.begin();
                if self.in_flight.is_none() {
                    warn!("Processing lock already engaged at dispatch");
                }
                if let Some(submission) = self.submission() {
                    self.outbox.push(HostRequest::Confirm(submission));
                }
            }
            Effect::InvokeCancel => {
                self.outbox.push(HostRequest::Cancel);
            }
        }
    }

    /// Drop everything the closed session held
    fn unmount(&mut self) {
        self.in_flight = None;
        self.scroll_lock = None;
        self.subscription = None;
        self.focus.release();
        self.config = None;
        self.body = DialogBody::Message;
        self.values.clear();
        self.layout = None;
        self.hit_areas.clear();
    }

    pub fn session(&self) -> &DialogSession {
        &self.session
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    pub fn is_processing(&self) -> bool {
        self.session.is_processing()
    }

    pub fn config(&self) -> Option<&DialogConfig> {
        self.config.as_ref()
    }

    pub fn body(&self) -> &DialogBody {
        &self.body
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn focus(&self) -> &FocusTrap {
        &self.focus
    }

    pub fn focused(&self) -> Option<&ControlId> {
        self.focus.focused()
    }

    pub fn control_state(&self) -> Option<ControlState> {
        self.config
            .as_ref()
            .map(|config| ControlState::resolve(config, self.session.is_processing()))
    }

    pub fn processing_lock(&self) -> &ProcessingLock {
        &self.lock
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn router(&self) -> &KeyRouter {
        &self.router
    }

    pub fn layout(&self) -> Option<&DialogLayout> {
        self.layout.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::dialogs::presets;
    use crate::tui::components::dialogs::types::{DialogSize, DialogVariant};
    use crossterm::event::KeyModifiers;

    fn controller() -> (DialogController, Arc<AmbientScroll>) {
        let scroll = Arc::new(AmbientScroll::new());
        (DialogController::new(scroll.clone()), scroll)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn type_text(controller: &mut DialogController, text: &str) {
        for c in text.chars() {
            controller.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn with_layout(controller: &mut DialogController) {
        let config = controller.config().unwrap().clone().with_size(DialogSize::Fixed(20, 6));
        let layout = DialogLayout::calculate(&config, Rect::new(0, 0, 40, 12), (0, 0));
        controller.set_layout(layout, Vec::new());
    }

    #[test]
    fn test_open_idle_with_cancel_focused() {
        let (mut controller, scroll) = controller();
        controller.open(presets::delete_confirmation("Chapter 1")).unwrap();

        assert_eq!(controller.session().phase(), SessionPhase::Idle);
        assert_eq!(controller.focused(), Some(&ControlId::Cancel));
        assert!(scroll.is_suppressed());
        assert_eq!(controller.listeners().active(), 1);
    }

    #[test]
    fn test_info_dialog_also_defaults_to_cancel() {
        let (mut controller, _) = controller();
        let config = DialogConfig::new("notice", "Heads up").with_variant(DialogVariant::Info);
        controller.open(config).unwrap();

        assert_eq!(controller.focused(), Some(&ControlId::Cancel));
    }

    #[test]
    fn test_second_open_is_rejected() {
        let (mut controller, _) = controller();
        controller.open(presets::delete_confirmation("A")).unwrap();

        let err = controller.open(presets::delete_confirmation("B")).unwrap_err();
        assert!(matches!(err, DialogError::AlreadyOpen(_)));
        assert_eq!(controller.listeners().active(), 1);
    }

    #[test]
    fn test_escape_cancels_and_restores_scroll() {
        let (mut controller, scroll) = controller();
        controller.open(presets::delete_confirmation("Chapter 1")).unwrap();

        assert_eq!(controller.handle_key(key(KeyCode::Esc)), DialogOutcome::Cancelled);
        assert!(!controller.is_open());
        assert!(!scroll.is_suppressed());
        assert_eq!(controller.listeners().active(), 0);

        // Idempotent once closed
        assert_eq!(controller.request_cancel(), DialogOutcome::Ignored);
        assert_eq!(controller.handle_key(key(KeyCode::Esc)), DialogOutcome::Ignored);
    }

    #[test]
    fn test_escape_respects_closable() {
        let (mut controller, _) = controller();
        controller
            .open(presets::delete_confirmation("A").closable(false))
            .unwrap();

        assert_eq!(controller.handle_key(key(KeyCode::Esc)), DialogOutcome::Ignored);
        assert!(controller.is_open());
    }

    #[test]
    fn test_empty_title_rejected_without_dispatch() {
        let (mut controller, _) = controller();
        let (config, schema) = presets::new_story();
        controller.open_form(config, schema).unwrap();

        let outcome = controller.request_confirm();
        let DialogOutcome::Rejected(result) = outcome else {
            panic!("expected rejection, got {:?}", outcome);
        };
        assert_eq!(result.first().unwrap().message, "Title is required");
        assert_eq!(controller.session().field_error("title"), Some("Title is required"));
        assert_eq!(controller.focused(), Some(&ControlId::field("title")));
        assert!(!controller.is_processing());
        assert!(!controller.processing_lock().is_engaged());
    }

    #[test]
    fn test_edit_then_submit_dispatches_trimmed_values() {
        let (mut controller, _) = controller();
        let (config, schema) = presets::new_story();
        controller.open_form(config, schema).unwrap();
        controller.request_confirm();

        // Focus is on the failing field; typing clears its error
        type_text(&mut controller, " Ab ");
        assert_eq!(controller.session().field_error("title"), None);

        let DialogOutcome::Dispatched(submission) = controller.handle_key(key(KeyCode::Enter)) else {
            panic!("expected dispatch");
        };
        assert_eq!(submission.get("title"), Some("Ab"));
        assert!(controller.is_processing());
        assert!(controller.processing_lock().is_engaged());
        assert_eq!(controller.control_state().unwrap().confirm_label, "Processing…");
        assert!(controller.control_state().unwrap().disabled);
    }

    #[test]
    fn test_backspace_removes_grapheme() {
        let (mut controller, _) = controller();
        let (config, schema) = presets::new_container();
        controller.open_form(config, schema).unwrap();
        controller.request_confirm();

        type_text(&mut controller, "Ae\u{301}");
        controller.handle_key(key(KeyCode::Backspace));
        assert_eq!(controller.value("name"), Some("A"));
    }

    #[test]
    fn test_input_dropped_while_processing() {
        let (mut controller, scroll) = controller();
        let mut config = presets::delete_confirmation("Chapter 1");
        config.dismiss_on_backdrop = true;
        controller.open(config).unwrap();
        with_layout(&mut controller);

        assert!(matches!(controller.request_confirm(), DialogOutcome::Dispatched(_)));

        assert_eq!(controller.handle_key(key(KeyCode::Esc)), DialogOutcome::Ignored);
        assert_eq!(controller.handle_key(key(KeyCode::Tab)), DialogOutcome::Ignored);
        assert_eq!(controller.handle_mouse(click(0, 0)), DialogOutcome::Ignored);
        assert_eq!(controller.request_cancel(), DialogOutcome::Ignored);
        assert_eq!(controller.request_confirm(), DialogOutcome::Ignored);

        assert!(controller.is_processing());
        assert!(scroll.is_suppressed());
    }

    #[test]
    fn test_settle_success_closes_once() {
        let (mut controller, scroll) = controller();
        controller.open(presets::delete_confirmation("Chapter 1")).unwrap();
        let DialogOutcome::Dispatched(submission) = controller.request_confirm() else {
            panic!("expected dispatch");
        };

        assert_eq!(controller.settle(submission.session, Ok(())), SettleOutcome::Closed);
        assert!(!controller.is_open());
        assert!(!scroll.is_suppressed());
        assert!(!controller.processing_lock().is_engaged());

        assert_eq!(controller.settle(submission.session, Ok(())), SettleOutcome::Stale);
    }

    #[test]
    fn test_settle_failure_keeps_open_for_retry() {
        let (mut controller, _) = controller();
        controller.open(presets::delete_confirmation("Chapter 1")).unwrap();
        let DialogOutcome::Dispatched(submission) = controller.request_confirm() else {
            panic!("expected dispatch");
        };

        let outcome = controller.settle(submission.session, Err("network error".to_string()));
        assert_eq!(outcome, SettleOutcome::Failed);
        assert!(controller.is_open());
        assert!(!controller.is_processing());
        assert!(!controller.processing_lock().is_engaged());
        assert_eq!(controller.session().general_error(), Some("network error"));

        // Retry is allowed
        assert!(matches!(controller.request_confirm(), DialogOutcome::Dispatched(_)));
    }

    #[test]
    fn test_stale_settlement_from_previous_session() {
        let (mut controller, _) = controller();
        controller.open(presets::delete_confirmation("A")).unwrap();
        let DialogOutcome::Dispatched(old) = controller.request_confirm() else {
            panic!("expected dispatch");
        };
        assert!(controller.close());

        controller.open(presets::delete_confirmation("B")).unwrap();
        assert_eq!(controller.settle(old.session, Ok(())), SettleOutcome::Stale);
        assert!(controller.is_open());
    }

    #[test]
    fn test_backdrop_click_cancels() {
        let (mut controller, _) = controller();
        controller.open(presets::delete_confirmation("A")).unwrap();
        with_layout(&mut controller);

        // Inside the dialog: no dismissal
        assert_eq!(controller.handle_mouse(click(20, 6)), DialogOutcome::Handled);
        assert!(controller.is_open());

        assert_eq!(controller.handle_mouse(click(0, 0)), DialogOutcome::Cancelled);
        assert!(!controller.is_open());
    }

    #[test]
    fn test_backdrop_click_respects_config() {
        let (mut controller, _) = controller();
        controller
            .open(presets::delete_confirmation("A").dismiss_on_backdrop(false))
            .unwrap();
        with_layout(&mut controller);

        assert_eq!(controller.handle_mouse(click(0, 0)), DialogOutcome::Ignored);
        assert!(controller.is_open());
    }

    #[test]
    fn test_clicking_control_activates_it() {
        let (mut controller, _) = controller();
        controller.open(presets::delete_confirmation("A")).unwrap();
        let config = controller.config().unwrap().clone().with_size(DialogSize::Fixed(20, 6));
        let layout = DialogLayout::calculate(&config, Rect::new(0, 0, 40, 12), (0, 0));
        let confirm_area = Rect::new(22, 7, 6, 1);
        controller.set_layout(layout, vec![(ControlId::Confirm, confirm_area)]);

        assert!(matches!(controller.handle_mouse(click(23, 7)), DialogOutcome::Dispatched(_)));
    }

    #[test]
    fn test_tab_cycles_within_dialog() {
        let (mut controller, _) = controller();
        let (config, schema) = presets::new_container();
        controller.open_form(config, schema).unwrap();

        let order = controller.focus().boundary().unwrap().order().to_vec();
        for _ in 0..order.len() * 2 {
            assert_eq!(controller.handle_key(key(KeyCode::Tab)), DialogOutcome::Handled);
            assert!(order.contains(controller.focused().unwrap()));
        }
        // Full cycles land back on the default
        assert_eq!(controller.focused(), Some(&ControlId::Cancel));
    }

    #[test]
    fn test_close_control_leaves_ring_when_not_drawn() {
        let (mut controller, _) = controller();
        controller.open(presets::delete_confirmation("A")).unwrap();
        assert_eq!(controller.handle_key(key(KeyCode::BackTab)), DialogOutcome::Handled);
        assert_eq!(controller.focused(), Some(&ControlId::Close));

        // Too narrow for the close control beside the title corner
        let config = controller.config().unwrap().clone();
        let narrow = DialogLayout::calculate(&config, Rect::new(0, 0, 7, 12), (0, 0));
        assert!(narrow.close_area().is_none());
        controller.set_layout(narrow, Vec::new());

        let order = controller.focus().boundary().unwrap().order().to_vec();
        assert_eq!(order, vec![ControlId::Cancel, ControlId::Confirm]);
        assert_eq!(controller.focused(), Some(&ControlId::Cancel));
        for _ in 0..4 {
            controller.handle_key(key(KeyCode::Tab));
            assert_ne!(controller.focused(), Some(&ControlId::Close));
        }

        // Room again: the close control rejoins without moving focus
        let focused = controller.focused().cloned();
        let wide = DialogLayout::calculate(&config, Rect::new(0, 0, 80, 24), (0, 0));
        controller.set_layout(wide, Vec::new());
        assert!(controller.focus().boundary().unwrap().order().contains(&ControlId::Close));
        assert_eq!(controller.focused().cloned(), focused);
    }

    #[test]
    fn test_custom_router_and_shared_listeners() {
        let listeners = ListenerRegistry::new();
        let mut router = KeyRouter::new();
        router.unbind_key(KeyCode::Esc, KeyModifiers::NONE);
        router.bind_key(KeyCode::Char('q'), KeyModifiers::CONTROL, RouterCommand::Cancel);

        let (controller, scroll) = controller();
        let mut controller = controller.with_router(router).with_listeners(listeners.clone());

        controller.open(presets::delete_confirmation("A")).unwrap();
        assert_eq!(listeners.active(), 1);
        assert_eq!(controller.handle_key(key(KeyCode::Esc)), DialogOutcome::Ignored);
        assert!(controller.is_open());

        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(controller.handle_key(ctrl_q), DialogOutcome::Cancelled);
        assert_eq!(listeners.active(), 0);
        assert_eq!(listeners.bound_total(), 1);
        assert!(!scroll.is_suppressed());
    }

    #[test]
    fn test_space_on_cancel_button_cancels() {
        let (mut controller, _) = controller();
        controller.open(presets::delete_confirmation("A")).unwrap();

        assert_eq!(controller.handle_key(key(KeyCode::Char(' '))), DialogOutcome::Cancelled);
    }

    #[test]
    fn test_host_override_blocks_input() {
        let (mut controller, _) = controller();
        controller.set_processing_override(true);
        controller.open(presets::delete_confirmation("A")).unwrap();

        assert!(controller.is_processing());
        assert_eq!(controller.handle_key(key(KeyCode::Esc)), DialogOutcome::Ignored);
        assert_eq!(controller.request_confirm(), DialogOutcome::Ignored);

        controller.set_processing_override(false);
        assert_eq!(controller.handle_key(key(KeyCode::Esc)), DialogOutcome::Cancelled);
    }

    #[test]
    fn test_listeners_balanced_over_many_cycles() {
        let (mut controller, scroll) = controller();

        for round in 0..9 {
            controller.open(presets::delete_confirmation("A")).unwrap();
            match round % 3 {
                0 => {
                    controller.handle_key(key(KeyCode::Esc));
                }
                1 => {
                    let DialogOutcome::Dispatched(s) = controller.request_confirm() else {
                        panic!("expected dispatch");
                    };
                    controller.settle(s.session, Ok(()));
                }
                _ => {
                    controller.close();
                }
            }
            assert_eq!(controller.listeners().active(), 0);
            assert!(!scroll.is_suppressed());
        }

        assert_eq!(controller.listeners().bound_total(), 9);
        assert_eq!(scroll.engagements(), 9);
    }

    #[test]
    fn test_dropping_controller_restores_scroll() {
        let (mut controller, scroll) = controller();
        controller.open(presets::delete_confirmation("A")).unwrap();
        assert!(scroll.is_suppressed());

        drop(controller);
        assert!(!scroll.is_suppressed());
    }
}
