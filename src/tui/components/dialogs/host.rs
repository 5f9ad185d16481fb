//! Host contract and the driver that binds a controller to a host
//!
//! The host supplies the action behind the confirm control and gets told when
//! the user dismisses the dialog. Each callback fires exactly once per
//! user-initiated action. Failures and panics raised by the host are caught
//! here and turned into the dialog's general error; nothing escapes to the
//! surrounding application.

use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyEvent, MouseEvent};
use futures::FutureExt;
use ratatui::layout::Rect;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{error, warn};

use super::{
    overlay::{DialogController, DialogOutcome, SettleOutcome, Submission},
    types::{DialogConfig, DialogError, DialogResult, SessionId},
    validation::FormSchema,
    view,
};
use crate::tui::{
    components::{Component, ComponentState},
    themes::Theme,
    Frame,
};

/// Callbacks a host UI provides for its dialogs
#[async_trait]
pub trait DialogHost: Send {
    /// Perform the confirmed action; an error keeps the dialog open
    async fn on_confirm(&mut self, submission: &Submission) -> Result<()>;

    /// The user dismissed the dialog
    fn on_cancel(&mut self);
}

/// Controller plus host, delivering callbacks as outcomes demand
pub struct DialogDriver<H: DialogHost> {
    controller: DialogController,
    host: H,
    state: ComponentState,
}

impl<H: DialogHost> DialogDriver<H> {
    pub fn new(controller: DialogController, host: H) -> Self {
        Self {
            controller,
            host,
            state: ComponentState::new(),
        }
    }

    pub fn controller(&self) -> &DialogController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut DialogController {
        &mut self.controller
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn open(&mut self, config: DialogConfig) -> DialogResult<SessionId> {
        self.controller.open(config)
    }

    pub fn open_form(&mut self, config: DialogConfig, schema: FormSchema) -> DialogResult<SessionId> {
        self.controller.open_form(config, schema)
    }

    pub fn close(&mut self) -> bool {
        self.controller.close()
    }

    pub fn edit_field(&mut self, field: &str, value: impl Into<String>) -> bool {
        self.controller.edit_field(field, value)
    }

    pub async fn request_cancel(&mut self) -> DialogOutcome {
        let outcome = self.controller.request_cancel();
        self.deliver(outcome).await
    }

    pub async fn request_confirm(&mut self) -> DialogOutcome {
        let outcome = self.controller.request_confirm();
        self.deliver(outcome).await
    }

    /// Submit and wait for the host, reporting the result as an error type
    ///
    /// Validation failures surface as [`DialogError::Validation`] and host
    /// failures as [`DialogError::ConfirmAction`]; in both cases the dialog
    /// stays open.
    pub async fn confirm(&mut self) -> DialogResult<()> {
        if !self.controller.is_open() {
            return Err(DialogError::NotOpen);
        }

        match self.request_confirm().await {
            DialogOutcome::Rejected(result) => match result.first() {
                Some(error) => Err(error.clone().into()),
                None => Ok(()),
            },
            DialogOutcome::Dispatched(_) if self.controller.is_open() => {
                let message = self.controller.session().general_error().unwrap_or_default();
                Err(DialogError::ConfirmAction(message.to_string()))
            }
            DialogOutcome::Ignored => Err(DialogError::ConfirmAction(
                "Another action is still in progress".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> DialogOutcome {
        let outcome = self.controller.handle_key(key);
        self.deliver(outcome).await
    }

    pub async fn handle_mouse(&mut self, event: MouseEvent) -> DialogOutcome {
        let outcome = self.controller.handle_mouse(event);
        self.deliver(outcome).await
    }

    /// Fire whatever host callback the outcome calls for
    async fn deliver(&mut self, outcome: DialogOutcome) -> DialogOutcome {
        match &outcome {
            DialogOutcome::Cancelled => self.invoke_cancel(),
            DialogOutcome::Dispatched(submission) => {
                self.invoke_confirm(submission).await;
            }
            _ => {}
        }
        outcome
    }

    fn invoke_cancel(&mut self) {
        let host = &mut self.host;
        if std::panic::catch_unwind(AssertUnwindSafe(|| host.on_cancel())).is_err() {
            error!("Dialog host panicked in on_cancel");
        }
    }

    async fn invoke_confirm(&mut self, submission: &Submission) -> SettleOutcome {
        let result = AssertUnwindSafe(self.host.on_confirm(submission))
            .catch_unwind()
            .await;

        let result = match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.to_string()),
            Err(panic) => {
                error!("Dialog host panicked in on_confirm");
                Err(panic_message(panic))
            }
        };

        let settled = self.controller.settle(submission.session, result);
        if settled == SettleOutcome::Stale {
            warn!(session = %submission.session, "Confirm settled after its session ended");
        }
        settled
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "The action failed unexpectedly.".to_string()
    }
}

#[async_trait]
impl<H: DialogHost + Sync> Component for DialogDriver<H> {
    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<()> {
        self.handle_key(event).await;
        Ok(())
    }

    async fn handle_mouse_event(&mut self, event: MouseEvent) -> Result<()> {
        self.handle_mouse(event).await;
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        view::render(frame, area, &mut self.controller, theme);
    }

    fn size(&self) -> Rect {
        self.state.size
    }

    fn set_size(&mut self, size: Rect) {
        self.state.size = size;
    }

    fn has_focus(&self) -> bool {
        self.controller.is_open()
    }

    fn is_visible(&self) -> bool {
        self.controller.is_open()
    }
}
