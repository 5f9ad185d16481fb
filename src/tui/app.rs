use anyhow::Result;
use async_trait::async_trait;
use clap::ValueEnum;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use futures::FutureExt;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::config::{Config, DemoConfig, DialogDefaults};
use crate::tui::components::dialogs::{
    host::panic_message, presets, presets::dialog_ids, view, AmbientScroll, DialogController,
    DialogHost, DialogOutcome, SessionId, SettleOutcome, Submission,
};
use crate::tui::{events::Event, themes::Theme, Frame};

/// Dialog the demo opens on start
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoDialog {
    /// Danger confirmation for deleting the selected item
    Delete,
    /// Story creation form
    Story,
    /// Container creation form
    Container,
}

/// Stand-in for the document store behind the dialogs
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    delay: Duration,
    fail: bool,
    failure_message: String,
}

impl SimulatedBackend {
    pub fn from_config(config: &DemoConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            fail: config.fail,
            failure_message: config.failure_message.clone(),
        }
    }

    pub async fn perform(&self, submission: &Submission) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            anyhow::bail!("{}", self.failure_message);
        }
        debug!(dialog = %submission.dialog, "Backend accepted submission");
        Ok(())
    }
}

#[async_trait]
impl DialogHost for SimulatedBackend {
    async fn on_confirm(&mut self, submission: &Submission) -> Result<()> {
        self.perform(submission).await
    }

    fn on_cancel(&mut self) {
        debug!("Dialog dismissed");
    }
}

/// Demo writing desk: a scrollable list of stories with dialogs on top
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    controller: DialogController,
    scroll: Arc<AmbientScroll>,
    theme: Theme,
    dialog_defaults: DialogDefaults,
    backend: SimulatedBackend,
    sender: mpsc::UnboundedSender<Event>,

    items: Vec<String>,
    selected: usize,
    offset: usize,
    pending: Option<Submission>,
    status: Option<String>,
}

impl App {
    pub fn new(config: &Config, sender: mpsc::UnboundedSender<Event>) -> Self {
        let scroll = Arc::new(AmbientScroll::new());

        Self {
            should_quit: false,
            controller: DialogController::new(scroll.clone()),
            scroll,
            theme: config.theme(),
            dialog_defaults: config.dialog.clone(),
            backend: SimulatedBackend::from_config(&config.demo),
            sender,
            items: (1..=30).map(|n| format!("Chapter {}", n)).collect(),
            selected: 0,
            offset: 0,
            pending: None,
            status: None,
        }
    }

    /// Open one of the demo dialogs
    pub fn open(&mut self, dialog: DemoDialog) -> Result<()> {
        let defaults = &self.dialog_defaults;
        match dialog {
            DemoDialog::Delete => {
                let Some(name) = self.items.get(self.selected) else {
                    self.status = Some("Nothing to delete".to_string());
                    return Ok(());
                };
                let config = defaults.apply(presets::delete_confirmation(name));
                self.controller.open(config)?;
            }
            DemoDialog::Story => {
                let (config, schema) = presets::new_story();
                self.controller.open_form(defaults.apply(config), schema)?;
            }
            DemoDialog::Container => {
                let (config, schema) = presets::new_container();
                self.controller.open_form(defaults.apply(config), schema)?;
            }
        }
        Ok(())
    }

    /// Handle an event; returns whether the application should quit
    pub fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key) => self.handle_key(key)?,
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::ConfirmSettled { session, result } => self.settle(session, result),
            Event::Resize(..) | Event::Tick => {}
        }
        Ok(self.should_quit)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind == KeyEventKind::Release {
            return Ok(());
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        if self.controller.is_open() {
            let outcome = self.controller.handle_key(key);
            self.apply_outcome(outcome);
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-10),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::Char('d') => self.open(DemoDialog::Delete)?,
            KeyCode::Char('n') => self.open(DemoDialog::Story)?,
            KeyCode::Char('c') => self.open(DemoDialog::Container)?,
            _ => {}
        }
        Ok(())
    }

    fn handle_mouse(&mut self, event: MouseEvent) {
        if self.controller.is_open() {
            let outcome = self.controller.handle_mouse(event);
            if outcome != DialogOutcome::Ignored {
                self.apply_outcome(outcome);
                return;
            }
        }

        match event.kind {
            MouseEventKind::ScrollDown => self.scroll_by(1),
            MouseEventKind::ScrollUp => self.scroll_by(-1),
            _ => {}
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        if self.scroll.is_suppressed() {
            trace!("Scroll suppressed while a dialog is open");
            return;
        }
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    fn apply_outcome(&mut self, outcome: DialogOutcome) {
        match outcome {
            DialogOutcome::Dispatched(submission) => self.dispatch(submission),
            DialogOutcome::Cancelled => self.status = Some("Cancelled".to_string()),
            DialogOutcome::Rejected(_) | DialogOutcome::Handled | DialogOutcome::Ignored => {}
        }
    }

    /// Run the confirmed action in the background; the outcome comes back as
    /// [`Event::ConfirmSettled`]
    fn dispatch(&mut self, submission: Submission) {
        let backend = self.backend.clone();
        let sender = self.sender.clone();
        self.pending = Some(submission.clone());

        tokio::spawn(async move {
            let session = submission.session;
            let result = match AssertUnwindSafe(backend.perform(&submission)).catch_unwind().await {
                Ok(result) => result.map_err(|err| err.to_string()),
                Err(panic) => Err(panic_message(panic)),
            };

            if sender.send(Event::ConfirmSettled { session, result }).is_err() {
                debug!(%session, "Event loop closed before settlement");
            }
        });
    }

    fn settle(&mut self, session: SessionId, result: Result<(), String>) {
        if self.controller.settle(session, result) != SettleOutcome::Closed {
            return;
        }
        match self.pending.take() {
            Some(submission) if submission.session == session => self.apply_submission(&submission),
            other => self.pending = other,
        }
    }

    fn apply_submission(&mut self, submission: &Submission) {
        match submission.dialog.as_str() {
            dialog_ids::DELETE_ITEM => {
                if self.selected < self.items.len() {
                    let removed = self.items.remove(self.selected);
                    self.selected = self.selected.min(self.items.len().saturating_sub(1));
                    self.status = Some(format!("Deleted \"{}\"", removed));
                }
            }
            dialog_ids::NEW_STORY => {
                let title = submission.get("title").unwrap_or_default().to_string();
                self.status = Some(format!("Created story \"{}\"", title));
                self.push_item(title);
            }
            dialog_ids::NEW_CONTAINER => {
                let name = submission.get("name").unwrap_or_default().to_string();
                self.status = Some(format!("Created container \"{}\"", name));
                self.push_item(format!("{}/", name));
            }
            other => debug!(dialog = other, "No handler for submission"),
        }
        info!(items = self.items.len(), "Desk updated");
    }

    fn push_item(&mut self, item: String) {
        self.items.push(item);
        self.selected = self.items.len() - 1;
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let styles = self.theme.styles();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        let header = Paragraph::new(Span::styled(
            " Quire · writing desk",
            Style::default().fg(self.theme.primary).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(header, chunks[0]);

        let list_area = chunks[1];
        let height = list_area.height.saturating_sub(2) as usize;
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if height > 0 && self.selected >= self.offset + height {
            self.offset = self.selected + 1 - height;
        }

        let lines: Vec<Line> = self
            .items
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(height)
            .map(|(index, item)| {
                if index == self.selected {
                    Line::from(Span::styled(
                        format!("› {}", item),
                        Style::default().fg(self.theme.fg_selected).bg(self.theme.primary),
                    ))
                } else {
                    Line::from(Span::styled(format!("  {}", item), styles.base))
                }
            })
            .collect();

        // The list only holds focus while no dialog is open
        let border = if self.controller.is_open() {
            self.theme.border
        } else {
            self.theme.border_focus
        };
        let list = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(" Stories "),
        );
        frame.render_widget(list, list_area);

        let footer = if self.controller.is_open() {
            self.dialog_hints()
        } else {
            match &self.status {
                Some(status) => Line::from(Span::styled(format!(" {}", status), styles.base)),
                None => Line::from(Span::styled(
                    " ↑/↓ scroll · d delete · n new story · c new container · q quit",
                    styles.muted,
                )),
            }
        };
        frame.render_widget(Paragraph::new(footer), chunks[2]);

        view::render(frame, area, &mut self.controller, &self.theme);
    }

    /// Key hints for the open dialog, taken from its router bindings
    fn dialog_hints(&self) -> Line<'static> {
        let styles = self.theme.styles();
        let mut spans = vec![Span::raw(" ")];

        for (index, (keys, action)) in self.controller.router().help_text().into_iter().enumerate() {
            if index > 0 {
                spans.push(Span::styled(" · ", styles.subtle));
            }
            spans.push(Span::styled(keys, styles.base));
            spans.push(Span::styled(format!(" {}", action.to_lowercase()), styles.muted));
        }
        Line::from(spans)
    }

    pub fn controller(&self) -> &DialogController {
        &self.controller
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}
