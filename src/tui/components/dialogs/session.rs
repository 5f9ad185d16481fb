//! Dialog session state and its transition function
//!
//! Every lifecycle change goes through [`reduce`], a pure function from the
//! current session and an event to the next session plus the side effects the
//! overlay controller must perform. The controller owns the resources; this
//! module only decides.

use super::types::{DialogVariant, SessionId};
use super::validation::FieldErrors;

/// Message used when a failed action reports nothing readable
pub const FALLBACK_ACTION_ERROR: &str = "The action failed. Please try again.";

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Closed,
    /// Open and accepting input
    Idle,
    /// Submit attempted, validation running
    Validating,
    /// Confirm delegated to the host and not yet settled
    Processing,
}

/// State of one open/close cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogSession {
    id: Option<SessionId>,
    phase: SessionPhase,
    variant: DialogVariant,
    field_errors: FieldErrors,
    general_error: Option<String>,
    external_processing: bool,
}

impl DialogSession {
    pub fn id(&self) -> Option<SessionId> {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != SessionPhase::Closed
    }

    /// True while a confirm is in flight or the host forces the busy state
    pub fn is_processing(&self) -> bool {
        self.phase == SessionPhase::Processing || (self.is_open() && self.external_processing)
    }

    pub fn variant(&self) -> DialogVariant {
        self.variant
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field)
    }

    pub fn general_error(&self) -> Option<&str> {
        self.general_error.as_deref()
    }
}

/// Inputs to the transition function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Host opened a dialog
    Open {
        id: SessionId,
        variant: DialogVariant,
    },
    /// Host closed the dialog without user action
    ForceClose,
    /// User asked to dismiss (key, backdrop, cancel or close control)
    Cancel,
    /// User asked to submit
    SubmitAttempted,
    /// Validation rejected the submission
    ValidationFailed(FieldErrors),
    /// Validation accepted the submission
    ValidationPassed,
    /// Host action resolved
    ConfirmSucceeded,
    /// Host action rejected with a message
    ConfirmFailed(String),
    /// User edited a field
    FieldEdited(String),
    /// Host-provided processing override
    ExternalProcessing(bool),
}

/// Side effects requested by a transition, performed in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SuppressScroll,
    RestoreScroll,
    BindKeys,
    UnbindKeys,
    /// Compute the focus boundary and focus the safe default
    PlaceFocus,
    /// Move focus to a field (first failing one after validation)
    FocusField(String),
    /// Drop the focus boundary
    ReleaseFocus,
    RunValidation,
    InvokeConfirm,
    InvokeCancel,
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: DialogSession,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(session: &DialogSession) -> Self {
        Self {
            session: session.clone(),
            effects: Vec::new(),
        }
    }

    fn closed(effects: Vec<Effect>) -> Self {
        Self {
            session: DialogSession::default(),
            effects,
        }
    }

    /// Whether the event was dropped
    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

const TEARDOWN: [Effect; 3] = [Effect::ReleaseFocus, Effect::UnbindKeys, Effect::RestoreScroll];

/// Compute the next session state for an event
pub fn reduce(session: &DialogSession, event: SessionEvent) -> Transition {
    use SessionPhase::*;

    match (session.phase, event) {
        (Closed, SessionEvent::Open { id, variant }) => Transition {
            session: DialogSession {
                id: Some(id),
                phase: Idle,
                variant,
                ..DialogSession::default()
            },
            effects: vec![Effect::SuppressScroll, Effect::BindKeys, Effect::PlaceFocus],
        },

        // Closed ignores everything else; cancel is idempotent
        (Closed, _) => Transition::unchanged(session),

        (_, SessionEvent::ForceClose) => Transition::closed(TEARDOWN.to_vec()),

        (Idle | Validating, SessionEvent::Cancel) if !session.external_processing => {
            let mut effects = TEARDOWN.to_vec();
            effects.push(Effect::InvokeCancel);
            Transition::closed(effects)
        }

        (Idle, SessionEvent::SubmitAttempted) if !session.external_processing => Transition {
            session: DialogSession {
                phase: Validating,
                ..session.clone()
            },
            effects: vec![Effect::RunValidation],
        },

        (Validating, SessionEvent::ValidationFailed(errors)) => {
            let effects = errors
                .first()
                .map(|first| vec![Effect::FocusField(first.field.clone())])
                .unwrap_or_default();
            Transition {
                session: DialogSession {
                    phase: Idle,
                    field_errors: errors,
                    ..session.clone()
                },
                effects,
            }
        }

        (Validating, SessionEvent::ValidationPassed) => Transition {
            session: DialogSession {
                phase: Processing,
                field_errors: FieldErrors::default(),
                general_error: None,
                ..session.clone()
            },
            effects: vec![Effect::InvokeConfirm],
        },

        (Processing, SessionEvent::ConfirmSucceeded) => Transition::closed(TEARDOWN.to_vec()),

        (Processing, SessionEvent::ConfirmFailed(message)) => {
            let message = if message.trim().is_empty() {
                FALLBACK_ACTION_ERROR.to_string()
            } else {
                message
            };
            Transition {
                session: DialogSession {
                    phase: Idle,
                    general_error: Some(message),
                    ..session.clone()
                },
                effects: Vec::new(),
            }
        }

        (Idle | Validating, SessionEvent::FieldEdited(field)) => {
            let mut next = session.clone();
            next.field_errors.clear(&field);
            Transition {
                session: next,
                effects: Vec::new(),
            }
        }

        (_, SessionEvent::ExternalProcessing(flag)) => Transition {
            session: DialogSession {
                external_processing: flag,
                ..session.clone()
            },
            effects: Vec::new(),
        },

        _ => Transition::unchanged(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::dialogs::validation::{FieldSpec, FormSchema};

    fn open(variant: DialogVariant) -> DialogSession {
        reduce(
            &DialogSession::default(),
            SessionEvent::Open {
                id: SessionId::new(),
                variant,
            },
        )
        .session
    }

    fn processing() -> DialogSession {
        let session = open(DialogVariant::Danger);
        let session = reduce(&session, SessionEvent::SubmitAttempted).session;
        reduce(&session, SessionEvent::ValidationPassed).session
    }

    fn title_errors() -> FieldErrors {
        FormSchema::new(FieldSpec::new("title", "Title"))
            .validate(&Default::default())
            .into_field_errors()
    }

    #[test]
    fn test_open_yields_idle_with_resources() {
        let t = reduce(
            &DialogSession::default(),
            SessionEvent::Open {
                id: SessionId::new(),
                variant: DialogVariant::Warning,
            },
        );

        assert_eq!(t.session.phase(), SessionPhase::Idle);
        assert_eq!(t.session.variant(), DialogVariant::Warning);
        assert!(t.session.id().is_some());
        assert_eq!(
            t.effects,
            vec![Effect::SuppressScroll, Effect::BindKeys, Effect::PlaceFocus]
        );
    }

    #[test]
    fn test_closed_session_ignores_cancel() {
        let t = reduce(&DialogSession::default(), SessionEvent::Cancel);
        assert!(t.is_noop());
        assert!(!t.session.is_open());
    }

    #[test]
    fn test_cancel_tears_down_then_invokes_host() {
        let t = reduce(&open(DialogVariant::Danger), SessionEvent::Cancel);

        assert_eq!(t.session, DialogSession::default());
        assert_eq!(t.effects.last(), Some(&Effect::InvokeCancel));
        assert!(t.effects.contains(&Effect::RestoreScroll));
        assert!(t.effects.contains(&Effect::UnbindKeys));
    }

    #[test]
    fn test_cancel_dropped_while_processing() {
        let session = processing();
        let t = reduce(&session, SessionEvent::Cancel);

        assert!(t.is_noop());
        assert_eq!(t.session, session);
    }

    #[test]
    fn test_cancel_dropped_under_external_override() {
        let session = open(DialogVariant::Info);
        let session = reduce(&session, SessionEvent::ExternalProcessing(true)).session;
        assert!(session.is_processing());

        assert!(reduce(&session, SessionEvent::Cancel).is_noop());
        assert!(reduce(&session, SessionEvent::SubmitAttempted).is_noop());
    }

    #[test]
    fn test_submit_while_processing_is_rejected() {
        let session = processing();
        assert!(reduce(&session, SessionEvent::SubmitAttempted).is_noop());
    }

    #[test]
    fn test_validation_failure_returns_to_idle_and_focuses_field() {
        let session = reduce(&open(DialogVariant::Info), SessionEvent::SubmitAttempted).session;
        assert_eq!(session.phase(), SessionPhase::Validating);

        let t = reduce(&session, SessionEvent::ValidationFailed(title_errors()));
        assert_eq!(t.session.phase(), SessionPhase::Idle);
        assert_eq!(t.session.field_error("title"), Some("Title is required"));
        assert_eq!(t.effects, vec![Effect::FocusField("title".to_string())]);
    }

    #[test]
    fn test_edit_clears_only_that_field() {
        let session = reduce(&open(DialogVariant::Info), SessionEvent::SubmitAttempted).session;
        let session = reduce(&session, SessionEvent::ValidationFailed(title_errors())).session;

        let edited = reduce(&session, SessionEvent::FieldEdited("summary".to_string())).session;
        assert_eq!(edited.field_error("title"), Some("Title is required"));

        let edited = reduce(&edited, SessionEvent::FieldEdited("title".to_string())).session;
        assert!(edited.field_errors().is_empty());
    }

    #[test]
    fn test_confirm_success_closes() {
        let t = reduce(&processing(), SessionEvent::ConfirmSucceeded);
        assert!(!t.session.is_open());
        assert!(t.effects.contains(&Effect::RestoreScroll));
        assert!(!t.effects.contains(&Effect::InvokeCancel));
    }

    #[test]
    fn test_confirm_failure_keeps_dialog_open() {
        let t = reduce(&processing(), SessionEvent::ConfirmFailed("network error".to_string()));

        assert!(t.session.is_open());
        assert!(!t.session.is_processing());
        assert_eq!(t.session.general_error(), Some("network error"));
    }

    #[test]
    fn test_blank_failure_message_gets_fallback() {
        let t = reduce(&processing(), SessionEvent::ConfirmFailed("  ".to_string()));
        assert_eq!(t.session.general_error(), Some(FALLBACK_ACTION_ERROR));
    }

    #[test]
    fn test_successful_retry_clears_general_error() {
        let session = reduce(&processing(), SessionEvent::ConfirmFailed("boom".to_string())).session;
        let session = reduce(&session, SessionEvent::SubmitAttempted).session;
        let session = reduce(&session, SessionEvent::ValidationPassed).session;

        assert_eq!(session.general_error(), None);
        assert!(session.is_processing());
    }

    #[test]
    fn test_force_close_reachable_from_processing() {
        let t = reduce(&processing(), SessionEvent::ForceClose);
        assert!(!t.session.is_open());
        assert_eq!(t.effects, TEARDOWN.to_vec());
    }

    #[test]
    fn test_reopen_while_open_is_ignored() {
        let session = open(DialogVariant::Info);
        let t = reduce(
            &session,
            SessionEvent::Open {
                id: SessionId::new(),
                variant: DialogVariant::Danger,
            },
        );
        assert!(t.is_noop());
        assert_eq!(t.session.id(), session.id());
    }
}
