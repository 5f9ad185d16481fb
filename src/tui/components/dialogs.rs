//! Modal dialog engine
//!
//! One [`DialogController`] owns the lifecycle of a single modal surface:
//! it locks ambient scrolling while open, traps focus inside the dialog,
//! routes keyboard commands, gates submission behind form validation and
//! prevents duplicate submission while the host's action is in flight.
//!
//! Lifecycle transitions are computed by the pure [`reduce`] function in
//! [`session`]; the controller performs the effects it returns. The
//! [`DialogDriver`] pairs a controller with a [`DialogHost`] for hosts that
//! want their callbacks invoked directly.

pub mod focus;
pub mod host;
pub mod lock;
pub mod navigation;
pub mod overlay;
pub mod presets;
pub mod session;
pub mod types;
pub mod validation;
pub mod view;

pub use focus::{FocusBoundary, FocusTrap, Focusable};
pub use host::{DialogDriver, DialogHost};
pub use lock::{ControlState, LockToken, ProcessingLock};
pub use navigation::{KeyRouter, KeySubscription, ListenerRegistry, RouterCommand};
pub use overlay::{
    AmbientScroll, DialogBody, DialogController, DialogOutcome, ScrollLock, ScrollSurface,
    SettleOutcome, Submission,
};
pub use session::{reduce, DialogSession, Effect, SessionEvent, SessionPhase, Transition};
pub use types::*;
pub use validation::{FieldErrors, FieldRule, FieldSpec, FormSchema, ValidationError, ValidationResult};
