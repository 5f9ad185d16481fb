//! Processing lock guarding in-flight confirm actions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::types::DialogConfig;

/// Guard against concurrent or repeated submission
///
/// [`ProcessingLock::begin`] hands out a [`LockToken`]; dropping the token is
/// the matching `end`, so the lock is released on every exit path of the
/// guarded action, panics included.
#[derive(Debug, Clone, Default)]
pub struct ProcessingLock {
    engaged: Arc<AtomicBool>,
}

impl ProcessingLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engage the lock, or `None` if it is already engaged
    pub fn begin(&self) -> Option<LockToken> {
        self.engaged
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LockToken {
                engaged: Arc::clone(&self.engaged),
            })
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }
}

/// Proof that the lock is held; releases it when dropped
#[derive(Debug)]
pub struct LockToken {
    engaged: Arc<AtomicBool>,
}

impl LockToken {
    /// Release explicitly
    pub fn end(self) {}
}

impl Drop for LockToken {
    fn drop(&mut self) {
        self.engaged.store(false, Ordering::SeqCst);
    }
}

/// What the render layer needs to know about actionable controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    /// Submit, cancel, close and fields are all disabled
    pub disabled: bool,
    /// Label currently shown on the confirm control
    pub confirm_label: String,
    /// Label currently shown on the cancel control
    pub cancel_label: String,
}

impl ControlState {
    pub fn resolve(config: &DialogConfig, busy: bool) -> Self {
        Self {
            disabled: busy,
            confirm_label: if busy {
                config.busy_label.clone()
            } else {
                config.confirm_label.clone()
            },
            cancel_label: config.cancel_label.clone(),
        }
    }
}
