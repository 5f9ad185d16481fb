//! Keyboard command routing for open dialogs
//!
//! Keys only reach a dialog through a live [`KeySubscription`]. A subscription
//! is acquired when a session opens and released by `Drop` when it leaves the
//! open state, so every open binds exactly one listener set and every close
//! removes exactly that set.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Commands the router can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouterCommand {
    /// Dismiss the dialog (Escape)
    Cancel,
    /// Move focus forward
    FocusNext,
    /// Move focus backward
    FocusPrevious,
    /// Activate the focused control
    Activate,
}

/// Key binding for router commands
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub key_code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(key_code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { key_code, modifiers }
    }

    pub fn from_key_event(event: KeyEvent) -> Self {
        Self {
            key_code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Registry tracking keyboard subscriptions held by dialog sessions
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    active: Arc<AtomicUsize>,
    bound_total: Arc<AtomicUsize>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind one listener set; it is unbound when the guard drops
    pub fn subscribe(&self) -> KeySubscription {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.bound_total.fetch_add(1, Ordering::SeqCst);
        KeySubscription {
            active: Arc::clone(&self.active),
        }
    }

    /// Number of listener sets currently bound
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of listener sets ever bound
    pub fn bound_total(&self) -> usize {
        self.bound_total.load(Ordering::SeqCst)
    }
}

/// Scoped keyboard listener set owned by an open session
#[derive(Debug)]
pub struct KeySubscription {
    active: Arc<AtomicUsize>,
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Maps key events to dialog commands
#[derive(Debug, Clone)]
pub struct KeyRouter {
    key_bindings: HashMap<KeyBinding, RouterCommand>,
}

impl KeyRouter {
    /// Create a router with the default bindings
    pub fn new() -> Self {
        let mut router = Self {
            key_bindings: HashMap::new(),
        };

        router.setup_default_bindings();
        router
    }

    fn setup_default_bindings(&mut self) {
        self.bind_key(KeyCode::Esc, KeyModifiers::NONE, RouterCommand::Cancel);

        self.bind_key(KeyCode::Tab, KeyModifiers::NONE, RouterCommand::FocusNext);

        // Terminals disagree on how Shift+Tab is reported
        self.bind_key(KeyCode::BackTab, KeyModifiers::SHIFT, RouterCommand::FocusPrevious);
        self.bind_key(KeyCode::BackTab, KeyModifiers::NONE, RouterCommand::FocusPrevious);
        self.bind_key(KeyCode::Tab, KeyModifiers::SHIFT, RouterCommand::FocusPrevious);

        self.bind_key(KeyCode::Enter, KeyModifiers::NONE, RouterCommand::Activate);
    }

    /// Bind a key to a command
    pub fn bind_key(&mut self, key_code: KeyCode, modifiers: KeyModifiers, command: RouterCommand) {
        let binding = KeyBinding::new(key_code, modifiers);
        self.key_bindings.insert(binding, command);
    }

    /// Remove a key binding
    pub fn unbind_key(&mut self, key_code: KeyCode, modifiers: KeyModifiers) {
        let binding = KeyBinding::new(key_code, modifiers);
        self.key_bindings.remove(&binding);
    }

    /// Look up the command bound to a key, ignoring subscription state
    pub fn command_for(&self, event: KeyEvent) -> Option<RouterCommand> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        self.key_bindings.get(&KeyBinding::from_key_event(event)).copied()
    }

    /// Route a key for a session
    ///
    /// Without a subscription (no open session) nothing is routed. While the
    /// session is processing every command is dropped rather than queued.
    pub fn route(
        &self,
        subscription: Option<&KeySubscription>,
        event: KeyEvent,
        processing: bool,
    ) -> Option<RouterCommand> {
        subscription?;

        let command = self.command_for(event)?;
        if processing {
            trace!(?command, "Dropping key command while processing");
            return None;
        }
        Some(command)
    }

    /// Get help text, one (keys, action) pair per bound command
    ///
    /// Keys that display the same are listed once and alternatives are
    /// joined with `/`.
    pub fn help_text(&self) -> Vec<(String, String)> {
        let mut grouped: BTreeMap<RouterCommand, Vec<String>> = BTreeMap::new();
        for (binding, command) in &self.key_bindings {
            grouped.entry(*command).or_default().push(format_key_binding(binding));
        }

        grouped
            .into_iter()
            .map(|(command, mut keys)| {
                keys.sort();
                keys.dedup();
                (keys.join("/"), format_command(command))
            })
            .collect()
    }
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a key binding for display
fn format_key_binding(binding: &KeyBinding) -> String {
    let mut parts = Vec::new();

    if binding.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl".to_string());
    }
    if binding.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt".to_string());
    }
    if binding.modifiers.contains(KeyModifiers::SHIFT) && binding.key_code != KeyCode::BackTab {
        parts.push("Shift".to_string());
    }

    let key_name = match binding.key_code {
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "Unknown".to_string(),
    };

    parts.push(key_name);
    parts.join("+")
}

/// Format a router command for display
fn format_command(command: RouterCommand) -> String {
    match command {
        RouterCommand::Cancel => "Cancel".to_string(),
        RouterCommand::FocusNext => "Next control".to_string(),
        RouterCommand::FocusPrevious => "Previous control".to_string(),
        RouterCommand::Activate => "Activate".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_default_bindings() {
        let router = KeyRouter::new();

        assert_eq!(router.command_for(key(KeyCode::Esc)), Some(RouterCommand::Cancel));
        assert_eq!(router.command_for(key(KeyCode::Tab)), Some(RouterCommand::FocusNext));
        assert_eq!(
            router.command_for(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(RouterCommand::FocusPrevious)
        );
        assert_eq!(router.command_for(key(KeyCode::Enter)), Some(RouterCommand::Activate));
        assert_eq!(router.command_for(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_route_requires_subscription() {
        let router = KeyRouter::new();
        assert_eq!(router.route(None, key(KeyCode::Esc), false), None);

        let registry = ListenerRegistry::new();
        let subscription = registry.subscribe();
        assert_eq!(
            router.route(Some(&subscription), key(KeyCode::Esc), false),
            Some(RouterCommand::Cancel)
        );
    }

    #[test]
    fn test_route_drops_everything_while_processing() {
        let router = KeyRouter::new();
        let registry = ListenerRegistry::new();
        let subscription = registry.subscribe();

        for code in [KeyCode::Esc, KeyCode::Tab, KeyCode::Enter] {
            assert_eq!(router.route(Some(&subscription), key(code), true), None);
        }
    }

    #[test]
    fn test_subscription_is_released_on_drop() {
        let registry = ListenerRegistry::new();

        for _ in 0..5 {
            let subscription = registry.subscribe();
            assert_eq!(registry.active(), 1);
            drop(subscription);
        }

        assert_eq!(registry.active(), 0);
        assert_eq!(registry.bound_total(), 5);
    }

    #[test]
    fn test_rebinding() {
        let mut router = KeyRouter::new();
        router.unbind_key(KeyCode::Esc, KeyModifiers::NONE);
        router.bind_key(KeyCode::Char('q'), KeyModifiers::CONTROL, RouterCommand::Cancel);

        assert_eq!(router.command_for(key(KeyCode::Esc)), None);
        assert_eq!(
            router.command_for(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            Some(RouterCommand::Cancel)
        );
    }

    #[test]
    fn test_help_text_one_entry_per_command() {
        let help = KeyRouter::new().help_text();

        assert_eq!(
            help,
            vec![
                ("Esc".to_string(), "Cancel".to_string()),
                ("Tab".to_string(), "Next control".to_string()),
                ("Shift+Tab".to_string(), "Previous control".to_string()),
                ("Enter".to_string(), "Activate".to_string()),
            ]
        );
    }

    #[test]
    fn test_help_text_follows_rebinding() {
        let mut router = KeyRouter::new();
        router.bind_key(KeyCode::Char('q'), KeyModifiers::CONTROL, RouterCommand::Cancel);

        let help = router.help_text();
        assert_eq!(help[0], ("Ctrl+Q/Esc".to_string(), "Cancel".to_string()));
    }
}
