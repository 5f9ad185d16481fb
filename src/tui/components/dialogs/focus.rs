//! Focus trap for open dialogs
//!
//! A dialog describes its interactive surface as a list of [`Focusable`]
//! descriptors in document order. On open the trap derives a
//! [`FocusBoundary`] from that list and keeps keyboard focus cycling inside
//! it until the session ends.

use super::types::ControlId;
use tracing::debug;

/// Description of one interactive element inside a dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Focusable {
    pub id: ControlId,
    /// Tab order hint: negative removes it from tab order, zero keeps document order
    pub tab_index: i32,
    pub disabled: bool,
    /// Whether the element has a navigable target at all
    pub navigable: bool,
}

impl Focusable {
    pub fn new(id: ControlId) -> Self {
        Self {
            id,
            tab_index: 0,
            disabled: false,
            navigable: true,
        }
    }

    pub fn with_tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = tab_index;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn navigable(mut self, navigable: bool) -> Self {
        self.navigable = navigable;
        self
    }

    fn is_eligible(&self) -> bool {
        !self.disabled && self.navigable && self.tab_index >= 0
    }
}

/// Ordered focus ring derived from a dialog's controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusBoundary {
    order: Vec<ControlId>,
    default_target: ControlId,
}

impl FocusBoundary {
    /// Compute the boundary; `None` when nothing is focusable
    pub fn compute(controls: &[Focusable]) -> Option<Self> {
        let mut eligible: Vec<(usize, &Focusable)> = controls
            .iter()
            .enumerate()
            .filter(|(_, control)| control.is_eligible())
            .collect();

        // Positive tab indices first (ascending), then document order
        eligible.sort_by_key(|(position, control)| {
            let explicit = control.tab_index > 0;
            (!explicit, if explicit { control.tab_index } else { 0 }, *position)
        });

        let order: Vec<ControlId> = eligible.into_iter().map(|(_, c)| c.id.clone()).collect();
        let first = order.first()?.clone();

        let default_target = order
            .iter()
            .find(|id| **id == ControlId::Cancel)
            .cloned()
            .unwrap_or(first);

        Some(Self {
            order,
            default_target,
        })
    }

    pub fn first_focusable(&self) -> &ControlId {
        &self.order[0]
    }

    pub fn last_focusable(&self) -> &ControlId {
        &self.order[self.order.len() - 1]
    }

    pub fn default_target(&self) -> &ControlId {
        &self.default_target
    }

    pub fn order(&self) -> &[ControlId] {
        &self.order
    }

    fn position(&self, id: &ControlId) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == id)
    }
}

/// Keeps focus within the boundary of the open dialog
#[derive(Debug, Clone, Default)]
pub struct FocusTrap {
    boundary: Option<FocusBoundary>,
    current: Option<usize>,
}

impl FocusTrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish the boundary and focus the safe default
    pub fn engage(&mut self, controls: &[Focusable]) {
        self.boundary = FocusBoundary::compute(controls);

        match &self.boundary {
            Some(boundary) => {
                self.current = boundary.position(boundary.default_target());
            }
            None => {
                debug!("No focusable controls in dialog; focus trap inactive");
                self.current = None;
            }
        }
    }

    /// Recompute the boundary, keeping focus on the same control if it survives
    pub fn refresh(&mut self, controls: &[Focusable]) {
        let focused = self.focused().cloned();
        self.engage(controls);
        if let Some(id) = focused {
            self.focus(&id);
        }
    }

    /// Drop the boundary; focus returns to the surrounding surface
    pub fn release(&mut self) {
        self.boundary = None;
        self.current = None;
    }

    pub fn is_active(&self) -> bool {
        self.boundary.is_some()
    }

    pub fn boundary(&self) -> Option<&FocusBoundary> {
        self.boundary.as_ref()
    }

    pub fn focused(&self) -> Option<&ControlId> {
        let boundary = self.boundary.as_ref()?;
        self.current.map(|index| &boundary.order[index])
    }

    pub fn is_focused(&self, id: &ControlId) -> bool {
        self.focused() == Some(id)
    }

    /// Move focus forward (Tab) or backward (Shift+Tab), wrapping at the edges
    pub fn cycle(&mut self, forward: bool) -> bool {
        let Some(boundary) = &self.boundary else {
            return false;
        };

        let len = boundary.order.len();
        let next = match self.current {
            Some(index) if forward => (index + 1) % len,
            Some(index) => (index + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };

        self.current = Some(next);
        true
    }

    /// Focus a specific control if it is inside the boundary
    pub fn focus(&mut self, id: &ControlId) -> bool {
        let Some(index) = self.boundary.as_ref().and_then(|b| b.position(id)) else {
            return false;
        };
        self.current = Some(index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_controls() -> Vec<Focusable> {
        vec![
            Focusable::new(ControlId::Close),
            Focusable::new(ControlId::field("title")),
            Focusable::new(ControlId::field("summary")),
            Focusable::new(ControlId::Cancel),
            Focusable::new(ControlId::Confirm),
        ]
    }

    #[test]
    fn test_boundary_defaults_to_cancel() {
        let boundary = FocusBoundary::compute(&form_controls()).unwrap();

        assert_eq!(boundary.first_focusable(), &ControlId::Close);
        assert_eq!(boundary.last_focusable(), &ControlId::Confirm);
        assert_eq!(boundary.default_target(), &ControlId::Cancel);
    }

    #[test]
    fn test_boundary_skips_ineligible_controls() {
        let controls = vec![
            Focusable::new(ControlId::Close).disabled(true),
            Focusable::new(ControlId::field("title")).navigable(false),
            Focusable::new(ControlId::field("hidden")).with_tab_index(-1),
            Focusable::new(ControlId::Confirm),
        ];
        let boundary = FocusBoundary::compute(&controls).unwrap();

        assert_eq!(boundary.order(), &[ControlId::Confirm]);
        // No cancel control, so the first focusable is the default
        assert_eq!(boundary.default_target(), &ControlId::Confirm);
    }

    #[test]
    fn test_positive_tab_index_comes_first() {
        let controls = vec![
            Focusable::new(ControlId::Close),
            Focusable::new(ControlId::Cancel).with_tab_index(2),
            Focusable::new(ControlId::Confirm).with_tab_index(1),
        ];
        let boundary = FocusBoundary::compute(&controls).unwrap();

        assert_eq!(
            boundary.order(),
            &[ControlId::Confirm, ControlId::Cancel, ControlId::Close]
        );
    }

    #[test]
    fn test_empty_set_never_traps() {
        let mut trap = FocusTrap::new();
        trap.engage(&[]);

        assert!(!trap.is_active());
        assert!(!trap.cycle(true));
        assert!(!trap.cycle(false));
        assert_eq!(trap.focused(), None);
    }

    #[test]
    fn test_tab_wraps_at_last_and_first() {
        let mut trap = FocusTrap::new();
        trap.engage(&form_controls());
        assert!(trap.is_focused(&ControlId::Cancel));

        trap.cycle(true);
        assert!(trap.is_focused(&ControlId::Confirm));
        trap.cycle(true);
        assert!(trap.is_focused(&ControlId::Close));

        trap.cycle(false);
        assert!(trap.is_focused(&ControlId::Confirm));
    }

    #[test]
    fn test_focus_never_leaves_boundary() {
        let mut trap = FocusTrap::new();
        trap.engage(&form_controls());
        let boundary = trap.boundary().unwrap().clone();

        for step in 0..23 {
            trap.cycle(step % 3 != 0);
            assert!(boundary.order().contains(trap.focused().unwrap()));
        }
    }

    #[test]
    fn test_focus_outside_boundary_is_refused() {
        let mut trap = FocusTrap::new();
        trap.engage(&form_controls());

        assert!(!trap.focus(&ControlId::field("nope")));
        assert!(trap.is_focused(&ControlId::Cancel));
        assert!(trap.focus(&ControlId::field("title")));
        assert!(trap.is_focused(&ControlId::field("title")));
    }

    #[test]
    fn test_release_returns_focus() {
        let mut trap = FocusTrap::new();
        trap.engage(&form_controls());
        trap.release();

        assert!(!trap.is_active());
        assert_eq!(trap.focused(), None);
    }
}
