use std::fmt;

/// Where the surface is in its expand/collapse cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotchState {
    #[default]
    Compact,
    Expanded,
    /// Only left through the animation engine's completion
    Animating,
}

impl fmt::Display for NotchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotchState::Compact => "compact",
            NotchState::Expanded => "expanded",
            NotchState::Animating => "animating",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotchStateMachine {
    state: NotchState,
}

impl NotchStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> NotchState {
        self.state
    }

    pub fn is_compact(&self) -> bool {
        self.state == NotchState::Compact
    }

    pub fn is_expanded(&self) -> bool {
        self.state == NotchState::Expanded
    }

    pub fn is_animating(&self) -> bool {
        self.state == NotchState::Animating
    }

    /// Returns `false` when already in `state`
    pub fn transition_to(&mut self, state: NotchState) -> bool {
        if self.state == state {
            return false;
        }
        tracing::trace!(from = %self.state, to = %state, "notch state");
        self.state = state;
        true
    }

    /// Whether an expand request may start an animation
    ///
    /// A forced request while expanded is accepted by the controller, but only
    /// to swap the expanded view; it never animates, so it is refused here.
    pub fn can_expand(&self, force: bool) -> bool {
        match self.state {
            NotchState::Compact => true,
            NotchState::Animating => force,
            NotchState::Expanded => false,
        }
    }

    pub fn can_collapse(&self) -> bool {
        self.state == NotchState::Expanded
    }

    /// Settle on the state matching a finished animation's target progress
    pub fn complete(&mut self, target: f32) -> NotchState {
        let settled = if target >= 0.5 {
            NotchState::Expanded
        } else {
            NotchState::Compact
        };
        self.transition_to(settled);
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_compact() {
        let machine = NotchStateMachine::new();
        assert!(machine.is_compact());
        assert!(!machine.is_expanded());
        assert!(!machine.is_animating());
    }

    #[test]
    fn test_transition_reports_change() {
        let mut machine = NotchStateMachine::new();
        assert!(!machine.transition_to(NotchState::Compact));
        assert!(machine.transition_to(NotchState::Animating));
        assert!(machine.is_animating());
    }

    #[test]
    fn test_expand_guards() {
        let mut machine = NotchStateMachine::new();
        assert!(machine.can_expand(false));

        machine.transition_to(NotchState::Animating);
        assert!(!machine.can_expand(false));
        assert!(machine.can_expand(true));

        machine.transition_to(NotchState::Expanded);
        assert!(!machine.can_expand(false));
        assert!(!machine.can_expand(true));
    }

    #[test]
    fn test_collapse_only_from_expanded() {
        let mut machine = NotchStateMachine::new();
        assert!(!machine.can_collapse());
        machine.transition_to(NotchState::Animating);
        assert!(!machine.can_collapse());
        machine.transition_to(NotchState::Expanded);
        assert!(machine.can_collapse());
    }

    #[test]
    fn test_complete_maps_target() {
        let mut machine = NotchStateMachine::new();
        machine.transition_to(NotchState::Animating);
        assert_eq!(machine.complete(1.0), NotchState::Expanded);

        machine.transition_to(NotchState::Animating);
        assert_eq!(machine.complete(0.0), NotchState::Compact);
        assert!(machine.is_compact());
    }
}
