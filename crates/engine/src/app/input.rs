use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Talk,
    Quit,
}

impl InputAction {
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Held actions as a bit set, one bit per `InputAction`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    held: u8,
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        if is_down {
            self.held |= action.bit();
        } else {
            self.held &= !action.bit();
        }
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.held & action.bit() != 0
    }
}

/// WASD and the arrow keys move, `T` talks, `Escape` quits.
pub(crate) fn action_for_key(code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveUp),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveDown),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::KeyT => Some(InputAction::Talk),
        KeyCode::Escape => Some(InputAction::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_toggle_independently() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveUp, true);
        states.set(InputAction::Talk, true);
        states.set(InputAction::MoveUp, false);

        assert!(!states.is_down(InputAction::MoveUp));
        assert!(states.is_down(InputAction::Talk));
        assert!(!states.is_down(InputAction::Quit));
    }

    #[test]
    fn arrows_and_wasd_share_actions() {
        assert_eq!(action_for_key(KeyCode::KeyW), action_for_key(KeyCode::ArrowUp));
        assert_eq!(action_for_key(KeyCode::KeyD), Some(InputAction::MoveRight));
        assert_eq!(action_for_key(KeyCode::Tab), None);
        assert_eq!(action_for_key(KeyCode::F3), None);
    }
}
