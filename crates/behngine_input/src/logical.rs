use std::collections::HashMap;

use crate::physical::{InputState, KeyCode, MouseButtonId, PhysicalInputId};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub u32);

#[derive(Clone, Debug)]
pub struct InputBinding {
    pub physical: PhysicalInputId,
    pub action: ActionId,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ButtonPhase: u8 {
        const NONE     = 0;
        const PRESSED  = 1 << 0;
        const HELD     = 1 << 1;
        const RELEASED = 1 << 2;
    }
}

#[derive(Clone, Debug)]
pub struct ActionState {
    pub phase: ButtonPhase,
}

#[derive(Default, Clone, Debug)]
pub struct InputMap {
    pub bindings: Vec<InputBinding>,
}

impl InputMap {
    pub fn bind_keyboard_button(&mut self, key_code: KeyCode, action: ActionId) -> &mut Self {
        self.bind(PhysicalInputId::key(key_code), action)
    }

    pub fn bind_mouse_button(&mut self, button: MouseButtonId, action: ActionId) -> &mut Self {
        self.bind(PhysicalInputId::mouse(button), action)
    }

    pub fn bind(&mut self, physical: PhysicalInputId, action: ActionId) -> &mut Self {
        self.bindings.push(InputBinding { physical, action });
        self
    }

    /// Resolves physical buttons into action phases. Run once per frame.
    pub fn apply(&self, input_state: &mut InputState) {
        // Reset logical state
        for action in input_state.actions.values_mut() {
            let was_held = action.phase.contains(ButtonPhase::HELD);
            action.phase = if was_held {
                ButtonPhase::HELD
            } else {
                ButtonPhase::NONE
            };
        }

        // Any bound input being down holds the action.
        let mut down: HashMap<ActionId, bool> = HashMap::new();
        for binding in &self.bindings {
            let pressed = input_state.is_physical_down(binding.physical);
            *down.entry(binding.action).or_insert(false) |= pressed;
        }

        for (action, pressed) in down {
            let entry = input_state.actions.entry(action).or_insert(ActionState {
                phase: ButtonPhase::NONE,
            });
            let was_held = entry.phase.contains(ButtonPhase::HELD);

            if pressed {
                if !was_held {
                    entry.phase |= ButtonPhase::PRESSED | ButtonPhase::HELD;
                }
            } else if was_held {
                entry.phase.remove(ButtonPhase::HELD);
                entry.phase |= ButtonPhase::RELEASED;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUMP: ActionId = ActionId(7);

    fn jump_map() -> InputMap {
        let mut map = InputMap::default();
        map.bind_keyboard_button(KeyCode::Space, JUMP);
        map
    }

    #[test]
    fn press_hold_release_cycle() {
        let map = jump_map();
        let mut state = InputState::default();
        let space = PhysicalInputId::key(KeyCode::Space);

        map.apply(&mut state);
        assert!(!state.is_held(JUMP));
        assert!(!state.just_pressed(JUMP));

        state.press(space);
        map.apply(&mut state);
        assert!(state.just_pressed(JUMP));
        assert!(state.is_held(JUMP));

        map.apply(&mut state);
        assert!(!state.just_pressed(JUMP));
        assert!(state.is_held(JUMP));

        state.release(space);
        map.apply(&mut state);
        assert!(state.just_released(JUMP));
        assert!(!state.is_held(JUMP));

        map.apply(&mut state);
        assert!(!state.just_released(JUMP));
    }

    #[test]
    fn any_bound_input_holds_action() {
        let mut map = jump_map();
        map.bind_mouse_button(MouseButtonId::Left, JUMP);

        let mut state = InputState::default();
        state.press(PhysicalInputId::mouse(MouseButtonId::Left));
        map.apply(&mut state);
        assert!(state.is_held(JUMP));

        // Space is up but the mouse button is still down.
        state.release(PhysicalInputId::key(KeyCode::Space));
        map.apply(&mut state);
        assert!(state.is_held(JUMP));
        assert!(!state.just_released(JUMP));
    }

    #[test]
    fn unbound_actions_are_never_held() {
        let map = jump_map();
        let mut state = InputState::default();
        state.press(PhysicalInputId::key(KeyCode::KeyQ));
        map.apply(&mut state);
        assert!(!state.is_held(ActionId(99)));
        assert!(!state.is_held(JUMP));
    }
}
