use crate::{
    logical::{ActionId, InputMap},
    physical::KeyCode,
};

pub const VIEWPORT_FORWARD: ActionId = ActionId(1);
pub const VIEWPORT_BACKWARDS: ActionId = ActionId(2);
pub const VIEWPORT_LEFT: ActionId = ActionId(3);
pub const VIEWPORT_RIGHT: ActionId = ActionId(4);
pub const VIEWPORT_RAISE: ActionId = ActionId(5);
pub const VIEWPORT_LOWER: ActionId = ActionId(6);

pub const CHANGE_CURSOR_LOCK_STATE: ActionId = ActionId(10);
pub const QUIT_PROGRAM: ActionId = ActionId(11);
pub const INPUT_TEST: ActionId = ActionId(12);
pub const TOGGLE_WIREFRAME: ActionId = ActionId(13);
pub const CYCLE_SHADING: ActionId = ActionId(14);

impl InputMap {
    /// Fly-camera controls plus the debug/window toggles.
    pub fn viewport_defaults() -> Self {
        let mut map = InputMap::default();
        map.bind_keyboard_button(KeyCode::KeyW, VIEWPORT_FORWARD)
            .bind_keyboard_button(KeyCode::KeyS, VIEWPORT_BACKWARDS)
            .bind_keyboard_button(KeyCode::KeyA, VIEWPORT_LEFT)
            .bind_keyboard_button(KeyCode::KeyD, VIEWPORT_RIGHT)
            .bind_keyboard_button(KeyCode::Space, VIEWPORT_RAISE)
            .bind_keyboard_button(KeyCode::ShiftLeft, VIEWPORT_LOWER)
            .bind_keyboard_button(KeyCode::Tab, CHANGE_CURSOR_LOCK_STATE)
            .bind_keyboard_button(KeyCode::Escape, QUIT_PROGRAM)
            .bind_keyboard_button(KeyCode::KeyT, INPUT_TEST)
            .bind_keyboard_button(KeyCode::F1, TOGGLE_WIREFRAME)
            .bind_keyboard_button(KeyCode::F2, CYCLE_SHADING);
        map
    }
}
