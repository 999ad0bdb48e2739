use std::collections::HashMap;

pub use winit::keyboard::KeyCode;

use crate::logical::{ActionId, ActionState, ButtonPhase};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MouseButtonId {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

impl From<winit::event::MouseButton> for MouseButtonId {
    fn from(button: winit::event::MouseButton) -> Self {
        use winit::event::MouseButton;
        match button {
            MouseButton::Left => Self::Left,
            MouseButton::Right => Self::Right,
            MouseButton::Middle => Self::Middle,
            MouseButton::Back => Self::Back,
            MouseButton::Forward => Self::Forward,
            MouseButton::Other(code) => Self::Other(code),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DeviceKind {
    Keyboard(KeyCode),
    MouseButton(MouseButtonId),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PhysicalInputId {
    pub device: DeviceKind,
}

impl PhysicalInputId {
    pub fn key(code: KeyCode) -> Self {
        Self {
            device: DeviceKind::Keyboard(code),
        }
    }

    pub fn mouse(button: MouseButtonId) -> Self {
        Self {
            device: DeviceKind::MouseButton(button),
        }
    }
}

#[derive(Default, Debug)]
pub struct InputState {
    pub physical_buttons: HashMap<PhysicalInputId, bool>,
    pub actions: HashMap<ActionId, ActionState>,

    pub mouse_position: Option<(f32, f32)>,
    /// Cursor travel accumulated since the last `end_frame`.
    pub mouse_delta: (f32, f32),
}

impl InputState {
    pub fn press(&mut self, id: PhysicalInputId) {
        self.physical_buttons.insert(id, true);
    }

    pub fn release(&mut self, id: PhysicalInputId) {
        self.physical_buttons.insert(id, false);
    }

    pub fn is_physical_down(&self, id: PhysicalInputId) -> bool {
        self.physical_buttons.get(&id).copied().unwrap_or(false)
    }

    /// Raw relative motion (device events), independent of cursor clamping.
    pub fn accumulate_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    /// Checkpoints the absolute cursor position and accumulates the change from
    /// the previous checkpoint. The first position only seeds the checkpoint.
    pub fn set_cursor_position(&mut self, x: f32, y: f32) {
        if let Some((last_x, last_y)) = self.mouse_position {
            self.accumulate_mouse_motion(x - last_x, y - last_y);
        }
        self.mouse_position = Some((x, y));
    }

    /// Forgets the cursor checkpoint, e.g. when the cursor leaves the window.
    pub fn reset_cursor(&mut self) {
        self.mouse_position = None;
    }

    pub fn is_held(&self, action: ActionId) -> bool {
        self.phase_contains(action, ButtonPhase::HELD)
    }

    pub fn just_pressed(&self, action: ActionId) -> bool {
        self.phase_contains(action, ButtonPhase::PRESSED)
    }

    pub fn just_released(&self, action: ActionId) -> bool {
        self.phase_contains(action, ButtonPhase::RELEASED)
    }

    fn phase_contains(&self, action: ActionId, phase: ButtonPhase) -> bool {
        self.actions
            .get(&action)
            .map(|a| a.phase.contains(phase))
            .unwrap_or(false)
    }

    pub fn end_frame(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }
}
