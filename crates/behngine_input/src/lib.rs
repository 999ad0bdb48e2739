pub mod actions;
pub mod cursor;
pub mod logical;
pub mod physical;

pub use cursor::CursorLock;
pub use logical::{ActionId, ButtonPhase, InputMap};
pub use physical::{InputState, KeyCode, MouseButtonId, PhysicalInputId};
