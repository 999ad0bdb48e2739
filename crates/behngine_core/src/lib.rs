pub use glam;
pub use tokio;

pub mod camera;
pub mod tasks;
pub mod time;
pub mod transform;

pub use tasks::IoTaskPool;
