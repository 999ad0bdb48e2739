use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use behngine_core::time::{FpsCounter, Time};
use behngine_input::{InputMap, InputState, PhysicalInputId};
use serde::Deserialize;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window, WindowId},
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub cursor_locked: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "3D Rendering Engine".to_string(),
            width: 1024,
            height: 768,
            resizable: false,
            cursor_locked: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Everything the application sees during one frame.
pub struct FrameContext<'a> {
    pub window: &'a Window,
    pub input: &'a InputState,
    pub time: &'a Time,
    pub now: Instant,
}

/// The application driven by [`run_app`].
pub trait EngineApp {
    /// Called once, right after the window exists.
    fn init(&mut self, window: Arc<Window>) -> Result<()>;

    fn update(&mut self, ctx: &mut FrameContext) -> AppControl;

    fn render(&mut self) -> Result<()>;

    fn resize(&mut self, width: u32, height: u32);
}

// The state machine that holds the app while waiting for the OS.
struct Runner<A: EngineApp> {
    settings: WindowSettings,
    input_map: InputMap,
    app: A,

    window: Option<Arc<Window>>,
    input: InputState,
    time: Time,
    fps: FpsCounter,
    // Once raw device motion arrives, cursor positions no longer feed the delta.
    raw_motion: bool,

    error: Option<anyhow::Error>,
}

impl<A: EngineApp> Runner<A> {
    fn new(settings: WindowSettings, input_map: InputMap, app: A) -> Self {
        Self {
            settings,
            input_map,
            app,
            window: None,
            input: InputState::default(),
            time: Time::default(),
            fps: FpsCounter::default(),
            raw_motion: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<Arc<Window>> {
        let attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(LogicalSize::new(self.settings.width, self.settings.height))
            .with_resizable(self.settings.resizable);

        let window = event_loop
            .create_window(attributes)
            .context("failed to create window")?;
        Ok(Arc::new(window))
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // 1. Tick the clock
        let now = Instant::now();
        self.time.update_at(now);

        // 2. Resolve actions, then let the app react
        self.input_map.apply(&mut self.input);
        let control = {
            let mut ctx = FrameContext {
                window: &window,
                input: &self.input,
                time: &self.time,
                now,
            };
            self.app.update(&mut ctx)
        };

        if control == AppControl::Exit {
            log::info!("Exit requested; stopping");
            event_loop.exit();
            return;
        }

        // 3. Draw
        if let Err(error) = self.app.render() {
            self.fail(event_loop, error);
            return;
        }

        if let Some(fps) = self.fps.tick(now) {
            log::info!("FPS: {fps:.3}");
        }

        self.input.end_frame();
        window.request_redraw();
    }
}

impl<A: EngineApp> ApplicationHandler for Runner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(error) => return self.fail(event_loop, error),
        };

        apply_cursor_lock(&window, self.settings.cursor_locked);

        if let Err(error) = self.app.init(window.clone()) {
            return self.fail(event_loop, error.context("application init failed"));
        }

        // Don't count startup time as the first frame's delta.
        self.time = Time::default();
        window.request_redraw();
        self.window = Some(window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.raw_motion = true;
            self.input.accumulate_mouse_motion(dx as f32, dy as f32);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => self.input.press(PhysicalInputId::key(code)),
                ElementState::Released => self.input.release(PhysicalInputId::key(code)),
            },
            WindowEvent::MouseInput { state, button, .. } => {
                let id = PhysicalInputId::mouse(button.into());
                match state {
                    ElementState::Pressed => self.input.press(id),
                    ElementState::Released => self.input.release(id),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                if self.raw_motion {
                    self.input.mouse_position = Some((x, y));
                } else {
                    self.input.set_cursor_position(x, y);
                }
            }
            WindowEvent::CursorLeft { .. } => self.input.reset_cursor(),
            WindowEvent::Resized(size) => self.app.resize(size.width, size.height),
            WindowEvent::CloseRequested => {
                log::info!("The close button was pressed; stopping");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => (),
        }
    }
}

/// Runs the event loop until the app exits or the window is closed. Errors
/// raised inside callbacks stop the loop and are returned here.
pub fn run_app<A: EngineApp>(settings: WindowSettings, input_map: InputMap, app: A) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

    // Poll keeps the loop spinning even without OS events.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = Runner::new(settings, input_map, app);
    event_loop
        .run_app(&mut runner)
        .context("winit event loop terminated with error")?;

    match runner.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Locks (falling back to confining) and hides the cursor, or releases it.
pub fn apply_cursor_lock(window: &Window, locked: bool) {
    if locked {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(error) = grabbed {
            log::warn!("Could not grab the cursor: {error}");
        }
        window.set_cursor_visible(false);
        log::info!("Cursor locked");
    } else {
        if let Err(error) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Could not release the cursor: {error}");
        }
        window.set_cursor_visible(true);
        log::info!("Cursor released");
    }
}
