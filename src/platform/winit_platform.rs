//! Native window and keyboard through winit
//!
//! The event loop is pumped once per frame instead of owning the thread,
//! so the frame driver keeps control of the loop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use super::{Key, Platform};
use crate::error::BootstrapError;
use crate::settings::WindowSettings;

/// How long to wait for the window to appear at startup
const WINDOW_TIMEOUT: Duration = Duration::from_secs(5);

fn key_code(key: Key) -> KeyCode {
    match key {
        Key::Escape => KeyCode::Escape,
        Key::R => KeyCode::KeyR,
        Key::A => KeyCode::KeyA,
        Key::D => KeyCode::KeyD,
        Key::Left => KeyCode::ArrowLeft,
        Key::Right => KeyCode::ArrowRight,
    }
}

/// Event handler state
struct WindowState {
    settings: WindowSettings,
    window: Option<Arc<Window>>,
    error: Option<String>,
    pressed: HashSet<KeyCode>,
    close_requested: bool,
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height))
            .with_resizable(self.settings.resizable);

        match event_loop.create_window(attrs) {
            Ok(window) => {
                log::info!(
                    "Window created: {}x{}",
                    self.settings.width,
                    self.settings.height
                );
                self.window = Some(Arc::new(window));
            }
            Err(e) => {
                self.error = Some(e.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Focused(false) => self.pressed.clear(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    self.pressed.insert(code);
                }
                ElementState::Released => {
                    self.pressed.remove(&code);
                }
            },
            _ => {}
        }
    }
}

pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    state: WindowState,
    start: Instant,
}

impl WinitPlatform {
    /// Open the window and wait until it exists
    pub fn new(settings: &WindowSettings) -> Result<Self, BootstrapError> {
        let mut event_loop = EventLoop::new().map_err(|e| BootstrapError::Window(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = WindowState {
            settings: settings.clone(),
            window: None,
            error: None,
            pressed: HashSet::new(),
            close_requested: false,
        };

        let deadline = Instant::now() + WINDOW_TIMEOUT;
        while state.window.is_none() && state.error.is_none() {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut state)
            {
                return Err(BootstrapError::Window(format!(
                    "event loop exited during startup (code {code})"
                )));
            }
            if Instant::now() > deadline {
                return Err(BootstrapError::Window("timed out waiting for the window".into()));
            }
        }
        if let Some(error) = state.error.take() {
            return Err(BootstrapError::Window(error));
        }

        Ok(Self {
            event_loop,
            state,
            start: Instant::now(),
        })
    }

    /// The window, for creating a surface
    pub fn window(&self) -> Option<Arc<Window>> {
        self.state.window.clone()
    }

    /// Drawable size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        self.state
            .window
            .as_ref()
            .map(|w| {
                let size = w.inner_size();
                (size.width, size.height)
            })
            .unwrap_or((self.state.settings.width, self.state.settings.height))
    }
}

impl Platform for WinitPlatform {
    fn poll_events(&mut self) {
        if let PumpStatus::Exit(_) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state)
        {
            self.state.close_requested = true;
        }
    }

    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn set_should_close(&mut self, close: bool) {
        self.state.close_requested = close;
    }

    fn key_down(&self, key: Key) -> bool {
        self.state.pressed.contains(&key_code(key))
    }

    fn time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
