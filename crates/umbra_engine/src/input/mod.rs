//! Input management system
//!
//! Window events are folded into an [`InputManager`] as they arrive. Once per frame,
//! [`InputManager::apply_to_camera`] turns held movement keys, accumulated cursor motion
//! and scroll into camera updates.

use std::collections::HashSet;

use crate::render::primitives::Camera;

/// Keys the fly camera responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Forward
    W,
    /// Strafe left
    A,
    /// Backward
    S,
    /// Strafe right
    D,
    /// Rise
    Space,
    /// Sink
    LeftControl,
    /// Quit
    Escape,
}

impl KeyCode {
    /// Map a GLFW key, ignoring keys with no binding
    pub fn from_glfw(key: glfw::Key) -> Option<Self> {
        match key {
            glfw::Key::W => Some(KeyCode::W),
            glfw::Key::A => Some(KeyCode::A),
            glfw::Key::S => Some(KeyCode::S),
            glfw::Key::D => Some(KeyCode::D),
            glfw::Key::Space => Some(KeyCode::Space),
            glfw::Key::LeftControl => Some(KeyCode::LeftControl),
            glfw::Key::Escape => Some(KeyCode::Escape),
            _ => None,
        }
    }
}

/// What a window event means to the application loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Nothing beyond updating input state
    None,
    /// Escape pressed or the window was closed
    Quit,
    /// The drawable was resized to this many pixels
    Resize(u32, u32),
}

/// Held keys plus per-frame cursor and scroll accumulators
#[derive(Debug, Default)]
pub struct InputManager {
    held: HashSet<KeyCode>,
    last_cursor: Option<(f64, f64)>,
    look_delta: (f32, f32),
    scroll: f32,
}

impl InputManager {
    /// Create a new input manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one window event into the input state
    pub fn handle_window_event(&mut self, event: &glfw::WindowEvent) -> InputAction {
        match *event {
            glfw::WindowEvent::Key(key, _, action, _) => {
                let Some(code) = KeyCode::from_glfw(key) else {
                    return InputAction::None;
                };
                match action {
                    glfw::Action::Press | glfw::Action::Repeat => self.handle_key_input(code, true),
                    glfw::Action::Release => self.handle_key_input(code, false),
                }
                if code == KeyCode::Escape && action == glfw::Action::Press {
                    InputAction::Quit
                } else {
                    InputAction::None
                }
            }
            glfw::WindowEvent::CursorPos(x, y) => {
                self.handle_mouse_move(x, y);
                InputAction::None
            }
            glfw::WindowEvent::Scroll(_, dy) => {
                self.handle_scroll(dy);
                InputAction::None
            }
            glfw::WindowEvent::FramebufferSize(width, height) => {
                InputAction::Resize(width.max(0) as u32, height.max(0) as u32)
            }
            glfw::WindowEvent::Close => InputAction::Quit,
            _ => InputAction::None,
        }
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    /// Handle mouse movement
    ///
    /// The first position only establishes the baseline so capturing the cursor does not
    /// produce a jump.
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.last_cursor {
            self.look_delta.0 += (x - last_x) as f32;
            self.look_delta.1 += (y - last_y) as f32;
        }
        self.last_cursor = Some((x, y));
    }

    /// Handle a vertical scroll step
    pub fn handle_scroll(&mut self, delta_y: f64) {
        self.scroll += delta_y as f32;
    }

    /// Whether `key` is held
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Advance `camera` by one frame of input and reset the accumulators
    pub fn apply_to_camera(&mut self, camera: &mut Camera, elapsed_seconds: f32) {
        let (dx, dy) = std::mem::take(&mut self.look_delta);
        if dx != 0.0 || dy != 0.0 {
            camera.on_look(dx, dy);
        }
        let scroll = std::mem::take(&mut self.scroll);
        if scroll != 0.0 {
            camera.on_scroll(scroll);
        }

        camera.update(elapsed_seconds);
        for key in &self.held {
            match key {
                KeyCode::W => camera.move_forward(),
                KeyCode::S => camera.move_backward(),
                KeyCode::A => camera.move_left(),
                KeyCode::D => camera.move_right(),
                KeyCode::Space => camera.move_up(),
                KeyCode::LeftControl => camera.move_down(),
                KeyCode::Escape => {}
            }
        }
    }
}
