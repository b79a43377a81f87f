use glfw::{
    fail_on_errors, Action, ClientApiHint, Glfw, GlfwReceiver, Key, PWindow, WindowEvent,
    WindowHint, WindowMode,
};
use tracing::{debug, info};

use crate::error::VulkanError;

const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_HEIGHT: u32 = 600;

/// Owns the windowing system handle and the window itself. Created
/// before the graphics engine and dropped after it, since the surface
/// borrows the window's native handle.
pub struct WindowManager {
    glfw: Glfw,
    window: PWindow,
    events: GlfwReceiver<(f64, WindowEvent)>,
}

impl WindowManager {
    pub fn new(title: &str) -> Result<Self, VulkanError> {
        let mut glfw = glfw::init(fail_on_errors!())
            .map_err(|e| VulkanError::Window(format!("failed to initialize GLFW: {e}")))?;

        // rendering goes through Vulkan, not an OpenGL context
        glfw.window_hint(WindowHint::ClientApi(ClientApiHint::NoApi));

        let (mut window, events) = glfw
            .create_window(DEFAULT_WIDTH, DEFAULT_HEIGHT, title, WindowMode::Windowed)
            .ok_or_else(|| VulkanError::Window("failed to create window".to_owned()))?;
        window.set_key_polling(true);
        debug!("Created {DEFAULT_WIDTH}x{DEFAULT_HEIGHT} window");

        Ok(Self {
            glfw,
            window,
            events,
        })
    }

    pub fn glfw(&self) -> &Glfw {
        &self.glfw
    }

    pub fn window(&self) -> &PWindow {
        &self.window
    }

    /// Blocks until the window closes. Escape requests close.
    pub fn run_event_loop(&mut self) {
        info!("Starting event loop");
        while !self.window.should_close() {
            self.glfw.wait_events();
            for (_, event) in glfw::flush_messages(&self.events) {
                debug!("Window event: {event:?}");
                if let WindowEvent::Key(Key::Escape, _, Action::Press, _) = event {
                    self.window.set_should_close(true);
                }
            }
        }
        info!("Event loop finished");
    }
}
