use anyhow::Result;
use canopy::{init_logging, GraphicsEngine, WindowManager};

fn main() -> Result<()> {
    init_logging()?;

    let mut window_manager = WindowManager::new("Canopy")?;
    let engine = GraphicsEngine::new(window_manager.glfw(), window_manager.window())?;

    window_manager.run_event_loop();

    // engine tears down before the window it renders into
    drop(engine);
    Ok(())
}
