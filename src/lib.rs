mod debug_messenger;
mod engine;
pub mod error;
mod instance;
mod logging;
mod logical_device;
pub mod pipeline;
mod queries;
pub mod queue_families;
mod rect;
pub mod selection;
mod shader_module;
mod surface;
pub mod swapchain;
pub mod version;
mod window;

pub use engine::GraphicsEngine;
pub use error::VulkanError;
pub use instance::Instance;
pub use logging::init_logging;
pub use logical_device::{LogicalDevice, QueueHandles};
pub use rect::Rect;
pub use surface::Surface;
pub use swapchain::SwapChain;
pub use window::WindowManager;

/// Whether validation layers and the debug messenger are wired in.
/// Controlled by the `enable_validations` feature so release builds
/// carry no validation overhead.
#[cfg(feature = "enable_validations")]
pub const ENABLE_VALIDATIONS: bool = true;
#[cfg(not(feature = "enable_validations"))]
pub const ENABLE_VALIDATIONS: bool = false;
