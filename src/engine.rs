use std::{path::PathBuf, rc::Rc};

use ash::Entry;
use glfw::{Glfw, PWindow};
use tracing::{debug, info};

use crate::{
    debug_messenger::DebugMessenger,
    error::VulkanError,
    pipeline::{PipelineSettings, RenderPipeline, ShaderModulePaths},
    selection::DefaultSelectionStrategy,
    version::Version,
    Instance, LogicalDevice, Rect, Surface, SwapChain,
};

const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Top level object tying the Vulkan initialization chain together.
/// Field order is teardown order: the pipeline goes first and the
/// instance last, so every resource is destroyed before what it was
/// created from.
pub struct GraphicsEngine {
    pipeline: RenderPipeline,
    swapchain: SwapChain,
    logical_device: Rc<LogicalDevice>,
    _debug_messenger: Option<DebugMessenger>,
    surface: Rc<Surface>,
    instance: Rc<Instance>,
}

impl GraphicsEngine {
    pub fn new(glfw: &Glfw, window: &PWindow) -> Result<Self, VulkanError> {
        let required_extensions = glfw.get_required_instance_extensions().ok_or_else(|| {
            VulkanError::Window(
                "windowing system reports no Vulkan support".to_owned(),
            )
        })?;
        debug!("Window system requires extensions: {required_extensions:?}");

        let entry = Entry::linked();
        let app_version = env!("CARGO_PKG_VERSION")
            .parse::<Version>()
            .map_err(|e| VulkanError::Internal(format!("bad crate version: {e}")))?;
        let instance = Rc::new(Instance::new(
            entry,
            APP_NAME,
            &app_version,
            required_extensions,
        )?);

        // absent debug utils downgrades to no messenger rather than failing
        let debug_messenger = if instance.debug_utils_enabled() {
            Some(DebugMessenger::new(&instance)?)
        } else {
            None
        };

        let surface = Rc::new(Surface::new(&instance, window)?);
        let logical_device = LogicalDevice::new(&instance, &surface, &DefaultSelectionStrategy)?;

        let mut swapchain = SwapChain::new(&instance, &logical_device, &surface, window)?;
        swapchain.create_image_views()?;

        // glslc compiles GLSL with entry point `main`, hence the name
        let pipeline = RenderPipeline::new(
            "main",
            &ShaderModulePaths {
                vertex: PathBuf::from("target/shaders/vert.spv"),
                fragment: PathBuf::from("target/shaders/frag.spv"),
            },
            &PipelineSettings {
                viewport: Rect::from_extent(*swapchain.extent()),
                ..Default::default()
            },
            &logical_device,
            swapchain.format(),
        )?;

        info!("Graphics engine initialized");
        Ok(Self {
            pipeline,
            swapchain,
            logical_device,
            _debug_messenger: debug_messenger,
            surface,
            instance,
        })
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn logical_device(&self) -> &LogicalDevice {
        &self.logical_device
    }

    pub fn swapchain(&self) -> &SwapChain {
        &self.swapchain
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }
}

impl Drop for GraphicsEngine {
    fn drop(&mut self) {
        debug!("Dropping GraphicsEngine");
    }
}
