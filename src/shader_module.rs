use std::{ops::Deref, rc::Rc};

use ash::vk::{ShaderModule, ShaderModuleCreateInfo};

use crate::{error::VulkanError, LogicalDevice};

/// Scoped ownership of a shader module: the handle is released on every
/// exit path, including when a later pipeline-construction step fails.
pub struct ShaderModuleGuard {
    shader_module: ShaderModule,
    logical_device: Rc<LogicalDevice>,
}

impl ShaderModuleGuard {
    /// Wraps already-loaded SPIR-V bytecode into a shader module. The
    /// caller is responsible for having validated the bytecode length.
    pub fn try_new(
        code: &[u8],
        logical_device: &Rc<LogicalDevice>,
    ) -> Result<Self, VulkanError> {
        let words = code
            .chunks_exact(4)
            .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect::<Vec<_>>();
        let create_info = ShaderModuleCreateInfo::builder().code(&words);
        let shader_module = unsafe { logical_device.create_shader_module(&create_info, None) }
            .map_err(|res| VulkanError::driver("Failed to create shader module", res))?;
        Ok(Self {
            shader_module,
            logical_device: Rc::clone(logical_device),
        })
    }
}

impl Drop for ShaderModuleGuard {
    fn drop(&mut self) {
        unsafe {
            self.logical_device
                .destroy_shader_module(self.shader_module, None)
        }
    }
}

impl Deref for ShaderModuleGuard {
    type Target = ShaderModule;

    fn deref(&self) -> &Self::Target {
        &self.shader_module
    }
}
