use std::{mem::MaybeUninit, ops::Deref, ptr, rc::Rc};

use ash::{
    extensions::khr::Surface as SurfaceFn,
    vk::{PhysicalDevice, PresentModeKHR, SurfaceCapabilitiesKHR, SurfaceFormatKHR, SurfaceKHR},
};
use glfw::PWindow;
use tracing::trace;

use crate::{error::VulkanError, queries, Instance};

/// Binds a GLFW window to a presentable Vulkan surface. Constructed
/// after the [`Instance`] and destroyed before it; the held `Rc`
/// enforces that ordering.
pub struct Surface {
    surface_fn: SurfaceFn,
    surface_ptr: SurfaceKHR,
    instance: Rc<Instance>,
}

impl Surface {
    pub fn new(instance: &Rc<Instance>, window: &PWindow) -> Result<Self, VulkanError> {
        let mut surface_ptr: MaybeUninit<SurfaceKHR> = MaybeUninit::uninit();
        window
            .create_window_surface(instance.handle(), ptr::null(), surface_ptr.as_mut_ptr())
            .result()
            .map_err(|res| VulkanError::driver("Failed to create window surface", res))?;
        let surface_ptr = unsafe { surface_ptr.assume_init() };
        let surface_fn = SurfaceFn::new(instance.entry(), instance);
        trace!("Surface created");
        Ok(Self {
            surface_fn,
            surface_ptr,
            instance: Rc::clone(instance),
        })
    }

    pub fn get_capabilities(
        &self,
        device: &PhysicalDevice,
    ) -> Result<SurfaceCapabilitiesKHR, VulkanError> {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_capabilities(*device, self.surface_ptr)
        }
        .map_err(|res| {
            VulkanError::driver(
                format!(
                    "Failed to query surface capabilities of '{}'",
                    queries::device_name(&self.instance, *device)
                ),
                res,
            )
        })
    }

    pub fn get_surface_formats(
        &self,
        device: &PhysicalDevice,
    ) -> Result<Vec<SurfaceFormatKHR>, VulkanError> {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_formats(*device, self.surface_ptr)
        }
        .map_err(|res| {
            VulkanError::driver(
                format!(
                    "Failed to query surface formats for '{}'",
                    queries::device_name(&self.instance, *device)
                ),
                res,
            )
        })
    }

    pub fn get_presentation_modes(
        &self,
        device: &PhysicalDevice,
    ) -> Result<Vec<PresentModeKHR>, VulkanError> {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_present_modes(*device, self.surface_ptr)
        }
        .map_err(|res| {
            VulkanError::driver(
                format!(
                    "Failed to query present modes for '{}'",
                    queries::device_name(&self.instance, *device)
                ),
                res,
            )
        })
    }

    /// Whether queue family `index` on `device` can present to this
    /// surface. Tested index-by-index during queue-family resolution.
    pub fn supports_presentation(
        &self,
        device: &PhysicalDevice,
        index: u32,
    ) -> Result<bool, VulkanError> {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_support(*device, index, self.surface_ptr)
        }
        .map_err(|res| {
            VulkanError::driver(
                format!(
                    "Failed to query presentation support for '{}'",
                    queries::device_name(&self.instance, *device)
                ),
                res,
            )
        })
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe { self.surface_fn.destroy_surface(self.surface_ptr, None) }
        trace!("Surface destroyed");
    }
}

impl Deref for Surface {
    type Target = SurfaceKHR;

    fn deref(&self) -> &Self::Target {
        &self.surface_ptr
    }
}
