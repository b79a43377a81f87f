use std::{ffi::CStr, ops::Deref, rc::Rc};

use ash::{
    extensions::khr::Swapchain,
    vk::{DeviceCreateInfo, DeviceQueueCreateInfo, PhysicalDevice, PhysicalDeviceFeatures, Queue},
    Device,
};
use tracing::debug;

use crate::{
    error::VulkanError,
    queue_families::{find_queue_families, QueueFamilyIndices},
    selection::{self, SelectionStrategy},
    Instance, Surface,
};

const DEFAULT_QUEUE_PRIORITY: f32 = 1.0;

/// Device extensions every logical device is created with. Swap-chain
/// support is the minimum needed to present.
pub(crate) fn required_device_extensions() -> Vec<&'static CStr> {
    vec![Swapchain::name()]
}

/// Handles to the queues created alongside the logical device, one per
/// resolved family at queue index 0.
#[derive(Clone, Copy)]
pub struct QueueHandles {
    pub graphics: Queue,
    pub presentation: Queue,
}

/// Owns the logical device and its queue handles. Holds the [`Instance`]
/// so the device is always destroyed first.
pub struct LogicalDevice {
    device: Device,
    queues: QueueHandles,
    physical_device: PhysicalDevice,
    queue_family_indices: QueueFamilyIndices,
    _instance: Rc<Instance>,
}

impl LogicalDevice {
    /// Lets `strategy` pick the physical device, then opens it.
    pub fn new(
        instance: &Rc<Instance>,
        surface: &Surface,
        strategy: &dyn SelectionStrategy,
    ) -> Result<Rc<Self>, VulkanError> {
        let physical_device = strategy.select(instance, surface)?;
        Self::from_physical_device(instance, surface, physical_device)
    }

    /// Opens an explicitly chosen physical device, bypassing the
    /// selection strategy. Suitability is re-checked in debug builds
    /// only, as a guard against caller error.
    pub fn with_physical_device(
        instance: &Rc<Instance>,
        surface: &Surface,
        physical_device: PhysicalDevice,
    ) -> Result<Rc<Self>, VulkanError> {
        if cfg!(debug_assertions)
            && !selection::is_device_suitable(instance, surface, &physical_device)?
        {
            return Err(VulkanError::Internal(
                "explicitly provided physical device is not suitable".to_owned(),
            ));
        }
        Self::from_physical_device(instance, surface, physical_device)
    }

    fn from_physical_device(
        instance: &Rc<Instance>,
        surface: &Surface,
        physical_device: PhysicalDevice,
    ) -> Result<Rc<Self>, VulkanError> {
        let queue_family_indices = find_queue_families(instance, &physical_device, surface)?;
        if !queue_family_indices.is_complete() {
            // the selection strategy must have excluded this device
            return Err(VulkanError::Internal(
                "selected device is missing a required queue family".to_owned(),
            ));
        }
        debug!("Queue family indices: {:?}", queue_family_indices);

        let queue_priorities = [DEFAULT_QUEUE_PRIORITY];
        let queue_create_infos = queue_family_indices
            .unique()
            .into_iter()
            .map(|family_index| {
                DeviceQueueCreateInfo::builder()
                    .queue_family_index(family_index)
                    .queue_priorities(&queue_priorities)
                    .build()
            })
            .collect::<Vec<_>>();

        let extension_ptrs = required_device_extensions()
            .iter()
            .map(|extension| extension.as_ptr())
            .collect::<Vec<_>>();
        let layer_ptrs = instance
            .enabled_layers()
            .iter()
            .map(|layer| layer.as_ptr())
            .collect::<Vec<_>>();
        let features = PhysicalDeviceFeatures::default();

        let device_create_info = DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs)
            .enabled_features(&features);

        let device =
            unsafe { instance.create_device(physical_device, &device_create_info, None) }
                .map_err(|res| VulkanError::driver("Failed to create logical device", res))?;

        let queues = QueueHandles {
            graphics: unsafe { device.get_device_queue(queue_family_indices.graphics, 0) },
            presentation: unsafe { device.get_device_queue(queue_family_indices.presentation, 0) },
        };

        Ok(Rc::new(Self {
            device,
            queues,
            physical_device,
            queue_family_indices,
            _instance: Rc::clone(instance),
        }))
    }

    pub fn queues(&self) -> &QueueHandles {
        &self.queues
    }

    pub fn physical_device(&self) -> &PhysicalDevice {
        &self.physical_device
    }

    pub fn queue_family_indices(&self) -> &QueueFamilyIndices {
        &self.queue_family_indices
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        debug!("Dropping LogicalDevice");
        unsafe { self.device.destroy_device(None) }
    }
}

impl Deref for LogicalDevice {
    type Target = Device;

    fn deref(&self) -> &Self::Target {
        &self.device
    }
}
