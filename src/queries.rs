//! Read-only capability queries against the Vulkan driver.
//!
//! Every function takes already-valid handles and either returns the
//! requested list (possibly empty) or a [`VulkanError`] naming the call
//! that failed. Nothing here is cached; driver-reported state can change
//! between calls (e.g. after a surface resize), so callers re-query.

use std::ffi::CStr;

use ash::{vk, Entry};

use crate::error::VulkanError;

pub fn available_instance_extensions(
    entry: &Entry,
) -> Result<Vec<vk::ExtensionProperties>, VulkanError> {
    entry
        .enumerate_instance_extension_properties(None)
        .map_err(|res| VulkanError::driver("Failed to query available instance extensions", res))
}

pub fn available_layers(entry: &Entry) -> Result<Vec<vk::LayerProperties>, VulkanError> {
    entry
        .enumerate_instance_layer_properties()
        .map_err(|res| VulkanError::driver("Failed to query available validation layers", res))
}

pub fn available_device_extensions(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
) -> Result<Vec<vk::ExtensionProperties>, VulkanError> {
    unsafe { instance.enumerate_device_extension_properties(device) }.map_err(|res| {
        VulkanError::driver(
            format!(
                "Failed to query supported extensions for '{}'",
                device_name(instance, device)
            ),
            res,
        )
    })
}

/// Queue family enumeration never fails; an invalid device yields an
/// empty list rather than an error.
pub fn queue_family_properties(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
) -> Vec<vk::QueueFamilyProperties> {
    unsafe { instance.get_physical_device_queue_family_properties(device) }
}

pub fn physical_devices(
    instance: &ash::Instance,
) -> Result<Vec<vk::PhysicalDevice>, VulkanError> {
    unsafe { instance.enumerate_physical_devices() }
        .map_err(|res| VulkanError::driver("Failed to query physical devices", res))
}

pub fn device_name(instance: &ash::Instance, device: vk::PhysicalDevice) -> String {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    cstr_to_string(properties.device_name.as_ptr())
}

/// Converts a driver-reported, nul-terminated name into an owned string.
///
/// # Safety contract
/// `ptr` must point at a nul-terminated buffer, which holds for every
/// fixed-size name array Vulkan reports.
pub(crate) fn cstr_to_string(ptr: *const std::os::raw::c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}
