use std::collections::HashSet;

use ash::vk::{PhysicalDevice, PhysicalDeviceProperties, PhysicalDeviceType};
use tracing::debug;

use crate::{
    error::VulkanError, logical_device::required_device_extensions, queries,
    queue_families::find_queue_families, swapchain::query_swap_chain_support, Instance, Surface,
};

/// Flat score bonus for discrete GPUs. Large enough that any discrete
/// device outranks any integrated one regardless of image limits.
const DISCRETE_GPU_BONUS: u32 = 10_000;

/// Strategy pattern for picking a physical device. The engine ships
/// [`DefaultSelectionStrategy`]; callers (and tests) may substitute
/// their own policy, e.g. an explicit pick by name or index.
pub trait SelectionStrategy {
    fn select(
        &self,
        instance: &Instance,
        surface: &Surface,
    ) -> Result<PhysicalDevice, VulkanError>;
}

/// Filters the enumerated devices down to suitable candidates, scores
/// them and picks the maximum (first maximum on ties, in enumeration
/// order).
pub struct DefaultSelectionStrategy;

impl SelectionStrategy for DefaultSelectionStrategy {
    fn select(
        &self,
        instance: &Instance,
        surface: &Surface,
    ) -> Result<PhysicalDevice, VulkanError> {
        let devices = queries::physical_devices(instance)?;
        if devices.is_empty() {
            return Err(VulkanError::NoDevicesConnected);
        }
        log_available_devices(instance, &devices);

        let mut best: Option<(PhysicalDevice, u32)> = None;
        for device in devices {
            if !is_device_suitable(instance, surface, &device)? {
                continue;
            }
            let properties = unsafe { instance.get_physical_device_properties(device) };
            let score = score_device(&properties);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((device, score));
            }
        }

        match best {
            Some((device, score)) => {
                debug!(
                    "Selected physical device '{}' with score {}",
                    queries::device_name(instance, device),
                    score
                );
                Ok(device)
            }
            None => Err(VulkanError::NoSuitableDevice),
        }
    }
}

/// A device is suitable when it has a graphics queue family, a family
/// that can present to the surface, every required device extension,
/// and at least one surface format and present mode.
pub(crate) fn is_device_suitable(
    instance: &Instance,
    surface: &Surface,
    device: &PhysicalDevice,
) -> Result<bool, VulkanError> {
    let indices = find_queue_families(instance, device, surface)?;
    if !indices.is_complete() {
        return Ok(false);
    }

    if !supports_required_extensions(instance, device)? {
        return Ok(false);
    }

    let support = query_swap_chain_support(surface, device)?;
    Ok(!support.formats.is_empty() && !support.present_modes.is_empty())
}

fn supports_required_extensions(
    instance: &Instance,
    device: &PhysicalDevice,
) -> Result<bool, VulkanError> {
    let available = queries::available_device_extensions(instance, *device)?;
    let available_names = available
        .iter()
        .map(|properties| queries::cstr_to_string(properties.extension_name.as_ptr()))
        .collect::<HashSet<_>>();

    Ok(required_device_extensions()
        .iter()
        .all(|extension| available_names.contains(&extension.to_string_lossy().into_owned())))
}

/// Score heuristic: heavy flat bonus for discrete GPUs, maximum 2D
/// image dimension as the tie breaker.
pub(crate) fn score_device(properties: &PhysicalDeviceProperties) -> u32 {
    let mut score = properties.limits.max_image_dimension2_d;
    if properties.device_type == PhysicalDeviceType::DISCRETE_GPU {
        score += DISCRETE_GPU_BONUS;
    }
    score
}

pub(crate) fn device_type_name(device_type: PhysicalDeviceType) -> &'static str {
    match device_type {
        PhysicalDeviceType::OTHER => "other",
        PhysicalDeviceType::INTEGRATED_GPU => "integrated",
        PhysicalDeviceType::DISCRETE_GPU => "discrete",
        PhysicalDeviceType::VIRTUAL_GPU => "virtual",
        PhysicalDeviceType::CPU => "CPU",
        _ => "unknown",
    }
}

fn log_available_devices(instance: &Instance, devices: &[PhysicalDevice]) {
    debug!("Available physical devices:");
    for device in devices {
        let properties = unsafe { instance.get_physical_device_properties(*device) };
        debug!(
            "+ {} ({})",
            queries::cstr_to_string(properties.device_name.as_ptr()),
            device_type_name(properties.device_type)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::PhysicalDeviceLimits;

    fn properties(device_type: PhysicalDeviceType, max_dim: u32) -> PhysicalDeviceProperties {
        PhysicalDeviceProperties {
            device_type,
            limits: PhysicalDeviceLimits {
                max_image_dimension2_d: max_dim,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn discrete_gpu_scores_bonus_plus_dimension() {
        let score = score_device(&properties(PhysicalDeviceType::DISCRETE_GPU, 4096));
        assert_eq!(score, 10_000 + 4096);
    }

    #[test]
    fn discrete_always_outranks_integrated() {
        // an integrated GPU with a huge image limit still loses
        let integrated = score_device(&properties(PhysicalDeviceType::INTEGRATED_GPU, 9999));
        let discrete = score_device(&properties(PhysicalDeviceType::DISCRETE_GPU, 16));
        assert!(discrete > integrated);
    }

    #[test]
    fn image_dimension_breaks_ties() {
        let small = score_device(&properties(PhysicalDeviceType::DISCRETE_GPU, 2048));
        let large = score_device(&properties(PhysicalDeviceType::DISCRETE_GPU, 8192));
        assert!(large > small);
    }

    #[test]
    fn device_types_have_names() {
        assert_eq!(device_type_name(PhysicalDeviceType::DISCRETE_GPU), "discrete");
        assert_eq!(
            device_type_name(PhysicalDeviceType::INTEGRATED_GPU),
            "integrated"
        );
        assert_eq!(device_type_name(PhysicalDeviceType::CPU), "CPU");
    }
}
