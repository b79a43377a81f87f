use ash::vk::{PhysicalDevice, QueueFamilyProperties, QueueFlags};

use crate::{error::VulkanError, queries, Instance, Surface};

/// Reserved sentinel for an absent queue family. Deliberately out of
/// range so that accidental use without validation fails driver calls
/// loudly instead of silently picking family 0.
pub const INVALID_QUEUE_FAMILY_INDEX: u32 = u32::MAX;

/// Queue family indices resolved once per device from a physical
/// device + surface pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// family capable of running graphics commands
    pub graphics: u32,
    /// family capable of presenting to the surface
    pub presentation: u32,
}

impl Default for QueueFamilyIndices {
    fn default() -> Self {
        Self {
            graphics: INVALID_QUEUE_FAMILY_INDEX,
            presentation: INVALID_QUEUE_FAMILY_INDEX,
        }
    }
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics != INVALID_QUEUE_FAMILY_INDEX
            && self.presentation != INVALID_QUEUE_FAMILY_INDEX
    }

    /// The distinct family indices, graphics first. Many GPUs resolve
    /// both roles to the same family, in which case this has length 1.
    pub fn unique(&self) -> Vec<u32> {
        if self.graphics == self.presentation {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.presentation]
        }
    }
}

/// Resolves the queue family indices for `device` against `surface`.
/// Either index may come back as the invalid sentinel; completeness is
/// the caller's decision to enforce.
pub fn find_queue_families(
    instance: &Instance,
    device: &PhysicalDevice,
    surface: &Surface,
) -> Result<QueueFamilyIndices, VulkanError> {
    let queue_family_properties = queries::queue_family_properties(instance, *device);

    let graphics = find_graphics_family(&queue_family_properties);

    let mut presentation = INVALID_QUEUE_FAMILY_INDEX;
    for index in 0..queue_family_properties.len() as u32 {
        if surface.supports_presentation(device, index)? {
            presentation = index;
            break;
        }
    }

    Ok(QueueFamilyIndices {
        graphics,
        presentation,
    })
}

pub(crate) fn find_graphics_family(properties: &[QueueFamilyProperties]) -> u32 {
    properties
        .iter()
        .position(|props| props.queue_flags.contains(QueueFlags::GRAPHICS))
        .map_or(INVALID_QUEUE_FAMILY_INDEX, |index| index as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: QueueFlags) -> QueueFamilyProperties {
        QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn default_indices_are_invalid() {
        let indices = QueueFamilyIndices::default();
        assert_eq!(indices.graphics, INVALID_QUEUE_FAMILY_INDEX);
        assert_eq!(indices.presentation, INVALID_QUEUE_FAMILY_INDEX);
        assert!(!indices.is_complete());
    }

    #[test]
    fn first_graphics_family_wins() {
        let families = [
            family(QueueFlags::TRANSFER),
            family(QueueFlags::GRAPHICS | QueueFlags::COMPUTE),
            family(QueueFlags::GRAPHICS),
        ];
        assert_eq!(find_graphics_family(&families), 1);
    }

    #[test]
    fn no_graphics_family_yields_sentinel() {
        let families = [family(QueueFlags::TRANSFER), family(QueueFlags::COMPUTE)];
        assert_eq!(find_graphics_family(&families), INVALID_QUEUE_FAMILY_INDEX);
    }

    #[test]
    fn unique_deduplicates_shared_family() {
        let shared = QueueFamilyIndices {
            graphics: 0,
            presentation: 0,
        };
        assert_eq!(shared.unique(), vec![0]);

        let split = QueueFamilyIndices {
            graphics: 0,
            presentation: 2,
        };
        assert_eq!(split.unique(), vec![0, 2]);
    }
}
