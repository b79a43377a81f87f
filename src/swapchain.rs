use std::{ffi::c_uint, rc::Rc};

use ash::{
    extensions::khr::Swapchain as SwapchainFn,
    vk::{
        ColorSpaceKHR, ComponentMapping, ComponentSwizzle, CompositeAlphaFlagsKHR, Extent2D,
        Format, Image, ImageAspectFlags, ImageSubresourceRange, ImageUsageFlags, ImageView,
        ImageViewCreateInfo, ImageViewType, PhysicalDevice, PresentModeKHR, SharingMode,
        SurfaceCapabilitiesKHR, SurfaceFormatKHR, SwapchainCreateInfoKHR, SwapchainKHR,
    },
};
use glfw::PWindow;
use tracing::debug;

use crate::{
    error::VulkanError, queue_families::QueueFamilyIndices, Instance, LogicalDevice, Surface,
};

/// What the swap chain supports for a given device + surface pair.
/// Queried fresh each time; capabilities change with the window.
pub struct SwapChainSupportDetails {
    pub capabilities: SurfaceCapabilitiesKHR,
    pub formats: Vec<SurfaceFormatKHR>,
    pub present_modes: Vec<PresentModeKHR>,
}

pub fn query_swap_chain_support(
    surface: &Surface,
    device: &PhysicalDevice,
) -> Result<SwapChainSupportDetails, VulkanError> {
    let capabilities = surface.get_capabilities(device)?;
    let formats = surface.get_surface_formats(device)?;
    let present_modes = surface.get_presentation_modes(device)?;
    Ok(SwapChainSupportDetails {
        capabilities,
        formats,
        present_modes,
    })
}

/// Owns the presentable images and their views. Destroyed (and on
/// resize, recreated) before the surface and device it was built from.
pub struct SwapChain {
    swapchain_fn: SwapchainFn,
    handle: SwapchainKHR,
    images: Vec<Image>,
    image_views: Vec<ImageView>,
    surface_format: SurfaceFormatKHR,
    extent: Extent2D,
    logical_device: Rc<LogicalDevice>,
    // dropped after the swapchain handle, keeping teardown ordered
    _surface: Rc<Surface>,
}

impl SwapChain {
    pub fn new(
        instance: &Rc<Instance>,
        logical_device: &Rc<LogicalDevice>,
        surface: &Rc<Surface>,
        window: &PWindow,
    ) -> Result<Self, VulkanError> {
        let support = query_swap_chain_support(surface, logical_device.physical_device())?;

        let surface_format = choose_surface_format(&support.formats).ok_or_else(|| {
            // the selection strategy guarantees a non-empty format list
            VulkanError::Internal("surface reports no supported formats".to_owned())
        })?;
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_swap_extent(&support.capabilities, framebuffer_size(window));
        let image_count = choose_image_count(&support.capabilities);
        let (sharing_mode, queue_family_indices) =
            pick_queue_settings(logical_device.queue_family_indices());

        let mut create_info = SwapchainCreateInfoKHR::builder()
            .surface(***surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .present_mode(present_mode)
            // always 1 unless doing stereoscopic 3D
            .image_array_layers(1)
            // images are color attachments to draw into
            .image_usage(ImageUsageFlags::COLOR_ATTACHMENT)
            // pass the current transform through unchanged
            .pre_transform(support.capabilities.current_transform)
            // ignore the alpha channel when compositing
            .composite_alpha(CompositeAlphaFlagsKHR::OPAQUE)
            // discard pixels hidden by other windows
            .clipped(true)
            .image_sharing_mode(sharing_mode)
            .old_swapchain(SwapchainKHR::null());
        if !queue_family_indices.is_empty() {
            create_info = create_info.queue_family_indices(&queue_family_indices);
        }

        let swapchain_fn = SwapchainFn::new(instance, logical_device);
        let handle = unsafe { swapchain_fn.create_swapchain(&create_info, None) }
            .map_err(|res| VulkanError::driver("Failed to create swap chain", res))?;

        // the driver decides the final count, which may exceed the request
        let images = unsafe { swapchain_fn.get_swapchain_images(handle) }
            .map_err(|res| VulkanError::driver("Failed to query swap chain images", res))?;
        debug!(
            "Created swap chain with {} images at {}x{}",
            images.len(),
            extent.width,
            extent.height
        );

        Ok(Self {
            swapchain_fn,
            handle,
            images,
            image_views: vec![],
            surface_format,
            extent,
            logical_device: Rc::clone(logical_device),
            _surface: Rc::clone(surface),
        })
    }

    /// Builds one 2D color view per image. Deferred rather than done at
    /// construction; calling it again is a no-op. On failure every view
    /// created so far is destroyed before the error propagates.
    pub fn create_image_views(&mut self) -> Result<(), VulkanError> {
        if !self.image_views.is_empty() {
            return Ok(());
        }

        let mut views = Vec::with_capacity(self.images.len());
        for image in &self.images {
            let create_info = ImageViewCreateInfo::builder()
                .image(*image)
                .view_type(ImageViewType::TYPE_2D)
                .format(self.surface_format.format)
                .components(ComponentMapping {
                    r: ComponentSwizzle::IDENTITY,
                    g: ComponentSwizzle::IDENTITY,
                    b: ComponentSwizzle::IDENTITY,
                    a: ComponentSwizzle::IDENTITY,
                })
                .subresource_range(
                    ImageSubresourceRange::builder()
                        .aspect_mask(ImageAspectFlags::COLOR)
                        .base_mip_level(0)
                        .level_count(1)
                        .base_array_layer(0)
                        .layer_count(1)
                        .build(),
                );
            match unsafe { self.logical_device.create_image_view(&create_info, None) } {
                Ok(view) => views.push(view),
                Err(res) => {
                    for view in views {
                        unsafe { self.logical_device.destroy_image_view(view, None) }
                    }
                    return Err(VulkanError::driver("Failed to create image view", res));
                }
            }
        }

        self.image_views = views;
        Ok(())
    }

    pub fn handle(&self) -> &SwapchainKHR {
        &self.handle
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn image_views(&self) -> &[ImageView] {
        &self.image_views
    }

    pub fn format(&self) -> Format {
        self.surface_format.format
    }

    pub fn surface_format(&self) -> &SurfaceFormatKHR {
        &self.surface_format
    }

    pub fn extent(&self) -> &Extent2D {
        &self.extent
    }
}

impl Drop for SwapChain {
    fn drop(&mut self) {
        debug!("Dropping SwapChain");
        for view in self.image_views.drain(..) {
            unsafe { self.logical_device.destroy_image_view(view, None) }
        }
        unsafe { self.swapchain_fn.destroy_swapchain(self.handle, None) }
    }
}

fn framebuffer_size(window: &PWindow) -> (u32, u32) {
    let (width, height) = window.get_framebuffer_size();
    (width.max(0) as u32, height.max(0) as u32)
}

/// Prefers 8-bit BGRA in sRGB; falls back to the first reported format,
/// which is arbitrary but deterministic.
pub(crate) fn choose_surface_format(
    available_formats: &[SurfaceFormatKHR],
) -> Option<SurfaceFormatKHR> {
    available_formats
        .iter()
        .find(|format| {
            format.format == Format::B8G8R8A8_SRGB
                && format.color_space == ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| available_formats.first())
        .copied()
}

/// Mailbox when the device advertises it, otherwise FIFO, which every
/// conforming driver must support.
pub(crate) fn choose_present_mode(available_modes: &[PresentModeKHR]) -> PresentModeKHR {
    if available_modes.contains(&PresentModeKHR::MAILBOX) {
        PresentModeKHR::MAILBOX
    } else {
        PresentModeKHR::FIFO
    }
}

/// The sentinel current-extent means the surface accepts any size; in
/// that case derive the extent from the framebuffer, clamped per axis
/// into the reported range. Otherwise the current extent is used as is.
pub(crate) fn choose_swap_extent(
    capabilities: &SurfaceCapabilitiesKHR,
    framebuffer_size: (u32, u32),
) -> Extent2D {
    if capabilities.current_extent.width != c_uint::MAX {
        return capabilities.current_extent;
    }
    let (width, height) = framebuffer_size;
    Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One more image than the minimum so rendering is not stuck waiting on
/// the driver, clamped to the maximum unless the maximum is 0, which
/// means unbounded.
pub(crate) fn choose_image_count(capabilities: &SurfaceCapabilitiesKHR) -> u32 {
    let mut image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count = image_count.clamp(capabilities.min_image_count, capabilities.max_image_count);
    }
    image_count
}

/// Sharing mode for the swap chain images: a single family owns its
/// images exclusively; distinct graphics/presentation families share
/// them concurrently across the listed indices.
pub(crate) fn pick_queue_settings(indices: &QueueFamilyIndices) -> (SharingMode, Vec<u32>) {
    let unique = indices.unique();
    if unique.len() == 1 {
        (SharingMode::EXCLUSIVE, vec![])
    } else {
        (SharingMode::CONCURRENT, unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities(min_count: u32, max_count: u32) -> SurfaceCapabilitiesKHR {
        SurfaceCapabilitiesKHR {
            min_image_count: min_count,
            max_image_count: max_count,
            ..Default::default()
        }
    }

    #[test]
    fn image_count_is_min_plus_one() {
        assert_eq!(choose_image_count(&capabilities(2, 8)), 3);
    }

    #[test]
    fn image_count_unbounded_max_is_not_clamped() {
        // max_image_count of 0 means no upper limit
        assert_eq!(choose_image_count(&capabilities(2, 0)), 3);
    }

    #[test]
    fn image_count_clamps_to_max() {
        assert_eq!(choose_image_count(&capabilities(3, 3)), 3);
    }

    #[test]
    fn present_mode_prefers_mailbox() {
        let modes = [PresentModeKHR::FIFO, PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&modes), PresentModeKHR::MAILBOX);
    }

    #[test]
    fn present_mode_falls_back_to_fifo() {
        let modes = [PresentModeKHR::IMMEDIATE, PresentModeKHR::FIFO_RELAXED];
        assert_eq!(choose_present_mode(&modes), PresentModeKHR::FIFO);
        assert_eq!(choose_present_mode(&[]), PresentModeKHR::FIFO);
    }

    #[test]
    fn surface_format_prefers_bgra_srgb() {
        let formats = [
            SurfaceFormatKHR {
                format: Format::R8G8B8A8_UNORM,
                color_space: ColorSpaceKHR::SRGB_NONLINEAR,
            },
            SurfaceFormatKHR {
                format: Format::B8G8R8A8_SRGB,
                color_space: ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        assert_eq!(
            choose_surface_format(&formats).unwrap().format,
            Format::B8G8R8A8_SRGB
        );
    }

    #[test]
    fn surface_format_falls_back_to_first() {
        let formats = [
            SurfaceFormatKHR {
                format: Format::R8G8B8A8_UNORM,
                color_space: ColorSpaceKHR::SRGB_NONLINEAR,
            },
            SurfaceFormatKHR {
                format: Format::R5G6B5_UNORM_PACK16,
                color_space: ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        assert_eq!(
            choose_surface_format(&formats).unwrap().format,
            Format::R8G8B8A8_UNORM
        );
        assert!(choose_surface_format(&[]).is_none());
    }

    #[test]
    fn extent_uses_current_when_fixed() {
        let caps = SurfaceCapabilitiesKHR {
            current_extent: Extent2D {
                width: 800,
                height: 600,
            },
            ..Default::default()
        };
        let extent = choose_swap_extent(&caps, (1024, 768));
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
    }

    #[test]
    fn extent_clamps_window_size_under_sentinel() {
        let caps = SurfaceCapabilitiesKHR {
            current_extent: Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: Extent2D {
                width: 320,
                height: 240,
            },
            max_image_extent: Extent2D {
                width: 1920,
                height: 1080,
            },
            ..Default::default()
        };
        // raw framebuffer size lies outside the range on both axes
        let extent = choose_swap_extent(&caps, (4000, 100));
        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 240);
    }

    #[test]
    fn single_family_is_exclusive() {
        let indices = QueueFamilyIndices {
            graphics: 1,
            presentation: 1,
        };
        let (mode, list) = pick_queue_settings(&indices);
        assert_eq!(mode, SharingMode::EXCLUSIVE);
        assert!(list.is_empty());
    }

    #[test]
    fn split_families_share_concurrently() {
        let indices = QueueFamilyIndices {
            graphics: 0,
            presentation: 2,
        };
        let (mode, list) = pick_queue_settings(&indices);
        assert_eq!(mode, SharingMode::CONCURRENT);
        assert_eq!(list, vec![0, 2]);
    }
}
