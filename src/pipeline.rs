use std::{ffi::CString, fs, path::PathBuf, rc::Rc};

use ash::vk::{
    self, AccessFlags, AttachmentDescription, AttachmentLoadOp, AttachmentReference,
    AttachmentStoreOp, BlendFactor, BlendOp, ColorComponentFlags, Format, FrontFace as VkFrontFace,
    GraphicsPipelineCreateInfo, ImageLayout, Pipeline, PipelineBindPoint,
    PipelineColorBlendAttachmentState, PipelineColorBlendStateCreateInfo,
    PipelineInputAssemblyStateCreateInfo, PipelineLayout, PipelineLayoutCreateInfo,
    PipelineMultisampleStateCreateInfo, PipelineRasterizationStateCreateInfo,
    PipelineShaderStageCreateInfo, PipelineStageFlags, PipelineVertexInputStateCreateInfo,
    PipelineViewportStateCreateInfo, PolygonMode as VkPolygonMode, PrimitiveTopology, RenderPass,
    RenderPassCreateInfo, SampleCountFlags, ShaderStageFlags, SubpassDependency,
    SubpassDescription, SUBPASS_EXTERNAL,
};
use tracing::debug;

use crate::{error::VulkanError, shader_module::ShaderModuleGuard, LogicalDevice, Rect};

/// How polygons are filled during rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
    Point,
}

impl PolygonMode {
    fn to_vk(self) -> VkPolygonMode {
        match self {
            Self::Fill => VkPolygonMode::FILL,
            Self::Line => VkPolygonMode::LINE,
            Self::Point => VkPolygonMode::POINT,
        }
    }
}

/// Which faces are discarded before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    None,
    #[default]
    Back,
    Front,
    FrontAndBack,
}

impl CullMode {
    fn to_vk(self) -> vk::CullModeFlags {
        match self {
            Self::None => vk::CullModeFlags::NONE,
            Self::Back => vk::CullModeFlags::BACK,
            Self::Front => vk::CullModeFlags::FRONT,
            Self::FrontAndBack => vk::CullModeFlags::FRONT_AND_BACK,
        }
    }
}

/// Winding order that defines a front-facing triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontFace {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl FrontFace {
    fn to_vk(self) -> VkFrontFace {
        match self {
            Self::Clockwise => VkFrontFace::CLOCKWISE,
            Self::CounterClockwise => VkFrontFace::COUNTER_CLOCKWISE,
        }
    }
}

/// Optional depth-bias configuration for the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthBias {
    pub constant_factor: f32,
    pub clamp: f32,
    pub slope_factor: f32,
}

/// Fixed-function state of a [`RenderPipeline`]. The defaults match the
/// common opaque-geometry configuration; construct with struct-update
/// syntax to override individual fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub viewport: Rect,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub line_width: f32,
    pub depth_clamp_enabled: bool,
    pub depth_bias: Option<DepthBias>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            viewport: Rect::default(),
            polygon_mode: PolygonMode::default(),
            cull_mode: CullMode::default(),
            front_face: FrontFace::default(),
            line_width: 1.0,
            depth_clamp_enabled: false,
            depth_bias: None,
        }
    }
}

/// Locations of the compiled SPIR-V shader stages on disk.
#[derive(Debug, Clone)]
pub struct ShaderModulePaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

/// Reads a compiled shader from disk and validates it is plausibly
/// SPIR-V before any driver object is created from it.
fn load_shader_bytecode(path: &PathBuf) -> Result<Vec<u8>, VulkanError> {
    let code = fs::read(path).map_err(|source| VulkanError::ShaderRead {
        path: path.clone(),
        source,
    })?;
    if code.is_empty() {
        return Err(VulkanError::ShaderInvalid {
            path: path.clone(),
            reason: "file is empty".to_owned(),
        });
    }
    if code.len() % 4 != 0 {
        return Err(VulkanError::ShaderInvalid {
            path: path.clone(),
            reason: format!("length {} is not a multiple of 4", code.len()),
        });
    }
    Ok(code)
}

/// A complete graphics pipeline plus the layout and render pass it was
/// created with. The shader entry point in both stages is the pipeline's
/// `name`, so compiled GLSL (entry point `main`) pairs with a pipeline
/// named `main`.
pub struct RenderPipeline {
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
    render_pass: RenderPass,
    name: String,
    logical_device: Rc<LogicalDevice>,
}

impl RenderPipeline {
    pub fn new(
        name: &str,
        shader_paths: &ShaderModulePaths,
        settings: &PipelineSettings,
        logical_device: &Rc<LogicalDevice>,
        color_format: Format,
    ) -> Result<Self, VulkanError> {
        // fail on unreadable or malformed bytecode before touching the driver
        let vertex_code = load_shader_bytecode(&shader_paths.vertex)?;
        let fragment_code = load_shader_bytecode(&shader_paths.fragment)?;

        let vertex_module = ShaderModuleGuard::try_new(&vertex_code, logical_device)?;
        let fragment_module = ShaderModuleGuard::try_new(&fragment_code, logical_device)?;

        let entry_point = CString::new(name)?;
        let shader_stages = [
            PipelineShaderStageCreateInfo::builder()
                .stage(ShaderStageFlags::VERTEX)
                .module(*vertex_module)
                .name(&entry_point)
                .build(),
            PipelineShaderStageCreateInfo::builder()
                .stage(ShaderStageFlags::FRAGMENT)
                .module(*fragment_module)
                .name(&entry_point)
                .build(),
        ];

        // vertices are currently generated in the shader, so no bindings
        let vertex_input_state = PipelineVertexInputStateCreateInfo::builder();
        let input_assembly_state = PipelineInputAssemblyStateCreateInfo::builder()
            .topology(PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewports = [settings.viewport.to_viewport()];
        let scissors = [settings.viewport.to_scissor()];
        let viewport_state = PipelineViewportStateCreateInfo::builder()
            .viewports(&viewports)
            .scissors(&scissors);

        let mut rasterization_state = PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(settings.depth_clamp_enabled)
            .rasterizer_discard_enable(false)
            .polygon_mode(settings.polygon_mode.to_vk())
            .line_width(settings.line_width)
            .cull_mode(settings.cull_mode.to_vk())
            .front_face(settings.front_face.to_vk());
        if let Some(bias) = settings.depth_bias {
            rasterization_state = rasterization_state
                .depth_bias_enable(true)
                .depth_bias_constant_factor(bias.constant_factor)
                .depth_bias_clamp(bias.clamp)
                .depth_bias_slope_factor(bias.slope_factor);
        }

        let multisample_state = PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(SampleCountFlags::TYPE_1);

        let color_blend_attachments = [PipelineColorBlendAttachmentState::builder()
            .color_write_mask(ColorComponentFlags::RGBA)
            .blend_enable(true)
            .src_color_blend_factor(BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(BlendFactor::ONE)
            .color_blend_op(BlendOp::ADD)
            .src_alpha_blend_factor(BlendFactor::ONE)
            .dst_alpha_blend_factor(BlendFactor::ZERO)
            .alpha_blend_op(BlendOp::ADD)
            .build()];
        let color_blend_state =
            PipelineColorBlendStateCreateInfo::builder().attachments(&color_blend_attachments);

        let layout_create_info = PipelineLayoutCreateInfo::builder();
        let pipeline_layout =
            unsafe { logical_device.create_pipeline_layout(&layout_create_info, None) }
                .map_err(|res| VulkanError::driver("Failed to create pipeline layout", res))?;

        let render_pass = match create_render_pass(logical_device, color_format) {
            Ok(render_pass) => render_pass,
            Err(err) => {
                unsafe { logical_device.destroy_pipeline_layout(pipeline_layout, None) };
                return Err(err);
            }
        };

        let pipeline_create_infos = [GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .layout(pipeline_layout)
            .render_pass(render_pass)
            .subpass(0)
            .build()];

        let pipelines = unsafe {
            logical_device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &pipeline_create_infos,
                None,
            )
        };
        let pipeline = match pipelines {
            Ok(pipelines) if !pipelines.is_empty() => pipelines[0],
            Ok(_) => {
                unsafe {
                    logical_device.destroy_render_pass(render_pass, None);
                    logical_device.destroy_pipeline_layout(pipeline_layout, None);
                }
                return Err(VulkanError::Internal(
                    "pipeline creation returned no pipelines".to_owned(),
                ));
            }
            Err((_, res)) => {
                unsafe {
                    logical_device.destroy_render_pass(render_pass, None);
                    logical_device.destroy_pipeline_layout(pipeline_layout, None);
                }
                return Err(VulkanError::driver("Failed to create graphics pipeline", res));
            }
        };

        debug!("Created render pipeline '{}'", name);
        Ok(Self {
            pipeline,
            pipeline_layout,
            render_pass,
            name: name.to_owned(),
            logical_device: Rc::clone(logical_device),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    pub fn layout(&self) -> &PipelineLayout {
        &self.pipeline_layout
    }
}

fn create_render_pass(
    logical_device: &Rc<LogicalDevice>,
    color_format: Format,
) -> Result<RenderPass, VulkanError> {
    let color_attachments = [AttachmentDescription::builder()
        .format(color_format)
        .samples(SampleCountFlags::TYPE_1)
        .load_op(AttachmentLoadOp::CLEAR)
        .store_op(AttachmentStoreOp::STORE)
        .stencil_load_op(AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(AttachmentStoreOp::DONT_CARE)
        .initial_layout(ImageLayout::UNDEFINED)
        .final_layout(ImageLayout::PRESENT_SRC_KHR)
        .build()];

    let color_attachment_refs = [AttachmentReference::builder()
        .attachment(0)
        .layout(ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        .build()];
    let subpasses = [SubpassDescription::builder()
        .pipeline_bind_point(PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_attachment_refs)
        .build()];

    // wait for the previous frame's color output before writing
    let dependencies = [SubpassDependency::builder()
        .src_subpass(SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(AccessFlags::empty())
        .dst_stage_mask(PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(AccessFlags::COLOR_ATTACHMENT_WRITE)
        .build()];

    let render_pass_create_info = RenderPassCreateInfo::builder()
        .attachments(&color_attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    unsafe { logical_device.create_render_pass(&render_pass_create_info, None) }
        .map_err(|res| VulkanError::driver("Failed to create render pass", res))
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        debug!("Dropping RenderPipeline '{}'", self.name);
        unsafe {
            self.logical_device.destroy_pipeline(self.pipeline, None);
            self.logical_device
                .destroy_pipeline_layout(self.pipeline_layout, None);
            self.logical_device
                .destroy_render_pass(self.render_pass, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_opaque_geometry() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.polygon_mode, PolygonMode::Fill);
        assert_eq!(settings.cull_mode, CullMode::Back);
        assert_eq!(settings.front_face, FrontFace::Clockwise);
        assert_eq!(settings.line_width, 1.0);
        assert!(!settings.depth_clamp_enabled);
        assert!(settings.depth_bias.is_none());
    }

    #[test]
    fn enums_map_to_driver_values() {
        assert_eq!(PolygonMode::Line.to_vk(), VkPolygonMode::LINE);
        assert_eq!(CullMode::None.to_vk(), vk::CullModeFlags::NONE);
        assert_eq!(
            CullMode::FrontAndBack.to_vk(),
            vk::CullModeFlags::FRONT_AND_BACK
        );
        assert_eq!(
            FrontFace::CounterClockwise.to_vk(),
            VkFrontFace::COUNTER_CLOCKWISE
        );
    }

    #[test]
    fn missing_shader_file_fails_before_driver_calls() {
        let path = PathBuf::from("does/not/exist.spv");
        let err = load_shader_bytecode(&path).unwrap_err();
        assert!(matches!(err, VulkanError::ShaderRead { .. }));
    }

    #[test]
    fn truncated_bytecode_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("canopy_truncated_shader_test.spv");
        std::fs::write(&path, [0u8; 7]).unwrap();
        let err = load_shader_bytecode(&path).unwrap_err();
        assert!(matches!(err, VulkanError::ShaderInvalid { .. }));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_bytecode_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("canopy_empty_shader_test.spv");
        std::fs::write(&path, []).unwrap();
        let err = load_shader_bytecode(&path).unwrap_err();
        assert!(matches!(err, VulkanError::ShaderInvalid { .. }));
        std::fs::remove_file(&path).ok();
    }
}
