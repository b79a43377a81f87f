use std::{
    collections::HashSet,
    ffi::{CStr, CString},
    ops::Deref,
};

use ash::{
    extensions::ext::DebugUtils,
    vk::{ApplicationInfo, InstanceCreateInfo, API_VERSION_1_3},
    Entry,
};
use tracing::{debug, trace, warn};

use crate::{
    debug_messenger::get_debug_messenger_create_info, error::VulkanError, queries,
    version::Version, ENABLE_VALIDATIONS,
};

const API_VERSION: u32 = API_VERSION_1_3;
const ENGINE_NAME: &str = env!("CARGO_PKG_NAME");

/// Validation layers requested when validations are enabled. Requested
/// layers missing from the driver are dropped, never an error.
const REQUESTED_VALIDATION_LAYERS: &[&str] = &[
    "VK_LAYER_KHRONOS_validation",
    "VK_LAYER_LUNARG_standard_validation",
    "VK_LAYER_LUNARG_core_validation",
    "VK_LAYER_LUNARG_parameter_validation",
    "VK_LAYER_LUNARG_object_tracker",
];

/// Owns the process-wide Vulkan instance. Created once at startup and
/// destroyed at shutdown; every other Vulkan object must be torn down
/// before this is dropped, which downstream types enforce by holding an
/// `Rc<Instance>`.
pub struct Instance {
    instance: ash::Instance,
    entry: Entry,
    enabled_layers: Vec<CString>,
    debug_utils_enabled: bool,
}

impl Instance {
    /// Creates the instance. `required_extensions` are the window-system
    /// integration extensions the windowing collaborator demands; any of
    /// them missing from the driver is fatal. Optional extensions
    /// (debug utils) are appended only when present.
    pub fn new(
        entry: Entry,
        app_name: &str,
        app_version: &Version,
        required_extensions: Vec<String>,
    ) -> Result<Self, VulkanError> {
        log_available_extensions(&entry);
        log_available_layers(&entry);

        let app_name = CString::new(app_name)?;
        let engine_name = CString::new(ENGINE_NAME)?;
        let engine_version = env!("CARGO_PKG_VERSION")
            .parse::<Version>()
            .map_err(|e| VulkanError::Internal(format!("bad crate version: {e}")))?;

        let app_info = ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(app_version.to_vk())
            .api_version(API_VERSION)
            .engine_name(&engine_name)
            .engine_version(engine_version.to_vk());

        let (extensions, debug_utils_enabled) =
            resolve_extensions(&entry, required_extensions)?;
        let extension_ptrs = extensions
            .iter()
            .map(|extension| extension.as_ptr())
            .collect::<Vec<_>>();

        let enabled_layers = resolve_validation_layers(&entry)?;
        let layer_ptrs = enabled_layers
            .iter()
            .map(|layer| layer.as_ptr())
            .collect::<Vec<_>>();

        let mut debug_messenger_create_info = get_debug_messenger_create_info();
        let mut instance_create_info = InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);
        if debug_utils_enabled {
            // catches messages emitted during instance creation itself
            instance_create_info =
                instance_create_info.push_next(&mut debug_messenger_create_info);
        }

        let instance = unsafe { entry.create_instance(&instance_create_info, None) }
            .map_err(|res| VulkanError::driver("Failed to create instance", res))?;
        trace!("Created Vulkan instance");

        Ok(Self {
            instance,
            entry,
            enabled_layers,
            debug_utils_enabled,
        })
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// True when the debug-utils extension was requested and available,
    /// i.e. a debug messenger can be installed.
    pub fn debug_utils_enabled(&self) -> bool {
        self.debug_utils_enabled
    }

    /// The validation layers that were actually enabled, for reuse when
    /// creating the logical device.
    pub(crate) fn enabled_layers(&self) -> &[CString] {
        &self.enabled_layers
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe { self.instance.destroy_instance(None) }
        trace!("Destroyed Vulkan instance");
    }
}

impl Deref for Instance {
    type Target = ash::Instance;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

/// Verifies every required extension against the available set and
/// appends the optional debug-utils extension when validations are on
/// and the driver offers it. Returns the final list plus whether debug
/// utils made the cut.
fn resolve_extensions(
    entry: &Entry,
    required_extensions: Vec<String>,
) -> Result<(Vec<CString>, bool), VulkanError> {
    let available = queries::available_instance_extensions(entry)?;
    let available_names = available
        .iter()
        .map(|properties| queries::cstr_to_string(properties.extension_name.as_ptr()))
        .collect::<HashSet<_>>();

    for required in &required_extensions {
        if !available_names.contains(required) {
            return Err(VulkanError::MissingExtension(required.clone()));
        }
    }

    let mut extensions = required_extensions
        .into_iter()
        .map(CString::new)
        .collect::<Result<Vec<_>, _>>()?;

    let mut debug_utils_enabled = false;
    if ENABLE_VALIDATIONS {
        let debug_utils_name = debug_utils_extension_name()?;
        if available_names.contains(debug_utils_name) {
            extensions.push(CString::new(debug_utils_name)?);
            debug_utils_enabled = true;
        } else {
            warn!("Optional extension {debug_utils_name} not available, continuing without it");
        }
    }

    debug!(
        "Using Vulkan extensions: {:?}",
        extensions
            .iter()
            .map(|e| e.to_string_lossy())
            .collect::<Vec<_>>()
    );
    Ok((extensions, debug_utils_enabled))
}

/// Intersects the requested validation layers with the available set.
/// Returns an empty list when validations are disabled.
fn resolve_validation_layers(entry: &Entry) -> Result<Vec<CString>, VulkanError> {
    if !ENABLE_VALIDATIONS {
        return Ok(vec![]);
    }

    let available = match queries::available_layers(entry) {
        Ok(layers) => layers,
        Err(e) => {
            warn!("{e}. Not using any validation layers");
            return Ok(vec![]);
        }
    };
    let available_names = available
        .iter()
        .map(|properties| queries::cstr_to_string(properties.layer_name.as_ptr()))
        .collect::<HashSet<_>>();

    let layers = REQUESTED_VALIDATION_LAYERS
        .iter()
        .filter(|layer| available_names.contains(**layer))
        .map(|layer| CString::new(*layer))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "Using Vulkan validation layers: {:?}",
        layers
            .iter()
            .map(|l| l.to_string_lossy())
            .collect::<Vec<_>>()
    );
    Ok(layers)
}

fn debug_utils_extension_name() -> Result<&'static str, VulkanError> {
    debug_utils_name_to_str(DebugUtils::name())
}

fn debug_utils_name_to_str(name: &'static CStr) -> Result<&'static str, VulkanError> {
    name.to_str()
        .map_err(|_| VulkanError::Internal("debug utils extension name is not UTF-8".to_owned()))
}

/// Purely diagnostic; a failed query here is logged and ignored.
fn log_available_extensions(entry: &Entry) {
    match queries::available_instance_extensions(entry) {
        Ok(extensions) => {
            trace!("Available Vulkan instance extensions:");
            for properties in extensions {
                trace!(
                    "+ {} at version {}",
                    queries::cstr_to_string(properties.extension_name.as_ptr()),
                    properties.spec_version
                );
            }
        }
        Err(e) => warn!("{e}, but this wasn't in a critical context"),
    }
}

fn log_available_layers(entry: &Entry) {
    match queries::available_layers(entry) {
        Ok(layers) => {
            trace!("Available Vulkan layers:");
            for properties in layers {
                trace!(
                    "+ {} at version {}",
                    queries::cstr_to_string(properties.layer_name.as_ptr()),
                    properties.spec_version
                );
            }
        }
        Err(e) => warn!("{e}, but this wasn't in a critical context"),
    }
}
