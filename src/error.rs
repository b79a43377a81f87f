use std::path::PathBuf;

use ash::vk;
use thiserror::Error;

/// Errors produced at the Vulkan driver-call boundary. Every fallible
/// driver call is captured into one of these; the caller decides whether
/// to propagate, abort initialization, or (for diagnostic-only queries)
/// log and continue.
#[derive(Debug, Error)]
pub enum VulkanError {
    /// A driver call was rejected. Carries the failing call's description
    /// and the raw status code.
    #[error("{message} (err={})", result_name(*result))]
    Driver {
        message: String,
        result: vk::Result,
    },

    #[error("required extension {0} not supported")]
    MissingExtension(String),

    #[error("no devices connected")]
    NoDevicesConnected,

    #[error("no devices are suitable")]
    NoSuitableDevice,

    /// A selection strategy handed over a device that later failed a
    /// required lookup. This is a bug in the strategy, not a driver
    /// condition.
    #[error("internal consistency fault: {0}")]
    Internal(String),

    #[error("{0}")]
    Window(String),

    #[error("failed to read shader file '{}'", path.display())]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader file '{}' is not valid SPIR-V: {reason}", path.display())]
    ShaderInvalid { path: PathBuf, reason: String },

    #[error("string contains an interior nul byte")]
    InvalidName(#[from] std::ffi::NulError),
}

impl VulkanError {
    pub fn driver(message: impl Into<String>, result: vk::Result) -> Self {
        Self::Driver {
            message: message.into(),
            result,
        }
    }
}

/// Stringifies a Vulkan status code for error messages and logs. Codes
/// outside the table map to a sentinel instead of panicking.
pub fn result_name(result: vk::Result) -> &'static str {
    match result {
        vk::Result::SUCCESS => "VK_SUCCESS",
        vk::Result::NOT_READY => "VK_NOT_READY",
        vk::Result::TIMEOUT => "VK_TIMEOUT",
        vk::Result::EVENT_SET => "VK_EVENT_SET",
        vk::Result::EVENT_RESET => "VK_EVENT_RESET",
        vk::Result::INCOMPLETE => "VK_INCOMPLETE",
        vk::Result::ERROR_OUT_OF_HOST_MEMORY => "VK_ERROR_OUT_OF_HOST_MEMORY",
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => "VK_ERROR_OUT_OF_DEVICE_MEMORY",
        vk::Result::ERROR_INITIALIZATION_FAILED => "VK_ERROR_INITIALIZATION_FAILED",
        vk::Result::ERROR_DEVICE_LOST => "VK_ERROR_DEVICE_LOST",
        vk::Result::ERROR_MEMORY_MAP_FAILED => "VK_ERROR_MEMORY_MAP_FAILED",
        vk::Result::ERROR_LAYER_NOT_PRESENT => "VK_ERROR_LAYER_NOT_PRESENT",
        vk::Result::ERROR_EXTENSION_NOT_PRESENT => "VK_ERROR_EXTENSION_NOT_PRESENT",
        vk::Result::ERROR_FEATURE_NOT_PRESENT => "VK_ERROR_FEATURE_NOT_PRESENT",
        vk::Result::ERROR_INCOMPATIBLE_DRIVER => "VK_ERROR_INCOMPATIBLE_DRIVER",
        vk::Result::ERROR_TOO_MANY_OBJECTS => "VK_ERROR_TOO_MANY_OBJECTS",
        vk::Result::ERROR_FORMAT_NOT_SUPPORTED => "VK_ERROR_FORMAT_NOT_SUPPORTED",
        vk::Result::ERROR_FRAGMENTED_POOL => "VK_ERROR_FRAGMENTED_POOL",
        vk::Result::ERROR_OUT_OF_POOL_MEMORY => "VK_ERROR_OUT_OF_POOL_MEMORY",
        vk::Result::ERROR_INVALID_EXTERNAL_HANDLE => "VK_ERROR_INVALID_EXTERNAL_HANDLE",
        vk::Result::ERROR_FRAGMENTATION => "VK_ERROR_FRAGMENTATION",
        vk::Result::ERROR_SURFACE_LOST_KHR => "VK_ERROR_SURFACE_LOST_KHR",
        vk::Result::ERROR_NATIVE_WINDOW_IN_USE_KHR => "VK_ERROR_NATIVE_WINDOW_IN_USE_KHR",
        vk::Result::SUBOPTIMAL_KHR => "VK_SUBOPTIMAL_KHR",
        vk::Result::ERROR_OUT_OF_DATE_KHR => "VK_ERROR_OUT_OF_DATE_KHR",
        vk::Result::ERROR_INCOMPATIBLE_DISPLAY_KHR => "VK_ERROR_INCOMPATIBLE_DISPLAY_KHR",
        vk::Result::ERROR_VALIDATION_FAILED_EXT => "VK_ERROR_VALIDATION_FAILED_EXT",
        vk::Result::ERROR_INVALID_SHADER_NV => "VK_ERROR_INVALID_SHADER_NV",
        _ => "UNKNOWN RESULT TYPE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_results_stringify() {
        assert_eq!(result_name(vk::Result::SUCCESS), "VK_SUCCESS");
        assert_eq!(
            result_name(vk::Result::ERROR_EXTENSION_NOT_PRESENT),
            "VK_ERROR_EXTENSION_NOT_PRESENT"
        );
        assert_eq!(
            result_name(vk::Result::ERROR_OUT_OF_DATE_KHR),
            "VK_ERROR_OUT_OF_DATE_KHR"
        );
    }

    #[test]
    fn unknown_result_maps_to_sentinel() {
        assert_eq!(result_name(vk::Result::from_raw(-1337)), "UNKNOWN RESULT TYPE");
    }

    #[test]
    fn driver_error_message_includes_result_name() {
        let err = VulkanError::driver(
            "Failed to create instance",
            vk::Result::ERROR_INCOMPATIBLE_DRIVER,
        );
        assert_eq!(
            err.to_string(),
            "Failed to create instance (err=VK_ERROR_INCOMPATIBLE_DRIVER)"
        );
    }
}
