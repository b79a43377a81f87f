use std::rc::Rc;

use ash::{
    extensions::ext::DebugUtils,
    vk::{
        Bool32, DebugUtilsMessageSeverityFlagsEXT, DebugUtilsMessageTypeFlagsEXT,
        DebugUtilsMessengerCallbackDataEXT, DebugUtilsMessengerCreateInfoEXT,
        DebugUtilsMessengerCreateInfoEXTBuilder, DebugUtilsMessengerEXT,
    },
};
use tracing::{debug, event, Level};

use crate::{error::VulkanError, Instance};

pub fn get_debug_messenger_create_info<'a>() -> DebugUtilsMessengerCreateInfoEXTBuilder<'a> {
    DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            DebugUtilsMessageSeverityFlagsEXT::ERROR
                | DebugUtilsMessageSeverityFlagsEXT::WARNING
                | DebugUtilsMessageSeverityFlagsEXT::INFO
                | DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
        )
        .message_type(
            DebugUtilsMessageTypeFlagsEXT::GENERAL
                | DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                | DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        )
        .pfn_user_callback(Some(vulkan_debug_messenger_callback))
}

/// RAII for the debug-utils messenger. Only constructed when the
/// instance reports the extension as enabled.
pub struct DebugMessenger {
    debug_utils: DebugUtils,
    messenger: DebugUtilsMessengerEXT,
    // keeps the instance alive until the messenger is destroyed
    _instance: Rc<Instance>,
}

impl DebugMessenger {
    pub fn new(instance: &Rc<Instance>) -> Result<Self, VulkanError> {
        let create_info = get_debug_messenger_create_info();
        let debug_utils = DebugUtils::new(instance.entry(), instance);
        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
            .map_err(|res| VulkanError::driver("Failed to create debug messenger", res))?;
        Ok(Self {
            debug_utils,
            messenger,
            _instance: Rc::clone(instance),
        })
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        debug!("Dropping DebugMessenger");
        unsafe {
            self.debug_utils
                .destroy_debug_utils_messenger(self.messenger, None)
        }
    }
}

pub(crate) fn message_type_name(ty: DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    match ty {
        DebugUtilsMessageTypeFlagsEXT::GENERAL => "general",
        DebugUtilsMessageTypeFlagsEXT::VALIDATION => "validation",
        DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "performance",
        _ => "unknown",
    }
}

/// Invoked synchronously by the driver on the calling thread; routes the
/// message to the already-initialized log sink and never blocks beyond
/// that.
unsafe extern "system" fn vulkan_debug_messenger_callback(
    message_severity: DebugUtilsMessageSeverityFlagsEXT,
    message_type: DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> Bool32 {
    let message = format!(
        "{:?}",
        std::ffi::CStr::from_ptr((*p_callback_data).p_message)
    );
    let ty = message_type_name(message_type);

    match message_severity {
        DebugUtilsMessageSeverityFlagsEXT::VERBOSE => {
            event!(Level::TRACE, message = message, ty = ty)
        }
        DebugUtilsMessageSeverityFlagsEXT::INFO => {
            event!(Level::INFO, message = message, ty = ty)
        }
        DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            event!(Level::WARN, message = message, ty = ty)
        }
        DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            event!(Level::ERROR, message = message, ty = ty)
        }
        _ => {
            event!(Level::DEBUG, message = message, ty = ty)
        }
    }
    // dont skip the driver call that triggered the message
    ash::vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_types_have_names() {
        assert_eq!(
            message_type_name(DebugUtilsMessageTypeFlagsEXT::GENERAL),
            "general"
        );
        assert_eq!(
            message_type_name(DebugUtilsMessageTypeFlagsEXT::VALIDATION),
            "validation"
        );
        assert_eq!(
            message_type_name(DebugUtilsMessageTypeFlagsEXT::PERFORMANCE),
            "performance"
        );
    }
}
