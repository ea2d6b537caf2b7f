//! Backend abstraction.
//!
//! # Available Backends
//!
//! - `noop` (default): in-memory backend for tests and headless tools
//!
//! # Calling conventions
//!
//! Each backend implements the [`Driver`] trait, which carries the two
//! conventions that run on the render thread or the caller's thread:
//! - [`Driver::execute`] plays back one fire-and-forget [`Command`]
//! - the remaining methods are synchronous queries, safe to call from any thread
//!
//! Calls that report a value back from the render thread
//! (`read_buffer_object_synchronous`, `render_target_size_synchronous`) are
//! invoked by the [`Dispatcher`](crate::command::Dispatcher), which forwards the
//! result into a [`ReturnSlot`](crate::command::ReturnSlot).

mod base;
pub mod format_table;

#[cfg(feature = "noop")]
pub mod noop;

pub use base::DriverBase;
pub use format_table::{
    TextureInfo, check_texture_info, find_texture_info, get_sampler_format,
    get_sampler_precision,
};

use std::sync::Arc;
use std::time::Duration;

use lumen_core::{Handle, SlotState};
use lumen_core::texture::TextureFormat;

use crate::command::Command;
use crate::config::{BackendKind, DriverConfig};
use crate::error::DriverError;
use crate::hw::{HandleAllocator, HwBufferObject, HwFence, HwRenderTarget};
use crate::types::{FenceStatus, ShaderModel};

/// Synchronous surface of a backend.
pub trait Driver: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// Tables backing every handle this driver hands out.
    fn handle_allocator(&self) -> &HandleAllocator;

    fn base(&self) -> &DriverBase;

    fn shader_model(&self) -> ShaderModel;

    fn is_texture_format_supported(&self, format: TextureFormat) -> bool;

    fn is_texture_format_mipmappable(&self, format: TextureFormat) -> bool;

    fn is_render_target_format_supported(&self, format: TextureFormat) -> bool;

    /// Maximum number of color attachments in one render target.
    fn max_draw_buffers(&self) -> usize;

    /// Non-blocking fence query.
    fn fence_status(&self, fence: Handle<HwFence>) -> FenceStatus {
        let allocator = self.handle_allocator();
        if allocator.is_constructed(fence) {
            FenceStatus::ConditionSatisfied
        } else if allocator.state(fence) == SlotState::Vacant {
            FenceStatus::Error
        } else {
            FenceStatus::TimeoutExpired
        }
    }

    /// Block until every command recorded before the fence has executed.
    fn wait_fence(&self, fence: Handle<HwFence>, timeout: Duration) -> FenceStatus {
        let allocator = self.handle_allocator();
        if allocator.state(fence) == SlotState::Vacant {
            return FenceStatus::Error;
        }
        if allocator.wait_until_constructed(fence, timeout) {
            FenceStatus::ConditionSatisfied
        } else {
            FenceStatus::TimeoutExpired
        }
    }

    /// Run release callbacks queued by the render thread. Main thread only.
    fn purge(&self) -> usize {
        self.base().purge()
    }

    /// Play back one command.
    fn execute(&self, command: Command);

    /// Copy `byte_count` bytes of a buffer object starting at `byte_offset`.
    ///
    /// The range is clamped to the buffer; unknown handles yield no bytes.
    fn read_buffer_object_synchronous(
        &self,
        handle: Handle<HwBufferObject>,
        byte_offset: u32,
        byte_count: u32,
    ) -> Vec<u8>;

    /// Width and height of a render target.
    fn render_target_size_synchronous(&self, target: Handle<HwRenderTarget>) -> Option<(u32, u32)>;
}

/// Create a driver for `config.backend`.
///
/// `BackendKind::Default` picks the best compiled-in backend.
pub fn create_driver(config: &DriverConfig) -> Result<Arc<dyn Driver>, DriverError> {
    config.validate()?;
    match config.backend {
        #[cfg(feature = "noop")]
        BackendKind::Default | BackendKind::Noop => {
            log::info!("Using noop backend");
            Ok(Arc::new(noop::NoopDriver::new(config)))
        }
        #[cfg(not(feature = "noop"))]
        kind => Err(DriverError::UnsupportedBackend(kind.name().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_driver_rejects_invalid_config() {
        let config = DriverConfig::new().with_command_buffer_capacity(0);
        assert!(matches!(
            create_driver(&config),
            Err(DriverError::InvalidParameter(_))
        ));
    }

    #[cfg(feature = "noop")]
    #[test]
    fn test_create_default_driver() {
        let driver = create_driver(&DriverConfig::default()).expect("noop driver");
        assert_eq!(driver.name(), "noop");
        assert_eq!(driver.purge(), 0);
    }

    #[cfg(feature = "noop")]
    #[test]
    fn test_fence_status_of_unknown_handle() {
        let driver = create_driver(&DriverConfig::default()).expect("noop driver");
        let fence = Handle::<HwFence>::new(99);
        assert_eq!(driver.fence_status(fence), FenceStatus::Error);
        assert_eq!(
            driver.wait_fence(fence, Duration::from_millis(1)),
            FenceStatus::Error
        );
    }
}
