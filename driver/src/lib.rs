//! # Lumen Driver
//!
//! Command-stream front end for a GPU backend.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`CommandStream`] - Records driver calls and submits them in order
//! - [`Driver`] - Trait implemented by every backend
//! - [`DriverBase`] - Deferred release of client buffers and the texture format table
//! - [`SamplerBuffer`] - Fixed-size sampler set with per-slot dirty tracking
//! - [`RasterState`] - Rasterizer and blend state packed into one word
//! - Backends: Noop (for testing and headless tools)
//!
//! ## Example
//!
//! ```ignore
//! use lumen_driver::{CommandStream, DriverConfig, RenderPassParams};
//!
//! let mut stream = CommandStream::new(DriverConfig::default())?;
//! let target = stream.create_default_render_target();
//! stream.begin_frame(0, 0);
//! stream.begin_render_pass(target, RenderPassParams::default());
//! // Bind, draw...
//! stream.end_render_pass();
//! stream.end_frame(0);
//! stream.finish()?;
//! ```

pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub mod hw;
pub mod sampler_buffer;
pub mod types;

// Re-export main types for convenience
pub use backend::{Driver, DriverBase, TextureInfo, create_driver};
pub use command::{Command, CommandBuffer, CommandKind, CommandStream, Dispatcher, RenderThread, ReturnSlot};
pub use config::{BackendKind, DriverConfig, ThreadingMode};
pub use error::DriverError;
pub use hw::{
    HandleAllocator, HwBufferObject, HwFence, HwIndexBuffer, HwProgram, HwRenderPrimitive,
    HwRenderTarget, HwResource, HwSamplerGroup, HwStream, HwSwapChain, HwTexture, HwVertexBuffer,
};
pub use lumen_core::Handle;
pub use sampler_buffer::{
    MAX_SAMPLER_COUNT, Sampler, SamplerBuffer, SamplerInfo, SamplerInterfaceBlock, SamplerSource,
};
pub use types::{
    AttributeArray, BlendEquation, BlendFunction, BufferDescriptor, BufferObjectBinding,
    BufferUsage, CullingMode, FenceStatus, IndexType, PipelineState, PixelBufferDescriptor,
    PixelDataFormat, PixelDataType, PrimitiveType, Program, RasterState, RenderPassParams,
    ShaderModel, TargetBufferFlags, Viewport,
};

/// Driver library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
