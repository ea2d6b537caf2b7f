//! Value types passed through the driver interface.
//!
//! Everything here is either `Copy` or moved into a command, so it crosses the
//! render-thread boundary without sharing.

mod buffer;
mod common;
mod program;
mod raster;

pub use buffer::{
    Attribute, AttributeArray, AttributeFlags, BufferDescriptor, BufferObjectBinding,
    BufferUsage, ElementType, IndexType, MAX_UNIFORM_BUFFER_BINDINGS, MAX_VERTEX_ATTRIBUTE_COUNT,
    MAX_VERTEX_BUFFER_COUNT, PixelBufferDescriptor, PixelDataFormat, PixelDataType, ReleaseCallback,
};
pub use common::{
    FenceStatus, MAX_SUPPORTED_RENDER_TARGET_COUNT, Mrt, NativeHandle, PrimitiveType,
    RenderPassFlags, RenderPassParams, ShaderModel, SwapChainFlags, TargetBufferFlags,
    TargetBufferInfo, Viewport,
};
pub use program::{MAX_SAMPLER_GROUP_BINDINGS, Program, ShaderStage};
pub use raster::{BlendEquation, BlendFunction, CullingMode, RasterState};

use lumen_core::Handle;

use crate::hw::HwProgram;

/// Depth bias applied while rasterizing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolygonOffset {
    /// Factor scaled by the polygon's depth slope.
    pub slope: f32,
    /// Constant bias in depth units.
    pub constant: f32,
}

/// Full pipeline state for one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineState {
    pub program: Handle<HwProgram>,
    pub raster_state: RasterState,
    pub polygon_offset: PolygonOffset,
    /// Scissor rectangle; an empty rectangle disables scissoring.
    pub scissor: Viewport,
}

impl PipelineState {
    /// Pipeline using `program` with default raster state.
    pub fn new(program: Handle<HwProgram>) -> Self {
        Self {
            program,
            ..Default::default()
        }
    }

    /// Set the raster state.
    pub fn with_raster_state(mut self, raster_state: RasterState) -> Self {
        self.raster_state = raster_state;
        self
    }

    /// Set the scissor rectangle.
    pub fn with_scissor(mut self, scissor: Viewport) -> Self {
        self.scissor = scissor;
        self
    }

    /// Set the polygon offset.
    pub fn with_polygon_offset(mut self, slope: f32, constant: f32) -> Self {
        self.polygon_offset = PolygonOffset { slope, constant };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_state_defaults() {
        let program = Handle::<HwProgram>::new(5);
        let pipeline = PipelineState::new(program);
        assert_eq!(pipeline.program, program);
        assert!(!pipeline.raster_state.has_blending());
        assert_eq!(pipeline.scissor, Viewport::default());
        assert!(PipelineState::default().program.is_nil());
    }

    #[test]
    fn test_pipeline_state_builders() {
        let mut raster = RasterState::default();
        raster.set_culling(CullingMode::None);
        let pipeline = PipelineState::new(Handle::new(1))
            .with_raster_state(raster)
            .with_polygon_offset(1.5, 2.0);
        assert_eq!(pipeline.raster_state.culling(), CullingMode::None);
        assert_eq!(pipeline.polygon_offset, PolygonOffset { slope: 1.5, constant: 2.0 });
        assert_ne!(pipeline, PipelineState::new(Handle::new(1)));
    }
}
