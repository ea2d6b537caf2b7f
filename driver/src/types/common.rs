//! Render pass, target and synchronization types shared across the driver.

use bitflags::bitflags;
use lumen_core::Handle;

use crate::hw::HwTexture;

/// Maximum number of color attachments in a render target.
pub const MAX_SUPPORTED_RENDER_TARGET_COUNT: usize = 8;

// ============================================================================
// Viewport
// ============================================================================

/// Rectangular region of a render target, origin at the bottom-left corner.
///
/// Also used as the scissor rectangle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    /// Left coordinate in pixels.
    pub left: i32,
    /// Bottom coordinate in pixels.
    pub bottom: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(left: i32, bottom: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            bottom,
            width,
            height,
        }
    }

    /// Create a viewport from dimensions with origin at (0, 0).
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i64 {
        i64::from(self.left) + i64::from(self.width)
    }

    /// Top edge (exclusive).
    pub fn top(&self) -> i64 {
        i64::from(self.bottom) + i64::from(self.height)
    }

    /// Returns true if the viewport covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ============================================================================
// Render targets
// ============================================================================

bitflags! {
    /// Selects buffers of a render target.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TargetBufferFlags: u32 {
        const COLOR0 = 1 << 0;
        const COLOR1 = 1 << 1;
        const COLOR2 = 1 << 2;
        const COLOR3 = 1 << 3;
        const COLOR4 = 1 << 4;
        const COLOR5 = 1 << 5;
        const COLOR6 = 1 << 6;
        const COLOR7 = 1 << 7;
        /// All color attachments.
        const COLOR_ALL = 0xff;
        /// Depth attachment.
        const DEPTH = 1 << 8;
        /// Stencil attachment.
        const STENCIL = 1 << 9;
        /// Depth and stencil attachments.
        const DEPTH_AND_STENCIL = Self::DEPTH.bits() | Self::STENCIL.bits();
        /// Every attachment.
        const ALL = Self::COLOR_ALL.bits() | Self::DEPTH_AND_STENCIL.bits();
    }
}

impl Default for TargetBufferFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl TargetBufferFlags {
    /// Flag for color attachment `index`.
    pub fn color(index: usize) -> Self {
        debug_assert!(index < MAX_SUPPORTED_RENDER_TARGET_COUNT);
        Self::from_bits_truncate(1 << index) & Self::COLOR_ALL
    }
}

/// One attachment of a render target: a texture mip level and layer.
///
/// A plain value type; it crosses the thread boundary by copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TargetBufferInfo {
    /// Texture backing the attachment, or nil for none.
    pub handle: Handle<HwTexture>,
    /// Mip level.
    pub level: u8,
    /// Array layer or cubemap face.
    pub layer: u16,
}

impl TargetBufferInfo {
    /// Attachment for mip level 0, layer 0 of `handle`.
    pub fn new(handle: Handle<HwTexture>) -> Self {
        Self {
            handle,
            level: 0,
            layer: 0,
        }
    }

    /// Set the mip level.
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    /// Set the layer.
    pub fn with_layer(mut self, layer: u16) -> Self {
        self.layer = layer;
        self
    }
}

/// Multiple render target color attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mrt {
    attachments: [TargetBufferInfo; MAX_SUPPORTED_RENDER_TARGET_COUNT],
}

impl Mrt {
    /// Single color attachment at index 0.
    pub fn single(color: TargetBufferInfo) -> Self {
        let mut mrt = Self::default();
        mrt.attachments[0] = color;
        mrt
    }

    /// Set attachment `index`. Out-of-range indices are ignored.
    pub fn with(mut self, index: usize, color: TargetBufferInfo) -> Self {
        if let Some(slot) = self.attachments.get_mut(index) {
            *slot = color;
        }
        self
    }

    /// Attachment at `index`.
    pub fn get(&self, index: usize) -> Option<&TargetBufferInfo> {
        self.attachments.get(index)
    }

    /// Flags of the attachments that reference a texture.
    pub fn color_flags(&self) -> TargetBufferFlags {
        self.attachments
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.handle.is_nil())
            .fold(TargetBufferFlags::empty(), |flags, (i, _)| {
                flags | TargetBufferFlags::color(i)
            })
    }

    /// Iterate over all attachment slots.
    pub fn iter(&self) -> impl Iterator<Item = &TargetBufferInfo> {
        self.attachments.iter()
    }
}

/// Load/store behavior of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderPassFlags {
    /// Buffers cleared at the start of the pass.
    pub clear: TargetBufferFlags,
    /// Buffers whose previous content may be discarded at the start.
    pub discard_start: TargetBufferFlags,
    /// Buffers whose content may be discarded at the end.
    pub discard_end: TargetBufferFlags,
}

/// Parameters for beginning a render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassParams {
    /// Load/store behavior.
    pub flags: RenderPassFlags,
    /// Viewport for the pass.
    pub viewport: Viewport,
    /// Clear color (RGBA).
    pub clear_color: [f32; 4],
    /// Clear depth.
    pub clear_depth: f64,
    /// Clear stencil value.
    pub clear_stencil: u32,
}

impl Default for RenderPassParams {
    fn default() -> Self {
        Self {
            flags: RenderPassFlags::default(),
            viewport: Viewport::default(),
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

impl RenderPassParams {
    /// Parameters rendering to `viewport` without clearing.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    /// Clear the given buffers at the start of the pass.
    pub fn with_clear(mut self, clear: TargetBufferFlags) -> Self {
        self.flags.clear = clear;
        self
    }

    /// Set the clear color.
    pub fn with_clear_color(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.clear_color = [r, g, b, a];
        self
    }
}

// ============================================================================
// Misc enums
// ============================================================================

/// Primitive topology of a render primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}

/// Shader feature level exposed by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderModel {
    /// Mobile-class GPUs.
    Mobile,
    /// Desktop-class GPUs.
    Desktop,
}

/// Result of a fence query or wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FenceStatus {
    /// The handle does not name a fence.
    Error,
    /// All work recorded before the fence has executed.
    ConditionSatisfied,
    /// The fence was not reached before the timeout.
    TimeoutExpired,
}

/// Opaque platform object (native window, external stream, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeHandle(pub u64);

bitflags! {
    /// Swap chain creation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SwapChainFlags: u64 {
        /// The surface is composited with transparency.
        const TRANSPARENT = 1 << 0;
        /// The swap chain content can be read back.
        const READABLE = 1 << 1;
        /// The swap chain has a stencil buffer.
        const HAS_STENCIL_BUFFER = 1 << 2;
    }
}

impl Default for SwapChainFlags {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_edges() {
        let vp = Viewport::new(-10, 5, 100, 50);
        assert_eq!(vp.right(), 90);
        assert_eq!(vp.top(), 55);
        assert!(!vp.is_empty());
        assert!(Viewport::default().is_empty());
    }

    #[test]
    fn test_target_flags() {
        assert_eq!(TargetBufferFlags::color(0), TargetBufferFlags::COLOR0);
        assert_eq!(TargetBufferFlags::color(7), TargetBufferFlags::COLOR7);
        assert!(TargetBufferFlags::ALL.contains(TargetBufferFlags::STENCIL));
        assert!(!TargetBufferFlags::COLOR_ALL.contains(TargetBufferFlags::DEPTH));
    }

    #[test]
    fn test_mrt_color_flags() {
        let mrt = Mrt::single(TargetBufferInfo::new(Handle::new(1)))
            .with(2, TargetBufferInfo::new(Handle::new(4)).with_level(1));
        assert_eq!(
            mrt.color_flags(),
            TargetBufferFlags::COLOR0 | TargetBufferFlags::COLOR2
        );
        assert_eq!(mrt.get(2).map(|a| a.level), Some(1));
        assert_eq!(Mrt::default().color_flags(), TargetBufferFlags::empty());
    }

    #[test]
    fn test_render_pass_params_builder() {
        let params = RenderPassParams::new(Viewport::from_dimensions(640, 480))
            .with_clear(TargetBufferFlags::COLOR0 | TargetBufferFlags::DEPTH)
            .with_clear_color(1.0, 0.0, 0.0, 1.0);
        assert_eq!(params.viewport.width, 640);
        assert!(params.flags.clear.contains(TargetBufferFlags::DEPTH));
        assert_eq!(params.clear_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(params.clear_depth, 1.0);
    }
}
