//! Command recording and playback.
//!
//! Fire-and-forget driver calls are recorded as [`Command`] values by a
//! [`CommandStream`], batched in a [`CommandBuffer`], and replayed in FIFO
//! order by a [`Dispatcher`], either inline or on a [`RenderThread`].
//!
//! # Architecture
//!
//! ```text
//! main thread                          render thread
//! ───────────                          ─────────────
//! CommandStream::create_texture()
//!   ├─ HandleAllocator::allocate()  (Pending)
//!   └─ CommandBuffer::push(CreateTexture)
//! CommandStream::flush() ──mpsc Vec<Command>──► Dispatcher::dispatch()
//!                                                └─ Driver::execute()
//!                                                     └─ construct()  (Live)
//! ```

mod dispatcher;
mod render_thread;
mod return_slot;
mod stream;

pub use dispatcher::Dispatcher;
pub use render_thread::RenderThread;
pub use return_slot::ReturnSlot;
pub use stream::CommandStream;

use lumen_core::Handle;
use lumen_core::texture::{SamplerType, TextureFormat, TextureUsage};

use crate::hw::{
    HwBufferObject, HwFence, HwIndexBuffer, HwProgram, HwRenderPrimitive, HwRenderTarget,
    HwSamplerGroup, HwStream, HwSwapChain, HwTexture, HwVertexBuffer,
};
use crate::sampler_buffer::SamplerBuffer;
use crate::types::{
    AttributeArray, BufferDescriptor, BufferObjectBinding, BufferUsage, IndexType, Mrt,
    NativeHandle, PipelineState, PixelBufferDescriptor, PrimitiveType, Program, RenderPassParams,
    SwapChainFlags, TargetBufferFlags, TargetBufferInfo,
};

/// One recorded driver call.
///
/// Payload-carrying variants own their data; it travels to the render thread
/// by move. Create variants carry the handle allocated at record time.
#[derive(Debug)]
pub enum Command {
    // Frame control
    BeginFrame {
        frame_id: u32,
        monotonic_clock_ns: u64,
    },
    EndFrame {
        frame_id: u32,
    },
    Flush,

    // Creation
    CreateVertexBuffer {
        handle: Handle<HwVertexBuffer>,
        buffer_count: u8,
        attribute_count: u8,
        vertex_count: u32,
        attributes: AttributeArray,
        usage: BufferUsage,
    },
    CreateIndexBuffer {
        handle: Handle<HwIndexBuffer>,
        index_type: IndexType,
        index_count: u32,
        usage: BufferUsage,
    },
    CreateBufferObject {
        handle: Handle<HwBufferObject>,
        byte_count: u32,
        binding: BufferObjectBinding,
        usage: BufferUsage,
    },
    CreateRenderPrimitive {
        handle: Handle<HwRenderPrimitive>,
    },
    CreateProgram {
        handle: Handle<HwProgram>,
        program: Program,
    },
    CreateSamplerGroup {
        handle: Handle<HwSamplerGroup>,
        size: usize,
    },
    CreateTexture {
        handle: Handle<HwTexture>,
        target: SamplerType,
        levels: u8,
        format: TextureFormat,
        samples: u8,
        width: u32,
        height: u32,
        depth: u32,
        usage: TextureUsage,
    },
    CreateDefaultRenderTarget {
        handle: Handle<HwRenderTarget>,
    },
    CreateRenderTarget {
        handle: Handle<HwRenderTarget>,
        targets: TargetBufferFlags,
        width: u32,
        height: u32,
        samples: u8,
        color: Mrt,
        depth: TargetBufferInfo,
        stencil: TargetBufferInfo,
    },
    CreateFence {
        handle: Handle<HwFence>,
    },
    CreateSwapChain {
        handle: Handle<HwSwapChain>,
        native_window: NativeHandle,
        flags: SwapChainFlags,
        width: u32,
        height: u32,
    },
    CreateStream {
        handle: Handle<HwStream>,
        stream: NativeHandle,
        width: u32,
        height: u32,
    },

    // Destruction
    DestroyVertexBuffer(Handle<HwVertexBuffer>),
    DestroyIndexBuffer(Handle<HwIndexBuffer>),
    DestroyBufferObject(Handle<HwBufferObject>),
    DestroyRenderPrimitive(Handle<HwRenderPrimitive>),
    DestroyProgram(Handle<HwProgram>),
    DestroySamplerGroup(Handle<HwSamplerGroup>),
    DestroyTexture(Handle<HwTexture>),
    DestroyRenderTarget(Handle<HwRenderTarget>),
    DestroyFence(Handle<HwFence>),
    DestroySwapChain(Handle<HwSwapChain>),
    DestroyStream(Handle<HwStream>),

    // Updates
    UpdateVertexBuffer {
        handle: Handle<HwVertexBuffer>,
        index: u8,
        data: BufferDescriptor,
        byte_offset: u32,
    },
    UpdateIndexBuffer {
        handle: Handle<HwIndexBuffer>,
        data: BufferDescriptor,
        byte_offset: u32,
    },
    UpdateBufferObject {
        handle: Handle<HwBufferObject>,
        data: BufferDescriptor,
        byte_offset: u32,
    },
    Update3dImage {
        handle: Handle<HwTexture>,
        level: u8,
        x_offset: u32,
        y_offset: u32,
        z_offset: u32,
        width: u32,
        height: u32,
        depth: u32,
        data: PixelBufferDescriptor,
    },
    GenerateMipmaps(Handle<HwTexture>),
    SetExternalStream {
        texture: Handle<HwTexture>,
        stream: Handle<HwStream>,
    },
    UpdateSamplerGroup {
        handle: Handle<HwSamplerGroup>,
        samplers: SamplerBuffer,
    },

    // Bindings
    BindUniformBuffer {
        index: u8,
        buffer: Handle<HwBufferObject>,
    },
    BindSamplers {
        index: u8,
        group: Handle<HwSamplerGroup>,
    },
    SetRenderPrimitiveBuffer {
        handle: Handle<HwRenderPrimitive>,
        vertex_buffer: Handle<HwVertexBuffer>,
        index_buffer: Handle<HwIndexBuffer>,
    },
    SetRenderPrimitiveRange {
        handle: Handle<HwRenderPrimitive>,
        primitive_type: PrimitiveType,
        offset: u32,
        min_index: u32,
        max_index: u32,
        count: u32,
    },

    // Passes and drawing
    BeginRenderPass {
        target: Handle<HwRenderTarget>,
        params: RenderPassParams,
    },
    EndRenderPass,
    MakeCurrent {
        draw: Handle<HwSwapChain>,
        read: Handle<HwSwapChain>,
    },
    Commit(Handle<HwSwapChain>),
    Draw {
        pipeline: PipelineState,
        primitive: Handle<HwRenderPrimitive>,
        instance_count: u32,
    },

    // Readback
    ReadPixels {
        target: Handle<HwRenderTarget>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        data: PixelBufferDescriptor,
    },
    ReadBufferObject {
        handle: Handle<HwBufferObject>,
        byte_offset: u32,
        byte_count: u32,
        result: ReturnSlot<Vec<u8>>,
    },
    QueryRenderTargetSize {
        target: Handle<HwRenderTarget>,
        result: ReturnSlot<Option<(u32, u32)>>,
    },
}

/// Payload-free tag of a [`Command`], for logs and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    BeginFrame,
    EndFrame,
    Flush,
    CreateVertexBuffer,
    CreateIndexBuffer,
    CreateBufferObject,
    CreateRenderPrimitive,
    CreateProgram,
    CreateSamplerGroup,
    CreateTexture,
    CreateDefaultRenderTarget,
    CreateRenderTarget,
    CreateFence,
    CreateSwapChain,
    CreateStream,
    DestroyVertexBuffer,
    DestroyIndexBuffer,
    DestroyBufferObject,
    DestroyRenderPrimitive,
    DestroyProgram,
    DestroySamplerGroup,
    DestroyTexture,
    DestroyRenderTarget,
    DestroyFence,
    DestroySwapChain,
    DestroyStream,
    UpdateVertexBuffer,
    UpdateIndexBuffer,
    UpdateBufferObject,
    Update3dImage,
    GenerateMipmaps,
    SetExternalStream,
    UpdateSamplerGroup,
    BindUniformBuffer,
    BindSamplers,
    SetRenderPrimitiveBuffer,
    SetRenderPrimitiveRange,
    BeginRenderPass,
    EndRenderPass,
    MakeCurrent,
    Commit,
    Draw,
    ReadPixels,
    ReadBufferObject,
    QueryRenderTargetSize,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::BeginFrame { .. } => CommandKind::BeginFrame,
            Self::EndFrame { .. } => CommandKind::EndFrame,
            Self::Flush => CommandKind::Flush,
            Self::CreateVertexBuffer { .. } => CommandKind::CreateVertexBuffer,
            Self::CreateIndexBuffer { .. } => CommandKind::CreateIndexBuffer,
            Self::CreateBufferObject { .. } => CommandKind::CreateBufferObject,
            Self::CreateRenderPrimitive { .. } => CommandKind::CreateRenderPrimitive,
            Self::CreateProgram { .. } => CommandKind::CreateProgram,
            Self::CreateSamplerGroup { .. } => CommandKind::CreateSamplerGroup,
            Self::CreateTexture { .. } => CommandKind::CreateTexture,
            Self::CreateDefaultRenderTarget { .. } => CommandKind::CreateDefaultRenderTarget,
            Self::CreateRenderTarget { .. } => CommandKind::CreateRenderTarget,
            Self::CreateFence { .. } => CommandKind::CreateFence,
            Self::CreateSwapChain { .. } => CommandKind::CreateSwapChain,
            Self::CreateStream { .. } => CommandKind::CreateStream,
            Self::DestroyVertexBuffer(_) => CommandKind::DestroyVertexBuffer,
            Self::DestroyIndexBuffer(_) => CommandKind::DestroyIndexBuffer,
            Self::DestroyBufferObject(_) => CommandKind::DestroyBufferObject,
            Self::DestroyRenderPrimitive(_) => CommandKind::DestroyRenderPrimitive,
            Self::DestroyProgram(_) => CommandKind::DestroyProgram,
            Self::DestroySamplerGroup(_) => CommandKind::DestroySamplerGroup,
            Self::DestroyTexture(_) => CommandKind::DestroyTexture,
            Self::DestroyRenderTarget(_) => CommandKind::DestroyRenderTarget,
            Self::DestroyFence(_) => CommandKind::DestroyFence,
            Self::DestroySwapChain(_) => CommandKind::DestroySwapChain,
            Self::DestroyStream(_) => CommandKind::DestroyStream,
            Self::UpdateVertexBuffer { .. } => CommandKind::UpdateVertexBuffer,
            Self::UpdateIndexBuffer { .. } => CommandKind::UpdateIndexBuffer,
            Self::UpdateBufferObject { .. } => CommandKind::UpdateBufferObject,
            Self::Update3dImage { .. } => CommandKind::Update3dImage,
            Self::GenerateMipmaps(_) => CommandKind::GenerateMipmaps,
            Self::SetExternalStream { .. } => CommandKind::SetExternalStream,
            Self::UpdateSamplerGroup { .. } => CommandKind::UpdateSamplerGroup,
            Self::BindUniformBuffer { .. } => CommandKind::BindUniformBuffer,
            Self::BindSamplers { .. } => CommandKind::BindSamplers,
            Self::SetRenderPrimitiveBuffer { .. } => CommandKind::SetRenderPrimitiveBuffer,
            Self::SetRenderPrimitiveRange { .. } => CommandKind::SetRenderPrimitiveRange,
            Self::BeginRenderPass { .. } => CommandKind::BeginRenderPass,
            Self::EndRenderPass => CommandKind::EndRenderPass,
            Self::MakeCurrent { .. } => CommandKind::MakeCurrent,
            Self::Commit(_) => CommandKind::Commit,
            Self::Draw { .. } => CommandKind::Draw,
            Self::ReadPixels { .. } => CommandKind::ReadPixels,
            Self::ReadBufferObject { .. } => CommandKind::ReadBufferObject,
            Self::QueryRenderTargetSize { .. } => CommandKind::QueryRenderTargetSize,
        }
    }
}

static_assertions::assert_impl_all!(Command: Send);

// ============================================================================
// CommandBuffer
// ============================================================================

/// Commands recorded since the last flush.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take every recorded command, leaving the buffer empty with the same capacity.
    pub fn take(&mut self) -> Vec<Command> {
        let capacity = self.commands.capacity();
        std::mem::replace(&mut self.commands, Vec::with_capacity(capacity))
    }

    /// Put a batch that could not be submitted back in front of newer commands.
    pub(crate) fn restore(&mut self, mut batch: Vec<Command>) {
        batch.append(&mut self.commands);
        self.commands = batch;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Command::Flush.kind(), CommandKind::Flush);
        assert_eq!(
            Command::DestroyTexture(Handle::new(3)).kind(),
            CommandKind::DestroyTexture
        );
        assert_eq!(format!("{:?}", CommandKind::BeginRenderPass), "BeginRenderPass");
    }

    #[test]
    fn test_take_keeps_capacity() {
        let mut buffer = CommandBuffer::with_capacity(16);
        buffer.push(Command::Flush);
        buffer.push(Command::EndRenderPass);
        let batch = buffer.take();
        assert_eq!(batch.len(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.commands.capacity() >= 16);
    }

    #[test]
    fn test_restore_preserves_order() {
        let mut buffer = CommandBuffer::new();
        buffer.push(Command::Flush);
        let batch = buffer.take();
        buffer.push(Command::EndRenderPass);
        buffer.restore(batch);
        let kinds: Vec<_> = buffer.iter().map(Command::kind).collect();
        assert_eq!(kinds, vec![CommandKind::Flush, CommandKind::EndRenderPass]);
    }
}
