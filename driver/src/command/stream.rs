//! Client-side recorder for driver calls.

use std::sync::Arc;
use std::time::Duration;

use lumen_core::Handle;
use lumen_core::texture::{SamplerType, TextureFormat, TextureUsage};

use super::{Command, CommandBuffer, Dispatcher, RenderThread, ReturnSlot};
use crate::backend::{Driver, create_driver};
use crate::config::{DriverConfig, ThreadingMode};
use crate::error::DriverError;
use crate::hw::{
    HandleAllocator, HwBufferObject, HwFence, HwIndexBuffer, HwProgram, HwRenderPrimitive,
    HwRenderTarget, HwResource, HwSamplerGroup, HwStream, HwSwapChain, HwTexture, HwVertexBuffer,
};
use crate::sampler_buffer::SamplerBuffer;
use crate::types::{
    AttributeArray, BufferDescriptor, BufferObjectBinding, BufferUsage, FenceStatus, IndexType,
    Mrt, NativeHandle, PipelineState, PixelBufferDescriptor, PrimitiveType, Program,
    RenderPassParams, ShaderModel, SwapChainFlags, TargetBufferFlags, TargetBufferInfo,
};

enum Executor {
    Inline(Dispatcher),
    Threaded(RenderThread),
}

/// Records fire-and-forget driver calls and submits them in FIFO order.
///
/// Create calls allocate their handle immediately; the resource behind it is
/// built when the command executes. Destroy calls retire the handle
/// immediately; the slot is freed when the command executes. Commands are
/// submitted on [`flush`](Self::flush), on [`finish`](Self::finish), when the
/// pending buffer reaches `DriverConfig::command_buffer_capacity`, and on drop.
///
/// # Example
///
/// ```
/// use lumen_driver::{BufferDescriptor, BufferObjectBinding, BufferUsage, CommandStream, DriverConfig};
///
/// let mut stream = CommandStream::new(DriverConfig::default()).unwrap();
/// let ubo = stream.create_buffer_object(16, BufferObjectBinding::Uniform, BufferUsage::Dynamic);
/// stream.update_buffer_object(ubo, BufferDescriptor::new(vec![1; 16]), 0);
/// let bytes = stream.read_buffer_object(ubo, 0, 4);
/// stream.finish().unwrap();
/// assert_eq!(bytes.try_take(), Some(vec![1; 4]));
/// ```
pub struct CommandStream {
    driver: Arc<dyn Driver>,
    allocator: HandleAllocator,
    pending: CommandBuffer,
    capacity: usize,
    executor: Executor,
}

impl CommandStream {
    /// Create the driver named by `config` and a stream feeding it.
    pub fn new(config: DriverConfig) -> Result<Self, DriverError> {
        let driver = create_driver(&config)?;
        Self::with_driver(driver, config)
    }

    /// Create a stream feeding an existing driver.
    pub fn with_driver(driver: Arc<dyn Driver>, config: DriverConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let dispatcher = Dispatcher::new(driver.clone());
        let executor = match config.threading {
            ThreadingMode::Inline => Executor::Inline(dispatcher),
            ThreadingMode::RenderThread => {
                Executor::Threaded(RenderThread::spawn(&config.render_thread_name, dispatcher)?)
            }
        };
        log::info!(
            "CommandStream: {} backend, {:?} threading, capacity {}",
            driver.name(),
            config.threading,
            config.command_buffer_capacity
        );
        Ok(Self {
            allocator: driver.handle_allocator().clone(),
            driver,
            pending: CommandBuffer::with_capacity(config.command_buffer_capacity),
            capacity: config.command_buffer_capacity,
            executor,
        })
    }

    /// The backend commands are dispatched to.
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Shared resource tables, for inspecting resource state.
    pub fn handle_allocator(&self) -> &HandleAllocator {
        &self.allocator
    }

    /// Where recorded commands execute.
    pub fn threading(&self) -> ThreadingMode {
        match self.executor {
            Executor::Inline(_) => ThreadingMode::Inline,
            Executor::Threaded(_) => ThreadingMode::RenderThread,
        }
    }

    /// Number of commands recorded but not yet submitted.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submit every pending command for execution.
    ///
    /// Inline streams execute the batch before returning. If the render
    /// thread is gone, the batch stays pending and the call fails.
    pub fn flush(&mut self) -> Result<(), DriverError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = self.pending.take();
        log::trace!("CommandStream: submitting {} command(s)", batch.len());
        match &self.executor {
            Executor::Inline(dispatcher) => {
                dispatcher.dispatch_batch(batch);
                Ok(())
            }
            Executor::Threaded(thread) => thread.submit(batch).map_err(|batch| {
                self.pending.restore(batch);
                DriverError::RenderThreadDisconnected
            }),
        }
    }

    /// Flush, then block until everything recorded so far has executed.
    pub fn finish(&mut self) -> Result<(), DriverError> {
        self.flush()?;
        match &self.executor {
            Executor::Inline(_) => Ok(()),
            Executor::Threaded(thread) => thread.finish(),
        }
    }

    fn record(&mut self, command: Command) {
        self.pending.push(command);
        if self.pending.len() >= self.capacity
            && let Err(e) = self.flush()
        {
            log::error!("CommandStream: automatic flush failed: {}", e);
        }
    }

    fn create<T: HwResource>(&mut self, build: impl FnOnce(Handle<T>) -> Command) -> Handle<T> {
        let handle = self.allocator.allocate::<T>();
        self.record(build(handle));
        handle
    }

    fn destroy<T: HwResource>(&mut self, handle: Handle<T>, build: impl FnOnce(Handle<T>) -> Command) {
        if handle.is_nil() {
            return;
        }
        if !self.allocator.retire(handle) {
            log::warn!("CommandStream: destroying {} {} twice", T::KIND, handle.id());
            return;
        }
        self.record(build(handle));
    }

    // ========================================================================
    // Frame control
    // ========================================================================

    /// Start frame `frame_id`. The clock is passed through to the backend.
    pub fn begin_frame(&mut self, frame_id: u32, monotonic_clock_ns: u64) {
        self.record(Command::BeginFrame {
            frame_id,
            monotonic_clock_ns,
        });
    }

    /// Close frame `frame_id`.
    pub fn end_frame(&mut self, frame_id: u32) {
        self.record(Command::EndFrame { frame_id });
    }

    /// Ask the backend to push its own queued GPU work.
    pub fn driver_flush(&mut self) {
        self.record(Command::Flush);
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Allocate a vertex buffer with `buffer_count` slots and the given layout.
    pub fn create_vertex_buffer(
        &mut self,
        buffer_count: u8,
        attribute_count: u8,
        vertex_count: u32,
        attributes: AttributeArray,
        usage: BufferUsage,
    ) -> Handle<HwVertexBuffer> {
        self.create(|handle| Command::CreateVertexBuffer {
            handle,
            buffer_count,
            attribute_count,
            vertex_count,
            attributes,
            usage,
        })
    }

    /// Allocate room for `index_count` indices.
    pub fn create_index_buffer(
        &mut self,
        index_type: IndexType,
        index_count: u32,
        usage: BufferUsage,
    ) -> Handle<HwIndexBuffer> {
        self.create(|handle| Command::CreateIndexBuffer {
            handle,
            index_type,
            index_count,
            usage,
        })
    }

    /// Allocate an untyped buffer of `byte_count` bytes.
    pub fn create_buffer_object(
        &mut self,
        byte_count: u32,
        binding: BufferObjectBinding,
        usage: BufferUsage,
    ) -> Handle<HwBufferObject> {
        self.create(|handle| Command::CreateBufferObject {
            handle,
            byte_count,
            binding,
            usage,
        })
    }

    /// Empty render primitive; attach buffers with
    /// [`set_render_primitive_buffer`](Self::set_render_primitive_buffer).
    pub fn create_render_primitive(&mut self) -> Handle<HwRenderPrimitive> {
        self.create(|handle| Command::CreateRenderPrimitive { handle })
    }

    /// Link `program`.
    pub fn create_program(&mut self, program: Program) -> Handle<HwProgram> {
        self.create(|handle| Command::CreateProgram { handle, program })
    }

    /// Sampler group with `size` slots.
    pub fn create_sampler_group(&mut self, size: usize) -> Handle<HwSamplerGroup> {
        self.create(|handle| Command::CreateSamplerGroup { handle, size })
    }

    /// Allocate a texture. `levels` is clamped to the full mip chain.
    #[allow(clippy::too_many_arguments)]
    pub fn create_texture(
        &mut self,
        target: SamplerType,
        levels: u8,
        format: TextureFormat,
        samples: u8,
        width: u32,
        height: u32,
        depth: u32,
        usage: TextureUsage,
    ) -> Handle<HwTexture> {
        self.create(|handle| Command::CreateTexture {
            handle,
            target,
            levels,
            format,
            samples,
            width,
            height,
            depth,
            usage,
        })
    }

    /// Render target that follows the current swap chain.
    pub fn create_default_render_target(&mut self) -> Handle<HwRenderTarget> {
        self.create(|handle| Command::CreateDefaultRenderTarget { handle })
    }

    /// Offscreen render target with the given attachments.
    #[allow(clippy::too_many_arguments)]
    pub fn create_render_target(
        &mut self,
        targets: TargetBufferFlags,
        width: u32,
        height: u32,
        samples: u8,
        color: Mrt,
        depth: TargetBufferInfo,
        stencil: TargetBufferInfo,
    ) -> Handle<HwRenderTarget> {
        self.create(|handle| Command::CreateRenderTarget {
            handle,
            targets,
            width,
            height,
            samples,
            color,
            depth,
            stencil,
        })
    }

    /// Place a fence after everything recorded so far.
    pub fn create_fence(&mut self) -> Handle<HwFence> {
        self.create(|handle| Command::CreateFence { handle })
    }

    /// Swap chain presenting to `native_window`.
    pub fn create_swap_chain(
        &mut self,
        native_window: NativeHandle,
        flags: SwapChainFlags,
    ) -> Handle<HwSwapChain> {
        self.create(|handle| Command::CreateSwapChain {
            handle,
            native_window,
            flags,
            width: 0,
            height: 0,
        })
    }

    /// Swap chain backed by an offscreen surface.
    pub fn create_swap_chain_headless(
        &mut self,
        width: u32,
        height: u32,
        flags: SwapChainFlags,
    ) -> Handle<HwSwapChain> {
        self.create(|handle| Command::CreateSwapChain {
            handle,
            native_window: NativeHandle::default(),
            flags,
            width,
            height,
        })
    }

    /// Wrap an external image stream of the given frame size.
    pub fn create_stream(&mut self, stream: NativeHandle, width: u32, height: u32) -> Handle<HwStream> {
        self.create(|handle| Command::CreateStream {
            handle,
            stream,
            width,
            height,
        })
    }

    // ========================================================================
    // Destruction
    // ========================================================================

    /// Release a vertex buffer. Nil handles are ignored.
    pub fn destroy_vertex_buffer(&mut self, handle: Handle<HwVertexBuffer>) {
        self.destroy(handle, Command::DestroyVertexBuffer);
    }

    /// Release an index buffer.
    pub fn destroy_index_buffer(&mut self, handle: Handle<HwIndexBuffer>) {
        self.destroy(handle, Command::DestroyIndexBuffer);
    }

    /// Release a buffer object.
    pub fn destroy_buffer_object(&mut self, handle: Handle<HwBufferObject>) {
        self.destroy(handle, Command::DestroyBufferObject);
    }

    /// Release a render primitive. Its buffers stay alive.
    pub fn destroy_render_primitive(&mut self, handle: Handle<HwRenderPrimitive>) {
        self.destroy(handle, Command::DestroyRenderPrimitive);
    }

    /// Release a program.
    pub fn destroy_program(&mut self, handle: Handle<HwProgram>) {
        self.destroy(handle, Command::DestroyProgram);
    }

    /// Release a sampler group.
    pub fn destroy_sampler_group(&mut self, handle: Handle<HwSamplerGroup>) {
        self.destroy(handle, Command::DestroySamplerGroup);
    }

    /// Release a texture. An attached stream stays alive.
    pub fn destroy_texture(&mut self, handle: Handle<HwTexture>) {
        self.destroy(handle, Command::DestroyTexture);
    }

    /// Release a render target.
    pub fn destroy_render_target(&mut self, handle: Handle<HwRenderTarget>) {
        self.destroy(handle, Command::DestroyRenderTarget);
    }

    /// Release a fence. Later status queries report an error.
    pub fn destroy_fence(&mut self, handle: Handle<HwFence>) {
        self.destroy(handle, Command::DestroyFence);
    }

    /// Release a swap chain.
    pub fn destroy_swap_chain(&mut self, handle: Handle<HwSwapChain>) {
        self.destroy(handle, Command::DestroySwapChain);
    }

    /// Release an external stream.
    pub fn destroy_stream(&mut self, handle: Handle<HwStream>) {
        self.destroy(handle, Command::DestroyStream);
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Upload into buffer slot `index` of a vertex buffer.
    pub fn update_vertex_buffer(
        &mut self,
        handle: Handle<HwVertexBuffer>,
        index: u8,
        data: BufferDescriptor,
        byte_offset: u32,
    ) {
        self.record(Command::UpdateVertexBuffer {
            handle,
            index,
            data,
            byte_offset,
        });
    }

    /// Upload indices at `byte_offset`.
    pub fn update_index_buffer(
        &mut self,
        handle: Handle<HwIndexBuffer>,
        data: BufferDescriptor,
        byte_offset: u32,
    ) {
        self.record(Command::UpdateIndexBuffer {
            handle,
            data,
            byte_offset,
        });
    }

    /// Upload bytes at `byte_offset`.
    pub fn update_buffer_object(
        &mut self,
        handle: Handle<HwBufferObject>,
        data: BufferDescriptor,
        byte_offset: u32,
    ) {
        self.record(Command::UpdateBufferObject {
            handle,
            data,
            byte_offset,
        });
    }

    /// Upload a box of texels into mip `level`.
    #[allow(clippy::too_many_arguments)]
    pub fn update_3d_image(
        &mut self,
        handle: Handle<HwTexture>,
        level: u8,
        x_offset: u32,
        y_offset: u32,
        z_offset: u32,
        width: u32,
        height: u32,
        depth: u32,
        data: PixelBufferDescriptor,
    ) {
        self.record(Command::Update3dImage {
            handle,
            level,
            x_offset,
            y_offset,
            z_offset,
            width,
            height,
            depth,
            data,
        });
    }

    /// Extend the texture to its full mip chain.
    pub fn generate_mipmaps(&mut self, handle: Handle<HwTexture>) {
        self.record(Command::GenerateMipmaps(handle));
    }

    /// Feed `texture` from `stream`; a nil stream detaches it.
    pub fn set_external_stream(&mut self, texture: Handle<HwTexture>, stream: Handle<HwStream>) {
        self.record(Command::SetExternalStream { texture, stream });
    }

    /// Apply the dirty slots of `samplers`, usually from
    /// [`SamplerBuffer::to_command_stream`].
    pub fn update_sampler_group(&mut self, handle: Handle<HwSamplerGroup>, samplers: SamplerBuffer) {
        self.record(Command::UpdateSamplerGroup { handle, samplers });
    }

    // ========================================================================
    // Bindings
    // ========================================================================

    /// Bind `buffer` to uniform binding `index`.
    pub fn bind_uniform_buffer(&mut self, index: u8, buffer: Handle<HwBufferObject>) {
        self.record(Command::BindUniformBuffer { index, buffer });
    }

    /// Bind `group` to sampler binding `index`.
    pub fn bind_samplers(&mut self, index: u8, group: Handle<HwSamplerGroup>) {
        self.record(Command::BindSamplers { index, group });
    }

    /// Attach vertex and index buffers to a render primitive.
    pub fn set_render_primitive_buffer(
        &mut self,
        handle: Handle<HwRenderPrimitive>,
        vertex_buffer: Handle<HwVertexBuffer>,
        index_buffer: Handle<HwIndexBuffer>,
    ) {
        self.record(Command::SetRenderPrimitiveBuffer {
            handle,
            vertex_buffer,
            index_buffer,
        });
    }

    /// Set the index range and topology drawn by a render primitive.
    pub fn set_render_primitive_range(
        &mut self,
        handle: Handle<HwRenderPrimitive>,
        primitive_type: PrimitiveType,
        offset: u32,
        min_index: u32,
        max_index: u32,
        count: u32,
    ) {
        self.record(Command::SetRenderPrimitiveRange {
            handle,
            primitive_type,
            offset,
            min_index,
            max_index,
            count,
        });
    }

    // ========================================================================
    // Passes and drawing
    // ========================================================================

    /// Start rendering into `target`.
    pub fn begin_render_pass(&mut self, target: Handle<HwRenderTarget>, params: RenderPassParams) {
        self.record(Command::BeginRenderPass { target, params });
    }

    /// Close the current render pass.
    pub fn end_render_pass(&mut self) {
        self.record(Command::EndRenderPass);
    }

    /// Make `draw` the presentation target. A nil `read` reads from `draw`.
    pub fn make_current(&mut self, draw: Handle<HwSwapChain>, read: Handle<HwSwapChain>) {
        self.record(Command::MakeCurrent { draw, read });
    }

    /// Present `swap_chain`.
    pub fn commit(&mut self, swap_chain: Handle<HwSwapChain>) {
        self.record(Command::Commit(swap_chain));
    }

    /// Draw `primitive` with `pipeline`. Ignored outside a render pass.
    pub fn draw(
        &mut self,
        pipeline: PipelineState,
        primitive: Handle<HwRenderPrimitive>,
        instance_count: u32,
    ) {
        self.record(Command::Draw {
            pipeline,
            primitive,
            instance_count,
        });
    }

    // ========================================================================
    // Readback
    // ========================================================================

    /// Read a region of `target` into `data`.
    ///
    /// The pixels arrive through `data`'s release callback after the command
    /// has executed and [`purge`](Self::purge) has run.
    pub fn read_pixels(
        &mut self,
        target: Handle<HwRenderTarget>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        data: PixelBufferDescriptor,
    ) {
        self.record(Command::ReadPixels {
            target,
            x,
            y,
            width,
            height,
            data,
        });
    }

    /// Copy part of a buffer object back to the caller.
    pub fn read_buffer_object(
        &mut self,
        handle: Handle<HwBufferObject>,
        byte_offset: u32,
        byte_count: u32,
    ) -> ReturnSlot<Vec<u8>> {
        let result = ReturnSlot::new();
        self.record(Command::ReadBufferObject {
            handle,
            byte_offset,
            byte_count,
            result: result.clone(),
        });
        result
    }

    /// Width and height of `target`, as seen by the render thread.
    pub fn query_render_target_size(
        &mut self,
        target: Handle<HwRenderTarget>,
    ) -> ReturnSlot<Option<(u32, u32)>> {
        let result = ReturnSlot::new();
        self.record(Command::QueryRenderTargetSize {
            target,
            result: result.clone(),
        });
        result
    }

    // ========================================================================
    // Synchronous
    // ========================================================================

    /// Shader model of the backend.
    pub fn shader_model(&self) -> ShaderModel {
        self.driver.shader_model()
    }

    /// True if `format` can be sampled.
    pub fn is_texture_format_supported(&self, format: TextureFormat) -> bool {
        self.driver.is_texture_format_supported(format)
    }

    /// True if mipmaps can be generated for `format`.
    pub fn is_texture_format_mipmappable(&self, format: TextureFormat) -> bool {
        self.driver.is_texture_format_mipmappable(format)
    }

    /// True if `format` can be rendered into.
    pub fn is_render_target_format_supported(&self, format: TextureFormat) -> bool {
        self.driver.is_render_target_format_supported(format)
    }

    /// Number of color attachments a render target may use.
    pub fn max_draw_buffers(&self) -> usize {
        self.driver.max_draw_buffers()
    }

    /// Current state of `fence`, without waiting.
    pub fn fence_status(&self, fence: Handle<HwFence>) -> FenceStatus {
        self.driver.fence_status(fence)
    }

    /// Block until the fence's create command has executed.
    ///
    /// Does not flush: a fence still in the pending buffer times out.
    pub fn wait_fence(&self, fence: Handle<HwFence>, timeout: Duration) -> FenceStatus {
        self.driver.wait_fence(fence, timeout)
    }

    /// Run release callbacks queued by executed commands.
    pub fn purge(&self) -> usize {
        self.driver.purge()
    }
}

impl Drop for CommandStream {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!(
                "CommandStream: dropping {} unsubmitted command(s): {}",
                self.pending.len(),
                e
            );
        }
    }
}

impl std::fmt::Debug for CommandStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStream")
            .field("driver", &self.driver.name())
            .field("threading", &self.threading())
            .field("pending", &self.pending.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(all(test, feature = "noop"))]
mod tests {
    use super::*;
    use crate::backend::noop::NoopDriver;
    use crate::command::CommandKind;
    use crate::config::BackendKind;
    use lumen_core::SlotState;

    fn inline_config() -> DriverConfig {
        DriverConfig::new()
            .with_backend(BackendKind::Noop)
            .with_threading(ThreadingMode::Inline)
    }

    #[test]
    fn test_create_is_pending_until_flush() {
        let mut stream = CommandStream::new(inline_config()).expect("stream");
        let fence = stream.create_fence();
        assert_eq!(stream.handle_allocator().state(fence), SlotState::Pending);
        assert_eq!(stream.pending_len(), 1);

        stream.flush().expect("flush");
        assert_eq!(stream.handle_allocator().state(fence), SlotState::Live);
        assert_eq!(stream.pending_len(), 0);
    }

    #[test]
    fn test_destroy_retires_then_frees() {
        let mut stream = CommandStream::new(inline_config()).expect("stream");
        let texture = stream.create_texture(
            SamplerType::Sampler2d,
            1,
            TextureFormat::Rgba8,
            1,
            4,
            4,
            1,
            TextureUsage::DEFAULT,
        );
        stream.destroy_texture(texture);
        assert_eq!(stream.handle_allocator().state(texture), SlotState::Retiring);

        stream.flush().expect("flush");
        assert_eq!(stream.handle_allocator().state(texture), SlotState::Vacant);
    }

    #[test]
    fn test_double_destroy_recorded_once() {
        let mut stream = CommandStream::new(inline_config()).expect("stream");
        let fence = stream.create_fence();
        stream.destroy_fence(fence);
        stream.destroy_fence(fence);
        assert_eq!(stream.pending_len(), 2);
    }

    #[test]
    fn test_capacity_triggers_flush() {
        let driver = Arc::new(NoopDriver::new(&DriverConfig::default()));
        let mut stream = CommandStream::with_driver(
            driver.clone(),
            inline_config().with_command_buffer_capacity(2),
        )
        .expect("stream");

        stream.driver_flush();
        assert!(driver.executed().is_empty());
        stream.driver_flush();
        assert_eq!(driver.executed(), vec![CommandKind::Flush, CommandKind::Flush]);
        assert_eq!(stream.pending_len(), 0);
    }

    #[test]
    fn test_drop_flushes_pending() {
        let driver = Arc::new(NoopDriver::new(&DriverConfig::default()));
        {
            let mut stream =
                CommandStream::with_driver(driver.clone(), inline_config()).expect("stream");
            stream.begin_frame(1, 0);
            stream.end_frame(1);
        }
        assert_eq!(driver.stats().frames, 1);
    }

    #[test]
    fn test_render_target_size_query() {
        let mut stream = CommandStream::new(inline_config()).expect("stream");
        let target = stream.create_render_target(
            TargetBufferFlags::COLOR0,
            64,
            32,
            1,
            Mrt::default(),
            TargetBufferInfo::default(),
            TargetBufferInfo::default(),
        );
        let size = stream.query_render_target_size(target);
        assert!(!size.is_ready());
        stream.finish().expect("finish");
        assert_eq!(size.try_take(), Some(Some((64, 32))));
    }
}
