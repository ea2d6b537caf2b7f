//! No-op backend for testing and headless use.
//!
//! Executes no GPU work but keeps the full resource lifecycle: creates
//! construct table entries, destroys free them, buffer uploads are kept for
//! readback, and render-pass state is tracked so misuse is caught and counted.

use std::collections::{HashMap, VecDeque};

use lumen_core::Handle;
use lumen_core::handle::HandleId;
use lumen_core::texture::TextureFormat;
use parking_lot::Mutex;

use super::{Driver, DriverBase};
use crate::command::{Command, CommandKind};
use crate::config::DriverConfig;
use crate::hw::{
    HandleAllocator, HwBufferObject, HwFence, HwIndexBuffer, HwProgram, HwRenderPrimitive,
    HwRenderTarget, HwResource, HwSamplerGroup, HwStream, HwSwapChain, HwTexture, HwVertexBuffer,
};
use crate::sampler_buffer::SamplerBuffer;
use crate::types::{
    BufferDescriptor, MAX_SAMPLER_GROUP_BINDINGS, MAX_SUPPORTED_RENDER_TARGET_COUNT,
    MAX_UNIFORM_BUFFER_BINDINGS, MAX_VERTEX_BUFFER_COUNT, PixelBufferDescriptor, PixelDataFormat,
    PixelDataType, ShaderModel, TargetBufferFlags,
};

/// Number of command kinds kept by [`NoopDriver::executed`].
pub const TRACE_CAPACITY: usize = 4096;

/// Counters kept by [`NoopDriver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopStats {
    /// Commands passed to `execute`.
    pub commands_executed: u64,
    /// Completed `EndFrame`s.
    pub frames: u64,
    /// Render passes begun on a live target.
    pub render_passes: u64,
    /// Draws issued inside a render pass.
    pub draw_calls: u64,
    /// Draws recorded outside a render pass.
    pub dropped_draws: u64,
    /// Swap chain presentations.
    pub commits: u64,
    /// Commands that referenced a handle with no resource behind it.
    pub stale_handles: u64,
}

struct NoopState {
    frame_id: Option<u32>,
    render_pass: Option<Handle<HwRenderTarget>>,
    draw_swap_chain: Handle<HwSwapChain>,
    read_swap_chain: Handle<HwSwapChain>,
    uniform_bindings: [Handle<HwBufferObject>; MAX_UNIFORM_BUFFER_BINDINGS],
    sampler_bindings: [Handle<HwSamplerGroup>; MAX_SAMPLER_GROUP_BINDINGS],
    buffer_contents: HashMap<HandleId, Vec<u8>>,
    clear_colors: HashMap<HandleId, [f32; 4]>,
    stats: NoopStats,
    trace: VecDeque<CommandKind>,
}

impl NoopState {
    fn new() -> Self {
        Self {
            frame_id: None,
            render_pass: None,
            draw_swap_chain: Handle::nil(),
            read_swap_chain: Handle::nil(),
            uniform_bindings: [Handle::nil(); MAX_UNIFORM_BUFFER_BINDINGS],
            sampler_bindings: [Handle::nil(); MAX_SAMPLER_GROUP_BINDINGS],
            buffer_contents: HashMap::new(),
            clear_colors: HashMap::new(),
            stats: NoopStats::default(),
            trace: VecDeque::with_capacity(TRACE_CAPACITY),
        }
    }
}

/// Length of the full mip chain of a `width` x `height` image.
fn full_mip_chain(width: u32, height: u32) -> u8 {
    (u32::BITS - width.max(height).max(1).leading_zeros()) as u8
}

/// In-memory [`Driver`].
pub struct NoopDriver {
    base: DriverBase,
    allocator: HandleAllocator,
    validate_handles: bool,
    state: Mutex<NoopState>,
}

impl NoopDriver {
    pub fn new(config: &DriverConfig) -> Self {
        log::info!("NoopDriver: created (validate_handles: {})", config.validate_handles);
        Self {
            base: DriverBase::new(),
            allocator: HandleAllocator::new(),
            validate_handles: config.validate_handles,
            state: Mutex::new(NoopState::new()),
        }
    }

    pub fn stats(&self) -> NoopStats {
        self.state.lock().stats
    }

    /// Kinds of the last [`TRACE_CAPACITY`] commands executed, oldest first.
    pub fn executed(&self) -> Vec<CommandKind> {
        self.state.lock().trace.iter().copied().collect()
    }

    pub fn clear_trace(&self) {
        self.state.lock().trace.clear();
    }

    /// Target of the render pass in progress.
    pub fn current_render_pass(&self) -> Option<Handle<HwRenderTarget>> {
        self.state.lock().render_pass
    }

    pub fn current_swap_chain(&self) -> Handle<HwSwapChain> {
        self.state.lock().draw_swap_chain
    }

    pub fn uniform_binding(&self, index: usize) -> Option<Handle<HwBufferObject>> {
        self.state.lock().uniform_bindings.get(index).copied()
    }

    pub fn sampler_binding(&self, index: usize) -> Option<Handle<HwSamplerGroup>> {
        self.state.lock().sampler_bindings.get(index).copied()
    }

    fn stale<T: HwResource>(&self, state: &mut NoopState, kind: CommandKind, handle: Handle<T>) {
        state.stats.stale_handles += 1;
        if self.validate_handles {
            log::error!("NoopDriver: {:?} on stale {} {:?}", kind, T::KIND, handle);
            debug_assert!(false, "{kind:?} on stale {} {handle:?}", T::KIND);
        }
    }

    fn create<T: HwResource>(
        &self,
        state: &mut NoopState,
        kind: CommandKind,
        handle: Handle<T>,
        value: T,
    ) {
        log::trace!("NoopDriver: {:?} {}", kind, handle.id());
        if !self.allocator.construct(handle, value) {
            self.stale(state, kind, handle);
        }
    }

    fn destroy<T: HwResource>(&self, state: &mut NoopState, kind: CommandKind, handle: Handle<T>) {
        if handle.is_nil() {
            return;
        }
        log::trace!("NoopDriver: {:?} {}", kind, handle.id());
        if self.allocator.state(handle) == lumen_core::SlotState::Vacant {
            self.stale(state, kind, handle);
            return;
        }
        self.allocator.free(handle);
    }

    /// Run `f` on a live resource, counting a stale handle otherwise.
    fn update<T: HwResource, R>(
        &self,
        state: &mut NoopState,
        kind: CommandKind,
        handle: Handle<T>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let result = self.allocator.with_mut(handle, f);
        if result.is_none() {
            self.stale(state, kind, handle);
        }
        result
    }

    fn require<T: HwResource>(&self, state: &mut NoopState, kind: CommandKind, handle: Handle<T>) -> bool {
        let ok = self.allocator.is_constructed(handle);
        if !ok {
            self.stale(state, kind, handle);
        }
        ok
    }

    fn write_buffer_object(
        &self,
        state: &mut NoopState,
        handle: Handle<HwBufferObject>,
        data: &BufferDescriptor,
        byte_offset: u32,
    ) {
        let Some(byte_count) =
            self.update(state, CommandKind::UpdateBufferObject, handle, |b| b.byte_count)
        else {
            return;
        };
        let end = u64::from(byte_offset) + data.len() as u64;
        if end > u64::from(byte_count) {
            log::warn!(
                "NoopDriver: UpdateBufferObject {} writes {}..{} past {} bytes, ignored",
                handle.id(),
                byte_offset,
                end,
                byte_count
            );
            return;
        }
        let contents = state
            .buffer_contents
            .entry(handle.id())
            .or_insert_with(|| vec![0; byte_count as usize]);
        let start = byte_offset as usize;
        contents[start..start + data.len()].copy_from_slice(data.data());
    }

    fn fill_pixels(color: [f32; 4], width: u32, height: u32, data: &mut PixelBufferDescriptor) {
        if data.format != PixelDataFormat::Rgba || data.data_type != PixelDataType::UByte {
            return;
        }
        let Some(bottom) = data.top.checked_add(height) else {
            log::warn!(
                "NoopDriver: ReadPixels rows {}+{} overflow, skipped",
                data.top,
                height
            );
            return;
        };
        let stride = data.effective_stride(width);
        let row_bytes = PixelBufferDescriptor::compute_data_size(
            data.format,
            data.data_type,
            stride,
            1,
            data.alignment,
        );
        let required = PixelBufferDescriptor::compute_data_size(
            data.format,
            data.data_type,
            stride,
            bottom,
            data.alignment,
        );
        if data.buffer.len() < required {
            log::warn!(
                "NoopDriver: ReadPixels buffer holds {} bytes, {} needed",
                data.buffer.len(),
                required
            );
            return;
        }
        let texel = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let bytes = data.buffer.data_mut();
        for row in data.top..bottom {
            for column in data.left..data.left + width.min(stride.saturating_sub(data.left)) {
                let offset = row as usize * row_bytes + column as usize * 4;
                bytes[offset..offset + 4].copy_from_slice(&texel);
            }
        }
    }

    fn run(&self, state: &mut NoopState, command: Command) {
        let kind = command.kind();
        match command {
            Command::BeginFrame {
                frame_id,
                monotonic_clock_ns,
            } => {
                if let Some(current) = state.frame_id {
                    log::warn!("NoopDriver: BeginFrame {} inside frame {}", frame_id, current);
                }
                log::trace!("NoopDriver: begin frame {} at {}ns", frame_id, monotonic_clock_ns);
                state.frame_id = Some(frame_id);
            }
            Command::EndFrame { frame_id } => {
                if state.frame_id != Some(frame_id) {
                    log::warn!(
                        "NoopDriver: EndFrame {} does not match current frame {:?}",
                        frame_id,
                        state.frame_id
                    );
                }
                state.frame_id = None;
                state.stats.frames += 1;
            }
            Command::Flush => log::trace!("NoopDriver: flush"),

            Command::CreateVertexBuffer {
                handle,
                buffer_count,
                attribute_count,
                vertex_count,
                attributes,
                usage,
            } => {
                debug_assert!(usize::from(buffer_count) <= MAX_VERTEX_BUFFER_COUNT);
                let value = HwVertexBuffer {
                    attributes,
                    vertex_count,
                    buffer_count: buffer_count.min(MAX_VERTEX_BUFFER_COUNT as u8),
                    attribute_count,
                    usage,
                    buffer_sizes: [0; MAX_VERTEX_BUFFER_COUNT],
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateIndexBuffer {
                handle,
                index_type,
                index_count,
                usage,
            } => {
                let value = HwIndexBuffer {
                    index_type,
                    count: index_count,
                    usage,
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateBufferObject {
                handle,
                byte_count,
                binding,
                usage,
            } => {
                let value = HwBufferObject {
                    byte_count,
                    binding,
                    usage,
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateRenderPrimitive { handle } => {
                self.create(state, kind, handle, HwRenderPrimitive::default());
            }
            Command::CreateProgram { handle, program } => {
                let value = HwProgram {
                    name: program.name().to_string(),
                    sampler_groups: program
                        .sampler_groups()
                        .iter()
                        .map(|(binding, block)| (*binding, block.len()))
                        .collect(),
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateSamplerGroup { handle, size } => {
                let value = HwSamplerGroup {
                    samplers: Box::new(SamplerBuffer::new(size)),
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateTexture {
                handle,
                target,
                levels,
                format,
                samples,
                width,
                height,
                depth,
                usage,
            } => {
                let chain = full_mip_chain(width, height);
                if levels > chain {
                    log::warn!(
                        "NoopDriver: CreateTexture {} asks for {} levels, clamped to {}",
                        handle.id(),
                        levels,
                        chain
                    );
                }
                let value = HwTexture {
                    target,
                    levels: levels.clamp(1, chain),
                    format,
                    samples: samples.max(1),
                    width,
                    height,
                    depth: depth.max(1),
                    usage,
                    stream: None,
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateDefaultRenderTarget { handle } => {
                let value = HwRenderTarget {
                    targets: TargetBufferFlags::COLOR0 | TargetBufferFlags::DEPTH,
                    width: 0,
                    height: 0,
                    samples: 1,
                    color: Default::default(),
                    depth: Default::default(),
                    stencil: Default::default(),
                    is_default: true,
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateRenderTarget {
                handle,
                targets,
                width,
                height,
                samples,
                color,
                depth,
                stencil,
            } => {
                let value = HwRenderTarget {
                    targets,
                    width,
                    height,
                    samples: samples.max(1),
                    color,
                    depth,
                    stencil,
                    is_default: false,
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateFence { handle } => {
                let value = HwFence {
                    frame: state.stats.frames,
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateSwapChain {
                handle,
                native_window,
                flags,
                width,
                height,
            } => {
                let value = HwSwapChain {
                    native_window,
                    flags,
                    width,
                    height,
                };
                self.create(state, kind, handle, value);
            }
            Command::CreateStream {
                handle,
                stream,
                width,
                height,
            } => {
                let value = HwStream {
                    stream,
                    width,
                    height,
                };
                self.create(state, kind, handle, value);
            }

            Command::DestroyVertexBuffer(handle) => self.destroy(state, kind, handle),
            Command::DestroyIndexBuffer(handle) => self.destroy(state, kind, handle),
            Command::DestroyBufferObject(handle) => {
                state.buffer_contents.remove(&handle.id());
                self.destroy(state, kind, handle);
            }
            Command::DestroyRenderPrimitive(handle) => self.destroy(state, kind, handle),
            Command::DestroyProgram(handle) => self.destroy(state, kind, handle),
            Command::DestroySamplerGroup(handle) => self.destroy(state, kind, handle),
            Command::DestroyTexture(handle) => self.destroy(state, kind, handle),
            Command::DestroyRenderTarget(handle) => {
                if state.render_pass == Some(handle) {
                    log::warn!("NoopDriver: destroying render target {} inside its pass", handle.id());
                }
                state.clear_colors.remove(&handle.id());
                self.destroy(state, kind, handle);
            }
            Command::DestroyFence(handle) => self.destroy(state, kind, handle),
            Command::DestroySwapChain(handle) => {
                if state.draw_swap_chain == handle {
                    state.draw_swap_chain = Handle::nil();
                }
                if state.read_swap_chain == handle {
                    state.read_swap_chain = Handle::nil();
                }
                self.destroy(state, kind, handle);
            }
            Command::DestroyStream(handle) => self.destroy(state, kind, handle),

            Command::UpdateVertexBuffer {
                handle,
                index,
                data,
                byte_offset,
            } => {
                let end = u64::from(byte_offset) + data.len() as u64;
                let end = u32::try_from(end).unwrap_or(u32::MAX);
                let applied = self.update(state, kind, handle, |vb| {
                    if index >= vb.buffer_count {
                        return false;
                    }
                    let size = &mut vb.buffer_sizes[usize::from(index)];
                    *size = (*size).max(end);
                    true
                });
                if applied == Some(false) {
                    log::warn!(
                        "NoopDriver: UpdateVertexBuffer {} slot {} out of range",
                        handle.id(),
                        index
                    );
                }
                self.base.schedule_destroy(data);
            }
            Command::UpdateIndexBuffer {
                handle,
                data,
                byte_offset,
            } => {
                let end = u64::from(byte_offset) + data.len() as u64;
                if let Some(size) = self.update(state, kind, handle, |ib| ib.byte_size())
                    && end > size
                {
                    log::warn!(
                        "NoopDriver: UpdateIndexBuffer {} writes past {} bytes",
                        handle.id(),
                        size
                    );
                }
                self.base.schedule_destroy(data);
            }
            Command::UpdateBufferObject {
                handle,
                data,
                byte_offset,
            } => {
                self.write_buffer_object(state, handle, &data, byte_offset);
                self.base.schedule_destroy(data);
            }
            Command::Update3dImage {
                handle,
                level,
                x_offset,
                y_offset,
                z_offset,
                width,
                height,
                depth,
                data,
            } => {
                let in_bounds = self.update(state, kind, handle, |tex| {
                    let mip = |extent: u32| {
                        extent.checked_shr(u32::from(level)).unwrap_or(0).max(1)
                    };
                    level < tex.levels
                        && x_offset.saturating_add(width) <= mip(tex.width)
                        && y_offset.saturating_add(height) <= mip(tex.height)
                        && z_offset.saturating_add(depth) <= tex.depth
                });
                if in_bounds == Some(false) {
                    log::warn!(
                        "NoopDriver: Update3dImage {} level {} region out of bounds",
                        handle.id(),
                        level
                    );
                }
                self.base.schedule_destroy(data.buffer);
            }
            Command::GenerateMipmaps(handle) => {
                let mipmappable = self
                    .allocator
                    .with(handle, |tex| self.is_texture_format_mipmappable(tex.format));
                match mipmappable {
                    Some(true) => {
                        self.update(state, kind, handle, |tex| {
                            tex.levels = full_mip_chain(tex.width, tex.height);
                        });
                    }
                    Some(false) => log::warn!(
                        "NoopDriver: GenerateMipmaps on non-mipmappable texture {}",
                        handle.id()
                    ),
                    None => self.stale(state, kind, handle),
                }
            }
            Command::SetExternalStream { texture, stream } => {
                if !stream.is_nil() && !self.require(state, kind, stream) {
                    return;
                }
                self.update(state, kind, texture, |tex| {
                    tex.stream = (!stream.is_nil()).then_some(stream);
                });
            }
            Command::UpdateSamplerGroup { handle, samplers } => {
                self.update(state, kind, handle, |group| {
                    if group.samplers.get_size() != samplers.get_size() {
                        log::warn!(
                            "NoopDriver: UpdateSamplerGroup size {} into group of {}",
                            samplers.get_size(),
                            group.samplers.get_size()
                        );
                    }
                    for index in samplers.dirty_slots() {
                        if let Some(sampler) = samplers.get(index) {
                            group.samplers.set_sampler(index, *sampler);
                        }
                    }
                    group.samplers.clean();
                });
            }

            Command::BindUniformBuffer { index, buffer } => {
                match state.uniform_bindings.get_mut(usize::from(index)) {
                    Some(binding) => *binding = buffer,
                    None => log::warn!("NoopDriver: uniform binding {} out of range", index),
                }
            }
            Command::BindSamplers { index, group } => {
                match state.sampler_bindings.get_mut(usize::from(index)) {
                    Some(binding) => *binding = group,
                    None => log::warn!("NoopDriver: sampler binding {} out of range", index),
                }
            }
            Command::SetRenderPrimitiveBuffer {
                handle,
                vertex_buffer,
                index_buffer,
            } => {
                if !self.require(state, kind, vertex_buffer) || !self.require(state, kind, index_buffer) {
                    return;
                }
                self.update(state, kind, handle, |rp| {
                    rp.vertex_buffer = vertex_buffer;
                    rp.index_buffer = index_buffer;
                });
            }
            Command::SetRenderPrimitiveRange {
                handle,
                primitive_type,
                offset,
                min_index,
                max_index,
                count,
            } => {
                self.update(state, kind, handle, |rp| {
                    rp.primitive_type = primitive_type;
                    rp.offset = offset;
                    rp.min_index = min_index;
                    rp.max_index = max_index;
                    rp.count = count;
                });
            }

            Command::BeginRenderPass { target, params } => {
                if let Some(current) = state.render_pass {
                    log::warn!(
                        "NoopDriver: BeginRenderPass {} while pass on {} is open",
                        target.id(),
                        current.id()
                    );
                }
                if !self.require(state, kind, target) {
                    return;
                }
                if params.flags.clear.intersects(TargetBufferFlags::COLOR_ALL) {
                    state.clear_colors.insert(target.id(), params.clear_color);
                }
                state.render_pass = Some(target);
                state.stats.render_passes += 1;
            }
            Command::EndRenderPass => {
                if state.render_pass.take().is_none() {
                    log::warn!("NoopDriver: EndRenderPass without a pass");
                }
            }
            Command::MakeCurrent { draw, read } => {
                if !self.require(state, kind, draw) {
                    return;
                }
                if !read.is_nil() && read != draw && !self.require(state, kind, read) {
                    return;
                }
                state.draw_swap_chain = draw;
                state.read_swap_chain = if read.is_nil() { draw } else { read };
            }
            Command::Commit(swap_chain) => {
                if self.require(state, kind, swap_chain) {
                    state.stats.commits += 1;
                }
            }
            Command::Draw {
                pipeline,
                primitive,
                instance_count,
            } => {
                if state.render_pass.is_none() {
                    log::warn!("NoopDriver: Draw outside a render pass, dropped");
                    state.stats.dropped_draws += 1;
                    return;
                }
                if !self.require(state, kind, primitive) || !self.require(state, kind, pipeline.program) {
                    return;
                }
                log::trace!(
                    "NoopDriver: draw primitive {} x{}",
                    primitive.id(),
                    instance_count.max(1)
                );
                state.stats.draw_calls += 1;
            }

            Command::ReadPixels {
                target,
                x,
                y,
                width,
                height,
                mut data,
            } => {
                let extent = self
                    .allocator
                    .with(target, |rt| (rt.is_default, rt.width, rt.height));
                if let Some((is_default, target_width, target_height)) = extent {
                    if !is_default
                        && (x.saturating_add(width) > target_width
                            || y.saturating_add(height) > target_height)
                    {
                        log::warn!("NoopDriver: ReadPixels region outside target {}", target.id());
                    }
                    let color = state
                        .clear_colors
                        .get(&target.id())
                        .copied()
                        .unwrap_or([0.0; 4]);
                    Self::fill_pixels(color, width, height, &mut data);
                } else {
                    self.stale(state, kind, target);
                }
                self.base.schedule_destroy(data.buffer);
            }
            Command::ReadBufferObject { .. } | Command::QueryRenderTargetSize { .. } => {
                log::warn!("NoopDriver: {:?} must go through the dispatcher", kind);
            }
        }
    }
}

impl Driver for NoopDriver {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn handle_allocator(&self) -> &HandleAllocator {
        &self.allocator
    }

    fn base(&self) -> &DriverBase {
        &self.base
    }

    fn shader_model(&self) -> ShaderModel {
        ShaderModel::Desktop
    }

    fn is_texture_format_supported(&self, _format: TextureFormat) -> bool {
        true
    }

    fn is_texture_format_mipmappable(&self, format: TextureFormat) -> bool {
        !format.is_depth_stencil() && !format.is_compressed() && !format.is_integer()
    }

    fn is_render_target_format_supported(&self, format: TextureFormat) -> bool {
        !format.is_compressed()
    }

    fn max_draw_buffers(&self) -> usize {
        MAX_SUPPORTED_RENDER_TARGET_COUNT
    }

    fn execute(&self, command: Command) {
        let mut state = self.state.lock();
        let kind = command.kind();
        state.stats.commands_executed += 1;
        if state.trace.len() == TRACE_CAPACITY {
            state.trace.pop_front();
        }
        state.trace.push_back(kind);
        self.run(&mut state, command);
    }

    fn read_buffer_object_synchronous(
        &self,
        handle: Handle<HwBufferObject>,
        byte_offset: u32,
        byte_count: u32,
    ) -> Vec<u8> {
        let mut state = self.state.lock();
        let Some(size) = self.allocator.with(handle, |b| b.byte_count as usize) else {
            self.stale(&mut state, CommandKind::ReadBufferObject, handle);
            return Vec::new();
        };
        let start = (byte_offset as usize).min(size);
        let end = start.saturating_add(byte_count as usize).min(size);
        match state.buffer_contents.get(&handle.id()) {
            Some(contents) => contents[start..end].to_vec(),
            None => vec![0; end - start],
        }
    }

    fn render_target_size_synchronous(&self, target: Handle<HwRenderTarget>) -> Option<(u32, u32)> {
        let size = self.allocator.with(target, |rt| (rt.is_default, rt.width, rt.height))?;
        match size {
            (true, _, _) => {
                let swap_chain = self.state.lock().draw_swap_chain;
                Some(
                    self.allocator
                        .with(swap_chain, |sc| (sc.width, sc.height))
                        .unwrap_or((0, 0)),
                )
            }
            (false, width, height) => Some((width, height)),
        }
    }
}

impl std::fmt::Debug for NoopDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoopDriver")
            .field("allocator", &self.allocator)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::types::{BufferObjectBinding, BufferUsage, RenderPassParams, Viewport};
    use lumen_core::SlotState;
    use lumen_core::texture::{SamplerType, TextureUsage};

    fn driver() -> NoopDriver {
        NoopDriver::new(&DriverConfig::default())
    }

    fn unvalidated() -> NoopDriver {
        NoopDriver::new(&DriverConfig::default().with_validate_handles(false))
    }

    fn texture(driver: &NoopDriver, levels: u8, width: u32, height: u32) -> Handle<HwTexture> {
        let handle = driver.handle_allocator().allocate();
        driver.execute(Command::CreateTexture {
            handle,
            target: SamplerType::Sampler2d,
            levels,
            format: TextureFormat::Rgba8,
            samples: 1,
            width,
            height,
            depth: 1,
            usage: TextureUsage::DEFAULT,
        });
        handle
    }

    fn buffer_object(driver: &NoopDriver, byte_count: u32) -> Handle<HwBufferObject> {
        let handle = driver.handle_allocator().allocate();
        driver.execute(Command::CreateBufferObject {
            handle,
            byte_count,
            binding: BufferObjectBinding::Uniform,
            usage: BufferUsage::Dynamic,
        });
        handle
    }

    #[test]
    fn test_create_and_destroy() {
        let driver = driver();
        let handle = buffer_object(&driver, 16);
        assert_eq!(driver.handle_allocator().state(handle), SlotState::Live);

        driver.handle_allocator().retire(handle);
        driver.execute(Command::DestroyBufferObject(handle));
        assert_eq!(driver.handle_allocator().state(handle), SlotState::Vacant);
        assert_eq!(driver.stats().stale_handles, 0);
    }

    #[test]
    fn test_buffer_object_readback() {
        let driver = driver();
        let handle = buffer_object(&driver, 8);
        driver.execute(Command::UpdateBufferObject {
            handle,
            data: BufferDescriptor::new(vec![1, 2, 3, 4]),
            byte_offset: 2,
        });
        assert_eq!(
            driver.read_buffer_object_synchronous(handle, 0, 8),
            vec![0, 0, 1, 2, 3, 4, 0, 0]
        );
        assert_eq!(driver.read_buffer_object_synchronous(handle, 6, 100), vec![0, 0]);
    }

    #[test]
    fn test_out_of_bounds_update_ignored() {
        let driver = driver();
        let handle = buffer_object(&driver, 4);
        driver.execute(Command::UpdateBufferObject {
            handle,
            data: BufferDescriptor::new(vec![9; 8]),
            byte_offset: 0,
        });
        assert_eq!(driver.read_buffer_object_synchronous(handle, 0, 4), vec![0; 4]);
    }

    #[test]
    fn test_draw_outside_pass_dropped() {
        let driver = driver();
        driver.execute(Command::Draw {
            pipeline: Default::default(),
            primitive: Handle::new(0),
            instance_count: 1,
        });
        let stats = driver.stats();
        assert_eq!(stats.dropped_draws, 1);
        assert_eq!(stats.draw_calls, 0);
    }

    #[test]
    fn test_render_pass_tracking() {
        let driver = driver();
        let target = driver.handle_allocator().allocate();
        driver.execute(Command::CreateDefaultRenderTarget { handle: target });
        driver.execute(Command::BeginRenderPass {
            target,
            params: RenderPassParams::new(Viewport::from_dimensions(4, 4)),
        });
        assert_eq!(driver.current_render_pass(), Some(target));
        driver.execute(Command::EndRenderPass);
        assert_eq!(driver.current_render_pass(), None);
        assert_eq!(driver.stats().render_passes, 1);
    }

    #[test]
    fn test_stale_handle_counted_without_validation() {
        let driver = unvalidated();
        driver.execute(Command::GenerateMipmaps(Handle::new(12)));
        driver.execute(Command::DestroyFence(Handle::new(3)));
        assert_eq!(driver.stats().stale_handles, 2);
    }

    #[test]
    fn test_format_capabilities() {
        let driver = driver();
        assert!(driver.is_texture_format_mipmappable(TextureFormat::Rgba8));
        assert!(!driver.is_texture_format_mipmappable(TextureFormat::Depth24));
        assert!(!driver.is_texture_format_mipmappable(TextureFormat::Rgba8Ui));
        assert!(!driver.is_render_target_format_supported(TextureFormat::Etc2Rgb8));
        assert_eq!(driver.max_draw_buffers(), MAX_SUPPORTED_RENDER_TARGET_COUNT);
    }

    #[test]
    fn test_trace_records_kinds() {
        let driver = driver();
        driver.execute(Command::BeginFrame {
            frame_id: 1,
            monotonic_clock_ns: 0,
        });
        driver.execute(Command::EndFrame { frame_id: 1 });
        assert_eq!(
            driver.executed(),
            vec![CommandKind::BeginFrame, CommandKind::EndFrame]
        );
        assert_eq!(driver.stats().frames, 1);
        driver.clear_trace();
        assert!(driver.executed().is_empty());
    }

    #[test]
    fn test_trace_is_bounded() {
        let driver = driver();
        for _ in 0..TRACE_CAPACITY + 10 {
            driver.execute(Command::Flush);
        }
        driver.execute(Command::EndRenderPass);

        let trace = driver.executed();
        assert_eq!(trace.len(), TRACE_CAPACITY);
        assert_eq!(trace.last(), Some(&CommandKind::EndRenderPass));
        assert_eq!(driver.stats().commands_executed, TRACE_CAPACITY as u64 + 11);
    }

    #[test]
    fn test_texture_levels_clamped_to_chain() {
        let driver = driver();
        let handle = texture(&driver, 40, 16, 16);
        let levels = driver.handle_allocator().with(handle, |t| t.levels);
        assert_eq!(levels, Some(5));
    }

    #[test]
    fn test_update_3d_image_deep_level_is_ignored() {
        let driver = driver();
        let handle = texture(&driver, 40, 16, 16);
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        driver.execute(Command::Update3dImage {
            handle,
            level: 35,
            x_offset: 0,
            y_offset: 0,
            z_offset: 0,
            width: 1,
            height: 1,
            depth: 1,
            data: PixelBufferDescriptor::new(
                BufferDescriptor::with_callback(vec![0; 4], move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                PixelDataFormat::Rgba,
                PixelDataType::UByte,
            ),
        });
        assert_eq!(driver.stats().stale_handles, 0);
        assert_eq!(driver.purge(), 1);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_read_pixels_row_overflow_is_skipped() {
        let driver = driver();
        let target = driver.handle_allocator().allocate();
        driver.execute(Command::CreateRenderTarget {
            handle: target,
            targets: TargetBufferFlags::COLOR0,
            width: 4,
            height: 4,
            samples: 1,
            color: Default::default(),
            depth: Default::default(),
            stencil: Default::default(),
        });

        let pixels = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = pixels.clone();
        let mut data = PixelBufferDescriptor::new(
            BufferDescriptor::with_callback(vec![7; 64], move |bytes| *sink.lock() = bytes),
            PixelDataFormat::Rgba,
            PixelDataType::UByte,
        );
        data.top = u32::MAX;
        driver.execute(Command::ReadPixels {
            target,
            x: 0,
            y: 0,
            width: 4,
            height: 4,
            data,
        });

        assert_eq!(driver.purge(), 1);
        assert_eq!(*pixels.lock(), vec![7; 64]);
    }

    #[test]
    fn test_vertex_buffer_extent_saturates() {
        let driver = driver();
        let handle = driver.handle_allocator().allocate();
        driver.execute(Command::CreateVertexBuffer {
            handle,
            buffer_count: 1,
            attribute_count: 0,
            vertex_count: 0,
            attributes: Default::default(),
            usage: BufferUsage::Static,
        });
        driver.execute(Command::UpdateVertexBuffer {
            handle,
            index: 0,
            data: BufferDescriptor::new(vec![0; 4]),
            byte_offset: u32::MAX - 1,
        });
        let size = driver
            .handle_allocator()
            .with(handle, |vb: &HwVertexBuffer| vb.buffer_sizes[0]);
        assert_eq!(size, Some(u32::MAX));
    }

    #[test]
    fn test_destroyed_handle_does_not_reach_reused_slot() {
        let driver = unvalidated();
        let old = buffer_object(&driver, 4);
        driver.handle_allocator().retire(old);
        driver.execute(Command::DestroyBufferObject(old));

        let new = buffer_object(&driver, 4);
        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);

        driver.execute(Command::UpdateBufferObject {
            handle: old,
            data: BufferDescriptor::new(vec![7; 4]),
            byte_offset: 0,
        });
        assert_eq!(driver.stats().stale_handles, 1);
        assert_eq!(driver.read_buffer_object_synchronous(new, 0, 4), vec![0; 4]);
        assert_eq!(driver.handle_allocator().state(old), SlotState::Vacant);
    }
}
