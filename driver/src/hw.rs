//! Backend-resident resource descriptors and the tables that own them.
//!
//! Client code only ever sees `Handle<HwXxx>`. The descriptors live in
//! [`ResourceTables`], one [`HandleArena`] per kind, shared between the
//! recording thread (which allocates and retires ids) and the render thread
//! (which constructs and frees them).

use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_core::texture::{SamplerType, TextureFormat, TextureUsage};
use lumen_core::{Handle, HandleArena, SlotState};
use parking_lot::{Condvar, Mutex};

use crate::sampler_buffer::SamplerBuffer;
use crate::types::{
    AttributeArray, BufferObjectBinding, BufferUsage, IndexType, MAX_VERTEX_BUFFER_COUNT, Mrt,
    NativeHandle, PrimitiveType, SwapChainFlags, TargetBufferFlags, TargetBufferInfo,
};

// ============================================================================
// Descriptors
// ============================================================================

/// Vertex layout plus the buffer objects bound to each buffer slot.
#[derive(Debug, Clone)]
pub struct HwVertexBuffer {
    /// Attribute layout, indexed by attribute slot.
    pub attributes: AttributeArray,
    pub vertex_count: u32,
    /// Number of buffer slots the attributes read from.
    pub buffer_count: u8,
    /// Number of enabled attributes.
    pub attribute_count: u8,
    pub usage: BufferUsage,
    /// Bytes uploaded into each buffer slot so far.
    pub buffer_sizes: [u32; MAX_VERTEX_BUFFER_COUNT],
}

/// Index storage for a render primitive.
#[derive(Debug, Clone)]
pub struct HwIndexBuffer {
    /// Width of one index.
    pub index_type: IndexType,
    /// Capacity in indices.
    pub count: u32,
    pub usage: BufferUsage,
}

impl HwIndexBuffer {
    /// Total capacity in bytes.
    pub fn byte_size(&self) -> u64 {
        u64::from(self.count) * u64::from(self.index_type.size())
    }
}

/// Untyped GPU buffer, usually a uniform block.
#[derive(Debug, Clone)]
pub struct HwBufferObject {
    /// Capacity in bytes.
    pub byte_count: u32,
    /// Binding point the buffer is meant for.
    pub binding: BufferObjectBinding,
    pub usage: BufferUsage,
}

/// Geometry of one draw: a vertex buffer, an index buffer and an index range.
#[derive(Debug, Clone, Default)]
pub struct HwRenderPrimitive {
    pub vertex_buffer: Handle<HwVertexBuffer>,
    pub index_buffer: Handle<HwIndexBuffer>,
    pub primitive_type: PrimitiveType,
    /// First index, in indices.
    pub offset: u32,
    /// Smallest vertex index referenced by the range.
    pub min_index: u32,
    /// Largest vertex index referenced by the range.
    pub max_index: u32,
    /// Number of indices drawn.
    pub count: u32,
}

/// A linked shader program.
#[derive(Debug, Clone)]
pub struct HwProgram {
    /// Debug name, used in logs.
    pub name: String,
    /// `(binding, sampler count)` per declared sampler group.
    pub sampler_groups: Vec<(u8, usize)>,
}

/// A sampler group. Boxed so every table slot stays small.
#[derive(Debug, Clone)]
pub struct HwSamplerGroup {
    /// Samplers last applied by `UpdateSamplerGroup`.
    pub samplers: Box<SamplerBuffer>,
}

/// A texture image and its mip chain.
#[derive(Debug, Clone)]
pub struct HwTexture {
    /// How the texture is sampled (2D, array, cube map, 3D, external).
    pub target: SamplerType,
    /// Mip levels, at least 1 and never more than the full chain.
    pub levels: u8,
    pub format: TextureFormat,
    /// Samples per texel; 1 when not multisampled.
    pub samples: u8,
    /// Size of level 0 in texels.
    pub width: u32,
    pub height: u32,
    /// Depth of level 0, or the layer count for arrays.
    pub depth: u32,
    pub usage: TextureUsage,
    /// External stream feeding this texture. Not owned.
    pub stream: Option<Handle<HwStream>>,
}

/// A set of attachments rendered into by a render pass.
#[derive(Debug, Clone)]
pub struct HwRenderTarget {
    /// Attachments present on this target.
    pub targets: TargetBufferFlags,
    /// Size in pixels. The default target follows the current swap chain.
    pub width: u32,
    pub height: u32,
    pub samples: u8,
    /// Color attachments.
    pub color: Mrt,
    /// Depth attachment.
    pub depth: TargetBufferInfo,
    /// Stencil attachment.
    pub stencil: TargetBufferInfo,
    /// True for the swap chain's target.
    pub is_default: bool,
}

/// CPU-visible marker placed in the command stream.
#[derive(Debug, Clone, Default)]
pub struct HwFence {
    /// Value of the frame counter when the fence executed.
    pub frame: u64,
}

/// A presentable surface, window-backed or headless.
#[derive(Debug, Clone)]
pub struct HwSwapChain {
    /// Platform window, or the null handle when headless.
    pub native_window: NativeHandle,
    pub flags: SwapChainFlags,
    /// Zero for window-backed swap chains.
    pub width: u32,
    /// Zero for window-backed swap chains.
    pub height: u32,
}

/// An external image source, such as a camera or video decoder.
#[derive(Debug, Clone)]
pub struct HwStream {
    /// Platform stream object. Not owned.
    pub stream: NativeHandle,
    /// Frame size in pixels.
    pub width: u32,
    pub height: u32,
}

// ============================================================================
// Tables
// ============================================================================

/// A resource kind stored in [`ResourceTables`].
pub trait HwResource: Sized + Send + 'static {
    /// Name used in logs.
    const KIND: &'static str;

    fn table(tables: &ResourceTables) -> &HandleArena<Self>;

    fn table_mut(tables: &mut ResourceTables) -> &mut HandleArena<Self>;
}

macro_rules! resource_tables {
    ($($ty:ident => $field:ident),* $(,)?) => {
        /// One slot table per resource kind.
        #[derive(Default)]
        pub struct ResourceTables {
            $($field: HandleArena<$ty>,)*
        }

        impl ResourceTables {
            pub fn new() -> Self {
                Self::default()
            }

            /// Number of occupied slots across all kinds.
            pub fn live_count(&self) -> usize {
                0 $(+ self.$field.len())*
            }

            /// Drop every resource and reset all ids.
            pub fn clear(&mut self) {
                $(self.$field.clear();)*
            }
        }

        $(
            impl HwResource for $ty {
                const KIND: &'static str = stringify!($ty);

                fn table(tables: &ResourceTables) -> &HandleArena<Self> {
                    &tables.$field
                }

                fn table_mut(tables: &mut ResourceTables) -> &mut HandleArena<Self> {
                    &mut tables.$field
                }
            }
        )*
    };
}

resource_tables! {
    HwVertexBuffer => vertex_buffers,
    HwIndexBuffer => index_buffers,
    HwBufferObject => buffer_objects,
    HwRenderPrimitive => render_primitives,
    HwProgram => programs,
    HwSamplerGroup => sampler_groups,
    HwTexture => textures,
    HwRenderTarget => render_targets,
    HwFence => fences,
    HwSwapChain => swap_chains,
    HwStream => streams,
}

// ============================================================================
// HandleAllocator
// ============================================================================

struct Shared {
    tables: Mutex<ResourceTables>,
    constructed: Condvar,
}

/// Thread-safe front end over [`ResourceTables`].
///
/// Cloning shares the same tables. Every construction wakes threads blocked in
/// [`wait_until_constructed`](Self::wait_until_constructed).
#[derive(Clone)]
pub struct HandleAllocator {
    shared: Arc<Shared>,
}

static_assertions::assert_impl_all!(HandleAllocator: Send, Sync);

impl HandleAllocator {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(ResourceTables::new()),
                constructed: Condvar::new(),
            }),
        }
    }

    /// Reserve an id. The slot is `Pending` until [`construct`](Self::construct).
    pub fn allocate<T: HwResource>(&self) -> Handle<T> {
        let handle = T::table_mut(&mut self.shared.tables.lock()).allocate();
        log::debug!("allocate {} {}", T::KIND, handle.id());
        handle
    }

    /// Store the value for a pending handle.
    ///
    /// Returns false unless the slot was pending, or retiring without a value.
    pub fn construct<T: HwResource>(&self, handle: Handle<T>, value: T) -> bool {
        let constructed = T::table_mut(&mut self.shared.tables.lock()).construct(handle, value);
        if constructed {
            log::debug!("construct {} {}", T::KIND, handle.id());
            self.shared.constructed.notify_all();
        }
        constructed
    }

    /// Mark a handle as scheduled for destruction.
    pub fn retire<T: HwResource>(&self, handle: Handle<T>) -> bool {
        let retired = T::table_mut(&mut self.shared.tables.lock()).retire(handle);
        if retired {
            log::debug!("retire {} {}", T::KIND, handle.id());
        }
        retired
    }

    /// Release the slot and return its value. The id may be reused afterwards.
    pub fn free<T: HwResource>(&self, handle: Handle<T>) -> Option<T> {
        let value = T::table_mut(&mut self.shared.tables.lock()).free(handle);
        log::debug!("free {} {}", T::KIND, handle.id());
        value
    }

    pub fn state<T: HwResource>(&self, handle: Handle<T>) -> SlotState {
        T::table(&self.shared.tables.lock()).state(handle)
    }

    /// Returns true if the handle currently resolves to a value.
    pub fn is_constructed<T: HwResource>(&self, handle: Handle<T>) -> bool {
        T::table(&self.shared.tables.lock()).get(handle).is_some()
    }

    /// Run `f` on the resource behind `handle`.
    pub fn with<T: HwResource, R>(&self, handle: Handle<T>, f: impl FnOnce(&T) -> R) -> Option<R> {
        T::table(&self.shared.tables.lock()).get(handle).map(f)
    }

    /// Run `f` on the resource behind `handle`, mutably.
    pub fn with_mut<T: HwResource, R>(
        &self,
        handle: Handle<T>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        T::table_mut(&mut self.shared.tables.lock())
            .get_mut(handle)
            .map(f)
    }

    /// Run `f` with every table locked.
    pub fn with_tables<R>(&self, f: impl FnOnce(&mut ResourceTables) -> R) -> R {
        f(&mut self.shared.tables.lock())
    }

    /// Resolve a texture's external stream through the stream table.
    pub fn texture_stream(&self, texture: Handle<HwTexture>) -> Option<NativeHandle> {
        let tables = self.shared.tables.lock();
        let stream = HwTexture::table(&tables).get(texture)?.stream?;
        HwStream::table(&tables).get(stream).map(|s| s.stream)
    }

    /// Block until `handle` is constructed, freed, or `timeout` elapses.
    ///
    /// Returns true if the handle resolves to a value on return.
    pub fn wait_until_constructed<T: HwResource>(&self, handle: Handle<T>, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut tables = self.shared.tables.lock();
        loop {
            let table = T::table(&tables);
            if table.get(handle).is_some() {
                return true;
            }
            if table.state(handle) == SlotState::Vacant {
                return false;
            }
            match deadline {
                Some(deadline) => {
                    if self
                        .shared
                        .constructed
                        .wait_until(&mut tables, deadline)
                        .timed_out()
                    {
                        return T::table(&tables).get(handle).is_some();
                    }
                }
                None => self.shared.constructed.wait(&mut tables),
            }
        }
    }

    /// Number of occupied slots across all tables.
    pub fn live_count(&self) -> usize {
        self.shared.tables.lock().live_count()
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandleAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleAllocator")
            .field("live_count", &self.live_count())
            .finish()
    }
}
