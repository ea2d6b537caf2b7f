//! Fixed-capacity sampler bindings with per-slot dirty tracking.
//!
//! A [`SamplerBuffer`] is filled on the main thread, then snapshotted with
//! [`SamplerBuffer::to_command_stream`] and moved into an
//! `UpdateSamplerGroup` command. The snapshot keeps the dirty bits so the
//! backend only touches the slots that changed; the source is left clean.

use lumen_core::Handle;
use lumen_core::sampler::SamplerParams;
use lumen_core::texture::{Precision, SamplerFormat, SamplerType};

use crate::hw::HwTexture;

/// Maximum number of samplers in one group.
pub const MAX_SAMPLER_COUNT: usize = 16;

static_assertions::const_assert!(MAX_SAMPLER_COUNT <= u16::BITS as usize);

// ============================================================================
// Sampler
// ============================================================================

/// One texture binding: a texture handle plus sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sampler {
    pub texture: Handle<HwTexture>,
    pub params: SamplerParams,
}

impl Sampler {
    pub fn new(texture: Handle<HwTexture>, params: SamplerParams) -> Self {
        Self { texture, params }
    }
}

/// Anything that can be turned into a [`Sampler`] binding.
pub trait SamplerSource {
    fn texture(&self) -> Handle<HwTexture>;
    fn params(&self) -> SamplerParams;
}

impl SamplerSource for Sampler {
    fn texture(&self) -> Handle<HwTexture> {
        self.texture
    }

    fn params(&self) -> SamplerParams {
        self.params
    }
}

impl SamplerSource for (Handle<HwTexture>, SamplerParams) {
    fn texture(&self) -> Handle<HwTexture> {
        self.0
    }

    fn params(&self) -> SamplerParams {
        self.1
    }
}

impl SamplerSource for Handle<HwTexture> {
    fn texture(&self) -> Handle<HwTexture> {
        *self
    }

    fn params(&self) -> SamplerParams {
        SamplerParams::default()
    }
}

// ============================================================================
// SamplerInterfaceBlock
// ============================================================================

/// Reflection data for one sampler of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerInfo {
    pub name: String,
    /// Slot index within the group. Assigned by [`SamplerInterfaceBlock::with_sampler`].
    pub offset: u8,
    pub sampler_type: SamplerType,
    pub format: SamplerFormat,
    pub precision: Precision,
    pub multisample: bool,
}

impl SamplerInfo {
    /// A 2D float sampler with default precision.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offset: 0,
            sampler_type: SamplerType::default(),
            format: SamplerFormat::Float,
            precision: Precision::default(),
            multisample: false,
        }
    }

    pub fn with_type(mut self, sampler_type: SamplerType) -> Self {
        self.sampler_type = sampler_type;
        self
    }

    pub fn with_format(mut self, format: SamplerFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_multisample(mut self, multisample: bool) -> Self {
        self.multisample = multisample;
        self
    }
}

/// Named list of samplers a program expects in one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerInterfaceBlock {
    name: String,
    samplers: Vec<SamplerInfo>,
}

impl SamplerInterfaceBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samplers: Vec::new(),
        }
    }

    /// Append a sampler. Its offset is its position in the block.
    ///
    /// Samplers beyond [`MAX_SAMPLER_COUNT`] and duplicate names are dropped
    /// with a warning.
    pub fn with_sampler(mut self, mut info: SamplerInfo) -> Self {
        if self.samplers.len() >= MAX_SAMPLER_COUNT {
            log::warn!(
                "SamplerInterfaceBlock '{}': dropping '{}', block is full",
                self.name,
                info.name
            );
            return self;
        }
        if self.index_of(&info.name).is_some() {
            log::warn!(
                "SamplerInterfaceBlock '{}': duplicate sampler '{}'",
                self.name,
                info.name
            );
            return self;
        }
        info.offset = self.samplers.len() as u8;
        self.samplers.push(info);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }

    pub fn samplers(&self) -> &[SamplerInfo] {
        &self.samplers
    }

    /// Slot index of the sampler called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.samplers
            .iter()
            .find(|s| s.name == name)
            .map(|s| usize::from(s.offset))
    }

    pub fn sampler_info(&self, name: &str) -> Option<&SamplerInfo> {
        self.samplers.iter().find(|s| s.name == name)
    }
}

// ============================================================================
// SamplerBuffer
// ============================================================================

/// Up to [`MAX_SAMPLER_COUNT`] samplers plus a dirty bit per slot.
pub struct SamplerBuffer {
    samplers: [Sampler; MAX_SAMPLER_COUNT],
    size: usize,
    dirty: u16,
}

impl SamplerBuffer {
    /// Buffer with `count` default slots, all clean.
    pub fn new(count: usize) -> Self {
        debug_assert!(
            count <= MAX_SAMPLER_COUNT,
            "sampler count {count} exceeds {MAX_SAMPLER_COUNT}"
        );
        Self {
            samplers: [Sampler::default(); MAX_SAMPLER_COUNT],
            size: count.min(MAX_SAMPLER_COUNT),
            dirty: 0,
        }
    }

    /// Buffer sized for `block`.
    pub fn for_interface_block(block: &SamplerInterfaceBlock) -> Self {
        Self::new(block.len())
    }

    /// Number of populated slots.
    pub fn get_size(&self) -> usize {
        self.size
    }

    /// Sampler in slot `index`, if populated.
    pub fn get(&self, index: usize) -> Option<&Sampler> {
        self.samplers().get(index)
    }

    /// Populated slots.
    pub fn samplers(&self) -> &[Sampler] {
        &self.samplers[..self.size]
    }

    /// Write slot `index` and mark it dirty. Out-of-range writes are ignored.
    pub fn set_sampler(&mut self, index: usize, sampler: Sampler) {
        if index < self.size {
            self.samplers[index] = sampler;
            self.dirty |= 1 << index;
        }
    }

    /// Write the slot that `block` names `name`.
    pub fn set_sampler_named(&mut self, block: &SamplerInterfaceBlock, name: &str, sampler: Sampler) {
        match block.index_of(name) {
            Some(index) => self.set_sampler(index, sampler),
            None => log::warn!(
                "SamplerBuffer: no sampler named '{}' in block '{}'",
                name,
                block.name()
            ),
        }
    }

    /// Write slot `index` from any [`SamplerSource`].
    pub fn set_buffer(&mut self, index: usize, source: &impl SamplerSource) {
        self.set_sampler(index, Sampler::new(source.texture(), source.params()));
    }

    /// Returns true if any slot changed since the last [`clean`](Self::clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty != 0
    }

    /// Returns true if slot `index` changed since the last clean.
    pub fn is_slot_dirty(&self, index: usize) -> bool {
        index < MAX_SAMPLER_COUNT && self.dirty & (1 << index) != 0
    }

    /// Dirty bitset, bit `i` for slot `i`.
    pub fn dirty_bits(&self) -> u16 {
        self.dirty
    }

    /// Clear all dirty bits.
    pub fn clean(&mut self) {
        self.dirty = 0;
    }

    /// Snapshot for the command stream, then clean this buffer.
    ///
    /// The snapshot carries the dirty bits accumulated so far.
    pub fn to_command_stream(&mut self) -> SamplerBuffer {
        let snapshot = self.clone();
        self.clean();
        snapshot
    }

    /// Indices of dirty slots in ascending order.
    pub fn dirty_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).filter(move |&i| self.is_slot_dirty(i))
    }
}

impl Default for SamplerBuffer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for SamplerBuffer {
    fn clone(&self) -> Self {
        let mut samplers = [Sampler::default(); MAX_SAMPLER_COUNT];
        samplers[..self.size].copy_from_slice(&self.samplers[..self.size]);
        Self {
            samplers,
            size: self.size,
            dirty: self.dirty,
        }
    }
}

impl PartialEq for SamplerBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.dirty == other.dirty && self.samplers() == other.samplers()
    }
}

impl Eq for SamplerBuffer {}

impl std::fmt::Debug for SamplerBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerBuffer")
            .field("size", &self.size)
            .field("dirty", &format_args!("{:#06x}", self.dirty))
            .field("samplers", &self.samplers())
            .finish()
    }
}
