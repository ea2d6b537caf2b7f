//! Sampler parameter types and filter/wrap/compare mode definitions.

/// Magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MagFilter {
    /// Nearest neighbor filtering.
    #[default]
    Nearest,
    /// Linear filtering.
    Linear,
}

/// Minification filter, including mipmap selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MinFilter {
    /// Nearest texel, no mipmapping.
    #[default]
    Nearest,
    /// Linear filtering, no mipmapping.
    Linear,
    /// Nearest texel from the nearest mip level.
    NearestMipmapNearest,
    /// Linear filtering within the nearest mip level.
    LinearMipmapNearest,
    /// Nearest texel, blended between two mip levels.
    NearestMipmapLinear,
    /// Trilinear filtering.
    LinearMipmapLinear,
}

impl MinFilter {
    /// Returns true if this filter reads from mip levels other than the base.
    pub fn uses_mipmaps(&self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }
}

/// Texture coordinate wrapping behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Clamp to edge.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirroredRepeat,
}

/// Whether a sampler performs depth comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareMode {
    /// Plain sampling.
    #[default]
    None,
    /// Compare the reference value against the texture (shadow sampling).
    CompareToTexture,
}

/// Comparison function used for shadow sampling and depth testing.
///
/// The discriminants are the on-wire values used in packed state words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CompareFunction {
    /// Pass if less than or equal.
    #[default]
    LessEqual = 0,
    /// Pass if greater than or equal.
    GreaterEqual = 1,
    /// Pass if less than.
    Less = 2,
    /// Pass if greater than.
    Greater = 3,
    /// Pass if equal.
    Equal = 4,
    /// Pass if not equal.
    NotEqual = 5,
    /// Always pass.
    Always = 6,
    /// Never pass.
    Never = 7,
}

impl CompareFunction {
    /// Decode from the low three bits of `bits`.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0x7 {
            0 => Self::LessEqual,
            1 => Self::GreaterEqual,
            2 => Self::Less,
            3 => Self::Greater,
            4 => Self::Equal,
            5 => Self::NotEqual,
            6 => Self::Always,
            _ => Self::Never,
        }
    }
}

/// Largest supported `log2` of the anisotropy level (16x).
pub const MAX_ANISOTROPY_LOG2: u8 = 4;

/// Sampling parameters bound alongside a texture handle.
///
/// Small and `Copy` so that sampler arrays can be moved across the
/// command stream cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerParams {
    /// Magnification filter.
    pub filter_mag: MagFilter,
    /// Minification filter.
    pub filter_min: MinFilter,
    /// Wrap mode for S coordinate.
    pub wrap_s: WrapMode,
    /// Wrap mode for T coordinate.
    pub wrap_t: WrapMode,
    /// Wrap mode for R coordinate.
    pub wrap_r: WrapMode,
    /// `log2` of the anisotropy level; 0 disables anisotropic filtering.
    pub anisotropy_log2: u8,
    /// Depth comparison mode.
    pub compare_mode: CompareMode,
    /// Depth comparison function, used when `compare_mode` compares.
    pub compare_func: CompareFunction,
}

impl SamplerParams {
    /// Create default parameters (nearest filtering, clamp to edge).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create linear filtering parameters with trilinear minification.
    pub fn linear() -> Self {
        Self {
            filter_mag: MagFilter::Linear,
            filter_min: MinFilter::LinearMipmapLinear,
            ..Default::default()
        }
    }

    /// Create parameters for shadow-map sampling.
    pub fn shadow(compare_func: CompareFunction) -> Self {
        Self {
            filter_mag: MagFilter::Linear,
            filter_min: MinFilter::Linear,
            compare_mode: CompareMode::CompareToTexture,
            compare_func,
            ..Default::default()
        }
    }

    /// Set the wrap mode for all coordinates.
    pub fn with_wrap(mut self, mode: WrapMode) -> Self {
        self.wrap_s = mode;
        self.wrap_t = mode;
        self.wrap_r = mode;
        self
    }

    /// Set the anisotropy level. Rounded down to a power of two and clamped to 16x.
    pub fn with_anisotropy(mut self, level: u32) -> Self {
        let log2 = level.max(1).ilog2().min(u32::from(MAX_ANISOTROPY_LOG2));
        self.anisotropy_log2 = log2 as u8;
        self
    }

    /// Anisotropy level (1 when disabled).
    pub fn anisotropy(&self) -> u32 {
        1 << self.anisotropy_log2
    }

    /// Returns true if this sampler performs depth comparison.
    pub fn is_shadow(&self) -> bool {
        self.compare_mode == CompareMode::CompareToTexture
    }
}
