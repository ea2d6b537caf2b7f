//! Texture format, sampler type and usage definitions.

use bitflags::bitflags;

/// Internal texture storage format.
///
/// Discriminants are stable and strictly increasing in declaration order;
/// format lookup tables are sorted by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u16)]
pub enum TextureFormat {
    // 8-bit formats
    R8,
    R8Snorm,
    R8Ui,
    R8I,
    Stencil8,

    // 16-bit formats
    R16F,
    R16Ui,
    R16I,
    Rg8,
    Rg8Snorm,
    Rg8Ui,
    Rg8I,
    Rgb565,
    Rgb9E5,
    Rgb5A1,
    Rgba4,
    Depth16,

    // 24-bit formats
    Rgb8,
    Srgb8,
    Rgb8Snorm,
    Rgb8Ui,
    Rgb8I,
    Depth24,

    // 32-bit formats
    R32F,
    R32Ui,
    R32I,
    Rg16F,
    Rg16Ui,
    Rg16I,
    R11FG11FB10F,
    #[default]
    Rgba8,
    Srgb8A8,
    Rgba8Snorm,
    Rgb10A2,
    Rgba8Ui,
    Rgba8I,
    Depth32F,
    Depth24Stencil8,
    Depth32FStencil8,

    // 48-bit formats
    Rgb16F,
    Rgb16Ui,
    Rgb16I,

    // 64-bit formats
    Rg32F,
    Rg32Ui,
    Rg32I,
    Rgba16F,
    Rgba16Ui,
    Rgba16I,

    // 96-bit formats
    Rgb32F,
    Rgb32Ui,
    Rgb32I,

    // 128-bit formats
    Rgba32F,
    Rgba32Ui,
    Rgba32I,

    // Compressed formats
    EacR11,
    EacR11Signed,
    EacRg11,
    EacRg11Signed,
    Etc2Rgb8,
    Etc2Srgb8,
    Etc2Rgb8A1,
    Etc2Srgb8A1,
    Etc2EacRgba8,
    Etc2EacSrgba8,
    Dxt1Rgb,
    Dxt1Rgba,
    Dxt3Rgba,
    Dxt5Rgba,
}

impl TextureFormat {
    /// Every format, in discriminant order.
    pub const ALL: &'static [TextureFormat] = &[
        Self::R8,
        Self::R8Snorm,
        Self::R8Ui,
        Self::R8I,
        Self::Stencil8,
        Self::R16F,
        Self::R16Ui,
        Self::R16I,
        Self::Rg8,
        Self::Rg8Snorm,
        Self::Rg8Ui,
        Self::Rg8I,
        Self::Rgb565,
        Self::Rgb9E5,
        Self::Rgb5A1,
        Self::Rgba4,
        Self::Depth16,
        Self::Rgb8,
        Self::Srgb8,
        Self::Rgb8Snorm,
        Self::Rgb8Ui,
        Self::Rgb8I,
        Self::Depth24,
        Self::R32F,
        Self::R32Ui,
        Self::R32I,
        Self::Rg16F,
        Self::Rg16Ui,
        Self::Rg16I,
        Self::R11FG11FB10F,
        Self::Rgba8,
        Self::Srgb8A8,
        Self::Rgba8Snorm,
        Self::Rgb10A2,
        Self::Rgba8Ui,
        Self::Rgba8I,
        Self::Depth32F,
        Self::Depth24Stencil8,
        Self::Depth32FStencil8,
        Self::Rgb16F,
        Self::Rgb16Ui,
        Self::Rgb16I,
        Self::Rg32F,
        Self::Rg32Ui,
        Self::Rg32I,
        Self::Rgba16F,
        Self::Rgba16Ui,
        Self::Rgba16I,
        Self::Rgb32F,
        Self::Rgb32Ui,
        Self::Rgb32I,
        Self::Rgba32F,
        Self::Rgba32Ui,
        Self::Rgba32I,
        Self::EacR11,
        Self::EacR11Signed,
        Self::EacRg11,
        Self::EacRg11Signed,
        Self::Etc2Rgb8,
        Self::Etc2Srgb8,
        Self::Etc2Rgb8A1,
        Self::Etc2Srgb8A1,
        Self::Etc2EacRgba8,
        Self::Etc2EacSrgba8,
        Self::Dxt1Rgb,
        Self::Dxt1Rgba,
        Self::Dxt3Rgba,
        Self::Dxt5Rgba,
    ];

    /// Returns true if this is a depth and/or stencil format.
    pub fn is_depth_stencil(&self) -> bool {
        matches!(
            self,
            Self::Stencil8
                | Self::Depth16
                | Self::Depth24
                | Self::Depth32F
                | Self::Depth24Stencil8
                | Self::Depth32FStencil8
        )
    }

    /// Returns true if this format has a depth component.
    pub fn has_depth(&self) -> bool {
        self.is_depth_stencil() && *self != Self::Stencil8
    }

    /// Returns true if this format has a stencil component.
    pub fn has_stencil(&self) -> bool {
        matches!(
            self,
            Self::Stencil8 | Self::Depth24Stencil8 | Self::Depth32FStencil8
        )
    }

    /// Returns true if this is a block-compressed format.
    pub fn is_compressed(&self) -> bool {
        *self >= Self::EacR11
    }

    /// Returns true if texels are read back as integers (not normalized).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::R8Ui
                | Self::R8I
                | Self::R16Ui
                | Self::R16I
                | Self::Rg8Ui
                | Self::Rg8I
                | Self::Rgb8Ui
                | Self::Rgb8I
                | Self::R32Ui
                | Self::R32I
                | Self::Rg16Ui
                | Self::Rg16I
                | Self::Rgba8Ui
                | Self::Rgba8I
                | Self::Rgb16Ui
                | Self::Rgb16I
                | Self::Rg32Ui
                | Self::Rg32I
                | Self::Rgba16Ui
                | Self::Rgba16I
                | Self::Rgb32Ui
                | Self::Rgb32I
                | Self::Rgba32Ui
                | Self::Rgba32I
        )
    }

    /// Size in bytes of one texel, or `None` for compressed formats.
    pub fn bytes_per_texel(&self) -> Option<u32> {
        let bytes = match self {
            Self::R8 | Self::R8Snorm | Self::R8Ui | Self::R8I | Self::Stencil8 => 1,
            Self::R16F
            | Self::R16Ui
            | Self::R16I
            | Self::Rg8
            | Self::Rg8Snorm
            | Self::Rg8Ui
            | Self::Rg8I
            | Self::Rgb565
            | Self::Rgb5A1
            | Self::Rgba4
            | Self::Depth16 => 2,
            Self::Rgb8
            | Self::Srgb8
            | Self::Rgb8Snorm
            | Self::Rgb8Ui
            | Self::Rgb8I
            | Self::Depth24 => 3,
            Self::Rgb9E5
            | Self::R32F
            | Self::R32Ui
            | Self::R32I
            | Self::Rg16F
            | Self::Rg16Ui
            | Self::Rg16I
            | Self::R11FG11FB10F
            | Self::Rgba8
            | Self::Srgb8A8
            | Self::Rgba8Snorm
            | Self::Rgb10A2
            | Self::Rgba8Ui
            | Self::Rgba8I
            | Self::Depth32F
            | Self::Depth24Stencil8 => 4,
            Self::Depth32FStencil8 => 5,
            Self::Rgb16F | Self::Rgb16Ui | Self::Rgb16I => 6,
            Self::Rg32F
            | Self::Rg32Ui
            | Self::Rg32I
            | Self::Rgba16F
            | Self::Rgba16Ui
            | Self::Rgba16I => 8,
            Self::Rgb32F | Self::Rgb32Ui | Self::Rgb32I => 12,
            Self::Rgba32F | Self::Rgba32Ui | Self::Rgba32I => 16,
            _ => return None,
        };
        Some(bytes)
    }
}

/// Kind of sampler a texture is bound through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerType {
    /// 2D texture.
    #[default]
    Sampler2d,
    /// 2D texture array.
    Sampler2dArray,
    /// Cubemap.
    SamplerCubemap,
    /// External (stream-backed) texture.
    SamplerExternal,
    /// 3D texture.
    Sampler3d,
}

/// Value type a shader reads from a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerFormat {
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Floating point (includes normalized formats).
    Float,
    /// Depth comparison result.
    Shadow,
}

/// Numeric precision qualifier for a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    /// Low precision.
    Low,
    /// Medium precision.
    Medium,
    /// High precision.
    High,
    /// Let the shader compiler pick.
    #[default]
    Default,
}

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u8 {
        /// Texture can be a color attachment.
        const COLOR_ATTACHMENT = 1 << 0;
        /// Texture can be a depth attachment.
        const DEPTH_ATTACHMENT = 1 << 1;
        /// Texture can be a stencil attachment.
        const STENCIL_ATTACHMENT = 1 << 2;
        /// Data can be uploaded into the texture.
        const UPLOADABLE = 1 << 3;
        /// Texture can be sampled in a shader.
        const SAMPLEABLE = 1 << 4;
        /// Texture can be a subpass input.
        const SUBPASS_INPUT = 1 << 5;
        /// Uploadable and sampleable.
        const DEFAULT = Self::UPLOADABLE.bits() | Self::SAMPLEABLE.bits();
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::DEFAULT
    }
}
