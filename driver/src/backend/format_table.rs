//! Texture format to sampler format/precision lookup.

use lumen_core::texture::{Precision, SamplerFormat, TextureFormat};

use Precision::{High, Low, Medium};
use SamplerFormat::{Float, Int, Shadow, Uint};
use TextureFormat as F;

/// How shaders read a texture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureInfo {
    pub format: TextureFormat,
    pub sampler_format: SamplerFormat,
    pub precision: Precision,
}

const fn info(format: TextureFormat, sampler_format: SamplerFormat, precision: Precision) -> TextureInfo {
    TextureInfo {
        format,
        sampler_format,
        precision,
    }
}

/// Sorted by format discriminant. [`check_texture_info`] verifies the order.
static TEXTURE_INFO: &[TextureInfo] = &[
    // 8-bit
    info(F::R8, Float, Low),
    info(F::R8Snorm, Float, Low),
    info(F::R8Ui, Uint, Low),
    info(F::R8I, Int, Low),
    info(F::Stencil8, Uint, Low),
    // 16-bit
    info(F::R16F, Float, Medium),
    info(F::R16Ui, Uint, Medium),
    info(F::R16I, Int, Medium),
    info(F::Rg8, Float, Low),
    info(F::Rg8Snorm, Float, Low),
    info(F::Rg8Ui, Uint, Low),
    info(F::Rg8I, Int, Low),
    info(F::Rgb565, Float, Low),
    info(F::Rgb9E5, Float, Medium),
    info(F::Rgb5A1, Float, Low),
    info(F::Rgba4, Float, Low),
    info(F::Depth16, Shadow, Medium),
    // 24-bit
    info(F::Rgb8, Float, Low),
    info(F::Srgb8, Float, Low),
    info(F::Rgb8Snorm, Float, Low),
    info(F::Rgb8Ui, Uint, Low),
    info(F::Rgb8I, Int, Low),
    info(F::Depth24, Shadow, High),
    // 32-bit
    info(F::R32F, Float, High),
    info(F::R32Ui, Uint, High),
    info(F::R32I, Int, High),
    info(F::Rg16F, Float, Medium),
    info(F::Rg16Ui, Uint, Medium),
    info(F::Rg16I, Int, Medium),
    info(F::R11FG11FB10F, Float, Medium),
    info(F::Rgba8, Float, Low),
    info(F::Srgb8A8, Float, Low),
    info(F::Rgba8Snorm, Float, Low),
    info(F::Rgb10A2, Float, Medium),
    info(F::Rgba8Ui, Uint, Low),
    info(F::Rgba8I, Int, Low),
    info(F::Depth32F, Shadow, High),
    info(F::Depth24Stencil8, Shadow, High),
    info(F::Depth32FStencil8, Shadow, High),
    // 48-bit
    info(F::Rgb16F, Float, Medium),
    info(F::Rgb16Ui, Uint, Medium),
    info(F::Rgb16I, Int, Medium),
    // 64-bit
    info(F::Rg32F, Float, High),
    info(F::Rg32Ui, Uint, High),
    info(F::Rg32I, Int, High),
    info(F::Rgba16F, Float, Medium),
    info(F::Rgba16Ui, Uint, Medium),
    info(F::Rgba16I, Int, Medium),
    // 96-bit
    info(F::Rgb32F, Float, High),
    info(F::Rgb32Ui, Uint, High),
    info(F::Rgb32I, Int, High),
    // 128-bit
    info(F::Rgba32F, Float, High),
    info(F::Rgba32Ui, Uint, High),
    info(F::Rgba32I, Int, High),
    // compressed
    info(F::EacR11, Float, Low),
    info(F::EacR11Signed, Float, Low),
    info(F::EacRg11, Float, Low),
    info(F::EacRg11Signed, Float, Low),
    info(F::Etc2Rgb8, Float, Low),
    info(F::Etc2Srgb8, Float, Low),
    info(F::Etc2Rgb8A1, Float, Low),
    info(F::Etc2Srgb8A1, Float, Low),
    info(F::Etc2EacRgba8, Float, Low),
    info(F::Etc2EacSrgba8, Float, Low),
    info(F::Dxt1Rgb, Float, Low),
    info(F::Dxt1Rgba, Float, Low),
    info(F::Dxt3Rgba, Float, Low),
    info(F::Dxt5Rgba, Float, Low),
];

/// Every entry, in lookup order.
pub fn texture_info_table() -> &'static [TextureInfo] {
    TEXTURE_INFO
}

/// Binary search the table for `format`.
pub fn find_texture_info(format: TextureFormat) -> Option<&'static TextureInfo> {
    TEXTURE_INFO
        .binary_search_by_key(&format, |entry| entry.format)
        .ok()
        .map(|index| &TEXTURE_INFO[index])
}

/// Sampler format for `format`, `Float` if the format is not in the table.
pub fn get_sampler_format(format: TextureFormat) -> SamplerFormat {
    match find_texture_info(format) {
        Some(entry) => entry.sampler_format,
        None => {
            debug_assert!(false, "no texture info for {format:?}");
            SamplerFormat::Float
        }
    }
}

/// Precision for `format`, `Default` if the format is not in the table.
pub fn get_sampler_precision(format: TextureFormat) -> Precision {
    match find_texture_info(format) {
        Some(entry) => entry.precision,
        None => {
            debug_assert!(false, "no texture info for {format:?}");
            Precision::Default
        }
    }
}

/// Returns true if the table is strictly increasing by format.
pub fn check_texture_info() -> bool {
    TEXTURE_INFO.windows(2).all(|pair| pair[0].format < pair[1].format)
}
