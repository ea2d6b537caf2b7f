//! Packed rasterizer, blend and depth state.
//!
//! [`RasterState`] packs every field into one `u32` so that render-state
//! diffing is a single integer compare. Layout, least significant bit first:
//!
//! | bits  | field                    |
//! |-------|--------------------------|
//! | 0-1   | culling                  |
//! | 2-4   | blend equation (rgb)     |
//! | 5-7   | blend equation (alpha)   |
//! | 8-11  | blend src factor (rgb)   |
//! | 12-15 | blend src factor (alpha) |
//! | 16-19 | blend dst factor (rgb)   |
//! | 20-23 | blend dst factor (alpha) |
//! | 24    | depth write              |
//! | 25-27 | depth compare function   |
//! | 28    | color write              |
//! | 29    | alpha to coverage        |
//! | 30-31 | padding (always zero)    |

use lumen_core::sampler::CompareFunction;

/// Face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CullingMode {
    /// No culling.
    None = 0,
    /// Cull front faces.
    Front = 1,
    /// Cull back faces.
    Back = 2,
    /// Cull all faces.
    FrontAndBack = 3,
}

impl CullingMode {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Self::None,
            1 => Self::Front,
            2 => Self::Back,
            _ => Self::FrontAndBack,
        }
    }
}

/// Blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlendEquation {
    /// `src + dst`
    Add = 0,
    /// `src - dst`
    Subtract = 1,
    /// `dst - src`
    ReverseSubtract = 2,
    /// `min(src, dst)`
    Min = 3,
    /// `max(src, dst)`
    Max = 4,
}

impl BlendEquation {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0x7 {
            0 => Self::Add,
            1 => Self::Subtract,
            2 => Self::ReverseSubtract,
            3 => Self::Min,
            _ => Self::Max,
        }
    }
}

/// Blend factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlendFunction {
    Zero = 0,
    One = 1,
    SrcColor = 2,
    OneMinusSrcColor = 3,
    DstColor = 4,
    OneMinusDstColor = 5,
    SrcAlpha = 6,
    OneMinusSrcAlpha = 7,
    DstAlpha = 8,
    OneMinusDstAlpha = 9,
    SrcAlphaSaturate = 10,
}

impl BlendFunction {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0xf {
            0 => Self::Zero,
            1 => Self::One,
            2 => Self::SrcColor,
            3 => Self::OneMinusSrcColor,
            4 => Self::DstColor,
            5 => Self::OneMinusDstColor,
            6 => Self::SrcAlpha,
            7 => Self::OneMinusSrcAlpha,
            8 => Self::DstAlpha,
            9 => Self::OneMinusDstAlpha,
            _ => Self::SrcAlphaSaturate,
        }
    }
}

const CULLING_SHIFT: u32 = 0;
const EQUATION_RGB_SHIFT: u32 = 2;
const EQUATION_ALPHA_SHIFT: u32 = 5;
const SRC_RGB_SHIFT: u32 = 8;
const SRC_ALPHA_SHIFT: u32 = 12;
const DST_RGB_SHIFT: u32 = 16;
const DST_ALPHA_SHIFT: u32 = 20;
const DEPTH_WRITE_SHIFT: u32 = 24;
const DEPTH_FUNC_SHIFT: u32 = 25;
const COLOR_WRITE_SHIFT: u32 = 28;
const ALPHA_TO_COVERAGE_SHIFT: u32 = 29;

const CULLING_MASK: u32 = 0x3;
const EQUATION_MASK: u32 = 0x7;
const FUNCTION_MASK: u32 = 0xf;
const FLAG_MASK: u32 = 0x1;
const DEPTH_FUNC_MASK: u32 = 0x7;

/// Rasterizer, blend and depth state packed into 32 bits.
///
/// Fields are only reachable through the accessors below, so the two padding
/// bits are always zero and equality is plain word equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState(u32);

static_assertions::assert_eq_size!(RasterState, u32);

impl RasterState {
    /// Raw packed representation.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[inline]
    const fn field(&self, shift: u32, mask: u32) -> u32 {
        (self.0 >> shift) & mask
    }

    #[inline]
    fn set_field(&mut self, shift: u32, mask: u32, value: u32) {
        self.0 = (self.0 & !(mask << shift)) | ((value & mask) << shift);
    }

    pub const fn culling(&self) -> CullingMode {
        CullingMode::from_bits(self.field(CULLING_SHIFT, CULLING_MASK))
    }

    pub fn set_culling(&mut self, mode: CullingMode) {
        self.set_field(CULLING_SHIFT, CULLING_MASK, mode as u32);
    }

    pub const fn blend_equation_rgb(&self) -> BlendEquation {
        BlendEquation::from_bits(self.field(EQUATION_RGB_SHIFT, EQUATION_MASK))
    }

    pub fn set_blend_equation_rgb(&mut self, equation: BlendEquation) {
        self.set_field(EQUATION_RGB_SHIFT, EQUATION_MASK, equation as u32);
    }

    pub const fn blend_equation_alpha(&self) -> BlendEquation {
        BlendEquation::from_bits(self.field(EQUATION_ALPHA_SHIFT, EQUATION_MASK))
    }

    pub fn set_blend_equation_alpha(&mut self, equation: BlendEquation) {
        self.set_field(EQUATION_ALPHA_SHIFT, EQUATION_MASK, equation as u32);
    }

    pub const fn blend_function_src_rgb(&self) -> BlendFunction {
        BlendFunction::from_bits(self.field(SRC_RGB_SHIFT, FUNCTION_MASK))
    }

    pub fn set_blend_function_src_rgb(&mut self, function: BlendFunction) {
        self.set_field(SRC_RGB_SHIFT, FUNCTION_MASK, function as u32);
    }

    pub const fn blend_function_src_alpha(&self) -> BlendFunction {
        BlendFunction::from_bits(self.field(SRC_ALPHA_SHIFT, FUNCTION_MASK))
    }

    pub fn set_blend_function_src_alpha(&mut self, function: BlendFunction) {
        self.set_field(SRC_ALPHA_SHIFT, FUNCTION_MASK, function as u32);
    }

    pub const fn blend_function_dst_rgb(&self) -> BlendFunction {
        BlendFunction::from_bits(self.field(DST_RGB_SHIFT, FUNCTION_MASK))
    }

    pub fn set_blend_function_dst_rgb(&mut self, function: BlendFunction) {
        self.set_field(DST_RGB_SHIFT, FUNCTION_MASK, function as u32);
    }

    pub const fn blend_function_dst_alpha(&self) -> BlendFunction {
        BlendFunction::from_bits(self.field(DST_ALPHA_SHIFT, FUNCTION_MASK))
    }

    pub fn set_blend_function_dst_alpha(&mut self, function: BlendFunction) {
        self.set_field(DST_ALPHA_SHIFT, FUNCTION_MASK, function as u32);
    }

    pub const fn depth_write(&self) -> bool {
        self.field(DEPTH_WRITE_SHIFT, FLAG_MASK) != 0
    }

    pub fn set_depth_write(&mut self, enable: bool) {
        self.set_field(DEPTH_WRITE_SHIFT, FLAG_MASK, enable as u32);
    }

    pub const fn depth_func(&self) -> CompareFunction {
        CompareFunction::from_bits(self.field(DEPTH_FUNC_SHIFT, DEPTH_FUNC_MASK))
    }

    pub fn set_depth_func(&mut self, func: CompareFunction) {
        self.set_field(DEPTH_FUNC_SHIFT, DEPTH_FUNC_MASK, func as u32);
    }

    pub const fn color_write(&self) -> bool {
        self.field(COLOR_WRITE_SHIFT, FLAG_MASK) != 0
    }

    pub fn set_color_write(&mut self, enable: bool) {
        self.set_field(COLOR_WRITE_SHIFT, FLAG_MASK, enable as u32);
    }

    pub const fn alpha_to_coverage(&self) -> bool {
        self.field(ALPHA_TO_COVERAGE_SHIFT, FLAG_MASK) != 0
    }

    pub fn set_alpha_to_coverage(&mut self, enable: bool) {
        self.set_field(ALPHA_TO_COVERAGE_SHIFT, FLAG_MASK, enable as u32);
    }

    /// Set both blend equations.
    pub fn set_blend_equation(&mut self, rgb: BlendEquation, alpha: BlendEquation) {
        self.set_blend_equation_rgb(rgb);
        self.set_blend_equation_alpha(alpha);
    }

    /// Set all four blend factors.
    pub fn set_blend_functions(
        &mut self,
        src_rgb: BlendFunction,
        src_alpha: BlendFunction,
        dst_rgb: BlendFunction,
        dst_alpha: BlendFunction,
    ) {
        self.set_blend_function_src_rgb(src_rgb);
        self.set_blend_function_src_alpha(src_alpha);
        self.set_blend_function_dst_rgb(dst_rgb);
        self.set_blend_function_dst_alpha(dst_alpha);
    }

    /// Returns true unless the blend fields are exactly `Add/Add, One/One, Zero/Zero`.
    pub fn has_blending(&self) -> bool {
        !(self.blend_equation_rgb() == BlendEquation::Add
            && self.blend_equation_alpha() == BlendEquation::Add
            && self.blend_function_src_rgb() == BlendFunction::One
            && self.blend_function_src_alpha() == BlendFunction::One
            && self.blend_function_dst_rgb() == BlendFunction::Zero
            && self.blend_function_dst_alpha() == BlendFunction::Zero)
    }

    /// Reset the six blend fields to the disabled combination.
    ///
    /// Culling, depth, color write and alpha-to-coverage are left alone.
    pub fn disable_blending(&mut self) {
        self.set_blend_equation(BlendEquation::Add, BlendEquation::Add);
        self.set_blend_functions(
            BlendFunction::One,
            BlendFunction::One,
            BlendFunction::Zero,
            BlendFunction::Zero,
        );
    }
}

impl Default for RasterState {
    fn default() -> Self {
        let mut state = Self(0);
        state.set_culling(CullingMode::Back);
        state.disable_blending();
        state.set_depth_write(false);
        state.set_depth_func(CompareFunction::LessEqual);
        state.set_color_write(false);
        state.set_alpha_to_coverage(false);
        state
    }
}

impl std::fmt::Debug for RasterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterState")
            .field("culling", &self.culling())
            .field("blend_equation_rgb", &self.blend_equation_rgb())
            .field("blend_equation_alpha", &self.blend_equation_alpha())
            .field("blend_function_src_rgb", &self.blend_function_src_rgb())
            .field("blend_function_src_alpha", &self.blend_function_src_alpha())
            .field("blend_function_dst_rgb", &self.blend_function_dst_rgb())
            .field("blend_function_dst_alpha", &self.blend_function_dst_alpha())
            .field("depth_write", &self.depth_write())
            .field("depth_func", &self.depth_func())
            .field("color_write", &self.color_write())
            .field("alpha_to_coverage", &self.alpha_to_coverage())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        assert_eq!(std::mem::size_of::<RasterState>(), 4);
    }

    #[test]
    fn test_default_state() {
        let rs = RasterState::default();
        assert!(!rs.has_blending());
        assert_eq!(rs.culling(), CullingMode::Back);
        assert_eq!(rs.depth_func(), CompareFunction::LessEqual);
        assert!(!rs.depth_write());
        assert!(!rs.color_write());
        assert!(!rs.alpha_to_coverage());
    }

    #[test]
    fn test_padding_stays_zero() {
        let mut rs = RasterState::default();
        rs.set_culling(CullingMode::FrontAndBack);
        rs.set_blend_functions(
            BlendFunction::SrcAlphaSaturate,
            BlendFunction::SrcAlphaSaturate,
            BlendFunction::SrcAlphaSaturate,
            BlendFunction::SrcAlphaSaturate,
        );
        rs.set_depth_func(CompareFunction::Never);
        rs.set_depth_write(true);
        rs.set_color_write(true);
        rs.set_alpha_to_coverage(true);
        assert_eq!(rs.bits() >> 30, 0);
    }

    #[test]
    fn test_any_blend_field_enables_blending() {
        let mut rs = RasterState::default();
        rs.set_blend_function_dst_alpha(BlendFunction::One);
        assert!(rs.has_blending());

        let mut rs = RasterState::default();
        rs.set_blend_equation_alpha(BlendEquation::Max);
        assert!(rs.has_blending());
    }

    #[test]
    fn test_disable_blending_only_touches_blend_fields() {
        let mut rs = RasterState::default();
        rs.set_culling(CullingMode::None);
        rs.set_depth_write(true);
        rs.set_depth_func(CompareFunction::Greater);
        rs.set_color_write(true);
        rs.set_alpha_to_coverage(true);
        rs.set_blend_equation(BlendEquation::Subtract, BlendEquation::Min);
        rs.set_blend_functions(
            BlendFunction::SrcAlpha,
            BlendFunction::One,
            BlendFunction::OneMinusSrcAlpha,
            BlendFunction::OneMinusSrcAlpha,
        );
        assert!(rs.has_blending());

        rs.disable_blending();
        assert!(!rs.has_blending());
        assert_eq!(rs.culling(), CullingMode::None);
        assert!(rs.depth_write());
        assert_eq!(rs.depth_func(), CompareFunction::Greater);
        assert!(rs.color_write());
        assert!(rs.alpha_to_coverage());
    }

    #[test]
    fn test_equality_is_word_equality() {
        let mut a = RasterState::default();
        let mut b = RasterState::default();
        assert_eq!(a, b);
        a.set_color_write(true);
        assert_ne!(a, b);
        b.set_color_write(true);
        assert_eq!(a, b);
        assert_eq!(a.bits(), b.bits());
    }

    #[test]
    fn test_field_round_trip() {
        let mut rs = RasterState::default();
        rs.set_blend_function_src_rgb(BlendFunction::DstAlpha);
        rs.set_blend_function_dst_rgb(BlendFunction::OneMinusDstColor);
        rs.set_blend_equation_rgb(BlendEquation::ReverseSubtract);
        assert_eq!(rs.blend_function_src_rgb(), BlendFunction::DstAlpha);
        assert_eq!(rs.blend_function_dst_rgb(), BlendFunction::OneMinusDstColor);
        assert_eq!(rs.blend_equation_rgb(), BlendEquation::ReverseSubtract);
        // Neighbouring fields are untouched.
        assert_eq!(rs.blend_function_src_alpha(), BlendFunction::One);
        assert_eq!(rs.blend_function_dst_alpha(), BlendFunction::Zero);
    }
}
