//! Buffer payloads and vertex layout types.

use std::fmt;

use bitflags::bitflags;

/// Maximum number of vertex attributes per vertex buffer.
pub const MAX_VERTEX_ATTRIBUTE_COUNT: usize = 16;

/// Maximum number of buffer slots per vertex buffer.
pub const MAX_VERTEX_BUFFER_COUNT: usize = 8;

/// Number of uniform buffer binding points.
pub const MAX_UNIFORM_BUFFER_BINDINGS: usize = 8;

/// Expected update frequency of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Written once, used many times.
    #[default]
    Static,
    /// Rewritten occasionally.
    Dynamic,
    /// Rewritten every frame.
    Stream,
}

/// What a buffer object is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferObjectBinding {
    /// Vertex data.
    #[default]
    Vertex,
    /// Uniform block data.
    Uniform,
}

/// Type of a vertex attribute element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementType {
    Byte,
    Byte2,
    Byte3,
    Byte4,
    UByte,
    UByte2,
    UByte3,
    UByte4,
    Short,
    Short2,
    Short3,
    Short4,
    UShort,
    UShort2,
    UShort3,
    UShort4,
    Int,
    UInt,
    #[default]
    Float,
    Float2,
    Float3,
    Float4,
    Half,
    Half2,
    Half3,
    Half4,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Self::Byte | Self::UByte => 1,
            Self::Byte2 | Self::UByte2 | Self::Short | Self::UShort | Self::Half => 2,
            Self::Byte3 | Self::UByte3 => 3,
            Self::Byte4
            | Self::UByte4
            | Self::Short2
            | Self::UShort2
            | Self::Int
            | Self::UInt
            | Self::Float
            | Self::Half2 => 4,
            Self::Short3 | Self::UShort3 | Self::Half3 => 6,
            Self::Short4 | Self::UShort4 | Self::Float2 | Self::Half4 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
        }
    }
}

/// Element type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    /// 16-bit indices.
    #[default]
    UShort,
    /// 32-bit indices.
    UInt,
}

impl IndexType {
    /// Size of one index in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Self::UShort => 2,
            Self::UInt => 4,
        }
    }
}

bitflags! {
    /// Per-attribute interpretation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttributeFlags: u8 {
        /// Integer data is normalized to `[0, 1]` or `[-1, 1]`.
        const NORMALIZED = 1 << 0;
        /// Integer data is exposed to the shader as integers.
        const INTEGER_TARGET = 1 << 1;
    }
}

impl Default for AttributeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// One vertex attribute in a vertex buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute {
    /// Byte offset of the first element in its buffer.
    pub offset: u32,
    /// Byte distance between consecutive elements.
    pub stride: u8,
    /// Buffer slot holding the data, or [`Attribute::BUFFER_UNUSED`].
    pub buffer: u8,
    /// Element type.
    pub element_type: ElementType,
    /// Interpretation flags.
    pub flags: AttributeFlags,
}

impl Attribute {
    /// Marks an attribute slot that is not fed by any buffer.
    pub const BUFFER_UNUSED: u8 = u8::MAX;

    /// Create an attribute reading `element_type` from `buffer`.
    pub fn new(buffer: u8, element_type: ElementType, offset: u32, stride: u8) -> Self {
        Self {
            offset,
            stride,
            buffer,
            element_type,
            flags: AttributeFlags::empty(),
        }
    }

    /// Set interpretation flags.
    pub fn with_flags(mut self, flags: AttributeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns true if this slot is fed by a buffer.
    pub fn is_used(&self) -> bool {
        self.buffer != Self::BUFFER_UNUSED
    }
}

impl Default for Attribute {
    fn default() -> Self {
        Self {
            offset: 0,
            stride: 0,
            buffer: Self::BUFFER_UNUSED,
            element_type: ElementType::default(),
            flags: AttributeFlags::empty(),
        }
    }
}

/// Fixed-size vertex layout.
pub type AttributeArray = [Attribute; MAX_VERTEX_ATTRIBUTE_COUNT];

/// Callback receiving a buffer's memory back once the driver is done with it.
pub type ReleaseCallback = Box<dyn FnOnce(Vec<u8>) + Send + 'static>;

/// Data handed to the driver, with an optional release callback.
///
/// The driver consumes the bytes on the render thread. If a callback is set,
/// the bytes are handed back through it during the next
/// [`purge`](crate::backend::DriverBase::purge) after the driver is done; the
/// callback runs at most once. A descriptor without a callback is simply
/// dropped once consumed.
#[derive(Default)]
pub struct BufferDescriptor {
    data: Vec<u8>,
    callback: Option<ReleaseCallback>,
}

impl BufferDescriptor {
    /// Create a descriptor without a release callback.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            callback: None,
        }
    }

    /// Create a descriptor whose memory is handed back to `callback`.
    pub fn with_callback(data: Vec<u8>, callback: impl FnOnce(Vec<u8>) + Send + 'static) -> Self {
        Self {
            data,
            callback: Some(Box::new(callback)),
        }
    }

    /// Replace the release callback.
    pub fn set_callback(&mut self, callback: impl FnOnce(Vec<u8>) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Returns true if a release callback is set.
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// The payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the payload (used by readbacks).
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Split into payload and callback.
    pub fn into_parts(self) -> (Vec<u8>, Option<ReleaseCallback>) {
        (self.data, self.callback)
    }
}

impl fmt::Debug for BufferDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferDescriptor")
            .field("len", &self.data.len())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl From<Vec<u8>> for BufferDescriptor {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

/// Layout of the channels in a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelDataFormat {
    R,
    RInteger,
    Rg,
    RgInteger,
    Rgb,
    RgbInteger,
    #[default]
    Rgba,
    RgbaInteger,
    DepthComponent,
    DepthStencil,
    Alpha,
}

impl PixelDataFormat {
    /// Number of components per pixel.
    pub fn component_count(&self) -> u32 {
        match self {
            Self::R | Self::RInteger | Self::DepthComponent | Self::Alpha => 1,
            Self::Rg | Self::RgInteger | Self::DepthStencil => 2,
            Self::Rgb | Self::RgbInteger => 3,
            Self::Rgba | Self::RgbaInteger => 4,
        }
    }
}

/// Type of each component in a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelDataType {
    #[default]
    UByte,
    Byte,
    UShort,
    Short,
    UInt,
    Int,
    Half,
    Float,
}

impl PixelDataType {
    /// Size of one component in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Self::UByte | Self::Byte => 1,
            Self::UShort | Self::Short | Self::Half => 2,
            Self::UInt | Self::Int | Self::Float => 4,
        }
    }
}

/// Pixel data plus the layout needed to interpret it.
#[derive(Debug)]
pub struct PixelBufferDescriptor {
    /// Payload and release callback.
    pub buffer: BufferDescriptor,
    /// Channel layout.
    pub format: PixelDataFormat,
    /// Component type.
    pub data_type: PixelDataType,
    /// Row alignment in bytes (1, 2, 4 or 8).
    pub alignment: u8,
    /// Left offset in pixels within each row.
    pub left: u32,
    /// Top offset in rows.
    pub top: u32,
    /// Row length in pixels; 0 means "same as the image width".
    pub stride: u32,
}

impl PixelBufferDescriptor {
    /// Create a pixel descriptor with 1-byte row alignment.
    pub fn new(buffer: BufferDescriptor, format: PixelDataFormat, data_type: PixelDataType) -> Self {
        Self {
            buffer,
            format,
            data_type,
            alignment: 1,
            left: 0,
            top: 0,
            stride: 0,
        }
    }

    /// Set the row alignment.
    pub fn with_alignment(mut self, alignment: u8) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the row length in pixels.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Bytes needed for `height` rows of `stride` pixels at the given alignment.
    ///
    /// Rows round up to a multiple of `alignment`; zero counts as one.
    pub fn compute_data_size(
        format: PixelDataFormat,
        data_type: PixelDataType,
        stride: u32,
        height: u32,
        alignment: u8,
    ) -> usize {
        let alignment = usize::from(alignment.max(1));
        let bytes_per_pixel = (format.component_count() * data_type.size()) as usize;
        let bytes_per_row = bytes_per_pixel * stride as usize;
        let aligned_row = bytes_per_row.next_multiple_of(alignment);
        aligned_row * height as usize
    }

    /// Row length to use for an image `width` pixels wide.
    pub fn effective_stride(&self, width: u32) -> u32 {
        if self.stride == 0 { width } else { self.stride }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_element_sizes() {
        assert_eq!(ElementType::Float3.size(), 12);
        assert_eq!(ElementType::Half4.size(), 8);
        assert_eq!(ElementType::UByte4.size(), 4);
        assert_eq!(IndexType::UInt.size(), 4);
    }

    #[test]
    fn test_default_attribute_is_unused() {
        let attr = Attribute::default();
        assert!(!attr.is_used());
        assert!(Attribute::new(0, ElementType::Float3, 0, 12).is_used());
    }

    #[test]
    fn test_buffer_descriptor_parts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let desc = BufferDescriptor::with_callback(vec![1, 2, 3], move |data| {
            assert_eq!(data, vec![1, 2, 3]);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(desc.has_callback());
        assert_eq!(desc.len(), 3);

        let (data, callback) = desc.into_parts();
        callback.expect("callback")(data);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_buffer_descriptor_debug() {
        let debug = format!("{:?}", BufferDescriptor::new(vec![0; 16]));
        assert!(debug.contains("16"));
        assert!(debug.contains("has_callback: false"));
    }

    #[test]
    fn test_compute_data_size() {
        // 3 RGB ubyte pixels = 9 bytes, padded to 12 at 4-byte alignment.
        let size = PixelBufferDescriptor::compute_data_size(
            PixelDataFormat::Rgb,
            PixelDataType::UByte,
            3,
            2,
            4,
        );
        assert_eq!(size, 24);

        let size = PixelBufferDescriptor::compute_data_size(
            PixelDataFormat::Rgba,
            PixelDataType::Float,
            4,
            4,
            1,
        );
        assert_eq!(size, 256);
    }

    #[test]
    fn test_compute_data_size_odd_alignment() {
        // 5 RGB ubyte pixels = 15 bytes; rows never shrink below the payload.
        let size = PixelBufferDescriptor::compute_data_size(
            PixelDataFormat::Rgb,
            PixelDataType::UByte,
            5,
            2,
            6,
        );
        assert_eq!(size, 36);

        let size = PixelBufferDescriptor::compute_data_size(
            PixelDataFormat::R,
            PixelDataType::UByte,
            7,
            1,
            0,
        );
        assert_eq!(size, 7);
    }

    #[test]
    fn test_effective_stride() {
        let pbd = PixelBufferDescriptor::new(
            BufferDescriptor::default(),
            PixelDataFormat::Rgba,
            PixelDataType::UByte,
        );
        assert_eq!(pbd.effective_stride(64), 64);
        assert_eq!(pbd.with_stride(128).effective_stride(64), 128);
    }
}
