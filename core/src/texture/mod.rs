//! Texture vocabulary.
//!
//! Provides [`TextureFormat`] together with the [`SamplerType`],
//! [`SamplerFormat`] and [`Precision`] enums and [`TextureUsage`] flags
//! shared between the command stream and backends.

mod types;

pub use types::{Precision, SamplerFormat, SamplerType, TextureFormat, TextureUsage};
