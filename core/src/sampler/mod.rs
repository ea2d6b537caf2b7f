//! Sampler parameter types.
//!
//! Provides [`SamplerParams`], the per-binding sampling state that travels
//! with a texture handle, along with [`MagFilter`], [`MinFilter`],
//! [`WrapMode`], [`CompareMode`] and [`CompareFunction`].

mod types;

pub use types::{
    CompareFunction, CompareMode, MAX_ANISOTROPY_LOG2, MagFilter, MinFilter, SamplerParams,
    WrapMode,
};
