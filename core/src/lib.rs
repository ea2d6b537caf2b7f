//! # Lumen Core
//!
//! Value types shared by every layer of the Lumen driver:
//!
//! - [`handle::Handle`] - strongly-typed integer reference to a backend resource
//! - [`arena::HandleArena`] - slot table with a free list that backs handle ids
//! - [`sampler`] - packed sampler parameters and their filter/wrap/compare enums
//! - [`texture`] - texture formats, sampler types and usage flags

pub mod arena;
pub mod handle;
pub mod sampler;
pub mod texture;

pub use arena::{HandleArena, SlotState};
pub use handle::Handle;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
