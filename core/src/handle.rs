//! Strongly-typed resource handles.
//!
//! A [`Handle<T>`] is a 32-bit id tagged at compile time with the kind of
//! resource it refers to. The low 24 bits are the slot index; the high 8 bits
//! are the slot's generation, bumped each time the slot is freed, so a handle
//! kept past its destroy no longer matches the slot's next occupant. The tag is zero-sized, so every handle has the same
//! representation, but `Handle<A>` and `Handle<B>` are different types and can
//! never be compared or assigned to each other.
//!
//! Handles carry no payload and own nothing. The backend's slot table owns the
//! resource; a handle is only a key into it.
//!
//! # Example
//!
//! ```
//! use lumen_core::Handle;
//!
//! struct Texture;
//!
//! let h: Handle<Texture> = Handle::new(3);
//! assert_eq!(h.id(), 3);
//! assert!(!h.is_nil());
//! assert!(Handle::<Texture>::default().is_nil());
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Raw integer representation of a handle.
pub type HandleId = u32;

/// Number of id bits holding the slot index.
pub const INDEX_BITS: u32 = 24;

/// Mask selecting the slot index from an id.
pub const INDEX_MASK: HandleId = (1 << INDEX_BITS) - 1;

/// Largest slot index a table may hand out. The all-ones index is kept for nil.
pub const MAX_INDEX: HandleId = INDEX_MASK - 1;

/// Handle to a resource of kind `T`.
///
/// `PhantomData<fn() -> T>` keeps the handle `Send + Sync + Copy` regardless of
/// what `T` is.
pub struct Handle<T> {
    id: HandleId,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Reserved id meaning "no resource".
    pub const NIL_ID: HandleId = HandleId::MAX;

    /// Create a handle from a raw id.
    pub const fn new(id: HandleId) -> Self {
        Self {
            id,
            _kind: PhantomData,
        }
    }

    /// Create a handle from a slot index and generation.
    pub const fn from_parts(index: HandleId, generation: u8) -> Self {
        Self::new((generation as HandleId) << INDEX_BITS | (index & INDEX_MASK))
    }

    /// The handle that refers to no resource.
    pub const fn nil() -> Self {
        Self::new(Self::NIL_ID)
    }

    /// Returns true if this handle refers to no resource.
    pub const fn is_nil(&self) -> bool {
        self.id == Self::NIL_ID
    }

    /// Raw id, generation included.
    pub const fn id(&self) -> HandleId {
        self.id
    }

    /// Generation of the slot this handle was issued for.
    pub const fn generation(&self) -> u8 {
        (self.id >> INDEX_BITS) as u8
    }

    /// Slot index for table lookups, or `None` for the nil handle.
    pub fn index(&self) -> Option<usize> {
        if self.is_nil() {
            None
        } else {
            Some((self.id & INDEX_MASK) as usize)
        }
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::nil()
    }
}

// Manual impls: derives would put bounds on `T`.

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or("?");
        let index = self.id & INDEX_MASK;
        match self.generation() {
            _ if self.is_nil() => write!(f, "Handle<{kind}>(nil)"),
            0 => write!(f, "Handle<{kind}>({index})"),
            generation => write!(f, "Handle<{kind}>({index}#{generation})"),
        }
    }
}

static_assertions::assert_eq_size!(Handle<()>, u32);
static_assertions::assert_impl_all!(Handle<std::rc::Rc<()>>: Send, Sync, Copy);
