//! Slot table backing [`Handle`] ids.
//!
//! [`HandleArena<T>`] is a growable array of slots plus a free list. A handle's
//! id is its slot index. Slots move through an explicit lifecycle:
//!
//! ```text
//!   allocate()        construct()        retire()            free()
//! Vacant ──────► Pending ──────► Live ──────► Retiring ──────► Vacant
//!                   │                            ▲
//!                   └────────── retire() ────────┘
//! ```
//!
//! Allocation and retirement happen when a command is *recorded*; construction
//! and freeing happen when it *executes*. Keeping the two halves apart lets a
//! caller hold a valid id for a resource that does not exist yet, and lets
//! commands recorded before a destroy still reach the resource.
//!
//! Freed slot indices are reused, most recently freed first. Each free bumps
//! the slot's generation, so handles to the previous occupant stop resolving:
//! they read as [`SlotState::Vacant`] and every operation on them is a no-op.
//! Generations are 8 bits wide and wrap after 256 reuses of one slot.
//!
//! # Example
//!
//! ```
//! use lumen_core::{HandleArena, SlotState};
//!
//! let mut arena = HandleArena::<String>::new();
//! let h = arena.allocate();
//! assert_eq!(arena.state(h), SlotState::Pending);
//!
//! arena.construct(h, "albedo".to_string());
//! assert_eq!(arena.get(h).map(String::as_str), Some("albedo"));
//!
//! arena.retire(h);
//! assert!(arena.get(h).is_some());
//!
//! assert_eq!(arena.free(h).as_deref(), Some("albedo"));
//! assert_eq!(arena.state(h), SlotState::Vacant);
//! ```

use crate::handle::{Handle, HandleId, MAX_INDEX};

/// Observable lifecycle state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// Not allocated (never used, or freed).
    Vacant,
    /// Id handed out, resource not constructed yet.
    Pending,
    /// Resource constructed and usable.
    Live,
    /// Destroy recorded but not yet executed.
    Retiring,
}

#[derive(Debug)]
enum Slot<T> {
    Vacant,
    Pending,
    Live(T),
    /// The value is `None` when the destroy was recorded before the create ran.
    Retiring(Option<T>),
}

impl<T> Slot<T> {
    fn state(&self) -> SlotState {
        match self {
            Slot::Vacant => SlotState::Vacant,
            Slot::Pending => SlotState::Pending,
            Slot::Live(_) => SlotState::Live,
            Slot::Retiring(_) => SlotState::Retiring,
        }
    }
}

/// Growable slot table with a free list.
#[derive(Debug)]
pub struct HandleArena<T> {
    slots: Vec<Slot<T>>,
    generations: Vec<u8>,
    free: Vec<HandleId>,
    occupied: usize,
}

impl<T> HandleArena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            occupied: 0,
        }
    }

    /// Create an empty arena with room for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free: Vec::new(),
            occupied: 0,
        }
    }

    /// Reserve a slot and return its handle in the [`SlotState::Pending`] state.
    pub fn allocate(&mut self) -> Handle<T> {
        self.occupied += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Slot::Pending;
            return Handle::from_parts(index, self.generations[index as usize]);
        }
        let index = self.slots.len() as HandleId;
        debug_assert!(index <= MAX_INDEX, "handle arena exhausted");
        self.slots.push(Slot::Pending);
        self.generations.push(0);
        Handle::from_parts(index, 0)
    }

    /// Store the resource for a previously allocated handle.
    ///
    /// A retiring slot keeps its retiring state; the value stays reachable
    /// until [`free`](Self::free) runs. Returns `false` if the slot was not
    /// allocated, in which case `value` is dropped.
    pub fn construct(&mut self, handle: Handle<T>, value: T) -> bool {
        let Some(slot) = self.slot_mut(handle) else {
            return false;
        };
        match slot {
            Slot::Pending => {
                *slot = Slot::Live(value);
                true
            }
            Slot::Retiring(inner) if inner.is_none() => {
                *inner = Some(value);
                true
            }
            Slot::Vacant | Slot::Live(_) | Slot::Retiring(_) => false,
        }
    }

    /// Mark a pending or live slot as scheduled for destruction.
    ///
    /// Returns `false` if the slot was vacant or already retiring.
    pub fn retire(&mut self, handle: Handle<T>) -> bool {
        let Some(slot) = self.slot_mut(handle) else {
            return false;
        };
        match std::mem::replace(slot, Slot::Vacant) {
            Slot::Pending => {
                *slot = Slot::Retiring(None);
                true
            }
            Slot::Live(value) => {
                *slot = Slot::Retiring(Some(value));
                true
            }
            other => {
                *slot = other;
                false
            }
        }
    }

    /// Release a slot and return its resource, if one was constructed.
    ///
    /// The slot index goes back on the free list with its generation bumped.
    pub fn free(&mut self, handle: Handle<T>) -> Option<T> {
        let index = self.slot_index(handle)?;
        let slot = &mut self.slots[index];
        let value = match std::mem::replace(slot, Slot::Vacant) {
            Slot::Vacant => return None,
            Slot::Pending => None,
            Slot::Live(value) => Some(value),
            Slot::Retiring(value) => value,
        };
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free.push(index as HandleId);
        self.occupied -= 1;
        value
    }

    /// Lifecycle state of the slot behind `handle`.
    pub fn state(&self, handle: Handle<T>) -> SlotState {
        self.slot(handle).map_or(SlotState::Vacant, Slot::state)
    }

    /// Returns true if the handle points at a constructed resource.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Access a constructed resource (live or retiring).
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        match self.slot(handle)? {
            Slot::Live(value) | Slot::Retiring(Some(value)) => Some(value),
            _ => None,
        }
    }

    /// Mutably access a constructed resource (live or retiring).
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        match self.slot_mut(handle)? {
            Slot::Live(value) | Slot::Retiring(Some(value)) => Some(value),
            _ => None,
        }
    }

    /// Number of slots that are not vacant.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns true if no slot is in use.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Total number of slots ever created (vacant ones included).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over constructed resources.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots
            .iter()
            .zip(&self.generations)
            .enumerate()
            .filter_map(|(index, (slot, generation))| match slot {
                Slot::Live(value) | Slot::Retiring(Some(value)) => {
                    Some((Handle::from_parts(index as HandleId, *generation), value))
                }
                _ => None,
            })
    }

    /// Drop every resource and forget all ids.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.generations.clear();
        self.free.clear();
        self.occupied = 0;
    }

    /// Index of the slot `handle` was issued for, if its generation still matches.
    fn slot_index(&self, handle: Handle<T>) -> Option<usize> {
        let index = handle.index()?;
        (self.generations.get(index) == Some(&handle.generation())).then_some(index)
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        self.slots.get(self.slot_index(handle)?)
    }

    fn slot_mut(&mut self, handle: Handle<T>) -> Option<&mut Slot<T>> {
        let index = self.slot_index(handle)?;
        self.slots.get_mut(index)
    }
}

impl<T> Default for HandleArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_pending() {
        let mut arena = HandleArena::<u32>::new();
        let h = arena.allocate();
        assert_eq!(h.id(), 0);
        assert_eq!(arena.state(h), SlotState::Pending);
        assert!(arena.get(h).is_none());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut arena = HandleArena::<u32>::new();
        let h = arena.allocate();
        assert!(arena.construct(h, 42));
        assert_eq!(arena.state(h), SlotState::Live);
        assert_eq!(arena.get(h), Some(&42));

        assert!(arena.retire(h));
        assert_eq!(arena.state(h), SlotState::Retiring);
        assert_eq!(arena.get(h), Some(&42));

        assert_eq!(arena.free(h), Some(42));
        assert_eq!(arena.state(h), SlotState::Vacant);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_retire_before_construct_keeps_value() {
        let mut arena = HandleArena::<u32>::new();
        let h = arena.allocate();
        assert!(arena.retire(h));
        assert!(arena.construct(h, 7));
        assert_eq!(arena.state(h), SlotState::Retiring);
        assert_eq!(arena.get(h), Some(&7));
        assert_eq!(arena.free(h), Some(7));
    }

    #[test]
    fn test_free_pending_slot() {
        let mut arena = HandleArena::<u32>::new();
        let h = arena.allocate();
        assert_eq!(arena.free(h), None);
        assert_eq!(arena.state(h), SlotState::Vacant);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn test_ids_are_reused_lifo() {
        let mut arena = HandleArena::<u32>::new();
        let a = arena.allocate();
        let b = arena.allocate();
        arena.free(a);
        arena.free(b);
        assert_eq!(arena.allocate().index(), b.index());
        assert_eq!(arena.allocate().index(), a.index());
        assert_eq!(arena.slot_count(), 2);
    }

    #[test]
    fn test_reused_slot_rejects_old_handle() {
        let mut arena = HandleArena::<u32>::new();
        let old = arena.allocate();
        arena.construct(old, 1);
        arena.retire(old);
        arena.free(old);

        let new = arena.allocate();
        arena.construct(new, 2);
        assert_eq!(new.index(), old.index());
        assert_eq!(new.generation(), old.generation() + 1);

        assert_eq!(arena.state(old), SlotState::Vacant);
        assert_eq!(arena.get(old), None);
        assert_eq!(arena.get_mut(old), None);
        assert!(!arena.retire(old));
        assert_eq!(arena.free(old), None);
        assert!(!arena.construct(old, 3));

        assert_eq!(arena.get(new), Some(&2));
        assert_eq!(arena.len(), 1);
        let items: Vec<_> = arena.iter().map(|(h, v)| (h, *v)).collect();
        assert_eq!(items, vec![(new, 2)]);
    }

    #[test]
    fn test_double_free_is_ignored() {
        let mut arena = HandleArena::<u32>::new();
        let h = arena.allocate();
        arena.construct(h, 1);
        assert_eq!(arena.free(h), Some(1));
        assert_eq!(arena.free(h), None);
        assert_eq!(arena.len(), 0);
        // The id must only be on the free list once.
        let a = arena.allocate();
        let b = arena.allocate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_handles() {
        let mut arena = HandleArena::<u32>::new();
        assert_eq!(arena.state(Handle::nil()), SlotState::Vacant);
        assert_eq!(arena.state(Handle::new(12)), SlotState::Vacant);
        assert!(!arena.construct(Handle::new(12), 1));
        assert!(!arena.retire(Handle::nil()));
        assert_eq!(arena.free(Handle::new(3)), None);
    }

    #[test]
    fn test_construct_twice_is_rejected() {
        let mut arena = HandleArena::<u32>::new();
        let h = arena.allocate();
        assert!(arena.construct(h, 1));
        assert!(!arena.construct(h, 2));
        assert_eq!(arena.get(h), Some(&1));
    }

    #[test]
    fn test_iter_skips_unconstructed() {
        let mut arena = HandleArena::<u32>::new();
        let a = arena.allocate();
        let _pending = arena.allocate();
        let c = arena.allocate();
        arena.construct(a, 10);
        arena.construct(c, 30);
        arena.retire(c);
        let items: Vec<_> = arena.iter().map(|(h, v)| (h, *v)).collect();
        assert_eq!(items, vec![(a, 10), (c, 30)]);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = HandleArena::<Vec<u8>>::new();
        let h = arena.allocate();
        arena.construct(h, Vec::new());
        arena.get_mut(h).unwrap().push(9);
        assert_eq!(arena.get(h), Some(&vec![9]));
    }
}
