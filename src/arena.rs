//! Index-addressed node pool used to break the parent/child reference cycle of linked trees.

use std::mem;
use std::ops::{Index, IndexMut};

/// A handle to an object stored in a `TypedArena<T>`.
///
/// Handles are plain indices: copying one never copies or aliases the object, and two handles
/// are equal exactly when they name the same slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Entry {
    chunk: usize,
    slot: usize,
}

enum Slot<T> {
    Occupied(T),
    Vacant(Option<Entry>),
}

/// A pool that hands out `Entry` handles for objects of a single type.
///
/// Storage grows one fixed-size chunk at a time, so objects are never moved once allocated.
/// Freed slots are threaded onto a free list and reused by the next allocation.
///
/// # Examples
///
/// ```
/// use red_black_collections::arena::TypedArena;
///
/// let mut arena = TypedArena::new(16);
/// let a = arena.allocate("a");
/// let b = arena.allocate("b");
/// assert_eq!(arena.len(), 2);
///
/// assert_eq!(arena.free(&a), "a");
/// assert_eq!(arena[b], "b");
/// assert_eq!(arena.get(&a), None);
/// ```
pub struct TypedArena<T> {
    chunks: Vec<Vec<Slot<T>>>,
    free_head: Option<Entry>,
    chunk_size: usize,
    len: usize,
}

impl<T> TypedArena<T> {
    /// Constructs a new, empty `TypedArena<T>` that grows by `chunk_size` objects at a time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Error: arena chunk size must be positive.");
        TypedArena {
            chunks: Vec::new(),
            free_head: None,
            chunk_size,
            len: 0,
        }
    }

    fn slot(&self, entry: &Entry) -> Option<&Slot<T>> {
        self.chunks.get(entry.chunk).and_then(|chunk| chunk.get(entry.slot))
    }

    fn slot_mut(&mut self, entry: &Entry) -> Option<&mut Slot<T>> {
        self.chunks
            .get_mut(entry.chunk)
            .and_then(|chunk| chunk.get_mut(entry.slot))
    }

    /// Stores `value` in the arena and returns the handle it can be reached by.
    pub fn allocate(&mut self, value: T) -> Entry {
        self.len += 1;

        if let Some(entry) = self.free_head {
            let slot = &mut self.chunks[entry.chunk][entry.slot];
            match mem::replace(slot, Slot::Occupied(value)) {
                Slot::Vacant(next) => self.free_head = next,
                Slot::Occupied(_) => panic!("Error: free list points at an occupied slot."),
            }
            return entry;
        }

        let needs_chunk = match self.chunks.last() {
            Some(chunk) => chunk.len() == self.chunk_size,
            None => true,
        };
        if needs_chunk {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
        }

        let chunk = self.chunks.len() - 1;
        let slots = &mut self.chunks[chunk];
        slots.push(Slot::Occupied(value));
        Entry {
            chunk,
            slot: slots.len() - 1,
        }
    }

    /// Releases the object behind `entry` and returns it. The slot is reused by a later
    /// allocation, so `entry` must not be used afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `entry` was never allocated or has already been freed.
    pub fn free(&mut self, entry: &Entry) -> T {
        let next = self.free_head;
        let slot = match self.slot_mut(entry) {
            Some(slot) => slot,
            None => panic!("Error: attempting to free an out of bounds entry."),
        };
        if let Slot::Vacant(_) = *slot {
            panic!("Error: attempting to free a vacant entry.");
        }

        match mem::replace(slot, Slot::Vacant(next)) {
            Slot::Occupied(value) => {
                self.free_head = Some(*entry);
                self.len -= 1;
                value
            },
            Slot::Vacant(_) => unreachable!(),
        }
    }

    /// Returns an immutable reference to the object behind `entry`, or `None` if the entry is
    /// out of bounds or vacant.
    pub fn get(&self, entry: &Entry) -> Option<&T> {
        match self.slot(entry) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the object behind `entry`, or `None` if the entry is out
    /// of bounds or vacant.
    pub fn get_mut(&mut self, entry: &Entry) -> Option<&mut T> {
        match self.slot_mut(entry) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the number of live objects in the arena.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of objects each chunk holds.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns `true` if the arena holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every object and releases all chunks. Every outstanding `Entry` becomes invalid.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.free_head = None;
        self.len = 0;
    }
}

impl<T> Index<Entry> for TypedArena<T> {
    type Output = T;

    fn index(&self, entry: Entry) -> &Self::Output {
        match self.get(&entry) {
            Some(value) => value,
            None => panic!("Error: dangling arena entry {:?}.", entry),
        }
    }
}

impl<T> IndexMut<Entry> for TypedArena<T> {
    fn index_mut(&mut self, entry: Entry) -> &mut Self::Output {
        match self.get_mut(&entry) {
            Some(value) => value,
            None => panic!("Error: dangling arena entry {:?}.", entry),
        }
    }
}
