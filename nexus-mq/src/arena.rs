//! Growable slot storage with stable indices.
//!
//! The arena hands out a [`NodeId`] per inserted value. An id stays valid
//! until the value is removed; vacated slots are threaded onto a free list and
//! reused by later inserts, so steady-state traffic does not allocate.
//!
//! Growth goes through [`Vec::try_reserve`], which lets allocation failure
//! surface as an error instead of aborting the process.

use core::mem;

use crate::error::Full;
use crate::index::NodeId;

enum Slot<T> {
    Occupied(T),
    /// Free slot, linking to the next free slot (or `NONE`).
    Vacant(NodeId),
}

/// Slot storage addressed by [`NodeId`].
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: NodeId,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: NodeId::NONE,
            len: 0,
        }
    }

    /// Reserves room for at least `additional` more slots.
    pub(crate) fn try_reserve(
        &mut self,
        additional: usize,
    ) -> Result<(), std::collections::TryReserveError> {
        self.slots.try_reserve(additional)
    }

    /// Number of occupied slots.
    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Number of slots that can be occupied without reallocating.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Inserts a value, returning its stable id.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the backing vector cannot grow or the id
    /// space is exhausted. The arena is unchanged in that case.
    pub(crate) fn try_insert(&mut self, value: T) -> Result<NodeId, Full<T>> {
        if self.free_head.is_some() {
            let id = self.free_head;
            let slot = &mut self.slots[id.slot()];
            match mem::replace(slot, Slot::Occupied(value)) {
                Slot::Vacant(next_free) => self.free_head = next_free,
                Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
            }
            self.len += 1;
            return Ok(id);
        }

        let slot = self.slots.len();
        if slot >= NodeId::MAX_SLOTS || self.slots.try_reserve(1).is_err() {
            return Err(Full(value));
        }

        self.slots.push(Slot::Occupied(value));
        self.len += 1;
        Ok(NodeId::from_slot(slot))
    }

    /// Removes and returns the value at `id`, if occupied.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.slot())?;
        if matches!(slot, Slot::Vacant(_)) {
            return None;
        }

        match mem::replace(slot, Slot::Vacant(self.free_head)) {
            Slot::Occupied(value) => {
                self.free_head = id;
                self.len -= 1;
                Some(value)
            }
            Slot::Vacant(_) => unreachable!(),
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.slot())? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant(_) => None,
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.slot())? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant(_) => None,
        }
    }

    /// Shrinks the backing storage to at least `min_capacity` slots.
    ///
    /// Occupied and vacant slots alike stay in place, since ids index them.
    /// An empty arena forgets its slots first, so all of them can go.
    pub(crate) fn shrink_to(&mut self, min_capacity: usize) {
        if self.len == 0 {
            self.clear();
        }
        self.slots.shrink_to(min_capacity);
    }

    /// Drops every stored value and forgets the free list.
    ///
    /// Allocated capacity is kept.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = NodeId::NONE;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut arena = Arena::new();

        let a = arena.try_insert("a").unwrap();
        let b = arena.try_insert("b").unwrap();
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(b), Some(&"b"));

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);
    }

    #[test]
    fn vacated_slots_are_reused() {
        let mut arena = Arena::new();

        let a = arena.try_insert(1u64).unwrap();
        let b = arena.try_insert(2u64).unwrap();
        arena.remove(a);
        arena.remove(b);

        // LIFO free list
        assert_eq!(arena.try_insert(3).unwrap(), b);
        assert_eq!(arena.try_insert(4).unwrap(), a);

        let c = arena.try_insert(5).unwrap();
        assert_eq!(c.slot(), 2);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn get_mut_modifies_in_place() {
        let mut arena = Arena::new();
        let id = arena.try_insert(String::from("x")).unwrap();
        arena.get_mut(id).unwrap().push('y');
        assert_eq!(arena.get(id).map(String::as_str), Some("xy"));
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let mut arena: Arena<u8> = Arena::new();
        assert_eq!(arena.get(NodeId::from_slot(10)), None);
        assert_eq!(arena.get(NodeId::NONE), None);
        assert_eq!(arena.remove(NodeId::from_slot(10)), None);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut arena = Arena::new();
        arena.try_reserve(32).unwrap();
        for i in 0..16u32 {
            arena.try_insert(i).unwrap();
        }
        let capacity = arena.capacity();

        arena.clear();
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.capacity(), capacity);
        assert_eq!(arena.try_insert(99).unwrap().slot(), 0);
    }

    #[test]
    fn shrink_to_keeps_live_ids() {
        let mut arena = Arena::new();
        let ids: Vec<_> = (0..64u32).map(|i| arena.try_insert(i).unwrap()).collect();
        for &id in &ids[..60] {
            arena.remove(id);
        }

        arena.shrink_to(0);
        assert!(arena.capacity() >= 64);
        for (i, &id) in ids.iter().enumerate().skip(60) {
            assert_eq!(arena.get(id), Some(&u32::try_from(i).unwrap()));
        }

        for &id in &ids[60..] {
            arena.remove(id);
        }
        arena.shrink_to(4);
        assert!(arena.capacity() < 64);
        assert_eq!(arena.try_insert(7).unwrap().slot(), 0);
    }

    #[test]
    fn values_dropped_on_clear() {
        use std::rc::Rc;

        let tracker = Rc::new(());
        let mut arena = Arena::new();
        for _ in 0..4 {
            arena.try_insert(Rc::clone(&tracker)).unwrap();
        }
        assert_eq!(Rc::strong_count(&tracker), 5);

        arena.clear();
        assert_eq!(Rc::strong_count(&tracker), 1);
    }
}
