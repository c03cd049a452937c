//! Doubly-linked list over arena storage.
//!
//! Nodes live in an [`Arena`] and link to each other by [`NodeId`]. The list
//! owns its arena outright, so node ids never escape and no node can be
//! reached once it has been unlinked.
//!
//! Orientation follows the queue: the **head** (front) is the most recently
//! inserted node and the **tail** (back) the oldest. Inserting at the head and
//! removing at the tail gives FIFO order with O(1) at both ends.
//!
//! ```text
//!   head                               tail
//!    │                                   │
//!    ▼        next          next         ▼
//!  [ n3 ] ──────────► [ n2 ] ──────────► [ n1 ] ──► NONE
//!  NONE ◄─── [ n3 ] ◄────────── [ n2 ] ◄──────────
//!                prev              prev
//! ```

use crate::arena::Arena;
use crate::error::Full;
use crate::index::NodeId;

/// A value plus its list links.
#[derive(Debug)]
pub(crate) struct ListNode<T> {
    data: T,
    prev: NodeId,
    next: NodeId,
}

impl<T> ListNode<T> {
    #[inline]
    const fn new(data: T) -> Self {
        Self {
            data,
            prev: NodeId::NONE,
            next: NodeId::NONE,
        }
    }
}

/// Doubly-linked list that owns its node storage.
pub(crate) struct List<T> {
    arena: Arena<ListNode<T>>,
    head: NodeId,
    tail: NodeId,
    len: usize,
}

impl<T> List<T> {
    pub(crate) const fn new() -> Self {
        Self {
            arena: Arena::new(),
            head: NodeId::NONE,
            tail: NodeId::NONE,
            len: 0,
        }
    }

    /// Reserves node slots for at least `additional` more elements.
    pub(crate) fn try_reserve(
        &mut self,
        additional: usize,
    ) -> Result<(), std::collections::TryReserveError> {
        self.arena.try_reserve(additional)
    }

    /// Number of linked nodes.
    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Node slots available without reallocating.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Inserts `value` as the new head.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if no node slot can be allocated. The list
    /// is unchanged in that case.
    pub(crate) fn push_front(&mut self, value: T) -> Result<(), Full<T>> {
        let key = self
            .arena
            .try_insert(ListNode::new(value))
            .map_err(|Full(node)| Full(node.data))?;

        if self.head.is_some() {
            if let Some(old_head) = self.arena.get_mut(self.head) {
                old_head.prev = key;
            }
            if let Some(node) = self.arena.get_mut(key) {
                node.next = self.head;
            }
        } else {
            self.tail = key;
        }

        self.head = key;
        self.len += 1;
        Ok(())
    }

    /// Unlinks and returns the tail (oldest) value.
    ///
    /// Returns `None` if the list is empty.
    pub(crate) fn pop_back(&mut self) -> Option<T> {
        if self.tail.is_none() {
            return None;
        }

        let key = self.tail;
        let node = self.arena.remove(key)?;

        if self.head == key {
            // Single element: both ends go back to the sentinel.
            self.head = NodeId::NONE;
            self.tail = NodeId::NONE;
        } else {
            self.tail = node.prev;
            if let Some(new_tail) = self.arena.get_mut(self.tail) {
                new_tail.next = NodeId::NONE;
            }
        }

        self.len -= 1;
        Some(node.data)
    }

    /// Returns the tail (oldest) value without unlinking it.
    #[inline]
    pub(crate) fn back(&self) -> Option<&T> {
        self.arena.get(self.tail).map(|node| &node.data)
    }

    /// Shrinks node storage to at least `min_capacity` slots.
    pub(crate) fn shrink_to(&mut self, min_capacity: usize) {
        self.arena.shrink_to(min_capacity);
    }

    /// Unlinks and drops every node, returning how many there were.
    ///
    /// The count comes from walking the chain head to tail. The values are
    /// then dropped in slot order by clearing the arena, which keeps its
    /// capacity.
    pub(crate) fn clear(&mut self) -> usize {
        let drained = self.iter().count();
        debug_assert_eq!(drained, self.len);
        debug_assert_eq!(self.arena.len(), self.len);

        self.arena.clear();
        self.head = NodeId::NONE;
        self.tail = NodeId::NONE;
        self.len = 0;
        drained
    }

    /// Iterates values from head (newest) to tail (oldest).
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            key: self.head,
            remaining: self.len,
        }
    }

    /// Checks every structural invariant, panicking with a description of the
    /// first violation.
    ///
    /// - `head == tail` iff `len <= 1`; `len == 0` iff both are `NONE`
    /// - forward walk from `head` ends at `tail` after exactly `len` nodes
    /// - every forward link has a matching backward link
    /// - the arena holds no nodes outside the chain
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(
            self.len == 0,
            self.head.is_none() && self.tail.is_none(),
            "empty list must have NONE head and tail"
        );
        assert_eq!(self.head == self.tail, self.len <= 1, "head/tail equality");
        assert_eq!(self.arena.len(), self.len, "arena holds unlinked nodes");

        let mut prev = NodeId::NONE;
        let mut key = self.head;
        let mut walked = 0;
        while key.is_some() {
            let node = self.arena.get(key).expect("link to vacant slot");
            assert_eq!(node.prev, prev, "prev link mismatch at {key:?}");
            walked += 1;
            assert!(walked <= self.len, "cycle or overlong chain");
            prev = key;
            key = node.next;
        }
        assert_eq!(walked, self.len, "chain length != len");
        assert_eq!(prev, self.tail, "walk did not end at tail");
    }
}

/// Head-to-tail iterator over list values.
pub(crate) struct Iter<'a, T> {
    list: &'a List<T>,
    key: NodeId,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.arena.get(self.key)?;
        self.key = node.next;
        self.remaining -= 1;
        Some(&node.data)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
