//! Slot Arena Module
//!
//! Index-addressed node storage for the eviction lists. Links between nodes
//! are `SlotId`s into the arena instead of pointers, so splicing a node to a
//! new position stays O(1) without shared ownership.

use std::collections::HashMap;

// == Slot Id ==
/// Stable handle to a value stored in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

// == Slot Arena ==
/// Free-list backed slab. Removed slots are reused by later inserts.
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(value);
            idx
        } else {
            self.slots.push(Some(value));
            self.slots.len() - 1
        };
        self.len += 1;
        SlotId(idx)
    }

    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

// == Key List ==
#[derive(Debug)]
struct KeyNode {
    key: String,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Doubly linked list of unique keys with a key -> node index.
///
/// Front is the newest position, back is the oldest.
#[derive(Debug, Default)]
pub struct KeyList {
    nodes: SlotArena<KeyNode>,
    index: HashMap<String, SlotId>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl KeyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Inserts `key` at the front. Returns false if it was already tracked.
    pub fn push_front(&mut self, key: &str) -> bool {
        if self.index.contains_key(key) {
            return false;
        }
        let id = self.nodes.insert(KeyNode {
            key: key.to_string(),
            prev: None,
            next: None,
        });
        self.link_front(id);
        self.index.insert(key.to_string(), id);
        true
    }

    /// Moves a tracked key to the front. Returns false if untracked.
    pub fn move_to_front(&mut self, key: &str) -> bool {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        if self.head != Some(id) {
            self.unlink(id);
            self.link_front(id);
        }
        true
    }

    /// Removes a key. Returns false if it was not tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(id) = self.index.remove(key) else {
            return false;
        };
        self.unlink(id);
        self.nodes.remove(id);
        true
    }

    /// Oldest key, if any.
    pub fn back(&self) -> Option<&str> {
        self.tail
            .and_then(|id| self.nodes.get(id))
            .map(|node| node.key.as_str())
    }

    /// Newest key, if any.
    pub fn front(&self) -> Option<&str> {
        self.head
            .and_then(|id| self.nodes.get(id))
            .map(|node| node.key.as_str())
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from oldest to newest.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.tail;
        std::iter::from_fn(move || {
            let node = self.nodes.get(cursor?)?;
            cursor = node.prev;
            Some(node.key.as_str())
        })
    }

    fn link_front(&mut self, id: SlotId) {
        let old_head = self.head;
        if let Some(node) = self.nodes.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head.and_then(|h| self.nodes.get_mut(h)) {
            Some(head) => head.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn unlink(&mut self, id: SlotId) {
        let (prev, next) = match self.nodes.get(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.nodes.get_mut(n)) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }
}
